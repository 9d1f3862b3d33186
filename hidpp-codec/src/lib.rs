//! Bit-exact codec for HID++ 2.0 frames
//!
//! This crate provides the building blocks every feature declaration is made of:
//!
//! - Fields and checks (bit-width descriptors with value validation)
//! - Records (bit-packed containers, MSB-first, big-endian)
//! - Message classes (prologue, short/long frames, padding)
//! - Discriminated nested payloads
//! - Declarative `const` frame tables

pub mod check;
pub mod decl;
pub mod error;
pub mod field;
pub mod hexlist;
pub mod layout;
pub mod message;
pub mod record;
pub mod value;
pub mod variant;

mod bits;

pub use check::{Check, LengthRule};
pub use decl::{
    stock_field, title_case, DiscriminatorDecl, FieldDecl, FieldKind, FrameDecl, NestedDecl,
};
pub use error::CodecError;
pub use field::{Conversion, Converter, DefaultFn, DefaultValue, Field};
pub use hexlist::{BitStruct, HexList};
pub use layout::Layout;
pub use message::{
    // Constants
    ERROR_FEATURE_INDEX,
    DEFAULT_PADDING,
    DEFAULT_SOFTWARE_ID,
    LONG_FRAME_LEN,
    PROLOGUE_LEN,
    REPORT_ID_LONG,
    REPORT_ID_SHORT,
    SHORT_FRAME_LEN,
    // Frames
    ClassInfo,
    FrameSize,
    Message,
    MessageClass,
    MessageType,
    Prologue,
    SoftwareIdCounter,
};
pub use record::Record;
pub use value::{Value, ValueKind};
pub use variant::{Discriminator, Variant};
