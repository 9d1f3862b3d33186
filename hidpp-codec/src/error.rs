//! Codec error types

use thiserror::Error;

/// Errors raised while declaring, filling, encoding or parsing records
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    // Declaration errors
    #[error("Wrong fid value: {0}. Must be in range [0..255]")]
    InvalidFid(i64),

    #[error("Wrong length value: {0}. Must be in range [1..1023]")]
    InvalidLength(i64),

    #[error("{layout}: declared {actual} bits, expected {expected}")]
    SizeMismatch {
        layout: String,
        expected: usize,
        actual: usize,
    },

    #[error("{layout}: duplicate fid 0x{fid:02X}")]
    DuplicateFid { layout: String, fid: u8 },

    #[error("{layout}: duplicate field name {name}")]
    DuplicateName { layout: String, name: String },

    #[error("Invalid declaration: {0}")]
    InvalidDeclaration(String),

    // Value errors
    #[error("Wrong check type ({kind}) for {field} parameter")]
    TypeMismatch { field: String, kind: String },

    #[error("Value out of range for {field}: {reason}")]
    OutOfRange { field: String, reason: String },

    #[error("{layout} has no field named {name}")]
    UnknownField { layout: String, name: String },

    #[error("Mandatory field not found: {layout}.{field}")]
    MissingField { layout: String, field: String },

    // Wire errors
    #[error("{layout}: frame is {actual} bytes, expected {expected}")]
    FrameLength {
        layout: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid hex string: {0}")]
    InvalidHex(String),
}

impl CodecError {
    pub(crate) fn out_of_range(field: &str, reason: impl Into<String>) -> Self {
        CodecError::OutOfRange {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// True for the value-range family of errors
    pub fn is_range_error(&self) -> bool {
        matches!(
            self,
            CodecError::OutOfRange { .. } | CodecError::InvalidFid(_) | CodecError::InvalidLength(_)
        )
    }

    /// True when a value of the wrong kind was offered to a field
    pub fn is_type_error(&self) -> bool {
        matches!(self, CodecError::TypeMismatch { .. })
    }
}
