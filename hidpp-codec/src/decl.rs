//! Declarative frame tables
//!
//! Features declare their frames as `const` data; [`FrameDecl::build`] turns a
//! declaration into a validated [`MessageClass`]. Payload field ids descend
//! from [`fid::FIRST_PAYLOAD`](crate::message::fid::FIRST_PAYLOAD); the trailing
//! padding is implied by the frame size.

use std::sync::Arc;

use crate::check::Check;
use crate::error::CodecError;
use crate::field::{convert, Field};
use crate::hexlist::HexList;
use crate::layout::Layout;
use crate::message::{fid, ClassInfo, FrameSize, MessageClass, MessageType};
use crate::value::{Value, ValueKind};
use crate::variant::Discriminator;

/// Nested layouts number their fields down from here
pub const FIRST_NESTED_FID: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Unsigned integer, also settable as raw bytes when byte-aligned
    Uint,
    /// Zero on send, parsed as-is on receive
    Reserved,
    /// Raw bytes that also accept ASCII text
    Ascii,
    /// Raw bytes only
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: &'static str,
    pub bits: u16,
    pub kind: FieldKind,
    pub default: Option<u64>,
}

impl FieldDecl {
    pub const fn uint(name: &'static str, bits: u16) -> Self {
        Self {
            name,
            bits,
            kind: FieldKind::Uint,
            default: None,
        }
    }

    pub const fn reserved(name: &'static str, bits: u16) -> Self {
        Self {
            name,
            bits,
            kind: FieldKind::Reserved,
            default: Some(0),
        }
    }

    pub const fn ascii(name: &'static str, bits: u16) -> Self {
        Self {
            name,
            bits,
            kind: FieldKind::Ascii,
            default: None,
        }
    }

    pub const fn raw(name: &'static str, bits: u16) -> Self {
        Self {
            name,
            bits,
            kind: FieldKind::Raw,
            default: None,
        }
    }

    pub const fn with_default(self, default: u64) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }

    pub fn title(&self) -> String {
        title_case(self.name)
    }

    /// Field with the stock checks for its width and kind
    pub fn to_field(&self, fid: u8) -> Result<Field, CodecError> {
        stock_field(fid, self.name, self.bits, self.kind, self.default)
    }
}

/// Field with the stock checks for `bits` and `kind`
///
/// Byte-aligned fields get a length check, integer kinds below 128 bits a
/// range check. ASCII fields also accept text.
pub fn stock_field(
    fid: u8,
    name: &str,
    bits: u16,
    kind: FieldKind,
    default: Option<u64>,
) -> Result<Field, CodecError> {
    let width = usize::from(bits);
    let aligned = width % 8 == 0;
    let mut checks = Vec::new();
    if aligned {
        checks.push(Check::hex_list(width / 8));
    }
    if matches!(kind, FieldKind::Uint | FieldKind::Reserved) && width < 128 {
        checks.push(Check::int_bits(width));
    }
    if checks.is_empty() {
        return Err(CodecError::InvalidDeclaration(format!(
            "{name}: {width} bits cannot be checked as {kind:?}"
        )));
    }
    let mut field = Field::new(i64::from(fid), i64::from(bits))?
        .with_name(name)
        .with_title(title_case(name))
        .with_checks(checks);
    if kind == FieldKind::Ascii {
        field = field.with_conversion(ValueKind::Str, convert::ascii_to_bytes);
    }
    if let Some(default) = default {
        let value = if aligned {
            Value::Bytes(HexList::from_int(u128::from(default), width / 8)?)
        } else {
            Value::Int(i128::from(default))
        };
        field = field.with_default(value)?;
    }
    Ok(field)
}

/// `cutoff_desired_state` -> `CutoffDesiredState`
pub fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn build_fields(first: u8, decls: &[FieldDecl], owner: &str) -> Result<Vec<Field>, CodecError> {
    decls
        .iter()
        .enumerate()
        .map(|(i, decl)| {
            let fid = u8::try_from(i)
                .ok()
                .and_then(|i| first.checked_sub(i))
                .ok_or_else(|| {
                    CodecError::InvalidDeclaration(format!("{owner}: too many fields"))
                })?;
            decl.to_field(fid)
        })
        .collect()
}

/// Layout interpreting a discriminated data region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NestedDecl {
    pub name: &'static str,
    pub fields: &'static [FieldDecl],
}

impl NestedDecl {
    pub fn build(&self) -> Result<Layout, CodecError> {
        Layout::new(self.name, build_fields(FIRST_NESTED_FID, self.fields, self.name)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscriminatorDecl {
    pub tag: &'static str,
    pub data: &'static str,
    /// Last entry is the fallback
    pub variants: &'static [(u64, &'static NestedDecl)],
}

impl DiscriminatorDecl {
    pub fn build(&self) -> Result<Discriminator, CodecError> {
        let variants = self
            .variants
            .iter()
            .map(|(tag, nested)| Ok((*tag, Arc::new(nested.build()?))))
            .collect::<Result<Vec<_>, CodecError>>()?;
        Discriminator::new(self.tag, self.data, variants)
    }
}

/// One concrete frame of a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDecl {
    pub name: &'static str,
    pub msg_type: MessageType,
    pub index: u8,
    pub size: FrameSize,
    /// `None` keeps the long report id
    pub report_id: Option<u8>,
    pub payload: &'static [FieldDecl],
    pub versions: &'static [u8],
    pub request: Option<&'static str>,
    pub discriminator: Option<DiscriminatorDecl>,
}

impl FrameDecl {
    pub const fn request(
        name: &'static str,
        index: u8,
        size: FrameSize,
        payload: &'static [FieldDecl],
    ) -> Self {
        Self {
            name,
            msg_type: MessageType::Request,
            index,
            size,
            report_id: None,
            payload,
            versions: &[],
            request: None,
            discriminator: None,
        }
    }

    pub const fn response(
        name: &'static str,
        index: u8,
        request: &'static str,
        payload: &'static [FieldDecl],
        versions: &'static [u8],
    ) -> Self {
        Self {
            name,
            msg_type: MessageType::Response,
            index,
            size: FrameSize::Long,
            report_id: None,
            payload,
            versions,
            request: Some(request),
            discriminator: None,
        }
    }

    pub const fn event(
        name: &'static str,
        index: u8,
        payload: &'static [FieldDecl],
        versions: &'static [u8],
    ) -> Self {
        Self {
            name,
            msg_type: MessageType::Event,
            index,
            size: FrameSize::Long,
            report_id: None,
            payload,
            versions,
            request: None,
            discriminator: None,
        }
    }

    pub const fn error(name: &'static str, size: FrameSize, payload: &'static [FieldDecl]) -> Self {
        Self {
            name,
            msg_type: MessageType::Error,
            index: 0,
            size,
            report_id: None,
            payload,
            versions: &[],
            request: None,
            discriminator: None,
        }
    }

    pub const fn with_report_id(self, report_id: u8) -> Self {
        Self {
            report_id: Some(report_id),
            ..self
        }
    }

    pub const fn with_discriminator(self, discriminator: DiscriminatorDecl) -> Self {
        Self {
            discriminator: Some(discriminator),
            ..self
        }
    }

    pub fn build(&self, feature_id: u16) -> Result<MessageClass, CodecError> {
        let mut info = ClassInfo::new(self.name, feature_id, self.msg_type, self.index);
        info.size = self.size;
        if let Some(report_id) = self.report_id {
            info.report_id = report_id;
        }
        info.versions = self.versions.to_vec();
        info.request_list = self.request.iter().map(|r| r.to_string()).collect();
        let fields = build_fields(fid::FIRST_PAYLOAD, self.payload, self.name)?;
        let class = MessageClass::new(info, fields)?;
        match &self.discriminator {
            Some(decl) => class.with_discriminator(decl.build()?),
            None => Ok(class),
        }
    }
}
