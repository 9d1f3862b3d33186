//! Field descriptors: one named bit region of a record

use std::fmt;

use crate::check::Check;
use crate::error::CodecError;
use crate::hexlist::HexList;
use crate::record::Record;
use crate::value::{Value, ValueKind};

/// Converter applied on assignment, selected by the source value kind
pub type Converter = fn(Value, &Field) -> Result<Value, CodecError>;

/// Default computed from the containing record at read time
pub type DefaultFn = fn(&Record) -> Value;

#[derive(Clone, Copy)]
pub struct Conversion {
    pub from: ValueKind,
    pub convert: Converter,
}

impl PartialEq for Conversion {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.convert as usize == other.convert as usize
    }
}

impl fmt::Debug for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Conversion({} -> {:#x})", self.from, self.convert as usize)
    }
}

#[derive(Clone)]
pub enum DefaultValue {
    Fixed(Value),
    Computed(DefaultFn),
}

impl PartialEq for DefaultValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DefaultValue::Fixed(a), DefaultValue::Fixed(b)) => a == b,
            (DefaultValue::Computed(a), DefaultValue::Computed(b)) => *a as usize == *b as usize,
            _ => false,
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Fixed(v) => write!(f, "Fixed({v:?})"),
            DefaultValue::Computed(func) => write!(f, "Computed({:#x})", *func as usize),
        }
    }
}

/// Stock converters
pub mod convert {
    use super::*;

    /// ASCII text to the field's raw bytes, right-padded with zeros
    pub fn ascii_to_bytes(value: Value, field: &Field) -> Result<Value, CodecError> {
        let Value::Str(text) = value else {
            return Ok(value);
        };
        if !text.is_ascii() {
            return Err(CodecError::out_of_range(field.name(), "non-ASCII text"));
        }
        let mut bytes = text.into_bytes();
        let width = field.byte_length();
        if bytes.len() > width {
            return Err(CodecError::out_of_range(
                field.name(),
                format!("{} chars exceed {width} bytes", bytes.len()),
            ));
        }
        if !field.is_variable() {
            bytes.resize(width, 0);
        }
        Ok(Value::Bytes(HexList::from(bytes)))
    }

    /// Unsigned integer to the field's big-endian byte form
    pub fn int_to_bytes(value: Value, field: &Field) -> Result<Value, CodecError> {
        match value.as_int() {
            Some(v) => Ok(Value::Bytes(HexList::from(field.encode(&Value::Int(v))?))),
            None => Ok(value),
        }
    }

    /// Nested record to its serialized bytes
    pub fn record_to_bytes(value: Value, _field: &Field) -> Result<Value, CodecError> {
        match value {
            Value::Record(record) => Ok(Value::Bytes(record.to_bytes()?)),
            other => Ok(other),
        }
    }
}

/// One named bit region of a record
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    fid: u8,
    length: usize,
    title: String,
    name: String,
    checks: Vec<Check>,
    default: Option<DefaultValue>,
    conversions: Vec<Conversion>,
    optional: bool,
    variable: bool,
    finger_print: bool,
}

impl Field {
    /// Largest accepted width in bits
    pub const MAX_LENGTH: usize = 1023;

    pub fn new(fid: i64, length: i64) -> Result<Self, CodecError> {
        let fid = u8::try_from(fid).map_err(|_| CodecError::InvalidFid(fid))?;
        if !(1..=Self::MAX_LENGTH as i64).contains(&length) {
            return Err(CodecError::InvalidLength(length));
        }
        Ok(Self {
            fid,
            length: length as usize,
            title: "Undefined Field".to_string(),
            name: format!("field_{fid:02x}"),
            checks: Vec::new(),
            default: None,
            conversions: Vec::new(),
            optional: false,
            variable: false,
            finger_print: false,
        })
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_checks(mut self, checks: impl IntoIterator<Item = Check>) -> Self {
        self.checks = checks.into_iter().collect();
        self
    }

    /// Register a converter for one source kind, replacing any previous one
    pub fn with_conversion(mut self, from: ValueKind, convert: Converter) -> Self {
        self.conversions.retain(|c| c.from != from);
        self.conversions.push(Conversion { from, convert });
        self
    }

    /// Fixed default; converted then validated against every check
    pub fn with_default(mut self, default: impl Into<Value>) -> Result<Self, CodecError> {
        let value = self.convert(default.into())?;
        self.check_value(Some(&value))?;
        self.default = Some(DefaultValue::Fixed(value));
        Ok(self)
    }

    pub fn with_computed_default(mut self, default: DefaultFn) -> Self {
        self.default = Some(DefaultValue::Computed(default));
        self
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn variable(mut self, variable: bool) -> Self {
        self.variable = variable;
        self
    }

    pub fn finger_print(mut self, finger_print: bool) -> Self {
        self.finger_print = finger_print;
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn fid(&self) -> u8 {
        self.fid
    }

    /// Width in bits
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn byte_length(&self) -> usize {
        self.length.div_ceil(8)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    pub fn conversions(&self) -> &[Conversion] {
        &self.conversions
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_variable(&self) -> bool {
        self.variable
    }

    pub fn is_finger_print(&self) -> bool {
        self.finger_print
    }

    pub fn default(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// Resolve the default, invoking a computed default with `context`
    pub fn default_value(&self, context: &Record) -> Option<Value> {
        match self.default.as_ref()? {
            DefaultValue::Fixed(v) => Some(v.clone()),
            DefaultValue::Computed(func) => Some(func(context)),
        }
    }

    /// `"<title>: (0x<default-hex>)"`, or `"<title>:"` without a fixed default
    pub fn summary(&self) -> String {
        match &self.default {
            Some(DefaultValue::Fixed(v)) => match self.encode(v) {
                Ok(bytes) => format!("{}: (0x{})", self.title, HexList::from(bytes)),
                Err(_) => format!("{}: ({v})", self.title),
            },
            _ => format!("{}:", self.title),
        }
    }

    // ========================================================================
    // Value handling
    // ========================================================================

    /// Apply the converter registered for the value's kind
    pub fn convert(&self, value: Value) -> Result<Value, CodecError> {
        let kind = value.kind();
        match self.conversions.iter().find(|c| c.from == kind) {
            Some(conversion) => (conversion.convert)(value, self),
            None if kind == ValueKind::Record => convert::record_to_bytes(value, self),
            None => Ok(value),
        }
    }

    /// First accepting check wins; a range violation stops immediately
    pub fn check_value(&self, value: Option<&Value>) -> Result<(), CodecError> {
        if value.is_none() && self.optional {
            return Ok(());
        }
        if self.checks.is_empty() {
            return match value {
                Some(_) => Ok(()),
                None => Err(CodecError::MissingField {
                    layout: String::new(),
                    field: self.name.clone(),
                }),
            };
        }
        for check in &self.checks {
            if check.check(value, &self.name)? {
                return Ok(());
            }
        }
        Err(CodecError::TypeMismatch {
            field: self.name.clone(),
            kind: value.map_or_else(|| "none".to_string(), |v| v.kind().to_string()),
        })
    }

    /// Wire bytes of `value`, right-aligned in `byte_length()` bytes
    ///
    /// Variable fields return the bytes as-is, bounded by the declared width.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let bytes = match value {
            Value::Int(v) => self.int_bytes(*v)?,
            Value::Bool(b) => self.int_bytes(i128::from(*b))?,
            Value::Bytes(b) => b.to_vec(),
            Value::Bits(b) => b.as_bytes().to_vec(),
            Value::Str(s) => s.as_bytes().to_vec(),
            Value::Record(r) => r.to_bytes()?.into_vec(),
        };
        let width = self.byte_length();
        if self.variable {
            if bytes.len() > width {
                return Err(CodecError::out_of_range(
                    &self.name,
                    format!("{} bytes exceed {width}", bytes.len()),
                ));
            }
            return Ok(bytes);
        }
        if bytes.len() != width {
            return Err(CodecError::out_of_range(
                &self.name,
                format!("should be {width}-byte long, got {}", bytes.len()),
            ));
        }
        let spare = width * 8 - self.length;
        if spare > 0 && bytes[0] >> (8 - spare) != 0 {
            return Err(CodecError::out_of_range(
                &self.name,
                format!("value does not fit in {} bits", self.length),
            ));
        }
        Ok(bytes)
    }

    /// Value read back from wire bytes: aligned regions stay bytes
    pub(crate) fn decode(&self, raw: Vec<u8>, aligned: bool) -> Value {
        if aligned || self.length > 127 {
            return Value::Bytes(HexList::from(raw));
        }
        Value::Int(raw.iter().fold(0i128, |acc, &b| (acc << 8) | i128::from(b)))
    }

    fn int_bytes(&self, v: i128) -> Result<Vec<u8>, CodecError> {
        if v < 0 {
            return Err(CodecError::out_of_range(&self.name, format!("negative value {v}")));
        }
        let v = v as u128;
        if self.length < 128 && v >> self.length != 0 {
            return Err(CodecError::out_of_range(
                &self.name,
                format!("Out of bound value 0x{v:X} for {} bits", self.length),
            ));
        }
        Ok(HexList::from_int(v, self.byte_length())
            .map_err(|_| CodecError::out_of_range(&self.name, format!("0x{v:X} too wide")))?
            .into_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fid_bounds() {
        assert_eq!(Field::new(-1, 8).unwrap_err(), CodecError::InvalidFid(-1));
        assert_eq!(Field::new(256, 8).unwrap_err(), CodecError::InvalidFid(256));
        assert_eq!(Field::new(0, 8).unwrap().fid(), 0);
        assert_eq!(Field::new(255, 8).unwrap().fid(), 255);
    }

    #[test]
    fn test_length_bounds() {
        assert_eq!(Field::new(1, 0).unwrap_err(), CodecError::InvalidLength(0));
        assert_eq!(Field::new(1, 1024).unwrap_err(), CodecError::InvalidLength(1024));
        assert_eq!(Field::new(1, 1).unwrap().length(), 1);
        assert_eq!(Field::new(1, 1023).unwrap().byte_length(), 128);
    }

    #[test]
    fn test_default_must_pass_checks() {
        let field = Field::new(1, 8).unwrap().with_checks([Check::int(0, 10)]);
        assert!(field.clone().with_default(5).is_ok());
        assert!(field.with_default(11).unwrap_err().is_range_error());
    }

    fn sample() -> Field {
        Field::new(0xFA, 8)
            .unwrap()
            .with_name("control")
            .with_title("Control")
            .with_checks([Check::Byte])
    }

    #[test]
    fn test_equality_over_every_input() {
        assert_eq!(sample(), sample());
        let variants = [
            Field::new(0xF9, 8).unwrap().with_name("control").with_title("Control").with_checks([Check::Byte]),
            Field::new(0xFA, 16).unwrap().with_name("control").with_title("Control").with_checks([Check::Byte]),
            sample().with_name("other"),
            sample().with_title("Other"),
            sample().with_checks([Check::hex_list(1)]),
            sample().with_default(1).unwrap(),
            sample().optional(true),
            sample().variable(true),
            sample().finger_print(true),
            sample().with_conversion(ValueKind::Str, convert::ascii_to_bytes),
        ];
        for variant in &variants {
            assert_ne!(&sample(), variant);
        }
    }

    #[test]
    fn test_summary() {
        assert_eq!(sample().with_default(0x2A).unwrap().summary(), "Control: (0x2A)");
        assert_eq!(sample().summary(), "Control:");
    }

    #[test]
    fn test_first_accepting_check_wins() {
        let field = Field::new(1, 16)
            .unwrap()
            .with_checks([Check::hex_list(2), Check::int_bits(16)]);
        assert!(field.check_value(Some(&Value::Int(0xFFFF))).is_ok());
        assert!(field.check_value(Some(&Value::from([0u8, 1]))).is_ok());
        assert!(field.check_value(Some(&Value::from([0u8]))).unwrap_err().is_range_error());
        assert!(field.check_value(Some(&Value::from("ab"))).unwrap_err().is_type_error());
    }

    #[test]
    fn test_optional_accepts_absent() {
        let field = sample().optional(true);
        assert!(field.check_value(None).is_ok());
        assert!(sample().check_value(None).is_err());
    }

    #[test]
    fn test_encode_unaligned_width() {
        let field = Field::new(1, 4).unwrap();
        assert_eq!(field.encode(&Value::Int(0xF)).unwrap(), vec![0x0F]);
        assert!(field.encode(&Value::Int(0x10)).is_err());
        assert!(field.encode(&Value::from([0x10u8])).is_err());
    }

    #[test]
    fn test_ascii_conversion_pads() {
        let field = Field::new(1, 32)
            .unwrap()
            .with_conversion(ValueKind::Str, convert::ascii_to_bytes);
        assert_eq!(
            field.convert(Value::from("AB")).unwrap(),
            Value::from([b'A', b'B', 0, 0])
        );
        assert!(field.convert(Value::from("ABCDE")).is_err());
    }

    #[test]
    fn test_int_conversion() {
        let field = Field::new(1, 16)
            .unwrap()
            .with_conversion(ValueKind::Int, convert::int_to_bytes);
        assert_eq!(field.convert(Value::Int(0x0102)).unwrap(), Value::from([1u8, 2]));
    }
}
