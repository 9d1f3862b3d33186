//! Value validators attached to fields
//!
//! A check answers three ways: the value is accepted, the value is of a kind
//! this check does not handle, or the value has the right kind but violates
//! the check's range. A field accepts a value as soon as one of its checks
//! does; a range violation is reported immediately.

use crate::error::CodecError;
use crate::value::Value;

/// Accepted lengths for sequence checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthRule {
    Exact(usize),
    /// Inclusive bounds
    Range(usize, usize),
}

impl LengthRule {
    pub fn accepts(&self, len: usize) -> bool {
        match *self {
            LengthRule::Exact(n) => len == n,
            LengthRule::Range(min, max) => (min..=max).contains(&len),
        }
    }

    fn describe(&self) -> String {
        match *self {
            LengthRule::Exact(n) => format!("length {n}"),
            LengthRule::Range(min, max) => format!("length in [{min}..{max}]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Check {
    /// Unsigned integer range, bounds inclusive and optional
    Int { min: Option<i128>, max: Option<i128> },
    /// Same as `Int` over `[0, 255]`
    Byte,
    Bool,
    HexList(LengthRule),
    /// Bit set of exactly this many bytes
    BitStruct(usize),
    String(LengthRule),
    /// Accepts the absent marker of optional fields
    None,
    /// Length-only check over any sequence; superseded by `HexList` and `String`
    List(usize),
}

impl Check {
    pub const fn int(min: i128, max: i128) -> Self {
        Check::Int {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Full range of an unsigned `bits`-wide integer
    pub const fn int_bits(bits: usize) -> Self {
        let max = if bits >= 127 {
            i128::MAX
        } else {
            (1i128 << bits) - 1
        };
        Check::int(0, max)
    }

    pub const fn hex_list(len: usize) -> Self {
        Check::HexList(LengthRule::Exact(len))
    }

    pub const fn hex_list_range(min: usize, max: usize) -> Self {
        Check::HexList(LengthRule::Range(min, max))
    }

    pub const fn string(len: usize) -> Self {
        Check::String(LengthRule::Exact(len))
    }

    pub const fn string_range(min: usize, max: usize) -> Self {
        Check::String(LengthRule::Range(min, max))
    }

    /// `Ok(true)` accepted, `Ok(false)` not handled by this check, `Err` out of range
    pub fn check(&self, value: Option<&Value>, name: &str) -> Result<bool, CodecError> {
        let Some(value) = value else {
            return Ok(matches!(self, Check::None));
        };
        match self {
            Check::Int { min, max } => {
                let Some(v) = value.as_int() else {
                    return Ok(false);
                };
                if v < 0 {
                    return Err(CodecError::out_of_range(name, format!("negative value {v}")));
                }
                if let Some(min) = min {
                    if v < *min {
                        return Err(CodecError::out_of_range(
                            name,
                            format!("Value {v} lower than min {min}"),
                        ));
                    }
                }
                if let Some(max) = max {
                    if v > *max {
                        return Err(CodecError::out_of_range(
                            name,
                            format!("Value {v} greater than max {max}"),
                        ));
                    }
                }
                Ok(true)
            }
            Check::Byte => Check::int(0, 255).check(Some(value), name),
            Check::Bool => Ok(matches!(value, Value::Bool(_))),
            Check::HexList(rule) => match value {
                Value::Bytes(bytes) if rule.accepts(bytes.len()) => Ok(true),
                Value::Bytes(bytes) => Err(CodecError::out_of_range(
                    name,
                    format!("got {} bytes, expected {}", bytes.len(), rule.describe()),
                )),
                _ => Ok(false),
            },
            Check::BitStruct(len) => match value {
                Value::Bits(bits) if bits.len() == *len => Ok(true),
                Value::Bits(bits) => Err(CodecError::out_of_range(
                    name,
                    format!("got {} bytes of bits, expected {len}", bits.len()),
                )),
                _ => Ok(false),
            },
            Check::String(rule) => match value {
                Value::Str(s) if rule.accepts(s.chars().count()) => Ok(true),
                Value::Str(s) => Err(CodecError::out_of_range(
                    name,
                    format!("string of {} chars, expected {}", s.chars().count(), rule.describe()),
                )),
                _ => Ok(false),
            },
            Check::None => Ok(false),
            Check::List(len) => {
                let actual = match value {
                    Value::Bytes(bytes) => bytes.len(),
                    Value::Bits(bits) => bits.len(),
                    Value::Str(s) => s.chars().count(),
                    _ => return Ok(false),
                };
                if actual == *len {
                    Ok(true)
                } else {
                    Err(CodecError::out_of_range(
                        name,
                        format!("got {actual} items, expected {len}"),
                    ))
                }
            }
        }
    }

    /// Standalone validation where an unhandled kind is a type error
    pub fn validate(&self, value: Option<&Value>, name: &str) -> Result<(), CodecError> {
        if self.check(value, name)? {
            Ok(())
        } else {
            Err(CodecError::TypeMismatch {
                field: name.to_string(),
                kind: value.map_or_else(|| "none".to_string(), |v| v.kind().to_string()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hexlist::{BitStruct, HexList};

    #[test]
    fn test_check_int_bounds() {
        let check = Check::int(3, 10);
        for v in 3..=10 {
            assert!(check.validate(Some(&Value::Int(v)), "f").is_ok());
        }
        assert!(check.validate(Some(&Value::Int(2)), "f").unwrap_err().is_range_error());
        assert!(check.validate(Some(&Value::Int(11)), "f").unwrap_err().is_range_error());
        assert!(check.validate(Some(&Value::Int(-1)), "f").unwrap_err().is_range_error());
    }

    #[test]
    fn test_check_int_rejects_other_kinds() {
        let check = Check::int(0, 255);
        let text = Value::Str("12".into());
        let bytes = Value::Bytes(HexList::from([0x12]));
        assert!(check.validate(Some(&text), "f").unwrap_err().is_type_error());
        assert!(check.validate(Some(&bytes), "f").unwrap_err().is_type_error());
        assert!(check.validate(None, "f").unwrap_err().is_type_error());
    }

    #[test]
    fn test_check_byte_matches_int_range() {
        for v in [-1i128, 0, 1, 127, 255, 256, 1000] {
            let value = Value::Int(v);
            assert_eq!(
                Check::Byte.check(Some(&value), "f"),
                Check::int(0, 255).check(Some(&value), "f")
            );
        }
    }

    #[test]
    fn test_check_hex_list_lengths() {
        let exact = Check::hex_list(2);
        assert!(exact.validate(Some(&Value::from([1u8, 2])), "f").is_ok());
        assert!(exact.validate(Some(&Value::from([1u8])), "f").unwrap_err().is_range_error());

        let range = Check::hex_list_range(1, 3);
        for len in 1..=3 {
            assert!(range.validate(Some(&Value::from(vec![0u8; len])), "f").is_ok());
        }
        assert!(range.validate(Some(&Value::from(vec![0u8; 4])), "f").is_err());
        assert!(range.validate(Some(&Value::from(Vec::<u8>::new())), "f").is_err());
    }

    #[test]
    fn test_check_string_lengths() {
        let exact = Check::string(4);
        assert!(exact.validate(Some(&Value::from("abcd")), "f").is_ok());
        assert!(exact.validate(Some(&Value::from("abc")), "f").is_err());

        let range = Check::string_range(2, 3);
        assert!(range.validate(Some(&Value::from("ab")), "f").is_ok());
        assert!(range.validate(Some(&Value::from("abc")), "f").is_ok());
        assert!(range.validate(Some(&Value::from("a")), "f").is_err());
        assert!(range.validate(Some(&Value::from("abcd")), "f").is_err());
    }

    #[test]
    fn test_check_bool_bits_and_none() {
        assert!(Check::Bool.validate(Some(&Value::Bool(true)), "f").is_ok());
        assert!(Check::Bool.validate(Some(&Value::Int(1)), "f").is_err());
        let bits = Value::Bits(BitStruct::new(2));
        assert!(Check::BitStruct(2).validate(Some(&bits), "f").is_ok());
        assert!(Check::BitStruct(3).validate(Some(&bits), "f").is_err());
        assert!(Check::None.validate(None, "f").is_ok());
        assert!(Check::None.validate(Some(&Value::Int(0)), "f").is_err());
    }

    #[test]
    fn test_check_list_length_only() {
        let check = Check::List(3);
        assert!(check.validate(Some(&Value::from(vec![0u8; 3])), "f").is_ok());
        assert!(check.validate(Some(&Value::from("abc")), "f").is_ok());
        assert!(check.validate(Some(&Value::Bits(BitStruct::new(3))), "f").is_ok());
        assert!(check
            .validate(Some(&Value::from(vec![0u8; 2])), "f")
            .unwrap_err()
            .is_range_error());
        assert!(check
            .validate(Some(&Value::Int(3)), "f")
            .unwrap_err()
            .is_type_error());
    }

    #[test]
    fn test_int_bits() {
        assert_eq!(Check::int_bits(4), Check::int(0, 15));
        assert_eq!(Check::int_bits(16), Check::int(0, 0xFFFF));
    }
}
