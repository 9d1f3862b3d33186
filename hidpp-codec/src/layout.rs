//! Ordered field declarations shared by every instance of a record type

use std::collections::HashSet;

use tracing::debug;

use crate::error::CodecError;
use crate::field::Field;

/// Validated, immutable field list of one record type
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    name: String,
    fields: Vec<Field>,
    bit_length: usize,
}

impl Layout {
    /// Validate field ids, names and byte alignment of the total width
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Result<Self, CodecError> {
        let name = name.into();
        let mut fids = HashSet::new();
        let mut names = HashSet::new();
        for field in &fields {
            if !fids.insert(field.fid()) {
                return Err(CodecError::DuplicateFid {
                    layout: name,
                    fid: field.fid(),
                });
            }
            if !names.insert(field.name()) {
                return Err(CodecError::DuplicateName {
                    layout: name.clone(),
                    name: field.name().to_string(),
                });
            }
            if field.is_variable() && field.length() % 8 != 0 {
                return Err(CodecError::InvalidDeclaration(format!(
                    "{name}.{}: variable fields must be whole bytes",
                    field.name()
                )));
            }
        }
        let bit_length = fields.iter().map(Field::length).sum::<usize>();
        if bit_length % 8 != 0 {
            return Err(CodecError::SizeMismatch {
                layout: name,
                expected: bit_length.next_multiple_of(8),
                actual: bit_length,
            });
        }
        debug!(layout = %name, fields = fields.len(), bits = bit_length, "declared layout");
        Ok(Self {
            name,
            fields,
            bit_length,
        })
    }

    /// As [`Layout::new`], also requiring an exact total width in bits
    pub fn with_size(
        name: impl Into<String>,
        fields: Vec<Field>,
        bits: usize,
    ) -> Result<Self, CodecError> {
        let layout = Self::new(name, fields)?;
        if layout.bit_length != bits {
            return Err(CodecError::SizeMismatch {
                layout: layout.name,
                expected: bits,
                actual: layout.bit_length,
            });
        }
        Ok(layout)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Declared width in bits (upper bound when variable fields are present)
    pub fn bit_length(&self) -> usize {
        self.bit_length
    }

    pub fn byte_length(&self) -> usize {
        self.bit_length / 8
    }

    pub fn is_variable(&self) -> bool {
        self.fields.iter().any(|f| f.is_variable() || f.is_optional())
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn field_by_fid(&self, fid: u8) -> Option<&Field> {
        self.fields.iter().find(|f| f.fid() == fid)
    }

    /// Bit offset of a field from the start of the record
    pub fn bit_offset(&self, name: &str) -> Option<usize> {
        let idx = self.position(name)?;
        Some(self.fields[..idx].iter().map(Field::length).sum())
    }

    pub(crate) fn unknown(&self, name: &str) -> CodecError {
        CodecError::UnknownField {
            layout: self.name.clone(),
            name: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(fid: i64, bits: i64, name: &str) -> Field {
        Field::new(fid, bits).unwrap().with_name(name)
    }

    #[test]
    fn test_duplicate_fid_rejected() {
        let err = Layout::new("Dup", vec![field(1, 8, "a"), field(1, 8, "b")]).unwrap_err();
        assert_eq!(
            err,
            CodecError::DuplicateFid {
                layout: "Dup".into(),
                fid: 1
            }
        );
    }

    #[test]
    fn test_duplicate_name_rejected() {
        assert!(matches!(
            Layout::new("Dup", vec![field(1, 8, "a"), field(2, 8, "a")]),
            Err(CodecError::DuplicateName { .. })
        ));
    }

    #[test]
    fn test_total_must_be_whole_bytes() {
        assert!(matches!(
            Layout::new("Odd", vec![field(1, 3, "a"), field(2, 4, "b")]),
            Err(CodecError::SizeMismatch { expected: 8, actual: 7, .. })
        ));
        assert!(Layout::new("Even", vec![field(1, 3, "a"), field(2, 5, "b")]).is_ok());
    }

    #[test]
    fn test_fixed_size() {
        let fields = vec![field(1, 8, "a"), field(2, 8, "b")];
        assert!(Layout::with_size("Two", fields.clone(), 16).is_ok());
        assert!(matches!(
            Layout::with_size("Two", fields, 24),
            Err(CodecError::SizeMismatch { expected: 24, actual: 16, .. })
        ));
    }

    #[test]
    fn test_offsets() {
        let layout = Layout::new(
            "Flags",
            vec![field(3, 6, "reserved"), field(2, 1, "change"), field(1, 1, "desired")],
        )
        .unwrap();
        assert_eq!(layout.bit_offset("desired"), Some(7));
        assert_eq!(layout.field_by_fid(2).map(Field::name), Some("change"));
        assert_eq!(layout.byte_length(), 1);
    }
}
