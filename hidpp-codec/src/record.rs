//! Bit-field container: per-instance values over a shared [`Layout`]

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::bits::{BitReader, BitWriter};
use crate::check::Check;
use crate::error::CodecError;
use crate::field::Field;
use crate::hexlist::HexList;
use crate::layout::Layout;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
enum Slot {
    /// Resolved from the field default at read time
    Default,
    /// Optional field left out of the wire form
    Absent,
    Set(Value),
}

/// Values for every field of a layout, serialized in declaration order
#[derive(Debug, Clone)]
pub struct Record {
    layout: Arc<Layout>,
    slots: Vec<Slot>,
}

impl Record {
    /// Record with every field at its default
    pub fn new(layout: Arc<Layout>) -> Self {
        let slots = vec![Slot::Default; layout.fields().len()];
        Self { layout, slots }
    }

    /// Record from `(name, value)` pairs; unnamed fields keep their defaults
    pub fn from_values<I, K, V>(layout: Arc<Layout>, values: I) -> Result<Self, CodecError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut record = Self::new(layout);
        for (name, value) in values {
            record.set(name.as_ref(), value)?;
        }
        Ok(record)
    }

    /// Parse exactly the layout's wire form; every value is checked
    pub fn from_bytes(layout: Arc<Layout>, data: &[u8]) -> Result<Self, CodecError> {
        let mut reader = BitReader::new(data);
        let record = Self::read_from(layout, &mut reader)?;
        if reader.remaining() != 0 {
            return Err(CodecError::FrameLength {
                layout: record.layout.name().to_string(),
                expected: reader.position() / 8,
                actual: data.len(),
            });
        }
        trace!(layout = record.layout.name(), data = %HexList::from(data), "parsed record");
        Ok(record)
    }

    fn read_from(layout: Arc<Layout>, reader: &mut BitReader<'_>) -> Result<Self, CodecError> {
        let mut slots = Vec::with_capacity(layout.fields().len());
        for field in layout.fields() {
            if reader.remaining() == 0 && field.is_optional() {
                slots.push(Slot::Absent);
                continue;
            }
            let missing = || CodecError::MissingField {
                layout: layout.name().to_string(),
                field: field.name().to_string(),
            };
            let value = if field.is_variable() {
                let len = reader.read(8).ok_or_else(missing)?[0] as usize;
                if len > field.byte_length() {
                    return Err(CodecError::out_of_range(
                        field.name(),
                        format!("length prefix {len} exceeds {} bytes", field.byte_length()),
                    ));
                }
                Value::Bytes(HexList::from(reader.read(len * 8).ok_or_else(missing)?))
            } else {
                let aligned = reader.position() % 8 == 0 && field.length() % 8 == 0;
                let raw = reader.read(field.length()).ok_or_else(missing)?;
                field.decode(raw, aligned)
            };
            field.check_value(Some(&value))?;
            slots.push(Slot::Set(value));
        }
        Ok(Self { layout, slots })
    }

    /// Concatenate every field MSB-first in declaration order
    pub fn to_bytes(&self) -> Result<HexList, CodecError> {
        let mut writer = BitWriter::new();
        for (idx, field) in self.layout.fields().iter().enumerate() {
            let Some(value) = self.resolve(idx) else {
                continue;
            };
            let bytes = field.encode(&value)?;
            if field.is_variable() {
                writer.write(&[bytes.len() as u8], 8);
                writer.write(&bytes, bytes.len() * 8);
            } else {
                writer.write(&bytes, field.length());
            }
        }
        trace!(record = self.name(), bits = writer.bit_len(), "encoded record");
        Ok(HexList::from(writer.into_bytes()))
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    pub fn name(&self) -> &str {
        self.layout.name()
    }

    pub fn fields(&self) -> &[Field] {
        self.layout.fields()
    }

    fn index(&self, name: &str) -> Result<usize, CodecError> {
        self.layout
            .position(name)
            .ok_or_else(|| self.layout.unknown(name))
    }

    /// Convert, check then store a field value
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), CodecError> {
        let idx = self.index(name)?;
        let field = &self.layout.fields()[idx];
        let value = match field.convert(value.into())? {
            Value::Bool(b) if !field.checks().contains(&Check::Bool) => Value::Int(i128::from(b)),
            other => other,
        };
        field.check_value(Some(&value))?;
        trace!(layout = self.layout.name(), field = name, value = %value, "set");
        self.slots[idx] = Slot::Set(value);
        Ok(())
    }

    /// Builder form of [`Record::set`]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Result<Self, CodecError> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Mark an optional field absent so it is skipped on serialization
    pub fn clear(&mut self, name: &str) -> Result<(), CodecError> {
        let idx = self.index(name)?;
        let field = &self.layout.fields()[idx];
        field.check_value(None)?;
        self.slots[idx] = Slot::Absent;
        Ok(())
    }

    /// Return a field to its default
    pub fn reset(&mut self, name: &str) -> Result<(), CodecError> {
        let idx = self.index(name)?;
        self.slots[idx] = Slot::Default;
        Ok(())
    }

    /// True when the value was assigned or parsed rather than defaulted
    pub fn is_set(&self, name: &str) -> bool {
        self.layout
            .position(name)
            .is_some_and(|idx| matches!(self.slots[idx], Slot::Set(_)))
    }

    /// Current value, `None` for an absent optional field
    pub fn value(&self, name: &str) -> Result<Option<Value>, CodecError> {
        Ok(self.resolve(self.index(name)?))
    }

    pub fn get(&self, name: &str) -> Result<Value, CodecError> {
        self.value(name)?.ok_or_else(|| CodecError::MissingField {
            layout: self.layout.name().to_string(),
            field: name.to_string(),
        })
    }

    /// Unsigned integer view of a field of at most 64 bits
    pub fn get_int(&self, name: &str) -> Result<u64, CodecError> {
        let bytes = self.get_bytes(name)?;
        bytes
            .to_int()
            .and_then(|v| u64::try_from(v).ok())
            .ok_or_else(|| CodecError::out_of_range(name, "value wider than 64 bits"))
    }

    /// Wire bytes of one field, right-aligned
    pub fn get_bytes(&self, name: &str) -> Result<HexList, CodecError> {
        let idx = self.index(name)?;
        let value = self.get(name)?;
        Ok(HexList::from(self.layout.fields()[idx].encode(&value)?))
    }

    /// True iff every present field passes its checks
    pub fn check_value(&self) -> bool {
        self.layout.fields().iter().enumerate().all(|(idx, field)| {
            match &self.slots[idx] {
                Slot::Absent => field.check_value(None).is_ok(),
                Slot::Set(v) => field.check_value(Some(v)).is_ok(),
                Slot::Default => match field.default_value(self) {
                    Some(v) => field.check_value(Some(&v)).is_ok(),
                    None => true,
                },
            }
        })
    }

    /// Fields taking part in the integrity computation
    pub fn finger_print_fields(&self) -> impl Iterator<Item = &Field> {
        self.layout.fields().iter().filter(|f| f.is_finger_print())
    }

    fn resolve(&self, idx: usize) -> Option<Value> {
        let field = &self.layout.fields()[idx];
        match &self.slots[idx] {
            Slot::Set(v) => Some(v.clone()),
            Slot::Absent => None,
            Slot::Default => Some(
                field
                    .default_value(self)
                    .unwrap_or_else(|| zero_value(field)),
            ),
        }
    }
}

/// Implicit default of a field declared without one
fn zero_value(field: &Field) -> Value {
    if field.is_variable() {
        Value::Bytes(HexList::new())
    } else if field.length() % 8 == 0 {
        Value::Bytes(HexList::zeros(field.byte_length()))
    } else {
        Value::Int(0)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        if self.layout.name() != other.layout.name() {
            return false;
        }
        match (self.to_bytes(), other.to_bytes()) {
            (Ok(a), Ok(b)) => a == b,
            _ => self.slots == other.slots,
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_bytes() {
            Ok(bytes) => writeln!(f, "{}: 0x{bytes}", self.layout.name())?,
            Err(_) => writeln!(f, "{}: <invalid>", self.layout.name())?,
        }
        for (idx, field) in self.layout.fields().iter().enumerate() {
            match self.resolve(idx) {
                Some(value) => writeln!(f, "  {} {value}", field.summary())?,
                None => writeln!(f, "  {} <absent>", field.summary())?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::DefaultValue;

    fn cutoff_layout() -> Arc<Layout> {
        let fields = vec![
            Field::new(0xFA, 6)
                .unwrap()
                .with_name("reserved")
                .with_checks([Check::int_bits(6)])
                .with_default(0)
                .unwrap(),
            Field::new(0xF9, 1)
                .unwrap()
                .with_name("change")
                .with_checks([Check::int_bits(1)]),
            Field::new(0xF8, 1)
                .unwrap()
                .with_name("desired")
                .with_checks([Check::int_bits(1)]),
            Field::new(0xF7, 16)
                .unwrap()
                .with_name("padding")
                .with_checks([Check::hex_list(2), Check::int_bits(16)]),
        ];
        Arc::new(Layout::with_size("CutOff", fields, 24).unwrap())
    }

    #[test]
    fn test_from_values_and_bytes() {
        let record =
            Record::from_values(cutoff_layout(), [("change", 1u8), ("desired", 0u8)]).unwrap();
        assert_eq!(record.to_bytes().unwrap().as_slice(), &[0x02, 0x00, 0x00]);

        let parsed = Record::from_bytes(cutoff_layout(), &[0x02, 0x00, 0x00]).unwrap();
        assert_eq!(parsed.get_int("change").unwrap(), 1);
        assert_eq!(parsed.get_int("desired").unwrap(), 0);
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_unknown_name_rejected() {
        let err = Record::from_values(cutoff_layout(), [("bogus", 1u8)]).unwrap_err();
        assert!(matches!(err, CodecError::UnknownField { .. }));
    }

    #[test]
    fn test_assignment_round_trip() {
        let mut record = Record::new(cutoff_layout());
        for v in 0..=1u8 {
            record.set("desired", v).unwrap();
            assert_eq!(record.get("desired").unwrap(), Value::Int(i128::from(v)));
        }
        record.set("padding", [0xAAu8, 0x55]).unwrap();
        assert_eq!(record.get("padding").unwrap(), Value::from([0xAAu8, 0x55]));
        record.set("change", true).unwrap();
        assert_eq!(record.get("change").unwrap(), Value::Int(1));
    }

    #[test]
    fn test_assignment_errors() {
        let mut record = Record::new(cutoff_layout());
        assert!(record.set("change", 2).unwrap_err().is_range_error());
        assert!(record.set("change", -1).unwrap_err().is_range_error());
        assert!(record.set("change", "1").unwrap_err().is_type_error());
        assert!(record.set("padding", [0u8; 3]).unwrap_err().is_range_error());
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(Record::from_bytes(cutoff_layout(), &[0x02, 0x00]).is_err());
        assert!(Record::from_bytes(cutoff_layout(), &[0x02, 0x00, 0x00, 0x00]).is_err());
    }

    #[test]
    fn test_computed_default() {
        fn twice_change(record: &Record) -> Value {
            Value::Int(i128::from(record.get_int("change").unwrap_or(0) as u8) * 2)
        }
        let fields = vec![
            Field::new(2, 8).unwrap().with_name("change"),
            Field::new(1, 8).unwrap().with_name("double").with_computed_default(twice_change),
        ];
        let layout = Arc::new(Layout::new("Computed", fields).unwrap());
        let record = Record::from_values(layout, [("change", 21u8)]).unwrap();
        assert_eq!(record.to_bytes().unwrap().as_slice(), &[21, 42]);
        assert!(matches!(
            record.fields()[1].default(),
            Some(DefaultValue::Computed(_))
        ));
    }

    #[test]
    fn test_optional_and_variable_fields() {
        let fields = vec![
            Field::new(2, 8).unwrap().with_name("kind"),
            Field::new(1, 32)
                .unwrap()
                .with_name("payload")
                .variable(true)
                .optional(true),
        ];
        let layout = Arc::new(Layout::new("Tlv", fields).unwrap());

        let mut record = Record::from_values(layout.clone(), [("kind", 7u8)]).unwrap();
        record.set("payload", vec![0xAB, 0xCD]).unwrap();
        let bytes = record.to_bytes().unwrap();
        assert_eq!(bytes.as_slice(), &[0x07, 0x02, 0xAB, 0xCD]);
        assert_eq!(Record::from_bytes(layout.clone(), &bytes).unwrap(), record);

        record.clear("payload").unwrap();
        assert_eq!(record.to_bytes().unwrap().as_slice(), &[0x07]);
        let parsed = Record::from_bytes(layout, &[0x07]).unwrap();
        assert_eq!(parsed.value("payload").unwrap(), None);
        assert!(parsed.check_value());
    }

    #[test]
    fn test_display_lists_fields() {
        let record = Record::from_values(cutoff_layout(), [("change", 1u8)]).unwrap();
        let text = record.to_string();
        assert!(text.starts_with("CutOff: 0x020000"));
        assert_eq!(text.lines().count(), 5);
    }
}
