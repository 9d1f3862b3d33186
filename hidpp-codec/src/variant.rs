//! Discriminated nested payloads
//!
//! A `data` field whose meaning depends on a sibling `data_type` field is a
//! tagged sum. [`Message::variant`] decodes it through the layout selected by
//! the tag; [`Message::set_variant`] writes both fields from a typed record.

use std::sync::Arc;

use tracing::warn;

use crate::error::CodecError;
use crate::hexlist::HexList;
use crate::layout::Layout;
use crate::message::Message;
use crate::record::Record;

/// Tag field, data field and the nested layout for each tag value
#[derive(Debug, Clone, PartialEq)]
pub struct Discriminator {
    tag: String,
    data: String,
    variants: Vec<(u64, Arc<Layout>)>,
}

impl Discriminator {
    /// The last variant is the fallback for unknown tags
    pub fn new(
        tag: impl Into<String>,
        data: impl Into<String>,
        variants: Vec<(u64, Arc<Layout>)>,
    ) -> Result<Self, CodecError> {
        let tag = tag.into();
        if variants.is_empty() {
            return Err(CodecError::InvalidDeclaration(format!(
                "discriminator on {tag} declares no variant"
            )));
        }
        for (i, (value, _)) in variants.iter().enumerate() {
            if variants[..i].iter().any(|(other, _)| other == value) {
                return Err(CodecError::InvalidDeclaration(format!(
                    "discriminator on {tag} repeats value 0x{value:02X}"
                )));
            }
        }
        Ok(Self {
            tag,
            data: data.into(),
            variants,
        })
    }

    pub(crate) fn validate_against(&self, payload: &Layout) -> Result<(), CodecError> {
        if payload.field(&self.tag).is_none() {
            return Err(payload.unknown(&self.tag));
        }
        let data = payload
            .field(&self.data)
            .ok_or_else(|| payload.unknown(&self.data))?;
        for (_, layout) in &self.variants {
            if layout.bit_length() != data.length() {
                return Err(CodecError::SizeMismatch {
                    layout: layout.name().to_string(),
                    expected: data.length(),
                    actual: layout.bit_length(),
                });
            }
        }
        Ok(())
    }

    pub fn tag_field(&self) -> &str {
        &self.tag
    }

    pub fn data_field(&self) -> &str {
        &self.data
    }

    pub fn variants(&self) -> &[(u64, Arc<Layout>)] {
        &self.variants
    }

    /// Layout for `tag`, and whether the tag was declared
    pub fn layout_for(&self, tag: u64) -> (&Arc<Layout>, bool) {
        match self.variants.iter().find(|(value, _)| *value == tag) {
            Some((_, layout)) => (layout, true),
            None => (&self.fallback().1, false),
        }
    }

    pub fn tag_for(&self, layout_name: &str) -> Option<u64> {
        self.variants
            .iter()
            .find(|(_, layout)| layout.name() == layout_name)
            .map(|(value, _)| *value)
    }

    fn fallback(&self) -> &(u64, Arc<Layout>) {
        // new() guarantees at least one variant
        &self.variants[self.variants.len() - 1]
    }
}

/// Decoded nested payload with the raw bytes it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    tag: u64,
    recognized: bool,
    raw: HexList,
    record: Record,
}

impl Variant {
    pub fn tag(&self) -> u64 {
        self.tag
    }

    /// False when the tag was unknown and the fallback layout was used
    pub fn is_recognized(&self) -> bool {
        self.recognized
    }

    pub fn raw(&self) -> &HexList {
        &self.raw
    }

    pub fn name(&self) -> &str {
        self.record.name()
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn into_record(self) -> Record {
        self.record
    }
}

impl Message {
    fn discriminator_or_err(&self) -> Result<Discriminator, CodecError> {
        self.class().discriminator().cloned().ok_or_else(|| {
            CodecError::InvalidDeclaration(format!(
                "{} has no discriminated payload",
                self.class().name()
            ))
        })
    }

    /// Decode the data field through the layout its tag selects
    pub fn variant(&self) -> Result<Variant, CodecError> {
        let discriminator = self.discriminator_or_err()?;
        let tag = self.get_int(discriminator.tag_field())?;
        let raw = self.get_bytes(discriminator.data_field())?;
        let (layout, recognized) = discriminator.layout_for(tag);
        if !recognized {
            warn!(
                class = self.class().name(),
                tag,
                raw = %raw,
                "unknown {}, decoding as {}",
                discriminator.tag_field(),
                layout.name()
            );
        }
        let record = Record::from_bytes(layout.clone(), &raw)?;
        Ok(Variant {
            tag,
            recognized,
            raw,
            record,
        })
    }

    /// Write the tag and data fields from a typed nested record
    pub fn set_variant(&mut self, record: Record) -> Result<(), CodecError> {
        let discriminator = self.discriminator_or_err()?;
        let tag = discriminator.tag_for(record.name()).ok_or_else(|| {
            CodecError::InvalidDeclaration(format!(
                "{} is not a variant of {}",
                record.name(),
                self.class().name()
            ))
        })?;
        self.set(discriminator.tag_field(), tag)?;
        self.set(discriminator.data_field(), record)
    }
}
