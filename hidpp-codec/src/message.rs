//! HID++ 2.0 message base: prologue, frame sizes and message classes
//!
//! Every frame is `prologue (4 bytes) | payload | padding`. The payload is a
//! [`Record`] over the class layout; padding fills the remainder of the short
//! (7 bytes) or long (20 bytes) report with the class padding byte.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::trace;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::CodecError;
use crate::field::Field;
use crate::hexlist::HexList;
use crate::layout::Layout;
use crate::record::Record;
use crate::value::Value;
use crate::variant::Discriminator;

// =============================================================================
// Constants
// =============================================================================

pub const REPORT_ID_SHORT: u8 = 0x10;
pub const REPORT_ID_LONG: u8 = 0x11;

pub const SHORT_FRAME_LEN: usize = 7;
pub const LONG_FRAME_LEN: usize = 20;
pub const PROLOGUE_LEN: usize = 4;

pub const DEFAULT_PADDING: u8 = 0x00;
/// Reserved for frames without correlation (events)
pub const DEFAULT_SOFTWARE_ID: u8 = 0x00;
pub const MAX_NIBBLE: u8 = 0x0F;

/// Feature index carried by error packets
pub const ERROR_FEATURE_INDEX: u8 = 0xFF;

/// Prologue field widths in bits
pub mod len {
    pub const REPORT_ID: usize = 8;
    pub const DEVICE_INDEX: usize = 8;
    pub const FEATURE_INDEX: usize = 8;
    pub const FUNCTION_INDEX: usize = 4;
    pub const SOFTWARE_ID: usize = 4;
}

/// Prologue field identifiers; payload ids start below them
pub mod fid {
    pub const REPORT_ID: u8 = 0xFF;
    pub const DEVICE_INDEX: u8 = 0xFE;
    pub const FEATURE_INDEX: u8 = 0xFD;
    pub const FUNCTION_INDEX: u8 = 0xFC;
    pub const SOFTWARE_ID: u8 = 0xFB;
    pub const FIRST_PAYLOAD: u8 = 0xFA;
}

/// Prologue field names, reserved across every payload
pub const PROLOGUE_NAMES: [&str; 5] = [
    "report_id",
    "device_index",
    "feature_index",
    "function_index",
    "software_id",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameSize {
    Short,
    Long,
}

impl FrameSize {
    /// Total frame length in bytes
    pub const fn len(self) -> usize {
        match self {
            FrameSize::Short => SHORT_FRAME_LEN,
            FrameSize::Long => LONG_FRAME_LEN,
        }
    }

    /// Bits available after the prologue
    pub const fn payload_bits(self) -> usize {
        (self.len() - PROLOGUE_LEN) * 8
    }

    pub const fn report_id(self) -> u8 {
        match self {
            FrameSize::Short => REPORT_ID_SHORT,
            FrameSize::Long => REPORT_ID_LONG,
        }
    }

    pub fn from_len(len: usize) -> Option<Self> {
        match len {
            SHORT_FRAME_LEN => Some(FrameSize::Short),
            LONG_FRAME_LEN => Some(FrameSize::Long),
            _ => None,
        }
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameSize::Short => f.write_str("short"),
            FrameSize::Long => f.write_str("long"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Request,
    Response,
    Event,
    Error,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageType::Request => "request",
            MessageType::Response => "response",
            MessageType::Event => "event",
            MessageType::Error => "error",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Prologue
// =============================================================================

/// The 4 bytes every HID++ 2.0 frame starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct Prologue {
    report_id: u8,
    device_index: u8,
    feature_index: u8,
    function_software: u8,
}

impl Prologue {
    pub fn new(
        report_id: u8,
        device_index: u8,
        feature_index: u8,
        function_index: u8,
        software_id: u8,
    ) -> Result<Self, CodecError> {
        let mut prologue = Self {
            report_id,
            device_index,
            feature_index,
            function_software: 0,
        };
        prologue.set_function_index(function_index)?;
        prologue.set_software_id(software_id)?;
        Ok(prologue)
    }

    pub fn parse(data: &[u8]) -> Result<Self, CodecError> {
        Self::read_from_prefix(data)
            .map(|(prologue, _)| prologue)
            .map_err(|_| CodecError::FrameLength {
                layout: "Prologue".to_string(),
                expected: PROLOGUE_LEN,
                actual: data.len(),
            })
    }

    pub fn report_id(&self) -> u8 {
        self.report_id
    }

    pub fn device_index(&self) -> u8 {
        self.device_index
    }

    pub fn feature_index(&self) -> u8 {
        self.feature_index
    }

    pub fn function_index(&self) -> u8 {
        self.function_software >> 4
    }

    pub fn software_id(&self) -> u8 {
        self.function_software & MAX_NIBBLE
    }

    /// Raw fourth byte; error packets carry the failing feature index here
    pub fn function_software(&self) -> u8 {
        self.function_software
    }

    pub fn set_report_id(&mut self, report_id: u8) {
        self.report_id = report_id;
    }

    pub fn set_device_index(&mut self, device_index: u8) {
        self.device_index = device_index;
    }

    pub fn set_feature_index(&mut self, feature_index: u8) {
        self.feature_index = feature_index;
    }

    pub fn set_function_index(&mut self, function_index: u8) -> Result<(), CodecError> {
        check_nibble("function_index", function_index)?;
        self.function_software = (function_index << 4) | self.software_id();
        Ok(())
    }

    pub fn set_software_id(&mut self, software_id: u8) -> Result<(), CodecError> {
        check_nibble("software_id", software_id)?;
        self.function_software = (self.function_software & 0xF0) | software_id;
        Ok(())
    }

    pub fn set_function_software(&mut self, raw: u8) {
        self.function_software = raw;
    }
}

fn check_nibble(name: &str, value: u8) -> Result<(), CodecError> {
    if value > MAX_NIBBLE {
        return Err(CodecError::out_of_range(
            name,
            format!("Value {value} greater than max {MAX_NIBBLE}"),
        ));
    }
    Ok(())
}

// =============================================================================
// Software ID allocation
// =============================================================================

/// Hands out correlation ids cyclically in `1..=15`
#[derive(Debug, Default)]
pub struct SoftwareIdCounter {
    last: AtomicU8,
}

impl SoftwareIdCounter {
    pub const fn new() -> Self {
        Self {
            last: AtomicU8::new(DEFAULT_SOFTWARE_ID),
        }
    }

    pub fn next_id(&self) -> u8 {
        let prev = self
            .last
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(Self::step(v)))
            .unwrap_or_else(|v| v);
        Self::step(prev)
    }

    fn step(v: u8) -> u8 {
        if v >= MAX_NIBBLE {
            1
        } else {
            v + 1
        }
    }
}

// =============================================================================
// Message classes
// =============================================================================

/// Class-level constants of one concrete frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    pub name: String,
    pub feature_id: u16,
    pub msg_type: MessageType,
    /// Function index for requests and responses, event index for events
    pub index: u8,
    pub size: FrameSize,
    pub report_id: u8,
    pub padding: u8,
    /// Firmware versions in which this exact class applies
    pub versions: Vec<u8>,
    /// Requests a response answers
    pub request_list: Vec<String>,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>, feature_id: u16, msg_type: MessageType, index: u8) -> Self {
        Self {
            name: name.into(),
            feature_id,
            msg_type,
            index,
            size: FrameSize::Long,
            report_id: REPORT_ID_LONG,
            padding: DEFAULT_PADDING,
            versions: Vec::new(),
            request_list: Vec::new(),
        }
    }
}

/// One concrete frame type: class constants plus the payload layout
#[derive(Debug, Clone, PartialEq)]
pub struct MessageClass {
    info: ClassInfo,
    payload: Arc<Layout>,
    discriminator: Option<Discriminator>,
}

impl MessageClass {
    /// Payload fields exclude the prologue and the trailing padding
    pub fn new(info: ClassInfo, fields: Vec<Field>) -> Result<Self, CodecError> {
        if info.index > MAX_NIBBLE {
            return Err(CodecError::InvalidDeclaration(format!(
                "{}: index {} does not fit the function nibble",
                info.name, info.index
            )));
        }
        for field in &fields {
            if PROLOGUE_NAMES.contains(&field.name()) {
                return Err(CodecError::InvalidDeclaration(format!(
                    "{}: payload field {} shadows the prologue",
                    info.name,
                    field.name()
                )));
            }
            if field.fid() > fid::FIRST_PAYLOAD {
                return Err(CodecError::InvalidDeclaration(format!(
                    "{}: payload fid 0x{:02X} collides with the prologue",
                    info.name,
                    field.fid()
                )));
            }
            if field.is_variable() || field.is_optional() {
                return Err(CodecError::InvalidDeclaration(format!(
                    "{}: {} must have a fixed width in a HID++ frame",
                    info.name,
                    field.name()
                )));
            }
        }
        let payload = Layout::new(info.name.clone(), fields)?;
        let room = info.size.payload_bits();
        if payload.bit_length() > room {
            return Err(CodecError::SizeMismatch {
                layout: info.name,
                expected: room,
                actual: payload.bit_length(),
            });
        }
        Ok(Self {
            info,
            payload: Arc::new(payload),
            discriminator: None,
        })
    }

    /// Attach a data-type discriminator over two payload fields
    pub fn with_discriminator(mut self, discriminator: Discriminator) -> Result<Self, CodecError> {
        discriminator.validate_against(&self.payload)?;
        self.discriminator = Some(discriminator);
        Ok(self)
    }

    pub fn info(&self) -> &ClassInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn feature_id(&self) -> u16 {
        self.info.feature_id
    }

    pub fn msg_type(&self) -> MessageType {
        self.info.msg_type
    }

    pub fn index(&self) -> u8 {
        self.info.index
    }

    pub fn size(&self) -> FrameSize {
        self.info.size
    }

    pub fn report_id(&self) -> u8 {
        self.info.report_id
    }

    pub fn padding_byte(&self) -> u8 {
        self.info.padding
    }

    pub fn versions(&self) -> &[u8] {
        &self.info.versions
    }

    pub fn request_list(&self) -> &[String] {
        &self.info.request_list
    }

    pub fn applies_to(&self, version: u8) -> bool {
        self.info.versions.contains(&version)
    }

    pub fn payload(&self) -> &Arc<Layout> {
        &self.payload
    }

    pub fn discriminator(&self) -> Option<&Discriminator> {
        self.discriminator.as_ref()
    }

    /// Total frame length in bytes
    pub fn wire_size(&self) -> usize {
        self.info.size.len()
    }

    pub fn padding_len(&self) -> usize {
        self.wire_size() - PROLOGUE_LEN - self.payload.byte_length()
    }
}

impl fmt::Display for MessageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} 0x{:04X}, index {}, {} frame, VERSION {:?})",
            self.info.name,
            self.info.msg_type,
            self.info.feature_id,
            self.info.index,
            self.info.size,
            self.info.versions
        )
    }
}

// =============================================================================
// Messages
// =============================================================================

/// One frame instance
#[derive(Debug, Clone)]
pub struct Message {
    class: Arc<MessageClass>,
    prologue: Prologue,
    payload: Record,
    padding: HexList,
}

impl Message {
    /// Frame with the class report id and index; payload at defaults
    pub fn new(class: Arc<MessageClass>, device_index: u8, feature_index: u8) -> Self {
        let prologue = Prologue {
            report_id: class.report_id(),
            device_index,
            feature_index,
            function_software: (class.index() & MAX_NIBBLE) << 4,
        };
        let payload = Record::new(class.payload().clone());
        let padding = HexList::from(vec![class.padding_byte(); class.padding_len()]);
        Self {
            class,
            prologue,
            payload,
            padding,
        }
    }

    /// Parse a frame of exactly the class wire size
    pub fn from_bytes(class: Arc<MessageClass>, data: &[u8]) -> Result<Self, CodecError> {
        if data.len() != class.wire_size() {
            return Err(CodecError::FrameLength {
                layout: class.name().to_string(),
                expected: class.wire_size(),
                actual: data.len(),
            });
        }
        let prologue = Prologue::parse(data)?;
        let body = &data[PROLOGUE_LEN..];
        let split = class.payload().byte_length();
        let payload = Record::from_bytes(class.payload().clone(), &body[..split])?;
        let padding = HexList::from(&body[split..]);
        let message = Self {
            class,
            prologue,
            payload,
            padding,
        };
        if message.class.discriminator().is_some() {
            message.variant()?;
        }
        trace!(class = message.class.name(), data = %HexList::from(data), "parsed frame");
        Ok(message)
    }

    pub fn to_bytes(&self) -> Result<HexList, CodecError> {
        let mut out = HexList::from(self.prologue.as_bytes());
        out.extend_from_slice(&self.payload.to_bytes()?);
        out.extend_from_slice(&self.padding);
        trace!(class = self.class.name(), data = %out, "serialized frame");
        Ok(out)
    }

    pub fn class(&self) -> &Arc<MessageClass> {
        &self.class
    }

    pub fn prologue(&self) -> Prologue {
        self.prologue
    }

    pub fn report_id(&self) -> u8 {
        self.prologue.report_id()
    }

    pub fn device_index(&self) -> u8 {
        self.prologue.device_index()
    }

    pub fn feature_index(&self) -> u8 {
        self.prologue.feature_index()
    }

    pub fn function_index(&self) -> u8 {
        self.prologue.function_index()
    }

    pub fn software_id(&self) -> u8 {
        self.prologue.software_id()
    }

    pub fn prologue_mut(&mut self) -> &mut Prologue {
        &mut self.prologue
    }

    pub fn set_software_id(&mut self, software_id: u8) -> Result<(), CodecError> {
        self.prologue.set_software_id(software_id)
    }

    pub fn with_software_id(mut self, software_id: u8) -> Result<Self, CodecError> {
        self.prologue.set_software_id(software_id)?;
        Ok(self)
    }

    pub fn payload(&self) -> &Record {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut Record {
        &mut self.payload
    }

    pub fn padding(&self) -> &HexList {
        &self.padding
    }

    /// Fill every padding byte with `byte`
    pub fn set_padding(&mut self, byte: u8) {
        self.padding = HexList::from(vec![byte; self.padding.len()]);
    }

    /// Prologue or payload value by name
    pub fn get(&self, name: &str) -> Result<Value, CodecError> {
        let byte = match name {
            "report_id" => self.report_id(),
            "device_index" => self.device_index(),
            "feature_index" => self.feature_index(),
            "function_index" => self.function_index(),
            "software_id" => self.software_id(),
            _ => return self.payload.get(name),
        };
        Ok(Value::Int(i128::from(byte)))
    }

    pub fn get_int(&self, name: &str) -> Result<u64, CodecError> {
        match self.get(name)? {
            Value::Int(v) if PROLOGUE_NAMES.contains(&name) => Ok(v as u64),
            _ => self.payload.get_int(name),
        }
    }

    pub fn get_bytes(&self, name: &str) -> Result<HexList, CodecError> {
        if PROLOGUE_NAMES.contains(&name) {
            return Ok(HexList::from([self.get_int(name)? as u8]));
        }
        self.payload.get_bytes(name)
    }

    /// Assign a prologue or payload value by name
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), CodecError> {
        let value = value.into();
        match name {
            "report_id" => self.prologue.set_report_id(prologue_byte(name, &value, 0xFF)?),
            "device_index" => self.prologue.set_device_index(prologue_byte(name, &value, 0xFF)?),
            "feature_index" => self.prologue.set_feature_index(prologue_byte(name, &value, 0xFF)?),
            "function_index" => self
                .prologue
                .set_function_index(prologue_byte(name, &value, MAX_NIBBLE)?)?,
            "software_id" => self
                .prologue
                .set_software_id(prologue_byte(name, &value, MAX_NIBBLE)?)?,
            _ => self.payload.set(name, value)?,
        }
        Ok(())
    }

    /// Builder form of [`Message::set`]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Result<Self, CodecError> {
        self.set(name, value)?;
        Ok(self)
    }

    pub fn check_value(&self) -> bool {
        self.payload.check_value()
    }
}

fn prologue_byte(name: &str, value: &Value, max: u8) -> Result<u8, CodecError> {
    let v = match value {
        Value::Bytes(bytes) if bytes.len() == 1 => i128::from(bytes[0]),
        Value::Bytes(bytes) => {
            return Err(CodecError::out_of_range(
                name,
                format!("should be 1-byte long, got {}", bytes.len()),
            ))
        }
        other => other.as_int().ok_or_else(|| CodecError::TypeMismatch {
            field: name.to_string(),
            kind: other.kind().to_string(),
        })?,
    };
    if !(0..=i128::from(max)).contains(&v) {
        return Err(CodecError::out_of_range(
            name,
            format!("Value {v} outside [0..{max}]"),
        ));
    }
    Ok(v as u8)
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        if self.class.name() != other.class.name() {
            return false;
        }
        match (self.to_bytes(), other.to_bytes()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_bytes() {
            Ok(bytes) => writeln!(f, "{}: 0x{bytes}", self.class.name())?,
            Err(_) => writeln!(f, "{}: <invalid>", self.class.name())?,
        }
        writeln!(f, "  Report ID: 0x{:02X}", self.report_id())?;
        writeln!(f, "  Device Index: 0x{:02X}", self.device_index())?;
        writeln!(f, "  Feature Index: 0x{:02X}", self.feature_index())?;
        writeln!(f, "  Function Index: 0x{:X}", self.function_index())?;
        writeln!(f, "  Software ID: 0x{:X}", self.software_id())?;
        for field in self.payload.fields() {
            match self.payload.value(field.name()) {
                Ok(Some(value)) => writeln!(f, "  {} {value}", field.summary())?,
                _ => writeln!(f, "  {} <absent>", field.summary())?,
            }
        }
        if !self.padding.is_empty() {
            writeln!(f, "  Padding: 0x{}", self.padding)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Check;

    fn short_empty() -> Arc<MessageClass> {
        let mut info = ClassInfo::new("ShortEmpty", 0x1861, MessageType::Request, 2);
        info.size = FrameSize::Short;
        Arc::new(MessageClass::new(info, Vec::new()).unwrap())
    }

    #[test]
    fn test_prologue_nibbles() {
        let prologue = Prologue::new(REPORT_ID_SHORT, 0x01, 0x04, 0x4, 0xA).unwrap();
        assert_eq!(prologue.as_bytes(), &[0x10, 0x01, 0x04, 0x4A]);
        assert_eq!(prologue.function_index(), 4);
        assert_eq!(prologue.software_id(), 0xA);
        assert!(Prologue::new(REPORT_ID_SHORT, 1, 4, 0x10, 0).is_err());
        assert!(Prologue::new(REPORT_ID_SHORT, 1, 4, 0, 0x10).is_err());
        assert_eq!(Prologue::parse(&[0x11, 0xFF, 0x02, 0x1F, 0x00]).unwrap().software_id(), 0xF);
        assert!(Prologue::parse(&[0x11, 0xFF]).is_err());
    }

    #[test]
    fn test_short_empty_frame() {
        let message = Message::new(short_empty(), 0xFF, 0x05);
        assert_eq!(
            message.to_bytes().unwrap().as_slice(),
            &[0x11, 0xFF, 0x05, 0x20, 0x00, 0x00, 0x00]
        );
        assert_eq!(message.padding().len(), 3);
    }

    #[test]
    fn test_frame_length_enforced() {
        let err = Message::from_bytes(short_empty(), &[0x11, 0xFF, 0x05, 0x20]).unwrap_err();
        assert!(matches!(err, CodecError::FrameLength { expected: 7, actual: 4, .. }));
    }

    #[test]
    fn test_payload_too_wide() {
        let mut info = ClassInfo::new("TooWide", 0x0001, MessageType::Request, 0);
        info.size = FrameSize::Short;
        let fields = vec![Field::new(0xFA, 32).unwrap().with_name("wide")];
        assert!(matches!(
            MessageClass::new(info, fields),
            Err(CodecError::SizeMismatch { expected: 24, actual: 32, .. })
        ));
    }

    #[test]
    fn test_prologue_names_reserved() {
        let info = ClassInfo::new("Shadow", 0x0001, MessageType::Request, 0);
        let fields = vec![Field::new(0xFA, 8).unwrap().with_name("software_id")];
        assert!(MessageClass::new(info, fields).is_err());
    }

    #[test]
    fn test_software_id_and_padding_round_trip() {
        let class = short_empty();
        for sw in 0..=MAX_NIBBLE {
            let mut message = Message::new(class.clone(), 1, 2).with_software_id(sw).unwrap();
            message.set_padding(0xA5);
            let parsed = Message::from_bytes(class.clone(), &message.to_bytes().unwrap()).unwrap();
            assert_eq!(parsed.software_id(), sw);
            assert_eq!(parsed.function_index(), 2);
            assert_eq!(parsed.padding().as_slice(), &[0xA5; 3]);
        }
        assert!(Message::new(class, 1, 2).with_software_id(0x10).is_err());
    }

    #[test]
    fn test_get_set_by_name() {
        let mut info = ClassInfo::new("Ping", 0x0000, MessageType::Request, 1);
        info.size = FrameSize::Short;
        let fields = vec![Field::new(0xFA, 8)
            .unwrap()
            .with_name("ping_data")
            .with_checks([Check::hex_list(1), Check::Byte])];
        let class = Arc::new(MessageClass::new(info, fields).unwrap());
        let mut message = Message::new(class, 0xFF, 0x00);
        message.set("ping_data", 0x5A).unwrap();
        message.set("device_index", 2).unwrap();
        assert!(message.set("function_index", 16).is_err());
        assert_eq!(message.get_int("ping_data").unwrap(), 0x5A);
        assert_eq!(message.get_int("device_index").unwrap(), 2);
        assert_eq!(
            message.to_bytes().unwrap().as_slice(),
            &[0x11, 0x02, 0x00, 0x10, 0x5A, 0x00, 0x00]
        );
    }

    #[test]
    fn test_software_id_counter_cycles() {
        let counter = SoftwareIdCounter::new();
        let ids: Vec<u8> = (0..16).map(|_| counter.next_id()).collect();
        assert_eq!(ids[0], 1);
        assert_eq!(ids[14], 15);
        assert_eq!(ids[15], 1);
        assert!(ids.iter().all(|&id| id != DEFAULT_SOFTWARE_ID));
    }
}
