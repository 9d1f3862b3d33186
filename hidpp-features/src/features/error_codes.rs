//! Feature 0x00FF - HID++ 2.0 error packet
//!
//! Sent in place of a response when a request fails. The feature index byte is
//! 0xFF and the function/software byte carries the failing request's feature
//! index.

use std::fmt;
use std::sync::{Arc, OnceLock};

use hidpp_codec::{
    CodecError, FieldDecl, FrameDecl, FrameSize, Message, MessageClass, ERROR_FEATURE_INDEX,
};

use crate::error::FeatureError;

pub const ERROR_FEATURE_ID: u16 = 0x00FF;

/// Field widths in bits
pub mod len {
    pub const FUNCTION_INDEX: u16 = 4;
    pub const SOFTWARE_ID: u16 = 4;
    pub const ERROR_CODE: u16 = 8;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    NoError = 0,
    Unknown = 1,
    InvalidArgument = 2,
    OutOfRange = 3,
    HwError = 4,
    LogitechInternal = 5,
    InvalidFeatureIndex = 6,
    InvalidFunctionId = 7,
    Busy = 8,
    Unsupported = 9,
}

impl ErrorCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ErrorCode::NoError),
            1 => Some(ErrorCode::Unknown),
            2 => Some(ErrorCode::InvalidArgument),
            3 => Some(ErrorCode::OutOfRange),
            4 => Some(ErrorCode::HwError),
            5 => Some(ErrorCode::LogitechInternal),
            6 => Some(ErrorCode::InvalidFeatureIndex),
            7 => Some(ErrorCode::InvalidFunctionId),
            8 => Some(ErrorCode::Busy),
            9 => Some(ErrorCode::Unsupported),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorCode::NoError => "no error",
            ErrorCode::Unknown => "unknown",
            ErrorCode::InvalidArgument => "invalid argument",
            ErrorCode::OutOfRange => "out of range",
            ErrorCode::HwError => "hardware error",
            ErrorCode::LogitechInternal => "internal",
            ErrorCode::InvalidFeatureIndex => "invalid feature index",
            ErrorCode::InvalidFunctionId => "invalid function id",
            ErrorCode::Busy => "busy",
            ErrorCode::Unsupported => "unsupported",
        };
        f.write_str(text)
    }
}

pub const ERROR_FRAME: FrameDecl = FrameDecl::error(
    "ErrorCodes",
    FrameSize::Long,
    &[
        FieldDecl::uint("failed_function_index", len::FUNCTION_INDEX),
        FieldDecl::uint("failed_software_id", len::SOFTWARE_ID),
        FieldDecl::uint("error_code", len::ERROR_CODE),
    ],
);

static ERROR_CLASS: OnceLock<Result<Arc<MessageClass>, CodecError>> = OnceLock::new();

/// The shared error packet class
pub fn error_packet_cls() -> Result<&'static Arc<MessageClass>, FeatureError> {
    ERROR_CLASS
        .get_or_init(|| ERROR_FRAME.build(ERROR_FEATURE_ID).map(Arc::new))
        .as_ref()
        .map_err(|e| FeatureError::Codec(e.clone()))
}

/// One error packet
#[derive(Debug, Clone)]
pub struct ErrorPacket(Message);

impl ErrorPacket {
    pub fn new(
        device_index: u8,
        failed_feature_index: u8,
        failed_function_index: u8,
        failed_software_id: u8,
        code: ErrorCode,
    ) -> Result<Self, FeatureError> {
        let mut message = Message::new(error_packet_cls()?.clone(), device_index, ERROR_FEATURE_INDEX);
        message.prologue_mut().set_function_software(failed_feature_index);
        message.set("failed_function_index", failed_function_index)?;
        message.set("failed_software_id", failed_software_id)?;
        message.set("error_code", code as u8)?;
        Ok(Self(message))
    }

    /// Parse a frame whose feature index byte is 0xFF
    pub fn from_bytes(data: &[u8]) -> Result<Self, FeatureError> {
        let message = Message::from_bytes(error_packet_cls()?.clone(), data)?;
        if message.feature_index() != ERROR_FEATURE_INDEX {
            return Err(CodecError::OutOfRange {
                field: "feature_index".to_string(),
                reason: format!("0x{:02X} is not an error packet", message.feature_index()),
            }
            .into());
        }
        Ok(Self(message))
    }

    pub fn message(&self) -> &Message {
        &self.0
    }

    pub fn device_index(&self) -> u8 {
        self.0.device_index()
    }

    /// Feature index of the request that failed
    pub fn failed_feature_index(&self) -> u8 {
        self.0.prologue().function_software()
    }

    pub fn failed_function_index(&self) -> Result<u8, FeatureError> {
        Ok(self.0.get_int("failed_function_index")? as u8)
    }

    pub fn failed_software_id(&self) -> Result<u8, FeatureError> {
        Ok(self.0.get_int("failed_software_id")? as u8)
    }

    pub fn raw_error_code(&self) -> Result<u8, FeatureError> {
        Ok(self.0.get_int("error_code")? as u8)
    }

    /// `None` for codes outside the defined set
    pub fn error_code(&self) -> Result<Option<ErrorCode>, FeatureError> {
        Ok(ErrorCode::from_u8(self.raw_error_code()?))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, FeatureError> {
        Ok(self.0.to_bytes()?.into_vec())
    }
}

impl fmt::Display for ErrorPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.raw_error_code().unwrap_or_default();
        match ErrorCode::from_u8(code) {
            Some(known) => write!(
                f,
                "error {known} (0x{code:02X}) from feature index 0x{:02X}",
                self.failed_feature_index()
            ),
            None => write!(
                f,
                "error 0x{code:02X} from feature index 0x{:02X}",
                self.failed_feature_index()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_from_u8() {
        assert_eq!(ErrorCode::from_u8(0), Some(ErrorCode::NoError));
        assert_eq!(ErrorCode::from_u8(7), Some(ErrorCode::InvalidFunctionId));
        assert_eq!(ErrorCode::from_u8(9), Some(ErrorCode::Unsupported));
        assert_eq!(ErrorCode::from_u8(10), None);
        assert_eq!(ErrorCode::Busy as u8, 8);
    }

    #[test]
    fn test_error_packet_wire() {
        let packet = ErrorPacket::new(0x01, 0x04, 0x02, 0x0A, ErrorCode::InvalidArgument).unwrap();
        let bytes = packet.to_bytes().unwrap();
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[..6], &[0x11, 0x01, 0xFF, 0x04, 0x2A, 0x02]);
        assert!(bytes[6..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_error_packet_parse() {
        let mut frame = vec![0x11, 0x02, 0xFF, 0x09, 0x11, 0x06];
        frame.resize(20, 0);
        let packet = ErrorPacket::from_bytes(&frame).unwrap();
        assert_eq!(packet.device_index(), 0x02);
        assert_eq!(packet.failed_feature_index(), 0x09);
        assert_eq!(packet.failed_function_index().unwrap(), 1);
        assert_eq!(packet.failed_software_id().unwrap(), 1);
        assert_eq!(packet.error_code().unwrap(), Some(ErrorCode::InvalidFeatureIndex));
        assert!(packet.to_string().contains("invalid feature index"));
    }

    #[test]
    fn test_error_packet_rejects_other_frames() {
        let mut frame = vec![0x11, 0x02, 0x05, 0x09, 0x11, 0x06];
        frame.resize(20, 0);
        assert!(ErrorPacket::from_bytes(&frame).is_err());

        let short = [0x10, 0x02, 0xFF, 0x09, 0x11, 0x06, 0x00];
        assert!(ErrorPacket::from_bytes(&short).is_err());
    }
}
