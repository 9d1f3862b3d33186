//! Feature-layer error types

use hidpp_codec::CodecError;
use thiserror::Error;

/// Errors raised by feature models, factories and sessions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeatureError {
    /// Frame-level failure
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Version not declared by the feature
    #[error("Feature 0x{feature_id:04X} has no version {version}")]
    UnknownVersion { feature_id: u16, version: u8 },

    /// Function index not bound for the version
    #[error("Feature 0x{feature_id:04X} v{version} has no function index {index}")]
    UnknownFunctionIndex {
        feature_id: u16,
        version: u8,
        index: u8,
    },

    /// Event index not bound for the version
    #[error("Feature 0x{feature_id:04X} v{version} has no event index {index}")]
    UnknownEventIndex {
        feature_id: u16,
        version: u8,
        index: u8,
    },

    /// Interface attribute exists but this version leaves it unbound
    #[error("{feature}.{attribute} is not implemented")]
    NotImplemented { feature: String, attribute: String },

    /// Attribute not part of the feature interface
    #[error("{feature} has no attribute {attribute}")]
    UnknownAttribute { feature: String, attribute: String },

    /// Feature id not registered
    #[error("Unknown feature 0x{0:04X}")]
    UnknownFeature(u16),

    /// Feature id known but absent from the session table
    #[error("Feature 0x{0:04X} is not in the session table")]
    NotInSession(u16),

    /// Feature index not mapped in the session table
    #[error("No feature at index 0x{0:02X}")]
    UnknownFeatureIndex(u8),

    /// Index 0xFF is reserved for error packets
    #[error("Feature index 0x{0:02X} is reserved")]
    ReservedFeatureIndex(u8),

    /// Inconsistent feature declaration
    #[error("Invalid feature model: {0}")]
    InvalidModel(String),
}

impl FeatureError {
    /// Version, function or event lookup miss
    pub fn is_key_error(&self) -> bool {
        matches!(
            self,
            FeatureError::UnknownVersion { .. }
                | FeatureError::UnknownFunctionIndex { .. }
                | FeatureError::UnknownEventIndex { .. }
        )
    }
}
