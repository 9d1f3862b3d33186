//! Harness error types

use hidpp_codec::CodecError;
use hidpp_features::FeatureError;
use thiserror::Error;

/// Errors raised while loading, validating or regenerating descriptors
#[derive(Error, Debug)]
pub enum DescriptorError {
    // Loading
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported descriptor format: {0}")]
    UnsupportedFormat(String),

    // Model
    #[error("Invalid version-info expression: {0:?}")]
    VersionInfo(String),

    #[error("{0}: parameter without sub-parameters must declare a size")]
    MissingSize(String),

    #[error("{0}: parameter without sub-parameters must declare a version-info expression")]
    MissingVersionInfo(String),

    #[error("Duplicate {kind} index {index}")]
    DuplicateIndex { kind: &'static str, index: u8 },

    #[error("{name}: index {index} does not fit the function nibble")]
    IndexOutOfRange { name: String, index: u8 },

    #[error("Version {0} is not declared by the descriptor")]
    UnknownVersion(u8),

    #[error("Invalid descriptor: {0}")]
    Validation(String),

    // Sizes
    #[error("{frame} v{version}: {bits} bits exceed the {limit}-bit payload")]
    Oversize {
        frame: String,
        version: u8,
        bits: u32,
        limit: u32,
    },

    // Lower layers
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Feature error: {0}")]
    Feature(#[from] FeatureError),
}

/// Errors raised while loading a session file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid feature id {0:?}")]
    FeatureId(String),

    #[error("Software id {0} does not fit the nibble")]
    SoftwareId(u8),

    #[error("Feature error: {0}")]
    Feature(#[from] FeatureError),
}
