// HID++ harness - Shared Library
// Generator input model, descriptor tooling and session configuration

pub mod config;
pub mod descriptor;
pub mod error;

pub use config::{FeatureBinding, FeatureRef, SessionConfig};
pub use descriptor::{regenerate, FeatureDescriptor, FeatureLayout, SizeValidator, VersionInfo};
pub use error::{ConfigError, DescriptorError};

pub use hidpp_codec as codec;
pub use hidpp_features as features;
