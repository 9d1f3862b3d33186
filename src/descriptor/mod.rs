//! Generator input model
//!
//! Per-feature descriptors describe every function and event with their
//! parameters and the versions each one belongs to. They load from JSON or
//! TOML, validate against HID++ frame sizes, and regenerate the runtime
//! message classes of any declared version.

pub mod model;
pub mod names;
pub mod regenerate;
pub mod validate;
pub mod version;

use std::path::Path;

use tracing::debug;

pub use model::{
    parse_feature_id, CommonParameter, EventInfo, FeatureDescriptor, FunctionInfo, Packet,
    PacketKind, Parameter, SettingValue, SubParameter, TestCaseInfo,
};
pub use names::CommonName;
pub use regenerate::{regenerate, FeatureLayout};
pub use validate::{FrameReport, SizeReport, SizeValidator};
pub use version::VersionInfo;

use crate::error::DescriptorError;

impl FeatureDescriptor {
    /// Load a descriptor file, picking the format from its extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DescriptorError> {
        let path = path.as_ref();
        let parse: fn(&str) -> Result<Self, DescriptorError> =
            match path.extension().and_then(|ext| ext.to_str()) {
                Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json,
                Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::from_toml,
                _ => {
                    return Err(DescriptorError::UnsupportedFormat(
                        path.display().to_string(),
                    ))
                }
            };
        let descriptor = parse(&std::fs::read_to_string(path)?)?;
        debug!(path = %path.display(), feature = %descriptor.name, "loaded descriptor");
        Ok(descriptor)
    }

    /// Load a descriptor from a JSON string
    pub fn from_json(json: &str) -> Result<Self, DescriptorError> {
        let descriptor: FeatureDescriptor = serde_json::from_str(json)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Load a descriptor from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, DescriptorError> {
        let descriptor: FeatureDescriptor = toml::from_str(content)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn to_json(&self) -> Result<String, DescriptorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATIC_MONITOR_JSON: &str = r#"{
        "name": "Static Monitor Mode",
        "feature_id": "0x18B0",
        "versions": [0, 1],
        "functions": [{
            "index": 0,
            "name": "Set Monitor Mode",
            "request": {"parameters": [
                {"index": 0, "size": 8, "data_type": "int", "name": "Mode", "version_info": "all versions"}
            ]},
            "response": {}
        }],
        "events": [{
            "index": 1,
            "name": "Keyboard Mode",
            "version_info": "since v1",
            "event": {"parameters": [
                {"index": 0, "size": 8, "data_type": "int", "name": "Row Col Code", "version_info": "all versions"},
                {"index": 1, "size": 8, "data_type": "int", "name": "Break Make", "version_info": "all versions"}
            ]}
        }],
        "test_cases": [
            {"identifier": "FUN_0001", "name": "Keyboard mode", "synopsis": "Press a key"}
        ]
    }"#;

    #[test]
    fn test_from_json() {
        let descriptor = FeatureDescriptor::from_json(STATIC_MONITOR_JSON).unwrap();
        assert_eq!(descriptor.feature_id, 0x18B0);
        assert_eq!(descriptor.title(), "StaticMonitorMode");
        assert!(descriptor.events_for(0).is_empty());
        assert_eq!(descriptor.events_for(1).len(), 1);
        assert_eq!(descriptor.test_cases[0].description, "");

        let json = descriptor.to_json().unwrap();
        assert!(json.contains("\"since v1\""));
        assert_eq!(FeatureDescriptor::from_json(&json).unwrap(), descriptor);
    }

    #[test]
    fn test_bad_version_info_is_load_error() {
        let bad = STATIC_MONITOR_JSON.replace("since v1", "from v1");
        assert!(matches!(
            FeatureDescriptor::from_json(&bad),
            Err(DescriptorError::Json(_))
        ));
    }

    #[test]
    fn test_sub_parameter_requires_version_info() {
        let json = r#"{
            "name": "Flags",
            "feature_id": 4660,
            "versions": [0],
            "functions": [{
                "index": 0,
                "name": "Get Flags",
                "response": {"parameters": [{
                    "index": 0, "data_type": "int", "name": "Flags",
                    "sub_parameters": [{"index": 0, "size": 8, "data_type": "int", "name": "Low"}]
                }]}
            }]
        }"#;
        assert!(matches!(
            FeatureDescriptor::from_json(json),
            Err(DescriptorError::Json(_))
        ));
    }

    #[test]
    fn test_from_toml() {
        let content = r#"
name = "Battery Levels Calibration"
feature_id = "0x1861"
versions = [0, 1]

[[functions]]
index = 4
name = "Cut Off Control"

[[functions.request.parameters]]
index = 0
size = 6
data_type = "Reserved"
name = "Reserved"
version_info = "all versions"

[[functions.request.parameters]]
index = 1
size = 1
data_type = "int"
name = "Cutoff Change State Requested"
version_info = "all versions"

[[functions.request.parameters]]
index = 2
size = 1
data_type = "int"
name = "Cutoff Desired State"
version_info = "all versions"
"#;
        let descriptor = FeatureDescriptor::from_toml(content).unwrap();
        assert_eq!(descriptor.feature_id, 0x1861);
        assert_eq!(descriptor.functions[0].request.bit_size(0), 8);
        assert!(descriptor.functions[0].response.parameters.is_empty());
    }

    #[test]
    fn test_load_rejects_extension() {
        let err = FeatureDescriptor::load("descriptor.yaml").unwrap_err();
        assert!(matches!(err, DescriptorError::UnsupportedFormat(_)));
        let err = FeatureDescriptor::load("missing-descriptor.json").unwrap_err();
        assert!(matches!(err, DescriptorError::Io(_)));
    }
}
