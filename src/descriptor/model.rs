// Feature descriptor model
// The tree a code generator walks to emit feature frames and test scaffolding

use std::collections::HashSet;
use std::fmt;

use hidpp_codec::message::MAX_NIBBLE;
use serde::{Deserialize, Deserializer, Serialize};

use super::names::CommonName;
use super::version::VersionInfo;
use crate::error::DescriptorError;

/// Data type used for reserved bits
pub const RESERVED_DATA_TYPE: &str = "Reserved";
/// Data type used for raw byte fields
pub const HEX_LIST_DATA_TYPE: &str = "HexList";

/// Settings-file and default values as written in a descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl SettingValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Bool(value) => Some(i64::from(*value)),
            SettingValue::Int(value) => Some(*value),
            SettingValue::Text(text) => parse_int(text),
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(value) => write!(f, "{value}"),
            SettingValue::Int(value) => write!(f, "{value}"),
            SettingValue::Text(text) => f.write_str(text),
        }
    }
}

fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// Parse a feature id written as `6241` or `"0x1861"`
pub fn parse_feature_id(text: &str) -> Option<u16> {
    parse_int(text).and_then(|value| u16::try_from(value).ok())
}

fn deserialize_feature_id<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Int(u16),
        Text(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Int(value) => Ok(value),
        Repr::Text(text) => parse_feature_id(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid feature id {text:?}"))),
    }
}

// =============================================================================
// Parameters
// =============================================================================

/// Accessors and checks shared by parameters and sub-parameters
pub trait CommonParameter: CommonName {
    fn data_type(&self) -> &str;

    fn settings_data_type(&self) -> Option<&str>;

    fn is_given_version_present(&self, version: u8) -> bool;

    /// Type annotation the generator writes for this field
    fn get_field_data_type(&self) -> String {
        match self.data_type() {
            HEX_LIST_DATA_TYPE => "``HexList``".to_string(),
            RESERVED_DATA_TYPE => "``int | HexList``".to_string(),
            other => format!("``{other} | HexList``"),
        }
    }

    fn check_data_type(&self, version: u8, data_types: &[&str]) -> bool {
        self.is_given_version_present(version) && data_types.contains(&self.data_type())
    }

    fn check_settings_data_type(&self, version: u8, data_types: &[&str]) -> bool {
        self.is_given_version_present(version)
            && self
                .settings_data_type()
                .is_some_and(|kind| data_types.contains(&kind))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubParameter {
    pub index: u8,
    pub size: u16,
    pub data_type: String,
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub settings_data_type: Option<String>,
    #[serde(default)]
    pub settings_default_value: Option<SettingValue>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub exclusion: bool,
    #[serde(default)]
    pub default_value: Option<SettingValue>,
    pub version_info: VersionInfo,
}

impl SubParameter {
    pub fn get_size(&self, version: u8) -> u32 {
        if self.is_given_version_present(version) {
            u32::from(self.size)
        } else {
            0
        }
    }

    pub fn check_since_version(&self, version: u8) -> bool {
        self.version_info.starts_at(version)
    }

    pub fn check_bigger_than_upto_version(&self, version: u8) -> bool {
        self.version_info.ended_before(version)
    }

    pub fn check_bigger_than_only_version(&self, version: u8) -> bool {
        self.version_info.only_before(version)
    }

    pub fn check_multi_version(&self) -> bool {
        self.version_info.is_multi_version()
    }
}

impl CommonName for SubParameter {
    fn name(&self) -> &str {
        &self.name
    }
}

impl CommonParameter for SubParameter {
    fn data_type(&self) -> &str {
        &self.data_type
    }

    fn settings_data_type(&self) -> Option<&str> {
        self.settings_data_type.as_deref()
    }

    fn is_given_version_present(&self, version: u8) -> bool {
        self.version_info.includes(version)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub index: u8,
    /// Required unless the parameter is split into sub-parameters
    #[serde(default)]
    pub size: Option<u16>,
    pub data_type: String,
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub settings_data_type: Option<String>,
    #[serde(default)]
    pub settings_default_value: Option<SettingValue>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub exclusion: bool,
    #[serde(default)]
    pub default_value: Option<SettingValue>,
    #[serde(default)]
    pub sub_parameters: Vec<SubParameter>,
    #[serde(default)]
    pub version_info: Option<VersionInfo>,
}

impl Parameter {
    pub fn has_sub_parameters(&self) -> bool {
        !self.sub_parameters.is_empty()
    }

    /// Bit width in `version`, summing the sub-parameters when split
    pub fn get_size(&self, version: u8) -> u32 {
        if self.has_sub_parameters() {
            return self
                .sub_parameters
                .iter()
                .map(|sub| sub.get_size(version))
                .sum();
        }
        match self.size {
            Some(size) if self.is_given_version_present(version) => u32::from(size),
            _ => 0,
        }
    }

    /// Widest name among the sub-parameters, at least `max_size`
    pub fn get_name_col_size(&self, max_size: usize) -> usize {
        self.sub_parameters
            .iter()
            .map(|sub| sub.name.len())
            .fold(max_size, usize::max)
    }

    pub fn check_since_version(&self, version: u8) -> bool {
        self.sub_parameters
            .iter()
            .any(|sub| sub.check_since_version(version))
            || self
                .version_info
                .is_some_and(|info| info.starts_at(version))
    }

    pub fn check_bigger_than_upto_version(&self, version: u8) -> bool {
        self.sub_parameters
            .iter()
            .any(|sub| sub.check_bigger_than_upto_version(version))
            || self
                .version_info
                .is_some_and(|info| info.ended_before(version))
    }

    pub fn check_bigger_than_only_version(&self, version: u8) -> bool {
        self.sub_parameters
            .iter()
            .any(|sub| sub.check_bigger_than_only_version(version))
            || self
                .version_info
                .is_some_and(|info| info.only_before(version))
    }

    /// True when the parameter differs between versions
    pub fn check_multi_version(&self) -> bool {
        if self.has_sub_parameters() {
            let distinct: HashSet<VersionInfo> =
                self.sub_parameters.iter().map(|sub| sub.version_info).collect();
            return distinct.len() > 1;
        }
        self.version_info.unwrap_or_default().is_multi_version()
    }

    pub fn get_name_lower_underscore_with_prefix(&self, strip_bit_map: bool) -> String {
        let prefix = self
            .sub_parameters
            .first()
            .and_then(|sub| sub.prefix.as_deref())
            .or(self.prefix.as_deref());
        let value = match prefix {
            Some(prefix) if !prefix.is_empty() => {
                format!("{}_{}", prefix.to_lowercase(), self.get_name_lower_underscore(false))
            }
            _ => self.get_name_lower_underscore(false),
        };
        if strip_bit_map {
            value.replace("_mask_bit_map", "").replace("_bit_map", "")
        } else {
            value
        }
    }

    /// `"V{version}"` for per-version parameters, empty otherwise
    pub fn get_version_text(&self, version: u8) -> String {
        if self.check_multi_version() {
            format!("V{version}")
        } else {
            String::new()
        }
    }

    fn validate(&self) -> Result<(), DescriptorError> {
        if self.has_sub_parameters() {
            return Ok(());
        }
        if self.size.is_none() {
            return Err(DescriptorError::MissingSize(self.name.clone()));
        }
        if self.version_info.is_none() {
            return Err(DescriptorError::MissingVersionInfo(self.name.clone()));
        }
        Ok(())
    }
}

impl CommonName for Parameter {
    fn name(&self) -> &str {
        &self.name
    }
}

impl CommonParameter for Parameter {
    fn data_type(&self) -> &str {
        &self.data_type
    }

    fn settings_data_type(&self) -> Option<&str> {
        self.settings_data_type.as_deref()
    }

    /// Without its own expression, present when any sub-parameter is
    fn is_given_version_present(&self, version: u8) -> bool {
        match self.version_info {
            Some(info) => info.includes(version),
            None => self
                .sub_parameters
                .iter()
                .any(|sub| sub.is_given_version_present(version)),
        }
    }
}

// =============================================================================
// Packets
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    Request,
    Response,
    Event,
}

/// Body of a request, response or event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    /// Base class override
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl Packet {
    pub fn is_this_version_applicable(&self, version: u8) -> bool {
        self.parameters
            .iter()
            .any(|param| param.is_given_version_present(version))
    }

    /// Parameters present in `version`, in declaration order
    pub fn parameters_for(&self, version: u8) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(move |param| param.is_given_version_present(version))
    }

    /// Payload width in `version`
    pub fn bit_size(&self, version: u8) -> u32 {
        self.parameters.iter().map(|param| param.get_size(version)).sum()
    }

    pub fn get_name_col_size(&self, max_size: usize) -> usize {
        self.parameters
            .iter()
            .map(|param| param.get_name(true).len())
            .fold(max_size, usize::max)
    }

    pub fn check_settings_data_type(&self, version: u8, data_types: &[&str]) -> bool {
        self.parameters
            .iter()
            .any(|param| param.check_settings_data_type(version, data_types))
    }

    pub fn check_data_type(&self, version: u8, data_types: &[&str]) -> bool {
        self.parameters
            .iter()
            .any(|param| param.check_data_type(version, data_types))
    }

    pub fn check_parameters(&self, version: u8) -> bool {
        self.is_this_version_applicable(version)
    }

    pub fn check_since_version(&self, version: u8) -> bool {
        self.parameters
            .iter()
            .any(|param| param.check_since_version(version))
    }

    pub fn check_bigger_than_upto_version(&self, version: u8) -> bool {
        self.parameters
            .iter()
            .any(|param| param.check_bigger_than_upto_version(version))
    }

    pub fn check_bigger_than_only_version(&self, version: u8) -> bool {
        self.parameters
            .iter()
            .any(|param| param.check_bigger_than_only_version(version))
    }

    pub fn check_multi_version(&self) -> bool {
        self.parameters.iter().any(Parameter::check_multi_version)
    }

    /// Base class the generated frame derives from
    ///
    /// Empty requests use the short empty format, empty responses and events
    /// the long one; otherwise the override or the feature's own title.
    pub fn get_base_class(&self, kind: PacketKind, feature_title: &str) -> String {
        if self.parameters.is_empty() {
            return match kind {
                PacketKind::Request => "ShortEmptyPacketDataFormat".to_string(),
                PacketKind::Response | PacketKind::Event => {
                    "LongEmptyPacketDataFormat".to_string()
                }
            };
        }
        match &self.base {
            Some(base) => base.clone(),
            None => feature_title.to_string(),
        }
    }

    fn validate(&self) -> Result<(), DescriptorError> {
        self.parameters.iter().try_for_each(Parameter::validate)
    }
}

// =============================================================================
// Functions, events, test cases
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub index: u8,
    pub name: String,
    #[serde(default)]
    pub request: Packet,
    #[serde(default)]
    pub response: Packet,
    #[serde(default)]
    pub nvs_backup_required: bool,
    #[serde(default)]
    pub version_info: Option<VersionInfo>,
}

impl FunctionInfo {
    /// Without its own expression, applicable when either packet has a
    /// parameter in `version`
    pub fn is_this_version_applicable(&self, version: u8) -> bool {
        match self.version_info {
            Some(info) => info.includes(version),
            None => {
                self.request.is_this_version_applicable(version)
                    || self.response.is_this_version_applicable(version)
            }
        }
    }

    pub fn check_since_version(&self, version: u8) -> bool {
        self.version_info.is_some_and(|info| info.starts_at(version))
            || self.request.check_since_version(version)
            || self.response.check_since_version(version)
    }

    pub fn check_bigger_than_upto_version(&self, version: u8) -> bool {
        self.version_info
            .is_some_and(|info| info.ended_before(version))
            || self.request.check_bigger_than_upto_version(version)
            || self.response.check_bigger_than_upto_version(version)
    }

    pub fn check_bigger_than_only_version(&self, version: u8) -> bool {
        self.version_info.is_some_and(|info| info.only_before(version))
            || self.request.check_bigger_than_only_version(version)
            || self.response.check_bigger_than_only_version(version)
    }

    pub fn check_multi_version(&self) -> bool {
        match self.version_info {
            Some(info) => info.is_multi_version(),
            None => self.request.check_multi_version() || self.response.check_multi_version(),
        }
    }

    pub fn check_data_type(&self, version: u8, data_types: &[&str]) -> bool {
        self.request.check_data_type(version, data_types)
            || self.response.check_data_type(version, data_types)
    }
}

impl CommonName for FunctionInfo {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventInfo {
    pub index: u8,
    pub name: String,
    #[serde(default)]
    pub event: Packet,
    #[serde(default)]
    pub nvs_backup_required: bool,
    #[serde(default)]
    pub version_info: Option<VersionInfo>,
}

impl EventInfo {
    pub fn is_this_version_applicable(&self, version: u8) -> bool {
        match self.version_info {
            Some(info) => info.includes(version),
            None => self.event.is_this_version_applicable(version),
        }
    }

    pub fn check_since_version(&self, version: u8) -> bool {
        self.event.check_since_version(version)
    }

    pub fn check_bigger_than_upto_version(&self, version: u8) -> bool {
        self.event.check_bigger_than_upto_version(version)
    }

    pub fn check_bigger_than_only_version(&self, version: u8) -> bool {
        self.event.check_bigger_than_only_version(version)
    }

    pub fn check_multi_version(&self) -> bool {
        self.event.check_multi_version()
    }

    pub fn check_data_type(&self, version: u8, data_types: &[&str]) -> bool {
        self.event.check_data_type(version, data_types)
    }
}

impl CommonName for EventInfo {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseInfo {
    pub identifier: String,
    pub name: String,
    #[serde(default)]
    pub synopsis: String,
    #[serde(default)]
    pub description: String,
}

// =============================================================================
// Feature descriptor
// =============================================================================

/// Root of a per-feature descriptor file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDescriptor {
    pub name: String,
    #[serde(deserialize_with = "deserialize_feature_id")]
    pub feature_id: u16,
    pub versions: Vec<u8>,
    #[serde(default)]
    pub functions: Vec<FunctionInfo>,
    #[serde(default)]
    pub events: Vec<EventInfo>,
    #[serde(default)]
    pub test_cases: Vec<TestCaseInfo>,
}

impl FeatureDescriptor {
    /// `"Battery Levels Calibration"` -> `BatteryLevelsCalibration`
    pub fn title(&self) -> String {
        self.get_name_title(true)
    }

    pub fn has_version(&self, version: u8) -> bool {
        self.versions.contains(&version)
    }

    pub fn function(&self, index: u8) -> Option<&FunctionInfo> {
        self.functions.iter().find(|function| function.index == index)
    }

    pub fn event(&self, index: u8) -> Option<&EventInfo> {
        self.events.iter().find(|event| event.index == index)
    }

    /// Functions applicable to `version`, in index order
    pub fn functions_for(&self, version: u8) -> Vec<&FunctionInfo> {
        let mut functions: Vec<_> = self
            .functions
            .iter()
            .filter(|function| function.is_this_version_applicable(version))
            .collect();
        functions.sort_by_key(|function| function.index);
        functions
    }

    /// Events applicable to `version`, in index order
    pub fn events_for(&self, version: u8) -> Vec<&EventInfo> {
        let mut events: Vec<_> = self
            .events
            .iter()
            .filter(|event| event.is_this_version_applicable(version))
            .collect();
        events.sort_by_key(|event| event.index);
        events
    }

    pub fn max_function_index(&self, version: u8) -> Option<u8> {
        self.functions_for(version).last().map(|function| function.index)
    }

    /// Check structural rules serde cannot express
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.versions.is_empty() {
            return Err(DescriptorError::Validation(format!(
                "{}: no versions declared",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for function in &self.functions {
            if function.index > MAX_NIBBLE {
                return Err(DescriptorError::IndexOutOfRange {
                    name: function.name.clone(),
                    index: function.index,
                });
            }
            if !seen.insert(function.index) {
                return Err(DescriptorError::DuplicateIndex {
                    kind: "function",
                    index: function.index,
                });
            }
            function.request.validate()?;
            function.response.validate()?;
        }

        seen.clear();
        for event in &self.events {
            if event.index > MAX_NIBBLE {
                return Err(DescriptorError::IndexOutOfRange {
                    name: event.name.clone(),
                    index: event.index,
                });
            }
            if !seen.insert(event.index) {
                return Err(DescriptorError::DuplicateIndex {
                    kind: "event",
                    index: event.index,
                });
            }
            event.event.validate()?;
        }

        Ok(())
    }
}

impl CommonName for FeatureDescriptor {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, size: u16, info: VersionInfo) -> Parameter {
        Parameter {
            index: 0,
            size: Some(size),
            data_type: "int".to_string(),
            name: name.to_string(),
            comment: None,
            settings_data_type: None,
            settings_default_value: None,
            prefix: None,
            exclusion: false,
            default_value: None,
            sub_parameters: Vec::new(),
            version_info: Some(info),
        }
    }

    fn sub(name: &str, size: u16, info: VersionInfo) -> SubParameter {
        SubParameter {
            index: 0,
            size,
            data_type: "int".to_string(),
            name: name.to_string(),
            comment: None,
            settings_data_type: None,
            settings_default_value: None,
            prefix: None,
            exclusion: false,
            default_value: None,
            version_info: info,
        }
    }

    fn split(subs: Vec<SubParameter>) -> Parameter {
        Parameter {
            size: None,
            sub_parameters: subs,
            version_info: None,
            ..param("Flags", 0, VersionInfo::All)
        }
    }

    #[test]
    fn test_parameter_presence_and_size() {
        let since = param("Capabilities", 8, VersionInfo::Since(1));
        assert!(!since.is_given_version_present(0));
        assert_eq!(since.get_size(0), 0);
        assert_eq!(since.get_size(1), 8);
        assert!(since.check_since_version(1));
        assert!(since.check_multi_version());
        assert_eq!(since.get_version_text(1), "V1");

        let always = param("Count", 8, VersionInfo::All);
        assert!(!always.check_multi_version());
        assert_eq!(always.get_version_text(3), "");
    }

    #[test]
    fn test_sub_parameter_sizes() {
        let flags = split(vec![
            sub("Reserved", 6, VersionInfo::UpTo(1)),
            sub("Reserved", 5, VersionInfo::Since(2)),
            sub("Cutoff", 1, VersionInfo::Since(2)),
            sub("Enabled", 2, VersionInfo::All),
        ]);
        assert!(flags.has_sub_parameters());
        assert_eq!(flags.get_size(0), 8);
        assert_eq!(flags.get_size(2), 8);
        assert!(flags.is_given_version_present(5));
        assert!(flags.check_multi_version());
        assert!(flags.check_bigger_than_upto_version(2));
        assert!(!flags.check_bigger_than_upto_version(1));
        assert!(flags.check_since_version(2));
    }

    #[test]
    fn test_single_version_sub_parameters() {
        let flags = split(vec![
            sub("A", 4, VersionInfo::Only(0)),
            sub("B", 4, VersionInfo::Only(0)),
        ]);
        assert!(!flags.check_multi_version());
        assert!(flags.check_bigger_than_only_version(1));
        assert!(!flags.is_given_version_present(1));
    }

    #[test]
    fn test_prefix_and_data_types() {
        let mut slot = param("Slot Mask Bit Map", 8, VersionInfo::All);
        slot.prefix = Some("LS".to_string());
        slot.settings_data_type = Some("int".to_string());
        assert_eq!(slot.get_name_lower_underscore_with_prefix(true), "ls_slot");
        assert_eq!(slot.get_field_data_type(), "``int | HexList``");
        assert!(slot.check_data_type(0, &["int"]));
        assert!(slot.check_settings_data_type(0, &["int", "bool"]));

        let mut raw = param("Data", 48, VersionInfo::All);
        raw.data_type = HEX_LIST_DATA_TYPE.to_string();
        assert_eq!(raw.get_field_data_type(), "``HexList``");
        raw.data_type = RESERVED_DATA_TYPE.to_string();
        assert_eq!(raw.get_field_data_type(), "``int | HexList``");
        assert!(!raw.check_settings_data_type(0, &["int"]));
    }

    #[test]
    fn test_packet_base_class() {
        let empty = Packet::default();
        assert_eq!(
            empty.get_base_class(PacketKind::Request, "Root"),
            "ShortEmptyPacketDataFormat"
        );
        assert_eq!(
            empty.get_base_class(PacketKind::Event, "Root"),
            "LongEmptyPacketDataFormat"
        );
        assert!(!empty.check_parameters(0));

        let mut packet = Packet {
            base: None,
            parameters: vec![param("Feature Id", 16, VersionInfo::All)],
        };
        assert_eq!(packet.get_base_class(PacketKind::Request, "Root"), "Root");
        packet.base = Some("RootBase".to_string());
        assert_eq!(packet.get_base_class(PacketKind::Response, "Root"), "RootBase");
        assert_eq!(packet.bit_size(0), 16);
        assert_eq!(packet.get_name_col_size(4), "Feature Id".len());
    }

    #[test]
    fn test_function_applicability() {
        let function = FunctionInfo {
            index: 5,
            name: "Set Battery Source Info".to_string(),
            request: Packet {
                base: None,
                parameters: vec![param("Battery Source Index", 8, VersionInfo::Since(1))],
            },
            response: Packet::default(),
            nvs_backup_required: false,
            version_info: None,
        };
        assert!(!function.is_this_version_applicable(0));
        assert!(function.is_this_version_applicable(1));
        assert!(function.check_since_version(1));
        assert!(function.check_multi_version());

        let pinned = FunctionInfo {
            version_info: Some(VersionInfo::All),
            ..function
        };
        assert!(pinned.is_this_version_applicable(0));
        assert!(!pinned.check_multi_version());
    }

    #[test]
    fn test_feature_id_forms() {
        assert_eq!(parse_feature_id("0x1861"), Some(0x1861));
        assert_eq!(parse_feature_id("6241"), Some(0x1861));
        assert_eq!(parse_feature_id("0x10000"), None);
        assert_eq!(parse_feature_id("feature"), None);
    }

    #[test]
    fn test_validate_rules() {
        let mut descriptor = FeatureDescriptor {
            name: "Test Feature".to_string(),
            feature_id: 0x1234,
            versions: vec![0],
            functions: vec![FunctionInfo {
                index: 0,
                name: "Get Info".to_string(),
                request: Packet::default(),
                response: Packet {
                    base: None,
                    parameters: vec![param("Count", 8, VersionInfo::All)],
                },
                nvs_backup_required: false,
                version_info: None,
            }],
            events: Vec::new(),
            test_cases: Vec::new(),
        };
        assert!(descriptor.validate().is_ok());
        assert_eq!(descriptor.title(), "TestFeature");

        descriptor.functions[0].response.parameters[0].size = None;
        assert!(matches!(
            descriptor.validate(),
            Err(DescriptorError::MissingSize(_))
        ));

        descriptor.functions[0].response.parameters[0].size = Some(8);
        descriptor.functions[0].response.parameters[0].version_info = None;
        assert!(matches!(
            descriptor.validate(),
            Err(DescriptorError::MissingVersionInfo(_))
        ));

        descriptor.functions[0].response.parameters[0].version_info = Some(VersionInfo::All);
        descriptor.functions.push(descriptor.functions[0].clone());
        assert!(matches!(
            descriptor.validate(),
            Err(DescriptorError::DuplicateIndex { kind: "function", index: 0 })
        ));

        descriptor.functions[1].index = 16;
        assert!(matches!(
            descriptor.validate(),
            Err(DescriptorError::IndexOutOfRange { index: 16, .. })
        ));
    }
}
