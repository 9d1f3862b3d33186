// Session configuration
// Feature table a transport would discover through the Root feature, read from TOML

use std::path::Path;

use hidpp_codec::message::MAX_NIBBLE;
use hidpp_features::{FeatureRegistry, Session};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::descriptor::parse_feature_id;
use crate::error::ConfigError;

/// Device index of a directly attached device
pub const DEFAULT_DEVICE_INDEX: u8 = 0xFF;

fn default_device_index() -> u8 {
    DEFAULT_DEVICE_INDEX
}

/// Feature id given as a number, a `"0x…"` string or a feature name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureRef {
    Id(u16),
    Text(String),
}

impl FeatureRef {
    pub fn resolve(&self, registry: &FeatureRegistry) -> Result<u16, ConfigError> {
        match self {
            FeatureRef::Id(id) => Ok(*id),
            FeatureRef::Text(text) => parse_feature_id(text)
                .or_else(|| registry.find_by_name(text).map(|model| model.feature_id()))
                .ok_or_else(|| ConfigError::FeatureId(text.clone())),
        }
    }
}

/// One row of the feature table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureBinding {
    pub id: FeatureRef,
    pub index: u8,
    #[serde(default)]
    pub version: u8,
}

/// Session file contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_device_index")]
    pub device_index: u8,
    /// Fixed software id for every request, cycling when absent
    #[serde(default)]
    pub software_id: Option<u8>,
    #[serde(default)]
    pub features: Vec<FeatureBinding>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            device_index: DEFAULT_DEVICE_INDEX,
            software_id: None,
            features: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Load a session file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = Self::from_toml(&std::fs::read_to_string(path)?)?;
        debug!(
            path = %path.display(),
            features = config.features.len(),
            "loaded session file"
        );
        Ok(config)
    }

    /// Parse session TOML
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = toml::from_str(content)?;
        if let Some(software_id) = config.software_id {
            if software_id > MAX_NIBBLE {
                return Err(ConfigError::SoftwareId(software_id));
            }
        }
        Ok(config)
    }

    /// Session over the global registry
    pub fn into_session(&self) -> Result<Session<'static>, ConfigError> {
        let session = Session::new(self.device_index)?;
        self.populate(session)
    }

    /// Session over `registry`
    pub fn session_with<'r>(&self, registry: &'r FeatureRegistry) -> Result<Session<'r>, ConfigError> {
        self.populate(Session::with_registry(registry, self.device_index))
    }

    fn populate<'r>(&self, mut session: Session<'r>) -> Result<Session<'r>, ConfigError> {
        if let Some(software_id) = self.software_id {
            session = session.with_software_id(software_id);
        }
        for binding in &self.features {
            let feature_id = binding.id.resolve(session.registry())?;
            session.register(feature_id, binding.index, binding.version)?;
        }
        Ok(session)
    }
}
