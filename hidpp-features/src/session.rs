//! Per-device feature table and frame dispatch
//!
//! A [`Session`] holds what discovery through the Root feature yields: the
//! feature index and version of every feature the device exposes. It builds
//! request frames with fresh software ids and routes incoming frames to the
//! bound response, event or error packet class.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use hidpp_codec::{Message, Prologue, SoftwareIdCounter, ERROR_FEATURE_INDEX};
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::FeatureError;
use crate::factory::Feature;
use crate::features::error_codes::ErrorPacket;
use crate::registry::{feature_registry, FeatureRegistry};

/// One row of the feature table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureEntry {
    pub feature_id: u16,
    pub index: u8,
    pub version: u8,
}

/// Result of [`Session::decode`]
#[derive(Debug, Clone)]
pub enum Decoded {
    Error(ErrorPacket),
    Frame {
        feature_id: u16,
        version: u8,
        message: Message,
    },
}

impl fmt::Display for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decoded::Error(packet) => write!(f, "{packet}"),
            Decoded::Frame {
                feature_id,
                version,
                message,
            } => write!(f, "[0x{feature_id:04X} v{version}] {message}"),
        }
    }
}

pub struct Session<'r> {
    registry: &'r FeatureRegistry,
    device_index: u8,
    /// Overrides the counter when set
    software_id: Option<u8>,
    table: RwLock<BTreeMap<u8, FeatureEntry>>,
    products: RwLock<HashMap<(u16, u8), Arc<Feature>>>,
    sw_ids: SoftwareIdCounter,
}

impl Session<'static> {
    /// Session over the global registry
    pub fn new(device_index: u8) -> Result<Self, FeatureError> {
        Ok(Session::with_registry(feature_registry()?, device_index))
    }
}

impl<'r> Session<'r> {
    pub fn with_registry(registry: &'r FeatureRegistry, device_index: u8) -> Self {
        Self {
            registry,
            device_index,
            software_id: None,
            table: RwLock::new(BTreeMap::new()),
            products: RwLock::new(HashMap::new()),
            sw_ids: SoftwareIdCounter::new(),
        }
    }

    /// Use `software_id` for every request instead of cycling
    pub fn with_software_id(mut self, software_id: u8) -> Self {
        self.software_id = Some(software_id);
        self
    }

    pub fn device_index(&self) -> u8 {
        self.device_index
    }

    pub fn registry(&self) -> &'r FeatureRegistry {
        self.registry
    }

    /// Map `feature_id` at `version` to `index`, replacing any previous row
    /// for either the index or the feature
    pub fn register(&self, feature_id: u16, index: u8, version: u8) -> Result<(), FeatureError> {
        if index == ERROR_FEATURE_INDEX {
            return Err(FeatureError::ReservedFeatureIndex(index));
        }
        let model = self
            .registry
            .get(feature_id)
            .ok_or(FeatureError::UnknownFeature(feature_id))?;
        if !model.has_version(version) {
            return Err(FeatureError::UnknownVersion {
                feature_id,
                version,
            });
        }
        let mut table = self.table.write();
        table.retain(|_, entry| entry.feature_id != feature_id);
        table.insert(
            index,
            FeatureEntry {
                feature_id,
                index,
                version,
            },
        );
        debug!(
            feature = model.name(),
            index,
            version,
            "registered feature"
        );
        Ok(())
    }

    pub fn entry(&self, index: u8) -> Option<FeatureEntry> {
        self.table.read().get(&index).copied()
    }

    /// Rows in feature index order
    pub fn entries(&self) -> Vec<FeatureEntry> {
        self.table.read().values().copied().collect()
    }

    pub fn feature_index(&self, feature_id: u16) -> Result<u8, FeatureError> {
        self.lookup(feature_id).map(|entry| entry.index)
    }

    /// Feature object bound for `feature_id`
    pub fn feature(&self, feature_id: u16) -> Result<Arc<Feature>, FeatureError> {
        let entry = self.lookup(feature_id)?;
        self.product(entry)
    }

    /// Feature object bound at `index`
    pub fn feature_at(&self, index: u8) -> Result<Arc<Feature>, FeatureError> {
        let entry = self
            .entry(index)
            .ok_or(FeatureError::UnknownFeatureIndex(index))?;
        self.product(entry)
    }

    /// Request frame for `function`, addressed and tagged with a software id
    pub fn request(&self, feature_id: u16, function: &str) -> Result<Message, FeatureError> {
        let entry = self.lookup(feature_id)?;
        let feature = self.product(entry)?;
        let software_id = self.software_id.unwrap_or_else(|| self.sw_ids.next_id());
        Ok(feature
            .request(function, self.device_index, entry.index)?
            .with_software_id(software_id)?)
    }

    /// Route an incoming frame by its feature index
    pub fn decode(&self, data: &[u8]) -> Result<Decoded, FeatureError> {
        let prologue = Prologue::parse(data)?;
        if prologue.feature_index() == ERROR_FEATURE_INDEX {
            trace!(device = prologue.device_index(), "error packet");
            return Ok(Decoded::Error(ErrorPacket::from_bytes(data)?));
        }
        let feature = self.feature_at(prologue.feature_index())?;
        let message = feature.decode(data)?;
        Ok(Decoded::Frame {
            feature_id: feature.feature_id(),
            version: feature.version(),
            message,
        })
    }

    fn lookup(&self, feature_id: u16) -> Result<FeatureEntry, FeatureError> {
        self.table
            .read()
            .values()
            .find(|entry| entry.feature_id == feature_id)
            .copied()
            .ok_or(FeatureError::NotInSession(feature_id))
    }

    /// One shared product per (feature, version)
    fn product(&self, entry: FeatureEntry) -> Result<Arc<Feature>, FeatureError> {
        let key = (entry.feature_id, entry.version);
        if let Some(feature) = self.products.read().get(&key) {
            return Ok(feature.clone());
        }
        let feature = Arc::new(self.registry.create(entry.feature_id, entry.version)?);
        Ok(self.products.write().entry(key).or_insert(feature).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::error_codes::ErrorCode;
    use crate::features::{battery_levels_calibration, root, static_monitor_mode};

    fn session() -> Session<'static> {
        let session = Session::new(0x01).unwrap();
        session.register(root::FEATURE_ID, 0x00, 2).unwrap();
        session
            .register(battery_levels_calibration::FEATURE_ID, 0x04, 1)
            .unwrap();
        session
            .register(static_monitor_mode::FEATURE_ID, 0x09, 0)
            .unwrap();
        session
    }

    #[test]
    fn test_register_rejects() {
        let session = session();
        assert_eq!(
            session.register(0x1861, ERROR_FEATURE_INDEX, 0).unwrap_err(),
            FeatureError::ReservedFeatureIndex(0xFF)
        );
        assert_eq!(
            session.register(0x1234, 0x05, 0).unwrap_err(),
            FeatureError::UnknownFeature(0x1234)
        );
        assert!(session.register(0x1861, 0x05, 9).unwrap_err().is_key_error());
    }

    #[test]
    fn test_register_moves_feature() {
        let session = session();
        session
            .register(battery_levels_calibration::FEATURE_ID, 0x06, 1)
            .unwrap();
        assert_eq!(session.entry(0x04), None);
        assert_eq!(session.feature_index(0x1861).unwrap(), 0x06);
        assert_eq!(session.entries().len(), 3);
    }

    #[test]
    fn test_products_are_shared() {
        let session = session();
        let a = session.feature(0x1861).unwrap();
        let b = session.feature_at(0x04).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(
            session.feature(0x0003).unwrap_err(),
            FeatureError::NotInSession(0x0003)
        );
    }

    #[test]
    fn test_request_software_ids() {
        let session = session();
        let first = session.request(0x1861, "measure_battery").unwrap();
        let second = session.request(0x1861, "measure_battery").unwrap();
        assert_eq!(first.feature_index(), 0x04);
        assert_eq!(first.function_index(), 1);
        assert_eq!(first.software_id(), 1);
        assert_eq!(second.software_id(), 2);

        let fixed = Session::new(0x02).unwrap().with_software_id(0x0A);
        fixed.register(root::FEATURE_ID, 0, 0).unwrap();
        let message = fixed.request(root::FEATURE_ID, "get_protocol_version").unwrap();
        assert_eq!(message.to_bytes().unwrap()[3], 0x1A);
    }

    #[test]
    fn test_decode_routes() {
        let session = session();

        let mut response = vec![0x11, 0x01, 0x04, 0x13, 0x0F, 0xA0];
        response.resize(20, 0);
        match session.decode(&response).unwrap() {
            Decoded::Frame {
                feature_id,
                version,
                message,
            } => {
                assert_eq!(feature_id, 0x1861);
                assert_eq!(version, 1);
                assert_eq!(message.get_int("measure").unwrap(), 4000);
            }
            other => panic!("unexpected {other:?}"),
        }

        let mut event = vec![0x11, 0x01, 0x09, 0x10, 0x17, 0x01];
        event.resize(20, 0);
        match session.decode(&event).unwrap() {
            Decoded::Frame { message, .. } => {
                assert_eq!(message.class().name(), "KeyboardModeEvent")
            }
            other => panic!("unexpected {other:?}"),
        }

        let mut error = vec![0x11, 0x01, 0xFF, 0x04, 0x13, 0x05];
        error.resize(20, 0);
        match session.decode(&error).unwrap() {
            Decoded::Error(packet) => {
                assert_eq!(packet.failed_feature_index(), 0x04);
                assert_eq!(packet.error_code().unwrap(), Some(ErrorCode::LogitechInternal));
            }
            other => panic!("unexpected {other:?}"),
        }

        let mut unknown = vec![0x11, 0x01, 0x07, 0x10];
        unknown.resize(20, 0);
        assert_eq!(
            session.decode(&unknown).unwrap_err(),
            FeatureError::UnknownFeatureIndex(0x07)
        );
    }
}
