// Feature registry
// Central registry for looking up feature models by id or name

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::error::FeatureError;
use crate::factory::{Feature, FeatureFactory};
use crate::features::BUILTINS;
use crate::model::{FeatureDecl, FeatureModel};

/// Registry of built feature models
/// Models are built once and shared by every factory product
pub struct FeatureRegistry {
    /// Models indexed by feature id
    by_id: BTreeMap<u16, Arc<FeatureModel>>,
    /// Feature ids indexed by feature name
    by_name: HashMap<&'static str, u16>,
}

impl FeatureRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            by_id: BTreeMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with every builtin feature
    pub fn with_builtins() -> Result<Self, FeatureError> {
        let mut registry = Self::new();
        for decl in BUILTINS {
            registry.register(*decl)?;
        }
        debug!(features = registry.len(), "loaded builtin features");
        Ok(registry)
    }

    /// Build and register a feature declaration
    /// A later registration for the same id replaces the earlier one
    pub fn register(&mut self, decl: &'static FeatureDecl) -> Result<Arc<FeatureModel>, FeatureError> {
        let model = Arc::new(FeatureModel::build(decl)?);
        if let Some(old) = self.by_id.insert(decl.feature_id, model.clone()) {
            self.by_name.remove(old.name());
        }
        self.by_name.insert(decl.name, decl.feature_id);
        Ok(model)
    }

    /// Find model by feature id
    pub fn get(&self, feature_id: u16) -> Option<&Arc<FeatureModel>> {
        self.by_id.get(&feature_id)
    }

    /// Find model by feature name (case-insensitive)
    pub fn find_by_name(&self, name: &str) -> Option<&Arc<FeatureModel>> {
        if let Some(id) = self.by_name.get(name) {
            return self.by_id.get(id);
        }
        self.by_id
            .values()
            .find(|model| model.name().eq_ignore_ascii_case(name))
    }

    /// Factory for a registered feature
    pub fn factory(&self, feature_id: u16) -> Result<FeatureFactory, FeatureError> {
        self.get(feature_id)
            .cloned()
            .map(FeatureFactory::new)
            .ok_or(FeatureError::UnknownFeature(feature_id))
    }

    /// Create the feature object of `feature_id` at `version`
    pub fn create(&self, feature_id: u16, version: u8) -> Result<Feature, FeatureError> {
        self.factory(feature_id)?.create(version)
    }

    /// Check if a feature id is registered
    pub fn contains(&self, feature_id: u16) -> bool {
        self.by_id.contains_key(&feature_id)
    }

    /// Models in feature id order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<FeatureModel>> {
        self.by_id.values()
    }

    /// Get the number of registered features
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl Default for FeatureRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Global singleton registry
static REGISTRY: OnceLock<Result<FeatureRegistry, FeatureError>> = OnceLock::new();

/// Get the global feature registry, built from the builtins on first use
pub fn feature_registry() -> Result<&'static FeatureRegistry, FeatureError> {
    REGISTRY
        .get_or_init(FeatureRegistry::with_builtins)
        .as_ref()
        .map_err(Clone::clone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{battery_levels_calibration, root, static_monitor_mode};

    #[test]
    fn test_registry_with_builtins() {
        let registry = FeatureRegistry::with_builtins().unwrap();
        assert_eq!(registry.len(), BUILTINS.len());
        assert!(registry.contains(root::FEATURE_ID));

        let model = registry.get(battery_levels_calibration::FEATURE_ID).unwrap();
        assert_eq!(model.name(), "BatteryLevelsCalibration");
        assert_eq!(model.versions().collect::<Vec<_>>(), vec![0, 1]);

        let by_name = registry.find_by_name("staticmonitormode").unwrap();
        assert_eq!(by_name.feature_id(), static_monitor_mode::FEATURE_ID);

        let ids: Vec<u16> = registry.iter().map(|m| m.feature_id()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_unknown_feature() {
        let registry = FeatureRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(
            registry.create(0x1861, 0).unwrap_err(),
            FeatureError::UnknownFeature(0x1861)
        );
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = FeatureRegistry::new();
        let first = registry.register(&root::DECL).unwrap();
        let second = registry.register(&root::DECL).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(registry.get(root::FEATURE_ID).unwrap(), &second));
    }

    #[test]
    fn test_global_registry() {
        let registry = feature_registry().unwrap();
        let feature = registry.create(battery_levels_calibration::FEATURE_ID, 1).unwrap();
        assert_eq!(feature.version(), 1);
        assert!(std::ptr::eq(registry, feature_registry().unwrap()));
    }
}
