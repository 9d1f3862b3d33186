//! Versioned HID++ 2.0 features
//!
//! This crate turns constant feature declarations into runtime models:
//!
//! - Feature models merged from per-version deltas
//! - Factories producing immutable, version-bound feature objects
//! - Typed feature wrappers with request builders
//! - A global feature registry and a per-device session dispatcher

pub mod error;
pub mod factory;
pub mod features;
pub mod model;
pub mod registry;
pub mod session;

pub use error::FeatureError;
pub use factory::{event_attribute, request_attribute, response_attribute, Feature, FeatureFactory, Interface};
pub use model::{
    // Declarations
    EventBinding,
    FeatureDecl,
    FunctionBinding,
    VersionDecl,
    // Built model
    BaseClass,
    FeatureModel,
    FunctionClasses,
    MainClass,
    VersionEntry,
};
pub use registry::{feature_registry, FeatureRegistry};
pub use session::{Decoded, FeatureEntry, Session};

// Typed features
pub use features::battery_levels_calibration::BatteryLevelsCalibration;
pub use features::device_information::DeviceInformation;
pub use features::error_codes::{ErrorCode, ErrorPacket};
pub use features::lightspeed_prepairing::LightspeedPrepairing;
pub use features::root::Root;
pub use features::static_monitor_mode::StaticMonitorMode;
