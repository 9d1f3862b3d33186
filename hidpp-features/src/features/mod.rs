//! Builtin feature declarations

pub mod battery_levels_calibration;
pub mod device_information;
pub mod error_codes;
pub mod lightspeed_prepairing;
pub mod root;
pub mod static_monitor_mode;

use crate::model::FeatureDecl;

/// Every versioned feature shipped with the crate, in feature id order
pub static BUILTINS: &[&FeatureDecl] = &[
    &root::DECL,
    &device_information::DECL,
    &lightspeed_prepairing::DECL,
    &battery_levels_calibration::DECL,
    &static_monitor_mode::DECL,
];
