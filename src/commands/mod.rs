//! Command handlers for the CLI application.
//!
//! - `features`: builtin feature listing and per-version descriptions
//! - `decode`: frame decoding through a feature model or a session table
//! - `descriptor`: descriptor validation and layout regeneration

pub mod decode;
pub mod descriptor;
pub mod features;

use anyhow::{Context, Result};
use hidpp_features::{FeatureRegistry, Session};
use hidpp_harness::config::{FeatureRef, SessionConfig};
use std::path::Path;

/// Result type for command handlers
pub type CommandResult = Result<()>;

/// Resolve `--feature` given as an id or a feature name
pub fn resolve_feature(registry: &FeatureRegistry, feature: &str) -> Result<u16> {
    let feature_ref = FeatureRef::Text(feature.to_string());
    Ok(feature_ref.resolve(registry)?)
}

/// Build the session described by `--session`
pub fn load_session(path: &Path) -> Result<Session<'static>> {
    let config = SessionConfig::load(path)
        .with_context(|| format!("loading session file {}", path.display()))?;
    Ok(config.into_session()?)
}
