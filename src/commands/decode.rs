//! Frame decoding.

use super::{load_session, resolve_feature, CommandResult};
use anyhow::{bail, Result};
use hidpp_codec::{HexList, ERROR_FEATURE_INDEX};
use hidpp_features::{feature_registry, ErrorPacket};
use std::path::Path;
use tracing::debug;

/// Join hex arguments and parse them as one frame
fn parse_frame(hex: &[String]) -> Result<Vec<u8>> {
    let frame: HexList = hex.join(" ").parse()?;
    Ok(frame.into_vec())
}

/// Decode a frame through `feature` at `version`, or through the session table
pub fn decode(
    feature: Option<&str>,
    version: u8,
    session: Option<&Path>,
    hex: &[String],
) -> CommandResult {
    let data = parse_frame(hex)?;
    debug!(len = data.len(), "decoding frame");

    match (feature, session) {
        (Some(feature), _) => {
            if data.get(2) == Some(&ERROR_FEATURE_INDEX) {
                println!("{}", ErrorPacket::from_bytes(&data)?);
                return Ok(());
            }
            let registry = feature_registry()?;
            let feature_id = resolve_feature(registry, feature)?;
            let feature = registry.create(feature_id, version)?;
            let message = feature.decode(&data)?;
            println!("[0x{feature_id:04X} v{version}] {message}");
        }
        (None, Some(path)) => {
            let session = load_session(path)?;
            println!("{}", session.decode(&data)?);
        }
        (None, None) => bail!("decode needs --feature or --session"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_arguments() {
        let split = vec!["11".to_string(), "01".to_string(), "04 40".to_string()];
        assert_eq!(parse_frame(&split).unwrap(), vec![0x11, 0x01, 0x04, 0x40]);
        let packed = vec!["0x11010440".to_string()];
        assert_eq!(parse_frame(&packed).unwrap(), vec![0x11, 0x01, 0x04, 0x40]);
        assert!(parse_frame(&["1".to_string()]).is_err());
    }
}
