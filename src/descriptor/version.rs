// Version-info expressions
// "all versions", "since v2", "v2 only", "up to v2"

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DescriptorError;

const ALL_VERSIONS: &str = "all versions";
const SINCE_VERSION: &str = "since v";
const UPTO_VERSION: &str = "up to v";
const VERSION_ONLY: &str = " only";

/// Which feature versions a parameter, function or event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VersionInfo {
    All,
    Since(u8),
    Only(u8),
    UpTo(u8),
}

impl VersionInfo {
    /// Check if `version` falls within this expression
    pub fn includes(&self, version: u8) -> bool {
        match *self {
            VersionInfo::All => true,
            VersionInfo::Since(n) => version >= n,
            VersionInfo::Only(n) => version == n,
            VersionInfo::UpTo(n) => version <= n,
        }
    }

    /// "since vN" with N == version
    pub fn starts_at(&self, version: u8) -> bool {
        matches!(*self, VersionInfo::Since(n) if n == version)
    }

    /// "up to vN" with N < version
    pub fn ended_before(&self, version: u8) -> bool {
        matches!(*self, VersionInfo::UpTo(n) if version > n)
    }

    /// "vN only" with N < version
    pub fn only_before(&self, version: u8) -> bool {
        matches!(*self, VersionInfo::Only(n) if version > n)
    }

    pub fn is_multi_version(&self) -> bool {
        *self != VersionInfo::All
    }
}

impl Default for VersionInfo {
    fn default() -> Self {
        VersionInfo::All
    }
}

fn parse_version(expr: &str, digits: &str) -> Result<u8, DescriptorError> {
    digits
        .trim()
        .parse()
        .map_err(|_| DescriptorError::VersionInfo(expr.to_string()))
}

impl FromStr for VersionInfo {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let expr = s.trim().to_ascii_lowercase();
        if expr == ALL_VERSIONS {
            return Ok(VersionInfo::All);
        }
        if let Some(rest) = expr.strip_prefix(SINCE_VERSION) {
            return Ok(VersionInfo::Since(parse_version(s, rest)?));
        }
        if let Some(rest) = expr.strip_prefix(UPTO_VERSION) {
            return Ok(VersionInfo::UpTo(parse_version(s, rest)?));
        }
        if let Some(rest) = expr
            .strip_suffix(VERSION_ONLY)
            .and_then(|rest| rest.strip_prefix('v'))
        {
            return Ok(VersionInfo::Only(parse_version(s, rest)?));
        }
        Err(DescriptorError::VersionInfo(s.to_string()))
    }
}

impl TryFrom<String> for VersionInfo {
    type Error = DescriptorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionInfo> for String {
    fn from(value: VersionInfo) -> Self {
        value.to_string()
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionInfo::All => f.write_str(ALL_VERSIONS),
            VersionInfo::Since(n) => write!(f, "{SINCE_VERSION}{n}"),
            VersionInfo::Only(n) => write!(f, "v{n}{VERSION_ONLY}"),
            VersionInfo::UpTo(n) => write!(f, "{UPTO_VERSION}{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expressions() {
        assert_eq!("all versions".parse::<VersionInfo>().unwrap(), VersionInfo::All);
        assert_eq!("since v2".parse::<VersionInfo>().unwrap(), VersionInfo::Since(2));
        assert_eq!("v3 only".parse::<VersionInfo>().unwrap(), VersionInfo::Only(3));
        assert_eq!("up to v1".parse::<VersionInfo>().unwrap(), VersionInfo::UpTo(1));
        assert_eq!("Since v10".parse::<VersionInfo>().unwrap(), VersionInfo::Since(10));
    }

    #[test]
    fn test_parse_rejects() {
        for bad in ["", "since", "since vx", "v only", "from v2", "up to 2"] {
            assert!(bad.parse::<VersionInfo>().is_err(), "{bad:?} accepted");
        }
    }

    #[test]
    fn test_includes() {
        let since = VersionInfo::Since(2);
        assert!(!since.includes(1));
        assert!(since.includes(2));
        assert!(since.includes(7));

        let only = VersionInfo::Only(2);
        assert!(only.includes(2));
        assert!(!only.includes(3));

        let up_to = VersionInfo::UpTo(2);
        assert!(up_to.includes(0));
        assert!(!up_to.includes(3));

        assert!(VersionInfo::All.includes(255));
    }

    #[test]
    fn test_version_predicates() {
        assert!(VersionInfo::Since(2).starts_at(2));
        assert!(!VersionInfo::Since(2).starts_at(3));
        assert!(VersionInfo::UpTo(1).ended_before(2));
        assert!(!VersionInfo::UpTo(1).ended_before(1));
        assert!(VersionInfo::Only(0).only_before(1));
        assert!(!VersionInfo::All.is_multi_version());
        assert!(VersionInfo::Only(0).is_multi_version());
    }

    #[test]
    fn test_display_round_trip() {
        for info in [
            VersionInfo::All,
            VersionInfo::Since(4),
            VersionInfo::Only(1),
            VersionInfo::UpTo(3),
        ] {
            assert_eq!(info.to_string().parse::<VersionInfo>().unwrap(), info);
        }
    }
}
