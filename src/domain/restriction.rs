//! Platform-version restriction payloads

use serde::{Deserialize, Serialize};

/// Client platform a restriction applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
    Web,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Android => write!(f, "android"),
            Platform::Ios => write!(f, "ios"),
            Platform::Web => write!(f, "web"),
        }
    }
}

/// Version comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionOperator {
    Gte,
    Lte,
    Eq,
}

/// One version condition within a restriction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionCondition {
    pub operator: VersionOperator,
    pub version: String,
}

/// Restricts a provider to certain platform versions within a scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformRestriction {
    pub platform: Platform,
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default)]
    pub settings: Vec<VersionCondition>,
}

lazy_static::lazy_static! {
    /// Dotted numeric versions, 1 to 4 segments
    pub static ref VERSION_REGEX: regex::Regex =
        regex::Regex::new(r"^\d+(\.\d+){0,3}$").unwrap();
}

impl PlatformRestriction {
    /// All version strings must be dotted-numeric
    pub fn has_valid_versions(&self) -> bool {
        self.settings
            .iter()
            .all(|setting| VERSION_REGEX.is_match(&setting.version))
    }
}
