//! Positioning fix header settings

use serde::Deserialize;

/// Header checks applied by the positioning profile
///
/// # Example
///
/// ```toml
/// [positioning]
/// record_tag = "VFR"
/// solution_types = ["SOLN_USBL", "SOLN_GPS0"]
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PositioningConfig {
    /// Text the first body token must contain
    pub record_tag: String,

    /// Accepted navigation solution types
    pub solution_types: Vec<String>,
}

impl Default for PositioningConfig {
    fn default() -> Self {
        Self {
            record_tag: "VFR".into(),
            solution_types: vec!["SOLN_USBL".into(), "SOLN_GPS0".into()],
        }
    }
}
