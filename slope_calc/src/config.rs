use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::units::UnitSystem;
use crate::SlopeError;

/// User preferences shared by the editing session and front ends.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Preferences {
    pub units: UnitSystem,
    /// Decimals of the percent grade in the status line.
    pub status_decimals: usize,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            units: UnitSystem::Metric,
            status_decimals: 2,
        }
    }
}

impl Preferences {
    pub fn from_json(text: &str) -> Result<Self, SlopeError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, SlopeError> {
        let text = fs::read_to_string(path)?;
        let prefs = Self::from_json(&text)?;
        debug!(path = %path.display(), units = %prefs.units, "preferences loaded");
        Ok(prefs)
    }

    pub fn save(&self, path: &Path) -> Result<(), SlopeError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let prefs = Preferences::from_json(r#"{"units": "imperial"}"#).unwrap();
        assert_eq!(prefs.units, UnitSystem::Imperial);
        assert_eq!(prefs.status_decimals, 2);
        assert_eq!(Preferences::from_json("{}").unwrap(), Preferences::default());
    }

    #[test]
    fn bad_json_is_an_error() {
        let err = Preferences::from_json(r#"{"units": "cubits"}"#).unwrap_err();
        assert!(matches!(err, SlopeError::Json(_)));
    }
}
