use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Feet per meter, used when displaying metric values in imperial units.
pub const FEET_PER_METER: f64 = 3.280839895;
/// Meters per foot.
pub const METERS_PER_FOOT: f64 = 0.3048;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn length_label(self) -> &'static str {
        match self {
            UnitSystem::Metric => "m",
            UnitSystem::Imperial => "ft",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitSystem::Metric => write!(f, "metric"),
            UnitSystem::Imperial => write!(f, "imperial"),
        }
    }
}

impl FromStr for UnitSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" | "m" => Ok(UnitSystem::Metric),
            "imperial" | "ft" => Ok(UnitSystem::Imperial),
            other => Err(format!("unknown unit system: {}", other)),
        }
    }
}

/// Active length unit system. Metric is canonical; everything persisted is metric.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnitPreferences {
    pub system: UnitSystem,
}

impl UnitPreferences {
    pub fn new(system: UnitSystem) -> Self {
        Self { system }
    }

    pub fn length_label(&self) -> &'static str {
        self.system.length_label()
    }

    /// Convert a value in the active system to meters.
    pub fn to_metric(&self, value: f64) -> f64 {
        convert_units(value, self.system, UnitSystem::Metric)
    }

    /// Convert meters to the active system.
    pub fn from_metric(&self, value: f64) -> f64 {
        convert_units(value, UnitSystem::Metric, self.system)
    }
}

/// Multiplier taking a length expressed in `from` to the same length in `to`.
pub fn length_factor(from: UnitSystem, to: UnitSystem) -> f64 {
    match (from, to) {
        (UnitSystem::Metric, UnitSystem::Imperial) => FEET_PER_METER,
        (UnitSystem::Imperial, UnitSystem::Metric) => METERS_PER_FOOT,
        _ => 1.0,
    }
}

pub fn convert_units(value: f64, from: UnitSystem, to: UnitSystem) -> f64 {
    if from == to {
        return value;
    }
    value * length_factor(from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn same_system_is_identity() {
        assert_eq!(convert_units(12.345, UnitSystem::Metric, UnitSystem::Metric), 12.345);
        assert_eq!(convert_units(-7.0, UnitSystem::Imperial, UnitSystem::Imperial), -7.0);
    }

    #[test]
    fn metric_imperial_roundtrip() {
        for &v in &[1.0, 0.001, 100.0, -42.5, 123_456.789] {
            let feet = convert_units(v, UnitSystem::Metric, UnitSystem::Imperial);
            let back = convert_units(feet, UnitSystem::Imperial, UnitSystem::Metric);
            assert_relative_eq!(back, v, max_relative = 1e-9);
        }
    }

    #[test]
    fn one_foot_is_0_3048_m() {
        let prefs = UnitPreferences::new(UnitSystem::Imperial);
        assert_eq!(prefs.to_metric(1.0), 0.3048);
        assert_relative_eq!(prefs.from_metric(1.0), 3.280839895);
        assert_eq!(prefs.length_label(), "ft");
        assert_eq!(UnitPreferences::default().length_label(), "m");
    }

    #[test]
    fn parse_and_display() {
        assert_eq!("Imperial".parse::<UnitSystem>(), Ok(UnitSystem::Imperial));
        assert_eq!("m".parse::<UnitSystem>(), Ok(UnitSystem::Metric));
        assert!("furlongs".parse::<UnitSystem>().is_err());
        assert_eq!(UnitSystem::Imperial.to_string(), "imperial");
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&UnitSystem::Imperial).unwrap();
        assert_eq!(json, "\"imperial\"");
    }
}
