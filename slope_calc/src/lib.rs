//! Slope conversion engine and terrain profile model.
//!
//! A slope can be described by two heights and a distance, rise/run, percent
//! grade, angle or run-over-rise ratio. The [`engine`] keeps all of these in
//! step as one of them is edited, [`profile`] derives per-segment slopes from
//! multi-point terrain profiles, and [`io`] reads and writes profiles as CSV or
//! JSON project documents.

pub mod config;
pub mod editor;
pub mod engine;
pub mod io;
pub mod profile;
pub mod slope;
pub mod units;

use thiserror::Error;

pub use config::Preferences;
pub use editor::{EditOutcome, SlopeEditor};
pub use engine::{compute_quantities, transition, Field, QuantitySet, Transition};
pub use profile::{Point, Profile, ProfileTotals, Segment, SlopeStats};
pub use units::{convert_units, UnitPreferences, UnitSystem};

#[derive(Error, Debug)]
pub enum SlopeError {
    #[error("{0}")]
    Schema(String),
    #[error("row {row}: invalid numeric value {value:?} in column {field}")]
    Parse {
        row: usize,
        field: String,
        value: String,
    },
    #[error("{0}")]
    EmptyInput(String),
    #[error("profile must contain at least one point")]
    EmptyProfile,
    #[error("point index {index} out of range for profile of {len} points")]
    PointIndex { index: usize, len: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Segments of `profile`, in traversal order.
pub fn profile_segments(profile: &Profile) -> Vec<Segment> {
    profile.segments()
}

/// Horizontal distance and net rise of `profile`.
pub fn profile_totals(profile: &Profile) -> ProfileTotals {
    profile.totals()
}

/// Percent grade between two heights `distance` apart; +inf when the distance is zero.
pub fn compute_slope(distance: f64, h1: f64, h2: f64) -> f64 {
    if distance == 0.0 {
        return f64::INFINITY;
    }
    ((h2 - h1) / distance) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_slope() {
        assert!((compute_slope(10.0, 2.0, 4.0) - 20.0).abs() < 1e-12);
        assert!((compute_slope(5.0, 10.0, 5.0) + 100.0).abs() < 1e-12);
        assert_eq!(compute_slope(0.0, 3.0, 7.0), f64::INFINITY);
        assert_eq!(compute_slope(0.0, 7.0, 3.0), f64::INFINITY);
    }

    #[test]
    fn test_collaborator_contract() {
        let profile = Profile::from_pairs([(0.0, 10.0), (50.0, 10.0), (100.0, 18.0)]).unwrap();
        let totals = profile_totals(&profile);
        assert_eq!(totals.distance, 100.0);
        assert_eq!(totals.rise, 8.0);
        assert_eq!(profile_segments(&profile).len(), 2);

        let set = compute_quantities(Field::Percent, 8.0, &QuantitySet::from_basic(100.0, 10.0, 10.0));
        assert!((set.h2 - 18.0).abs() < 1e-12);
        assert!((convert_units(1.0, UnitSystem::Imperial, UnitSystem::Metric) - 0.3048).abs() < 1e-15);
    }
}
