//! Conversion engine: resolves an edit to one slope quantity into a fully
//! consistent QuantitySet. Transitions are pure; the editing session adds the
//! update-in-progress guard on top.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::slope::{
    angle_from_percent, display_ratio, percent_from_angle, percent_from_ratio,
    ratio_from_percent, rise_from_percent_and_run,
};
use crate::units::{length_factor, UnitSystem};

/// The editable quantities of the slope form.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Distance,
    H1,
    H2,
    Rise,
    Run,
    Percent,
    Angle,
    Ratio,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Distance,
        Field::H1,
        Field::H2,
        Field::Rise,
        Field::Run,
        Field::Percent,
        Field::Angle,
        Field::Ratio,
    ];

    /// Fields carrying a length, rescaled on a unit-system change.
    pub fn is_length(self) -> bool {
        matches!(
            self,
            Field::Distance | Field::H1 | Field::H2 | Field::Rise | Field::Run
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::Distance => "distance",
            Field::H1 => "h1",
            Field::H2 => "h2",
            Field::Rise => "rise",
            Field::Run => "run",
            Field::Percent => "percent",
            Field::Angle => "angle",
            Field::Ratio => "ratio",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Field::ALL
            .iter()
            .copied()
            .find(|field| field.name() == normalized)
            .ok_or_else(|| format!("unknown slope quantity: {}", s))
    }
}

/// Working state of the slope form. Lengths are in the active display unit.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct QuantitySet {
    pub distance: f64,
    pub h1: f64,
    pub h2: f64,
    pub rise: f64,
    pub run: f64,
    pub percent: f64,
    pub angle: f64,
    /// Run-over-rise ratio; 0 stands in for an infinite (flat) ratio.
    pub ratio: f64,
}

impl QuantitySet {
    /// Consistent set for a distance and two heights.
    pub fn from_basic(distance: f64, h1: f64, h2: f64) -> Self {
        let mut set = QuantitySet {
            distance,
            h1,
            h2,
            ..QuantitySet::default()
        };
        set.recompute_from_basic();
        set
    }

    pub fn get(&self, field: Field) -> f64 {
        match field {
            Field::Distance => self.distance,
            Field::H1 => self.h1,
            Field::H2 => self.h2,
            Field::Rise => self.rise,
            Field::Run => self.run,
            Field::Percent => self.percent,
            Field::Angle => self.angle,
            Field::Ratio => self.ratio,
        }
    }

    fn set(&mut self, field: Field, value: f64) {
        let slot = match field {
            Field::Distance => &mut self.distance,
            Field::H1 => &mut self.h1,
            Field::H2 => &mut self.h2,
            Field::Rise => &mut self.rise,
            Field::Run => &mut self.run,
            Field::Percent => &mut self.percent,
            Field::Angle => &mut self.angle,
            Field::Ratio => &mut self.ratio,
        };
        *slot = value;
    }

    /// Display string for the ratio, `1:∞` for a flat slope.
    pub fn ratio_label(&self) -> String {
        display_ratio(ratio_from_percent(self.percent))
    }

    /// Recompute everything from distance/h1/h2. A zero run gives a 0% grade
    /// rather than infinity so the form stays renderable.
    fn recompute_from_basic(&mut self) {
        self.rise = self.h2 - self.h1;
        self.run = self.distance;
        self.percent = if self.run != 0.0 {
            (self.rise / self.run) * 100.0
        } else {
            0.0
        };
        self.angle = angle_from_percent(self.percent);
        self.store_ratio();
    }

    /// True when no field is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        Field::ALL.into_iter().all(|f| self.get(f).is_finite())
    }

    fn store_ratio(&mut self) {
        let ratio = ratio_from_percent(self.percent);
        self.ratio = if ratio.is_infinite() { 0.0 } else { ratio };
    }

    /// Multiply every length-valued field by the factor between the two systems.
    pub fn rescaled(&self, from: UnitSystem, to: UnitSystem) -> QuantitySet {
        let factor = length_factor(from, to);
        let mut out = *self;
        for field in Field::ALL.into_iter().filter(|f| f.is_length()) {
            out.set(field, self.get(field) * factor);
        }
        out
    }
}

/// Result of offering an edit to the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Transition {
    Applied(QuantitySet),
    /// The value cannot encode a slope (ratio 0, NaN, infinity) or the
    /// cascade overflows; state is unchanged.
    Rejected,
}

impl Transition {
    pub fn applied(self) -> Option<QuantitySet> {
        match self {
            Transition::Applied(set) => Some(set),
            Transition::Rejected => None,
        }
    }
}

/// Apply an edit of `field` to `value` on top of `current`.
pub fn transition(current: &QuantitySet, field: Field, value: f64) -> Transition {
    if !value.is_finite() {
        return Transition::Rejected;
    }
    let mut next = *current;
    match field {
        Field::Distance | Field::H1 | Field::H2 => {
            next.set(field, value);
            next.recompute_from_basic();
            return settle(next);
        }
        Field::Rise | Field::Run => {
            next.set(field, value);
            if next.run != 0.0 {
                next.percent = (next.rise / next.run) * 100.0;
            }
            next.angle = angle_from_percent(next.percent);
        }
        Field::Percent => {
            next.percent = value;
            next.angle = angle_from_percent(next.percent);
            next.rise = rise_from_percent_and_run(next.percent, next.run);
        }
        Field::Angle => {
            next.angle = value;
            next.percent = percent_from_angle(next.angle);
            next.rise = rise_from_percent_and_run(next.percent, next.run);
        }
        Field::Ratio => {
            if value == 0.0 {
                return Transition::Rejected;
            }
            next.percent = percent_from_ratio(value);
            next.angle = angle_from_percent(next.percent);
            next.rise = rise_from_percent_and_run(next.percent, next.run);
        }
    }
    next.distance = next.run;
    next.h2 = next.h1 + next.rise;
    next.store_ratio();
    settle(next)
}

// Finite inputs can still overflow downstream (100/1e-308, inf * 0 run).
fn settle(next: QuantitySet) -> Transition {
    if next.is_finite() {
        Transition::Applied(next)
    } else {
        Transition::Rejected
    }
}

/// Like [`transition`], but a rejected edit hands back `current` unchanged.
pub fn compute_quantities(field: Field, value: f64, current: &QuantitySet) -> QuantitySet {
    transition(current, field, value)
        .applied()
        .unwrap_or(*current)
}
