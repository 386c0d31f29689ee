//! Editing session tying the conversion engine to a profile.
//!
//! The session owns the form's [`QuantitySet`] (display units), the current
//! [`Profile`] (always metric) and the active [`UnitSystem`]. Every change is
//! applied while an update-in-progress flag is held; listeners notified during
//! that window may write values back into the session, and those echoed edits
//! are suppressed instead of cascading forever.

use std::cell::{Cell, Ref, RefCell};

use tracing::debug;

use crate::config::Preferences;
use crate::engine::{transition, Field, QuantitySet, Transition};
use crate::profile::{Point, Profile};
use crate::units::{UnitPreferences, UnitSystem};
use crate::SlopeError;

const NEW_PROFILE_DISTANCE_M: f64 = 100.0;

/// Set while a change is being applied and its listeners run.
#[derive(Debug, Default)]
pub struct UpdateFlag(Cell<bool>);

impl UpdateFlag {
    pub fn in_progress(&self) -> bool {
        self.0.get()
    }

    /// Raise the flag, or `None` if a change is already being applied.
    pub fn try_begin(&self) -> Option<UpdateGuard<'_>> {
        if self.0.replace(true) {
            return None;
        }
        Some(UpdateGuard(&self.0))
    }
}

/// Lowers the flag on drop.
pub struct UpdateGuard<'a>(&'a Cell<bool>);

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    /// The value does not encode a slope; nothing changed.
    Rejected,
    /// Another change was in progress; the edit was dropped.
    Suppressed,
}

type Listener = Box<dyn Fn(&SlopeEditor, &QuantitySet)>;

struct SessionState {
    quantities: QuantitySet,
    profile: Profile,
    units: UnitSystem,
}

pub struct SlopeEditor {
    state: RefCell<SessionState>,
    updating: UpdateFlag,
    listeners: Vec<Listener>,
    status_decimals: usize,
}

impl Default for SlopeEditor {
    fn default() -> Self {
        Self::new(&Preferences::default())
    }
}

impl SlopeEditor {
    /// New session holding the default 100 m flat profile.
    pub fn new(prefs: &Preferences) -> Self {
        let units = UnitPreferences::new(prefs.units);
        let quantities = QuantitySet::from_basic(units.from_metric(NEW_PROFILE_DISTANCE_M), 0.0, 0.0);
        Self {
            state: RefCell::new(SessionState {
                quantities,
                profile: Profile::from_endpoints(NEW_PROFILE_DISTANCE_M, 0.0, 0.0),
                units: prefs.units,
            }),
            updating: UpdateFlag::default(),
            listeners: Vec::new(),
            status_decimals: prefs.status_decimals,
        }
    }

    /// Called with the new quantities after every applied change.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&SlopeEditor, &QuantitySet) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn quantities(&self) -> QuantitySet {
        self.state.borrow().quantities
    }

    pub fn profile(&self) -> Ref<'_, Profile> {
        Ref::map(self.state.borrow(), |s| &s.profile)
    }

    pub fn units(&self) -> UnitSystem {
        self.state.borrow().units
    }

    pub fn is_updating(&self) -> bool {
        self.updating.in_progress()
    }

    pub fn ratio_label(&self) -> String {
        self.quantities().ratio_label()
    }

    pub fn status_line(&self) -> String {
        let state = self.state.borrow();
        format!(
            "units: {} | slope: {:.*}%",
            state.units.length_label(),
            self.status_decimals,
            state.quantities.percent
        )
    }

    /// Apply a user edit to one quantity.
    pub fn edit(&self, field: Field, value: f64) -> EditOutcome {
        let Some(_guard) = self.updating.try_begin() else {
            debug!(%field, value, "edit suppressed while an update is in progress");
            return EditOutcome::Suppressed;
        };
        let current = self.quantities();
        match transition(&current, field, value) {
            Transition::Applied(next) => {
                self.commit(next);
                EditOutcome::Applied
            }
            Transition::Rejected => {
                debug!(%field, value, "edit rejected");
                EditOutcome::Rejected
            }
        }
    }

    /// Switch the display unit system, rescaling every length in the form.
    pub fn set_units(&self, system: UnitSystem) -> EditOutcome {
        let Some(_guard) = self.updating.try_begin() else {
            return EditOutcome::Suppressed;
        };
        let (old, current) = {
            let state = self.state.borrow();
            (state.units, state.quantities)
        };
        if old == system {
            return EditOutcome::Rejected;
        }
        let scaled = current.rescaled(old, system);
        self.state.borrow_mut().units = system;
        debug!(from = %old, to = %system, "unit system changed");
        self.commit(QuantitySet::from_basic(scaled.distance, scaled.h1, scaled.h2));
        EditOutcome::Applied
    }

    /// Replace the profile and reset the form to its first/last points.
    pub fn load_profile(&self, profile: Profile) -> Result<EditOutcome, SlopeError> {
        let (first, last) = match (profile.first(), profile.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(SlopeError::EmptyProfile),
        };
        Ok(self.replace_profile(profile, first, last))
    }

    /// Start over with a flat 100 m two-point profile.
    pub fn new_profile(&self) -> EditOutcome {
        let first = Point::new(0.0, 0.0);
        let last = Point::new(NEW_PROFILE_DISTANCE_M, 0.0);
        self.replace_profile(Profile::new(vec![first, last]), first, last)
    }

    fn replace_profile(&self, profile: Profile, first: Point, last: Point) -> EditOutcome {
        let Some(_guard) = self.updating.try_begin() else {
            return EditOutcome::Suppressed;
        };
        let units = UnitPreferences::new(self.units());
        let quantities = QuantitySet::from_basic(
            units.from_metric(last.x - first.x),
            units.from_metric(first.z),
            units.from_metric(last.z),
        );
        debug!(points = profile.len(), "profile loaded into session");
        {
            let mut state = self.state.borrow_mut();
            state.profile = profile;
            state.quantities = quantities;
        }
        self.notify(&quantities);
        EditOutcome::Applied
    }

    /// Insert or replace a profile point (metric) without touching the form.
    pub fn replace_point(&self, index: usize, point: Point) -> Result<Point, SlopeError> {
        self.state.borrow_mut().profile.replace(index, point)
    }

    pub fn insert_point(&self, index: usize, point: Point) -> Result<(), SlopeError> {
        self.state.borrow_mut().profile.insert(index, point)
    }

    fn commit(&self, next: QuantitySet) {
        {
            let mut state = self.state.borrow_mut();
            state.quantities = next;
            if state.profile.len() == 2 {
                let units = UnitPreferences::new(state.units);
                state.profile.points[0] = Point::new(0.0, units.to_metric(next.h1));
                state.profile.points[1] =
                    Point::new(units.to_metric(next.distance), units.to_metric(next.h2));
            }
        }
        self.notify(&next);
    }

    fn notify(&self, set: &QuantitySet) {
        for listener in &self.listeners {
            listener(self, set);
        }
    }
}
