//! Selection state
//!
//! The selected week plus up to two selected countries, in selection order.
//! Every mutation re-applies the pruning rule: a selected country with no
//! chart rows in the selected week is dropped.
//!
//! State machine by country count:
//! - `Empty → Single` on the first toggle
//! - `Single → Paired` on a second distinct toggle
//! - `Paired → Single` when one of the two is toggled off
//! - any state `→ Empty` on `clear`
//!
//! Week changes only shrink the set, through pruning.

use crate::config::DashboardConfig;
use crate::records::RecordStore;
use serde::Serialize;
use tracing::debug;

/// Maximum number of countries selected at once
pub const MAX_SELECTED: usize = 2;

/// Selection cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelectionState {
    Empty,
    Single,
    Paired,
}

/// What a selection operation changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionChange {
    pub week_changed: bool,
    pub countries_changed: bool,
    /// Countries dropped because they had no rows in the selected week
    pub pruned: Vec<String>,
}

impl SelectionChange {
    pub fn is_noop(&self) -> bool {
        !self.week_changed && !self.countries_changed
    }
}

/// Current week and selected countries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    week: String,
    countries: Vec<String>,
}

impl Selection {
    /// Selection on `week` with no countries
    pub fn new(week: impl Into<String>) -> Self {
        Self {
            week: week.into(),
            countries: Vec::new(),
        }
    }

    /// Startup selection from configuration
    ///
    /// Uses the configured week if the dataset has it, otherwise the latest
    /// week. The default country is toggled in and pruned like any other.
    pub fn with_defaults(store: &RecordStore, config: &DashboardConfig) -> Self {
        let week = if store.has_week(&config.default_week) {
            config.default_week.clone()
        } else {
            let fallback = store.latest_week().unwrap_or(&config.default_week).to_string();
            debug!(
                "Default week {} not in dataset, starting on {}",
                config.default_week, fallback
            );
            fallback
        };

        let mut selection = Self::new(week);
        if let Some(country) = &config.default_country {
            selection.toggle_country(country, store);
        }
        selection
    }

    pub fn week(&self) -> &str {
        &self.week
    }

    /// Selected countries, oldest first
    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn contains(&self, country: &str) -> bool {
        self.countries.iter().any(|c| c == country)
    }

    pub fn state(&self) -> SelectionState {
        match self.countries.len() {
            0 => SelectionState::Empty,
            1 => SelectionState::Single,
            _ => SelectionState::Paired,
        }
    }

    /// Select or deselect a country
    ///
    /// A country that is already selected is removed. Otherwise it is appended,
    /// evicting the oldest selection if two are already chosen. Names without
    /// region geometry, or without chart rows in the selected week, are ignored.
    pub fn toggle_country(&mut self, name: &str, store: &RecordStore) -> SelectionChange {
        let before = self.countries.clone();

        if let Some(pos) = self.countries.iter().position(|c| c == name) {
            self.countries.remove(pos);
        } else if !store.has_region(name) {
            debug!("Ignoring toggle of unknown region '{}'", name);
            return SelectionChange::default();
        } else if !store.has_records(&self.week, name) {
            // Checked before eviction so a full selection is left intact
            debug!("Ignoring toggle of '{}': no chart rows in week {}", name, self.week);
            return SelectionChange::default();
        } else {
            if self.countries.len() >= MAX_SELECTED {
                let evicted = self.countries.remove(0);
                debug!("Selection full, evicting '{}'", evicted);
            }
            self.countries.push(name.to_string());
        }

        let pruned = self.prune(store);
        let change = SelectionChange {
            week_changed: false,
            countries_changed: self.countries != before,
            pruned,
        };
        debug!("Toggled '{}': {:?} -> {:?}", name, before, self.countries);
        change
    }

    /// Move to another week and drop countries that did not chart in it
    ///
    /// Weeks absent from the dataset are ignored.
    pub fn set_week(&mut self, week: &str, store: &RecordStore) -> SelectionChange {
        if !store.has_week(week) {
            debug!("Ignoring unknown week '{}'", week);
            return SelectionChange::default();
        }

        let week_changed = self.week != week;
        self.week = week.to_string();

        let pruned = self.prune(store);
        if !pruned.is_empty() {
            debug!("Week {} pruned {:?} from selection", week, pruned);
        }
        SelectionChange {
            week_changed,
            countries_changed: !pruned.is_empty(),
            pruned,
        }
    }

    /// Deselect every country
    pub fn clear(&mut self) -> SelectionChange {
        let countries_changed = !self.countries.is_empty();
        self.countries.clear();
        SelectionChange {
            week_changed: false,
            countries_changed,
            pruned: Vec::new(),
        }
    }

    fn prune(&mut self, store: &RecordStore) -> Vec<String> {
        let week = &self.week;
        let (kept, pruned): (Vec<String>, Vec<String>) = self
            .countries
            .drain(..)
            .partition(|c| store.has_records(week, c));
        self.countries = kept;
        pruned
    }
}
