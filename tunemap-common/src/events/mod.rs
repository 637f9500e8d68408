//! Event types for cross-view synchronization
//!
//! Provides the closed set of dashboard events and the synchronous
//! [`EventBus`] that carries them from view to view.

mod bus;

pub use bus::{BusError, EventBus, SubscriptionId};

use serde::{Deserialize, Serialize};

/// Dashboard event types
///
/// Events are published on the [`EventBus`] after the orchestration layer has
/// applied a selection change, and can be serialized for logging or replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DashEvent {
    /// Selected week changed
    ///
    /// Triggers:
    /// - Map: recompute top genre per region
    /// - Line, Slope, Radar: re-aggregate for the new week
    WeekChanged {
        /// Newly selected week (YYYY-MM-DD)
        week: String,
    },

    /// Selected countries changed (toggle, clear, or pruning after a week change)
    ///
    /// Triggers:
    /// - Line, Slope, Radar: re-aggregate for the new country set
    CountrySelectionChanged {
        /// Selected countries, oldest first (at most two)
        countries: Vec<String>,
    },

    /// Pointer entered or left a song label in the slope chart
    ///
    /// Triggers:
    /// - Line, Slope: highlight the song (or clear the highlight on `None`)
    SongHoverInteraction {
        /// Hovered track, `None` when the pointer leaves
        track_name: Option<String>,
    },
}

/// Discriminant of [`DashEvent`], used for subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    WeekChanged,
    CountrySelectionChanged,
    SongHoverInteraction,
}

impl DashEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DashEvent::WeekChanged { .. } => EventKind::WeekChanged,
            DashEvent::CountrySelectionChanged { .. } => EventKind::CountrySelectionChanged,
            DashEvent::SongHoverInteraction { .. } => EventKind::SongHoverInteraction,
        }
    }

    /// Get event type as string for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            DashEvent::WeekChanged { .. } => "WeekChanged",
            DashEvent::CountrySelectionChanged { .. } => "CountrySelectionChanged",
            DashEvent::SongHoverInteraction { .. } => "SongHoverInteraction",
        }
    }
}
