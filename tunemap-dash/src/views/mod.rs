//! View adapters
//!
//! Each view owns one aggregation call and one renderer. It declares which
//! event kinds make it re-aggregate; the dashboard wires those kinds to
//! [`View::refresh`] and song hovers to [`View::on_hover`].

mod line;
mod map;
mod radar;
mod slope;

pub use line::{CountryRankChart, LineShape, LineView};
pub use map::{MapShape, MapView};
pub use radar::{RadarShape, RadarView};
pub use slope::{SlopeShape, SlopeView};

use tunemap_common::events::EventKind;
use tunemap_common::{RecordStore, Selection};

/// A dashboard view driven by selection events
pub trait View {
    type Shape;

    /// Short name used in logs and JSON output
    const NAME: &'static str;

    /// Event kinds that trigger a re-aggregation
    fn triggers(&self) -> &'static [EventKind];

    /// Whether the view reacts to song hovers
    fn tracks_hover(&self) -> bool {
        false
    }

    /// Re-run the view's aggregation for the current selection and redraw
    fn refresh(&mut self, store: &RecordStore, selection: &Selection);

    /// Highlight a hovered song, `None` when the pointer leaves
    fn on_hover(&mut self, _track_name: Option<&str>) {}

    /// Shape from the most recent refresh
    fn latest(&self) -> &Self::Shape;
}
