//! Slope chart: song ranks in the first selected country against the second,
//! or against Global when only one country is selected

use super::View;
use crate::render::Renderer;
use serde::Serialize;
use tunemap_common::aggregate::{comparison_pair, paired_rank_rows, PairedRankRow};
use tunemap_common::events::EventKind;
use tunemap_common::{RecordStore, Selection};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SlopeShape {
    pub week: String,
    pub country1: Option<String>,
    pub country2: Option<String>,
    pub rows: Vec<PairedRankRow>,
    pub highlighted: Option<String>,
}

pub struct SlopeView {
    renderer: Box<dyn Renderer<SlopeShape>>,
    latest: SlopeShape,
}

impl SlopeView {
    pub fn new(renderer: Box<dyn Renderer<SlopeShape>>) -> Self {
        Self {
            renderer,
            latest: SlopeShape::default(),
        }
    }
}

impl View for SlopeView {
    type Shape = SlopeShape;
    const NAME: &'static str = "slope";

    fn triggers(&self) -> &'static [EventKind] {
        &[EventKind::WeekChanged, EventKind::CountrySelectionChanged]
    }

    fn tracks_hover(&self) -> bool {
        true
    }

    fn refresh(&mut self, store: &RecordStore, selection: &Selection) {
        let week = selection.week();
        let highlighted = self.latest.highlighted.take();

        self.latest = match comparison_pair(selection.countries()) {
            Some((a, b)) => SlopeShape {
                week: week.to_string(),
                country1: Some(a.to_string()),
                country2: Some(b.to_string()),
                rows: paired_rank_rows(store, week, a, b),
                highlighted,
            },
            None => SlopeShape {
                week: week.to_string(),
                highlighted,
                ..SlopeShape::default()
            },
        };
        self.renderer.render(&self.latest);
    }

    fn on_hover(&mut self, track_name: Option<&str>) {
        self.latest.highlighted = track_name.map(str::to_string);
        self.renderer.highlight(track_name);
    }

    fn latest(&self) -> &SlopeShape {
        &self.latest
    }
}
