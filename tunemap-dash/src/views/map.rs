//! Choropleth map view: every region colored by its top genre for the week

use super::View;
use crate::render::Renderer;
use serde::Serialize;
use tunemap_common::aggregate::{annotate_regions, RegionAnnotation};
use tunemap_common::events::EventKind;
use tunemap_common::{RecordStore, Selection};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapShape {
    pub week: String,
    pub regions: Vec<RegionAnnotation>,
    /// Color domain, in first-seen order
    pub legend: Vec<String>,
}

pub struct MapView {
    renderer: Box<dyn Renderer<MapShape>>,
    latest: MapShape,
}

impl MapView {
    pub fn new(renderer: Box<dyn Renderer<MapShape>>) -> Self {
        Self {
            renderer,
            latest: MapShape::default(),
        }
    }
}

impl View for MapView {
    type Shape = MapShape;
    const NAME: &'static str = "map";

    fn triggers(&self) -> &'static [EventKind] {
        &[EventKind::WeekChanged]
    }

    fn refresh(&mut self, store: &RecordStore, selection: &Selection) {
        self.latest = MapShape {
            week: selection.week().to_string(),
            regions: annotate_regions(store, selection.week()),
            legend: store.genre_domain().to_vec(),
        };
        self.renderer.render(&self.latest);
    }

    fn latest(&self) -> &MapShape {
        &self.latest
    }
}
