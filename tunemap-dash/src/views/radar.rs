//! Radar chart: mean audio features of each selected country's top genres

use super::View;
use crate::render::Renderer;
use serde::Serialize;
use tunemap_common::aggregate::{average_features_by_genre, GenreAggregate};
use tunemap_common::events::EventKind;
use tunemap_common::{RecordStore, Selection};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RadarShape {
    pub week: String,
    /// Axis order
    pub features: Vec<String>,
    pub profiles: Vec<GenreAggregate>,
}

pub struct RadarView {
    renderer: Box<dyn Renderer<RadarShape>>,
    genre_count: usize,
    latest: RadarShape,
}

impl RadarView {
    pub fn new(renderer: Box<dyn Renderer<RadarShape>>, genre_count: usize) -> Self {
        Self {
            renderer,
            genre_count,
            latest: RadarShape::default(),
        }
    }
}

impl View for RadarView {
    type Shape = RadarShape;
    const NAME: &'static str = "radar";

    fn triggers(&self) -> &'static [EventKind] {
        &[EventKind::WeekChanged, EventKind::CountrySelectionChanged]
    }

    fn refresh(&mut self, store: &RecordStore, selection: &Selection) {
        self.latest = RadarShape {
            week: selection.week().to_string(),
            features: store.features().to_vec(),
            profiles: average_features_by_genre(
                store,
                selection.week(),
                selection.countries(),
                self.genre_count,
            ),
        };
        self.renderer.render(&self.latest);
    }

    fn latest(&self) -> &RadarShape {
        &self.latest
    }
}
