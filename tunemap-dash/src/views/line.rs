//! Rank line chart: each selected country's top songs this week, traced
//! across the whole timeline

use super::View;
use crate::render::Renderer;
use serde::Serialize;
use tunemap_common::aggregate::{rank_trajectories, top_n_ranked_songs, RankTrajectory};
use tunemap_common::events::EventKind;
use tunemap_common::{ChartRecord, RecordStore, Selection};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryRankChart {
    pub country: String,
    pub top_songs: Vec<ChartRecord>,
    pub trajectories: Vec<RankTrajectory>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineShape {
    pub week: String,
    pub charts: Vec<CountryRankChart>,
    pub highlighted: Option<String>,
}

pub struct LineView {
    renderer: Box<dyn Renderer<LineShape>>,
    top_songs: u32,
    latest: LineShape,
}

impl LineView {
    pub fn new(renderer: Box<dyn Renderer<LineShape>>, top_songs: u32) -> Self {
        Self {
            renderer,
            top_songs,
            latest: LineShape::default(),
        }
    }
}

impl View for LineView {
    type Shape = LineShape;
    const NAME: &'static str = "line";

    fn triggers(&self) -> &'static [EventKind] {
        &[EventKind::WeekChanged, EventKind::CountrySelectionChanged]
    }

    fn tracks_hover(&self) -> bool {
        true
    }

    fn refresh(&mut self, store: &RecordStore, selection: &Selection) {
        let week = selection.week();
        let charts = selection
            .countries()
            .iter()
            .map(|country| {
                let top_songs = top_n_ranked_songs(store, week, country, self.top_songs);
                let tracks: Vec<String> = top_songs.iter().map(|r| r.track_name.clone()).collect();
                CountryRankChart {
                    country: country.clone(),
                    trajectories: rank_trajectories(store, country, &tracks),
                    top_songs,
                }
            })
            .collect();

        self.latest = LineShape {
            week: week.to_string(),
            charts,
            highlighted: self.latest.highlighted.take(),
        };
        self.renderer.render(&self.latest);
    }

    fn on_hover(&mut self, track_name: Option<&str>) {
        self.latest.highlighted = track_name.map(str::to_string);
        self.renderer.highlight(track_name);
    }

    fn latest(&self) -> &LineShape {
        &self.latest
    }
}
