//! tunemap-dash library - dashboard orchestration
//!
//! Owns the selection state and the event bus. User gestures arrive here,
//! mutate the selection, and are then published; every view subscribed to
//! the resulting event kinds re-aggregates and redraws before the gesture
//! method returns.

use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};
use tunemap_common::config::TomlConfig;
use tunemap_common::events::{DashEvent, EventBus, EventKind};
use tunemap_common::selection::SelectionChange;
use tunemap_common::{RecordStore, Selection};

pub mod logging;
pub mod render;
pub mod views;

use render::{NullRenderer, Renderer};
use views::{LineShape, LineView, MapShape, MapView, RadarShape, RadarView, SlopeShape, SlopeView, View};

/// One renderer per view
pub struct Renderers {
    pub map: Box<dyn Renderer<MapShape>>,
    pub line: Box<dyn Renderer<LineShape>>,
    pub slope: Box<dyn Renderer<SlopeShape>>,
    pub radar: Box<dyn Renderer<RadarShape>>,
}

impl Default for Renderers {
    fn default() -> Self {
        Self {
            map: Box::new(NullRenderer),
            line: Box::new(NullRenderer),
            slope: Box::new(NullRenderer),
            radar: Box::new(NullRenderer),
        }
    }
}

/// Latest shape of every view
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub selection: Selection,
    pub map: MapShape,
    pub line: LineShape,
    pub slope: SlopeShape,
    pub radar: RadarShape,
}

/// The four linked views plus the state that keeps them consistent
pub struct Dashboard {
    store: Rc<RecordStore>,
    selection: Rc<RefCell<Selection>>,
    bus: EventBus,
    map: Rc<RefCell<MapView>>,
    line: Rc<RefCell<LineView>>,
    slope: Rc<RefCell<SlopeView>>,
    radar: Rc<RefCell<RadarView>>,
}

impl Dashboard {
    /// Build the views, subscribe them, and draw each once
    pub fn new(store: RecordStore, config: &TomlConfig, renderers: Renderers) -> Self {
        let store = Rc::new(store);
        let selection = Rc::new(RefCell::new(Selection::with_defaults(&store, &config.dashboard)));
        let bus = EventBus::new();

        let map = Rc::new(RefCell::new(MapView::new(renderers.map)));
        let line = Rc::new(RefCell::new(LineView::new(renderers.line, config.dashboard.top_songs)));
        let slope = Rc::new(RefCell::new(SlopeView::new(renderers.slope)));
        let radar = Rc::new(RefCell::new(RadarView::new(
            renderers.radar,
            config.dashboard.radar_genres,
        )));

        attach(&bus, &map, &store, &selection);
        attach(&bus, &line, &store, &selection);
        attach(&bus, &slope, &store, &selection);
        attach(&bus, &radar, &store, &selection);

        {
            let sel = selection.borrow();
            map.borrow_mut().refresh(&store, &sel);
            line.borrow_mut().refresh(&store, &sel);
            slope.borrow_mut().refresh(&store, &sel);
            radar.borrow_mut().refresh(&store, &sel);
            info!(
                "Dashboard ready on week {} with countries {:?}",
                sel.week(),
                sel.countries()
            );
        }

        Self {
            store,
            selection,
            bus,
            map,
            line,
            slope,
            radar,
        }
    }

    /// Map click: select or deselect a country
    pub fn click_region(&mut self, name: &str) -> SelectionChange {
        let change = self.selection.borrow_mut().toggle_country(name, &self.store);
        self.announce(&change);
        change
    }

    /// Timeline control: move to another week
    pub fn move_timeline(&mut self, week: &str) -> SelectionChange {
        let change = self.selection.borrow_mut().set_week(week, &self.store);
        self.announce(&change);
        change
    }

    /// Deselect every country
    pub fn clear_selection(&mut self) -> SelectionChange {
        let change = self.selection.borrow_mut().clear();
        self.announce(&change);
        change
    }

    /// Slope-chart label hover; `None` when the pointer leaves
    pub fn hover_song(&mut self, track_name: Option<&str>) {
        self.publish(DashEvent::SongHoverInteraction {
            track_name: track_name.map(str::to_string),
        });
    }

    pub fn selection(&self) -> Selection {
        self.selection.borrow().clone()
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Bus for extra subscribers (logging, external renderers)
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            selection: self.selection(),
            map: self.map.borrow().latest().clone(),
            line: self.line.borrow().latest().clone(),
            slope: self.slope.borrow().latest().clone(),
            radar: self.radar.borrow().latest().clone(),
        }
    }

    /// Publish the events a selection change implies, week first
    fn announce(&self, change: &SelectionChange) {
        if change.is_noop() {
            return;
        }
        let selection = self.selection();
        if change.week_changed {
            self.publish(DashEvent::WeekChanged {
                week: selection.week().to_string(),
            });
        }
        if change.countries_changed {
            self.publish(DashEvent::CountrySelectionChanged {
                countries: selection.countries().to_vec(),
            });
        }
    }

    fn publish(&self, event: DashEvent) {
        match self.bus.publish(event) {
            Ok(n) => debug!("Event delivered to {} view(s)", n),
            Err(e) => warn!("Event dropped: {}", e),
        }
    }
}

/// Subscribe a view to its trigger kinds (and hovers, if it tracks them)
fn attach<V: View + 'static>(
    bus: &EventBus,
    view: &Rc<RefCell<V>>,
    store: &Rc<RecordStore>,
    selection: &Rc<RefCell<Selection>>,
) {
    let triggers = view.borrow().triggers();
    for &kind in triggers {
        let view = Rc::clone(view);
        let store = Rc::clone(store);
        let selection = Rc::clone(selection);
        bus.subscribe(kind, move |event| {
            debug!("{} view refreshing on {}", V::NAME, event.event_type());
            view.borrow_mut().refresh(&store, &selection.borrow());
        });
    }

    if view.borrow().tracks_hover() {
        let view = Rc::clone(view);
        bus.subscribe(EventKind::SongHoverInteraction, move |event| {
            if let DashEvent::SongHoverInteraction { track_name } = event {
                view.borrow_mut().on_hover(track_name.as_deref());
            }
        });
    }
}
