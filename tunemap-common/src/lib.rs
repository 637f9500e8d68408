//! # tunemap Common Library
//!
//! Data model and coordination core for the tunemap chart dashboard:
//! - Record store and dataset loading (chart rows + region geometry)
//! - Aggregation engine (per-view derived shapes)
//! - Selection state (week + up to two countries)
//! - Event types and the synchronous EventBus
//! - Configuration loading
//! - Error types

pub mod aggregate;
pub mod config;
pub mod error;
pub mod events;
pub mod records;
pub mod selection;

pub use error::{DataLoadError, Error, Result};
pub use events::{DashEvent, EventBus, EventKind};
pub use records::{ChartRecord, RecordStore, RegionGeometry};
pub use selection::{Selection, SelectionState};
