//! Record store
//!
//! Holds the immutable chart rows and region geometry for the lifetime of the
//! dashboard. Built once from raw collaborator output by [`RecordStore::load`],
//! read-only afterwards.
//!
//! Load pipeline, in order:
//! - required columns checked against the header
//! - week, rank and feature fields parsed and range-checked
//! - duplicate (week, country, rank) and (week, country, track) rows dropped, first wins
//! - artist genres folded into the canonical set
//! - rows ranked below `max_rank` dropped

mod loader;
mod normalize;

pub use loader::{load_dataset, RawFeature, RawGeometry, RawTable};
pub use normalize::GenreNormalizer;

use crate::config::DataConfig;
use crate::error::DataLoadError;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{info, warn};

/// Audio feature name → value in [0, 1]
pub type AudioFeatures = BTreeMap<String, f64>;

/// Week keys are ISO dates
pub const WEEK_FORMAT: &str = "%Y-%m-%d";

/// Columns every chart table must carry (audio feature columns come from config)
pub const REQUIRED_COLUMNS: [&str; 5] = ["week", "country", "rank", "track_name", "artist_genre"];

/// One row of the weekly chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRecord {
    pub week: String,
    pub country: String,
    pub rank: u32,
    pub track_name: String,
    pub artist_genre: String,
    pub audio_features: AudioFeatures,
}

/// A named region with opaque boundary data
///
/// Genre annotations are not stored here; they are recomputed per week into a
/// fresh map (see [`crate::aggregate::annotate_regions`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionGeometry {
    pub name: String,
    pub geometry: serde_json::Value,
}

/// Immutable dataset: chart rows plus region geometry
#[derive(Debug, Clone)]
pub struct RecordStore {
    records: Vec<ChartRecord>,
    /// Week → record indices, in input order
    by_week: HashMap<String, Vec<usize>>,
    /// Ascending by date
    weeks: Vec<String>,
    regions: Vec<RegionGeometry>,
    region_index: HashMap<String, usize>,
    /// Distinct genres in first-seen order
    genre_domain: Vec<String>,
    features: Vec<String>,
}

/// Row fields after parsing, before dedupe and normalization
struct ParsedRow {
    week: String,
    date: NaiveDate,
    country: String,
    rank: u32,
    track_name: String,
    artist_genre: String,
    audio_features: AudioFeatures,
}

impl RecordStore {
    /// Build the store from raw chart rows and raw geometry
    ///
    /// Fails if a required column is missing or a row's week, rank or feature
    /// fields are malformed. Nothing is mutated after this returns.
    pub fn load(
        table: RawTable,
        geometry: RawGeometry,
        config: &DataConfig,
    ) -> Result<Self, DataLoadError> {
        let column_index = index_columns(&table.headers, &config.features)?;
        let normalizer = GenreNormalizer::new(&config.canonical_genres, &config.fallback_genre);

        let mut parsed = Vec::with_capacity(table.rows.len());
        for (i, row) in table.rows.iter().enumerate() {
            parsed.push(parse_row(i + 1, row, table.headers.len(), &column_index, config)?);
        }

        let mut seen_rank = HashSet::new();
        let mut seen_track = HashSet::new();
        let mut dropped_duplicates = 0usize;
        let mut dropped_rank = 0usize;
        let mut records = Vec::with_capacity(parsed.len());
        let mut week_dates: BTreeMap<NaiveDate, String> = BTreeMap::new();

        for row in parsed {
            let rank_key = (row.week.clone(), row.country.clone(), row.rank);
            let track_key = (row.week.clone(), row.country.clone(), row.track_name.clone());
            if seen_rank.contains(&rank_key) || seen_track.contains(&track_key) {
                warn!(
                    "Dropping duplicate chart row: week={} country={} rank={} track={}",
                    row.week, row.country, row.rank, row.track_name
                );
                dropped_duplicates += 1;
                continue;
            }
            seen_rank.insert(rank_key);
            seen_track.insert(track_key);

            if row.rank > config.max_rank {
                dropped_rank += 1;
                continue;
            }

            week_dates.entry(row.date).or_insert_with(|| row.week.clone());
            records.push(ChartRecord {
                week: row.week,
                country: row.country,
                rank: row.rank,
                track_name: row.track_name,
                artist_genre: normalizer.normalize(&row.artist_genre),
                audio_features: row.audio_features,
            });
        }

        let mut by_week: HashMap<String, Vec<usize>> = HashMap::new();
        let mut genre_domain: Vec<String> = Vec::new();
        for (i, record) in records.iter().enumerate() {
            by_week.entry(record.week.clone()).or_default().push(i);
            if !genre_domain.contains(&record.artist_genre) {
                genre_domain.push(record.artist_genre.clone());
            }
        }

        let (regions, region_index) = build_regions(geometry, config)?;

        let store = Self {
            records,
            by_week,
            weeks: week_dates.into_values().collect(),
            regions,
            region_index,
            genre_domain,
            features: config.features.clone(),
        };

        info!(
            "Record store loaded: {} records, {} weeks, {} regions ({} duplicates dropped, {} below rank cut)",
            store.records.len(),
            store.weeks.len(),
            store.regions.len(),
            dropped_duplicates,
            dropped_rank
        );

        Ok(store)
    }

    /// All records for a week, in input order (empty for an unknown week)
    pub fn records_for_week(&self, week: &str) -> Vec<&ChartRecord> {
        self.by_week
            .get(week)
            .map(|idx| idx.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }

    /// All records for one country across every week, in input order
    pub fn records_for_country(&self, country: &str) -> Vec<&ChartRecord> {
        self.records.iter().filter(|r| r.country == country).collect()
    }

    /// Every week in the dataset, ascending by date
    pub fn all_weeks(&self) -> &[String] {
        &self.weeks
    }

    /// Most recent week, if any records loaded
    pub fn latest_week(&self) -> Option<&str> {
        self.weeks.last().map(String::as_str)
    }

    /// 1-based position of a week on the timeline
    pub fn week_number(&self, week: &str) -> Option<usize> {
        self.weeks.iter().position(|w| w == week).map(|i| i + 1)
    }

    pub fn has_week(&self, week: &str) -> bool {
        self.by_week.contains_key(week)
    }

    /// Whether a country charted at all in a week
    pub fn has_records(&self, week: &str, country: &str) -> bool {
        self.by_week
            .get(week)
            .is_some_and(|idx| idx.iter().any(|&i| self.records[i].country == country))
    }

    pub fn geometry_by_region_name(&self, name: &str) -> Option<&RegionGeometry> {
        self.region_index.get(name).map(|&i| &self.regions[i])
    }

    pub fn has_region(&self, name: &str) -> bool {
        self.region_index.contains_key(name)
    }

    /// All regions in geometry input order
    pub fn regions(&self) -> &[RegionGeometry] {
        &self.regions
    }

    /// Distinct genres in first-seen order (legend and color domain)
    pub fn genre_domain(&self) -> &[String] {
        &self.genre_domain
    }

    /// Configured audio feature names, in configured order
    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Column name → position, checking required and feature columns are present
fn index_columns(
    headers: &[String],
    features: &[String],
) -> Result<HashMap<String, usize>, DataLoadError> {
    let index: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_string(), i))
        .collect();

    for column in REQUIRED_COLUMNS.iter().copied().chain(features.iter().map(String::as_str)) {
        if !index.contains_key(column) {
            return Err(DataLoadError::MissingColumn {
                column: column.to_string(),
            });
        }
    }
    Ok(index)
}

fn parse_row(
    line: usize,
    row: &[String],
    width: usize,
    columns: &HashMap<String, usize>,
    config: &DataConfig,
) -> Result<ParsedRow, DataLoadError> {
    if row.len() < width {
        return Err(DataLoadError::ShortRow {
            line,
            expected: width,
            found: row.len(),
        });
    }
    let field = |name: &str| row[columns[name]].trim();

    let raw_week = field("week");
    let date = NaiveDate::parse_from_str(raw_week, WEEK_FORMAT).map_err(|_| {
        DataLoadError::InvalidWeek {
            line,
            value: raw_week.to_string(),
        }
    })?;
    // "2022-6-16" and "2022-06-16" are the same week
    let week = date.format(WEEK_FORMAT).to_string();

    let rank = parse_rank(line, field("rank"))?;

    let mut audio_features = AudioFeatures::new();
    for name in &config.features {
        let raw = field(name);
        let value: f64 = raw.parse().map_err(|_| DataLoadError::NonNumeric {
            line,
            column: name.clone(),
            value: raw.to_string(),
        })?;
        if !(0.0..=1.0).contains(&value) {
            return Err(DataLoadError::FeatureOutOfRange {
                line,
                column: name.clone(),
                value,
            });
        }
        audio_features.insert(name.clone(), value);
    }

    Ok(ParsedRow {
        week,
        date,
        country: field("country").to_string(),
        rank,
        track_name: field("track_name").to_string(),
        artist_genre: field("artist_genre").to_string(),
        audio_features,
    })
}

/// Ranks may be written as "3" or "3.0"
fn parse_rank(line: usize, raw: &str) -> Result<u32, DataLoadError> {
    let non_numeric = || DataLoadError::NonNumeric {
        line,
        column: "rank".to_string(),
        value: raw.to_string(),
    };

    let rank = match raw.parse::<i64>() {
        Ok(rank) => rank,
        Err(_) => {
            let value: f64 = raw.parse().map_err(|_| non_numeric())?;
            if !value.is_finite() || value.fract() != 0.0 {
                return Err(non_numeric());
            }
            value as i64
        }
    };

    if rank < 1 || rank > u32::MAX as i64 {
        return Err(DataLoadError::RankOutOfRange { line, rank });
    }
    Ok(rank as u32)
}

fn build_regions(
    geometry: RawGeometry,
    config: &DataConfig,
) -> Result<(Vec<RegionGeometry>, HashMap<String, usize>), DataLoadError> {
    let mut regions = Vec::with_capacity(geometry.features.len());
    let mut index = HashMap::new();

    for (i, feature) in geometry.features.into_iter().enumerate() {
        let name = feature
            .properties
            .as_ref()
            .and_then(|p| p.get(&config.region_name_property))
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                DataLoadError::InvalidGeometry(format!(
                    "feature {} has no string property '{}'",
                    i, config.region_name_property
                ))
            })?;
        let name = config
            .region_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string());

        if index.contains_key(&name) {
            warn!("Duplicate region '{}' in geometry, keeping first", name);
            continue;
        }
        index.insert(name.clone(), regions.len());
        regions.push(RegionGeometry {
            name,
            geometry: feature.geometry,
        });
    }

    Ok((regions, index))
}
