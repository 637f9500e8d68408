//! Raw dataset loading
//!
//! Reads the chart CSV and the region GeoJSON into untyped collaborator
//! shapes ([`RawTable`], [`RawGeometry`]) that [`RecordStore::load`] validates.
//! Both files are fetched concurrently and both must succeed before any
//! view is built.

use super::RecordStore;
use crate::config::DataConfig;
use crate::Result;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Chart rows as strings, exactly as read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Parse CSV text with a header line; blank lines are skipped
    pub fn from_csv_str(text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.len() == 1 && record[0].trim().is_empty() {
                continue;
            }
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }
}

/// GeoJSON FeatureCollection, reduced to what the record store reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGeometry {
    #[serde(default)]
    pub features: Vec<RawFeature>,
}

/// One GeoJSON feature; `geometry` is kept opaque for the renderer
#[derive(Debug, Clone, Deserialize)]
pub struct RawFeature {
    #[serde(default)]
    pub properties: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub geometry: serde_json::Value,
}

impl RawGeometry {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Load chart rows and region geometry from disk into a record store
///
/// The two reads run concurrently; an error from either aborts the load.
pub async fn load_dataset(
    chart_path: &Path,
    geometry_path: &Path,
    config: &DataConfig,
) -> Result<RecordStore> {
    debug!("Loading chart data from {:?} and geometry from {:?}", chart_path, geometry_path);

    let (chart_text, geometry_text) = tokio::try_join!(
        tokio::fs::read_to_string(chart_path),
        tokio::fs::read_to_string(geometry_path),
    )?;

    let table = RawTable::from_csv_str(&chart_text)?;
    let geometry = RawGeometry::from_json_str(&geometry_text)?;
    info!(
        "Read {} chart rows and {} geometry features",
        table.rows.len(),
        geometry.features.len()
    );

    Ok(RecordStore::load(table, geometry, config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_csv_headers_and_quoted_fields() {
        let table = RawTable::from_csv_str(
            "\u{feff}week,track_name\n2022-06-16,\"As It Was, Live\"\n\n2022-06-23,Late Night Talking\n",
        )
        .unwrap();
        assert_eq!(table.headers, ["week", "track_name"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][1], "As It Was, Live");
    }

    #[test]
    fn test_geometry_with_null_properties() {
        let geometry = RawGeometry::from_json_str(
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":null,"geometry":{"type":"Point","coordinates":[0,0]}}]}"#,
        )
        .unwrap();
        assert_eq!(geometry.features.len(), 1);
        assert!(geometry.features[0].properties.is_none());
    }

    #[tokio::test]
    async fn test_missing_geometry_file_aborts_load() {
        let mut chart = NamedTempFile::new().unwrap();
        writeln!(chart, "{}", super::super::tests::HEADER).unwrap();

        let result = load_dataset(
            chart.path(),
            Path::new("/nonexistent/tunemap/countries.geojson"),
            &DataConfig::default(),
        )
        .await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_load_dataset_from_files() {
        let mut chart = NamedTempFile::new().unwrap();
        writeln!(chart, "{}", super::super::tests::HEADER).unwrap();
        writeln!(
            chart,
            "{}",
            super::super::tests::row("2022-06-16", "Canada", 1, "A", "pop", 0.5)
        )
        .unwrap();

        let mut geo = NamedTempFile::new().unwrap();
        write!(
            geo,
            r#"{{"type":"FeatureCollection","features":[{{"type":"Feature","properties":{{"ADMIN":"Canada"}},"geometry":null}}]}}"#
        )
        .unwrap();

        let store = load_dataset(chart.path(), geo.path(), &DataConfig::default())
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.has_region("Canada"));
    }
}
