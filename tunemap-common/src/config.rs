//! Configuration loading and config file resolution
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `TUNEMAP_CONFIG` environment variable
//! 3. `<config_dir>/tunemap/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is not fatal: a warning is logged and compiled
//! defaults are used. A file that exists but does not parse is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TUNEMAP_CONFIG";

/// Name of the synthetic all-countries region
pub const GLOBAL_REGION: &str = "Global";

/// Root of the TOML configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Initial selection and per-view sizes
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Record preprocessing rules
    #[serde(default)]
    pub data: DataConfig,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Initial selection and view sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Week selected on startup (falls back to the latest week if absent from the data)
    #[serde(default = "default_week")]
    pub default_week: String,

    /// Country selected on startup (pruned if it has no records that week)
    #[serde(default = "default_country")]
    pub default_country: Option<String>,

    /// Number of ranked songs shown per country in the line view
    #[serde(default = "default_top_songs")]
    pub top_songs: u32,

    /// Number of genres profiled per country in the radar view
    #[serde(default = "default_radar_genres")]
    pub radar_genres: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_week: default_week(),
            default_country: default_country(),
            top_songs: default_top_songs(),
            radar_genres: default_radar_genres(),
        }
    }
}

/// Record preprocessing rules applied while building the record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Rows ranked below this cut are dropped
    #[serde(default = "default_max_rank")]
    pub max_rank: u32,

    /// Audio feature columns, each required and numeric in [0, 1]
    #[serde(default = "default_features")]
    pub features: Vec<String>,

    /// Genres kept as-is; checked in order by case-insensitive substring
    #[serde(default = "default_canonical_genres")]
    pub canonical_genres: Vec<String>,

    /// Genre assigned to rows matching none of `canonical_genres`
    #[serde(default = "default_fallback_genre")]
    pub fallback_genre: String,

    /// GeoJSON feature property holding the region name
    #[serde(default = "default_region_name_property")]
    pub region_name_property: String,

    /// Geometry region names rewritten to match chart country names
    #[serde(default = "default_region_aliases")]
    pub region_aliases: BTreeMap<String, String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            max_rank: default_max_rank(),
            features: default_features(),
            canonical_genres: default_canonical_genres(),
            fallback_genre: default_fallback_genre(),
            region_name_property: default_region_name_property(),
            region_aliases: default_region_aliases(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_week() -> String {
    "2022-06-16".to_string()
}

fn default_country() -> Option<String> {
    Some("Canada".to_string())
}

fn default_top_songs() -> u32 {
    5
}

fn default_radar_genres() -> usize {
    3
}

fn default_max_rank() -> u32 {
    20
}

fn default_features() -> Vec<String> {
    [
        "acousticness",
        "danceability",
        "instrumentalness",
        "liveness",
        "energy",
        "valence",
        "speechiness",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_canonical_genres() -> Vec<String> {
    ["pop", "trap", "reggaeton", "rock", "latin", "hip hop", "rap", "r&b"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_fallback_genre() -> String {
    "other".to_string()
}

fn default_region_name_property() -> String {
    "ADMIN".to_string()
}

fn default_region_aliases() -> BTreeMap<String, String> {
    let mut aliases = BTreeMap::new();
    aliases.insert(
        "United States of America".to_string(),
        "United States".to_string(),
    );
    aliases
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(text).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded TOML configuration from {:?}", path);
        Ok(config)
    }

    /// Reject settings that would make every view empty
    pub fn validate(&self) -> Result<()> {
        if self.dashboard.top_songs == 0 {
            return Err(Error::Config("dashboard.top_songs must be >= 1".to_string()));
        }
        if self.data.max_rank == 0 {
            return Err(Error::Config("data.max_rank must be >= 1".to_string()));
        }
        if self.data.features.is_empty() {
            return Err(Error::Config("data.features must not be empty".to_string()));
        }
        if self.data.fallback_genre.trim().is_empty() {
            return Err(Error::Config("data.fallback_genre must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Locates and loads the config file following the resolution priority
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    /// Create a resolver; `cli_path` is the `--config` argument if given
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Find the config file path to use, if any
    pub fn resolve_path(&self) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: Per-user config directory
        dirs::config_dir().map(|d| d.join("tunemap").join("config.toml"))
    }

    /// Load the resolved config, falling back to defaults if the file is missing
    pub fn load(&self) -> Result<TomlConfig> {
        let Some(path) = self.resolve_path() else {
            warn!("No config directory on this platform, using compiled defaults");
            return Ok(TomlConfig::default());
        };

        if !path.exists() {
            // An explicit CLI path that does not exist is a user error
            if self.cli_path.is_some() {
                return Err(Error::Config(format!("Config file not found: {:?}", path)));
            }
            warn!("Config file {:?} not found, using compiled defaults", path);
            return Ok(TomlConfig::default());
        }

        TomlConfig::load(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_dashboard_startup() {
        let config = TomlConfig::default();
        assert_eq!(config.dashboard.default_week, "2022-06-16");
        assert_eq!(config.dashboard.default_country.as_deref(), Some("Canada"));
        assert_eq!(config.dashboard.top_songs, 5);
        assert_eq!(config.data.max_rank, 20);
        assert_eq!(config.data.features.len(), 7);
        assert_eq!(config.data.canonical_genres[0], "pop");
        assert_eq!(config.data.fallback_genre, "other");
        assert_eq!(
            config.data.region_aliases.get("United States of America").map(String::as_str),
            Some("United States")
        );
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            [dashboard]
            default_week = "2022-07-01"
            radar_genres = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.dashboard.default_week, "2022-07-01");
        assert_eq!(config.dashboard.radar_genres, 2);
        assert_eq!(config.dashboard.top_songs, 5);
        assert_eq!(config.data, DataConfig::default());
    }

    #[test]
    fn test_zero_top_songs_rejected() {
        let err = TomlConfig::from_toml_str("[dashboard]\ntop_songs = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_empty_features_rejected() {
        let err = TomlConfig::from_toml_str("[data]\nfeatures = []\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = TomlConfig::from_toml_str("[dashboard\n").unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML"));
    }

    #[test]
    fn test_cli_path_has_priority() {
        let resolver = ConfigResolver::new(Some(PathBuf::from("/tmp/tunemap-cli.toml")));
        assert_eq!(
            resolver.resolve_path(),
            Some(PathBuf::from("/tmp/tunemap-cli.toml"))
        );
    }
}
