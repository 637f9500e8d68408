//! tunemap - weekly music chart dashboard (headless)
//!
//! Loads a chart CSV and a country GeoJSON, builds the four linked views,
//! replays a scripted set of gestures, and prints the resulting view shapes
//! as JSON on stdout. Logs go to stderr.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::info;
use tunemap_common::config::{ConfigResolver, TomlConfig};
use tunemap_common::records::load_dataset;
use tunemap_common::RecordStore;
use tunemap_dash::logging;
use tunemap_dash::render::{JsonLinesRenderer, SharedWriter};
use tunemap_dash::{Dashboard, Renderers};

#[derive(Parser, Debug)]
#[command(name = "tunemap", version, about = "Weekly music chart dashboard")]
struct Cli {
    /// Config file (default: $TUNEMAP_CONFIG, then the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Chart CSV (week, country, rank, track_name, artist_genre, audio features)
    #[arg(long)]
    data: PathBuf,

    /// Country GeoJSON FeatureCollection
    #[arg(long)]
    geo: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every week in the dataset, oldest first
    Weeks {
        #[command(flatten)]
        data: DataArgs,
    },

    /// Replay gestures and print the views' final shapes
    Snapshot {
        #[command(flatten)]
        data: DataArgs,

        /// Move the timeline to this week
        #[arg(long)]
        week: Option<String>,

        /// Click a country on the map (repeatable, applied in order)
        #[arg(long = "select")]
        select: Vec<String>,

        /// Clear the default selection before clicking
        #[arg(long)]
        clear: bool,

        /// Hover a song label in the slope chart
        #[arg(long)]
        hover: Option<String>,

        /// Print every redraw as a JSON line instead of the final snapshot
        #[arg(long)]
        frames: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing before config so resolver warnings are shown
    let log_control = logging::init();
    info!("Starting tunemap v{}", env!("CARGO_PKG_VERSION"));

    let config = ConfigResolver::new(cli.config.clone())
        .load()
        .context("Failed to load configuration")?;
    log_control
        .apply_config_level(&config.logging.level)
        .context("Failed to apply configured log level")?;

    match cli.command {
        Command::Weeks { data } => {
            let store = load(&data, &config).await?;
            for week in store.all_weeks() {
                println!("{}", week);
            }
        }
        Command::Snapshot {
            data,
            week,
            select,
            clear,
            hover,
            frames,
        } => {
            let store = load(&data, &config).await?;

            let renderers = if frames {
                let out: SharedWriter = Rc::new(RefCell::new(std::io::stdout()));
                Renderers {
                    map: Box::new(JsonLinesRenderer::new("map", out.clone())),
                    line: Box::new(JsonLinesRenderer::new("line", out.clone())),
                    slope: Box::new(JsonLinesRenderer::new("slope", out.clone())),
                    radar: Box::new(JsonLinesRenderer::new("radar", out)),
                }
            } else {
                Renderers::default()
            };

            let mut dashboard = Dashboard::new(store, &config, renderers);
            if clear {
                dashboard.clear_selection();
            }
            if let Some(week) = &week {
                dashboard.move_timeline(week);
            }
            for country in &select {
                dashboard.click_region(country);
            }
            if let Some(track) = &hover {
                dashboard.hover_song(Some(track));
            }

            if !frames {
                let snapshot = dashboard.snapshot();
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
        }
    }

    Ok(())
}

async fn load(args: &DataArgs, config: &TomlConfig) -> Result<RecordStore> {
    load_dataset(&args.data, &args.geo, &config.data)
        .await
        .with_context(|| format!("Failed to load {:?} and {:?}", args.data, args.geo))
}
