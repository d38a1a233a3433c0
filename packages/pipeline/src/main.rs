#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the tiled OSM site extractor.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use osm_sites_cli_utils::IndicatifProgress;
use osm_sites_fetch::http_client;
use osm_sites_fetch::overpass::OverpassClient;
use osm_sites_fetch::progress::ProgressCallback as _;
use osm_sites_geocoder::nominatim::NominatimGeocoder;
use osm_sites_pipeline::{CsvSink, Runner, all_pipelines, config, find, output_dir, parse_list};

#[derive(Parser)]
#[command(name = "osm_sites", about = "Tiled OpenStreetMap site extraction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline over the configured places
    Run {
        /// Pipeline identifier (e.g., "`historic_conflict`")
        pipeline: String,
        /// TOML run configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Comma-separated list of places (overrides the config file)
        #[arg(long)]
        places: Option<String>,
        /// Output directory (overrides the config file and pipeline default)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Tile edge length in degrees
        #[arg(long)]
        tile_size: Option<f64>,
        /// Maximum concurrent tile queries
        #[arg(long)]
        workers: Option<usize>,
    },
    /// List all registered pipelines
    Pipelines,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = osm_sites_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Pipelines => {
            let pipelines = all_pipelines();
            println!("{:<22} {:<20} NAME", "ID", "KIND");
            println!("{}", "-".repeat(70));
            for pipeline in &pipelines {
                println!("{:<22} {:<20} {}", pipeline.id, pipeline.kind, pipeline.name);
            }
        }
        Commands::Run {
            pipeline,
            config: config_path,
            places,
            output_dir: dir_override,
            tile_size,
            workers,
        } => {
            let Some(pipeline) = find(&pipeline) else {
                return Err(format!(
                    "Unknown pipeline '{pipeline}'. Run `osm_sites pipelines` to list them."
                )
                .into());
            };

            let mut run_config = config::load(config_path.as_deref())?;
            if let Some(places) = places {
                run_config.places = parse_list(&places);
            }
            if let Some(dir) = dir_override {
                run_config.output_dir = Some(dir);
            }
            if let Some(tile_size) = tile_size {
                run_config.tile_size_deg = tile_size;
            }
            if let Some(workers) = workers {
                run_config.max_workers = workers;
            }
            config::validate(&run_config)?;

            let client = http_client(
                Duration::from_secs(run_config.timeout_secs),
                &run_config.user_agent,
            )?;
            let geocoder = NominatimGeocoder::new(client.clone(), &run_config.nominatim_url);
            let query = OverpassClient::new(
                client,
                &run_config.overpass_url,
                run_config.timeout_secs,
            );
            let sink = CsvSink::new(output_dir(&pipeline, &run_config), &pipeline.file_suffix);

            log::info!(
                "Running '{}' into {}",
                pipeline.name,
                sink.dir().display()
            );

            let places_bar = IndicatifProgress::steps_bar(
                &multi,
                "Places",
                run_config.places.len() as u64,
            );
            let tiles_bar = IndicatifProgress::batch_bar(&multi, "Tiles");

            let start = Instant::now();
            let runner = Runner::new(&pipeline, &run_config, &geocoder, &query, &sink);
            let outcomes = runner.run_all(Some(&places_bar), Some(&tiles_bar)).await;

            tiles_bar.finish_and_clear();
            places_bar.finish(format!("{} places done", outcomes.len()));

            let written = outcomes.iter().filter(|(_, o)| o.is_written()).count();
            let elapsed = start.elapsed();
            log::info!(
                "Done: {written}/{} places written in {:.1}s",
                outcomes.len(),
                elapsed.as_secs_f64()
            );
        }
    }

    Ok(())
}
