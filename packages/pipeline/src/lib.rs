#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tiled OSM extraction pipelines.
//!
//! Ties the pieces together: the compile-time [`registry`] of pipeline
//! definitions, run configuration loading ([`config`]), the per-place
//! output [`sink`], and the [`run`] driver that takes each configured
//! place through geocode, tile, fetch, reduce, and write.

pub mod config;
pub mod registry;
pub mod run;
pub mod sink;

use std::path::PathBuf;

use osm_sites_pipeline_models::{PipelineDefinition, RunConfig};

pub use registry::{all_pipelines, find};
pub use run::{PlaceOutcome, Runner};
pub use sink::{CsvSink, TableSink};

/// The directory a pipeline writes to: the run configuration's override,
/// else the pipeline's default.
#[must_use]
pub fn output_dir(pipeline: &PipelineDefinition, config: &RunConfig) -> PathBuf {
    config
        .output_dir
        .clone()
        .unwrap_or_else(|| pipeline.output_dir.clone())
}

/// Parses a comma-separated list, trimming entries and dropping blanks.
#[must_use]
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
