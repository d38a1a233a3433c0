//! The run driver.
//!
//! Places are processed one at a time: geocode (with retry), tile, fetch
//! and merge, reduce, write. Any stage can end a place early, but nothing
//! a place does can stop the places after it.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use osm_sites_classify::reduce;
use osm_sites_fetch::progress::ProgressCallback;
use osm_sites_fetch::retry::{RetryPolicy, retry};
use osm_sites_fetch::{FeatureQuery, fetch_all};
use osm_sites_geocoder::Geocoder;
use osm_sites_pipeline_models::{PipelineDefinition, RunConfig};
use osm_sites_tiling::make_tiles;

use crate::sink::TableSink;

/// How a single place ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceOutcome {
    /// The table was written.
    Written {
        path: PathBuf,
        rows: usize,
    },
    /// Every geocoding attempt failed.
    GeocodeFailed,
    /// The boundary produced no tiles.
    NoTiles,
    /// Every tile was empty or failed.
    NoFeatures,
    /// The sink rejected the table.
    WriteFailed {
        message: String,
    },
}

impl PlaceOutcome {
    #[must_use]
    pub const fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

impl fmt::Display for PlaceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Written { path, rows } => write!(f, "wrote {rows} rows to {}", path.display()),
            Self::GeocodeFailed => f.write_str("skipped (geocoding failed)"),
            Self::NoTiles => f.write_str("skipped (no tiles)"),
            Self::NoFeatures => f.write_str("skipped (no features)"),
            Self::WriteFailed { message } => write!(f, "skipped (write failed: {message})"),
        }
    }
}

/// Drives one pipeline over the configured places.
pub struct Runner<'a> {
    pipeline: &'a PipelineDefinition,
    config: &'a RunConfig,
    geocoder: &'a dyn Geocoder,
    query: &'a dyn FeatureQuery,
    sink: &'a dyn TableSink,
    retry_policy: RetryPolicy,
}

impl<'a> Runner<'a> {
    #[must_use]
    pub fn new(
        pipeline: &'a PipelineDefinition,
        config: &'a RunConfig,
        geocoder: &'a dyn Geocoder,
        query: &'a dyn FeatureQuery,
        sink: &'a dyn TableSink,
    ) -> Self {
        Self {
            pipeline,
            config,
            geocoder,
            query,
            sink,
            retry_policy: RetryPolicy::with_max_tries(config.geocode_max_tries),
        }
    }

    /// Overrides the geocoding retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Runs a single place end to end.
    pub async fn run_place(
        &self,
        place: &str,
        tiles_progress: Option<&Arc<dyn ProgressCallback>>,
    ) -> PlaceOutcome {
        let query = self.config.geocode_query(place);

        let area = match retry(&self.retry_policy, || self.geocoder.geocode(query)).await {
            Ok(area) => area,
            Err(e) => {
                log::debug!("Geocoding '{query}' failed: {e}");
                return PlaceOutcome::GeocodeFailed;
            }
        };
        log::debug!("Resolved '{place}' to '{}'", area.name);

        let tiles = make_tiles(&area.boundary, self.config.tile_size_deg);
        if tiles.is_empty() {
            log::info!("{place}: no tiles, skipping");
            return PlaceOutcome::NoTiles;
        }

        if let Some(p) = tiles_progress {
            p.set_message(format!("{place} tiles"));
        }

        let features = fetch_all(
            self.query,
            &tiles,
            &self.pipeline.filter,
            self.config.max_workers,
            tiles_progress,
        )
        .await;

        if features.is_empty() {
            log::info!("{place}: no features in {} tiles, skipping", tiles.len());
            return PlaceOutcome::NoFeatures;
        }

        let table = reduce(self.pipeline.kind, features);

        match self.sink.write(place, &table) {
            Ok(path) => PlaceOutcome::Written {
                path,
                rows: table.len(),
            },
            Err(e) => {
                log::info!("{place}: failed to write output: {e}");
                PlaceOutcome::WriteFailed {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Runs every configured place in order.
    pub async fn run_all(
        &self,
        places_progress: Option<&Arc<dyn ProgressCallback>>,
        tiles_progress: Option<&Arc<dyn ProgressCallback>>,
    ) -> Vec<(String, PlaceOutcome)> {
        let places = &self.config.places;
        log::info!(
            "Running '{}' over {} places",
            self.pipeline.id,
            places.len()
        );

        if let Some(p) = places_progress {
            p.set_total(places.len() as u64);
        }

        let mut outcomes = Vec::with_capacity(places.len());

        for place in places {
            if let Some(p) = places_progress {
                p.set_message(place.clone());
            }

            let outcome = self.run_place(place, tiles_progress).await;
            log::info!("{place}: {outcome}");
            outcomes.push((place.clone(), outcome));

            if let Some(p) = places_progress {
                p.inc(1);
            }
        }

        let written = outcomes.iter().filter(|(_, o)| o.is_written()).count();
        log::info!(
            "'{}' finished: {written}/{} places written",
            self.pipeline.id,
            places.len()
        );

        outcomes
    }
}
