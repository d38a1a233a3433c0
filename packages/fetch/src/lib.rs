#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tiled feature fetching.
//!
//! The remote feature-query service sits behind the [`FeatureQuery`]
//! trait. [`fetch_tile`] wraps a single query with the
//! partial-failure-as-empty policy: a failing tile logs a warning and
//! contributes nothing, so one bad tile never aborts a country-level run.
//! [`fetch_all`] fans tile queries out with bounded concurrency and merges
//! whatever comes back, in completion order.

pub mod overpass;
pub mod progress;
pub mod retry;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use geo::MultiPolygon;
use osm_sites_feature_models::{RawFeature, TagFilter};

use crate::progress::ProgressCallback;

/// Errors from a single feature query.
///
/// None of these escape [`fetch_tile`]; they exist so adapters can report
/// what went wrong before the tile is written off.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// HTTP request failed, including timeouts and non-2xx statuses.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not valid JSON of the expected shape.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The service reported an error inside an otherwise valid response.
    #[error("Service error: {message}")]
    Service {
        /// Message reported by the service.
        message: String,
    },
}

/// The remote feature-query capability.
#[async_trait]
pub trait FeatureQuery: Send + Sync {
    /// Returns every feature inside `area` matching any entry of `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] on any network, service, or parse failure.
    async fn query(
        &self,
        area: &MultiPolygon<f64>,
        filter: &TagFilter,
    ) -> Result<Vec<RawFeature>, QueryError>;
}

/// Builds the shared HTTP client for all remote calls.
///
/// Exceeding `timeout` surfaces as an ordinary request error.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn http_client(timeout: Duration, user_agent: &str) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
}

/// Queries a single tile, returning an empty set on any failure.
///
/// Tile queries are never retried.
pub async fn fetch_tile(
    query: &dyn FeatureQuery,
    tile: &MultiPolygon<f64>,
    filter: &TagFilter,
) -> Vec<RawFeature> {
    match query.query(tile, filter).await {
        Ok(features) => features,
        Err(e) => {
            log::warn!("Tile query failed, treating as empty: {e}");
            Vec::new()
        }
    }
}

/// Fetches every tile with at most `max_workers` queries in flight and
/// merges the results.
///
/// Results are merged in completion order. Duplicates across tiles are
/// kept; the reducer deduplicates by identifier. An empty return means
/// every tile was empty or failed.
pub async fn fetch_all(
    query: &dyn FeatureQuery,
    tiles: &[MultiPolygon<f64>],
    filter: &TagFilter,
    max_workers: usize,
    progress: Option<&Arc<dyn ProgressCallback>>,
) -> Vec<RawFeature> {
    use futures::stream::{self, StreamExt as _};

    let total = tiles.len();
    let concurrency = max_workers.max(1);

    log::info!("Fetching {total} tiles (concurrency={concurrency})...");
    if let Some(p) = progress {
        p.set_total(total as u64);
    }

    let mut results = stream::iter(tiles.iter().enumerate().map(|(idx, tile)| async move {
        (idx, fetch_tile(query, tile, filter).await)
    }))
    .buffer_unordered(concurrency);

    let mut merged = Vec::new();
    let mut completed = 0usize;

    while let Some((idx, features)) = results.next().await {
        completed += 1;
        log::debug!(
            "Tile {}/{total} returned {} features ({completed} done)",
            idx + 1,
            features.len()
        );
        merged.extend(features);

        if let Some(p) = progress {
            p.inc(1);
        }
    }

    log::info!("Fetched {} raw features from {total} tiles", merged.len());
    merged
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use geo::{BoundingRect, Point, Rect, coord};
    use osm_sites_feature_models::{ElementKind, OsmId, TagMatch, Tags};

    use super::*;

    /// Returns one feature per tile, tagged with the tile's min x, and
    /// fails for tiles whose min x is negative.
    struct FakeQuery {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: Mutex<Vec<f64>>,
    }

    impl FakeQuery {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl FeatureQuery for FakeQuery {
        async fn query(
            &self,
            area: &MultiPolygon<f64>,
            _filter: &TagFilter,
        ) -> Result<Vec<RawFeature>, QueryError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let min_x = area.bounding_rect().unwrap().min().x;
            self.calls.lock().unwrap().push(min_x);

            if min_x < 0.0 {
                return Err(QueryError::Service {
                    message: "too busy".to_string(),
                });
            }

            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let id = min_x as u64;
            Ok(vec![RawFeature {
                osm_id: Some(OsmId::new(ElementKind::Node, id)),
                geometry: geo::Geometry::Point(Point::new(min_x, 0.5)),
                tags: [("historic", "fort")].into_iter().collect::<Tags>(),
            }])
        }
    }

    /// Records the total and the sum of increments.
    #[derive(Default)]
    struct CountingProgress {
        total: AtomicUsize,
        done: AtomicUsize,
    }

    impl ProgressCallback for CountingProgress {
        fn set_total(&self, total: u64) {
            self.total.store(usize::try_from(total).unwrap(), Ordering::SeqCst);
        }
        fn inc(&self, delta: u64) {
            self.done
                .fetch_add(usize::try_from(delta).unwrap(), Ordering::SeqCst);
        }
        fn set_message(&self, _msg: String) {}
        fn finish(&self, _msg: String) {}
        fn finish_and_clear(&self) {}
    }

    fn tile(min_x: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![
            Rect::new(coord! { x: min_x, y: 0.0 }, coord! { x: min_x + 1.0, y: 1.0 }).to_polygon(),
        ])
    }

    fn filter() -> TagFilter {
        TagFilter::new([("historic", TagMatch::Any)]).unwrap()
    }

    #[tokio::test]
    async fn failed_tile_is_empty_not_an_error() {
        let query = FakeQuery::new();
        let features = fetch_tile(&query, &tile(-5.0), &filter()).await;
        assert!(features.is_empty());
    }

    #[tokio::test]
    async fn merges_results_and_isolates_failures() {
        let query = FakeQuery::new();
        let tiles = vec![tile(0.0), tile(-1.0), tile(1.0), tile(-2.0), tile(2.0)];

        let counter = Arc::new(CountingProgress::default());
        let progress: Arc<dyn ProgressCallback> = counter.clone();

        let features = fetch_all(&query, &tiles, &filter(), 4, Some(&progress)).await;

        assert_eq!(counter.total.load(Ordering::SeqCst), 5);
        assert_eq!(counter.done.load(Ordering::SeqCst), 5);
        assert_eq!(features.len(), 3);
        let mut ids: Vec<u64> = features.iter().map(|f| f.osm_id.unwrap().id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(query.calls.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let query = FakeQuery::new();
        let tiles: Vec<_> = (0..12).map(|i| tile(f64::from(i))).collect();

        let features = fetch_all(&query, &tiles, &filter(), 3, None).await;

        assert_eq!(features.len(), 12);
        assert!(query.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn all_failures_merge_to_empty() {
        let query = FakeQuery::new();
        let tiles = vec![tile(-1.0), tile(-2.0)];

        let features = fetch_all(&query, &tiles, &filter(), 4, None).await;
        assert!(features.is_empty());
    }

    #[tokio::test]
    async fn no_tiles_means_no_queries() {
        let query = FakeQuery::new();
        let features = fetch_all(&query, &[], &filter(), 4, None).await;
        assert!(features.is_empty());
        assert!(query.calls.lock().unwrap().is_empty());
    }
}
