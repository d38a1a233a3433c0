//! Bounded retry with jittered pauses.
//!
//! Used for idempotent single-shot remote calls whose failure should be
//! surfaced (the per-place geocoding lookup). Tile queries are never
//! retried; see [`crate::fetch_tile`].
//!
//! # Usage
//!
//! ```ignore
//! let area = retry::retry(&RetryPolicy::default(), || geocoder.geocode("Austria")).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use rand::Rng as _;

/// How many times to try and how long to pause between attempts.
///
/// Each pause is drawn uniformly from `min_pause..=max_pause` so that
/// retries from concurrent callers do not line up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Treated as at least 1.
    pub max_tries: u32,
    pub min_pause: Duration,
    pub max_pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_tries: 3,
            min_pause: Duration::from_millis(300),
            max_pause: Duration::from_millis(800),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn with_max_tries(max_tries: u32) -> Self {
        Self {
            max_tries,
            ..Self::default()
        }
    }

    fn pause(&self) -> Duration {
        let min = self.min_pause.min(self.max_pause);
        let max = self.max_pause.max(self.min_pause);
        rand::thread_rng().gen_range(min..=max)
    }
}

/// Runs `op` until it succeeds or `policy.max_tries` attempts have failed.
///
/// # Errors
///
/// Returns the error from the last attempt if every attempt fails.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_tries = policy.max_tries.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_tries => {
                let delay = policy.pause();
                log::debug!("  attempt {attempt}/{max_tries} failed ({e}), retrying in {delay:?}");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
