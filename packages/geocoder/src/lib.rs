#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Area-of-interest boundary lookup.
//!
//! Resolves a place name (usually a country) to its boundary polygon.
//! The pipeline treats this as an opaque collaborator behind the
//! [`Geocoder`] trait; [`nominatim::NominatimGeocoder`] is the production
//! implementation.

pub mod nominatim;

use async_trait::async_trait;
use geo::MultiPolygon;
use thiserror::Error;

/// A named boundary polygon, obtained once per place and read-only after.
#[derive(Debug, Clone, PartialEq)]
pub struct Area {
    /// Canonical name reported by the geocoder.
    pub name: String,
    /// WGS84 boundary (x = longitude, y = latitude).
    pub boundary: MultiPolygon<f64>,
}

/// Resolves place names to boundary polygons.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Looks up the boundary polygon for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the lookup fails or the name does not
    /// resolve to a polygon.
    async fn geocode(&self, query: &str) -> Result<Area, GeocodeError>;
}

/// Errors from boundary lookups.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// No result with a polygon boundary.
    #[error("No polygon boundary found for '{query}'")]
    NotFound {
        /// The query that failed to resolve.
        query: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,
}
