#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pipeline definition and run configuration types.
//!
//! A pipeline is one semantic extract (historic conflict sites, places of
//! worship, religious-historic sites). Each is described by a TOML
//! [`PipelineDefinition`] that names its [`PipelineKind`] (which selects
//! the classification rule set and output schema) and the tag filter sent
//! to the feature-query service. A [`RunConfig`] holds everything that
//! varies per invocation.

use std::collections::BTreeMap;
use std::path::PathBuf;

use osm_sites_feature_models::TagFilter;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Which rule set and output schema a pipeline uses.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PipelineKind {
    /// Pre-modern battlefields, fortifications, and war memorials.
    Conflict,
    /// Every `amenity=place_of_worship`, with denomination and religion.
    Worship,
    /// Historic churches, shrines, monasteries, and similar.
    ReligiousHistoric,
}

impl PipelineKind {
    pub const ALL: &[Self] = &[Self::Conflict, Self::Worship, Self::ReligiousHistoric];

    /// The fixed output column schema, in order.
    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Conflict => &[
                "name",
                "conflict_type",
                "lat",
                "lon",
                "osm_id",
                "wikidata",
                "wikipedia",
            ],
            Self::Worship => &[
                "name",
                "denomination",
                "religion",
                "lat",
                "lon",
                "osm_id",
                "wikidata",
                "wikipedia",
            ],
            Self::ReligiousHistoric => &[
                "name",
                "site_type",
                "civilization",
                "lat",
                "lon",
                "osm_id",
                "wikidata",
                "wikipedia",
            ],
        }
    }
}

/// A pipeline, deserialized from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineDefinition {
    /// Unique pipeline identifier (e.g., `"historic_conflict"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    pub kind: PipelineKind,
    /// Default output directory when the run configuration has none.
    pub output_dir: PathBuf,
    /// Appended to the sanitized place name to form the output file stem.
    pub file_suffix: String,
    /// Tag filter sent with every tile query.
    pub filter: TagFilter,
}

/// Countries processed when the run configuration does not list any.
pub const DEFAULT_PLACES: &[&str] = &[
    "Austria",
    "Belgium",
    "Bulgaria",
    "Czechia",
    "Denmark",
    "Finland",
    "France",
    "Germany",
    "Greece",
    "Hungary",
    "Italy",
    "Luxembourg",
    "Netherlands",
    "Norway",
    "Poland",
    "Portugal",
    "Romania",
    "Slovakia",
    "Spain",
    "Sweden",
    "Switzerland",
    "United Kingdom",
];

/// Per-invocation settings, deserialized from an optional TOML file.
///
/// Every field has a default, so an empty file (or no file) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Place names to process, in order.
    pub places: Vec<String>,
    /// Maps a configured place name to the string sent to the geocoder.
    /// Output file names still use the configured name.
    pub aliases: BTreeMap<String, String>,
    /// Tile edge length in degrees.
    pub tile_size_deg: f64,
    /// Maximum concurrent tile queries.
    pub max_workers: usize,
    /// Per-request timeout for every remote call, in seconds.
    pub timeout_secs: u64,
    /// Attempts for the per-place geocoding lookup.
    pub geocode_max_tries: u32,
    /// Overrides the pipeline's default output directory.
    pub output_dir: Option<PathBuf>,
    /// Overpass API interpreter endpoint.
    pub overpass_url: String,
    /// Nominatim search endpoint.
    pub nominatim_url: String,
    /// Sent as `User-Agent` (Nominatim's usage policy requires one).
    pub user_agent: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            places: DEFAULT_PLACES.iter().map(ToString::to_string).collect(),
            aliases: BTreeMap::new(),
            tile_size_deg: 0.8,
            max_workers: 4,
            timeout_secs: 90,
            geocode_max_tries: 3,
            output_dir: None,
            overpass_url: "https://overpass-api.de/api/interpreter".to_string(),
            nominatim_url: "https://nominatim.openstreetmap.org/search".to_string(),
            user_agent: concat!("osm_sites/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl RunConfig {
    /// The string to geocode for `place`, honoring [`Self::aliases`].
    #[must_use]
    pub fn geocode_query<'a>(&'a self, place: &'a str) -> &'a str {
        self.aliases.get(place).map_or(place, String::as_str)
    }
}
