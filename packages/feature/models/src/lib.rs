#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Raw `OpenStreetMap` feature types.
//!
//! A [`RawFeature`] is what the feature-query service hands back for a
//! single tile: a geometry plus a sparse tag mapping. Tag values are
//! normalized to ordered value lists at ingestion so that downstream
//! classification never has to deal with scalar-vs-list ambiguity.

pub mod filter;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use filter::{FilterError, TagFilter, TagMatch};

/// Separator OSM uses for multi-valued tags (e.g. `religion=christian;muslim`).
pub const MULTI_VALUE_SEPARATOR: char = ';';

/// The three `OpenStreetMap` element types.
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ElementKind {
    /// A single point.
    Node,
    /// An ordered list of nodes (open line or closed ring).
    Way,
    /// A group of members (multipolygons, routes, ...).
    Relation,
}

/// Stable source identifier of an OSM element.
///
/// Node, way and relation ids live in separate namespaces, so the element
/// kind is part of the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OsmId {
    /// Element type.
    pub kind: ElementKind,
    /// Numeric id within the element type's namespace.
    pub id: u64,
}

impl OsmId {
    #[must_use]
    pub const fn new(kind: ElementKind, id: u64) -> Self {
        Self { kind, id }
    }
}

impl std::fmt::Display for OsmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// An ordered, non-empty list of alternatives for a single tag key.
///
/// The source text is kept alongside the split alternatives so output
/// cells reproduce the value as it was tagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagValue {
    raw: String,
    values: Vec<String>,
}

impl TagValue {
    /// Parses a raw tag string, splitting multi-valued tags on `;`.
    ///
    /// Returns `None` when nothing but separators and whitespace remains.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let values = split_values(raw.split(MULTI_VALUE_SEPARATOR));
        if values.is_empty() {
            return None;
        }
        Some(Self {
            raw: raw.trim().to_string(),
            values,
        })
    }

    /// Builds a value list from already-separated alternatives, dropping
    /// blank entries. The source text is the alternatives joined by `;`.
    #[must_use]
    pub fn from_values<I, S>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let values = split_values(values);
        if values.is_empty() {
            return None;
        }
        Some(Self {
            raw: values.join(";"),
            values,
        })
    }

    /// The first (primary) alternative.
    #[must_use]
    pub fn first(&self) -> &str {
        &self.values[0]
    }

    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// The value as tagged, with only surrounding whitespace removed.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Joins all alternatives with `sep`.
    #[must_use]
    pub fn joined(&self, sep: &str) -> String {
        self.values.join(sep)
    }
}

fn split_values<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| v.as_ref().trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

impl std::fmt::Display for TagValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Sparse tag mapping of a single feature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(BTreeMap<String, TagValue>);

impl Tags {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a raw tag string. Blank values are ignored.
    pub fn insert_raw(&mut self, key: impl Into<String>, raw: &str) {
        if let Some(value) = TagValue::parse(raw) {
            self.0.insert(key.into(), value);
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.0.get(key)
    }

    /// Primary value of `key`, if present.
    #[must_use]
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(TagValue::first)
    }

    /// Primary value of `key` lowercased, or an empty string when absent.
    #[must_use]
    pub fn lower(&self, key: &str) -> String {
        self.first(key).map(str::to_lowercase).unwrap_or_default()
    }

    /// Source text of `key`, if present.
    #[must_use]
    pub fn display(&self, key: &str) -> Option<String> {
        self.0.get(key).map(|value| value.raw().to_string())
    }

    /// Returns the display value of the first key in `keys` that is present.
    #[must_use]
    pub fn first_present(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.display(key))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: AsRef<str>> FromIterator<(K, V)> for Tags {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut tags = Self::new();
        for (key, value) in iter {
            tags.insert_raw(key, value.as_ref());
        }
        tags
    }
}

/// A tagged geometry returned by the feature-query service.
///
/// Features straddling a tile boundary come back once per tile they
/// intersect, so the same [`OsmId`] may appear several times in a merged
/// set.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeature {
    /// Stable identifier, when the source provided one.
    pub osm_id: Option<OsmId>,
    /// WGS84 geometry (x = longitude, y = latitude).
    pub geometry: geo::Geometry<f64>,
    pub tags: Tags,
}
