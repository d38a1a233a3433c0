//! Declarative tag filters for feature queries.
//!
//! A filter maps a tag key to either "any value" or a list of accepted
//! values. In TOML:
//!
//! ```toml
//! [filter]
//! historic = ["battlefield", "fort"]
//! military = true
//! landuse = "military"
//! ```
//!
//! A malformed filter is a run misconfiguration, so validation failures
//! are surfaced as [`FilterError`] instead of being absorbed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Which values of a tag key a filter accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagMatch {
    /// Any value, as long as the key is present.
    Any,
    /// Exactly one of the listed values.
    Values(Vec<String>),
}

/// A validated, non-empty tag filter.
///
/// Features matching *any* entry are returned by the query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, RawTagMatch>")]
pub struct TagFilter {
    entries: BTreeMap<String, TagMatch>,
}

impl TagFilter {
    /// Builds a filter from `(key, match)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError`] if the filter has no entries, a key is
    /// blank, or a value list is empty or contains a blank value.
    pub fn new<I, K>(entries: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = (K, TagMatch)>,
        K: Into<String>,
    {
        let entries: BTreeMap<String, TagMatch> =
            entries.into_iter().map(|(k, m)| (k.into(), m)).collect();

        if entries.is_empty() {
            return Err(FilterError::Empty);
        }

        for (key, matcher) in &entries {
            if key.trim().is_empty() {
                return Err(FilterError::BlankKey);
            }
            if let TagMatch::Values(values) = matcher {
                if values.is_empty() {
                    return Err(FilterError::NoValues { key: key.clone() });
                }
                if values.iter().any(|v| v.trim().is_empty()) {
                    return Err(FilterError::BlankValue { key: key.clone() });
                }
            }
        }

        Ok(Self { entries })
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagMatch)> {
        self.entries.iter().map(|(k, m)| (k.as_str(), m))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TagMatch> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Untyped filter entry as written in TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTagMatch {
    /// `key = true` means any value.
    Flag(bool),
    /// `key = "value"`.
    One(String),
    /// `key = ["a", "b"]`.
    Many(Vec<String>),
}

impl TryFrom<BTreeMap<String, RawTagMatch>> for TagFilter {
    type Error = FilterError;

    fn try_from(raw: BTreeMap<String, RawTagMatch>) -> Result<Self, Self::Error> {
        let mut entries = Vec::with_capacity(raw.len());
        for (key, value) in raw {
            let matcher = match value {
                RawTagMatch::Flag(true) => TagMatch::Any,
                RawTagMatch::Flag(false) => return Err(FilterError::DisabledKey { key }),
                RawTagMatch::One(v) => TagMatch::Values(vec![v]),
                RawTagMatch::Many(vs) => TagMatch::Values(vs),
            };
            entries.push((key, matcher));
        }
        Self::new(entries)
    }
}

/// Contract errors in a tag filter definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("tag filter has no entries")]
    Empty,

    #[error("tag filter contains a blank key")]
    BlankKey,

    #[error("tag filter key '{key}' has an empty value list")]
    NoValues {
        /// Offending key.
        key: String,
    },

    #[error("tag filter key '{key}' has a blank value")]
    BlankValue {
        /// Offending key.
        key: String,
    },

    #[error("tag filter key '{key}' is set to false; remove it instead")]
    DisabledKey {
        /// Offending key.
        key: String,
    },
}
