//! Free-text normalization for pattern matching.

use osm_sites_feature_models::Tags;

/// Flattens the values of `keys` into a single lowercase string.
///
/// Keys are visited in order and absent keys are skipped. Multi-valued
/// tags are joined with a space before the parts themselves are joined,
/// so patterns always run against the whole text and never per element.
#[must_use]
pub fn normalize_text(tags: &Tags, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| tags.get(key))
        .map(|value| value.joined(" "))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
