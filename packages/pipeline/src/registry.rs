//! Compile-time registry of pipeline definitions.
//!
//! Each entry is a `(name, toml_content)` pair embedded via `include_str!`.
//! Adding a pipeline requires a TOML file in `pipelines/` and an entry
//! here.

use osm_sites_pipeline_models::PipelineDefinition;

/// Number of registered pipelines. Enforced by a test.
#[cfg(test)]
const EXPECTED_PIPELINE_COUNT: usize = 3;

/// Embedded TOML pipeline definitions.
const PIPELINE_TOMLS: &[(&str, &str)] = &[
    (
        "historic_conflict",
        include_str!("../pipelines/historic_conflict.toml"),
    ),
    (
        "places_of_worship",
        include_str!("../pipelines/places_of_worship.toml"),
    ),
    (
        "religious_historic",
        include_str!("../pipelines/religious_historic.toml"),
    ),
];

/// Returns all registered pipelines.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. These are
/// compile-time constants, so a parse failure is a development error
/// caught by the registry tests.
#[must_use]
pub fn all_pipelines() -> Vec<PipelineDefinition> {
    PIPELINE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse pipeline '{name}': {e}"))
        })
        .collect()
}

/// Looks up a registered pipeline by id.
#[must_use]
pub fn find(id: &str) -> Option<PipelineDefinition> {
    all_pipelines().into_iter().find(|p| p.id == id)
}
