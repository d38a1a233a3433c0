#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Semantic classification and reduction of raw OSM features.
//!
//! Each [`PipelineKind`] has an ordered [`RuleSet`] that turns a feature's
//! tags into a category label (or rejects it). [`reduce`] applies that
//! rule set to a merged raw feature set and produces a deduplicated,
//! deterministically ordered [`Table`] with the pipeline's fixed schema.

pub mod conflict;
pub mod religious;
pub mod rules;
pub mod table;
pub mod text;
pub mod tidy;
pub mod worship;

use osm_sites_pipeline_models::PipelineKind;

pub use rules::{Decision, RuleSet};
pub use table::{CategoryFields, ClassifiedRecord, Table};
pub use tidy::reduce;

/// The rule set for a pipeline kind.
#[must_use]
pub fn rule_set(kind: PipelineKind) -> &'static RuleSet {
    match kind {
        PipelineKind::Conflict => conflict::rule_set(),
        PipelineKind::Worship => worship::rule_set(),
        PipelineKind::ReligiousHistoric => religious::rule_set(),
    }
}
