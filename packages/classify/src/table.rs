//! The classified record table.
//!
//! One row per accepted feature, with a column schema fixed per
//! [`PipelineKind`] and a deterministic row order.

use std::cmp::Ordering;

use osm_sites_pipeline_models::PipelineKind;

/// Pipeline-specific category columns.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryFields {
    Conflict {
        conflict_type: String,
    },
    Worship {
        denomination: Option<String>,
        religion: Option<String>,
    },
    ReligiousHistoric {
        site_type: String,
        civilization: Option<String>,
    },
}

/// One output row.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRecord {
    /// Resolved display name.
    pub name: Option<String>,
    pub category: CategoryFields,
    pub lat: f64,
    pub lon: f64,
    /// Source identifier (`node/123`), or the feature's position in the
    /// merged input when the source had none.
    pub osm_id: String,
    pub wikidata: Option<String>,
    pub wikipedia: Option<String>,
}

impl ClassifiedRecord {
    /// Whether the record has a non-empty name.
    #[must_use]
    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.is_empty())
    }

    /// Cell values in schema order; `None` for null.
    #[must_use]
    pub fn cells(&self) -> Vec<Option<String>> {
        let mut cells = vec![self.name.clone()];
        match &self.category {
            CategoryFields::Conflict { conflict_type } => {
                cells.push(Some(conflict_type.clone()));
            }
            CategoryFields::Worship {
                denomination,
                religion,
            } => {
                cells.push(denomination.clone());
                cells.push(religion.clone());
            }
            CategoryFields::ReligiousHistoric {
                site_type,
                civilization,
            } => {
                cells.push(Some(site_type.clone()));
                cells.push(civilization.clone());
            }
        }
        cells.push(Some(self.lat.to_string()));
        cells.push(Some(self.lon.to_string()));
        cells.push(Some(self.osm_id.clone()));
        cells.push(self.wikidata.clone());
        cells.push(self.wikipedia.clone());
        cells
    }
}

/// A sorted table of classified records for one pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    kind: PipelineKind,
    rows: Vec<ClassifiedRecord>,
}

impl Table {
    /// An empty table that still carries the pipeline's column schema.
    #[must_use]
    pub const fn empty(kind: PipelineKind) -> Self {
        Self {
            kind,
            rows: Vec::new(),
        }
    }

    /// Builds a table, sorting `rows` into the pipeline's canonical order.
    #[must_use]
    pub fn new(kind: PipelineKind, mut rows: Vec<ClassifiedRecord>) -> Self {
        rows.sort_by(|a, b| compare(kind, a, b));
        Self { kind, rows }
    }

    #[must_use]
    pub const fn kind(&self) -> PipelineKind {
        self.kind
    }

    #[must_use]
    pub const fn columns(&self) -> &'static [&'static str] {
        self.kind.columns()
    }

    #[must_use]
    pub fn rows(&self) -> &[ClassifiedRecord] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Canonical row order.
///
/// Conflict and religious-historic tables put named rows first, then
/// order by category and name. Worship tables order by religion and
/// denomination first and only then put named rows first. Nulls sort
/// after values in every column. Rows equal on every key are ordered by
/// `osm_id`, so the result does not depend on input order.
fn compare(kind: PipelineKind, a: &ClassifiedRecord, b: &ClassifiedRecord) -> Ordering {
    compare_keys(kind, a, b).then_with(|| a.osm_id.cmp(&b.osm_id))
}

fn compare_keys(kind: PipelineKind, a: &ClassifiedRecord, b: &ClassifiedRecord) -> Ordering {
    let named_first = b.has_name().cmp(&a.has_name());
    let by_name = nulls_last(a.name.as_deref(), b.name.as_deref());

    match (&a.category, &b.category) {
        (
            CategoryFields::Conflict { conflict_type: ca },
            CategoryFields::Conflict { conflict_type: cb },
        ) => named_first.then_with(|| ca.cmp(cb)).then(by_name),
        (
            CategoryFields::ReligiousHistoric { site_type: sa, .. },
            CategoryFields::ReligiousHistoric { site_type: sb, .. },
        ) => named_first.then_with(|| sa.cmp(sb)).then(by_name),
        (
            CategoryFields::Worship {
                denomination: da,
                religion: ra,
            },
            CategoryFields::Worship {
                denomination: db,
                religion: rb,
            },
        ) => nulls_last(ra.as_deref(), rb.as_deref())
            .then_with(|| nulls_last(da.as_deref(), db.as_deref()))
            .then(named_first)
            .then(by_name),
        _ => {
            log::warn!("Mixed category fields in a {kind} table");
            Ordering::Equal
        }
    }
}

fn nulls_last(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
