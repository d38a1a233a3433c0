//! Reduction of a merged raw feature set into a [`Table`].

use std::collections::BTreeSet;

use geo::{Centroid, Geometry, Point};
use osm_sites_feature_models::{OsmId, RawFeature, Tags};
use osm_sites_pipeline_models::PipelineKind;

use crate::religious::CIVILIZATION_KEYS;
use crate::rule_set;
use crate::table::{CategoryFields, ClassifiedRecord, Table};
use crate::worship::DENOMINATION_KEYS;

/// Name candidates, most specific first.
pub const NAME_KEYS: &[&str] = &[
    "name",
    "name:en",
    "alt_name",
    "old_name",
    "loc_name",
    "official_name",
];

/// Representative coordinate of a geometry: the point itself, or the
/// centroid of anything else. `None` when no finite point exists.
#[must_use]
pub fn representative_point(geometry: &Geometry<f64>) -> Option<Point<f64>> {
    let point = match geometry {
        Geometry::Point(point) => Some(*point),
        other => other.centroid(),
    }?;

    (point.x().is_finite() && point.y().is_finite()).then_some(point)
}

/// Resolves the display name from [`NAME_KEYS`].
#[must_use]
pub fn resolve_name(tags: &Tags) -> Option<String> {
    tags.first_present(NAME_KEYS)
}

fn category(kind: PipelineKind, label: String, tags: &Tags) -> CategoryFields {
    match kind {
        PipelineKind::Conflict => CategoryFields::Conflict {
            conflict_type: label,
        },
        PipelineKind::Worship => CategoryFields::Worship {
            denomination: tags.first_present(DENOMINATION_KEYS),
            religion: tags.display("religion"),
        },
        PipelineKind::ReligiousHistoric => CategoryFields::ReligiousHistoric {
            site_type: label,
            civilization: CIVILIZATION_KEYS
                .iter()
                .find_map(|key| tags.first(key))
                .map(ToString::to_string),
        },
    }
}

/// Classifies, deduplicates and orders `features` for `kind`.
///
/// Features whose geometry has no finite representative point or whose
/// classification is none are dropped. Of several features sharing an
/// [`OsmId`], the first accepted one is kept; features without an id are
/// identified by their position in `features`.
#[must_use]
pub fn reduce(kind: PipelineKind, features: Vec<RawFeature>) -> Table {
    if features.is_empty() {
        return Table::empty(kind);
    }

    let rules = rule_set(kind);
    let total = features.len();
    let mut seen: BTreeSet<OsmId> = BTreeSet::new();
    let mut rows = Vec::new();

    for (index, feature) in features.into_iter().enumerate() {
        let Some(point) = representative_point(&feature.geometry) else {
            log::debug!("Dropping feature {index} without a representable point");
            continue;
        };

        let Some(label) = rules.classify(&feature.tags) else {
            continue;
        };

        let osm_id = match feature.osm_id {
            Some(id) => {
                if !seen.insert(id) {
                    continue;
                }
                id.to_string()
            }
            None => index.to_string(),
        };

        let tags = &feature.tags;
        rows.push(ClassifiedRecord {
            name: resolve_name(tags),
            category: category(kind, label, tags),
            lat: point.y(),
            lon: point.x(),
            osm_id,
            wikidata: tags.display("wikidata"),
            wikipedia: tags.display("wikipedia"),
        });
    }

    log::debug!(
        "Reduced {total} raw features to {} {kind} records",
        rows.len()
    );

    Table::new(kind, rows)
}

#[cfg(test)]
mod tests {
    use geo::{LineString, Polygon, point};
    use osm_sites_feature_models::ElementKind;

    use super::*;

    fn feature(id: Option<u64>, x: f64, y: f64, pairs: &[(&str, &str)]) -> RawFeature {
        RawFeature {
            osm_id: id.map(|id| OsmId::new(ElementKind::Node, id)),
            geometry: Geometry::Point(point!(x: x, y: y)),
            tags: pairs.iter().copied().collect(),
        }
    }

    fn battlefield(id: Option<u64>, name: Option<&str>) -> RawFeature {
        let mut pairs = vec![("historic", "battle_site")];
        if let Some(name) = name {
            pairs.push(("name", name));
        }
        feature(id, 14.5, 50.1, &pairs)
    }

    #[test]
    fn empty_input_keeps_the_schema() {
        for kind in PipelineKind::ALL {
            let table = reduce(*kind, Vec::new());
            assert!(table.is_empty());
            assert_eq!(table.kind(), *kind);
            assert_eq!(table.columns(), kind.columns());
        }
    }

    #[test]
    fn duplicate_ids_reduce_to_one_row() {
        let features = vec![
            battlefield(Some(123), Some("Battle of Kulm (1813)")),
            battlefield(Some(123), Some("Battle of Kulm (1813)")),
        ];
        let table = reduce(PipelineKind::Conflict, features);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].osm_id, "node/123");
    }

    #[test]
    fn reducing_twice_is_idempotent() {
        let features = vec![
            battlefield(Some(1), Some("Battle of Leipzig (1813)")),
            battlefield(Some(2), None),
            battlefield(Some(1), Some("Battle of Leipzig (1813)")),
            feature(Some(3), 1.0, 1.0, &[("historic", "yes"), ("name", "Old mill")]),
        ];
        let once = reduce(PipelineKind::Conflict, features.clone());
        let twice = reduce(PipelineKind::Conflict, features);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn named_rows_sort_first() {
        let features = vec![
            battlefield(Some(1), None),
            battlefield(Some(2), Some("Battle of Aspern (1809)")),
        ];
        let table = reduce(PipelineKind::Conflict, features);
        let ids: Vec<_> = table.rows().iter().map(|r| r.osm_id.as_str()).collect();
        assert_eq!(ids, ["node/2", "node/1"]);
    }

    #[test]
    fn input_order_does_not_change_the_table() {
        let forward = reduce(
            PipelineKind::Conflict,
            vec![battlefield(Some(1), None), battlefield(Some(2), None)],
        );
        let reversed = reduce(
            PipelineKind::Conflict,
            vec![battlefield(Some(2), None), battlefield(Some(1), None)],
        );
        assert_eq!(forward, reversed);
        let ids: Vec<_> = forward.rows().iter().map(|r| r.osm_id.as_str()).collect();
        assert_eq!(ids, ["node/1", "node/2"]);
    }

    #[test]
    fn name_falls_back_through_candidates() {
        let features = vec![feature(
            Some(1),
            0.0,
            0.0,
            &[("historic", "battlefield"), ("old_name", "Old"), ("loc_name", "Local")],
        )];
        let table = reduce(PipelineKind::Conflict, features);
        assert_eq!(table.rows()[0].name.as_deref(), Some("Old"));
    }

    #[test]
    fn multi_valued_cells_keep_their_spacing() {
        let features = vec![feature(
            Some(1),
            0.0,
            0.0,
            &[
                ("amenity", "place_of_worship"),
                ("name", "St. Peter; Pfarrkirche"),
                ("wikipedia", "de:St. Peter; Wien"),
            ],
        )];
        let table = reduce(PipelineKind::Worship, features);
        let row = &table.rows()[0];
        assert_eq!(row.name.as_deref(), Some("St. Peter; Pfarrkirche"));
        assert_eq!(row.wikipedia.as_deref(), Some("de:St. Peter; Wien"));
    }

    #[test]
    fn worship_columns_come_from_tags() {
        let features = vec![
            feature(
                Some(1),
                0.0,
                0.0,
                &[
                    ("amenity", "place_of_worship"),
                    ("religion", "christian"),
                    ("religion:denomination", "lutheran"),
                    ("wikidata", "Q1"),
                ],
            ),
            feature(Some(2), 0.0, 0.0, &[("amenity", "place_of_worship")]),
            feature(Some(3), 0.0, 0.0, &[("amenity", "cafe")]),
        ];
        let table = reduce(PipelineKind::Worship, features);
        assert_eq!(table.len(), 2);

        let first = &table.rows()[0];
        assert_eq!(first.osm_id, "node/1");
        assert_eq!(
            first.category,
            CategoryFields::Worship {
                denomination: Some("lutheran".to_string()),
                religion: Some("christian".to_string()),
            }
        );
        assert_eq!(first.wikidata.as_deref(), Some("Q1"));
        assert_eq!(first.wikipedia, None);

        assert_eq!(
            table.rows()[1].category,
            CategoryFields::Worship {
                denomination: None,
                religion: None,
            }
        );
    }

    #[test]
    fn civilization_uses_first_value() {
        let features = vec![feature(
            Some(1),
            0.0,
            0.0,
            &[("historic", "temple"), ("civilization", "roman;greek")],
        )];
        let table = reduce(PipelineKind::ReligiousHistoric, features);
        assert_eq!(
            table.rows()[0].category,
            CategoryFields::ReligiousHistoric {
                site_type: "historic:temple".to_string(),
                civilization: Some("roman".to_string()),
            }
        );
    }

    #[test]
    fn missing_ids_fall_back_to_position() {
        let features = vec![
            feature(None, 0.0, 0.0, &[("amenity", "school")]),
            feature(None, 0.0, 0.0, &[("amenity", "place_of_worship")]),
            feature(None, 0.0, 0.0, &[("amenity", "place_of_worship")]),
        ];
        let table = reduce(PipelineKind::Worship, features);
        let ids: Vec<_> = table.rows().iter().map(|r| r.osm_id.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
    }

    #[test]
    fn polygons_reduce_to_their_centroid() {
        let square = Polygon::new(
            LineString::from(vec![(10.0, 40.0), (12.0, 40.0), (12.0, 42.0), (10.0, 42.0), (10.0, 40.0)]),
            vec![],
        );
        let features = vec![RawFeature {
            osm_id: Some(OsmId::new(ElementKind::Way, 7)),
            geometry: Geometry::Polygon(square),
            tags: [("historic", "church")].into_iter().collect(),
        }];
        let table = reduce(PipelineKind::ReligiousHistoric, features);
        let row = &table.rows()[0];
        assert!((row.lon - 11.0).abs() < 1e-9);
        assert!((row.lat - 41.0).abs() < 1e-9);
        assert_eq!(row.osm_id, "way/7");
    }

    #[test]
    fn non_finite_points_are_dropped() {
        let features = vec![feature(Some(1), f64::NAN, 0.0, &[("amenity", "place_of_worship")])];
        assert!(reduce(PipelineKind::Worship, features).is_empty());
    }
}
