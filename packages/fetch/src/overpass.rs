//! Overpass API feature-query client.
//!
//! Builds an Overpass QL union query for a tile polygon and a
//! [`TagFilter`], posts it to an interpreter endpoint, and ingests the
//! `out geom` response into [`RawFeature`]s.
//!
//! See <https://wiki.openstreetmap.org/wiki/Overpass_API/Overpass_QL>

use std::collections::BTreeMap;
use std::fmt::Write as _;

use async_trait::async_trait;
use geo::{Coord, Intersects, LineString, MultiLineString, MultiPolygon, Point, Polygon};
use osm_sites_feature_models::{ElementKind, OsmId, RawFeature, TagFilter, TagMatch, Tags};
use serde::Deserialize;

use crate::{FeatureQuery, QueryError};

/// [`FeatureQuery`] backed by an Overpass API interpreter endpoint.
pub struct OverpassClient {
    client: reqwest::Client,
    url: String,
    /// Server-side `[timeout:N]`; should match the client's request timeout.
    timeout_secs: u64,
}

impl OverpassClient {
    #[must_use]
    pub fn new(client: reqwest::Client, url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client,
            url: url.into(),
            timeout_secs,
        }
    }
}

#[async_trait]
impl FeatureQuery for OverpassClient {
    async fn query(
        &self,
        area: &MultiPolygon<f64>,
        filter: &TagFilter,
    ) -> Result<Vec<RawFeature>, QueryError> {
        let ql = build_query(area, filter, self.timeout_secs);

        let resp = self
            .client
            .post(&self.url)
            .form(&[("data", ql.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let body = resp.text().await?;
        let features = parse_response(&body)?;

        // Relations and long ways reach past the tile; keep only what
        // actually touches it.
        let tile = geo::Geometry::MultiPolygon(area.clone());
        Ok(features
            .into_iter()
            .filter(|f| f.geometry.intersects(&tile))
            .collect())
    }
}

/// Builds an Overpass QL query selecting every node, way, and relation
/// inside `area` that matches any entry of `filter`.
///
/// Overpass `poly:` filters take a single ring, so each part of a
/// multi-part tile gets its own statements, bounded by its exterior ring.
#[must_use]
pub fn build_query(area: &MultiPolygon<f64>, filter: &TagFilter, timeout_secs: u64) -> String {
    let mut ql = format!("[out:json][timeout:{timeout_secs}];\n(\n");

    for polygon in &area.0 {
        let poly = poly_filter(polygon.exterior());
        if poly.is_empty() {
            continue;
        }
        for (key, matcher) in filter.iter() {
            let selector = tag_selector(key, matcher);
            let _ = writeln!(ql, "  nwr{selector}(poly:\"{poly}\");");
        }
    }

    ql.push_str(");\nout geom;\n");
    ql
}

fn tag_selector(key: &str, matcher: &TagMatch) -> String {
    let key = escape_ql(key);
    match matcher {
        TagMatch::Any => format!("[\"{key}\"]"),
        TagMatch::Values(values) if values.len() == 1 => {
            format!("[\"{key}\"=\"{}\"]", escape_ql(&values[0]))
        }
        TagMatch::Values(values) => {
            let alternatives = values
                .iter()
                .map(|v| escape_ql(&regex::escape(v)))
                .collect::<Vec<_>>()
                .join("|");
            format!("[\"{key}\"~\"^({alternatives})$\"]")
        }
    }
}

/// Escapes a value for use inside a double-quoted Overpass QL string.
fn escape_ql(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Renders a ring as `"lat lon lat lon ..."`, without the closing vertex.
fn poly_filter(ring: &LineString<f64>) -> String {
    let coords = &ring.0;
    let open = if coords.len() > 1 && coords.first() == coords.last() {
        &coords[..coords.len() - 1]
    } else {
        &coords[..]
    };

    open.iter()
        .map(|c| format!("{:.7} {:.7}", c.y, c.x))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<Element>,
    remark: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Element {
    Node {
        id: u64,
        lat: f64,
        lon: f64,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    Way {
        id: u64,
        #[serde(default)]
        geometry: Vec<Option<LatLon>>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    Relation {
        id: u64,
        #[serde(default)]
        members: Vec<Member>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct LatLon {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct Member {
    #[serde(default)]
    role: String,
    #[serde(default)]
    geometry: Vec<Option<LatLon>>,
}

/// Parses an Overpass JSON response body into raw features.
///
/// Untagged elements and elements without usable geometry are dropped.
///
/// # Errors
///
/// Returns [`QueryError::Json`] if the body is not a valid response, or
/// [`QueryError::Service`] if Overpass reported a runtime error (it does
/// so with HTTP 200 and a `remark`).
pub fn parse_response(body: &str) -> Result<Vec<RawFeature>, QueryError> {
    let response: OverpassResponse = serde_json::from_str(body)?;

    if let Some(remark) = &response.remark {
        if remark.contains("runtime error") {
            return Err(QueryError::Service {
                message: remark.clone(),
            });
        }
        log::debug!("Overpass remark: {remark}");
    }

    Ok(response
        .elements
        .into_iter()
        .filter_map(element_to_feature)
        .collect())
}

fn element_to_feature(element: Element) -> Option<RawFeature> {
    let (osm_id, geometry, raw_tags) = match element {
        Element::Node { id, lat, lon, tags } => (
            OsmId::new(ElementKind::Node, id),
            geo::Geometry::Point(Point::new(lon, lat)),
            tags,
        ),
        Element::Way { id, geometry, tags } => {
            (OsmId::new(ElementKind::Way, id), way_geometry(&geometry)?, tags)
        }
        Element::Relation { id, members, tags } => (
            OsmId::new(ElementKind::Relation, id),
            relation_geometry(&members)?,
            tags,
        ),
        Element::Other => return None,
    };

    let tags: Tags = raw_tags.into_iter().collect();
    if tags.is_empty() {
        return None;
    }

    Some(RawFeature {
        osm_id: Some(osm_id),
        geometry,
        tags,
    })
}

fn coords(points: &[Option<LatLon>]) -> Vec<Coord<f64>> {
    points
        .iter()
        .flatten()
        .map(|p| Coord { x: p.lon, y: p.lat })
        .collect()
}

fn is_closed_ring(coords: &[Coord<f64>]) -> bool {
    coords.len() >= 4 && coords.first() == coords.last()
}

/// Closed ways become polygons, open ways line strings.
fn way_geometry(points: &[Option<LatLon>]) -> Option<geo::Geometry<f64>> {
    let coords = coords(points);
    if is_closed_ring(&coords) {
        Some(geo::Geometry::Polygon(Polygon::new(
            LineString(coords),
            vec![],
        )))
    } else if coords.len() >= 2 {
        Some(geo::Geometry::LineString(LineString(coords)))
    } else {
        None
    }
}

/// Closed `outer` member rings become a multipolygon. Relations whose
/// outer boundary is split across several ways fall back to the lines of
/// all members, which still yields a usable centroid.
fn relation_geometry(members: &[Member]) -> Option<geo::Geometry<f64>> {
    let outers: Vec<Polygon<f64>> = members
        .iter()
        .filter(|m| m.role == "outer")
        .map(|m| coords(&m.geometry))
        .filter(|c| is_closed_ring(c))
        .map(|c| Polygon::new(LineString(c), vec![]))
        .collect();

    if !outers.is_empty() {
        return Some(geo::Geometry::MultiPolygon(MultiPolygon(outers)));
    }

    let lines: Vec<LineString<f64>> = members
        .iter()
        .map(|m| coords(&m.geometry))
        .filter(|c| c.len() >= 2)
        .map(LineString)
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(geo::Geometry::MultiLineString(MultiLineString(lines)))
    }
}

#[cfg(test)]
mod tests {
    use geo::{Rect, coord};

    use super::*;

    fn unit_tile() -> MultiPolygon<f64> {
        MultiPolygon(vec![
            Rect::new(coord! { x: 10.0, y: 50.0 }, coord! { x: 11.0, y: 51.0 }).to_polygon(),
        ])
    }

    fn conflict_filter() -> TagFilter {
        TagFilter::new([
            (
                "historic",
                TagMatch::Values(vec!["battlefield".to_string(), "fort".to_string()]),
            ),
            ("landuse", TagMatch::Values(vec!["military".to_string()])),
            ("military", TagMatch::Any),
        ])
        .unwrap()
    }

    #[test]
    fn builds_union_query_per_filter_entry() {
        let ql = build_query(&unit_tile(), &conflict_filter(), 90);

        assert!(ql.starts_with("[out:json][timeout:90];"));
        assert!(ql.contains(r#"nwr["historic"~"^(battlefield|fort)$"](poly:"#));
        assert!(ql.contains(r#"nwr["landuse"="military"](poly:"#));
        assert!(ql.contains(r#"nwr["military"](poly:"#));
        assert!(ql.trim_end().ends_with("out geom;"));
        assert_eq!(ql.matches("nwr[").count(), 3);
    }

    #[test]
    fn poly_filter_is_lat_lon_without_closing_vertex() {
        let tile = unit_tile();
        let poly = poly_filter(tile.0[0].exterior());
        let numbers: Vec<&str> = poly.split(' ').collect();

        assert_eq!(numbers.len(), 8);
        assert!(poly.contains("50.0000000 10.0000000"));
        assert!(poly.contains("51.0000000 11.0000000"));
    }

    #[test]
    fn escapes_regex_and_quotes_in_values() {
        let selector = tag_selector(
            "name",
            &TagMatch::Values(vec!["a.b".to_string(), "say \"hi\"".to_string()]),
        );
        assert_eq!(selector, r#"["name"~"^(a\\.b|say \"hi\")$"]"#);
    }

    #[test]
    fn parses_nodes_ways_and_relations() {
        let body = serde_json::json!({
            "elements": [
                {
                    "type": "node", "id": 1, "lat": 50.5, "lon": 10.5,
                    "tags": { "historic": "battlefield", "name": "Battle of X" }
                },
                {
                    "type": "way", "id": 2,
                    "geometry": [
                        { "lat": 50.1, "lon": 10.1 }, { "lat": 50.1, "lon": 10.2 },
                        { "lat": 50.2, "lon": 10.2 }, { "lat": 50.1, "lon": 10.1 }
                    ],
                    "tags": { "historic": "fort" }
                },
                {
                    "type": "relation", "id": 3,
                    "members": [{
                        "type": "way", "ref": 9, "role": "outer",
                        "geometry": [
                            { "lat": 50.3, "lon": 10.3 }, { "lat": 50.3, "lon": 10.4 },
                            { "lat": 50.4, "lon": 10.4 }, { "lat": 50.3, "lon": 10.3 }
                        ]
                    }],
                    "tags": { "landuse": "military", "religion": "christian;muslim" }
                },
                { "type": "node", "id": 4, "lat": 50.0, "lon": 10.0 }
            ]
        })
        .to_string();

        let features = parse_response(&body).unwrap();
        assert_eq!(features.len(), 3);

        assert_eq!(features[0].osm_id, Some(OsmId::new(ElementKind::Node, 1)));
        assert!(matches!(features[0].geometry, geo::Geometry::Point(_)));
        assert_eq!(features[0].tags.first("name"), Some("Battle of X"));

        assert!(matches!(features[1].geometry, geo::Geometry::Polygon(_)));
        assert!(matches!(features[2].geometry, geo::Geometry::MultiPolygon(_)));
        assert_eq!(
            features[2].tags.get("religion").unwrap().values(),
            ["christian", "muslim"]
        );
    }

    #[test]
    fn open_way_becomes_line_and_split_relation_becomes_lines() {
        let body = serde_json::json!({
            "elements": [
                {
                    "type": "way", "id": 5,
                    "geometry": [{ "lat": 50.1, "lon": 10.1 }, { "lat": 50.2, "lon": 10.2 }],
                    "tags": { "historic": "trench" }
                },
                {
                    "type": "relation", "id": 6,
                    "members": [
                        { "type": "way", "role": "outer",
                          "geometry": [{ "lat": 50.1, "lon": 10.1 }, { "lat": 50.2, "lon": 10.2 }] },
                        { "type": "way", "role": "outer",
                          "geometry": [{ "lat": 50.2, "lon": 10.2 }, { "lat": 50.1, "lon": 10.1 }] }
                    ],
                    "tags": { "historic": "castle" }
                }
            ]
        })
        .to_string();

        let features = parse_response(&body).unwrap();
        assert_eq!(features.len(), 2);
        assert!(matches!(features[0].geometry, geo::Geometry::LineString(_)));
        assert!(matches!(
            features[1].geometry,
            geo::Geometry::MultiLineString(_)
        ));
    }

    #[test]
    fn runtime_error_remark_is_a_service_error() {
        let body = r#"{"elements": [], "remark": "runtime error: Query timed out in \"query\" at line 3 after 90 seconds."}"#;
        assert!(matches!(
            parse_response(body),
            Err(QueryError::Service { .. })
        ));
    }

    #[test]
    fn unknown_element_types_are_ignored() {
        let body = r#"{"elements": [{"type": "area", "id": 1}]}"#;
        assert!(parse_response(body).unwrap().is_empty());
    }

    #[test]
    fn malformed_body_is_a_json_error() {
        assert!(matches!(
            parse_response("<html>busy</html>"),
            Err(QueryError::Json(_))
        ));
    }
}
