//! Nominatim / `OpenStreetMap` boundary lookup.
//!
//! Uses the free-form search endpoint with `polygon_geojson=1` so each
//! result carries its full boundary. The public instance allows at most
//! one request per second; a run issues one lookup per place, so no
//! client-side throttling is needed.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use async_trait::async_trait;
use geo::MultiPolygon;

use crate::{Area, GeocodeError, Geocoder};

/// Number of candidates requested; the first with a polygon wins.
const CANDIDATE_LIMIT: &str = "5";

/// [`Geocoder`] backed by a Nominatim search endpoint.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// The `client` should carry a `User-Agent` and a request timeout.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<Area, GeocodeError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("format", "jsonv2"),
                ("polygon_geojson", "1"),
                ("limit", CANDIDATE_LIMIT),
            ])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }
        let resp = resp.error_for_status()?;

        let body: serde_json::Value = resp.json().await?;
        parse_response(query, &body)
    }
}

/// Picks the first search result whose `geojson` is a (multi)polygon.
fn parse_response(query: &str, body: &serde_json::Value) -> Result<Area, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    for result in results {
        let Some(geometry) = result.get("geojson") else {
            continue;
        };
        let Some(boundary) = parse_geojson_to_multipolygon(geometry) else {
            log::debug!(
                "Skipping non-polygon Nominatim result for '{query}': {}",
                result["display_name"]
            );
            continue;
        };

        let name = result["display_name"]
            .as_str()
            .map_or_else(|| query.to_string(), String::from);

        return Ok(Area { name, boundary });
    }

    Err(GeocodeError::NotFound {
        query: query.to_string(),
    })
}

/// Converts a `GeoJSON` geometry value into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn parse_geojson_to_multipolygon(value: &serde_json::Value) -> Option<MultiPolygon<f64>> {
    let geom: geojson::Geometry = serde_json::from_value(value.clone()).ok()?;
    let geo_geom: geo::Geometry<f64> = geom.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use geo::Area as _;

    use super::*;

    #[test]
    fn parses_polygon_result() {
        let body = serde_json::json!([{
            "display_name": "Luxembourg",
            "geojson": {
                "type": "Polygon",
                "coordinates": [[[5.7, 49.4], [6.5, 49.4], [6.5, 50.2], [5.7, 50.2], [5.7, 49.4]]]
            }
        }]);

        let area = parse_response("Luxembourg", &body).unwrap();
        assert_eq!(area.name, "Luxembourg");
        assert_eq!(area.boundary.0.len(), 1);
        assert!((area.boundary.unsigned_area() - 0.64).abs() < 1e-9);
    }

    #[test]
    fn skips_point_results() {
        let body = serde_json::json!([
            {
                "display_name": "Denmark (node)",
                "geojson": { "type": "Point", "coordinates": [10.0, 56.0] }
            },
            {
                "display_name": "Denmark",
                "geojson": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[8.0, 54.5], [9.0, 54.5], [9.0, 55.5], [8.0, 54.5]]],
                        [[[11.0, 55.0], [12.0, 55.0], [12.0, 56.0], [11.0, 55.0]]]
                    ]
                }
            }
        ]);

        let area = parse_response("Denmark", &body).unwrap();
        assert_eq!(area.name, "Denmark");
        assert_eq!(area.boundary.0.len(), 2);
    }

    #[test]
    fn empty_results_are_not_found() {
        let body = serde_json::json!([]);
        assert!(matches!(
            parse_response("Atlantis", &body),
            Err(GeocodeError::NotFound { .. })
        ));
    }

    #[test]
    fn non_array_is_parse_error() {
        let body = serde_json::json!({ "error": "bad request" });
        assert!(matches!(
            parse_response("x", &body),
            Err(GeocodeError::Parse { .. })
        ));
    }
}
