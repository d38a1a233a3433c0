#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Splits an area-of-interest polygon into bounded query tiles.
//!
//! The feature-query service rejects or times out on large areas, so a
//! country boundary is cut into a grid of cells no larger than
//! `edge_size` degrees on a side. Each cell that touches the boundary is
//! replaced by its intersection with it, so no query ever reaches outside
//! the area of interest.

use geo::{Area, BooleanOps, BoundingRect, Intersects, MultiPolygon, Rect, coord};

/// Cut coordinates closer than this to the upper bound are merged into it,
/// so float accumulation never produces a sliver tile.
const CUT_TOLERANCE_DEG: f64 = 1e-9;

/// Splits `area` into tiles of at most `edge_size` × `edge_size` degrees,
/// each clipped to `area`.
///
/// Cells are produced column by column (west to east, then south to
/// north within a column). The easternmost column and northernmost row
/// may be narrower than `edge_size`. Cells whose intersection with
/// `area` is empty or has no area are dropped.
///
/// Returns an empty vector if `area` is degenerate (no extent on either
/// axis) or if `edge_size` is not a positive finite number.
#[must_use]
pub fn make_tiles(area: &MultiPolygon<f64>, edge_size: f64) -> Vec<MultiPolygon<f64>> {
    if !edge_size.is_finite() || edge_size <= 0.0 {
        log::warn!("Refusing to tile with edge size {edge_size}");
        return Vec::new();
    }

    let Some(bounds) = area.bounding_rect() else {
        return Vec::new();
    };

    let xs = cut_points(bounds.min().x, bounds.max().x, edge_size);
    let ys = cut_points(bounds.min().y, bounds.max().y, edge_size);

    let mut tiles = Vec::new();

    for x in xs.windows(2) {
        for y in ys.windows(2) {
            let cell = Rect::new(coord! { x: x[0], y: y[0] }, coord! { x: x[1], y: y[1] })
                .to_polygon();

            if !cell.intersects(area) {
                continue;
            }

            let clipped = cell.intersection(area);
            if clipped.0.is_empty() || clipped.unsigned_area() <= 0.0 {
                continue;
            }

            tiles.push(clipped);
        }
    }

    log::debug!(
        "Tiled area into {} tiles ({} x {} grid, edge {edge_size} deg)",
        tiles.len(),
        xs.len().saturating_sub(1),
        ys.len().saturating_sub(1),
    );

    tiles
}

/// Strictly increasing cut coordinates from `min` stepping by `step`,
/// always ending with `max`.
///
/// Returns just `[max]` (no intervals) when the range is empty.
fn cut_points(min: f64, max: f64, step: f64) -> Vec<f64> {
    let mut cuts = Vec::new();

    for i in 0u32.. {
        let cut = f64::from(i).mul_add(step, min);
        if cut >= max - CUT_TOLERANCE_DEG {
            break;
        }
        cuts.push(cut);
    }

    cuts.push(max);
    cuts
}
