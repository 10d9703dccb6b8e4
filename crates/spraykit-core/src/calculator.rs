//! Planar polygon area and per-feature spray volume.
//!
//! Areas come from the shoelace formula in the geometry's native units. No
//! reprojection is done, so results are only meaningful in square metres
//! for projected coordinate systems.

use spraykit_shapefile::{Point, Shape};

use crate::features::FeatureCollection;

/// Acres in one square metre.
pub const ACRES_PER_SQUARE_METER: f64 = 0.000_247_105;

/// Decimal places used when reporting acres.
pub const ACRE_DECIMALS: u32 = 3;
/// Decimal places of a computed volume.
pub const VOLUME_DECIMALS: u32 = 2;

/// Area and volume of one feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeRow {
    pub area_m2: f64,
    /// Unrounded acreage.
    pub acres: f64,
    /// `acres * rate`, rounded to [`VOLUME_DECIMALS`].
    pub volume: f64,
}

impl VolumeRow {
    /// Acreage rounded for display.
    #[must_use]
    pub fn reported_acres(&self) -> f64 {
        round_to(self.acres, ACRE_DECIMALS)
    }
}

/// Twice the signed area of a ring. Rings with fewer than three points give 0.
///
/// Clockwise rings are negative.
#[must_use]
pub fn ring_double_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut prev = ring[ring.len() - 1];
    for &p in ring {
        sum += prev.x * p.y - p.x * prev.y;
        prev = p;
    }
    sum
}

/// Area enclosed by a set of rings. Holes wound opposite to their outer ring
/// subtract from it.
#[must_use]
pub fn polygon_area(rings: &[Vec<Point>]) -> f64 {
    let double_area: f64 = rings.iter().map(|ring| ring_double_area(ring)).sum();
    double_area.abs() / 2.0
}

/// Area of a shape. Anything other than a polygon has no area.
#[must_use]
pub fn shape_area(shape: &Shape) -> f64 {
    if shape.shape_type.is_polygon() {
        polygon_area(&shape.parts)
    } else {
        0.0
    }
}

#[must_use]
pub fn volume_row(shape: &Shape, rate_per_acre: f64) -> VolumeRow {
    let area_m2 = shape_area(shape);
    let acres = area_m2 * ACRES_PER_SQUARE_METER;
    VolumeRow {
        area_m2,
        acres,
        volume: round_to(acres * rate_per_acre, VOLUME_DECIMALS),
    }
}

/// One row per feature, in feature order.
#[must_use]
pub fn compute_volumes(collection: &FeatureCollection, rate_per_acre: f64) -> Vec<VolumeRow> {
    collection
        .features()
        .map(|feature| volume_row(feature.geometry, rate_per_acre))
        .collect()
}

/// Round half away from zero to `decimals` places.
#[must_use]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(i32::try_from(decimals).unwrap_or(i32::MAX));
    (value * scale).round() / scale
}
