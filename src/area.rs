// area.rs

use geo::orient::Direction;
use geo::{GeodesicArea, Orient};
use geojson::{Geometry, PolygonType, Position, Value};

/// Length of one degree of arc at the equator, in meters.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Minimum number of distinct vertices for a ring to enclose any area.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Computes the area of a geometry in square meters.
pub trait AreaStrategy {
    fn compute_area(&self, geometry: &Geometry) -> f64;
}

/// Shoelace formula in degrees², scaled by `111320²` and corrected by the
/// cosine of the first vertex's latitude.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarApproxStrategy;

/// Ellipsoidal area from the `geo` crate, rounded to the nearest m².
#[derive(Debug, Clone, Copy, Default)]
pub struct GeodesicStrategy;

impl AreaStrategy for PlanarApproxStrategy {
    fn compute_area(&self, geometry: &Geometry) -> f64 {
        // Only the outer ring of a Polygon is measured.
        let Value::Polygon(rings) = &geometry.value else {
            return 0.0;
        };
        let Some(ring) = rings.first().and_then(|r| ring_points(r)) else {
            return 0.0;
        };
        if distinct_points(&ring) < MIN_POLYGON_VERTICES {
            return 0.0;
        }

        let n = ring.len();
        let mut sum = 0.0;
        for i in 0..n {
            let (x1, y1) = ring[i];
            let (x2, y2) = ring[(i + 1) % n];
            sum += x1 * y2 - x2 * y1;
        }

        let reference_lat = ring[0].1.to_radians();
        let area = (sum / 2.0).abs() * METERS_PER_DEGREE * METERS_PER_DEGREE * reference_lat.cos();
        sanitize(area)
    }
}

impl AreaStrategy for GeodesicStrategy {
    fn compute_area(&self, geometry: &Geometry) -> f64 {
        let enough_vertices = outer_ring(geometry)
            .and_then(|r| ring_points(r))
            .is_some_and(|r| distinct_points(&r) >= MIN_POLYGON_VERTICES);
        if !enough_vertices {
            return 0.0;
        }

        let area = match to_geo(geometry) {
            // geodesic_area_unsigned measures the wrong side of a clockwise ring
            Some(geo::Geometry::Polygon(polygon)) => polygon
                .orient(Direction::Default)
                .geodesic_area_unsigned(),
            Some(geo::Geometry::MultiPolygon(polygons)) => polygons
                .orient(Direction::Default)
                .geodesic_area_unsigned(),
            _ => 0.0,
        };
        sanitize(area.round())
    }
}

/// Outer ring of a Polygon, or of the first polygon of a MultiPolygon.
pub fn outer_ring(geometry: &Geometry) -> Option<&Vec<Position>> {
    match &geometry.value {
        Value::Polygon(rings) => rings.first(),
        Value::MultiPolygon(polygons) => polygons.first().and_then(|rings| rings.first()),
        _ => None,
    }
}

/// Converts a Polygon or MultiPolygon to `geo` types. Positions with fewer
/// than two finite ordinates make the whole geometry unusable.
pub fn to_geo(geometry: &Geometry) -> Option<geo::Geometry<f64>> {
    if !positions_valid(&geometry.value) {
        return None;
    }
    match geo::Geometry::<f64>::try_from(geometry.value.clone()) {
        Ok(converted) => Some(converted),
        Err(e) => {
            log::debug!("Cannot convert geometry: {}", e);
            None
        }
    }
}

/// Number of distinct vertices of the outer ring, ignoring the closing repeat.
pub fn distinct_vertex_count(geometry: &Geometry) -> usize {
    outer_ring(geometry)
        .and_then(|r| ring_points(r))
        .map(|r| distinct_points(&r))
        .unwrap_or(0)
}

/// Square meters to hectares.
pub fn to_hectares(square_meters: f64) -> f64 {
    square_meters / 10_000.0
}

fn ring_points(ring: &[Position]) -> Option<Vec<(f64, f64)>> {
    ring.iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => Some((*x, *y)),
            _ => None,
        })
        .collect()
}

fn distinct_points(ring: &[(f64, f64)]) -> usize {
    let mut seen: Vec<(f64, f64)> = Vec::with_capacity(ring.len());
    for point in ring {
        if !seen.contains(point) {
            seen.push(*point);
        }
    }
    seen.len()
}

fn polygon_valid(rings: &PolygonType) -> bool {
    rings.iter().all(|r| ring_points(r).is_some())
}

fn positions_valid(value: &Value) -> bool {
    match value {
        Value::Polygon(rings) => polygon_valid(rings),
        Value::MultiPolygon(polygons) => polygons.iter().all(polygon_valid),
        _ => false,
    }
}

fn sanitize(area: f64) -> f64 {
    if area.is_finite() && area > 0.0 {
        area
    } else {
        0.0
    }
}
