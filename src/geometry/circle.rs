use super::Ring;
use crate::constants::{DEFAULT_CIRCLE_SEGMENTS, KM_PER_DEGREE_LAT, KM_PER_DEGREE_LON};
use crate::core::geo::GeoPoint;
use crate::{MapError, Result};
use std::f64::consts::PI;

/// Generates a circle of `radius_m` meters around `center` with the default
/// resolution of 64 segments.
pub fn generate_circle(center: GeoPoint, radius_m: f64) -> Result<Ring> {
    generate_circle_with_segments(center, radius_m, DEFAULT_CIRCLE_SEGMENTS)
}

/// Generates a closed polygon approximating a circle on the map surface.
///
/// Degree deltas come from a local flat-earth approximation
/// (`km / 110.574` for latitude, `km / (111.32 * cos(lat))` for longitude),
/// which holds for radii up to roughly 10 km at moderate latitudes. The ring
/// has `segments + 1` vertices, starts due east of the center and runs
/// counter-clockwise.
///
/// Centers at the poles are rejected with [`MapError::Geometry`]: there
/// `cos(lat)` reaches zero and the longitude delta has no finite value.
pub fn generate_circle_with_segments(
    center: GeoPoint,
    radius_m: f64,
    segments: usize,
) -> Result<Ring> {
    if segments < 3 {
        return Err(MapError::Geometry(format!(
            "a circle needs at least 3 segments, got {segments}"
        )));
    }
    if !radius_m.is_finite() || radius_m < 0.0 {
        return Err(MapError::Geometry(format!(
            "circle radius must be a non-negative number of meters, got {radius_m}"
        )));
    }
    if !center.is_valid() {
        return Err(MapError::InvalidCoordinates(format!(
            "circle center {center:?} is outside the valid range"
        )));
    }

    let lat_cos = (center.lat * PI / 180.0).cos();
    if lat_cos <= f64::EPSILON {
        return Err(MapError::Geometry(format!(
            "cannot approximate a circle at latitude {}",
            center.lat
        )));
    }

    let radius_km = radius_m / 1000.0;
    let delta_lat = radius_km / KM_PER_DEGREE_LAT;
    let delta_lon = radius_km / (KM_PER_DEGREE_LON * lat_cos);

    let mut points = Vec::with_capacity(segments + 1);
    for i in 0..segments {
        let theta = 2.0 * PI * i as f64 / segments as f64;
        points.push(GeoPoint::new(
            center.lat + delta_lat * theta.sin(),
            center.lon + delta_lon * theta.cos(),
        ));
    }
    points.push(points[0]);

    Ok(Ring::from_closed(points))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTER: GeoPoint = GeoPoint {
        lat: 61.258726,
        lon: 73.423043,
    };

    #[test]
    fn test_ring_is_closed_with_extra_vertex() {
        for radius in [0.0, 1.0, 1000.0, 3000.0, 9999.5, 10_000.0] {
            for segments in [3, 16, 64, 100] {
                let ring = generate_circle_with_segments(CENTER, radius, segments).unwrap();
                assert_eq!(ring.len(), segments + 1);
                assert!(ring.is_closed());
                assert_eq!(ring.points().first(), ring.points().last());
            }
        }
    }

    #[test]
    fn test_default_resolution() {
        let ring = generate_circle(CENTER, 3000.0).unwrap();
        assert_eq!(ring.len(), 65);
    }

    #[test]
    fn test_first_vertex_is_due_east() {
        let ring = generate_circle(CENTER, 5000.0).unwrap();
        let first = ring.points()[0];
        let expected_dlon = 5.0 / (111.32 * (CENTER.lat * PI / 180.0).cos());

        assert!((first.lat - CENTER.lat).abs() < 1e-12);
        assert!((first.lon - (CENTER.lon + expected_dlon)).abs() < 1e-12);
    }

    #[test]
    fn test_quarter_turn_reaches_north_edge() {
        let ring = generate_circle_with_segments(CENTER, 5000.0, 4).unwrap();
        let north = ring.points()[1];

        assert!((north.lat - (CENTER.lat + 5.0 / 110.574)).abs() < 1e-12);
        assert!((north.lon - CENTER.lon).abs() < 1e-9);
    }

    #[test]
    fn test_winding_is_counter_clockwise() {
        for radius in [1000.0, 4500.0, 10_000.0] {
            let ring = generate_circle(CENTER, radius).unwrap();
            assert!(ring.signed_area() > 0.0);
        }
    }

    #[test]
    fn test_vertices_are_roughly_radius_away() {
        let ring = generate_circle(GeoPoint::new(45.0, 10.0), 2000.0).unwrap();
        for vertex in ring.points() {
            let distance = GeoPoint::new(45.0, 10.0).distance_to(vertex);
            assert!((distance - 2000.0).abs() < 25.0, "distance {distance}");
        }
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(
            generate_circle(CENTER, 3000.0).unwrap(),
            generate_circle(CENTER, 3000.0).unwrap()
        );
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(generate_circle_with_segments(CENTER, 1000.0, 2).is_err());
        assert!(generate_circle(CENTER, -1.0).is_err());
        assert!(generate_circle(CENTER, f64::NAN).is_err());
        assert!(generate_circle(GeoPoint::new(90.0, 0.0), 1000.0).is_err());
        assert!(generate_circle(GeoPoint::new(95.0, 0.0), 1000.0).is_err());
    }

    #[test]
    fn test_poles_are_rejected_as_geometry_errors() {
        for lat in [90.0, -90.0] {
            assert!(matches!(
                generate_circle(GeoPoint::new(lat, 0.0), 1000.0),
                Err(MapError::Geometry(_))
            ));
        }
        assert!(generate_circle(GeoPoint::new(89.0, 0.0), 1000.0).is_ok());
    }
}
