use crate::{MapError, Result};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters, used for great-circle distances
const EARTH_RADIUS: f64 = 6_371_008.8;

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Creates a new GeoPoint without validation
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Creates a new GeoPoint, rejecting out-of-range or non-finite values
    pub fn try_new(lat: f64, lon: f64) -> Result<Self> {
        let point = Self::new(lat, lon);
        if point.is_valid() {
            Ok(point)
        } else {
            Err(MapError::InvalidCoordinates(format!(
                "lat {lat} / lon {lon} is outside [-90, 90] x [-180, 180]"
            )))
        }
    }

    /// Validates that the coordinates are within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Calculates the distance to another GeoPoint using the Haversine formula
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let lat1_rad = self.lat.to_radians();
        let lat2_rad = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS * c
    }

    /// GeoJSON position order (`[lon, lat]`)
    pub fn to_lon_lat(self) -> [f64; 2] {
        [self.lon, self.lat]
    }

    /// Builds a point from a GeoJSON position (`[lon, lat]`)
    pub fn from_lon_lat(position: [f64; 2]) -> Self {
        Self::new(position[1], position[0])
    }
}

impl Default for GeoPoint {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl From<GeoPoint> for geo_types::Coord<f64> {
    fn from(point: GeoPoint) -> Self {
        geo_types::Coord {
            x: point.lon,
            y: point.lat,
        }
    }
}

/// The visible map region as reported by the map widget
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportBounds {
    pub south_west: GeoPoint,
    pub north_east: GeoPoint,
}

impl ViewportBounds {
    pub fn new(south_west: GeoPoint, north_east: GeoPoint) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Creates bounds from individual coordinates
    pub fn from_coords(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self::new(GeoPoint::new(south, west), GeoPoint::new(north, east))
    }

    /// Checks if the bounds contain a point
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lon >= self.south_west.lon
            && point.lon <= self.north_east.lon
    }

    /// Gets the center point of the bounds
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lon + self.north_east.lon) / 2.0,
        )
    }

    /// Gets the span of the bounds
    pub fn span(&self) -> GeoPoint {
        GeoPoint::new(
            self.north_east.lat - self.south_west.lat,
            self.north_east.lon - self.south_west.lon,
        )
    }

    /// Bounds of the given size (in degrees) around a center point
    pub fn around(center: GeoPoint, lat_span: f64, lon_span: f64) -> Self {
        Self::from_coords(
            center.lat - lat_span / 2.0,
            center.lon - lon_span / 2.0,
            center.lat + lat_span / 2.0,
            center.lon + lon_span / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_point_creation() {
        let coord = GeoPoint::new(55.7558, 37.6173);
        assert_eq!(coord.lat, 55.7558);
        assert_eq!(coord.lon, 37.6173);
        assert!(coord.is_valid());
    }

    #[test]
    fn test_geo_point_rejects_out_of_range() {
        assert!(GeoPoint::try_new(91.0, 0.0).is_err());
        assert!(GeoPoint::try_new(0.0, -180.5).is_err());
        assert!(GeoPoint::try_new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::try_new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_geo_point_distance() {
        let moscow = GeoPoint::new(55.7558, 37.6173);
        let petersburg = GeoPoint::new(59.9343, 30.3351);
        let distance = moscow.distance_to(&petersburg);

        // Roughly 634 km
        assert!((distance - 634_000.0).abs() < 10_000.0);
    }

    #[test]
    fn test_lon_lat_order() {
        let point = GeoPoint::new(61.25, 73.42);
        assert_eq!(point.to_lon_lat(), [73.42, 61.25]);
        assert_eq!(GeoPoint::from_lon_lat([73.42, 61.25]), point);
    }

    #[test]
    fn test_bounds_contains() {
        let bounds = ViewportBounds::from_coords(55.0, 60.0, 56.0, 61.0);
        assert!(bounds.contains(&GeoPoint::new(55.5, 60.5)));
        assert!(!bounds.contains(&GeoPoint::new(57.0, 60.5)));
        assert_eq!(bounds.center(), GeoPoint::new(55.5, 60.5));
    }
}
