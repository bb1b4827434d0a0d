use crate::core::geo::{GeoPoint, ViewportBounds};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};

/// The query rectangle sent to the backend, expressed as its top-left and
/// bottom-right corners.
///
/// Derived from the widget's [`ViewportBounds`] every time the viewport
/// settles; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub top_left_lat: f64,
    pub top_left_lon: f64,
    pub bottom_right_lat: f64,
    pub bottom_right_lon: f64,
}

impl BoundingBox {
    pub fn new(
        top_left_lat: f64,
        top_left_lon: f64,
        bottom_right_lat: f64,
        bottom_right_lon: f64,
    ) -> Self {
        Self {
            top_left_lat,
            top_left_lon,
            bottom_right_lat,
            bottom_right_lon,
        }
    }

    /// Derives the query box from the four viewport corners: north-west is
    /// the top-left corner and south-east the bottom-right one.
    pub fn from_viewport(bounds: &ViewportBounds) -> Result<Self> {
        let bbox = Self::new(
            bounds.north_east.lat,
            bounds.south_west.lon,
            bounds.south_west.lat,
            bounds.north_east.lon,
        );
        bbox.validate()?;
        Ok(bbox)
    }

    /// Rejects boxes with missing (non-finite) corners or out-of-range values
    pub fn validate(&self) -> Result<()> {
        let corners = [
            ("topLeftLat", self.top_left_lat),
            ("topLeftLon", self.top_left_lon),
            ("bottomRightLat", self.bottom_right_lat),
            ("bottomRightLon", self.bottom_right_lon),
        ];
        let missing: Vec<&str> = corners
            .iter()
            .filter(|(_, value)| !value.is_finite())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(MapError::MissingBounds(missing.join(", ")));
        }

        if !self.top_left().is_valid() || !self.bottom_right().is_valid() {
            return Err(MapError::InvalidCoordinates(format!(
                "bounding box {self:?} is outside the valid coordinate range"
            )));
        }
        if self.top_left_lat < self.bottom_right_lat {
            return Err(MapError::InvalidCoordinates(format!(
                "top edge {} lies below bottom edge {}",
                self.top_left_lat, self.bottom_right_lat
            )));
        }
        Ok(())
    }

    pub fn top_left(&self) -> GeoPoint {
        GeoPoint::new(self.top_left_lat, self.top_left_lon)
    }

    pub fn bottom_right(&self) -> GeoPoint {
        GeoPoint::new(self.bottom_right_lat, self.bottom_right_lon)
    }

    /// Checks if the box contains a point
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.lat <= self.top_left_lat
            && point.lat >= self.bottom_right_lat
            && point.lon >= self.top_left_lon
            && point.lon <= self.bottom_right_lon
    }

    /// Gets the center point of the box
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.top_left_lat + self.bottom_right_lat) / 2.0,
            (self.top_left_lon + self.bottom_right_lon) / 2.0,
        )
    }
}

impl From<BoundingBox> for ViewportBounds {
    fn from(bbox: BoundingBox) -> Self {
        ViewportBounds::from_coords(
            bbox.bottom_right_lat,
            bbox.top_left_lon,
            bbox.top_left_lat,
            bbox.bottom_right_lon,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_from_viewport_corners() {
        let viewport = ViewportBounds::from_coords(55.0, 60.0, 56.0, 61.0);
        let bbox = BoundingBox::from_viewport(&viewport).unwrap();

        assert_eq!(bbox, BoundingBox::new(56.0, 60.0, 55.0, 61.0));
        assert_eq!(ViewportBounds::from(bbox), viewport);
    }

    #[test]
    fn test_box_serializes_as_board() {
        let bbox = BoundingBox::new(56.0, 60.0, 55.0, 61.0);
        let json = serde_json::to_value(bbox).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "topLeftLat": 56.0,
                "topLeftLon": 60.0,
                "bottomRightLat": 55.0,
                "bottomRightLon": 61.0
            })
        );
    }

    #[test]
    fn test_missing_corner_is_rejected() {
        let viewport = ViewportBounds::from_coords(f64::NAN, 60.0, 56.0, 61.0);
        match BoundingBox::from_viewport(&viewport) {
            Err(MapError::MissingBounds(which)) => assert_eq!(which, "bottomRightLat"),
            other => panic!("expected MissingBounds, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_coordinates_are_not_missing() {
        let viewport = ViewportBounds::from_coords(-1.0, 0.0, 0.0, 1.0);
        assert!(BoundingBox::from_viewport(&viewport).is_ok());
    }

    #[test]
    fn test_flipped_box_is_rejected() {
        let bbox = BoundingBox::new(55.0, 60.0, 56.0, 61.0);
        assert!(matches!(
            bbox.validate(),
            Err(MapError::InvalidCoordinates(_))
        ));
    }

    #[test]
    fn test_box_contains() {
        let bbox = BoundingBox::new(56.0, 60.0, 55.0, 61.0);
        assert!(bbox.contains(&GeoPoint::new(55.5, 60.5)));
        assert!(!bbox.contains(&GeoPoint::new(55.5, 61.5)));
    }
}
