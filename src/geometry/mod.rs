//! Pure geometry helpers: search-radius circles and route label placement.

pub mod circle;
pub mod route;

use crate::core::geo::GeoPoint;
use crate::data::geojson::{FeatureCollection, GeoJsonFeature, GeoJsonGeometry};
use geo::Area;

/// Closed, consistently wound ring of vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    points: Vec<GeoPoint>,
}

impl Ring {
    /// Wraps already closed vertices
    pub(crate) fn from_closed(points: Vec<GeoPoint>) -> Self {
        debug_assert!(points.first() == points.last());
        Self { points }
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        !self.points.is_empty() && self.points.first() == self.points.last()
    }

    /// Signed area in squared degrees; positive for counter-clockwise rings
    pub fn signed_area(&self) -> f64 {
        self.to_polygon().signed_area()
    }

    pub fn to_polygon(&self) -> geo_types::Polygon<f64> {
        let exterior: geo_types::LineString<f64> = self
            .points
            .iter()
            .map(|p| geo_types::Coord::from(*p))
            .collect();
        geo_types::Polygon::new(exterior, Vec::new())
    }

    /// The ring as a single-polygon overlay source
    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection::single(GeoJsonFeature::new(GeoJsonGeometry::polygon(&self.points)))
    }
}
