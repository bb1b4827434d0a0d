use crate::core::geo::GeoPoint;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// GeoJSON geometry types exchanged with the backend and handed to the map widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point {
        coordinates: [f64; 2],
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
}

impl GeoJsonGeometry {
    pub fn point(point: GeoPoint) -> Self {
        GeoJsonGeometry::Point {
            coordinates: point.to_lon_lat(),
        }
    }

    pub fn line_string(points: &[GeoPoint]) -> Self {
        GeoJsonGeometry::LineString {
            coordinates: points.iter().map(|p| p.to_lon_lat()).collect(),
        }
    }

    pub fn polygon(ring: &[GeoPoint]) -> Self {
        GeoJsonGeometry::Polygon {
            coordinates: vec![ring.iter().map(|p| p.to_lon_lat()).collect()],
        }
    }

    /// Line vertices as points; `None` for anything but a LineString
    pub fn line_points(&self) -> Option<Vec<GeoPoint>> {
        match self {
            GeoJsonGeometry::LineString { coordinates } => Some(
                coordinates
                    .iter()
                    .copied()
                    .map(GeoPoint::from_lon_lat)
                    .collect(),
            ),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeatureTag {
    #[default]
    Feature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollectionTag {
    #[default]
    FeatureCollection,
}

/// GeoJSON feature with geometry and properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonFeature {
    #[serde(rename = "type", default)]
    pub tag: FeatureTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl GeoJsonFeature {
    pub fn new(geometry: GeoJsonGeometry) -> Self {
        Self {
            tag: FeatureTag::Feature,
            id: None,
            geometry: Some(geometry),
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Root GeoJSON object used for every overlay source
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default)]
    pub tag: CollectionTag,
    #[serde(default)]
    pub features: Vec<GeoJsonFeature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<GeoJsonFeature>) -> Self {
        Self {
            tag: CollectionTag::FeatureCollection,
            features,
        }
    }

    pub fn single(feature: GeoJsonFeature) -> Self {
        Self::new(vec![feature])
    }

    pub fn first(&self) -> Option<&GeoJsonFeature> {
        self.features.first()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
