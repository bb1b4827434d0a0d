use crate::core::geo::GeoPoint;
use crate::data::geojson::{FeatureCollection, GeoJsonFeature, GeoJsonGeometry};
use crate::data::models::RouteResult;

/// Distance caption anchored on the route
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLabel {
    pub position: GeoPoint,
    pub text: String,
}

impl RouteLabel {
    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection::single(
            GeoJsonFeature::new(GeoJsonGeometry::point(self.position))
                .with_property("text", self.text.clone()),
        )
    }
}

/// Places the distance label on the vertex at `floor(len / 2)`.
///
/// Routes with fewer than two vertices or without a usable distance get no label.
pub fn route_label(route: &RouteResult) -> Option<RouteLabel> {
    if route.geometry.len() < 2 {
        return None;
    }
    let text = route.distance.as_ref()?.label_text()?;
    let position = route.geometry[route.geometry.len() / 2];
    Some(RouteLabel { position, text })
}
