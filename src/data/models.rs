//! Domain entities exchanged with the backend.

use crate::core::geo::GeoPoint;
use crate::data::geojson::{FeatureCollection, GeoJsonFeature, GeoJsonGeometry};
use crate::{MapError, Result};
use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Backend identifier; developments use numbers, OSM objects may use strings
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(id) => write!(f, "{id}"),
            EntityId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        EntityId::Number(id)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        EntityId::Text(id.to_string())
    }
}

/// A residential development returned by the viewport search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Development {
    #[serde(default)]
    pub id: Option<EntityId>,
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub coords: GeoPoint,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avito_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
}

impl Development {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>, coords: GeoPoint) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
            address: String::new(),
            coords,
            image_url: String::new(),
            description: String::new(),
            avito_url: None,
            is_favorite: None,
        }
    }
}

/// Amenity category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjType {
    Kindergarten,
    School,
    Hospital,
    Shops,
    Sport,
    BusStop,
    /// Categories this client does not know; never matched by a filter
    #[serde(other)]
    Unknown,
}

impl ObjType {
    /// The filterable categories, in display order
    pub const ALL: [ObjType; 6] = [
        ObjType::Kindergarten,
        ObjType::School,
        ObjType::Hospital,
        ObjType::Shops,
        ObjType::Sport,
        ObjType::BusStop,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ObjType::Kindergarten => "Детские сады",
            ObjType::School => "Учебные заведения",
            ObjType::Hospital => "Больницы",
            ObjType::Shops => "Магазины",
            ObjType::Sport => "Спорт",
            ObjType::BusStop => "Остановки",
            ObjType::Unknown => "Прочее",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ObjType::Kindergarten => "/img/kindergarten-button-active.svg",
            ObjType::School => "/img/school-button-active.svg",
            ObjType::Hospital => "/img/hospital-button-active.svg",
            ObjType::Shops => "/img/shop-button-active.svg",
            ObjType::Sport => "/img/sport-button-active.svg",
            ObjType::BusStop => "/img/bus-stop-button-active.svg",
            ObjType::Unknown => "/img/default-icon.svg",
        }
    }
}

impl fmt::Display for ObjType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjType::Kindergarten => "kindergarten",
            ObjType::School => "school",
            ObjType::Hospital => "hospital",
            ObjType::Shops => "shops",
            ObjType::Sport => "sport",
            ObjType::BusStop => "bus_stop",
            ObjType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// An amenity found around the selected development
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureItem {
    #[serde(default)]
    pub id: Option<EntityId>,
    pub obj_type: ObjType,
    #[serde(default)]
    pub name: String,
    pub coords: GeoPoint,
}

impl InfrastructureItem {
    pub fn new(
        id: impl Into<EntityId>,
        obj_type: ObjType,
        name: impl Into<String>,
        coords: GeoPoint,
    ) -> Self {
        Self {
            id: Some(id.into()),
            obj_type,
            name: name.into(),
            coords,
        }
    }
}

/// Route length as reported by the backend: either preformatted text or a number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteDistance {
    Meters(f64),
    Text(String),
}

impl RouteDistance {
    /// Text for the route label; `None` when the backend sent an empty value
    pub fn label_text(&self) -> Option<String> {
        match self {
            RouteDistance::Text(text) if !text.trim().is_empty() => Some(text.clone()),
            RouteDistance::Meters(meters) if meters.is_finite() && *meters != 0.0 => {
                Some(format!("{meters}"))
            }
            _ => None,
        }
    }
}

/// Path between a development and an amenity
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RouteResult {
    pub geometry: Vec<GeoPoint>,
    pub distance: Option<RouteDistance>,
    pub properties: Map<String, Value>,
}

impl RouteResult {
    /// Reads the first LineString feature of a route response
    pub fn from_feature_collection(collection: FeatureCollection) -> Result<Self> {
        let feature = collection
            .features
            .into_iter()
            .next()
            .ok_or_else(|| MapError::Geometry("route response has no features".into()))?;

        let geometry = feature
            .geometry
            .as_ref()
            .and_then(GeoJsonGeometry::line_points)
            .ok_or_else(|| MapError::Geometry("route feature is not a LineString".into()))?;

        let distance = match feature.properties.get("distance") {
            Some(Value::Null) | None => None,
            Some(value) => Some(serde_json::from_value(value.clone())?),
        };

        Ok(Self {
            geometry,
            distance,
            properties: feature.properties,
        })
    }

    /// The route line as an overlay source
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let mut feature = GeoJsonFeature::new(GeoJsonGeometry::line_string(&self.geometry));
        feature.properties = self.properties.clone();
        FeatureCollection::single(feature)
    }
}

/// One cell of the amenity density heatmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub geometry: GeoJsonGeometry,
    pub total_weight: f64,
}

impl HeatmapCell {
    /// Weight limited to `[0, 1]`; non-finite weights count as zero
    pub fn clamped_weight(&self) -> f64 {
        if self.total_weight.is_finite() {
            self.total_weight.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Active amenity categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSet {
    active: FxHashSet<ObjType>,
}

impl FilterSet {
    /// Every category active
    pub fn all() -> Self {
        Self {
            active: ObjType::ALL.into_iter().collect(),
        }
    }

    pub fn none() -> Self {
        Self {
            active: FxHashSet::default(),
        }
    }

    pub fn contains(&self, obj_type: ObjType) -> bool {
        self.active.contains(&obj_type)
    }

    /// Flips a category and returns whether it is now active
    pub fn toggle(&mut self, obj_type: ObjType) -> bool {
        if self.active.remove(&obj_type) {
            false
        } else {
            self.active.insert(obj_type);
            true
        }
    }

    pub fn matches(&self, item: &InfrastructureItem) -> bool {
        self.contains(item.obj_type)
    }

    /// Active categories in display order
    pub fn active(&self) -> Vec<ObjType> {
        ObjType::ALL
            .into_iter()
            .filter(|obj_type| self.contains(*obj_type))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

impl Default for FilterSet {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<ObjType> for FilterSet {
    fn from_iter<I: IntoIterator<Item = ObjType>>(iter: I) -> Self {
        Self {
            active: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_development_parses_camel_case() {
        let development: Development = serde_json::from_value(json!({
            "id": 42,
            "name": "ЖК Северный",
            "address": "ул. Ленина, 1",
            "coords": { "lat": 61.25, "lon": 73.4 },
            "imageUrl": "https://example.org/42.jpg",
            "description": "",
            "avitoUrl": "https://avito.ru/42"
        }))
        .unwrap();

        assert_eq!(development.id, Some(EntityId::Number(42)));
        assert_eq!(development.image_url, "https://example.org/42.jpg");
        assert_eq!(development.avito_url.as_deref(), Some("https://avito.ru/42"));
        assert_eq!(development.is_favorite, None);
    }

    #[test]
    fn test_development_without_id() {
        let development: Development = serde_json::from_value(json!({
            "name": "Без номера",
            "coords": { "lat": 61.0, "lon": 73.0 }
        }))
        .unwrap();
        assert_eq!(development.id, None);
    }

    #[test]
    fn test_unknown_obj_type_does_not_fail_the_list() {
        let items: Vec<InfrastructureItem> = serde_json::from_value(json!([
            { "id": "n1", "objType": "bus_stop", "name": "Остановка", "coords": { "lat": 61.0, "lon": 73.0 } },
            { "id": "n2", "objType": "pharmacy", "name": "Аптека", "coords": { "lat": 61.0, "lon": 73.0 } }
        ]))
        .unwrap();

        assert_eq!(items[0].obj_type, ObjType::BusStop);
        assert_eq!(items[1].obj_type, ObjType::Unknown);
        assert!(!FilterSet::all().matches(&items[1]));
    }

    #[test]
    fn test_route_from_feature_collection() {
        let collection: FeatureCollection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[73.40, 61.25], [73.41, 61.26], [73.42, 61.27]]
                },
                "properties": { "distance": "2.4 км", "duration": 540 }
            }]
        }))
        .unwrap();

        let route = RouteResult::from_feature_collection(collection).unwrap();
        assert_eq!(route.geometry.len(), 3);
        assert_eq!(route.geometry[0], GeoPoint::new(61.25, 73.40));
        assert_eq!(route.distance, Some(RouteDistance::Text("2.4 км".into())));
        assert_eq!(route.properties["duration"], json!(540));
    }

    #[test]
    fn test_route_without_features_is_an_error() {
        let result = RouteResult::from_feature_collection(FeatureCollection::default());
        assert!(matches!(result, Err(MapError::Geometry(_))));
    }

    #[test]
    fn test_distance_label_text() {
        assert_eq!(RouteDistance::Meters(1200.0).label_text().as_deref(), Some("1200"));
        assert_eq!(RouteDistance::Meters(0.0).label_text(), None);
        assert_eq!(RouteDistance::Text(String::new()).label_text(), None);
    }

    #[test]
    fn test_filter_toggle() {
        let mut filters = FilterSet::all();
        assert_eq!(filters.len(), 6);

        assert!(!filters.toggle(ObjType::Shops));
        assert!(!filters.contains(ObjType::Shops));
        assert!(filters.toggle(ObjType::Shops));
        assert_eq!(filters.active(), ObjType::ALL.to_vec());
    }
}
