//! `reqwest` implementation of [`Backend`].

use crate::{
    api::backend::Backend,
    core::{bounds::BoundingBox, config::ApiConfig},
    data::{
        geojson::FeatureCollection,
        models::{Development, EntityId, HeatmapCell, InfrastructureItem, RouteResult},
    },
    sync::selection::RadiusSetting,
    MapError, Result,
};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    board: &'a BoundingBox,
    #[serde(skip_serializing_if = "Option::is_none")]
    selection_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_query: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    developments: Vec<Development>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HeatmapRequest<'a> {
    bbox: &'a BoundingBox,
    #[serde(skip_serializing_if = "Option::is_none")]
    selection_id: Option<&'a str>,
}

/// HTTP backend speaking the estate API (`/api/v1`)
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder().user_agent(&config.user_agent).build()?;
        Ok(Self::with_client(client, &config.base_url))
    }

    /// Uses an existing client, e.g. one shared with the host application
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn search_developments(
        &self,
        bbox: &BoundingBox,
        selection_id: Option<&str>,
        search_query: Option<&str>,
    ) -> Result<Vec<Development>> {
        bbox.validate()?;
        let body = SearchRequest {
            board: bbox,
            selection_id,
            search_query,
        };
        log::debug!("POST /developments/search/filter {:?}", bbox);
        let response = self
            .client
            .post(self.url("/developments/search/filter"))
            .json(&body)
            .send()
            .await?;
        let parsed: SearchResponse = read_json(response).await?;
        Ok(parsed.developments)
    }

    async fn fetch_infrastructure_heatmap(
        &self,
        bbox: &BoundingBox,
        selection_id: Option<&str>,
    ) -> Result<Vec<HeatmapCell>> {
        bbox.validate()?;
        let body = HeatmapRequest { bbox, selection_id };
        log::debug!("POST /infrastructure/heatmap {:?}", bbox);
        let response = self
            .client
            .post(self.url("/infrastructure/heatmap"))
            .json(&body)
            .send()
            .await?;
        let collection: FeatureCollection = read_json(response).await?;
        Ok(heatmap_cells(collection))
    }

    async fn fetch_infrastructure_radius(
        &self,
        development_id: &EntityId,
        radius_m: u32,
    ) -> Result<Vec<InfrastructureItem>> {
        let radius = RadiusSetting::new(radius_m)?;
        log::debug!(
            "GET /infrastructure/radius developmentId={} radius={}",
            development_id,
            radius.meters()
        );
        let response = self
            .client
            .get(self.url("/infrastructure/radius"))
            .query(&[
                ("developmentId", development_id.to_string()),
                ("radius", radius.meters().to_string()),
            ])
            .send()
            .await?;
        read_json(response).await
    }

    async fn build_route_between_points(
        &self,
        development_id: &EntityId,
        amenity_id: &EntityId,
    ) -> Result<RouteResult> {
        log::debug!(
            "GET /routes/build/points developmentId={} osmId={}",
            development_id,
            amenity_id
        );
        let response = self
            .client
            .get(self.url("/routes/build/points"))
            .query(&[
                ("developmentId", development_id.to_string()),
                ("osmId", amenity_id.to_string()),
            ])
            .send()
            .await?;
        let collection: FeatureCollection = read_json(response).await?;
        RouteResult::from_feature_collection(collection)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let err = error_for_status(status.as_u16(), &body);
        log::warn!("backend answered {}: {}", status, err);
        return Err(err);
    }
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Maps a non-success response to an error, using the backend's
/// `error.message` when the body carries one
pub fn error_for_status(status: u16, body: &str) -> MapError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| "Unknown error".to_string());

    match status {
        400 => MapError::BadRequest(message),
        404 => MapError::NotFound(message),
        500 => MapError::Server(message),
        _ => MapError::Unexpected { status, message },
    }
}

/// Reads heatmap cells from a feature collection. Features without geometry
/// are skipped; a missing weight counts as zero.
pub fn heatmap_cells(collection: FeatureCollection) -> Vec<HeatmapCell> {
    collection
        .features
        .into_iter()
        .filter_map(|feature| {
            let total_weight = feature
                .properties
                .get("total_weight")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            feature.geometry.map(|geometry| HeatmapCell {
                geometry,
                total_weight,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::geojson::GeoJsonGeometry;
    use serde_json::json;

    fn bbox() -> BoundingBox {
        BoundingBox::new(61.3, 73.3, 61.2, 73.5)
    }

    #[test]
    fn test_error_mapping() {
        let body = r#"{"error":{"message":"radius too large"}}"#;
        assert!(matches!(
            error_for_status(400, body),
            MapError::BadRequest(message) if message == "radius too large"
        ));
        assert!(matches!(error_for_status(404, ""), MapError::NotFound(m) if m == "Unknown error"));
        assert!(matches!(error_for_status(500, body), MapError::Server(_)));
        assert_eq!(
            error_for_status(503, "<html>").to_string(),
            "Unexpected error (503): Unknown error"
        );
    }

    #[test]
    fn test_search_request_shape() {
        let bbox = bbox();
        let body = SearchRequest {
            board: &bbox,
            selection_id: Some("12"),
            search_query: None,
        };
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["board"]["topLeftLat"], json!(61.3));
        assert_eq!(value["board"]["bottomRightLon"], json!(73.5));
        assert_eq!(value["selectionId"], json!("12"));
        assert!(value.get("searchQuery").is_none());
    }

    #[test]
    fn test_heatmap_cells_from_collection() {
        let collection: FeatureCollection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[73.3, 61.2], [73.4, 61.2], [73.4, 61.3], [73.3, 61.2]]]
                    },
                    "properties": { "total_weight": 0.75 }
                },
                { "type": "Feature", "geometry": null, "properties": { "total_weight": 1.0 } }
            ]
        }))
        .unwrap();

        let cells = heatmap_cells(collection);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].total_weight, 0.75);
        assert!(matches!(cells[0].geometry, GeoJsonGeometry::Polygon { .. }));
    }

    #[test]
    fn test_base_url_is_normalised() {
        let backend = HttpBackend::with_client(Client::new(), "http://127.0.0.1:5001/api/v1/");
        assert_eq!(
            backend.url("/routes/build/points"),
            "http://127.0.0.1:5001/api/v1/routes/build/points"
        );
    }

    #[tokio::test]
    async fn test_invalid_radius_fails_before_io() {
        // Nothing listens here; reaching the network would yield a Network error
        let backend = HttpBackend::with_client(Client::new(), "http://127.0.0.1:9/api/v1");
        let result = backend
            .fetch_infrastructure_radius(&EntityId::Number(1), 15_000)
            .await;
        assert!(matches!(result, Err(MapError::InvalidRadius { radius: 15_000, .. })));
    }
}
