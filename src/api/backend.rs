use crate::{
    core::bounds::BoundingBox,
    data::models::{Development, EntityId, HeatmapCell, InfrastructureItem, RouteResult},
    Result,
};
use async_trait::async_trait;

/// Queries the sync engine issues.
///
/// Implementations are shared between spawned tasks, hence `Send + Sync`.
/// They must not retry on their own; supersession decides what is still
/// wanted.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Developments inside `bbox`, optionally scoped to a saved selection
    /// and a free-text query
    async fn search_developments(
        &self,
        bbox: &BoundingBox,
        selection_id: Option<&str>,
        search_query: Option<&str>,
    ) -> Result<Vec<Development>>;

    async fn fetch_infrastructure_heatmap(
        &self,
        bbox: &BoundingBox,
        selection_id: Option<&str>,
    ) -> Result<Vec<HeatmapCell>>;

    /// Amenities within `radius_m` of a development. The radius must be
    /// rejected before any I/O when outside `[1000, 10000]`.
    async fn fetch_infrastructure_radius(
        &self,
        development_id: &EntityId,
        radius_m: u32,
    ) -> Result<Vec<InfrastructureItem>>;

    async fn build_route_between_points(
        &self,
        development_id: &EntityId,
        amenity_id: &EntityId,
    ) -> Result<RouteResult>;
}
