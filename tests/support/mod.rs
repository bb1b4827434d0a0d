//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use estatemap::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A scripted response: what to return and how long to take
pub struct Reply<T> {
    pub delay: Duration,
    pub result: Result<T>,
}

impl<T> Reply<T> {
    pub fn now(value: T) -> Self {
        Self::after(0, value)
    }

    pub fn after(millis: u64, value: T) -> Self {
        Self {
            delay: Duration::from_millis(millis),
            result: Ok(value),
        }
    }

    pub fn fail(err: MapError) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(err),
        }
    }
}

type Handler<A, T> = Box<dyn Fn(&A) -> Reply<T> + Send + Sync>;

/// Recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Search(BoundingBox, Option<String>),
    Heatmap(BoundingBox),
    Radius(EntityId, u32),
    Route(EntityId, EntityId),
}

/// In-process [`Backend`] answering from closures
pub struct ScriptedBackend {
    search: Handler<BoundingBox, Vec<Development>>,
    heatmap: Handler<BoundingBox, Vec<HeatmapCell>>,
    radius: Handler<(EntityId, u32), Vec<InfrastructureItem>>,
    route: Handler<(EntityId, EntityId), RouteResult>,
    calls: Mutex<Vec<Call>>,
    completed: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            search: Box::new(|_| Reply::now(Vec::new())),
            heatmap: Box::new(|_| Reply::now(Vec::new())),
            radius: Box::new(|_| Reply::now(Vec::new())),
            route: Box::new(|_| Reply::now(RouteResult::default())),
            calls: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
        }
    }

    pub fn on_search(
        mut self,
        handler: impl Fn(&BoundingBox) -> Reply<Vec<Development>> + Send + Sync + 'static,
    ) -> Self {
        self.search = Box::new(handler);
        self
    }

    pub fn on_heatmap(
        mut self,
        handler: impl Fn(&BoundingBox) -> Reply<Vec<HeatmapCell>> + Send + Sync + 'static,
    ) -> Self {
        self.heatmap = Box::new(handler);
        self
    }

    pub fn on_radius(
        mut self,
        handler: impl Fn(&(EntityId, u32)) -> Reply<Vec<InfrastructureItem>> + Send + Sync + 'static,
    ) -> Self {
        self.radius = Box::new(handler);
        self
    }

    pub fn on_route(
        mut self,
        handler: impl Fn(&(EntityId, EntityId)) -> Reply<RouteResult> + Send + Sync + 'static,
    ) -> Self {
        self.route = Box::new(handler);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn radius_calls(&self) -> Vec<(EntityId, u32)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Radius(id, radius) => Some((id, radius)),
                _ => None,
            })
            .collect()
    }

    pub fn route_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Route(..)))
            .count()
    }

    pub fn search_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Search(..)))
            .count()
    }

    /// Responses fully produced, including ones the session later discards
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn deliver<T>(&self, reply: Reply<T>) -> Result<T> {
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        reply.result
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn search_developments(
        &self,
        bbox: &BoundingBox,
        selection_id: Option<&str>,
        _search_query: Option<&str>,
    ) -> Result<Vec<Development>> {
        self.record(Call::Search(*bbox, selection_id.map(str::to_string)));
        let reply = (self.search)(bbox);
        self.deliver(reply).await
    }

    async fn fetch_infrastructure_heatmap(
        &self,
        bbox: &BoundingBox,
        _selection_id: Option<&str>,
    ) -> Result<Vec<HeatmapCell>> {
        self.record(Call::Heatmap(*bbox));
        let reply = (self.heatmap)(bbox);
        self.deliver(reply).await
    }

    async fn fetch_infrastructure_radius(
        &self,
        development_id: &EntityId,
        radius_m: u32,
    ) -> Result<Vec<InfrastructureItem>> {
        RadiusSetting::new(radius_m)?;
        self.record(Call::Radius(development_id.clone(), radius_m));
        let reply = (self.radius)(&(development_id.clone(), radius_m));
        self.deliver(reply).await
    }

    async fn build_route_between_points(
        &self,
        development_id: &EntityId,
        amenity_id: &EntityId,
    ) -> Result<RouteResult> {
        self.record(Call::Route(development_id.clone(), amenity_id.clone()));
        let reply = (self.route)(&(development_id.clone(), amenity_id.clone()));
        self.deliver(reply).await
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Viewport whose south edge sits at `south`
pub fn viewport(south: f64) -> ViewportBounds {
    ViewportBounds::from_coords(south, 73.3, south + 0.1, 73.5)
}

pub fn development(id: i64) -> Development {
    Development::new(
        id,
        format!("ЖК {id}"),
        GeoPoint::new(61.25 + id as f64 * 0.001, 73.4),
    )
}

pub fn amenity(id: &str, obj_type: ObjType) -> InfrastructureItem {
    InfrastructureItem::new(id, obj_type, id, GeoPoint::new(61.26, 73.41))
}

pub fn straight_route(distance: &str) -> RouteResult {
    RouteResult {
        geometry: vec![
            GeoPoint::new(61.25, 73.40),
            GeoPoint::new(61.255, 73.405),
            GeoPoint::new(61.26, 73.41),
        ],
        distance: Some(RouteDistance::Text(distance.to_string())),
        ..Default::default()
    }
}

/// Session on a headless map showing `viewport(61.2)`, already loaded
pub async fn ready_session(backend: Arc<ScriptedBackend>) -> MapSession<HeadlessMap> {
    init_logging();
    let map = HeadlessMap::with_viewport(viewport(61.2));
    let mut session = MapSession::new(map, backend, SessionConfig::default()).unwrap();
    session.handle_event(MapEvent::Load).unwrap();
    session.settle().await;
    session
}
