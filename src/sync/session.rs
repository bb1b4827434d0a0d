//! A map session: one widget, one backend, one state machine.
//!
//! The session runs transitions on the caller's thread. Backend queries run
//! on an [`AsyncSpawner`] and report back over a channel; [`MapSession::pump`]
//! feeds the results through the state machine and redraws what changed.

use crate::{
    api::Backend,
    core::config::SessionConfig,
    data::models::{Development, HeatmapCell, InfrastructureItem, ObjType, RouteResult},
    geometry::{circle::generate_circle_with_segments, Ring},
    input::events::MapEvent,
    layers::{
        manager::{DesiredOverlays, OverlayReconciler, OverlaySlot},
        marker::MarkerManager,
    },
    runtime::{default_spawner, spawn_on, with_timeout, AsyncHandle, AsyncSpawner},
    sync::state::{Completion, Effect, Event, Redraw, SearchContext, SyncState},
    traits::{MapWidget, MarkerHandle},
    Result,
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use futures::Future;
use std::sync::Arc;

/// What a marker click resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerClick {
    Development(Development),
    Amenity(InfrastructureItem),
    /// The marker is gone or unknown
    Stale,
}

pub struct MapSession<M: MapWidget> {
    config: SessionConfig,
    map: M,
    state: SyncState,
    backend: Arc<dyn Backend>,
    spawner: Arc<dyn AsyncSpawner>,
    completion_tx: Sender<Completion>,
    completion_rx: Receiver<Completion>,
    in_flight: Vec<Box<dyn AsyncHandle>>,
    overlays: OverlayReconciler,
    development_markers: MarkerManager<Development>,
    infrastructure_markers: MarkerManager<InfrastructureItem>,
    torn_down: bool,
}

impl<M: MapWidget> MapSession<M> {
    /// Creates a session on the ambient async runtime
    pub fn new(map: M, backend: Arc<dyn Backend>, config: SessionConfig) -> Result<Self> {
        let spawner = default_spawner()?;
        Self::with_spawner(map, backend, spawner, config)
    }

    pub fn with_spawner(
        map: M,
        backend: Arc<dyn Backend>,
        spawner: Arc<dyn AsyncSpawner>,
        config: SessionConfig,
    ) -> Result<Self> {
        config.validate()?;
        let state = SyncState::from_config(&config)?;
        let (completion_tx, completion_rx) = unbounded();

        Ok(Self {
            config,
            map,
            state,
            backend,
            spawner,
            completion_tx,
            completion_rx,
            in_flight: Vec::new(),
            overlays: OverlayReconciler::new(),
            development_markers: MarkerManager::new(),
            infrastructure_markers: MarkerManager::new(),
            torn_down: false,
        })
    }

    /// Routes a widget event to the matching operation
    pub fn handle_event(&mut self, event: MapEvent) -> Result<()> {
        match event {
            MapEvent::Load => self.map_ready(),
            MapEvent::MoveEnd | MapEvent::ZoomEnd => self.viewport_settled(),
            MapEvent::MarkerClick { handle } => self.click_marker(handle).map(|_| ()),
            MapEvent::Remove => {
                self.teardown();
                Ok(())
            }
        }
    }

    pub fn map_ready(&mut self) -> Result<()> {
        let bounds = self.map.viewport_bounds();
        self.dispatch(Event::MapReady { bounds })
    }

    pub fn viewport_settled(&mut self) -> Result<()> {
        let bounds = self.map.viewport_bounds();
        self.dispatch(Event::ViewportSettled { bounds })
    }

    pub fn set_search_context(&mut self, context: SearchContext) -> Result<()> {
        self.dispatch(Event::SearchContextChanged(context))
    }

    /// Selects a development, or clears the selection with `None`
    pub fn select_development(&mut self, development: Option<Development>) -> Result<()> {
        self.dispatch(Event::DevelopmentSelected(development))
    }

    pub fn set_radius(&mut self, radius_m: u32) -> Result<()> {
        self.dispatch(Event::RadiusChanged(radius_m))
    }

    pub fn toggle_filter(&mut self, obj_type: ObjType) -> Result<()> {
        self.dispatch(Event::FilterToggled(obj_type))
    }

    /// Requests a route from the selected development to `amenity`
    pub fn request_route(&mut self, amenity: InfrastructureItem) -> Result<()> {
        self.dispatch(Event::AmenityClicked(amenity))
    }

    /// Opens the detail card of a development without selecting it
    pub fn inspect_development(&mut self, development: Development) -> Result<()> {
        self.dispatch(Event::DevelopmentInspected(development))
    }

    pub fn close_inspection(&mut self) -> Result<()> {
        self.dispatch(Event::InspectionClosed)
    }

    /// Development markers select their development; amenity markers request
    /// a route to the amenity.
    pub fn click_marker(&mut self, handle: MarkerHandle) -> Result<MarkerClick> {
        let mut clicked = MarkerClick::Stale;
        if !self
            .development_markers
            .on_click(handle, |development| {
                clicked = MarkerClick::Development(development.clone())
            })
        {
            self.infrastructure_markers
                .on_click(handle, |item| clicked = MarkerClick::Amenity(item.clone()));
        }

        match &clicked {
            MarkerClick::Development(development) => {
                self.select_development(Some(development.clone()))?
            }
            MarkerClick::Amenity(item) => self.request_route(item.clone())?,
            MarkerClick::Stale => {}
        }
        Ok(clicked)
    }

    /// Runs one event through the state machine, starts its queries and
    /// redraws what it invalidated
    pub fn dispatch(&mut self, event: Event) -> Result<()> {
        let transition = self.state.handle(event)?;
        for effect in transition.effects {
            self.run_effect(effect);
        }
        self.redraw(transition.redraw);
        Ok(())
    }

    /// Applies every completion that has arrived. Returns how many were
    /// received, stale ones included.
    pub fn pump(&mut self) -> usize {
        let mut received = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            received += 1;
            if let Err(err) = self.dispatch(Event::Completed(completion)) {
                log::warn!("failed to apply completion: {}", err);
            }
        }
        self.in_flight.retain(|handle| !handle.is_finished());
        received
    }

    /// Pumps until no query is left in flight
    #[cfg(feature = "tokio-runtime")]
    pub async fn settle(&mut self) {
        loop {
            self.pump();
            let idle = self.in_flight.iter().all(|handle| handle.is_finished());
            if idle && self.completion_rx.is_empty() {
                self.in_flight.clear();
                break;
            }
            ::tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        let backend = Arc::clone(&self.backend);
        let timeout = self.config.api.request_timeout();

        match effect {
            Effect::SearchDevelopments {
                generation,
                bbox,
                context,
            } => {
                log::info!("searching developments {} in {:?}", generation, bbox);
                self.spawn(async move {
                    let result = with_timeout(
                        timeout,
                        backend.search_developments(
                            &bbox,
                            context.selection_id.as_deref(),
                            context.search_query.as_deref(),
                        ),
                    )
                    .await;
                    Completion::Developments { generation, result }
                });
            }
            Effect::FetchHeatmap {
                generation,
                bbox,
                selection_id,
            } => {
                log::info!("fetching heatmap {} in {:?}", generation, bbox);
                self.spawn(async move {
                    let result = with_timeout(
                        timeout,
                        backend.fetch_infrastructure_heatmap(&bbox, selection_id.as_deref()),
                    )
                    .await;
                    Completion::Heatmap { generation, result }
                });
            }
            Effect::FetchInfrastructure {
                generation,
                development_id,
                radius,
            } => {
                log::info!(
                    "fetching infrastructure {} around {} ({} m)",
                    generation,
                    development_id,
                    radius.meters()
                );
                self.spawn(async move {
                    let result = with_timeout(
                        timeout,
                        backend.fetch_infrastructure_radius(&development_id, radius.meters()),
                    )
                    .await;
                    Completion::Infrastructure { generation, result }
                });
            }
            Effect::BuildRoute {
                generation,
                development_id,
                amenity_id,
            } => {
                log::info!(
                    "building route {} from {} to {}",
                    generation,
                    development_id,
                    amenity_id
                );
                self.spawn(async move {
                    let result = with_timeout(
                        timeout,
                        backend.build_route_between_points(&development_id, &amenity_id),
                    )
                    .await;
                    Completion::Route { generation, result }
                });
            }
            Effect::AbandonPending => {
                for handle in self.in_flight.drain(..) {
                    handle.cancel();
                }
                while self.completion_rx.try_recv().is_ok() {}
            }
        }
    }

    fn spawn<F>(&mut self, query: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let tx = self.completion_tx.clone();
        let handle = spawn_on(self.spawner.as_ref(), async move {
            let completion = query.await;
            if tx.send(completion).is_err() {
                log::debug!("session gone, dropping completion");
            }
        });
        self.in_flight.push(handle);
    }

    fn redraw(&mut self, redraw: Redraw) {
        if redraw.teardown {
            self.development_markers.teardown(&mut self.map);
            self.infrastructure_markers.teardown(&mut self.map);
            self.overlays.clear_all(&mut self.map);
            return;
        }

        if redraw.developments {
            self.development_markers
                .sync(&mut self.map, self.state.developments());
        }
        if redraw.infrastructure {
            self.infrastructure_markers
                .sync(&mut self.map, self.state.infrastructure());
        }

        let mut slots = Vec::new();
        if redraw.route {
            slots.extend([OverlaySlot::Route, OverlaySlot::RouteLabel]);
        }
        if redraw.heatmap {
            slots.push(OverlaySlot::Heatmap);
        }
        if redraw.radius_circle {
            slots.push(OverlaySlot::RadiusCircle);
        }
        if slots.is_empty() {
            return;
        }

        let desired = DesiredOverlays::new(
            self.state.route(),
            self.state.heatmap(),
            self.radius_circle(),
        );
        if let Err(err) = self.overlays.reconcile_slots(&mut self.map, &desired, &slots) {
            log::warn!("failed to update overlays: {}", err);
            self.state.record_error(&err);
        }
    }

    /// The search-radius ring around the selected development
    fn radius_circle(&self) -> Option<Ring> {
        let center = self.state.selection().center()?;
        let radius = self.state.selection().radius();
        match generate_circle_with_segments(
            center,
            radius.meters() as f64,
            self.config.search.circle_segments,
        ) {
            Ok(ring) => Some(ring),
            Err(err) => {
                log::warn!("cannot draw radius circle: {}", err);
                None
            }
        }
    }

    /// Removes every marker and overlay and abandons pending queries.
    /// Later calls do nothing.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        if let Err(err) = self.dispatch(Event::Teardown) {
            log::warn!("teardown failed: {}", err);
        }
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    /// The widget, for host-side changes such as moving the camera
    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub fn developments(&self) -> &[Development] {
        self.state.developments()
    }

    pub fn infrastructure(&self) -> &[InfrastructureItem] {
        self.state.infrastructure()
    }

    pub fn route(&self) -> Option<&RouteResult> {
        self.state.route()
    }

    pub fn heatmap(&self) -> Option<&[HeatmapCell]> {
        self.state.heatmap()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.state.last_error()
    }

    /// Queries spawned and not yet finished
    pub fn pending_requests(&self) -> usize {
        self.in_flight
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    pub fn development_marker(&self, development: &Development) -> Option<MarkerHandle> {
        self.development_markers.handles().into_iter().find(|handle| {
            self.development_markers
                .entity(*handle)
                .is_some_and(|placed| placed.id == development.id)
        })
    }

    pub fn amenity_marker(&self, item: &InfrastructureItem) -> Option<MarkerHandle> {
        self.infrastructure_markers.handles().into_iter().find(|handle| {
            self.infrastructure_markers
                .entity(*handle)
                .is_some_and(|placed| placed.id == item.id)
        })
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl<M: MapWidget> Drop for MapSession<M> {
    fn drop(&mut self) {
        self.teardown();
    }
}
