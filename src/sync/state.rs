//! The viewport query controller as an explicit state machine.
//!
//! [`SyncState::handle`] is a pure transition: it updates the in-memory state
//! and returns the I/O to start ([`Effect`]) and the parts of the map to
//! redraw ([`Redraw`]). It never touches the widget or the network.

use crate::{
    core::{bounds::BoundingBox, config::SessionConfig, geo::ViewportBounds},
    data::models::{
        Development, EntityId, HeatmapCell, InfrastructureItem, ObjType, RouteResult,
    },
    sync::{
        generation::{Generation, Generations, QueryKind},
        route::RouteFlow,
        selection::{RadiusSetting, SelectionChange, SelectionState},
    },
    MapError, Result,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    /// Waiting for the widget to report its first layout
    Uninitialized,
    /// The first search for `bbox` has not completed yet
    Loading { bbox: BoundingBox },
    Ready { bbox: BoundingBox },
    /// Terminal; every event is ignored
    Destroyed,
}

impl Phase {
    pub fn bbox(&self) -> Option<&BoundingBox> {
        match self {
            Phase::Loading { bbox } | Phase::Ready { bbox } => Some(bbox),
            Phase::Uninitialized | Phase::Destroyed => None,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Phase::Loading { .. } | Phase::Ready { .. })
    }
}

/// Scope applied to viewport searches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchContext {
    /// Saved selection the map is limited to
    pub selection_id: Option<String>,
    pub search_query: Option<String>,
}

impl SearchContext {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            selection_id: config.search.selection_id.clone(),
            search_query: config.search.search_query.clone(),
        }
    }
}

/// Backend response tagged with the generation it was requested under
#[derive(Debug)]
pub enum Completion {
    Developments {
        generation: Generation,
        result: Result<Vec<Development>>,
    },
    Heatmap {
        generation: Generation,
        result: Result<Vec<HeatmapCell>>,
    },
    Infrastructure {
        generation: Generation,
        result: Result<Vec<InfrastructureItem>>,
    },
    Route {
        generation: Generation,
        result: Result<RouteResult>,
    },
}

impl Completion {
    pub fn kind(&self) -> QueryKind {
        match self {
            Completion::Developments { .. } => QueryKind::Developments,
            Completion::Heatmap { .. } => QueryKind::Heatmap,
            Completion::Infrastructure { .. } => QueryKind::Infrastructure,
            Completion::Route { .. } => QueryKind::Route,
        }
    }

    pub fn generation(&self) -> Generation {
        match self {
            Completion::Developments { generation, .. }
            | Completion::Heatmap { generation, .. }
            | Completion::Infrastructure { generation, .. }
            | Completion::Route { generation, .. } => *generation,
        }
    }
}

#[derive(Debug)]
pub enum Event {
    MapReady { bounds: Option<ViewportBounds> },
    ViewportSettled { bounds: Option<ViewportBounds> },
    SearchContextChanged(SearchContext),
    DevelopmentSelected(Option<Development>),
    RadiusChanged(u32),
    FilterToggled(ObjType),
    AmenityClicked(InfrastructureItem),
    DevelopmentInspected(Development),
    InspectionClosed,
    Completed(Completion),
    Teardown,
}

/// I/O requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SearchDevelopments {
        generation: Generation,
        bbox: BoundingBox,
        context: SearchContext,
    },
    FetchHeatmap {
        generation: Generation,
        bbox: BoundingBox,
        selection_id: Option<String>,
    },
    FetchInfrastructure {
        generation: Generation,
        development_id: EntityId,
        radius: RadiusSetting,
    },
    BuildRoute {
        generation: Generation,
        development_id: EntityId,
        amenity_id: EntityId,
    },
    /// Stop whatever is still running
    AbandonPending,
}

/// Parts of the map that are out of date after a transition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Redraw {
    pub developments: bool,
    pub infrastructure: bool,
    pub route: bool,
    pub heatmap: bool,
    pub radius_circle: bool,
    /// Remove everything; set once, on teardown
    pub teardown: bool,
}

impl Redraw {
    pub fn all() -> Self {
        Self {
            developments: true,
            infrastructure: true,
            route: true,
            heatmap: true,
            radius_circle: true,
            teardown: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    pub effects: Vec<Effect>,
    pub redraw: Redraw,
}

impl Transition {
    fn none() -> Self {
        Self::default()
    }
}

/// Everything the engine knows, owned by a single logical thread
#[derive(Debug, Clone)]
pub struct SyncState {
    phase: Phase,
    context: SearchContext,
    generations: Generations,
    developments: Vec<Development>,
    heatmap: Option<Vec<HeatmapCell>>,
    selection: SelectionState,
    route: RouteFlow,
    inspected: Option<Development>,
    last_error: Option<String>,
    /// Query that produced `last_error`; `None` for local failures
    error_source: Option<QueryKind>,
}

impl SyncState {
    pub fn new(radius: RadiusSetting, context: SearchContext) -> Self {
        Self {
            phase: Phase::Uninitialized,
            context,
            generations: Generations::new(),
            developments: Vec::new(),
            heatmap: None,
            selection: SelectionState::new(radius),
            route: RouteFlow::new(),
            inspected: None,
            last_error: None,
            error_source: None,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        let radius = RadiusSetting::new(config.search.default_radius_m)?;
        Ok(Self::new(radius, SearchContext::from_config(config)))
    }

    /// Applies one event.
    ///
    /// Validation failures return `Err` and leave the state untouched.
    /// Backend failures are not errors here: they are logged and kept in
    /// [`SyncState::last_error`].
    pub fn handle(&mut self, event: Event) -> Result<Transition> {
        if self.phase == Phase::Destroyed {
            log::debug!("ignoring {} after teardown", event_name(&event));
            return Ok(Transition::none());
        }

        match event {
            Event::MapReady { bounds } => self.on_viewport(bounds, true),
            Event::ViewportSettled { bounds } => self.on_viewport(bounds, false),
            Event::SearchContextChanged(context) => Ok(self.on_search_context(context)),
            Event::DevelopmentSelected(development) => self.on_select(development),
            Event::RadiusChanged(meters) => self.on_radius(meters),
            Event::FilterToggled(obj_type) => Ok(self.on_filter(obj_type)),
            Event::AmenityClicked(item) => self.on_amenity(&item),
            Event::DevelopmentInspected(development) => {
                self.inspected = Some(development);
                Ok(Transition::none())
            }
            Event::InspectionClosed => {
                self.inspected = None;
                Ok(Transition::none())
            }
            Event::Completed(completion) => Ok(self.on_completion(completion)),
            Event::Teardown => Ok(self.on_teardown()),
        }
    }

    fn on_viewport(&mut self, bounds: Option<ViewportBounds>, ready: bool) -> Result<Transition> {
        if self.phase == Phase::Uninitialized && !ready {
            log::debug!("viewport settled before the map was ready, ignoring");
            return Ok(Transition::none());
        }

        let bounds = bounds.ok_or_else(|| {
            MapError::MissingBounds("the map did not report its viewport".into())
        })?;
        let bbox = BoundingBox::from_viewport(&bounds)?;

        let redraw = if self.phase == Phase::Uninitialized {
            log::info!("map ready, loading {:?}", bbox);
            Redraw::all()
        } else {
            Redraw::default()
        };

        self.phase = match self.phase {
            Phase::Ready { .. } => Phase::Ready { bbox },
            _ => Phase::Loading { bbox },
        };

        Ok(Transition {
            effects: self.viewport_queries(bbox),
            redraw,
        })
    }

    fn viewport_queries(&mut self, bbox: BoundingBox) -> Vec<Effect> {
        let search = self.generations.advance(QueryKind::Developments);
        let heatmap = self.generations.advance(QueryKind::Heatmap);
        log::debug!("viewport queries {} / {} for {:?}", search, heatmap, bbox);
        vec![
            Effect::SearchDevelopments {
                generation: search,
                bbox,
                context: self.context.clone(),
            },
            Effect::FetchHeatmap {
                generation: heatmap,
                bbox,
                selection_id: self.context.selection_id.clone(),
            },
        ]
    }

    fn on_search_context(&mut self, context: SearchContext) -> Transition {
        if context == self.context {
            return Transition::none();
        }
        self.context = context;
        match self.phase.bbox().copied() {
            Some(bbox) => Transition {
                effects: self.viewport_queries(bbox),
                redraw: Redraw::default(),
            },
            None => Transition::none(),
        }
    }

    fn on_select(&mut self, development: Option<Development>) -> Result<Transition> {
        if !self.phase.is_live() {
            log::debug!("selection before the map was ready, ignoring");
            return Ok(Transition::none());
        }
        if let Some(development) = &development {
            if development.id.is_none() {
                return Err(MapError::MissingIdentity(format!(
                    "development '{}'",
                    development.name
                )));
            }
        }

        let redraw = Redraw {
            infrastructure: true,
            route: true,
            radius_circle: true,
            ..Redraw::default()
        };

        match self.selection.select(development) {
            SelectionChange::Unchanged => Ok(Transition::none()),
            SelectionChange::Cleared => {
                log::debug!("selection cleared");
                self.generations.invalidate(QueryKind::Infrastructure);
                self.generations.invalidate(QueryKind::Route);
                self.route.clear();
                Ok(Transition {
                    effects: Vec::new(),
                    redraw,
                })
            }
            SelectionChange::Changed => {
                self.generations.invalidate(QueryKind::Route);
                self.route.clear();
                Ok(Transition {
                    effects: self.infrastructure_query()?.into_iter().collect(),
                    redraw,
                })
            }
        }
    }

    fn infrastructure_query(&mut self) -> Result<Option<Effect>> {
        let development_id = match self.selection.selected_id() {
            Ok(id) => id,
            Err(MapError::NoDevelopmentSelected) => return Ok(None),
            Err(err) => return Err(err),
        };
        let radius = self.selection.radius();
        let generation = self.generations.advance(QueryKind::Infrastructure);
        log::debug!(
            "infrastructure query {} for {} within {} m",
            generation,
            development_id,
            radius.meters()
        );
        Ok(Some(Effect::FetchInfrastructure {
            generation,
            development_id,
            radius,
        }))
    }

    fn on_radius(&mut self, meters: u32) -> Result<Transition> {
        if !self.selection.set_radius(meters)? {
            return Ok(Transition::none());
        }
        if !self.phase.is_live() {
            return Ok(Transition::none());
        }
        Ok(Transition {
            effects: self.infrastructure_query()?.into_iter().collect(),
            redraw: Redraw {
                radius_circle: true,
                ..Redraw::default()
            },
        })
    }

    fn on_filter(&mut self, obj_type: ObjType) -> Transition {
        let active = self.selection.toggle_filter(obj_type);
        log::debug!("filter {} {}", obj_type, if active { "on" } else { "off" });
        Transition {
            effects: Vec::new(),
            redraw: Redraw {
                infrastructure: self.phase.is_live(),
                ..Redraw::default()
            },
        }
    }

    fn on_amenity(&mut self, item: &InfrastructureItem) -> Result<Transition> {
        if !self.phase.is_live() {
            return Ok(Transition::none());
        }
        let development_id = self.selection.selected_id()?;
        let amenity_id = item
            .id
            .clone()
            .ok_or_else(|| MapError::MissingIdentity(format!("amenity '{}'", item.name)))?;

        let generation = self.generations.advance(QueryKind::Route);
        log::debug!("route query {} to {}", generation, amenity_id);
        self.route.request(amenity_id.clone());
        Ok(Transition {
            effects: vec![Effect::BuildRoute {
                generation,
                development_id,
                amenity_id,
            }],
            redraw: Redraw::default(),
        })
    }

    fn on_completion(&mut self, completion: Completion) -> Transition {
        let kind = completion.kind();
        let generation = completion.generation();
        if !self.generations.settle(kind, generation) {
            log::debug!("discarding stale {} response {}", kind, generation);
            return Transition::none();
        }

        let mut redraw = Redraw::default();
        match completion {
            Completion::Developments { result, .. } => {
                if let Some(developments) = self.accept(kind, result) {
                    log::info!("{} developments in view", developments.len());
                    self.developments = developments;
                    redraw.developments = true;
                    if let Phase::Loading { bbox } = self.phase {
                        self.phase = Phase::Ready { bbox };
                    }
                }
            }
            Completion::Heatmap { result, .. } => {
                if let Some(cells) = self.accept(kind, result) {
                    self.heatmap = Some(cells);
                    redraw.heatmap = true;
                }
            }
            Completion::Infrastructure { result, .. } => {
                if let Some(items) = self.accept(kind, result) {
                    self.selection.apply_fetched(items);
                    redraw.infrastructure = true;
                }
            }
            Completion::Route { result, .. } => {
                if let Some(route) = self.accept(kind, result) {
                    self.route.replace(route);
                    redraw.route = true;
                }
            }
        }

        Transition {
            effects: Vec::new(),
            redraw,
        }
    }

    fn accept<T>(&mut self, kind: QueryKind, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => {
                if self.error_source == Some(kind) {
                    self.last_error = None;
                    self.error_source = None;
                }
                Some(value)
            }
            Err(err) => {
                log::warn!("{} query failed: {}", kind, err);
                self.last_error = Some(err.to_string());
                self.error_source = Some(kind);
                None
            }
        }
    }

    fn on_teardown(&mut self) -> Transition {
        log::info!("tearing down map session");
        self.phase = Phase::Destroyed;
        self.generations.invalidate_all();
        Transition {
            effects: vec![Effect::AbandonPending],
            redraw: Redraw {
                teardown: true,
                ..Redraw::default()
            },
        }
    }

    pub(crate) fn record_error(&mut self, err: &MapError) {
        self.last_error = Some(err.to_string());
        self.error_source = None;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn bbox(&self) -> Option<&BoundingBox> {
        self.phase.bbox()
    }

    pub fn context(&self) -> &SearchContext {
        &self.context
    }

    pub fn developments(&self) -> &[Development] {
        &self.developments
    }

    pub fn heatmap(&self) -> Option<&[HeatmapCell]> {
        self.heatmap.as_deref()
    }

    /// Amenities around the selection that pass the active filters
    pub fn infrastructure(&self) -> &[InfrastructureItem] {
        self.selection.visible()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn route(&self) -> Option<&RouteResult> {
        self.route.current()
    }

    pub fn inspected(&self) -> Option<&Development> {
        self.inspected.as_ref()
    }

    /// Message of the most recent failure; cleared once the failed query
    /// kind succeeds again
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_fetching(&self, kind: QueryKind) -> bool {
        self.generations.is_fetching(kind)
    }

    pub fn generations(&self) -> &Generations {
        &self.generations
    }
}

fn event_name(event: &Event) -> &'static str {
    match event {
        Event::MapReady { .. } => "MapReady",
        Event::ViewportSettled { .. } => "ViewportSettled",
        Event::SearchContextChanged(_) => "SearchContextChanged",
        Event::DevelopmentSelected(_) => "DevelopmentSelected",
        Event::RadiusChanged(_) => "RadiusChanged",
        Event::FilterToggled(_) => "FilterToggled",
        Event::AmenityClicked(_) => "AmenityClicked",
        Event::DevelopmentInspected(_) => "DevelopmentInspected",
        Event::InspectionClosed => "InspectionClosed",
        Event::Completed(_) => "Completed",
        Event::Teardown => "Teardown",
    }
}
