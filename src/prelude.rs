//! Prelude module for common estatemap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use estatemap::prelude::*;`

pub use crate::core::{
    bounds::BoundingBox,
    config::SessionConfig,
    geo::{GeoPoint, ViewportBounds},
};

pub use crate::data::{
    geojson::{FeatureCollection, GeoJsonFeature, GeoJsonGeometry},
    models::{
        Development, EntityId, FilterSet, HeatmapCell, InfrastructureItem, ObjType,
        RouteDistance, RouteResult,
    },
};

pub use crate::geometry::{
    circle::{generate_circle, generate_circle_with_segments},
    route::{route_label, RouteLabel},
    Ring,
};

pub use crate::layers::{
    base::{LayerSpec, LayerType},
    manager::{DesiredOverlays, OverlayReconciler, OverlaySlot},
    marker::{MarkerEntity, MarkerKey, MarkerManager, SyncReport},
};

pub use crate::input::events::MapEvent;

pub use crate::sync::{
    generation::{Generation, Generations, QueryKind},
    selection::{RadiusSetting, SelectionChange, SelectionState},
    session::{MapSession, MarkerClick},
    state::{Completion, Effect, Event, Phase, Redraw, SearchContext, SyncState, Transition},
};

pub use crate::api::{client::HttpBackend, Backend};

pub use crate::runtime::{AsyncHandle, AsyncSpawner};

pub use crate::headless::{HeadlessMap, MapOperation};

pub use crate::traits::{MapWidget, MarkerHandle, MarkerKind, MarkerSpec};

pub use crate::{Error as MapError, Result};

pub use std::{
    sync::Arc,
    time::{Duration, Instant},
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};

pub use futures::Future;
pub use std::pin::Pin;
