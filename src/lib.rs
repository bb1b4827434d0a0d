//! # estatemap
//!
//! Viewport-driven synchronization engine for a real-estate map.
//!
//! The crate keeps the visible map region, the rendered overlays (development
//! markers, amenity markers, search-radius circle, amenity heatmap, route line
//! and label) and the asynchronous backend queries that feed them consistent
//! while the user pans, zooms, filters and selects. The map widget and the
//! backend are external collaborators reached through the [`traits::MapWidget`]
//! and [`api::Backend`] traits.

pub mod api;
pub mod core;
pub mod data;
pub mod geometry;
pub mod headless;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod runtime;
pub mod sync;
pub mod traits;

pub use crate::core::constants;

// Re-export public API
pub use core::{
    bounds::BoundingBox,
    config::SessionConfig,
    geo::{GeoPoint, ViewportBounds},
};

pub use data::models::{
    Development, EntityId, FilterSet, HeatmapCell, InfrastructureItem, ObjType, RouteDistance,
    RouteResult,
};

pub use geometry::{circle::generate_circle, Ring};

pub use layers::{manager::OverlayReconciler, marker::MarkerManager};

pub use api::{client::HttpBackend, Backend};

pub use sync::{session::MapSession, state::SyncState};

pub use traits::{MapWidget, MarkerHandle};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Bounding box is incomplete: {0}")]
    MissingBounds(String),

    #[error("Radius must be between {min} and {max} meters, got {radius}")]
    InvalidRadius { radius: u32, min: u32, max: u32 },

    #[error("Invalid geometry: {0}")]
    Geometry(String),

    #[error("No development is selected")]
    NoDevelopmentSelected,

    #[error("Entity has no id: {0}")]
    MissingIdentity(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Server Error: {0}")]
    Server(String),

    #[error("Unexpected error ({status}): {message}")]
    Unexpected { status: u16, message: String },

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Marker error: {0}")]
    Marker(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// Error type alias for convenience
pub type Error = MapError;

impl MapError {
    /// Whether the error was raised locally before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MapError::InvalidCoordinates(_)
                | MapError::MissingBounds(_)
                | MapError::InvalidRadius { .. }
                | MapError::Geometry(_)
                | MapError::NoDevelopmentSelected
                | MapError::MissingIdentity(_)
                | MapError::Config(_)
        )
    }
}
