//! Seams to the map rendering widget.
//!
//! The engine never talks to a concrete renderer. Everything it needs from
//! the widget goes through [`MapWidget`]: reading the visible region, managing
//! geometry sources and layers, and placing point markers.

use crate::{
    core::geo::{GeoPoint, ViewportBounds},
    data::geojson::FeatureCollection,
    layers::base::LayerSpec,
    Result,
};

/// Opaque handle to a marker owned by the widget
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct MarkerHandle(pub u64);

/// What a marker represents, so the widget can pick its look
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Development,
    Infrastructure,
}

/// Everything the widget needs to draw a point marker
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub coords: GeoPoint,
    pub kind: MarkerKind,
    pub label: String,
    pub icon: Option<String>,
}

/// Primitives the engine consumes from the underlying map widget.
///
/// Removal methods must tolerate ids that do not exist. Adding a source or a
/// layer whose id is already present is an error, which is why callers remove
/// before they add.
pub trait MapWidget {
    /// Currently visible region; `None` while the widget has no layout yet
    fn viewport_bounds(&self) -> Option<ViewportBounds>;

    fn add_overlay_source(&mut self, id: &str, data: &FeatureCollection) -> Result<()>;

    fn add_overlay_layer(&mut self, layer: &LayerSpec) -> Result<()>;

    fn remove_overlay_layer(&mut self, id: &str);

    fn remove_overlay_source(&mut self, id: &str);

    fn has_overlay_layer(&self, id: &str) -> bool;

    fn has_overlay_source(&self, id: &str) -> bool;

    fn create_point_marker(&mut self, marker: &MarkerSpec) -> Result<MarkerHandle>;

    fn destroy_marker(&mut self, handle: MarkerHandle);
}

impl<M: MapWidget + ?Sized> MapWidget for Box<M> {
    fn viewport_bounds(&self) -> Option<ViewportBounds> {
        (**self).viewport_bounds()
    }

    fn add_overlay_source(&mut self, id: &str, data: &FeatureCollection) -> Result<()> {
        (**self).add_overlay_source(id, data)
    }

    fn add_overlay_layer(&mut self, layer: &LayerSpec) -> Result<()> {
        (**self).add_overlay_layer(layer)
    }

    fn remove_overlay_layer(&mut self, id: &str) {
        (**self).remove_overlay_layer(id)
    }

    fn remove_overlay_source(&mut self, id: &str) {
        (**self).remove_overlay_source(id)
    }

    fn has_overlay_layer(&self, id: &str) -> bool {
        (**self).has_overlay_layer(id)
    }

    fn has_overlay_source(&self, id: &str) -> bool {
        (**self).has_overlay_source(id)
    }

    fn create_point_marker(&mut self, marker: &MarkerSpec) -> Result<MarkerHandle> {
        (**self).create_point_marker(marker)
    }

    fn destroy_marker(&mut self, handle: MarkerHandle) {
        (**self).destroy_marker(handle)
    }
}
