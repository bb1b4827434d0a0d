//! In-memory [`MapWidget`] for tests, demos and server-side use.
//!
//! It enforces the same rules a real widget does: duplicate source and layer
//! ids are rejected, a layer needs its source, and a source cannot go while
//! layers still use it. Every mutating call is recorded in order.

use crate::{
    core::geo::ViewportBounds,
    data::geojson::FeatureCollection,
    layers::base::LayerSpec,
    traits::{MapWidget, MarkerHandle, MarkerSpec},
    MapError, Result,
};
use fxhash::FxHashMap;

/// A recorded widget call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapOperation {
    AddSource(String),
    AddLayer(String),
    RemoveLayer(String),
    RemoveSource(String),
    CreateMarker(MarkerHandle),
    DestroyMarker(MarkerHandle),
}

#[derive(Debug, Default)]
pub struct HeadlessMap {
    bounds: Option<ViewportBounds>,
    sources: FxHashMap<String, FeatureCollection>,
    layers: Vec<LayerSpec>,
    markers: FxHashMap<MarkerHandle, MarkerSpec>,
    next_handle: u64,
    operations: Vec<MapOperation>,
    /// When set, marker creation fails; used to exercise error paths
    reject_markers: bool,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_viewport(bounds: ViewportBounds) -> Self {
        Self {
            bounds: Some(bounds),
            ..Self::default()
        }
    }

    pub fn set_viewport(&mut self, bounds: Option<ViewportBounds>) {
        self.bounds = bounds;
    }

    pub fn set_reject_markers(&mut self, reject: bool) {
        self.reject_markers = reject;
    }

    /// Layer ids in draw order
    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|layer| layer.id.as_str()).collect()
    }

    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn layers_for_source(&self, source: &str) -> Vec<&LayerSpec> {
        self.layers
            .iter()
            .filter(|layer| layer.source == source)
            .collect()
    }

    pub fn source(&self, id: &str) -> Option<&FeatureCollection> {
        self.sources.get(id)
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn marker(&self, handle: MarkerHandle) -> Option<&MarkerSpec> {
        self.markers.get(&handle)
    }

    pub fn markers(&self) -> impl Iterator<Item = (&MarkerHandle, &MarkerSpec)> {
        self.markers.iter()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn operations(&self) -> &[MapOperation] {
        &self.operations
    }

    pub fn clear_operations(&mut self) {
        self.operations.clear();
    }
}

impl MapWidget for HeadlessMap {
    fn viewport_bounds(&self) -> Option<ViewportBounds> {
        self.bounds
    }

    fn add_overlay_source(&mut self, id: &str, data: &FeatureCollection) -> Result<()> {
        if self.sources.contains_key(id) {
            return Err(MapError::Layer(format!("source '{id}' already exists")));
        }
        self.sources.insert(id.to_string(), data.clone());
        self.operations.push(MapOperation::AddSource(id.to_string()));
        Ok(())
    }

    fn add_overlay_layer(&mut self, layer: &LayerSpec) -> Result<()> {
        if self.has_overlay_layer(&layer.id) {
            return Err(MapError::Layer(format!("layer '{}' already exists", layer.id)));
        }
        if !self.sources.contains_key(&layer.source) {
            return Err(MapError::Layer(format!(
                "layer '{}' references missing source '{}'",
                layer.id, layer.source
            )));
        }
        self.layers.push(layer.clone());
        self.operations.push(MapOperation::AddLayer(layer.id.clone()));
        Ok(())
    }

    fn remove_overlay_layer(&mut self, id: &str) {
        let before = self.layers.len();
        self.layers.retain(|layer| layer.id != id);
        if self.layers.len() != before {
            self.operations.push(MapOperation::RemoveLayer(id.to_string()));
        }
    }

    fn remove_overlay_source(&mut self, id: &str) {
        if self.layers.iter().any(|layer| layer.source == id) {
            log::warn!("source '{}' is still in use, not removing", id);
            return;
        }
        if self.sources.remove(id).is_some() {
            self.operations.push(MapOperation::RemoveSource(id.to_string()));
        }
    }

    fn has_overlay_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|layer| layer.id == id)
    }

    fn has_overlay_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn create_point_marker(&mut self, marker: &MarkerSpec) -> Result<MarkerHandle> {
        if self.reject_markers {
            return Err(MapError::Marker("marker creation disabled".into()));
        }
        if !marker.coords.is_valid() {
            return Err(MapError::InvalidCoordinates(format!(
                "marker '{}' at {:?}",
                marker.label, marker.coords
            )));
        }
        self.next_handle += 1;
        let handle = MarkerHandle(self.next_handle);
        self.markers.insert(handle, marker.clone());
        self.operations.push(MapOperation::CreateMarker(handle));
        Ok(handle)
    }

    fn destroy_marker(&mut self, handle: MarkerHandle) {
        if self.markers.remove(&handle).is_some() {
            self.operations.push(MapOperation::DestroyMarker(handle));
        }
    }
}
