use crate::{
    data::{
        geojson::FeatureCollection,
        models::{HeatmapCell, RouteResult},
    },
    geometry::{
        route::{route_label, RouteLabel},
        Ring,
    },
    layers::{
        base::{
            radius_fill_layer, radius_line_layer, route_label_layer, route_line_layer, LayerSpec,
        },
        heatmap::{heatmap_layer, heatmap_source},
    },
    traits::MapWidget,
    Result,
};

/// Named overlay positions on the map, each backed by one source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OverlaySlot {
    Route,
    RouteLabel,
    Heatmap,
    RadiusCircle,
}

impl OverlaySlot {
    pub const ALL: [OverlaySlot; 4] = [
        OverlaySlot::Route,
        OverlaySlot::RouteLabel,
        OverlaySlot::Heatmap,
        OverlaySlot::RadiusCircle,
    ];

    pub fn source_id(&self) -> &'static str {
        match self {
            OverlaySlot::Route => "route",
            OverlaySlot::RouteLabel => "route-label",
            OverlaySlot::Heatmap => "infra-heatmap",
            OverlaySlot::RadiusCircle => "radius-circle",
        }
    }

    pub fn layer_ids(&self) -> &'static [&'static str] {
        match self {
            OverlaySlot::Route => &["route"],
            OverlaySlot::RouteLabel => &["route-label"],
            OverlaySlot::Heatmap => &["infra-heatmap"],
            OverlaySlot::RadiusCircle => &["radius-circle-fill", "radius-circle-line"],
        }
    }

    fn layers(&self) -> Vec<LayerSpec> {
        let source = self.source_id();
        match self {
            OverlaySlot::Route => vec![route_line_layer("route", source)],
            OverlaySlot::RouteLabel => vec![route_label_layer("route-label", source)],
            OverlaySlot::Heatmap => vec![heatmap_layer("infra-heatmap", source)],
            OverlaySlot::RadiusCircle => vec![
                radius_fill_layer("radius-circle-fill", source),
                radius_line_layer("radius-circle-line", source),
            ],
        }
    }
}

/// The overlays that should be on the map; `None` means the slot is empty
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesiredOverlays {
    pub route: Option<RouteResult>,
    pub route_label: Option<RouteLabel>,
    pub heatmap: Option<Vec<HeatmapCell>>,
    pub radius_circle: Option<Ring>,
}

impl DesiredOverlays {
    /// Builds the desired set, deriving the route label from the route
    pub fn new(
        route: Option<&RouteResult>,
        heatmap: Option<&[HeatmapCell]>,
        radius_circle: Option<Ring>,
    ) -> Self {
        Self {
            route: route.cloned(),
            route_label: route.and_then(route_label),
            heatmap: heatmap.map(<[HeatmapCell]>::to_vec),
            radius_circle,
        }
    }

    fn source_for(&self, slot: OverlaySlot) -> Option<FeatureCollection> {
        match slot {
            OverlaySlot::Route => self.route.as_ref().map(RouteResult::to_feature_collection),
            OverlaySlot::RouteLabel => self
                .route_label
                .as_ref()
                .map(RouteLabel::to_feature_collection),
            OverlaySlot::Heatmap => self.heatmap.as_deref().map(heatmap_source),
            OverlaySlot::RadiusCircle => self
                .radius_circle
                .as_ref()
                .map(Ring::to_feature_collection),
        }
    }
}

/// Keeps the widget's geometry layers in line with a [`DesiredOverlays`] set.
///
/// Present slots are always replaced: old layers and source come off before
/// the new source and layers go on. Absent slots are cleared. Removal is
/// checked against the widget itself, so a layer left behind by anyone is
/// still cleaned up.
pub struct OverlayReconciler {
    installed: fxhash::FxHashSet<OverlaySlot>,
}

impl OverlayReconciler {
    pub fn new() -> Self {
        Self {
            installed: fxhash::FxHashSet::default(),
        }
    }

    /// Reconciles every slot
    pub fn reconcile<M: MapWidget + ?Sized>(
        &mut self,
        map: &mut M,
        desired: &DesiredOverlays,
    ) -> Result<()> {
        self.reconcile_slots(map, desired, &OverlaySlot::ALL)
    }

    /// Reconciles only the given slots, leaving the others untouched.
    ///
    /// A slot that fails to install does not hold back the rest; every slot
    /// is reconciled and the first failure is returned afterwards.
    pub fn reconcile_slots<M: MapWidget + ?Sized>(
        &mut self,
        map: &mut M,
        desired: &DesiredOverlays,
        slots: &[OverlaySlot],
    ) -> Result<()> {
        let mut first_error = None;
        for slot in slots {
            self.clear_slot(map, *slot);
            let Some(source) = desired.source_for(*slot) else {
                continue;
            };
            if let Err(err) = self.install(map, *slot, &source) {
                log::warn!("failed to install overlay slot {:?}: {}", slot, err);
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Removes every overlay this reconciler manages
    pub fn clear_all<M: MapWidget + ?Sized>(&mut self, map: &mut M) {
        for slot in OverlaySlot::ALL {
            self.clear_slot(map, slot);
        }
    }

    /// Idempotent: clearing an empty slot is a no-op
    pub fn clear_slot<M: MapWidget + ?Sized>(&mut self, map: &mut M, slot: OverlaySlot) {
        for layer_id in slot.layer_ids() {
            if map.has_overlay_layer(layer_id) {
                map.remove_overlay_layer(layer_id);
            }
        }
        if map.has_overlay_source(slot.source_id()) {
            map.remove_overlay_source(slot.source_id());
        }
        if self.installed.remove(&slot) {
            log::debug!("cleared overlay slot {:?}", slot);
        }
    }

    fn install<M: MapWidget + ?Sized>(
        &mut self,
        map: &mut M,
        slot: OverlaySlot,
        source: &FeatureCollection,
    ) -> Result<()> {
        map.add_overlay_source(slot.source_id(), source)?;
        for layer in slot.layers() {
            if let Err(err) = map.add_overlay_layer(&layer) {
                // Leave nothing half-installed
                self.clear_slot(map, slot);
                return Err(err);
            }
        }
        self.installed.insert(slot);
        log::debug!(
            "installed overlay slot {:?} ({} features)",
            slot,
            source.len()
        );
        Ok(())
    }

    pub fn is_installed(&self, slot: OverlaySlot) -> bool {
        self.installed.contains(&slot)
    }

    /// Gets the number of installed slots
    pub fn len(&self) -> usize {
        self.installed.len()
    }

    /// Checks if the reconciler has nothing installed
    pub fn is_empty(&self) -> bool {
        self.installed.is_empty()
    }
}

impl Default for OverlayReconciler {
    fn default() -> Self {
        Self::new()
    }
}
