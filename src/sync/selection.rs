//! Selected development, search radius and amenity filters.

use crate::{
    constants::{DEFAULT_RADIUS_M, MAX_RADIUS_M, MIN_RADIUS_M, RADIUS_STEP_M},
    core::geo::GeoPoint,
    data::models::{Development, EntityId, FilterSet, InfrastructureItem, ObjType},
    MapError, Result,
};

/// Search radius in meters, always within `[1000, 10000]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RadiusSetting(u32);

impl RadiusSetting {
    /// Validates `meters`; out-of-range values are rejected, never clamped
    pub fn new(meters: u32) -> Result<Self> {
        if (MIN_RADIUS_M..=MAX_RADIUS_M).contains(&meters) {
            Ok(Self(meters))
        } else {
            Err(MapError::InvalidRadius {
                radius: meters,
                min: MIN_RADIUS_M,
                max: MAX_RADIUS_M,
            })
        }
    }

    /// Slider semantics: snaps a raw position to the nearest `step` and keeps
    /// it in range
    pub fn stepped(raw: u32, step: u32) -> Self {
        let step = step.max(1);
        let snapped = (raw.saturating_add(step / 2) / step).saturating_mul(step);
        Self(snapped.clamp(MIN_RADIUS_M, MAX_RADIUS_M))
    }

    pub fn meters(self) -> u32 {
        self.0
    }

    pub fn kilometers(self) -> f64 {
        self.0 as f64 / 1000.0
    }

    pub fn step_up(self) -> Self {
        Self((self.0 + RADIUS_STEP_M).min(MAX_RADIUS_M))
    }

    pub fn step_down(self) -> Self {
        Self(self.0.saturating_sub(RADIUS_STEP_M).max(MIN_RADIUS_M))
    }
}

impl Default for RadiusSetting {
    fn default() -> Self {
        Self(DEFAULT_RADIUS_M)
    }
}

/// Outcome of [`SelectionState::select`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Unchanged,
    Cleared,
    Changed,
}

/// Inputs of the infrastructure query and the amenities it returned.
///
/// The full response is cached; filter toggles recompute the visible list
/// from it without another request.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selected: Option<Development>,
    radius: RadiusSetting,
    filters: FilterSet,
    fetched: Vec<InfrastructureItem>,
    visible: Vec<InfrastructureItem>,
}

impl SelectionState {
    pub fn new(radius: RadiusSetting) -> Self {
        Self {
            radius,
            ..Self::default()
        }
    }

    pub fn select(&mut self, development: Option<Development>) -> SelectionChange {
        let Some(next) = development else {
            if self.selected.take().is_some() {
                self.clear_items();
                return SelectionChange::Cleared;
            }
            return SelectionChange::Unchanged;
        };
        if let Some(current) = &self.selected {
            if same_development(current, &next) {
                return SelectionChange::Unchanged;
            }
        }
        self.selected = Some(next);
        self.clear_items();
        SelectionChange::Changed
    }

    pub fn selected(&self) -> Option<&Development> {
        self.selected.as_ref()
    }

    /// Id of the selected development, needed by every per-selection request
    pub fn selected_id(&self) -> Result<EntityId> {
        let development = self.selected.as_ref().ok_or(MapError::NoDevelopmentSelected)?;
        development
            .id
            .clone()
            .ok_or_else(|| MapError::MissingIdentity(format!("development '{}'", development.name)))
    }

    pub fn center(&self) -> Option<GeoPoint> {
        self.selected.as_ref().map(|development| development.coords)
    }

    pub fn radius(&self) -> RadiusSetting {
        self.radius
    }

    /// Returns whether the radius actually changed
    pub fn set_radius(&mut self, meters: u32) -> Result<bool> {
        let radius = RadiusSetting::new(meters)?;
        if radius == self.radius {
            return Ok(false);
        }
        self.radius = radius;
        Ok(true)
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Flips a filter and refilters the cached response
    pub fn toggle_filter(&mut self, obj_type: ObjType) -> bool {
        let active = self.filters.toggle(obj_type);
        self.refilter();
        active
    }

    pub fn set_filters(&mut self, filters: FilterSet) {
        self.filters = filters;
        self.refilter();
    }

    /// Replaces the cached response wholesale
    pub fn apply_fetched(&mut self, items: Vec<InfrastructureItem>) {
        self.fetched = items;
        self.refilter();
    }

    pub fn clear_items(&mut self) {
        self.fetched.clear();
        self.visible.clear();
    }

    /// Amenities that pass the active filters
    pub fn visible(&self) -> &[InfrastructureItem] {
        &self.visible
    }

    pub fn fetched(&self) -> &[InfrastructureItem] {
        &self.fetched
    }

    fn refilter(&mut self) {
        self.visible = self
            .fetched
            .iter()
            .filter(|item| self.filters.matches(item))
            .cloned()
            .collect();
    }
}

fn same_development(a: &Development, b: &Development) -> bool {
    match (&a.id, &b.id) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}
