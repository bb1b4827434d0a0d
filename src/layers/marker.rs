use crate::{
    core::geo::GeoPoint,
    data::models::{Development, EntityId, InfrastructureItem},
    traits::{MapWidget, MarkerHandle, MarkerKind, MarkerSpec},
    Result,
};
use fxhash::FxHashMap;

/// Anything that can be shown as a point marker
pub trait MarkerEntity: Clone {
    /// Stable identity, when the backend provided one
    fn marker_id(&self) -> Option<EntityId>;

    fn coords(&self) -> GeoPoint;

    fn kind(&self) -> MarkerKind;

    fn label(&self) -> String;

    fn icon(&self) -> Option<String> {
        None
    }

    fn to_marker_spec(&self) -> MarkerSpec {
        MarkerSpec {
            coords: self.coords(),
            kind: self.kind(),
            label: self.label(),
            icon: self.icon(),
        }
    }
}

impl MarkerEntity for Development {
    fn marker_id(&self) -> Option<EntityId> {
        self.id.clone()
    }

    fn coords(&self) -> GeoPoint {
        self.coords
    }

    fn kind(&self) -> MarkerKind {
        MarkerKind::Development
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

impl MarkerEntity for InfrastructureItem {
    fn marker_id(&self) -> Option<EntityId> {
        self.id.clone()
    }

    fn coords(&self) -> GeoPoint {
        self.coords
    }

    fn kind(&self) -> MarkerKind {
        MarkerKind::Infrastructure
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn icon(&self) -> Option<String> {
        Some(self.obj_type.icon().to_string())
    }
}

/// Identity used to match entities across syncs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarkerKey {
    /// Numeric and textual ids stay distinct: `1` and `"1"` are two keys
    Id(EntityId),
    /// Position in the list; used only for entities without an id
    Index(usize),
}

impl MarkerKey {
    fn for_entity<T: MarkerEntity>(entity: &T, index: usize) -> Self {
        match entity.marker_id() {
            Some(id) => MarkerKey::Id(id),
            None => MarkerKey::Index(index),
        }
    }
}

/// What a [`MarkerManager::sync`] call did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub retained: usize,
    pub destroyed: usize,
    pub failed: usize,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.destroyed == 0 && self.failed == 0
    }
}

#[derive(Debug, Clone)]
struct Placed<T> {
    handle: MarkerHandle,
    entity: T,
}

/// Keeps one widget marker per entity.
///
/// Markers are diffed by id: an entity that is still present at the same
/// position keeps its marker, anything else is created or destroyed. A marker
/// is never shown for an entity that is no longer in the list.
pub struct MarkerManager<T: MarkerEntity> {
    placed: FxHashMap<MarkerKey, Placed<T>>,
    by_handle: FxHashMap<MarkerHandle, MarkerKey>,
}

impl<T: MarkerEntity> MarkerManager<T> {
    pub fn new() -> Self {
        Self {
            placed: FxHashMap::default(),
            by_handle: FxHashMap::default(),
        }
    }

    /// Brings the widget's markers in line with `entities`.
    ///
    /// A marker the widget refuses to create is logged and counted in
    /// [`SyncReport::failed`]; the rest of the list still syncs.
    pub fn sync<M: MapWidget + ?Sized>(&mut self, map: &mut M, entities: &[T]) -> SyncReport {
        let mut report = SyncReport::default();
        let mut next: FxHashMap<MarkerKey, Placed<T>> = FxHashMap::default();
        let mut anonymous = 0;

        for (index, entity) in entities.iter().enumerate() {
            let key = MarkerKey::for_entity(entity, index);
            if matches!(key, MarkerKey::Index(_)) {
                anonymous += 1;
            }
            if next.contains_key(&key) {
                log::warn!("duplicate marker id {:?}, keeping the first", key);
                continue;
            }

            match self.placed.remove(&key) {
                Some(mut placed) if placed.entity.coords() == entity.coords() => {
                    placed.entity = entity.clone();
                    next.insert(key, placed);
                    report.retained += 1;
                    continue;
                }
                Some(moved) => {
                    self.destroy(map, moved.handle);
                    report.destroyed += 1;
                }
                None => {}
            }

            match self.create(map, entity) {
                Ok(handle) => {
                    next.insert(
                        key,
                        Placed {
                            handle,
                            entity: entity.clone(),
                        },
                    );
                    report.created += 1;
                }
                Err(err) => {
                    log::warn!("failed to create marker for {:?}: {}", key, err);
                    report.failed += 1;
                }
            }
        }

        let departed: Vec<MarkerHandle> = self.placed.drain().map(|(_, p)| p.handle).collect();
        for handle in departed {
            self.destroy(map, handle);
            report.destroyed += 1;
        }

        if anonymous > 0 {
            log::debug!(
                "{} markers keyed by position; they are recreated when the list reorders",
                anonymous
            );
        }

        self.by_handle = next
            .iter()
            .map(|(key, placed)| (placed.handle, key.clone()))
            .collect();
        self.placed = next;

        log::debug!(
            "marker sync: {} created, {} retained, {} destroyed, {} failed",
            report.created,
            report.retained,
            report.destroyed,
            report.failed
        );
        report
    }

    fn create<M: MapWidget + ?Sized>(&mut self, map: &mut M, entity: &T) -> Result<MarkerHandle> {
        map.create_point_marker(&entity.to_marker_spec())
    }

    fn destroy<M: MapWidget + ?Sized>(&mut self, map: &mut M, handle: MarkerHandle) {
        map.destroy_marker(handle);
        self.by_handle.remove(&handle);
    }

    /// The entity behind a marker, if the marker is still live
    pub fn entity(&self, handle: MarkerHandle) -> Option<&T> {
        let key = self.by_handle.get(&handle)?;
        self.placed.get(key).map(|placed| &placed.entity)
    }

    /// Invokes `action` with the clicked entity. Clicks on stale handles are
    /// ignored and return `false`.
    pub fn on_click<F: FnOnce(&T)>(&self, handle: MarkerHandle, action: F) -> bool {
        match self.entity(handle) {
            Some(entity) => {
                action(entity);
                true
            }
            None => {
                log::debug!("ignoring click on stale marker {:?}", handle);
                false
            }
        }
    }

    pub fn handles(&self) -> Vec<MarkerHandle> {
        let mut handles: Vec<MarkerHandle> = self.by_handle.keys().copied().collect();
        handles.sort();
        handles
    }

    /// Destroys every marker
    pub fn teardown<M: MapWidget + ?Sized>(&mut self, map: &mut M) {
        for (_, placed) in self.placed.drain() {
            map.destroy_marker(placed.handle);
        }
        self.by_handle.clear();
    }

    pub fn len(&self) -> usize {
        self.placed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }
}

impl<T: MarkerEntity> Default for MarkerManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::ObjType;
    use crate::headless::{HeadlessMap, MapOperation};

    fn dev(id: i64, lat: f64) -> Development {
        Development::new(id, format!("ЖК {id}"), GeoPoint::new(lat, 73.4))
    }

    #[test]
    fn test_sync_creates_and_destroys() {
        let mut map = HeadlessMap::new();
        let mut markers = MarkerManager::new();

        let report = markers.sync(&mut map, &[dev(1, 61.0), dev(2, 61.1)]);
        assert_eq!(report.created, 2);
        assert_eq!(map.marker_count(), 2);

        let report = markers.sync(&mut map, &[dev(2, 61.1), dev(3, 61.2)]);
        assert_eq!(report.retained, 1);
        assert_eq!(report.created, 1);
        assert_eq!(report.destroyed, 1);
        assert_eq!(map.marker_count(), 2);
        assert_eq!(markers.len(), 2);
    }

    #[test]
    fn test_unchanged_list_keeps_handles() {
        let mut map = HeadlessMap::new();
        let mut markers = MarkerManager::new();
        let list = [dev(1, 61.0), dev(2, 61.1)];

        markers.sync(&mut map, &list);
        let before = markers.handles();
        map.clear_operations();

        let report = markers.sync(&mut map, &list);
        assert!(report.is_noop());
        assert_eq!(markers.handles(), before);
        assert!(map.operations().is_empty());
    }

    #[test]
    fn test_moved_entity_gets_a_new_marker() {
        let mut map = HeadlessMap::new();
        let mut markers = MarkerManager::new();

        markers.sync(&mut map, &[dev(1, 61.0)]);
        let old = markers.handles()[0];

        let report = markers.sync(&mut map, &[dev(1, 61.5)]);
        assert_eq!(report.created, 1);
        assert_eq!(report.destroyed, 1);
        assert!(markers.entity(old).is_none());
        assert_eq!(map.marker_count(), 1);
    }

    #[test]
    fn test_duplicate_ids_are_skipped() {
        let mut map = HeadlessMap::new();
        let mut markers = MarkerManager::new();

        let report = markers.sync(&mut map, &[dev(1, 61.0), dev(1, 61.0)]);
        assert_eq!(report.created, 1);
        assert_eq!(map.marker_count(), 1);
    }

    #[test]
    fn test_numeric_and_text_ids_are_distinct() {
        let mut map = HeadlessMap::new();
        let mut markers = MarkerManager::new();
        let school = InfrastructureItem::new("1", ObjType::School, "Школа", GeoPoint::new(61.0, 73.0));
        let stadium = InfrastructureItem::new(1i64, ObjType::Sport, "Стадион", GeoPoint::new(61.1, 73.1));

        let report = markers.sync(&mut map, &[school.clone(), stadium.clone()]);
        assert_eq!(report.created, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(map.marker_count(), 2);

        let report = markers.sync(&mut map, &[stadium, school]);
        assert_eq!(report.retained, 2);
        assert!(report.is_noop());
    }

    #[test]
    fn test_click_dispatch_and_stale_handles() {
        let mut map = HeadlessMap::new();
        let mut markers = MarkerManager::new();
        let school = InfrastructureItem::new("n7", ObjType::School, "Школа №7", GeoPoint::new(61.0, 73.0));

        markers.sync(&mut map, &[school.clone()]);
        let handle = markers.handles()[0];

        let mut clicked = None;
        assert!(markers.on_click(handle, |item| clicked = Some(item.clone())));
        assert_eq!(clicked, Some(school));

        markers.sync(&mut map, &[]);
        assert!(!markers.on_click(handle, |_| panic!("stale marker dispatched")));
    }

    #[test]
    fn test_entities_without_id_use_position() {
        let mut map = HeadlessMap::new();
        let mut markers = MarkerManager::new();
        let mut anonymous = dev(1, 61.0);
        anonymous.id = None;

        markers.sync(&mut map, &[anonymous.clone()]);
        let report = markers.sync(&mut map, &[anonymous]);
        assert_eq!(report.retained, 1);
    }

    #[test]
    fn test_teardown_removes_everything() {
        let mut map = HeadlessMap::new();
        let mut markers = MarkerManager::new();
        markers.sync(&mut map, &[dev(1, 61.0), dev(2, 61.1)]);

        markers.teardown(&mut map);
        assert_eq!(map.marker_count(), 0);
        assert!(markers.is_empty());
        assert!(map
            .operations()
            .iter()
            .any(|op| matches!(op, MapOperation::DestroyMarker(_))));
    }
}
