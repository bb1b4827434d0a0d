//! The single live route between the selected development and an amenity.

use crate::data::models::{EntityId, RouteResult};

#[derive(Debug, Clone, Default)]
pub struct RouteFlow {
    current: Option<RouteResult>,
    /// Amenity of the latest request, kept while the request is in flight
    target: Option<EntityId>,
}

impl RouteFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new request. The previous route stays visible until the
    /// response arrives.
    pub fn request(&mut self, amenity_id: EntityId) {
        self.target = Some(amenity_id);
    }

    pub fn replace(&mut self, route: RouteResult) {
        self.current = Some(route);
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.target = None;
    }

    pub fn current(&self) -> Option<&RouteResult> {
        self.current.as_ref()
    }

    pub fn target(&self) -> Option<&EntityId> {
        self.target.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_previous_route_survives_new_request() {
        let mut flow = RouteFlow::new();
        flow.replace(RouteResult::default());
        flow.request(EntityId::from("n42"));

        assert!(flow.current().is_some());
        assert_eq!(flow.target(), Some(&EntityId::from("n42")));

        flow.clear();
        assert!(flow.current().is_none());
        assert!(flow.target().is_none());
    }
}
