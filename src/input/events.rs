use crate::traits::MarkerHandle;
use serde::{Deserialize, Serialize};

/// Events raised by the map widget that the session reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapEvent {
    /// The widget finished its first layout and can report bounds
    Load,
    /// Pan ended
    MoveEnd,
    /// Zoom ended
    ZoomEnd,
    /// A point marker was clicked
    MarkerClick { handle: MarkerHandle },
    /// The widget is being removed from the page
    Remove,
}

impl MapEvent {
    /// Whether the visible region may have changed
    pub fn is_viewport_change(&self) -> bool {
        matches!(self, MapEvent::Load | MapEvent::MoveEnd | MapEvent::ZoomEnd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_change_events() {
        assert!(MapEvent::Load.is_viewport_change());
        assert!(MapEvent::MoveEnd.is_viewport_change());
        assert!(MapEvent::ZoomEnd.is_viewport_change());
        assert!(!MapEvent::Remove.is_viewport_change());
        assert!(!MapEvent::MarkerClick {
            handle: MarkerHandle(1)
        }
        .is_viewport_change());
    }
}
