//! Map overlays: styled geometry layers and point markers.

pub mod base;
pub mod heatmap;
pub mod manager;
pub mod marker;
