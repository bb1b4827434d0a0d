//! Keeps backend queries, in-memory state and the map in step.

pub mod generation;
pub mod route;
pub mod selection;
pub mod session;
pub mod state;
