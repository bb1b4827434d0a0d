//! Backend access: the [`Backend`] seam and its HTTP implementation.

pub mod backend;
pub mod client;

pub use backend::Backend;
