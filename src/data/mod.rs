pub mod geojson;
pub mod models;
