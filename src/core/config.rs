//! Configuration for a map session
//!
//! Groups the knobs a host application tunes: where the backend lives and how
//! long to wait for it, the initial camera, and the defaults of the
//! infrastructure search (radius, circle resolution, saved selection scope).

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_CENTER, DEFAULT_CIRCLE_SEGMENTS, DEFAULT_RADIUS_M, DEFAULT_ZOOM,
    MAX_RADIUS_M, MIN_RADIUS_M, RADIUS_STEP_M,
};
use crate::core::geo::GeoPoint;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub api: ApiConfig,
    pub view: ViewConfig,
    pub search: SearchConfig,
}

impl SessionConfig {
    /// Parses a JSON document, filling absent sections with defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(MapError::Config("api.base_url must not be empty".into()));
        }
        if !(MIN_RADIUS_M..=MAX_RADIUS_M).contains(&self.search.default_radius_m) {
            return Err(MapError::Config(format!(
                "search.default_radius_m {} is outside [{MIN_RADIUS_M}, {MAX_RADIUS_M}]",
                self.search.default_radius_m
            )));
        }
        if self.search.radius_step_m == 0 {
            return Err(MapError::Config("search.radius_step_m must be positive".into()));
        }
        if self.search.circle_segments < 3 {
            return Err(MapError::Config(format!(
                "search.circle_segments must be at least 3, got {}",
                self.search.circle_segments
            )));
        }
        if !self.view.center.is_valid() {
            return Err(MapError::Config(format!(
                "view.center {:?} is not a valid coordinate",
                self.view.center
            )));
        }
        Ok(())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api.base_url = base_url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.api.request_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_selection_id(mut self, selection_id: impl Into<String>) -> Self {
        self.search.selection_id = Some(selection_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub user_agent: String,
    /// No timeout unless set; stale responses are handled by supersession.
    pub request_timeout_ms: Option<u64>,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            user_agent: concat!("estatemap/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub center: GeoPoint,
    pub zoom: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            center: GeoPoint::new(DEFAULT_CENTER.0, DEFAULT_CENTER.1),
            zoom: DEFAULT_ZOOM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_radius_m: u32,
    pub radius_step_m: u32,
    pub circle_segments: usize,
    /// Saved selection the map is scoped to (`/map?selectionId=...`)
    pub selection_id: Option<String>,
    pub search_query: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_radius_m: DEFAULT_RADIUS_M,
            radius_step_m: RADIUS_STEP_M,
            circle_segments: DEFAULT_CIRCLE_SEGMENTS,
            selection_id: None,
            search_query: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.search.default_radius_m, 3000);
        assert_eq!(config.api.request_timeout(), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SessionConfig::from_json_str(
            r#"{ "api": { "request_timeout_ms": 2500 }, "search": { "selection_id": "sel-7" } }"#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.api.request_timeout(), Some(Duration::from_millis(2500)));
        assert_eq!(config.search.selection_id.as_deref(), Some("sel-7"));
        assert_eq!(config.search.circle_segments, 64);
    }

    #[test]
    fn test_out_of_range_default_radius_is_rejected() {
        let result = SessionConfig::from_json_str(r#"{ "search": { "default_radius_m": 500 } }"#);
        assert!(matches!(result, Err(MapError::Config(_))));
    }
}
