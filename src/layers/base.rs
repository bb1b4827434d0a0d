use crate::constants::ACCENT_COLOR;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    Line,
    Fill,
    Symbol,
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerType::Line => write!(f, "line"),
            LayerType::Fill => write!(f, "fill"),
            LayerType::Symbol => write!(f, "symbol"),
        }
    }
}

/// A styled geometry layer drawn from one overlay source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSpec {
    pub id: String,
    pub source: String,
    #[serde(rename = "type")]
    pub layer_type: LayerType,
    pub layout: Value,
    pub paint: Value,
}

impl LayerSpec {
    pub fn new(id: impl Into<String>, source: impl Into<String>, layer_type: LayerType) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            layer_type,
            layout: json!({}),
            paint: json!({}),
        }
    }

    pub fn with_layout(mut self, layout: Value) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_paint(mut self, paint: Value) -> Self {
        self.paint = paint;
        self
    }
}

pub fn route_line_layer(id: &str, source: &str) -> LayerSpec {
    LayerSpec::new(id, source, LayerType::Line)
        .with_layout(json!({ "line-join": "round", "line-cap": "round" }))
        .with_paint(json!({ "line-color": ACCENT_COLOR, "line-width": 4 }))
}

pub fn route_label_layer(id: &str, source: &str) -> LayerSpec {
    LayerSpec::new(id, source, LayerType::Symbol)
        .with_layout(json!({
            "text-field": ["get", "text"],
            "text-font": ["Open Sans Bold"],
            "text-size": 14,
            "text-anchor": "center"
        }))
        .with_paint(json!({
            "text-color": "#1f2937",
            "text-halo-color": "#ffffff",
            "text-halo-width": 1.5
        }))
}

pub fn radius_fill_layer(id: &str, source: &str) -> LayerSpec {
    LayerSpec::new(id, source, LayerType::Fill)
        .with_paint(json!({ "fill-color": ACCENT_COLOR, "fill-opacity": 0.1 }))
}

pub fn radius_line_layer(id: &str, source: &str) -> LayerSpec {
    LayerSpec::new(id, source, LayerType::Line).with_paint(json!({
        "line-color": ACCENT_COLOR,
        "line-width": 2,
        "line-dasharray": [2, 2]
    }))
}
