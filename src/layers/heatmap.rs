use crate::constants::{HEATMAP_OPACITY, HEATMAP_STOPS};
use crate::data::geojson::{FeatureCollection, GeoJsonFeature};
use crate::data::models::HeatmapCell;
use crate::layers::base::{LayerSpec, LayerType};
use serde_json::{json, Value};

/// An opaque sRGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(digits.get(range)?, 16).ok();
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

fn stop_colors() -> [(f64, Rgb); 6] {
    HEATMAP_STOPS.map(|(weight, hex)| (weight, Rgb::from_hex(hex).unwrap_or(Rgb::new(0, 0, 0))))
}

/// Linear interpolation of the heatmap ramp at `weight`, clamped to `[0, 1]`
pub fn heatmap_color(weight: f64) -> Rgb {
    let gradient = stop_colors();
    let weight = if weight.is_finite() { weight.clamp(0.0, 1.0) } else { 0.0 };

    for pair in gradient.windows(2) {
        let (t1, color1) = pair[0];
        let (t2, color2) = pair[1];

        if weight >= t1 && weight <= t2 {
            let t = (weight - t1) / (t2 - t1);
            let mix = |a: u8, b: u8| (a as f64 * (1.0 - t) + b as f64 * t).round() as u8;
            return Rgb::new(
                mix(color1.r, color2.r),
                mix(color1.g, color2.g),
                mix(color1.b, color2.b),
            );
        }
    }

    gradient[gradient.len() - 1].1
}

/// Style expression equivalent of [`heatmap_color`], for widgets that evaluate
/// data-driven styling themselves
pub fn fill_color_expression() -> Value {
    let mut expression = vec![json!("interpolate"), json!(["linear"]), json!(["get", "total_weight"])];
    for (weight, hex) in HEATMAP_STOPS {
        expression.push(json!(weight));
        expression.push(json!(hex));
    }
    Value::Array(expression)
}

pub fn heatmap_layer(id: &str, source: &str) -> LayerSpec {
    LayerSpec::new(id, source, LayerType::Fill).with_paint(json!({
        "fill-color": fill_color_expression(),
        "fill-opacity": HEATMAP_OPACITY,
        "fill-outline-color": "rgba(0, 0, 0, 0.5)"
    }))
}

/// Heatmap cells as an overlay source. Each feature carries its weight and the
/// precomputed `fill_color`.
pub fn heatmap_source(cells: &[HeatmapCell]) -> FeatureCollection {
    FeatureCollection::new(
        cells
            .iter()
            .map(|cell| {
                let weight = cell.clamped_weight();
                GeoJsonFeature::new(cell.geometry.clone())
                    .with_property("total_weight", weight)
                    .with_property("fill_color", heatmap_color(weight).to_hex())
            })
            .collect(),
    )
}
