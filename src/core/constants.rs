//! Core constants taken from the map page and API client defaults.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// Default backend root.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5001/api/v1";

/// Smallest accepted infrastructure search radius, in meters.
pub const MIN_RADIUS_M: u32 = 1_000;

/// Largest accepted infrastructure search radius, in meters.
pub const MAX_RADIUS_M: u32 = 10_000;

/// Radius used before the user touches the slider.
pub const DEFAULT_RADIUS_M: u32 = 3_000;

/// Slider granularity.
pub const RADIUS_STEP_M: u32 = 500;

/// Vertices per generated circle (the ring gets one extra closing vertex).
pub const DEFAULT_CIRCLE_SEGMENTS: usize = 64;

/// Kilometers per degree of latitude.
pub const KM_PER_DEGREE_LAT: f64 = 110.574;

/// Kilometers per degree of longitude at the equator.
pub const KM_PER_DEGREE_LON: f64 = 111.32;

/// Initial map center (lat, lon).
pub const DEFAULT_CENTER: (f64, f64) = (61.258726, 73.423043);

/// Initial map zoom.
pub const DEFAULT_ZOOM: f64 = 12.0;

/// Accent colour shared by the route line and the radius circle.
pub const ACCENT_COLOR: &str = "#3b82f6";

/// Heatmap colour ramp over `total_weight`.
pub const HEATMAP_STOPS: [(f64, &str); 6] = [
    (0.0, "#ffffff"),
    (0.2, "#dbe3f7"),
    (0.4, "#a5b8e3"),
    (0.6, "#5e81c5"),
    (0.8, "#3b4cc0"),
    (1.0, "#2a1659"),
];

/// Heatmap fill opacity.
pub const HEATMAP_OPACITY: f64 = 0.5;
