use async_trait::async_trait;
use estatemap::prelude::*;

/// Backend answering from memory so the walk-through runs without a server
struct DemoBackend {
    developments: Vec<Development>,
}

#[async_trait]
impl Backend for DemoBackend {
    async fn search_developments(
        &self,
        bbox: &BoundingBox,
        _selection_id: Option<&str>,
        _search_query: Option<&str>,
    ) -> estatemap::Result<Vec<Development>> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(self
            .developments
            .iter()
            .filter(|development| bbox.contains(&development.coords))
            .cloned()
            .collect())
    }

    async fn fetch_infrastructure_heatmap(
        &self,
        bbox: &BoundingBox,
        _selection_id: Option<&str>,
    ) -> estatemap::Result<Vec<HeatmapCell>> {
        let center = bbox.center();
        let ring = generate_circle(center, 1500.0)?;
        Ok(vec![HeatmapCell {
            geometry: GeoJsonGeometry::polygon(ring.points()),
            total_weight: 0.6,
        }])
    }

    async fn fetch_infrastructure_radius(
        &self,
        development_id: &EntityId,
        radius_m: u32,
    ) -> estatemap::Result<Vec<InfrastructureItem>> {
        let center = self
            .developments
            .iter()
            .find(|development| development.id.as_ref() == Some(development_id))
            .map(|development| development.coords)
            .ok_or_else(|| MapError::NotFound(format!("development {development_id}")))?;
        let offset = radius_m as f64 / 200_000.0;
        Ok(vec![
            InfrastructureItem::new(
                "school-1",
                ObjType::School,
                "Школа №5",
                GeoPoint::new(center.lat + offset, center.lon),
            ),
            InfrastructureItem::new(
                "sport-1",
                ObjType::Sport,
                "Стадион Нефтяник",
                GeoPoint::new(center.lat, center.lon - offset),
            ),
        ])
    }

    async fn build_route_between_points(
        &self,
        _development_id: &EntityId,
        _amenity_id: &EntityId,
    ) -> estatemap::Result<RouteResult> {
        Ok(RouteResult {
            geometry: vec![
                GeoPoint::new(61.2587, 73.4230),
                GeoPoint::new(61.2600, 73.4235),
                GeoPoint::new(61.2613, 73.4230),
            ],
            distance: Some(RouteDistance::Text("320 м".to_string())),
            ..Default::default()
        })
    }
}

/// Drives a session against the headless widget without any UI
#[tokio::main]
async fn main() -> estatemap::Result<()> {
    env_logger::init();

    println!("Estatemap headless walk-through");
    println!("===============================");

    let backend = Arc::new(DemoBackend {
        developments: vec![
            Development::new(1i64, "ЖК Северный", GeoPoint::new(61.2587, 73.4230)),
            Development::new(2i64, "ЖК Речной", GeoPoint::new(61.2490, 73.3960)),
            Development::new(3i64, "ЖК Дальний", GeoPoint::new(61.3500, 73.6000)),
        ],
    });

    let viewport = ViewportBounds::from_coords(61.20, 73.35, 61.30, 73.50);
    let map = HeadlessMap::with_viewport(viewport);
    let mut session = MapSession::new(map, backend, SessionConfig::default())?;

    session.handle_event(MapEvent::Load)?;
    session.settle().await;
    println!(
        "Loaded: {} developments, {} heatmap cells",
        session.developments().len(),
        session.heatmap().map_or(0, |cells| cells.len())
    );

    let Some(first) = session.developments().first().cloned() else {
        println!("No developments in view");
        return Ok(());
    };
    let Some(handle) = session.development_marker(&first) else {
        println!("Development {} has no marker", first.name);
        return Ok(());
    };

    if let MarkerClick::Development(development) = session.click_marker(handle)? {
        println!("Selected {}", development.name);
    }
    session.settle().await;
    println!("Amenities in 3 km: {}", session.infrastructure().len());

    session.set_radius(5000)?;
    session.settle().await;
    println!("Amenities in 5 km: {}", session.infrastructure().len());

    if let Some(amenity) = session.infrastructure().first().cloned() {
        session.request_route(amenity.clone())?;
        session.settle().await;
        let distance = session
            .route()
            .and_then(|route| route.distance.as_ref())
            .and_then(RouteDistance::label_text);
        println!("Route to {}: {:?}", amenity.name, distance);
    }

    session.toggle_filter(ObjType::School)?;
    println!(
        "Schools hidden, {} amenities visible",
        session.infrastructure().len()
    );

    println!("Layers on the map: {:?}", session.map().layer_ids());

    session.map_mut().set_viewport(Some(ViewportBounds::from_coords(
        61.30, 73.55, 61.40, 73.70,
    )));
    session.handle_event(MapEvent::MoveEnd)?;
    session.settle().await;
    println!(
        "After panning: {} developments",
        session.developments().len()
    );

    session.handle_event(MapEvent::Remove)?;
    println!(
        "Torn down: {} layers, {} markers left",
        session.map().layer_ids().len(),
        session.map().marker_count()
    );

    Ok(())
}
