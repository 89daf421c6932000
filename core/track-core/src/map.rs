//! Map plan for a tracked shipment.
//!
//! Geocoding and the map widget are external; this module only decides which
//! markers, route and viewport the widget should show for the coordinates
//! the geocoder returned.

use serde::Serialize;
use shiptrack_protocol::ShipmentRecord;
use tracing::warn;

use crate::config::MapConfig;
use crate::services::Geocoder;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerRole {
    Origin,
    Destination,
    Current,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub role: MarkerRole,
    pub position: Coordinates,
    pub label: String,
    /// Whether the popup starts open.
    pub open: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Viewport {
    FitBounds {
        south_west: Coordinates,
        north_east: Coordinates,
    },
    Center {
        center: Coordinates,
        zoom: u8,
    },
    /// Leave whatever the widget currently shows.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPlan {
    pub markers: Vec<MapMarker>,
    pub route: Option<(Coordinates, Coordinates)>,
    pub viewport: Viewport,
}

/// Geocoded positions for a shipment's three locations.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResolvedLocations {
    pub origin: Option<Coordinates>,
    pub destination: Option<Coordinates>,
    pub current: Option<Coordinates>,
}

/// Geocodes origin, destination and current location.
///
/// A failed lookup only drops that marker.
pub fn resolve_locations<G: Geocoder>(geocoder: &G, shipment: &ShipmentRecord) -> ResolvedLocations {
    ResolvedLocations {
        origin: geocode_field(geocoder, shipment.origin.as_deref(), "origin"),
        destination: geocode_field(geocoder, shipment.destination.as_deref(), "destination"),
        current: geocode_field(geocoder, shipment.current_location.as_deref(), "current_location"),
    }
}

fn geocode_field<G: Geocoder>(geocoder: &G, query: Option<&str>, field: &str) -> Option<Coordinates> {
    let query = query.map(str::trim).filter(|q| !q.is_empty())?;
    match geocoder.geocode(query) {
        Ok(found) => found,
        Err(err) => {
            warn!(field = field, query = %query, error = %err, "Geocoding failed");
            None
        }
    }
}

/// Lays out markers and viewport.
///
/// With `use_fallback` an empty plan centers on the configured default;
/// without it (live updates) the current view is kept.
pub fn plan_map(
    shipment: &ShipmentRecord,
    resolved: &ResolvedLocations,
    config: &MapConfig,
    use_fallback: bool,
) -> MapPlan {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    let mut markers = Vec::new();

    if let Some(position) = resolved.origin {
        markers.push(MapMarker {
            role: MarkerRole::Origin,
            position,
            label: format!("Origin: {}", text(&shipment.origin)),
            open: false,
        });
    }
    if let Some(position) = resolved.destination {
        markers.push(MapMarker {
            role: MarkerRole::Destination,
            position,
            label: format!("Destination: {}", text(&shipment.destination)),
            open: false,
        });
    }
    if let Some(position) = resolved.current {
        markers.push(MapMarker {
            role: MarkerRole::Current,
            position,
            label: format!("Current Location: {}", text(&shipment.current_location)),
            open: true,
        });
    }

    let route = resolved.origin.zip(resolved.destination);
    let viewport = if let Some((from, to)) = route {
        bounds(from, &[to])
    } else if let Some((first, rest)) = markers.split_first() {
        let rest: Vec<_> = rest.iter().map(|marker| marker.position).collect();
        bounds(first.position, &rest)
    } else if use_fallback {
        let [lat, lon] = config.fallback_center;
        Viewport::Center {
            center: Coordinates::new(lat, lon),
            zoom: config.fallback_zoom,
        }
    } else {
        Viewport::Unchanged
    };

    MapPlan {
        markers,
        route,
        viewport,
    }
}

fn bounds(first: Coordinates, rest: &[Coordinates]) -> Viewport {
    let mut south_west = first;
    let mut north_east = first;
    for point in rest {
        south_west.lat = south_west.lat.min(point.lat);
        south_west.lon = south_west.lon.min(point.lon);
        north_east.lat = north_east.lat.max(point.lat);
        north_east.lon = north_east.lon.max(point.lon);
    }
    Viewport::FitBounds {
        south_west,
        north_east,
    }
}
