//! Great-circle distance and radius filtering.
//!
//! Every proximity feature (event search, nearby events, debris hotspots)
//! goes through [`haversine_km`]. There is no spatial index: candidates are
//! loaded from the database and filtered here.

use shore_types::{DebrisHotspot, Event, NearbyEvent, NearbyHotspot};

/// Mean Earth radius used by the Haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Anything with a fixed position that can be radius-filtered
pub trait Located {
    fn position(&self) -> GeoPoint;
}

impl Located for Event {
    fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

impl Located for DebrisHotspot {
    fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Great-circle distance between two points in kilometres
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points
    let h = h.clamp(0.0, 1.0);

    EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Round a distance to one decimal place
pub fn round_to_tenth(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}

/// Human readable distance: whole metres below 1 km, otherwise km with one decimal
pub fn format_distance(km: f64) -> String {
    let metres = (km * 1000.0).round();
    if metres < 1000.0 {
        format!("{} m", metres as i64)
    } else {
        format!("{:.1} km", km)
    }
}

/// Keep items whose distance from `center` is at most `radius_km`.
///
/// Items come back in their original order paired with their distance.
pub fn filter_within_radius<T: Located>(
    items: Vec<T>,
    center: GeoPoint,
    radius_km: f64,
) -> Vec<(T, f64)> {
    items
        .into_iter()
        .filter_map(|item| {
            let distance = haversine_km(center, item.position());
            (distance <= radius_km).then_some((item, distance))
        })
        .collect()
}

/// Hotspots within the radius, highest debris score first.
///
/// Equal scores keep their scan order. Distances are rounded to 0.1 km.
pub fn nearby_hotspots(
    hotspots: Vec<DebrisHotspot>,
    center: GeoPoint,
    radius_km: f64,
) -> Vec<NearbyHotspot> {
    let mut nearby: Vec<NearbyHotspot> = filter_within_radius(hotspots, center, radius_km)
        .into_iter()
        .map(|(hotspot, distance)| NearbyHotspot {
            location: hotspot.location,
            debris_score: hotspot.debris_score,
            lat: hotspot.lat,
            lon: hotspot.lon,
            description: hotspot.description,
            distance_km: round_to_tenth(distance),
        })
        .collect();

    // sort_by is stable
    nearby.sort_by(|a, b| b.debris_score.total_cmp(&a.debris_score));
    nearby
}

/// Events within the radius, closest first, each carrying `distance_km`
pub fn events_within_radius(events: Vec<Event>, center: GeoPoint, radius_km: f64) -> Vec<Event> {
    let mut matched: Vec<Event> = filter_within_radius(events, center, radius_km)
        .into_iter()
        .map(|(mut event, distance)| {
            event.distance_km = Some(distance);
            event
        })
        .collect();

    matched.sort_by(|a, b| {
        a.distance_km
            .unwrap_or_default()
            .total_cmp(&b.distance_km.unwrap_or_default())
    });
    matched
}

/// Events within the radius with a display distance, closest first
pub fn nearby_events(events: Vec<Event>, center: GeoPoint, radius_km: f64) -> Vec<NearbyEvent> {
    events_within_radius(events, center, radius_km)
        .into_iter()
        .map(|event| {
            let distance_text = format_distance(event.distance_km.unwrap_or_default());
            NearbyEvent {
                event,
                distance_text,
            }
        })
        .collect()
}
