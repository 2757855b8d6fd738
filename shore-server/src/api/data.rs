use axum::{
    extract::{Query, State},
    Json,
};
use rand::Rng;
use serde::Deserialize;

use shore_types::{Coordinates, NearbyHotspot, TideReport, WaterQualityReport, WaterQualityStatus};

use super::{parse_coordinate, ApiError, ApiResult};
use crate::db::now_timestamp;
use crate::db::repositories::HotspotRepository;
use crate::geo::{self, GeoPoint};
use crate::state::AppState;
use crate::tides;
use crate::validation::non_blank;

/// Default hotspot search radius
const DEFAULT_HOTSPOT_RADIUS_KM: f64 = 50.0;

const WATER_QUALITY_SOURCE: &str = "EPA BEACON";
const WATER_QUALITY_NOTE: &str =
    "Sample data - Integrate with actual EPA/USGS API for production";

#[derive(Debug, Default, Deserialize)]
pub struct LocationQuery {
    lat: Option<String>,
    lon: Option<String>,
    radius_km: Option<String>,
    date: Option<String>,
}

impl LocationQuery {
    fn point(&self) -> Option<(String, String)> {
        Some((
            non_blank(self.lat.clone())?,
            non_blank(self.lon.clone())?,
        ))
    }
}

/// Missing, unparsable or non-positive radius falls back to the default
fn hotspot_radius(raw: Option<&str>) -> f64 {
    raw.and_then(|r| r.trim().parse::<f64>().ok())
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or(DEFAULT_HOTSPOT_RADIUS_KM)
}

/// Map a uniform roll in [0, 1) onto the simulated advisory distribution
pub fn classify_water_quality(roll: f64) -> WaterQualityStatus {
    if roll < 0.7 {
        WaterQualityStatus::Safe
    } else if roll < 0.9 {
        WaterQualityStatus::Caution
    } else {
        WaterQualityStatus::Advisory
    }
}

/// GET /data/debris-hotspots - Known debris areas near a point, worst first
pub async fn get_debris_hotspots(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> ApiResult<Json<Vec<NearbyHotspot>>> {
    let (lat, lon) = query
        .point()
        .ok_or_else(|| ApiError::BadRequest("lat and lon are required".to_string()))?;
    let center = GeoPoint::new(parse_coordinate("lat", &lat)?, parse_coordinate("lon", &lon)?);
    let radius_km = hotspot_radius(query.radius_km.as_deref());

    let hotspots = HotspotRepository::new(state.db.pool.clone())
        .list_all()
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(geo::nearby_hotspots(hotspots, center, radius_km)))
}

/// GET /data/tides - High/low tide predictions for a day
pub async fn get_tides(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> ApiResult<Json<TideReport>> {
    let (Some(_), Some(date)) = (query.point(), non_blank(query.date.clone())) else {
        return Err(ApiError::BadRequest(
            "lat, lon, and date are required".to_string(),
        ));
    };

    // Single configured station; lat/lon are not used for station lookup yet
    let report = tides::tide_report(
        &state.http,
        &state.settings.data.noaa_base_url,
        &state.settings.data.tide_station,
        date.trim(),
    )
    .await;

    Ok(Json(report))
}

/// GET /data/water-quality - Simulated beach advisory status
pub async fn get_water_quality(Query(query): Query<LocationQuery>) -> ApiResult<Json<WaterQualityReport>> {
    let (lat, lon) = query
        .point()
        .ok_or_else(|| ApiError::BadRequest("lat and lon are required".to_string()))?;
    let coordinates = Coordinates {
        lat: parse_coordinate("lat", &lat)?,
        lon: parse_coordinate("lon", &lon)?,
    };

    let status = classify_water_quality(rand::thread_rng().gen::<f64>());

    Ok(Json(WaterQualityReport {
        status,
        message: status.message().to_string(),
        source: WATER_QUALITY_SOURCE.to_string(),
        coordinates,
        last_updated: Some(now_timestamp()),
        note: Some(WATER_QUALITY_NOTE.to_string()),
    }))
}
