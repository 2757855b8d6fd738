use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use shore_types::{
    CreateEventRequest, Event, EventDetail, MessageResponse, NearbyEvent, Organizer, Post,
};

use super::auth::get_user_from_headers;
use super::posts::with_counts;
use super::{parse_coordinate, ApiError, ApiResult, JsonBody};
use crate::db::repositories::{EventRepository, PostRepository};
use crate::geo::{self, GeoPoint};
use crate::state::AppState;
use crate::validation::non_blank;

/// Default search radius for nearby events
const DEFAULT_NEARBY_RADIUS_KM: f64 = 5.0;

fn parse_event_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Event not found".to_string()))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListEventsQuery {
    organizer_id: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
    radius_km: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NearbyQuery {
    lat: Option<String>,
    lon: Option<String>,
    radius_km: Option<String>,
}

/// GET /events - All events, optionally by organizer and/or within a radius
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> ApiResult<Json<Vec<Event>>> {
    let repo = EventRepository::new(state.db.pool.clone());

    let organizer_id = match non_blank(query.organizer_id) {
        Some(raw) => match Uuid::parse_str(&raw) {
            Ok(id) => Some(id),
            // Unknown organizer format can never match
            Err(_) => return Ok(Json(Vec::new())),
        },
        None => None,
    };

    let events = repo
        .list(organizer_id.as_ref())
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    // Radius filtering only applies when all three parameters are given
    let (Some(lat), Some(lon), Some(radius)) = (
        non_blank(query.lat),
        non_blank(query.lon),
        non_blank(query.radius_km),
    ) else {
        return Ok(Json(events));
    };

    let center = GeoPoint::new(parse_coordinate("lat", &lat)?, parse_coordinate("lon", &lon)?);
    let radius_km = parse_coordinate("radius_km", &radius)?;

    Ok(Json(geo::events_within_radius(events, center, radius_km)))
}

/// GET /events/nearby - Events close to a position, with display distances
pub async fn nearby_events(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> ApiResult<Json<Vec<NearbyEvent>>> {
    let (Some(lat), Some(lon)) = (non_blank(query.lat), non_blank(query.lon)) else {
        return Err(ApiError::BadRequest("lat and lon are required".to_string()));
    };
    let center = GeoPoint::new(parse_coordinate("lat", &lat)?, parse_coordinate("lon", &lon)?);

    let radius_km = query
        .radius_km
        .and_then(|r| r.trim().parse::<f64>().ok())
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or(DEFAULT_NEARBY_RADIUS_KM);

    let events = EventRepository::new(state.db.pool.clone())
        .list(None)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(geo::nearby_events(events, center, radius_km)))
}

/// POST /events - Create a cleanup event organized by the caller
pub async fn create_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(payload): JsonBody<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    let user_id = get_user_from_headers(&state, &headers)?;

    let (Some(event_name), Some(date), Some(lat), Some(lon)) = (
        non_blank(payload.event_name),
        non_blank(payload.date),
        payload.lat,
        payload.lon,
    ) else {
        return Err(ApiError::BadRequest(
            "eventName, date, lat, and lon are required".to_string(),
        ));
    };

    let now = Utc::now();
    let event = Event {
        event_id: Uuid::new_v4(),
        event_name,
        description: payload.description,
        date,
        lat,
        lon,
        address: payload.address,
        organizer: Organizer {
            user_id,
            username: String::new(),
        },
        attendee_count: 0,
        created_at: now,
        updated_at: now,
        distance_km: None,
    };

    let repo = EventRepository::new(state.db.pool.clone());
    repo.create(&event)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let created = repo
        .get_by_id(&event.event_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::InternalError("Created event could not be read back".to_string()))?;

    tracing::info!("User {} created event {}", user_id, created.event_id);
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /events/:eventId - Event details with attendees
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> ApiResult<Json<EventDetail>> {
    let event_id = parse_event_id(&event_id)?;
    let repo = EventRepository::new(state.db.pool.clone());

    let event = repo
        .get_by_id(&event_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    let attendees = repo
        .get_attendees(&event_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(EventDetail {
        event_id: event.event_id,
        event_name: event.event_name,
        description: event.description,
        date: event.date,
        lat: event.lat,
        lon: event.lon,
        address: event.address,
        organizer: event.organizer,
        attendees,
        created_at: event.created_at,
        updated_at: event.updated_at,
    }))
}

/// POST /events/:eventId/join - RSVP to an event
pub async fn join_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let user_id = get_user_from_headers(&state, &headers)?;
    let event_id = parse_event_id(&event_id)?;
    let repo = EventRepository::new(state.db.pool.clone());

    if !repo
        .exists(&event_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
    {
        return Err(ApiError::NotFound("Event not found".to_string()));
    }

    if repo
        .is_attending(&event_id, &user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
    {
        return Err(ApiError::Conflict("Already joined this event".to_string()));
    }

    repo.add_attendee(&event_id, &user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    tracing::info!("User {} joined event {}", user_id, event_id);
    Ok(Json(MessageResponse::new("Successfully joined event")))
}

/// DELETE /events/:eventId/leave - Cancel an RSVP
pub async fn leave_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let user_id = get_user_from_headers(&state, &headers)?;
    let event_id = parse_event_id(&event_id)?;

    let removed = EventRepository::new(state.db.pool.clone())
        .remove_attendee(&event_id, &user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    if removed == 0 {
        return Err(ApiError::NotFound("Not attending this event".to_string()));
    }

    Ok(Json(MessageResponse::new("Successfully left event")))
}

/// DELETE /events/:eventId - Organizer-only delete
pub async fn delete_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let user_id = get_user_from_headers(&state, &headers)?;
    let event_id = parse_event_id(&event_id)?;
    let repo = EventRepository::new(state.db.pool.clone());

    let organizer_id = repo
        .get_organizer_id(&event_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    if organizer_id != user_id {
        return Err(ApiError::Forbidden(
            "Only the event organizer can delete this event".to_string(),
        ));
    }

    repo.delete(&event_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    tracing::info!("User {} deleted event {}", user_id, event_id);
    Ok(Json(MessageResponse::new("Event deleted successfully")))
}

/// GET /events/:eventId/posts - Posts attached to an event
pub async fn get_event_posts(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> ApiResult<Json<Vec<Post>>> {
    let event_id = parse_event_id(&event_id)?;
    let pool = state.db.pool.clone();

    if !EventRepository::new(pool.clone())
        .exists(&event_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
    {
        return Err(ApiError::NotFound("Event not found".to_string()));
    }

    let posts = PostRepository::new(pool)
        .get_by_event(&event_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(with_counts(&state, posts)?))
}
