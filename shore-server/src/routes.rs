use axum::{
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::db::now_timestamp;
use crate::state::AppState;

/// CORS for the configured front-end origins; `*` allows any origin
fn cors_layer(state: &AppState) -> CorsLayer {
    let origins = state.settings.server.cors_origin_list();
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(allowed)
}

/// Build the full application router
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state);

    let v1 = Router::new()
        // Authentication routes
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/logout", post(api::auth::logout))
        // User routes
        .route("/users/me", get(api::users::get_me).patch(api::users::update_me))
        .route("/users/:userId", get(api::users::get_user))
        .route(
            "/users/:userId/follow",
            post(api::users::follow_user).delete(api::users::unfollow_user),
        )
        // Event routes
        .route("/events", get(api::events::list_events).post(api::events::create_event))
        .route("/events/nearby", get(api::events::nearby_events))
        .route(
            "/events/:eventId",
            get(api::events::get_event).delete(api::events::delete_event),
        )
        .route("/events/:eventId/join", post(api::events::join_event))
        .route("/events/:eventId/leave", delete(api::events::leave_event))
        .route("/events/:eventId/posts", get(api::events::get_event_posts))
        // Social routes
        .route("/feed", get(api::posts::get_feed))
        .route("/posts", post(api::posts::create_post))
        .route("/posts/:postId/like", post(api::posts::toggle_like))
        .route(
            "/posts/:postId/comments",
            get(api::posts::get_comments).post(api::posts::create_comment),
        )
        // Environmental data routes
        .route("/data/debris-hotspots", get(api::data::get_debris_hotspots))
        .route("/data/tides", get(api::data::get_tides))
        .route("/data/water-quality", get(api::data::get_water_quality));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1)
        .fallback(api::error::route_not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": now_timestamp(),
    }))
}
