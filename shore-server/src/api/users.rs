use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use uuid::Uuid;

use shore_types::{MessageResponse, UpdateProfileRequest, User, UserProfile};

use super::auth::get_user_from_headers;
use super::{ApiError, ApiResult, JsonBody};
use crate::db::repositories::{EventRepository, FollowRepository, UserRepository};
use crate::state::AppState;
use crate::validation::non_blank;

fn parse_user_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("User not found".to_string()))
}

/// Assemble a profile with activity counters.
/// Private fields (email, eventsAttended) are only included for the owner.
fn build_profile(state: &AppState, user: User, include_private: bool) -> ApiResult<UserProfile> {
    let pool = state.db.pool.clone();
    let event_repo = EventRepository::new(pool.clone());
    let follow_repo = FollowRepository::new(pool);

    let events_organized = event_repo
        .count_organized_by(&user.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    let events_attended = if include_private {
        Some(
            event_repo
                .count_attended_by(&user.id)
                .map_err(|e| ApiError::InternalError(e.to_string()))?,
        )
    } else {
        None
    };
    let follower_count = follow_repo
        .follower_count(&user.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    let following_count = follow_repo
        .following_count(&user.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(UserProfile {
        user_id: user.id,
        username: user.username,
        email: include_private.then_some(user.email),
        bio: user.bio,
        location: user.location,
        profile_picture_url: user.profile_picture_url,
        events_organized,
        events_attended,
        follower_count,
        following_count,
        created_at: user.created_at,
    })
}

/// GET /users/me - Profile of the authenticated user
pub async fn get_me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<UserProfile>> {
    let user_id = get_user_from_headers(&state, &headers)?;
    let repo = UserRepository::new(state.db.pool.clone());

    let user = repo
        .get_by_id(&user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(build_profile(&state, user, true)?))
}

/// PATCH /users/me - Partial profile update
pub async fn update_me(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(payload): JsonBody<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    let update = UpdateProfileRequest {
        username: non_blank(payload.username).map(|u| u.trim().to_string()),
        ..payload
    };

    if update.is_empty() {
        return Err(ApiError::BadRequest(
            "No valid fields to update".to_string(),
        ));
    }

    let repo = UserRepository::new(state.db.pool.clone());

    if let Some(username) = &update.username {
        if repo
            .username_taken_by_other(username, &user_id)
            .map_err(|e| ApiError::InternalError(e.to_string()))?
        {
            return Err(ApiError::Conflict("Username already taken".to_string()));
        }
    }

    repo.update_profile(&user_id, &update)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let user = repo
        .get_by_id(&user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!("Updated profile for user {}", user_id);
    Ok(Json(user))
}

/// GET /users/:userId - Public profile
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    let user_id = parse_user_id(&user_id)?;
    let repo = UserRepository::new(state.db.pool.clone());

    let user = repo
        .get_by_id(&user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(build_profile(&state, user, false)?))
}

/// POST /users/:userId/follow - Follow another user
pub async fn follow_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(target): Path<String>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let user_id = get_user_from_headers(&state, &headers)?;
    let target_id = parse_user_id(&target)?;

    if user_id == target_id {
        return Err(ApiError::BadRequest("You cannot follow yourself".to_string()));
    }

    let pool = state.db.pool.clone();
    let user_repo = UserRepository::new(pool.clone());
    let follow_repo = FollowRepository::new(pool);

    user_repo
        .get_by_id(&target_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if follow_repo
        .is_following(&user_id, &target_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
    {
        return Err(ApiError::Conflict("Already following this user".to_string()));
    }

    follow_repo
        .follow(&user_id, &target_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Now following user")),
    ))
}

/// DELETE /users/:userId/follow - Stop following a user
pub async fn unfollow_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(target): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let user_id = get_user_from_headers(&state, &headers)?;
    let target_id = parse_user_id(&target)?;

    let removed = FollowRepository::new(state.db.pool.clone())
        .unfollow(&user_id, &target_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    if removed == 0 {
        return Err(ApiError::NotFound("Not following this user".to_string()));
    }

    Ok(Json(MessageResponse::new("Unfollowed user")))
}
