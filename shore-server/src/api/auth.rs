use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use shore_types::{AuthResponse, LoginRequest, MessageResponse, RegisterRequest, User};

use super::{ApiError, ApiResult, JsonBody};
use crate::db::repositories::UserRepository;
use crate::password::{hash_password_blocking, verify_password_blocking};
use crate::state::AppState;
use crate::validation::{is_valid_email, is_valid_password, non_blank, MIN_PASSWORD_LEN};

/// Extract the raw token from an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolve the calling user from the bearer token.
///
/// A missing token is 401; a token that is unknown or expired is 403.
pub fn get_user_from_headers(state: &AppState, headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let token = bearer_token(headers)
        .ok_or_else(|| ApiError::Unauthorized("Access token required".to_string()))?;

    state
        .get_authenticated_user_id_from_token(token)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::Forbidden("Invalid or expired token".to_string()))
}

/// POST /auth/register - Create an account and start a session
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let (Some(username), Some(email), Some(password)) = (
        non_blank(payload.username),
        non_blank(payload.email),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "Username, email, and password are required".to_string(),
        ));
    };

    if !is_valid_password(&password) {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    if !is_valid_email(&email) {
        return Err(ApiError::BadRequest("Invalid email format".to_string()));
    }

    let repo = UserRepository::new(state.db.pool.clone());

    if repo
        .exists_by_email_or_username(&email, &username)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
    {
        return Err(ApiError::Conflict(
            "User with this email or username already exists".to_string(),
        ));
    }

    let password_hash = hash_password_blocking(password)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        username,
        email,
        bio: None,
        location: None,
        profile_picture_url: None,
        created_at: now,
        updated_at: now,
    };

    repo.create(&user, &password_hash)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let token = state
        .session_manager
        .create_session(user.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    tracing::info!("Registered user {} ({})", user.username, user.id);

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// POST /auth/login - Exchange email and password for a session token
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (Some(email), Some(password)) = (
        non_blank(payload.email),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    };

    let repo = UserRepository::new(state.db.pool.clone());

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let (user, password_hash) = repo
        .get_credentials_by_email(&email)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(invalid)?;

    let matches = verify_password_blocking(password, password_hash)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    if !matches {
        tracing::debug!("Rejected login for {}", user.id);
        return Err(invalid());
    }

    let token = state
        .session_manager
        .create_session(user.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(AuthResponse { token, user }))
}

/// POST /auth/logout - End the current session
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<MessageResponse>> {
    get_user_from_headers(&state, &headers)?;

    if let Some(token) = bearer_token(&headers) {
        state
            .session_manager
            .delete_session(token)
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
    }

    Ok(Json(MessageResponse::new("Logged out successfully")))
}
