use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use shore_types::{
    Comment, CreateCommentRequest, CreatePostRequest, LikeResponse, Post, UserSummary,
};

use super::auth::get_user_from_headers;
use super::{ApiError, ApiResult, JsonBody};
use crate::db::repositories::{
    CommentRepository, EventRepository, LikeRepository, PostRepository, UserRepository,
};
use crate::state::AppState;
use crate::validation::non_blank;

fn parse_post_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Post not found".to_string()))
}

/// Fill in like and comment counts, one pair of queries per post
pub(crate) fn with_counts(state: &AppState, mut posts: Vec<Post>) -> ApiResult<Vec<Post>> {
    let pool = state.db.pool.clone();
    let like_repo = LikeRepository::new(pool.clone());
    let comment_repo = CommentRepository::new(pool);

    for post in &mut posts {
        post.likes = like_repo
            .count_for_post(&post.post_id)
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        post.comments = comment_repo
            .count_for_post(&post.post_id)
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
    }

    Ok(posts)
}

fn author_summary(state: &AppState, user_id: &Uuid) -> ApiResult<UserSummary> {
    let user = UserRepository::new(state.db.pool.clone())
        .get_by_id(user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(UserSummary {
        user_id: user.id,
        username: user.username,
        profile_picture_url: user.profile_picture_url,
    })
}

/// GET /feed - Personalized feed for the authenticated user
pub async fn get_feed(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Post>>> {
    let user_id = get_user_from_headers(&state, &headers)?;

    let posts = PostRepository::new(state.db.pool.clone())
        .get_feed(&user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    tracing::debug!("Feed for {} has {} posts", user_id, posts.len());
    Ok(Json(with_counts(&state, posts)?))
}

/// POST /posts - Create a post, optionally attached to an event
pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(payload): JsonBody<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let user_id = get_user_from_headers(&state, &headers)?;

    let text = non_blank(payload.text)
        .ok_or_else(|| ApiError::BadRequest("Post text is required".to_string()))?;

    let event_id = match payload.event_id.as_deref() {
        Some(raw) => {
            let event_id = Uuid::parse_str(raw)
                .map_err(|_| ApiError::NotFound("Event not found".to_string()))?;
            if !EventRepository::new(state.db.pool.clone())
                .exists(&event_id)
                .map_err(|e| ApiError::InternalError(e.to_string()))?
            {
                return Err(ApiError::NotFound("Event not found".to_string()));
            }
            Some(event_id)
        }
        None => None,
    };

    let post = Post {
        post_id: Uuid::new_v4(),
        author: author_summary(&state, &user_id)?,
        text,
        image_url: payload.image_url,
        event_id,
        likes: 0,
        comments: 0,
        created_at: Utc::now(),
    };

    PostRepository::new(state.db.pool.clone())
        .create(&post)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    tracing::info!("User {} created post {}", user_id, post.post_id);
    Ok((StatusCode::CREATED, Json(post)))
}

/// POST /posts/:postId/like - Like or unlike a post
pub async fn toggle_like(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
) -> ApiResult<Json<LikeResponse>> {
    let user_id = get_user_from_headers(&state, &headers)?;
    let post_id = parse_post_id(&post_id)?;
    let pool = state.db.pool.clone();

    if !PostRepository::new(pool.clone())
        .exists(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
    {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }

    let liked = LikeRepository::new(pool)
        .toggle(&post_id, &user_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let message = if liked { "Post liked" } else { "Post unliked" };
    Ok(Json(LikeResponse {
        message: message.to_string(),
        liked,
    }))
}

/// GET /posts/:postId/comments - Comments on a post, oldest first
pub async fn get_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<Json<Vec<Comment>>> {
    let post_id = parse_post_id(&post_id)?;
    let pool = state.db.pool.clone();

    if !PostRepository::new(pool.clone())
        .exists(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
    {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }

    let comments = CommentRepository::new(pool)
        .list_for_post(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(comments))
}

/// POST /posts/:postId/comments - Comment on a post
pub async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
    JsonBody(payload): JsonBody<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let user_id = get_user_from_headers(&state, &headers)?;
    let post_id = parse_post_id(&post_id)?;

    let text = non_blank(payload.text)
        .ok_or_else(|| ApiError::BadRequest("Comment text is required".to_string()))?;

    let pool = state.db.pool.clone();
    if !PostRepository::new(pool.clone())
        .exists(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
    {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }

    let comment = Comment {
        comment_id: Uuid::new_v4(),
        author: author_summary(&state, &user_id)?,
        text,
        created_at: Utc::now(),
    };

    CommentRepository::new(pool)
        .create(&post_id, &comment)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(comment)))
}
