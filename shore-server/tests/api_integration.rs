use anyhow::Result;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use shore_server::config::Settings;
use shore_server::db::Database;
use shore_server::routes;
use shore_server::state::AppState;

/// Fresh app over its own in-memory database with the hotspot seed loaded
fn test_app() -> Result<Router> {
    let settings = Settings::for_testing();
    let db = Database::new(&settings.database.path)?;
    db.initialize()?;
    db.seed_hotspots()?;
    Ok(routes::router(AppState::new(db, settings)))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

/// Register a user and return (token, userId)
async fn register(app: &Router, username: &str) -> Result<(String, String)> {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@shore.test", username),
            "password": "sandcastle",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    let token = body["token"].as_str().unwrap_or_default().to_string();
    let user_id = body["user"]["id"].as_str().unwrap_or_default().to_string();
    Ok((token, user_id))
}

async fn create_event(app: &Router, token: &str, name: &str, lat: f64, lon: f64) -> Result<String> {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/events",
        Some(token),
        Some(json!({
            "eventName": name,
            "date": "2025-06-01T09:00:00.000Z",
            "lat": lat,
            "lon": lon,
            "address": "Main beach access",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "create event failed: {}", body);
    Ok(body["eventId"].as_str().unwrap_or_default().to_string())
}

async fn create_post(app: &Router, token: &str, text: &str, event_id: Option<&str>) -> Result<String> {
    let mut payload = json!({ "text": text });
    if let Some(event_id) = event_id {
        payload["eventId"] = json!(event_id);
    }
    let (status, body) = send(app, Method::POST, "/api/v1/posts", Some(token), Some(payload)).await?;
    assert_eq!(status, StatusCode::CREATED, "create post failed: {}", body);
    Ok(body["postId"].as_str().unwrap_or_default().to_string())
}

fn post_texts(feed: &Value) -> Vec<String> {
    feed.as_array()
        .map(|posts| {
            posts
                .iter()
                .filter_map(|p| p["text"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn test_health_and_unknown_route() -> Result<()> {
    let app = test_app()?;

    let (status, body) = send(&app, Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());

    let (status, body) = send(&app, Method::GET, "/api/v1/nowhere", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route not found");

    let (status, _) = send(&app, Method::GET, "/definitely/not/here", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_registration_and_login() -> Result<()> {
    let app = test_app()?;
    let (token, user_id) = register(&app, "marina").await?;
    assert!(!token.is_empty());
    assert!(!user_id.is_empty());

    // Duplicate username or email
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({"username": "marina", "email": "other@shore.test", "password": "sandcastle"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // Validation
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({"username": "kai", "email": "kai@shore.test", "password": "short"})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({"username": "kai", "email": "not-an-email", "password": "sandcastle"})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({"username": "kai"})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Login
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "marina@shore.test", "password": "sandcastle"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user_id.as_str());
    assert!(body["user"].get("password").is_none());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "marina@shore.test", "password": "wrong-password"})),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "ghost@shore.test", "password": "sandcastle"})),
    )
    .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_bearer_token_handling() -> Result<()> {
    let app = test_app()?;
    let (token, _) = register(&app, "marina").await?;

    let (status, _) = send(&app, Method::GET, "/api/v1/feed", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/api/v1/feed", Some("bogus-token"), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::GET, "/api/v1/feed", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);

    // Logout invalidates the token
    let (status, _) = send(&app, Method::POST, "/api/v1/auth/logout", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, "/api/v1/feed", Some(&token), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn test_event_attendance_rules() -> Result<()> {
    let app = test_app()?;
    let (organizer, organizer_id) = register(&app, "organizer").await?;
    let (volunteer, volunteer_id) = register(&app, "volunteer").await?;

    let event_id = create_event(&app, &organizer, "Pier sweep", 34.0095, -118.4970).await?;

    // Missing fields
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/events",
        Some(&organizer),
        Some(json!({"eventName": "No coordinates", "date": "2025-06-01"})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let join = format!("/api/v1/events/{}/join", event_id);
    let leave = format!("/api/v1/events/{}/leave", event_id);

    let (status, _) = send(&app, Method::POST, &join, Some(&volunteer), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::POST, &join, Some(&volunteer), None).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, detail) = send(&app, Method::GET, &format!("/api/v1/events/{}", event_id), None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["organizer"]["userId"], organizer_id.as_str());
    assert_eq!(detail["attendees"][0]["userId"], volunteer_id.as_str());

    let (status, _) = send(&app, Method::DELETE, &leave, Some(&volunteer), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::DELETE, &leave, Some(&volunteer), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let unknown = format!("/api/v1/events/{}/join", uuid::Uuid::new_v4());
    let (status, _) = send(&app, Method::POST, &unknown, Some(&volunteer), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_only_organizer_can_delete_event() -> Result<()> {
    let app = test_app()?;
    let (organizer, _) = register(&app, "organizer").await?;
    let (other, _) = register(&app, "other").await?;

    let event_id = create_event(&app, &organizer, "Dune sweep", 37.7594, -122.5107).await?;
    let uri = format!("/api/v1/events/{}", event_id);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&other), None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&organizer), None).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, &uri, None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_event_search_by_radius() -> Result<()> {
    let app = test_app()?;
    let (organizer, organizer_id) = register(&app, "organizer").await?;

    create_event(&app, &organizer, "Two km away", 34.0375, -118.4912).await?;
    create_event(&app, &organizer, "Right here", 34.0200, -118.4912).await?;
    create_event(&app, &organizer, "San Francisco", 37.7594, -122.5107).await?;

    let (status, all) = send(&app, Method::GET, "/api/v1/events", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().map(Vec::len), Some(3));

    let (status, near) = send(
        &app,
        Method::GET,
        "/api/v1/events?lat=34.0195&lon=-118.4912&radius_km=10",
        None,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = near
        .as_array()
        .unwrap_or(&Vec::new())
        .iter()
        .filter_map(|e| e["eventName"].as_str().map(str::to_string))
        .collect();
    assert_eq!(names, vec!["Right here", "Two km away"]);
    assert!(near[0]["distanceKm"].as_f64().unwrap_or(f64::MAX) < 0.1);

    let (_, by_organizer) = send(
        &app,
        Method::GET,
        &format!("/api/v1/events?organizer_id={}", organizer_id),
        None,
        None,
    )
    .await?;
    assert_eq!(by_organizer.as_array().map(Vec::len), Some(3));

    let (status, nearby) = send(
        &app,
        Method::GET,
        "/api/v1/events/nearby?lat=34.0195&lon=-118.4912",
        None,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(nearby.as_array().map(Vec::len), Some(2));
    assert_eq!(nearby[0]["distanceText"], "56 m");
    assert_eq!(nearby[1]["distanceText"], "2.0 km");

    let (status, _) = send(&app, Method::GET, "/api/v1/events/nearby?lat=34.0", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_feed_only_shows_connected_posts() -> Result<()> {
    let app = test_app()?;
    let (alice, _) = register(&app, "alice").await?;
    let (bob, bob_id) = register(&app, "bob").await?;
    let (carol, _) = register(&app, "carol").await?;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/users/{}/follow", bob_id),
        Some(&alice),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    create_post(&app, &alice, "alice own post", None).await?;
    create_post(&app, &bob, "bob followed post", None).await?;
    create_post(&app, &carol, "carol stranger post", None).await?;

    let (_, feed) = send(&app, Method::GET, "/api/v1/feed", Some(&alice), None).await?;
    let texts = post_texts(&feed);
    assert!(texts.contains(&"alice own post".to_string()));
    assert!(texts.contains(&"bob followed post".to_string()));
    assert!(!texts.contains(&"carol stranger post".to_string()));

    // Attending carol's event pulls in posts attached to it
    let event_id = create_event(&app, &carol, "Carol's cleanup", 25.7907, -80.13).await?;
    create_post(&app, &carol, "carol event post", Some(&event_id)).await?;
    let (_, feed) = send(&app, Method::GET, "/api/v1/feed", Some(&alice), None).await?;
    assert!(!post_texts(&feed).contains(&"carol event post".to_string()));

    send(
        &app,
        Method::POST,
        &format!("/api/v1/events/{}/join", event_id),
        Some(&alice),
        None,
    )
    .await?;
    let (_, feed) = send(&app, Method::GET, "/api/v1/feed", Some(&alice), None).await?;
    let texts = post_texts(&feed);
    assert!(texts.contains(&"carol event post".to_string()));
    assert!(!texts.contains(&"carol stranger post".to_string()));

    // Bob sees neither alice nor carol
    let (_, feed) = send(&app, Method::GET, "/api/v1/feed", Some(&bob), None).await?;
    assert_eq!(post_texts(&feed), vec!["bob followed post".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_posts_likes_and_comments() -> Result<()> {
    let app = test_app()?;
    let (author, _) = register(&app, "author").await?;
    let (fan, _) = register(&app, "fan").await?;

    let (status, _) = send(&app, Method::POST, "/api/v1/posts", Some(&author), Some(json!({"text": "  "}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing_event = json!({"text": "Lost", "eventId": uuid::Uuid::new_v4()});
    let (status, _) = send(&app, Method::POST, "/api/v1/posts", Some(&author), Some(missing_event)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let post_id = create_post(&app, &author, "Filled three bags today", None).await?;
    let like = format!("/api/v1/posts/{}/like", post_id);

    let (status, body) = send(&app, Method::POST, &like, Some(&fan), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["liked"], true);
    assert_eq!(body["message"], "Post liked");

    let (_, body) = send(&app, Method::POST, &like, Some(&fan), None).await?;
    assert_eq!(body["liked"], false);
    let (_, body) = send(&app, Method::POST, &like, Some(&fan), None).await?;
    assert_eq!(body["liked"], true);

    let comments = format!("/api/v1/posts/{}/comments", post_id);
    let (status, _) = send(&app, Method::POST, &comments, Some(&fan), Some(json!({"text": "Amazing work"}))).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, Method::POST, &comments, Some(&fan), Some(json!({}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, list) = send(&app, Method::GET, &comments, None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["text"], "Amazing work");
    assert_eq!(list[0]["author"]["username"], "fan");

    let (_, feed) = send(&app, Method::GET, "/api/v1/feed", Some(&author), None).await?;
    assert_eq!(feed[0]["likes"], 1);
    assert_eq!(feed[0]["comments"], 1);

    let unknown = format!("/api/v1/posts/{}/like", uuid::Uuid::new_v4());
    let (status, _) = send(&app, Method::POST, &unknown, Some(&fan), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_profiles_and_follows() -> Result<()> {
    let app = test_app()?;
    let (alice, alice_id) = register(&app, "alice").await?;
    let (bob, bob_id) = register(&app, "bob").await?;

    let follow = format!("/api/v1/users/{}/follow", bob_id);
    let (status, _) = send(&app, Method::POST, &follow, Some(&alice), None).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, Method::POST, &follow, Some(&alice), None).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let self_follow = format!("/api/v1/users/{}/follow", alice_id);
    let (status, _) = send(&app, Method::POST, &self_follow, Some(&alice), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, profile) = send(&app, Method::GET, &format!("/api/v1/users/{}", bob_id), None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["followerCount"], 1);
    assert!(profile.get("email").is_none());

    let (status, me) = send(&app, Method::GET, "/api/v1/users/me", Some(&alice), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["followingCount"], 1);
    assert_eq!(me["eventsAttended"], 0);
    assert_eq!(me["email"], "alice@shore.test");

    // Profile updates
    let (status, _) = send(&app, Method::PATCH, "/api/v1/users/me", Some(&alice), Some(json!({}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/api/v1/users/me",
        Some(&alice),
        Some(json!({"username": "bob"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, updated) = send(
        &app,
        Method::PATCH,
        "/api/v1/users/me",
        Some(&alice),
        Some(json!({"bio": "Weekend volunteer", "location": "Venice, CA"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["bio"], "Weekend volunteer");
    assert_eq!(updated["username"], "alice");

    let (status, _) = send(&app, Method::DELETE, &follow, Some(&alice), None).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::DELETE, &follow, Some(&bob), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, &format!("/api/v1/users/{}", uuid::Uuid::new_v4()), None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_debris_hotspots() -> Result<()> {
    let app = test_app()?;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/data/debris-hotspots?lat=34.0195&lon=-118.4912&radius_km=10",
        None,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["location"], "Santa Monica Beach, CA");
    assert_eq!(body[0]["distanceKm"], 0.0);

    // Whole-continent radius returns every hotspot, worst first
    let (_, body) = send(
        &app,
        Method::GET,
        "/api/v1/data/debris-hotspots?lat=39.0&lon=-98.0&radius_km=5000",
        None,
        None,
    )
    .await?;
    let scores: Vec<f64> = body
        .as_array()
        .unwrap_or(&Vec::new())
        .iter()
        .filter_map(|h| h["debrisScore"].as_f64())
        .collect();
    assert_eq!(scores, vec![8.5, 7.9, 7.2, 6.8]);

    // Unparsable radius uses the 50 km default
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/data/debris-hotspots?lat=34.0195&lon=-118.4912&radius_km=wide",
        None,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let (status, _) = send(&app, Method::GET, "/api/v1/data/debris-hotspots?lat=34.0", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_tides_and_water_quality() -> Result<()> {
    let app = test_app()?;

    let (status, _) = send(&app, Method::GET, "/api/v1/data/tides?lat=41.8&lon=-71.4", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The test upstream is unreachable, so sample data comes back
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/data/tides?lat=41.8&lon=-71.4&date=2024-06-01",
        None,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["date"], "2024-06-01");
    assert_eq!(body["predictions"].as_array().map(Vec::len), Some(3));
    assert_eq!(body["predictions"][0]["type"], "Low");
    assert!(body["note"].is_string());

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/data/water-quality?lat=34.0&lon=-118.5",
        None,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(["SAFE", "CAUTION", "ADVISORY"].contains(&body["status"].as_str().unwrap_or_default()));
    assert_eq!(body["source"], "EPA BEACON");
    assert_eq!(body["coordinates"]["lat"], 34.0);

    let (status, _) = send(&app, Method::GET, "/api/v1/data/water-quality", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_malformed_bodies_return_json_errors() -> Result<()> {
    let app = test_app()?;
    let (token, _) = register(&app, "finn").await?;

    // A post tagged with an id that is not a uuid points at no event
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/posts",
        Some(&token),
        Some(json!({ "text": "hi", "eventId": "not-a-uuid" })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["details"], "Event not found");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/events",
        Some(&token),
        Some(json!({
            "eventName": "Pier sweep",
            "date": "2025-06-01T09:00:00.000Z",
            "lat": "34.0",
            "lon": -118.5,
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
    assert!(body["details"].is_string());

    // Missing content type and broken JSON are both bad requests
    let raw_requests = [
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/auth/login")
            .body(Body::from(r#"{"email":"finn@shore.test","password":"sandcastle"}"#))?,
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/auth/login")
            .header("Content-Type", "application/json")
            .body(Body::from("{\"email\":"))?,
    ];
    for request in raw_requests {
        let response = app.clone().oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body: Value = serde_json::from_slice(&bytes)?;
        assert_eq!(body["error"], "Bad Request");
        assert!(body["details"].is_string());
    }

    Ok(())
}
