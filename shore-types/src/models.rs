use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{TideType, WaterQualityStatus};

/// Format a timestamp the way it is stored and sent over the wire
/// (`2024-01-01T09:30:00.000Z`). Fixed width keeps string ordering in SQL
/// equal to chronological ordering.
pub fn format_timestamp(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// Custom serde module for DateTime to ensure ISO8601 millisecond format
mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

/// A registered user. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub profile_picture_url: Option<String>,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
}

/// Profile with activity counters.
///
/// `email` and `events_attended` are only filled in for the owner's own
/// profile (`/users/me`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: Uuid,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub profile_picture_url: Option<String>,
    pub events_organized: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events_attended: Option<i64>,
    pub follower_count: i64,
    pub following_count: i64,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

/// Compact author block embedded in posts, comments and attendee lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: Uuid,
    pub username: String,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organizer {
    pub user_id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_id: Uuid,
    pub event_name: String,
    pub description: Option<String>,
    /// Event date as provided by the organizer (ISO8601 date or datetime)
    pub date: String,
    pub lat: f64,
    pub lon: f64,
    pub address: Option<String>,
    pub organizer: Organizer,
    pub attendee_count: i64,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
    /// Distance from the search center, only present for radius queries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    pub event_id: Uuid,
    pub event_name: String,
    pub description: Option<String>,
    pub date: String,
    pub lat: f64,
    pub lon: f64,
    pub address: Option<String>,
    pub organizer: Organizer,
    pub attendees: Vec<UserSummary>,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "datetime_format")]
    pub updated_at: DateTime<Utc>,
}

/// Result of a nearby-event search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyEvent {
    #[serde(flatten)]
    pub event: Event,
    /// Display string such as "850 m" or "3.2 km"
    pub distance_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub post_id: Uuid,
    pub author: UserSummary,
    pub text: String,
    pub image_url: Option<String>,
    pub event_id: Option<Uuid>,
    pub likes: i64,
    pub comments: i64,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub comment_id: Uuid,
    pub author: UserSummary,
    pub text: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

/// Known debris concentration area, seeded from survey data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebrisHotspot {
    pub id: String,
    pub location: String,
    pub debris_score: f64,
    pub lat: f64,
    pub lon: f64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyHotspot {
    pub location: String,
    pub debris_score: f64,
    pub lat: f64,
    pub lon: f64,
    pub description: Option<String>,
    /// Rounded to one decimal place
    pub distance_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TidePrediction {
    #[serde(rename = "type")]
    pub tide_type: TideType,
    pub time: String,
    pub height: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TideReport {
    pub date: String,
    pub station: String,
    pub predictions: Vec<TidePrediction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterQualityReport {
    pub status: WaterQualityStatus,
    pub message: String,
    pub source: String,
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

// Request/Response types for API
//
// Required fields are still `Option` so a missing field produces the API's
// own 400 message instead of a generic deserialization rejection.

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub profile_picture_url: Option<String>,
}

impl UpdateProfileRequest {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.bio.is_none()
            && self.location.is_none()
            && self.profile_picture_url.is_none()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub event_name: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub text: Option<String>,
    pub image_url: Option<String>,
    /// Raw id; an unparsable id is reported as an unknown event
    pub event_id: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub message: String,
    pub liked: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}
