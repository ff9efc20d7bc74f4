use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::{Action, Ride};

// -- Render directives --

/// What the presentation layer should do after a session transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum RenderDirective {
    /// Nothing changed; keep the current view.
    None,
    /// Identity changed: drop transient query parameters and re-render.
    Refresh,
    /// Keep the current view and show an error message.
    ShowError { message: String },
}

// -- Auth --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Current session state, returned by `/session`, login and logout.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub username: Option<String>,
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directive: Option<RenderDirective>,
}

// -- Rides --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostRideRequest {
    pub pickup: String,
    pub dropoff: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// Both fields default to the empty string, which matches every ride.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SearchRidesQuery {
    #[serde(default)]
    pub pickup: String,
    #[serde(default)]
    pub dropoff: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchRidesResponse {
    pub rides: Vec<Ride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directive: Option<RenderDirective>,
}
