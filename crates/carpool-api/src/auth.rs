use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{info, warn};

use carpool_db::Database;
use carpool_types::api::{
    LoginRequest, RegisterRequest, RegisterResponse, RenderDirective, SessionResponse,
};

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::run_blocking;
use crate::session::{SessionContext, SessionId, SessionRegistry};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub sessions: SessionRegistry,
}

fn session_response(context: &SessionContext) -> SessionResponse {
    SessionResponse {
        username: context.identity().map(str::to_string),
        actions: context.available_actions(),
        directive: None,
    }
}

pub async fn current_session(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> Json<SessionResponse> {
    let context = state.sessions.get(session).await.unwrap_or_default();
    Json(session_response(&context))
}

/// Passwords are stored as given: no hashing and no strength rules.
pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.clone();
    let result = run_blocking(&state, move |db| db.register(&req.username, &req.password)).await;

    match result {
        Ok(()) => {
            info!(username = %username, "User registered");
            Ok((
                StatusCode::CREATED,
                Json(RegisterResponse {
                    message: "User registered successfully. You can now log in.".to_string(),
                }),
            ))
        }
        Err(ApiError::DuplicateUsername) => {
            warn!(username = %username, "Registration rejected: username taken");
            Err(ApiError::DuplicateUsername)
        }
        Err(e) => Err(e),
    }
}

pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let already = state
        .sessions
        .get(session)
        .await
        .ok_or(ApiError::SessionExpired)?
        .is_authenticated();

    // Credentials are checked outside the session lock. An authenticated
    // session keeps its identity, so the check is skipped; `false` ensures a
    // logout landing in between cannot turn into an unchecked login.
    let verified = if already {
        false
    } else {
        let username = req.username.clone();
        let password = req.password;
        run_blocking(&state, move |db| db.authenticate(&username, &password)).await?
    };

    let transition = state
        .sessions
        .update(session, |ctx| ctx.login(&req.username, verified))
        .await
        .ok_or(ApiError::SessionExpired)?;

    if !transition.context.is_authenticated() {
        warn!(username = %req.username, "Login failed");
        return Err(ApiError::InvalidCredentials);
    }

    if transition.directive == RenderDirective::Refresh {
        info!(username = %req.username, "User logged in");
    }

    let mut response = session_response(&transition.context);
    response.directive = Some(transition.directive);
    Ok(Json(response))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> Result<Json<SessionResponse>, ApiError> {
    let mut previous = None;
    let transition = state
        .sessions
        .update(session, |ctx| {
            previous = ctx.identity().map(str::to_string);
            ctx.logout()
        })
        .await
        .ok_or(ApiError::SessionExpired)?;

    if let Some(username) = previous {
        info!(username = %username, "User logged out");
    }

    let mut response = session_response(&transition.context);
    response.directive = Some(transition.directive);
    Ok(Json(response))
}
