use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::debug;
use uuid::Uuid;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::session::SessionId;

pub const SESSION_COOKIE: &str = "carpool_session";

/// Username of the authenticated caller, inserted by [`require_auth`].
#[derive(Debug, Clone)]
pub struct Identity(pub String);

/// Resolve the caller's session from the cookie, starting a new anonymous
/// one when the cookie is missing or names an unknown session.
pub async fn attach_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let from_cookie = jar
        .get(SESSION_COOKIE)
        .and_then(|c| c.value().parse::<Uuid>().ok())
        .map(SessionId);

    let known = match from_cookie {
        Some(id) => state.sessions.touch(id).await.then_some(id),
        None => None,
    };

    let (session, fresh) = match known {
        Some(id) => (id, false),
        None => {
            let id = state.sessions.create().await;
            debug!(session = %id.0, "Started new session");
            (id, true)
        }
    };

    req.extensions_mut().insert(session);
    let response = next.run(req).await;

    if fresh {
        let cookie = Cookie::build((SESSION_COOKIE, session.0.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax);
        (jar.add(cookie), response).into_response()
    } else {
        response
    }
}

/// Reject anonymous sessions; expose the username to handlers otherwise.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = req
        .extensions()
        .get::<SessionId>()
        .copied()
        .ok_or(ApiError::Unauthenticated)?;

    let username = state
        .sessions
        .get(session)
        .await
        .and_then(|ctx| ctx.identity().map(str::to_string))
        .ok_or(ApiError::Unauthenticated)?;

    req.extensions_mut().insert(Identity(username));
    Ok(next.run(req).await)
}
