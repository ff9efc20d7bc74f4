pub mod auth;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod rides;
pub mod session;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use carpool_db::{Database, StoreError};

use crate::auth::AppState;
use crate::error::ApiError;

/// All routes, with session resolution on every request and login required
/// for the ride endpoints.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/session", get(auth::current_session))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout));

    let protected_routes = Router::new()
        .route("/rides", post(rides::post_ride).get(rides::search_rides))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::attach_session,
        ))
        .with_state(state)
}

/// Run a store operation off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    let result = tokio::task::spawn_blocking(move || f(&state.db)).await?;
    Ok(result?)
}
