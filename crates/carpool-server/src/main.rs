use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tower_http::trace::TraceLayer;
use tracing::info;

use carpool_api::auth::{AppState, AppStateInner};
use carpool_api::session::{self, SessionRegistry};

/// Database file used when `CARPOOL_DB_PATH` is unset.
const DEFAULT_DB_PATH: &str = "carpooling.db";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "carpool=debug,carpool_api=debug,carpool_db=info,tower_http=debug".into()
            }),
        )
        .init();

    // Config
    let db_path: PathBuf = std::env::var("CARPOOL_DB_PATH")
        .unwrap_or_else(|_| DEFAULT_DB_PATH.into())
        .into();
    let host = std::env::var("CARPOOL_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("CARPOOL_PORT")
        .unwrap_or_else(|_| "8501".into())
        .parse()?;
    let idle_minutes: u64 = std::env::var("CARPOOL_SESSION_IDLE_MINUTES")
        .unwrap_or_else(|_| "720".into())
        .parse()?;
    let sweep_secs: u64 = std::env::var("CARPOOL_SESSION_SWEEP_SECS")
        .unwrap_or_else(|_| "300".into())
        .parse()?;

    // Init database (creates tables on first run)
    let db = carpool_db::Database::open(&db_path)?;

    let sessions = SessionRegistry::new();
    tokio::spawn(session::run_session_sweep(
        sessions.clone(),
        Duration::from_secs(idle_seconds(idle_minutes)),
        Duration::from_secs(sweep_secs.max(1)),
    ));

    let state: AppState = Arc::new(AppStateInner { db, sessions });

    let app = carpool_api::router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Carpool server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Idle timeout in seconds; huge minute counts clamp instead of overflowing.
fn idle_seconds(minutes: u64) -> u64 {
    minutes.saturating_mul(60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_seconds_saturates() {
        assert_eq!(idle_seconds(720), 43_200);
        assert_eq!(idle_seconds(u64::MAX), u64::MAX);
        assert_eq!(idle_seconds(u64::MAX / 60 + 1), u64::MAX);
    }
}
