use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use carpool_types::api::RenderDirective;
use carpool_types::models::Action;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password.";

/// Per-browser-session state. `identity` is `None` while anonymous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    identity: Option<String>,
}

/// Result of a session transition: the next context and what the
/// presentation layer should do about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub context: SessionContext,
    pub directive: RenderDirective,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Apply a login attempt whose credentials have already been checked.
    ///
    /// An authenticated session stays as it is and ignores `verified`.
    pub fn login(self, username: &str, verified: bool) -> Transition {
        if self.is_authenticated() {
            return Transition {
                context: self,
                directive: RenderDirective::None,
            };
        }

        if verified {
            Transition {
                context: Self {
                    identity: Some(username.to_string()),
                },
                directive: RenderDirective::Refresh,
            }
        } else {
            Transition {
                context: self,
                directive: RenderDirective::ShowError {
                    message: INVALID_CREDENTIALS_MESSAGE.to_string(),
                },
            }
        }
    }

    pub fn logout(self) -> Transition {
        if self.is_authenticated() {
            Transition {
                context: Self::anonymous(),
                directive: RenderDirective::Refresh,
            }
        } else {
            Transition {
                context: self,
                directive: RenderDirective::None,
            }
        }
    }

    pub fn available_actions(&self) -> Vec<Action> {
        if self.is_authenticated() {
            vec![Action::PostRide, Action::SearchRides, Action::Logout]
        } else {
            vec![Action::Login, Action::Register]
        }
    }
}

/// Opaque id carried in the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

struct SessionEntry {
    context: SessionContext,
    last_seen: Instant,
}

/// Server-side session contexts keyed by session id.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new anonymous session.
    pub async fn create(&self) -> SessionId {
        let id = Uuid::new_v4();
        self.inner.write().await.insert(
            id,
            SessionEntry {
                context: SessionContext::anonymous(),
                last_seen: Instant::now(),
            },
        );
        SessionId(id)
    }

    /// Mark the session as active. Returns false if it is unknown.
    pub async fn touch(&self, id: SessionId) -> bool {
        match self.inner.write().await.get_mut(&id.0) {
            Some(entry) => {
                entry.last_seen = Instant::now();
                true
            }
            None => false,
        }
    }

    pub async fn get(&self, id: SessionId) -> Option<SessionContext> {
        self.inner
            .read()
            .await
            .get(&id.0)
            .map(|entry| entry.context.clone())
    }

    /// Apply a transition to a live session under a single write lock.
    ///
    /// Returns `None` without inserting anything if the session is unknown,
    /// so an evicted session is never brought back.
    pub async fn update<F>(&self, id: SessionId, f: F) -> Option<Transition>
    where
        F: FnOnce(SessionContext) -> Transition,
    {
        let mut sessions = self.inner.write().await;
        let entry = sessions.get_mut(&id.0)?;

        let transition = f(std::mem::take(&mut entry.context));
        entry.context = transition.context.clone();
        entry.last_seen = Instant::now();
        Some(transition)
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Drop sessions not seen within `max_idle`. Returns how many were removed.
    pub async fn remove_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed() <= max_idle);
        before - sessions.len()
    }
}

/// Background task that evicts idle sessions.
pub async fn run_session_sweep(sessions: SessionRegistry, max_idle: Duration, interval: Duration) {
    let mut interval = tokio::time::interval(interval);

    loop {
        interval.tick().await;

        let removed = sessions.remove_idle(max_idle).await;
        if removed > 0 {
            info!("Session sweep: evicted {} idle sessions", removed);
        }
    }
}
