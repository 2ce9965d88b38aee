//! # Session State
//!
//! Holds the current session and tells interested parts of the app when it
//! changes.
//!
//! ## Observer Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SessionManager                                                         │
//! │                                                                         │
//! │  subscribe(observer) ──► ObserverId                                     │
//! │  unsubscribe(id)                                                        │
//! │                                                                         │
//! │  sign_in / sign_up ─────► AuthProvider ──► notify(SignedIn(session))    │
//! │  sign_out ──────────────► AuthProvider ──► notify(SignedOut)            │
//! │  require_session ───────► AuthProvider::get_session                     │
//! │        └── none, but we had one ────────► notify(SessionExpired)        │
//! │        └── none ─────────────────────────► Err(SESSION_EXPIRED)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Observers are called after the lock is released, so an observer may
//! subscribe or unsubscribe from inside its callback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use filamento_db::{AuthProvider, Session};

/// A change in authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut,
    /// The provider no longer reports the session we held.
    SessionExpired,
}

/// Receives [`AuthEvent`]s.
pub trait SessionObserver: Send + Sync {
    fn on_auth_event(&self, event: &AuthEvent);
}

impl<F> SessionObserver for F
where
    F: Fn(&AuthEvent) + Send + Sync,
{
    fn on_auth_event(&self, event: &AuthEvent) {
        self(event)
    }
}

/// Handle returned by [`SessionManager::subscribe`].
pub type ObserverId = u64;

/// Current session plus its observers.
pub struct SessionManager {
    provider: Arc<dyn AuthProvider>,
    current: RwLock<Option<Session>>,
    observers: Mutex<Vec<(ObserverId, Arc<dyn SessionObserver>)>>,
    next_id: AtomicU64,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        SessionManager {
            provider,
            current: RwLock::new(None),
            observers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    // =========================================================================
    // Observers
    // =========================================================================

    pub fn subscribe(&self, observer: Arc<dyn SessionObserver>) -> ObserverId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, observer));
        debug!(observer = id, "Session observer subscribed");
        id
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.lock().unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn notify(&self, event: AuthEvent) {
        let observers: Vec<Arc<dyn SessionObserver>> = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, o)| o.clone())
            .collect();

        for observer in observers {
            observer.on_auth_event(&event);
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// The session held right now, without asking the provider.
    pub fn current(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, session: Option<Session>) -> Option<Session> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, session)
    }

    /// Picks up a session the provider already has, e.g. at startup.
    pub async fn restore(&self) -> Result<Option<Session>, ApiError> {
        let session = self.provider.get_session().await?;
        if let Some(s) = &session {
            self.replace(Some(s.clone()));
            self.notify(AuthEvent::SignedIn(s.clone()));
        }
        Ok(session)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let session = self.provider.sign_in(email, password).await?;
        self.replace(Some(session.clone()));

        info!(user_id = %session.user_id, "Session started");
        self.notify(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<Session, ApiError> {
        let session = self.provider.sign_up(email, password, full_name).await?;
        self.replace(Some(session.clone()));

        info!(user_id = %session.user_id, "Account created");
        self.notify(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    pub async fn sign_out(&self) -> Result<(), ApiError> {
        self.provider.sign_out().await?;
        self.replace(None);
        self.notify(AuthEvent::SignedOut);
        Ok(())
    }

    /// Checks with the provider that a session is still valid.
    ///
    /// Commands call this before touching the store. When the session we
    /// held is gone, observers get [`AuthEvent::SessionExpired`].
    pub async fn require_session(&self) -> Result<Session, ApiError> {
        match self.provider.get_session().await? {
            Some(session) => {
                self.replace(Some(session.clone()));
                Ok(session)
            }
            None => {
                if let Some(previous) = self.replace(None) {
                    warn!(user_id = %previous.user_id, "Session expired");
                    self.notify(AuthEvent::SessionExpired);
                }
                Err(ApiError::session_expired())
            }
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("current", &self.current().map(|s| s.user_id))
            .field("observers", &self.observer_count())
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
