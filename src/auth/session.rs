//! In-memory session state shared by the session manager and the gateway

use std::sync::{PoisonError, RwLock};

use tokio::sync::broadcast;
use tracing::{info, warn};

use super::types::UserProfile;

/// Where the client currently stands
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    /// A token exchange or profile fetch is in progress
    Authenticating,
    /// The role in `profile.is_admin` is fixed until the next sign-in
    Authenticated(UserProfile),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, SessionState::Authenticated(p) if p.is_admin)
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            SessionState::Authenticated(profile) => Some(profile),
            _ => None,
        }
    }
}

/// Notifications for whoever drives navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(UserProfile),
    /// Sign-in attempt failed; the session is back to anonymous
    AuthFailed(String),
    SignedOut,
    /// The backend rejected the credential; redirect to login.
    /// Sent at most once per authenticated session.
    Expired,
}

const EVENT_CAPACITY: usize = 16;

/// Session state plus its change feed
#[derive(Debug)]
pub struct SessionCell {
    state: RwLock<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for SessionCell {
    fn default() -> Self {
        Self::new(SessionState::Anonymous)
    }
}

impl SessionCell {
    pub fn new(initial: SessionState) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: RwLock::new(initial),
            events,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn replace(&self, next: SessionState) -> SessionState {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *state, next)
    }

    fn emit(&self, event: SessionEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    pub(crate) fn begin_authenticating(&self) {
        self.replace(SessionState::Authenticating);
    }

    pub(crate) fn authenticated(&self, profile: UserProfile) {
        info!(admin = profile.is_admin, "session established");
        self.replace(SessionState::Authenticated(profile.clone()));
        self.emit(SessionEvent::SignedIn(profile));
    }

    pub(crate) fn failed(&self, reason: String) {
        warn!(reason = %reason, "sign-in failed");
        self.replace(SessionState::Anonymous);
        self.emit(SessionEvent::AuthFailed(reason));
    }

    /// Explicit logout. Returns whether a session was actually ended.
    pub(crate) fn signed_out(&self) -> bool {
        let previous = self.replace(SessionState::Anonymous);
        let ended = previous != SessionState::Anonymous;
        if ended {
            info!("signed out");
            self.emit(SessionEvent::SignedOut);
        }
        ended
    }

    /// Credential rejected by the backend. Only an authenticated session is
    /// ended; only the first call for it emits [`SessionEvent::Expired`].
    pub(crate) fn expire(&self) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.is_authenticated() {
            return false;
        }
        *state = SessionState::Anonymous;
        drop(state);

        warn!("session expired, credential rejected by backend");
        self.emit(SessionEvent::Expired);
        true
    }
}
