//! Authentication and session management
//!
//! [`Auth`] drives the session state machine:
//!
//! ```text
//! Anonymous --login--> Authenticating --token + profile--> Authenticated
//!                          |                                  |
//!                          +--rejected / profile failed-->    +--logout / 401-->  Anonymous
//! ```
//!
//! A failed attempt never leaves a token behind, and the admin flag always
//! comes from the backend's profile.

pub mod session;
pub mod store;
mod types;

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::fetch::{Gateway, TOKEN_PATH};

pub use session::{SessionCell, SessionEvent, SessionState};
pub use store::{CredentialStore, FileStore, KeyValueStore, MemoryStore};
pub use types::*;

/// Profile endpoint
pub const PROFILE_PATH: &str = "/users/me";
/// Registration endpoint
pub const REGISTER_PATH: &str = "/users/";

/// Session manager
pub struct Auth {
    gateway: Arc<Gateway>,
    store: CredentialStore,
    session: Arc<SessionCell>,
}

impl Auth {
    pub(crate) fn new(
        gateway: Arc<Gateway>,
        store: CredentialStore,
        session: Arc<SessionCell>,
    ) -> Self {
        Self {
            gateway,
            store,
            session,
        }
    }

    /// Sign in with an email (or username) and password.
    ///
    /// The token is stored before the profile is fetched, since the gateway
    /// reads it from the store at send time. If anything after the token
    /// exchange fails, the stored token is removed again and the session
    /// ends up exactly as after a rejected password.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<UserProfile> {
        if identifier.trim().is_empty() || password.is_empty() {
            return Err(Error::invalid_input("email and password are required"));
        }

        self.discard_credentials();
        self.session.begin_authenticating();

        match self.authenticate(identifier.trim(), password).await {
            Ok(profile) => {
                self.session.authenticated(profile.clone());
                Ok(profile)
            }
            Err(err) => {
                self.discard_credentials();
                self.session.failed(err.to_string());
                Err(err)
            }
        }
    }

    async fn authenticate(&self, identifier: &str, password: &str) -> Result<UserProfile> {
        let grant = PasswordGrant {
            username: identifier,
            password,
        };
        let token: TokenResponse = self
            .gateway
            .post(TOKEN_PATH)
            .json(&grant)?
            .execute()
            .await?;

        self.store.set(&token.access_token)?;
        let profile = self.fetch_profile().await?;
        self.store.set_profile(&profile)?;
        Ok(profile)
    }

    /// Create an account, then sign in with the same credentials.
    ///
    /// Whether `admin_code` grants admin rights is only known from the
    /// profile fetched during the sign-in.
    pub async fn register(&self, registration: Registration) -> Result<UserProfile> {
        if registration.email.trim().is_empty() || registration.password.is_empty() {
            return Err(Error::invalid_input("email and password are required"));
        }

        self.gateway
            .post(REGISTER_PATH)
            .json(&registration)?
            .execute_raw()
            .await?;
        debug!("account created, signing in");

        self.login(&registration.email, &registration.password).await
    }

    /// Drop the credential and profile. Always succeeds.
    pub fn logout(&self) {
        self.discard_credentials();
        self.session.signed_out();
    }

    /// Re-validate a persisted session with one profile fetch.
    ///
    /// Meant to run once at startup. Any failure forces the anonymous state.
    pub async fn restore(&self) -> Option<UserProfile> {
        if self.store.get().is_none() {
            self.discard_credentials();
            return None;
        }

        let was_authenticated = self.session.state().is_authenticated();
        if !was_authenticated {
            self.session.begin_authenticating();
        }
        match self.fetch_profile().await {
            Ok(profile) => match self.store.set_profile(&profile) {
                Ok(()) => {
                    self.session.authenticated(profile.clone());
                    Some(profile)
                }
                Err(err) => {
                    self.discard_credentials();
                    self.session.failed(err.to_string());
                    None
                }
            },
            // The gateway already tore the session down (or the token was
            // superseded by a newer sign-in), and sent `Expired` if needed.
            Err(err) if was_authenticated && err.is_unauthorized() => {
                debug!("persisted session rejected by backend");
                None
            }
            Err(err) => {
                self.discard_credentials();
                self.session.failed(err.to_string());
                None
            }
        }
    }

    async fn fetch_profile(&self) -> Result<UserProfile> {
        self.gateway.get(PROFILE_PATH).execute().await
    }

    fn discard_credentials(&self) {
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear credential store");
        }
    }

    /// Profile of the signed-in user
    pub fn current_user(&self) -> Option<UserProfile> {
        self.session.state().profile().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.state().is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.session.state().is_admin()
    }

    /// Snapshot of the session state
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Subscribe to session changes (sign-in, sign-out, expiry)
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.subscribe()
    }
}
