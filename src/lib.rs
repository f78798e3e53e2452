//! FitCoach Rust Client Library
//!
//! A client for the FitCoach workout and meal planning API. It keeps the
//! signed-in session (bearer token plus cached profile) in an injected
//! credential store, attaches the token to every request, tears the session
//! down when the backend rejects it, and decides which views the current
//! user may enter.
//!
//! ```no_run
//! use fitcoach_client::FitCoach;
//! use fitcoach_client::plans::DayKey;
//!
//! # async fn run() -> fitcoach_client::error::Result<()> {
//! let client = FitCoach::new("http://localhost:8000")?;
//! let profile = client.auth().login("athlete@example.com", "secret").await?;
//! println!("signed in as {}", profile.full_name);
//!
//! let day = DayKey::from_ymd(2024, 5, 10).unwrap();
//! for plan in client.meals().for_day(day).await? {
//!     println!("{}: {}", day, plan.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod fetch;
pub mod plans;
pub mod routes;
pub mod users;
pub mod view;

use std::sync::Arc;

use reqwest::Client;
use tracing::warn;

use crate::auth::{Auth, CredentialStore, FileStore, KeyValueStore, MemoryStore, SessionCell, SessionState};
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::Gateway;
use crate::plans::{MealPlansClient, WorkoutPlansClient};
use crate::users::UsersClient;

/// The main entry point for the FitCoach client
pub struct FitCoach {
    /// The base URL of the API
    pub url: String,
    /// Client options
    pub options: ClientOptions,
    gateway: Arc<Gateway>,
    session: Arc<SessionCell>,
    auth: Auth,
}

impl FitCoach {
    /// Create a client with default options
    pub fn new(api_url: &str) -> Result<Self> {
        Self::new_with_options(api_url, ClientOptions::default())
    }

    /// Create a client with custom options.
    ///
    /// Credentials persist under `options.storage_dir` when set, otherwise
    /// they live in memory only.
    pub fn new_with_options(api_url: &str, options: ClientOptions) -> Result<Self> {
        let backend: Arc<dyn KeyValueStore> = match &options.storage_dir {
            Some(dir) => Arc::new(FileStore::open(dir)?),
            None => Arc::new(MemoryStore::new()),
        };
        Self::with_store(api_url, backend, options)
    }

    /// Create a client on top of an existing key-value store
    pub fn with_store(
        api_url: &str,
        backend: Arc<dyn KeyValueStore>,
        options: ClientOptions,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| Error::invalid_input(format!("failed to build HTTP client: {}", e)))?;

        let store = CredentialStore::new(backend, &options);
        let session = Arc::new(SessionCell::new(persisted_state(&store)));
        let gateway = Arc::new(Gateway::new(
            api_url,
            http_client,
            store.clone(),
            session.clone(),
        )?);
        let auth = Auth::new(gateway.clone(), store, session.clone());

        Ok(Self {
            url: gateway.base_url().to_string(),
            options,
            gateway,
            session,
            auth,
        })
    }

    /// Create a client from `FITCOACH_*` environment variables
    pub fn from_env() -> Result<Self> {
        let (url, options) = ClientOptions::from_env()?;
        Self::new_with_options(url.as_str(), options)
    }

    /// Session manager
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Snapshot of the session state, for the route guard
    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// The request gateway shared by every resource client
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn users(&self) -> UsersClient {
        UsersClient::new(self.gateway.clone())
    }

    pub fn workouts(&self) -> WorkoutPlansClient {
        WorkoutPlansClient::new(self.gateway.clone())
    }

    pub fn meals(&self) -> MealPlansClient {
        MealPlansClient::new(self.gateway.clone())
    }
}

/// Session state implied by what survived in the store. Only a token with
/// its profile counts as signed in; call [`Auth::restore`] to re-validate.
fn persisted_state(store: &CredentialStore) -> SessionState {
    match (store.get(), store.profile()) {
        (Some(_), Some(profile)) => SessionState::Authenticated(profile),
        (None, Some(_)) => {
            if let Err(err) = store.clear() {
                warn!(error = %err, "failed to drop orphaned profile");
            }
            SessionState::Anonymous
        }
        _ => SessionState::Anonymous,
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{Registration, SessionEvent, SessionState, UserProfile};
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::plans::{DayKey, MealPlan, WorkoutPlan};
    pub use crate::routes::{can_enter, Decision, Navigator, Requirement, Route};
    pub use crate::FitCoach;
}
