//! Configuration options for the FitCoach client

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Default request timeout; the transport default is unbounded.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration options for the FitCoach client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout applied to every call
    pub request_timeout: Option<Duration>,

    /// Storage key holding the bearer token
    pub token_key: String,

    /// Storage key holding the cached profile (JSON)
    pub profile_key: String,

    /// Directory for the file-backed credential store, if any
    pub storage_dir: Option<PathBuf>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            token_key: "token".to_string(),
            profile_key: "user".to_string(),
            storage_dir: None,
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the token storage key
    pub fn with_token_key(mut self, value: &str) -> Self {
        self.token_key = value.to_string();
        self
    }

    /// Set the profile storage key
    pub fn with_profile_key(mut self, value: &str) -> Self {
        self.profile_key = value.to_string();
        self
    }

    /// Persist credentials as files under `dir`
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Load options and the API base URL from the environment (and `.env`).
    ///
    /// * `FITCOACH_API_URL` (required)
    /// * `FITCOACH_REQUEST_TIMEOUT_SECS` (optional, `0` disables the timeout)
    /// * `FITCOACH_STORAGE_DIR` (optional)
    pub fn from_env() -> Result<(Url, Self)> {
        dotenv::dotenv().ok();

        let url = env::var("FITCOACH_API_URL")
            .map_err(|_| Error::invalid_input("FITCOACH_API_URL environment variable not found"))?;
        let url = Url::parse(&url)?;

        let mut options = Self::default();
        if let Ok(secs) = env::var("FITCOACH_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::invalid_input(format!("invalid FITCOACH_REQUEST_TIMEOUT_SECS: {}", secs))
            })?;
            options.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Ok(dir) = env::var("FITCOACH_STORAGE_DIR") {
            options.storage_dir = Some(PathBuf::from(dir));
        }

        Ok((url, options))
    }
}
