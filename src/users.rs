//! User endpoints

use std::sync::Arc;

use crate::auth::{Registration, User, UserProfile, PROFILE_PATH, REGISTER_PATH};
use crate::error::Result;
use crate::fetch::Gateway;

/// Client for `/users/*`
pub struct UsersClient {
    gateway: Arc<Gateway>,
}

impl UsersClient {
    pub(crate) fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Profile of the signed-in user
    pub async fn me(&self) -> Result<UserProfile> {
        self.gateway.get(PROFILE_PATH).execute().await
    }

    /// Every user (admin only)
    pub async fn list(&self) -> Result<Vec<User>> {
        self.gateway.get("/users/").execute().await
    }

    /// Users the signed-in admin may assign plans to
    pub async fn assigned(&self) -> Result<Vec<User>> {
        self.gateway.get("/users/assigned").execute().await
    }

    /// Create an account for someone else, without touching the current
    /// session
    pub async fn create(&self, registration: &Registration) -> Result<User> {
        self.gateway
            .post(REGISTER_PATH)
            .json(registration)?
            .execute()
            .await
    }
}
