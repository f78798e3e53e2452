//! Types for authentication and user management

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The signed-in user's profile as reported by `GET /users/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub full_name: String,
    /// Decided by the backend; never set by the client
    pub is_admin: bool,
}

/// A user record as listed by the admin endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default, with = "crate::plans::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            is_admin: user.is_admin,
        }
    }
}

/// Response of the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Form body of the token endpoint
#[derive(Debug, Serialize)]
pub(crate) struct PasswordGrant<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Account registration fields
///
/// Has no `is_admin` field. Elevation is requested with `admin_code` and
/// granted (or not) by the backend.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_code: Option<String>,
}

impl Registration {
    pub fn new(email: &str, password: &str, full_name: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
            admin_code: None,
        }
    }

    /// Ask the backend for admin rights with a trainer code
    pub fn with_admin_code(mut self, code: &str) -> Self {
        self.admin_code = Some(code.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registration_never_sends_admin_flag() {
        let body = serde_json::to_value(Registration::new("a@b.c", "pw", "A B")).unwrap();
        assert_eq!(
            body,
            json!({ "email": "a@b.c", "password": "pw", "full_name": "A B" })
        );

        let body =
            serde_json::to_value(Registration::new("a@b.c", "pw", "A B").with_admin_code("X"))
                .unwrap();
        assert_eq!(body["admin_code"], "X");
        assert!(body.get("is_admin").is_none());
    }

    #[test]
    fn user_decodes_naive_created_at() {
        let user: User = serde_json::from_value(json!({
            "id": 7,
            "email": "u@example.com",
            "full_name": "U",
            "is_admin": false,
            "created_at": "2024-05-01T08:00:00.123456"
        }))
        .unwrap();
        assert_eq!(
            user.created_at.map(|t| t.to_rfc3339()),
            Some("2024-05-01T08:00:00.123456+00:00".to_string())
        );
    }
}
