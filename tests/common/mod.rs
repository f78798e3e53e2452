#![allow(dead_code)]

use std::sync::Arc;

use fitcoach_client::auth::{KeyValueStore, MemoryStore};
use fitcoach_client::config::ClientOptions;
use fitcoach_client::FitCoach;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const FORM: &str = "application/x-www-form-urlencoded";

pub fn profile_json(email: &str, is_admin: bool) -> Value {
    json!({
        "email": email,
        "full_name": "Test User",
        "is_admin": is_admin
    })
}

/// Client with its own in-memory store, so tests can look inside it
pub fn client(server: &MockServer) -> (FitCoach, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let client = FitCoach::with_store(&server.uri(), store.clone(), ClientOptions::default())
        .expect("client");
    (client, store)
}

pub fn stored_token(store: &MemoryStore) -> Option<String> {
    store.get("token").expect("memory store never fails")
}

/// Accepts any password for `email`, hands out `token`, and serves the
/// matching profile for that token.
pub async fn mount_account(server: &MockServer, email: &str, token: &str, is_admin: bool) {
    let username = email.replace('@', "%40");
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header("content-type", FORM))
        .and(wiremock::matchers::body_string_contains(format!("username={}", username)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "token_type": "bearer"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json(email, is_admin)))
        .mount(server)
        .await;
}
