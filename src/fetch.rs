//! Authenticated request gateway
//!
//! Every call to the backend goes through [`Gateway::request`]. Headers are
//! computed per call from the credential store as it is at send time, and
//! every failure is classified into [`Error`] before it leaves this module.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::auth::session::SessionCell;
use crate::auth::store::CredentialStore;
use crate::error::{Error, ErrorDetail, Result};

/// Credentials-exchange endpoint. Form encoded, never carries a bearer token.
pub const TOKEN_PATH: &str = "/token";

const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// Per-call extras on top of the computed headers
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    /// Extra headers. `Authorization` is owned by the gateway and ignored here.
    pub headers: Vec<(String, String)>,
    /// Replaces the client-wide timeout for this call
    pub timeout: Option<Duration>,
}

/// A successful (2xx) response with its body already read
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: Bytes,
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Whether `path` is the credentials-exchange endpoint
pub fn is_token_endpoint(path: &str) -> bool {
    let path = path.split('?').next().unwrap_or_default();
    path.trim_end_matches('/') == TOKEN_PATH
}

fn form_encode(body: &Value) -> Result<String> {
    let fields = body
        .as_object()
        .ok_or_else(|| Error::invalid_input("form body must be a JSON object"))?;
    let mut form = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in fields {
        match value {
            Value::Null => {}
            Value::String(s) => {
                form.append_pair(key, s);
            }
            other => {
                form.append_pair(key, &other.to_string());
            }
        }
    }
    Ok(form.finish())
}

/// Sends requests on behalf of every resource client
pub struct Gateway {
    base_url: String,
    client: Client,
    store: CredentialStore,
    session: Arc<SessionCell>,
}

impl Gateway {
    /// Create a gateway for the API rooted at `base_url`
    pub fn new(
        base_url: &str,
        client: Client,
        store: CredentialStore,
        session: Arc<SessionCell>,
    ) -> Result<Self> {
        Url::parse(base_url)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            store,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    fn url_for(&self, path: &str) -> Result<Url> {
        if !path.starts_with('/') {
            return Err(Error::invalid_input(format!(
                "request path must start with '/': {}",
                path
            )));
        }
        Ok(Url::parse(&format!("{}{}", self.base_url, path))?)
    }

    /// Start a GET request
    pub fn get(&self, path: &str) -> FetchBuilder<'_> {
        FetchBuilder::new(self, Method::GET, path)
    }

    /// Start a POST request
    pub fn post(&self, path: &str) -> FetchBuilder<'_> {
        FetchBuilder::new(self, Method::POST, path)
    }

    /// Send one request.
    ///
    /// The token endpoint gets a form-encoded body and no `Authorization`
    /// header; every other path gets a JSON body and the current bearer token,
    /// if any. Nothing is retried. A 401 on an authenticated call clears the
    /// stored credential and ends the session before the error is returned.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        overrides: Option<RequestOverrides>,
    ) -> Result<ApiResponse> {
        let token_endpoint = is_token_endpoint(path);
        let url = self.url_for(path)?;
        let overrides = overrides.unwrap_or_default();

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON));
        for (name, value) in &overrides.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::invalid_input(format!("invalid header name {}: {}", name, e)))?;
            if name == AUTHORIZATION {
                continue;
            }
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::invalid_input(format!("invalid header value: {}", e)))?;
            headers.insert(name, value);
        }

        let sent_token = if token_endpoint { None } else { self.store.get() };
        if let Some(token) = &sent_token {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => {
                    // Torn down like a 401; nothing is sent.
                    warn!(%method, path, "stored token is not a valid header value");
                    self.credential_rejected(Some(token));
                    return Err(Error::Unauthorized {
                        detail: ErrorDetail::Raw("stored credential is unusable".to_string()),
                    });
                }
            }
        }

        let payload = match &body {
            Some(body) if token_endpoint => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM));
                Some(form_encode(body)?.into_bytes())
            }
            Some(body) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
                Some(serde_json::to_vec(body)?)
            }
            None => None,
        };

        let mut req = self.client.request(method.clone(), url).headers(headers);
        if let Some(payload) = payload {
            req = req.body(payload);
        }
        if let Some(timeout) = overrides.timeout {
            req = req.timeout(timeout);
        }

        debug!(%method, path, authenticated = sent_token.is_some(), "sending request");
        let response = req.send().await.map_err(|err| {
            warn!(%method, path, error = %err, "no response from backend");
            Error::Network(err)
        })?;

        let status = response.status();
        let body = response.bytes().await?;
        debug!(%method, path, status = status.as_u16(), "response received");

        if status == StatusCode::UNAUTHORIZED && !token_endpoint {
            self.credential_rejected(sent_token.as_deref());
        }
        if !status.is_success() {
            return Err(Error::from_status(status, &body));
        }

        Ok(ApiResponse { status, body })
    }

    /// Tear the session down after a 401, unless the rejected token has
    /// already been replaced by a newer sign-in.
    fn credential_rejected(&self, sent_token: Option<&str>) {
        let current = self.store.get();
        if current.as_deref() != sent_token {
            debug!("ignoring 401 for a superseded token");
            return;
        }
        if current.is_some() {
            if let Err(err) = self.store.clear() {
                warn!(error = %err, "failed to clear rejected credential");
            }
        }
        self.session.expire();
    }
}

/// Helper for building and executing one gateway request
pub struct FetchBuilder<'a> {
    gateway: &'a Gateway,
    method: Method,
    path: String,
    body: Option<Value>,
    overrides: RequestOverrides,
}

impl<'a> FetchBuilder<'a> {
    fn new(gateway: &'a Gateway, method: Method, path: &str) -> Self {
        Self {
            gateway,
            method,
            path: path.to_string(),
            body: None,
            overrides: RequestOverrides::default(),
        }
    }

    /// Add a header to the request
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.overrides
            .headers
            .push((name.to_string(), value.to_string()));
        self
    }

    /// Override the timeout for this request
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.overrides.timeout = Some(timeout);
        self
    }

    /// Set the request body. Encoding is picked by the gateway from the path.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Execute the request and parse the response as JSON
    pub async fn execute<T: DeserializeOwned>(self) -> Result<T> {
        self.execute_raw().await?.json()
    }

    /// Execute the request and return the response body unparsed
    pub async fn execute_raw(self) -> Result<ApiResponse> {
        self.gateway
            .request(self.method, &self.path, self.body, Some(self.overrides))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recognises_token_endpoint() {
        assert!(is_token_endpoint("/token"));
        assert!(is_token_endpoint("/token/"));
        assert!(is_token_endpoint("/token?x=1"));
        assert!(!is_token_endpoint("/tokens"));
        assert!(!is_token_endpoint("/users/token"));
    }

    #[test]
    fn form_encodes_objects() {
        let encoded = form_encode(&json!({ "username": "a@b.c", "password": "p&w d" })).unwrap();
        assert_eq!(encoded, "password=p%26w+d&username=a%40b.c");
    }

    #[test]
    fn form_rejects_non_objects() {
        assert!(form_encode(&json!(["x"])).is_err());
    }

    #[test]
    fn rejects_relative_paths() {
        let gateway = Gateway::new(
            "http://localhost:8000/",
            Client::new(),
            CredentialStore::in_memory(),
            Arc::new(SessionCell::default()),
        )
        .unwrap();
        assert_eq!(gateway.base_url(), "http://localhost:8000");
        assert!(gateway.url_for("users/me").is_err());
        assert_eq!(
            gateway.url_for("/users/me").unwrap().as_str(),
            "http://localhost:8000/users/me"
        );
    }
}
