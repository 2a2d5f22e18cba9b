//! Supabase-backed implementation of `Backend`.
//!
//! Talks to the two HTTP APIs a Supabase project exposes under one base URL:
//!
//! - `/rest/v1/...` - PostgREST tables and `rpc/` stored procedures
//! - `/auth/v1/...` - GoTrue password sign-in and sign-up
//!
//! Every request authenticates with the service role key, sent both as the
//! `apikey` header and as a bearer token.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::query::SINGLE_OBJECT_ACCEPT;
use super::{Backend, Credentials, TableQuery};
use crate::error::BackendError;

/// HTTP client for a Supabase project.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Clone)]
pub struct SupabaseBackend {
    client: Client,
    base_url: Url,
}

impl SupabaseBackend {
    /// Create a client for the project at `base_url` using `service_key`.
    ///
    /// Fails if the URL cannot be parsed or the key is not a valid header value.
    pub fn new(base_url: &str, service_key: &str) -> Result<Self, BackendError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| BackendError::Config(format!("invalid backend URL '{}': {}", base_url, e)))?;

        // Url::join replaces the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut apikey = HeaderValue::from_str(service_key)
            .map_err(|_| BackendError::Config("service key is not a valid header value".into()))?;
        apikey.set_sensitive(true);

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", service_key))
            .map_err(|_| BackendError::Config("service key is not a valid header value".into()))?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("apikey", apikey);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("roster-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackendError::Config(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// The normalized project URL (always ends in `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Probe the auth service health endpoint.
    pub async fn health(&self) -> Result<Value, BackendError> {
        let url = self.endpoint("auth/v1/health")?;
        send(self.client.get(url)).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base_url
            .join(path)
            .map_err(|e| BackendError::Config(format!("invalid endpoint '{}': {}", path, e)))
    }
}

#[async_trait]
impl Backend for SupabaseBackend {
    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Value, BackendError> {
        let url = self.endpoint("auth/v1/token")?;
        debug!(endpoint = %url, "Password sign-in");

        let request = self
            .client
            .post(url)
            .query(&[("grant_type", "password")])
            .json(credentials);

        send(request).await.map(into_user)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Value, BackendError> {
        let url = self.endpoint("auth/v1/signup")?;
        debug!(endpoint = %url, "Sign-up");

        send(self.client.post(url).json(credentials))
            .await
            .map(into_user)
    }

    async fn execute(&self, query: TableQuery) -> Result<Value, BackendError> {
        let url = self.endpoint(&format!("rest/v1/{}", query.table()))?;
        let method = query.method();
        debug!(table = query.table(), method = %method, "Forwarding table query");

        let mut request = self.client.request(method, url).query(&query.query_pairs());

        if let Some(prefer) = query.prefer() {
            request = request.header("Prefer", prefer);
        }
        if query.is_single() {
            request = request.header(ACCEPT, SINGLE_OBJECT_ACCEPT);
        }
        if let Some(body) = query.body() {
            request = request.json(body);
        }

        send(request).await
    }

    async fn rpc(&self, function: &str, params: Value) -> Result<Value, BackendError> {
        let url = self.endpoint(&format!("rest/v1/rpc/{}", function))?;
        debug!(function, "Calling remote procedure");

        send(self.client.post(url).json(&params)).await
    }
}

/// Send a request and decode the JSON payload.
///
/// An empty success body (`204`, `return=minimal`) decodes to `Null`.
async fn send(request: RequestBuilder) -> Result<Value, BackendError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(BackendError::from_response(status, &body));
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    serde_json::from_slice(&body).map_err(|e| BackendError::Decode(e.to_string()))
}

/// GoTrue returns a session (with a nested `user`) when sign-up
/// auto-confirms, and the bare user otherwise.
fn into_user(body: Value) -> Value {
    match body {
        Value::Object(mut session) if session.contains_key("user") => {
            session.remove("user").unwrap_or(Value::Null)
        }
        other => other,
    }
}
