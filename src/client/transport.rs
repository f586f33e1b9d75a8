//! Icinga HTTP transport
//!
//! Every call to the Icinga API is a POST; the intended verb travels in the
//! `X-HTTP-Method-Override` header so that queries can carry a JSON body.
//! The `Transport` trait is the seam between request construction and the
//! network, which lets the orchestrators run against an in-memory server.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::error::{IcingaError, IcingaResult};

/// Header carrying the emulated HTTP verb
pub const METHOD_OVERRIDE_HEADER: &str = "X-HTTP-Method-Override";

/// Upper bound for a single API call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Verb requested through the method override header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sends one request to the Icinga API and returns the decoded JSON body
///
/// Implementations map failures onto the [`IcingaError`] taxonomy and never
/// validate the shape of a successful response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, path: &str, verb: Verb, body: &Value) -> IcingaResult<Value>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, path: &str, verb: Verb, body: &Value) -> IcingaResult<Value> {
        (**self).send(path, verb, body).await
    }
}

/// Error body returned by Icinga alongside 404 responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    status: Option<String>,
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Base URL without trailing slash (e.g. https://icinga:5665)
    base_url: String,
    /// HTTP client carrying the fixed headers
    client: Client,
}

impl HttpTransport {
    /// Create a transport for the given server
    ///
    /// The Basic-Auth header is computed once here and attached to every
    /// request. No scheme check happens at this level; see
    /// [`IcingaClient::new`](super::IcingaClient::new).
    pub fn new(
        base_url: &str,
        username: &str,
        password: &str,
        verify_certs: bool,
    ) -> IcingaResult<Self> {
        let mut auth = HeaderValue::from_str(&basic_auth_header(username, password))
            .map_err(|e| IcingaError::InvalidRequest(format!("Invalid credentials: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(!verify_certs)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(IcingaError::connection)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, path: &str, verb: Verb, body: &Value) -> IcingaResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, verb = %verb, "Sending Icinga request");

        let response = self
            .client
            .post(&url)
            .header(METHOD_OVERRIDE_HEADER, verb.as_str())
            .json(body)
            .send()
            .await
            .map_err(IcingaError::connection)?;

        let status = response.status();
        debug!(url = %url, status = status.as_u16(), "Icinga response");

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(IcingaError::authentication()),
            StatusCode::NOT_FOUND => {
                let details: Option<ErrorBody> = response.json().await.ok();
                Err(match details.and_then(|d| d.status) {
                    Some(message) => IcingaError::not_found_with(message),
                    None => IcingaError::not_found(),
                })
            }
            StatusCode::INTERNAL_SERVER_ERROR => Err(IcingaError::not_found()),
            _ => {
                let text = response.text().await.map_err(IcingaError::connection)?;
                Ok(serde_json::from_str(&text)?)
            }
        }
    }
}

/// Render `user:password` as a Basic-Auth header value
fn basic_auth_header(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}
