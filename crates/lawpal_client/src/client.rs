//! HTTP client for the LawPal backend: form submission, chat query, chat history.
//!
//! Each call is a single best-effort request. No retries, no timeout. Failures
//! are logged and then handed back to the caller unchanged.

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, error};

use crate::messages::{ChatQueryMessage, FormPayload};

/// Default backend root when neither config nor environment sets one.
pub const DEFAULT_BASE_URL: &str = "https://lawpal.up.railway.app";

/// Header carrying the caller's user identifier on chat requests.
pub const USER_ID_HEADER: &str = "X-User-ID";

/// Request failure: transport, non-success status, or unreadable body.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("HTTP error! status: {status}")]
    Status { status: StatusCode, body: String },
    #[error("invalid response body (status {status}): {source}")]
    Decode {
        status: StatusCode,
        #[source]
        source: reqwest::Error,
    },
}

impl RequestError {
    /// HTTP status, when a response was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RequestError::Transport(e) => e.status(),
            RequestError::Status { status, .. } | RequestError::Decode { status, .. } => {
                Some(*status)
            }
        }
    }
}

/// Backend client. Cheap to clone; share one per application.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    pub fn new(base_url: &str) -> Self {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    /// Use a caller-built `reqwest::Client` (proxies, TLS roots, ...).
    pub fn with_http(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST the payload as JSON to `/submit-form`.
    pub async fn submit_form(&self, payload: &FormPayload) -> Result<Value, RequestError> {
        let url = format!("{}/submit-form", self.base_url);
        let request = self.http.post(&url).json(payload);
        execute(request).await.inspect_err(|e| {
            error!(error = %e, status = ?e.status(), "Error submitting form");
        })
    }

    /// POST `{"query": query}` to `/{service}/chat` as `user_id`.
    pub async fn send_chat_query(
        &self,
        service: &str,
        query: &str,
        user_id: &str,
    ) -> Result<Value, RequestError> {
        let url = format!("{}/{}/chat", self.base_url, service);
        let request = self
            .http
            .post(&url)
            .header(USER_ID_HEADER, user_id)
            .json(&ChatQueryMessage::new(query));
        execute(request).await.inspect_err(|e| {
            error!(error = %e, status = ?e.status(), service, "Error sending chat query");
        })
    }

    /// GET `/{service}/history` as `user_id`.
    pub async fn get_chat_history(
        &self,
        service: &str,
        user_id: &str,
    ) -> Result<Value, RequestError> {
        let url = format!("{}/{}/history", self.base_url, service);
        let request = self.http.get(&url).header(USER_ID_HEADER, user_id);
        execute(request).await.inspect_err(|e| {
            error!(error = %e, status = ?e.status(), service, "Error fetching chat history");
        })
    }
}

async fn execute(request: reqwest::RequestBuilder) -> Result<Value, RequestError> {
    let response = request.send().await.map_err(RequestError::Transport)?;
    let status = response.status();
    debug!(%status, url = %response.url(), "backend response");

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RequestError::Status { status, body });
    }

    response
        .json::<Value>()
        .await
        .map_err(|source| RequestError::Decode { status, source })
}
