//! Supabase auth client: password sign-in, sign-up, sign-out.
//!
//! Talks to the provider's `/auth/v1` REST endpoints and publishes the
//! resulting session changes, so a [`SessionListener`](crate::SessionListener)
//! mounted on it mirrors the signed-in user.

use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::session::{
    AuthChangeEvent, AuthEvent, AuthEvents, AuthHandler, AuthProvider, Session, SubscriptionId,
};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("auth request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("auth provider returned {status}: {message}")]
    Provider {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("unexpected auth response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Error body shapes the provider uses (`msg`, `error_description`, `message`).
#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
}

impl ProviderErrorBody {
    fn into_message(self, raw: String) -> String {
        self.msg
            .or(self.error_description)
            .or(self.message)
            .unwrap_or(raw)
    }
}

/// Client for one Supabase project.
pub struct SupabaseAuth {
    http: reqwest::Client,
    url: String,
    anon_key: String,
    events: AuthEvents,
}

impl SupabaseAuth {
    pub fn new(url: &str, anon_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            events: AuthEvents::new(),
        }
    }

    pub fn events(&self) -> &AuthEvents {
        &self.events
    }

    /// Announce the session restored at startup (or its absence).
    pub fn emit_initial_session(&self, session: Option<Session>) {
        self.events
            .publish(&AuthEvent::new(AuthChangeEvent::InitialSession, session));
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.url);
        let body = json!({ "email": email, "password": password });
        let value = self.post(&url, &body, None).await?;
        let session: Session = serde_json::from_value(value)?;
        info!(user = %session.user.id, "signed in");
        self.events.publish(&AuthEvent::new(
            AuthChangeEvent::SignedIn,
            Some(session.clone()),
        ));
        Ok(session)
    }

    /// Returns `None` when the project requires email confirmation first.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError> {
        let url = format!("{}/auth/v1/signup", self.url);
        let body = json!({ "email": email, "password": password });
        let value = self.post(&url, &body, None).await?;
        if value.get("access_token").is_none() {
            info!(email, "sign-up pending confirmation");
            return Ok(None);
        }
        let session: Session = serde_json::from_value(value)?;
        self.events.publish(&AuthEvent::new(
            AuthChangeEvent::SignedIn,
            Some(session.clone()),
        ));
        Ok(Some(session))
    }

    pub async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        let url = format!("{}/auth/v1/logout", self.url);
        self.post(&url, &json!({}), Some(&session.access_token))
            .await?;
        info!(user = %session.user.id, "signed out");
        self.events
            .publish(&AuthEvent::new(AuthChangeEvent::SignedOut, None));
        Ok(())
    }

    async fn post(
        &self,
        url: &str,
        body: &serde_json::Value,
        bearer: Option<&str>,
    ) -> Result<serde_json::Value, AuthError> {
        let mut request = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let parsed: ProviderErrorBody = serde_json::from_str(&text).unwrap_or_default();
            let message = parsed.into_message(text);
            warn!(%status, %message, "auth provider rejected request");
            return Err(AuthError::Provider { status, message });
        }
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

impl AuthProvider for SupabaseAuth {
    fn subscribe(&self, handler: AuthHandler) -> SubscriptionId {
        self.events.subscribe(handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.events.unsubscribe(id);
    }
}
