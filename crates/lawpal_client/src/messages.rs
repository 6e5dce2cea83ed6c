//! Backend message types. Client → server bodies and typed views over the
//! server's JSON replies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Flat form submission: field name → value, forwarded verbatim.
pub type FormPayload = BTreeMap<String, String>;

/// Client → server: chat query body (`{"query": ...}`).
#[derive(Debug, Clone, Serialize)]
pub struct ChatQueryMessage<'a> {
    pub query: &'a str,
}

impl<'a> ChatQueryMessage<'a> {
    pub fn new(query: &'a str) -> Self {
        Self { query }
    }
}

/// Server → client: chat answer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatAnswer {
    pub response: String,
}

/// One prior exchange turn. `role` is `"user"` or `"bot"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
}

/// Server → client: chat history, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatHistory {
    pub history: Vec<HistoryEntry>,
}

impl ChatAnswer {
    /// Typed view over an opaque chat reply. `None` if the shape differs.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

impl ChatHistory {
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// Services the backend keeps conversation histories for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    PersonalAndFamily,
    BusinessConsumerAndCriminal,
    Consultation,
}

impl Service {
    pub const ALL: [Service; 3] = [
        Service::PersonalAndFamily,
        Service::BusinessConsumerAndCriminal,
        Service::Consultation,
    ];

    /// Path segment used in `/{service}/chat` and `/{service}/history`.
    pub fn slug(self) -> &'static str {
        match self {
            Service::PersonalAndFamily => "personal-and-family-legal-assistance",
            Service::BusinessConsumerAndCriminal => {
                "business-consumer-and-criminal-legal-assistance"
            }
            Service::Consultation => "consultation",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Service::PersonalAndFamily => "Personal and Family Legal Assistance",
            Service::BusinessConsumerAndCriminal => {
                "Business, Consumer and Criminal Legal Assistance"
            }
            Service::Consultation => "Consultation",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.slug() == slug)
    }

    /// Resolve a page title (or an already-slugged title) to a known service.
    pub fn from_title(title: &str) -> Option<Self> {
        Self::from_slug(&slugify(title))
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// Lowercase, collapse every run of non-alphanumerics into one `-`, trim dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Contact page form. Serializes to the field names the backend requires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormError {
    #[error("required field `{0}` is empty")]
    EmptyField(&'static str),
}

impl ContactForm {
    /// Reject empty required fields (the backend answers these with 400).
    /// Whitespace-only values are sent as-is; the backend accepts them.
    pub fn validate(&self) -> Result<(), FormError> {
        let fields = [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("subject", &self.subject),
            ("message", &self.message),
        ];
        match fields.iter().find(|(_, v)| v.is_empty()) {
            Some((name, _)) => Err(FormError::EmptyField(*name)),
            None => Ok(()),
        }
    }

    pub fn into_payload(self) -> FormPayload {
        FormPayload::from([
            ("firstName".to_string(), self.first_name),
            ("lastName".to_string(), self.last_name),
            ("email".to_string(), self.email),
            ("subject".to_string(), self.subject),
            ("message".to_string(), self.message),
        ])
    }
}
