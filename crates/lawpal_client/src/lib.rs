//! LawPal client library: backend HTTP calls (form, chat, history), auth
//! session mirroring, and the page route table. Used by the `lawpal` CLI.

pub mod auth;
pub mod client;
pub mod config;
pub mod messages;
pub mod routes;
pub mod session;

pub use auth::{AuthError, SupabaseAuth};
pub use client::{Client, RequestError, DEFAULT_BASE_URL, USER_ID_HEADER};
pub use config::{default_config_path, ApiSection, AuthSection, Config, ConfigError};
pub use messages::{ChatAnswer, ChatHistory, ContactForm, FormError, FormPayload, Service};
pub use routes::Route;
pub use session::{
    AuthChangeEvent, AuthEvent, AuthEvents, AuthProvider, Session, SessionListener, SessionStore,
    SubscriptionId, User,
};
