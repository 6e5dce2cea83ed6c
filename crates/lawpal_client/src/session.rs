//! Auth session mirroring.
//!
//! An [`AuthProvider`] pushes [`AuthEvent`]s. A mounted [`SessionListener`]
//! copies the session carried by each event into a [`SessionStore`], the one
//! place the rest of the application reads the signed-in user from. The
//! listener unsubscribes exactly once, on `unmount` or drop.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, ThreadId};
use tracing::debug;

/// Authenticated user as the provider reports it. Unknown fields are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Provider session. Replaced wholesale on every notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".into()
}

/// Session change kinds, with the provider's wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthChangeEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

/// One provider notification.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthEvent {
    pub kind: AuthChangeEvent,
    pub session: Option<Session>,
}

impl AuthEvent {
    pub fn new(kind: AuthChangeEvent, session: Option<Session>) -> Self {
        Self { kind, session }
    }
}

/// Token returned by [`AuthProvider::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

pub type AuthHandler = Box<dyn Fn(&AuthEvent) + Send + Sync>;

/// Source of session-change notifications.
pub trait AuthProvider: Send + Sync {
    fn subscribe(&self, handler: AuthHandler) -> SubscriptionId;
    /// Remove a handler. Unknown or already-removed ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

type SharedHandler = Arc<dyn Fn(&AuthEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: BTreeMap<SubscriptionId, SharedHandler>,
    /// Thread currently running handlers, if any.
    dispatching: Option<ThreadId>,
}

/// In-process subscriber registry. Handlers run on the publishing task, in
/// subscription order. Publishes are serialized.
#[derive(Clone, Default)]
pub struct AuthEvents {
    inner: Arc<Mutex<Registry>>,
    dispatch: Arc<Mutex<()>>,
}

/// Clears the dispatching mark even if a handler panics.
struct DispatchMark<'a>(&'a AuthEvents);

impl Drop for DispatchMark<'_> {
    fn drop(&mut self) {
        self.0.registry().dispatching = None;
    }
}

impl AuthEvents {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn dispatching_here(&self) -> bool {
        self.registry().dispatching == Some(thread::current().id())
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry().handlers.len()
    }

    /// Deliver `event` to every current subscriber.
    ///
    /// The registry lock is not held while a handler runs, so handlers may
    /// subscribe, unsubscribe or publish. A handler removed mid-dispatch is
    /// skipped.
    pub fn publish(&self, event: &AuthEvent) {
        if self.dispatching_here() {
            self.deliver(event);
            return;
        }
        let _serial = self.dispatch.lock().unwrap_or_else(|e| e.into_inner());
        self.registry().dispatching = Some(thread::current().id());
        let _mark = DispatchMark(self);
        self.deliver(event);
    }

    fn deliver(&self, event: &AuthEvent) {
        let snapshot: Vec<(SubscriptionId, SharedHandler)> = self
            .registry()
            .handlers
            .iter()
            .map(|(id, h)| (*id, Arc::clone(h)))
            .collect();
        debug!(kind = ?event.kind, subscribers = snapshot.len(), "auth event");
        for (id, handler) in snapshot {
            if !self.registry().handlers.contains_key(&id) {
                continue;
            }
            handler(event);
        }
    }
}

impl AuthProvider for AuthEvents {
    fn subscribe(&self, handler: AuthHandler) -> SubscriptionId {
        let mut reg = self.registry();
        let id = SubscriptionId(reg.next_id);
        reg.next_id += 1;
        reg.handlers.insert(id, Arc::from(handler));
        id
    }

    /// Returns only once no other thread can still be running the handler.
    fn unsubscribe(&self, id: SubscriptionId) {
        self.registry().handlers.remove(&id);
        if !self.dispatching_here() {
            // Wait out a dispatch in flight on another thread.
            drop(self.dispatch.lock().unwrap_or_else(|e| e.into_inner()));
        }
    }
}

/// Latest-wins copy of the provider session. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    slot: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Session> {
        self.slot.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn user(&self) -> Option<User> {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|s| s.user.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.slot.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    pub(crate) fn replace(&self, session: Option<Session>) {
        *self.slot.write().unwrap_or_else(|e| e.into_inner()) = session;
    }
}

/// Mounted subscription that mirrors provider sessions into a store.
pub struct SessionListener {
    provider: Arc<dyn AuthProvider>,
    subscription: Option<SubscriptionId>,
}

impl SessionListener {
    pub fn mount(provider: Arc<dyn AuthProvider>, store: SessionStore) -> Self {
        let subscription = provider.subscribe(Box::new(move |event: &AuthEvent| {
            store.replace(event.session.clone());
        }));
        debug!(?subscription, "session listener mounted");
        Self {
            provider,
            subscription: Some(subscription),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.provider.unsubscribe(id);
            debug!(subscription = ?id, "session listener unmounted");
        }
    }
}

impl Drop for SessionListener {
    fn drop(&mut self) {
        self.teardown();
    }
}
