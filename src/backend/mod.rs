//! Backend capabilities: auth, object storage, and the product table.
//!
//! DESIGN
//! ======
//! The panel never talks HTTP directly. It holds an `Arc<dyn MenuBackend>`
//! and calls the three capability traits below, so the controller can be
//! exercised against [`memory::MemoryBackend`] in tests and against
//! [`supabase::SupabaseClient`] in the binary.
//!
//! Auth state changes are not returned to the caller as view updates. They
//! are broadcast as [`AuthEvent`]s; the panel reacts to the stream.

#[cfg(test)]
pub(crate) mod memory;
pub mod supabase;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// =============================================================================
// ERRORS
// =============================================================================

/// Errors produced by backend capability calls.
///
/// `Api` displays the provider's message verbatim; that text is what the
/// panel shows to the administrator.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("request failed: {0}")]
    Request(String),

    /// The provider answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// A success response body could not be decoded.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The call needs a signed-in session and there is none.
    #[error("not signed in")]
    NotAuthenticated,

    /// The local token store failed.
    #[error("session store error: {0}")]
    Store(#[from] crate::session::StoreError),
}

// =============================================================================
// SESSION
// =============================================================================

/// Sign-out scope understood by the auth provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScope {
    /// Revoke only this client's session.
    Local,
    /// Revoke every session of the user.
    Global,
}

impl AuthScope {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Global => "global",
        }
    }
}

/// The user attached to an auth session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated session as issued by the auth provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds.
    pub expires_at: i64,
    pub user: SessionUser,
}

impl Session {
    /// Email of the signed-in user, or an empty string if the provider
    /// did not report one.
    #[must_use]
    pub fn email(&self) -> &str {
        self.user.email.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn is_expired(&self, now_unix: i64) -> bool {
        self.expires_at <= now_unix
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Inbound auth-state notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut,
}

/// Broadcast side of the auth event stream.
#[derive(Debug, Clone)]
pub struct AuthEvents {
    tx: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    const CAPACITY: usize = 16;

    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(Self::CAPACITY);
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: AuthEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("auth event dropped: no subscribers");
        }
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// PRODUCTS
// =============================================================================

/// Server-assigned product identifier.
///
/// Opaque to the panel. The row API may hand it out as a number or a
/// string; both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawProductId")]
pub struct ProductId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProductId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawProductId> for ProductId {
    fn from(raw: RawProductId) -> Self {
        match raw {
            RawProductId::Text(text) => Self(text),
            RawProductId::Number(number) => Self(number.to_string()),
        }
    }
}

impl ProductId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A row of the menu table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Insert payload for a new menu row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    /// A blank category is stored as `null`, never as `""`.
    pub category: Option<String>,
    pub image_url: String,
}

// =============================================================================
// CAPABILITIES
// =============================================================================

/// Password authentication plus the auth-state event stream.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// Sign in with email and password. On success an
    /// [`AuthEvent::SignedIn`] is broadcast as well.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, BackendError>;

    /// End the current session at the given scope and broadcast
    /// [`AuthEvent::SignedOut`].
    async fn sign_out(&self, scope: AuthScope) -> Result<(), BackendError>;

    /// Load the persisted session, refreshing it if expired, and broadcast
    /// the resulting initial state.
    async fn restore_session(&self) -> Result<Option<Session>, BackendError>;

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Object storage addressed by bucket and path.
#[async_trait::async_trait]
pub trait StorageApi: Send + Sync {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), BackendError>;

    /// Public URL of a stored object. Pure; no request is made.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// The menu product table.
#[async_trait::async_trait]
pub trait DataApi: Send + Sync {
    /// All products, newest first.
    async fn list_products(&self) -> Result<Vec<Product>, BackendError>;

    async fn insert_product(&self, product: &NewProduct) -> Result<(), BackendError>;

    async fn delete_product(&self, id: &ProductId) -> Result<(), BackendError>;
}

/// Everything the panel needs from the hosted backend.
pub trait MenuBackend: AuthApi + StorageApi + DataApi {}

impl<T> MenuBackend for T where T: AuthApi + StorageApi + DataApi {}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
