//! Supabase HTTP client for GoTrue auth, Storage, and PostgREST.
//!
//! Thin reqwest wrapper over the three REST surfaces the panel uses. Every
//! request carries the project's anon key as `apikey`; the bearer token is
//! the signed-in user's access token when there is one, otherwise the anon
//! key. Pure parsing lives in `parse_token_response` / `provider_message`
//! for testability.
//!
//! The current session is held in memory and mirrored into the local token
//! store under `sb-<project-ref>-auth-token`, which is where the panel's
//! sign-out wipe looks for it.

use std::time::Duration;

use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tokio::sync::{RwLock, broadcast};

use super::{
    AuthApi, AuthEvent, AuthEvents, AuthScope, BackendError, DataApi, NewProduct, Product, ProductId, Session,
    SessionUser, StorageApi,
};
use crate::config::PanelConfig;
use crate::session::{SESSION_KEY_PREFIX, TokenStores};

/// Lifetime assumed when the token response carries neither `expires_at`
/// nor `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;
const UPLOAD_CACHE_CONTROL: &str = "max-age=3600";

// =============================================================================
// CLIENT
// =============================================================================

pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    table: String,
    session_key: String,
    stores: TokenStores,
    session: RwLock<Option<Session>>,
    events: AuthEvents,
}

impl SupabaseClient {
    /// Build a client from validated config.
    ///
    /// # Errors
    ///
    /// Returns `Request` if the HTTP client cannot be constructed.
    pub fn new(config: &PanelConfig, stores: TokenStores) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| BackendError::Request(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.supabase_url.clone(),
            anon_key: config.anon_key.clone(),
            table: config.table.clone(),
            session_key: format!("{SESSION_KEY_PREFIX}{}-auth-token", config.project_ref()),
            stores,
            session: RwLock::new(None),
            events: AuthEvents::new(),
        })
    }

    /// Key the session is persisted under in the local store.
    #[must_use]
    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .header("apikey", &self.anon_key)
    }

    /// Token for the `Authorization` header.
    ///
    /// An expired session is refreshed first. If the refresh is rejected the
    /// session ends: it is dropped, `SignedOut` is broadcast, and the call
    /// fails with `NotAuthenticated` instead of going out with a dead token.
    async fn bearer(&self) -> Result<String, BackendError> {
        let Some(session) = self.session.read().await.clone() else {
            return Ok(self.anon_key.clone());
        };
        if !session.is_expired(now_unix()) {
            return Ok(session.access_token);
        }

        let body = serde_json::json!({ "refresh_token": session.refresh_token });
        match self.token_grant("refresh_token", body).await {
            Ok(fresh) => {
                let token = fresh.access_token.clone();
                self.set_session(Some(fresh)).await?;
                tracing::debug!("session refreshed");
                Ok(token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "session refresh failed; signing out");
                if let Err(e) = self.set_session(None).await {
                    tracing::warn!(error = %e, "failed to clear persisted session");
                }
                self.events.emit(AuthEvent::SignedOut);
                Err(BackendError::NotAuthenticated)
            }
        }
    }

    /// Send a request and return the body of a success response.
    async fn send(&self, op: &'static str, request: reqwest::RequestBuilder) -> Result<String, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        tracing::debug!(op, status, "backend response");

        if !(200..300).contains(&status) {
            return Err(BackendError::Api { status, message: provider_message(&text, status) });
        }
        Ok(text)
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> Result<Session, BackendError> {
        let request = self
            .request(Method::POST, "/auth/v1/token")
            .query(&[("grant_type", grant_type)])
            .bearer_auth(&self.anon_key)
            .json(&body);
        let text = self.send("auth.token", request).await?;
        parse_token_response(&text, now_unix())
    }

    /// Replace the in-memory session, then mirror it into the local store.
    /// The in-memory session changes even when the store write fails.
    async fn set_session(&self, session: Option<Session>) -> Result<(), BackendError> {
        let persisted = session
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        *self.session.write().await = session;
        match persisted {
            Some(json) => self.stores.local.set(&self.session_key, &json)?,
            None => self.stores.local.remove(&self.session_key)?,
        }
        Ok(())
    }
}

// =============================================================================
// AUTH
// =============================================================================

#[async_trait::async_trait]
impl AuthApi for SupabaseClient {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let session = self
            .token_grant("password", serde_json::json!({ "email": email, "password": password }))
            .await?;
        self.set_session(Some(session.clone())).await?;
        tracing::info!(email = session.email(), "signed in");
        self.events.emit(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self, scope: AuthScope) -> Result<(), BackendError> {
        // Snapshot before the first await so a concurrent sign-out at the
        // other scope still sees the token.
        let token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|session| session.access_token.clone());

        let result = match token {
            Some(token) => {
                let request = self
                    .request(Method::POST, "/auth/v1/logout")
                    .query(&[("scope", scope.as_str())])
                    .bearer_auth(token);
                self.send("auth.logout", request).await.map(|_| ())
            }
            None => Ok(()),
        };

        // The local session ends whatever the provider answered.
        let cleared = self.set_session(None).await;
        tracing::info!(scope = scope.as_str(), "signed out");
        self.events.emit(AuthEvent::SignedOut);
        result.and(cleared)
    }

    async fn restore_session(&self) -> Result<Option<Session>, BackendError> {
        let Some(raw) = self.stores.local.get(&self.session_key)? else {
            self.events.emit(AuthEvent::SignedOut);
            return Ok(None);
        };

        let stored = match serde_json::from_str::<Session>(&raw) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable persisted session");
                self.set_session(None).await?;
                self.events.emit(AuthEvent::SignedOut);
                return Ok(None);
            }
        };

        let session = if stored.is_expired(now_unix()) {
            let body = serde_json::json!({ "refresh_token": stored.refresh_token });
            match self.token_grant("refresh_token", body).await {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!(error = %e, "session refresh failed");
                    self.set_session(None).await?;
                    self.events.emit(AuthEvent::SignedOut);
                    return Ok(None);
                }
            }
        } else {
            stored
        };

        self.set_session(Some(session.clone())).await?;
        self.events.emit(AuthEvent::SignedIn(session.clone()));
        Ok(Some(session))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

// =============================================================================
// STORAGE
// =============================================================================

#[async_trait::async_trait]
impl StorageApi for SupabaseClient {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), BackendError> {
        let request = self
            .request(Method::POST, &format!("/storage/v1/object/{bucket}/{path}"))
            .bearer_auth(self.bearer().await?)
            .header(CONTENT_TYPE, content_type)
            .header("cache-control", UPLOAD_CACHE_CONTROL)
            .header("x-upsert", "false")
            .body(bytes);
        self.send("storage.upload", request).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{path}", self.base_url)
    }
}

// =============================================================================
// DATA
// =============================================================================

#[async_trait::async_trait]
impl DataApi for SupabaseClient {
    async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        let request = self
            .request(Method::GET, &format!("/rest/v1/{}", self.table))
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .bearer_auth(self.bearer().await?);
        let text = self.send("data.select", request).await?;
        serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<(), BackendError> {
        let request = self
            .request(Method::POST, &format!("/rest/v1/{}", self.table))
            .bearer_auth(self.bearer().await?)
            .header("Prefer", "return=minimal")
            .json(&[product]);
        self.send("data.insert", request).await?;
        Ok(())
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), BackendError> {
        let request = self
            .request(Method::DELETE, &format!("/rest/v1/{}", self.table))
            .query(&[("id", format!("eq.{id}"))])
            .bearer_auth(self.bearer().await?);
        self.send("data.delete", request).await?;
        Ok(())
    }
}

// =============================================================================
// PARSING
// =============================================================================

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: SessionUser,
}

fn parse_token_response(json: &str, now_unix: i64) -> Result<Session, BackendError> {
    let token: TokenResponse = serde_json::from_str(json).map_err(|e| BackendError::Decode(e.to_string()))?;
    let expires_at = token
        .expires_at
        .unwrap_or_else(|| now_unix + token.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS));
    Ok(Session {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_at,
        user: token.user,
    })
}

/// Human-readable message from an error body.
///
/// GoTrue, Storage, and PostgREST each name the field differently; the
/// first string among `msg`, `message`, `error_description`, `error` wins.
/// Non-JSON bodies are returned as-is.
fn provider_message(body: &str, status: u16) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["msg", "message", "error_description", "error"] {
            if let Some(message) = map.get(field).and_then(serde_json::Value::as_str) {
                return message.to_owned();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        trimmed.to_owned()
    }
}

fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

#[cfg(test)]
#[path = "supabase_test.rs"]
mod tests;
