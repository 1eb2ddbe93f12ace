//! User actions: sign-in/out, image selection, save, list, delete.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;

use super::form::{self, ValidationError};
use super::view::PanelView;
use crate::backend::{
    AuthApi, AuthEvent, AuthScope, BackendError, DataApi, MenuBackend, NewProduct, ProductId, StorageApi,
};
use crate::sanitize::safe_object_name;
use crate::session::TokenStores;
use crate::upload::{self, PendingUpload};

/// Pause between an optimistic sign-out and the forced reload.
pub const SIGN_OUT_RELOAD_DELAY: Duration = Duration::from_millis(300);

pub const SAVE_SUCCESS_MESSAGE: &str = "Product added successfully.";
pub const CONFIRM_DELETE_MESSAGE: &str = "Are you sure you want to delete this product?";

// =============================================================================
// TYPES
// =============================================================================

/// Which view the panel shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticated { email: String },
}

impl AuthState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { email } => Some(email),
        }
    }
}

/// Why a save did not go through. `Display` is the text shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("Fill in all fields and select an image.")]
    Invalid(#[from] ValidationError),
    #[error("Image upload failed: {0}")]
    Upload(#[source] BackendError),
    #[error("Could not save product: {0}")]
    Insert(#[source] BackendError),
}

pub struct PanelController<V> {
    backend: Arc<dyn MenuBackend>,
    stores: TokenStores,
    view: V,
    bucket: String,
    auth: AuthState,
    pending: Option<PendingUpload>,
    reload_delay: Duration,
}

impl<V: PanelView> PanelController<V> {
    pub fn new(backend: Arc<dyn MenuBackend>, stores: TokenStores, view: V, bucket: impl Into<String>) -> Self {
        Self {
            backend,
            stores,
            view,
            bucket: bucket.into(),
            auth: AuthState::Anonymous,
            pending: None,
            reload_delay: SIGN_OUT_RELOAD_DELAY,
        }
    }

    #[must_use]
    pub fn with_reload_delay(mut self, delay: Duration) -> Self {
        self.reload_delay = delay;
        self
    }

    #[must_use]
    pub fn auth_state(&self) -> &AuthState {
        &self.auth
    }

    #[must_use]
    pub fn pending_upload(&self) -> Option<&PendingUpload> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    // =========================================================================
    // SESSION
    // =========================================================================

    /// React to an auth-state notification from the provider.
    pub async fn handle_auth_event(&mut self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(session) => {
                let email = session.email().to_owned();
                self.view.show_authenticated(&email);
                self.auth = AuthState::Authenticated { email };
                self.load_products().await;
            }
            AuthEvent::SignedOut => {
                self.auth = AuthState::Anonymous;
                self.view.show_anonymous();
            }
        }
    }

    /// Sign in with the credentials currently in the view. The view changes
    /// only when the provider's `SignedIn` event arrives.
    pub async fn sign_in(&mut self) {
        let credentials = self.view.credentials();
        let email = credentials.email.trim();
        if let Err(e) = self.backend.sign_in_with_password(email, &credentials.password).await {
            self.view.alert(&format!("Sign-in failed: {e}"));
        }
    }

    /// Sign out optimistically, then force a reload.
    ///
    /// The view goes anonymous before the provider is asked anything, and
    /// provider failures are only logged.
    pub async fn sign_out(&mut self) {
        self.auth = AuthState::Anonymous;
        self.view.show_anonymous();

        match self.stores.clear_provider_keys() {
            Ok(removed) => tracing::debug!(removed, "cleared cached session keys"),
            Err(e) => tracing::warn!(error = %e, "failed to clear cached session keys"),
        }

        let (local, global) = tokio::join!(
            self.backend.sign_out(AuthScope::Local),
            self.backend.sign_out(AuthScope::Global)
        );
        for (scope, result) in [(AuthScope::Local, local), (AuthScope::Global, global)] {
            if let Err(e) = result {
                tracing::warn!(scope = scope.as_str(), error = %e, "provider sign-out failed");
            }
        }

        tokio::time::sleep(self.reload_delay).await;
        self.reload();
    }

    fn reload(&mut self) {
        self.pending = None;
        self.view.reload();
    }

    // =========================================================================
    // ADD PRODUCT
    // =========================================================================

    /// Open the picker; a chosen file becomes the pending upload and opens
    /// the form with its preview.
    pub async fn select_image(&mut self) {
        let Some(path) = self.view.pick_image().await else {
            return;
        };
        match PendingUpload::read(&path).await {
            Ok(pending) => {
                self.view.open_form(&pending.file_name, &pending.preview_data_url());
                self.pending = Some(pending);
            }
            Err(e) => self.view.alert(&format!("Could not read image: {e}")),
        }
    }

    /// Discard the form and the pending upload.
    pub fn cancel_form(&mut self) {
        self.pending = None;
        self.view.reset_form();
    }

    /// Validate, upload the image, then insert the product row.
    ///
    /// The save control is disabled for the duration and re-enabled on
    /// every exit path.
    pub async fn save(&mut self) {
        self.view.set_saving(true);
        match self.try_save().await {
            Ok(()) => self.view.alert(SAVE_SUCCESS_MESSAGE),
            Err(e) => self.view.alert(&e.to_string()),
        }
        self.view.set_saving(false);
    }

    async fn try_save(&mut self) -> Result<(), SaveError> {
        let form = self.view.form();
        let valid = form::validate(&form, self.pending.as_ref())?;

        let path = upload::storage_path(&safe_object_name(&valid.image.file_name), OffsetDateTime::now_utc());
        self.backend
            .upload(&self.bucket, &path, valid.image.bytes.clone(), &valid.image.content_type)
            .await
            .map_err(SaveError::Upload)?;
        let image_url = self.backend.public_url(&self.bucket, &path);

        let product = NewProduct { name: valid.name, price: valid.price, category: valid.category, image_url };
        if let Err(e) = self.backend.insert_product(&product).await {
            tracing::warn!(bucket = %self.bucket, path = %path, error = %e, "insert failed; uploaded image left orphaned");
            return Err(SaveError::Insert(e));
        }

        self.cancel_form();
        self.load_products().await;
        Ok(())
    }

    // =========================================================================
    // LIST / DELETE
    // =========================================================================

    /// Clear the table and redraw it from the backend, newest first.
    pub async fn load_products(&mut self) {
        self.view.clear_products();
        match self.backend.list_products().await {
            Ok(products) => self.view.render_products(&products),
            Err(e) => self.view.alert(&format!("Could not list products: {e}")),
        }
    }

    /// Delete a product after confirmation and reload the whole list.
    pub async fn delete_product(&mut self, id: &ProductId) {
        if !self.view.confirm(CONFIRM_DELETE_MESSAGE).await {
            return;
        }
        if let Err(e) = self.backend.delete_product(id).await {
            self.view.alert(&format!("Delete failed: {e}"));
            return;
        }
        self.load_products().await;
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;
