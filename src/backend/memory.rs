//! In-memory backend with scripted failures, for controller tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use super::{
    AuthApi, AuthEvent, AuthEvents, AuthScope, BackendError, DataApi, NewProduct, Product, ProductId, Session,
    SessionUser, StorageApi,
};

#[derive(Debug, Default)]
pub(crate) struct MemoryState {
    pub products: Vec<Product>,
    pub objects: Vec<String>,
    /// Every capability call, in order (`upload`, `insert`, `sign_out:local`, ...).
    pub calls: Vec<String>,
    pub inserted: Vec<NewProduct>,
    pub fail_sign_in: Option<String>,
    pub fail_sign_out: Option<String>,
    pub fail_upload: Option<String>,
    pub fail_insert: Option<String>,
    pub fail_list: Option<String>,
    pub fail_delete: Option<String>,
    next_id: u64,
}

#[derive(Default)]
pub(crate) struct MemoryBackend {
    state: Mutex<MemoryState>,
    events: AuthEvents,
}

fn scripted(failure: Option<&String>) -> Result<(), BackendError> {
    match failure {
        Some(message) => Err(BackendError::Api { status: 400, message: message.clone() }),
        None => Ok(()),
    }
}

impl MemoryBackend {
    pub(crate) fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Add a product as if inserted earlier; it becomes the newest row.
    pub(crate) fn seed(&self, name: &str, price: f64) -> ProductId {
        let mut state = self.state();
        state.next_id += 1;
        let id = ProductId::new(state.next_id.to_string());
        let product = Product {
            id: id.clone(),
            name: name.to_owned(),
            price,
            category: None,
            image_url: Some(format!("https://storage.test/seed/{name}.png")),
            created_at: Some(state.next_id.to_string()),
        };
        state.products.insert(0, product);
        id
    }

    pub(crate) fn session(email: &str) -> Session {
        Session {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            expires_at: i64::MAX,
            user: SessionUser { id: "user-1".into(), email: Some(email.to_owned()) },
        }
    }
}

#[async_trait::async_trait]
impl AuthApi for MemoryBackend {
    async fn sign_in_with_password(&self, email: &str, _password: &str) -> Result<Session, BackendError> {
        {
            let mut state = self.state();
            state.calls.push("sign_in".into());
            scripted(state.fail_sign_in.as_ref())?;
        }
        let session = Self::session(email);
        self.events.emit(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self, scope: AuthScope) -> Result<(), BackendError> {
        let result = {
            let mut state = self.state();
            state.calls.push(format!("sign_out:{}", scope.as_str()));
            scripted(state.fail_sign_out.as_ref())
        };
        self.events.emit(AuthEvent::SignedOut);
        result
    }

    async fn restore_session(&self) -> Result<Option<Session>, BackendError> {
        self.events.emit(AuthEvent::SignedOut);
        Ok(None)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[async_trait::async_trait]
impl StorageApi for MemoryBackend {
    async fn upload(&self, bucket: &str, path: &str, _bytes: Vec<u8>, _content_type: &str) -> Result<(), BackendError> {
        let mut state = self.state();
        state.calls.push("upload".into());
        scripted(state.fail_upload.as_ref())?;
        state.objects.push(format!("{bucket}/{path}"));
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("https://storage.test/{bucket}/{path}")
    }
}

#[async_trait::async_trait]
impl DataApi for MemoryBackend {
    async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        let mut state = self.state();
        state.calls.push("list".into());
        scripted(state.fail_list.as_ref())?;
        Ok(state.products.clone())
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<(), BackendError> {
        let mut state = self.state();
        state.calls.push("insert".into());
        scripted(state.fail_insert.as_ref())?;
        state.next_id += 1;
        let row = Product {
            id: ProductId::new(state.next_id.to_string()),
            name: product.name.clone(),
            price: product.price,
            category: product.category.clone(),
            image_url: Some(product.image_url.clone()),
            created_at: Some(state.next_id.to_string()),
        };
        state.products.insert(0, row);
        state.inserted.push(product.clone());
        Ok(())
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), BackendError> {
        let mut state = self.state();
        state.calls.push(format!("delete:{id}"));
        scripted(state.fail_delete.as_ref())?;
        state.products.retain(|product| &product.id != id);
        Ok(())
    }
}
