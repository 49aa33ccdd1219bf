//! In-memory store backend.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::models::{DeliveryAttempt, WebhookRegistration};
use crate::store::{Result, StoreError, WebhookStore};
use crate::types::RegistrationId;

#[derive(Default)]
struct Inner {
    registrations: HashMap<RegistrationId, WebhookRegistration>,
    // Append order doubles as chronological order
    deliveries: Vec<DeliveryAttempt>,
}

/// In-memory [`WebhookStore`] backed by a `tokio` RwLock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WebhookStore for MemoryStore {
    async fn insert_registration(&self, registration: WebhookRegistration) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.registrations.insert(registration.id, registration);
        Ok(())
    }

    async fn get_registration(&self, id: RegistrationId) -> Result<Option<WebhookRegistration>> {
        let inner = self.inner.read().await;
        Ok(inner.registrations.get(&id).cloned())
    }

    async fn update_registration(&self, registration: WebhookRegistration) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.registrations.get_mut(&registration.id) {
            Some(existing) => {
                *existing = registration;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete_registration(&self, id: RegistrationId) -> Result<bool> {
        let mut inner = self.inner.write().await;
        Ok(inner.registrations.remove(&id).is_some())
    }

    async fn list_registrations(&self) -> Result<Vec<WebhookRegistration>> {
        let inner = self.inner.read().await;
        Ok(inner.registrations.values().cloned().collect())
    }

    async fn append_delivery(&self, attempt: DeliveryAttempt) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.deliveries.push(attempt);
        Ok(())
    }

    async fn list_deliveries(&self, registration_id: RegistrationId, limit: usize) -> Result<Vec<DeliveryAttempt>> {
        let inner = self.inner.read().await;
        Ok(inner
            .deliveries
            .iter()
            .rev()
            .filter(|attempt| attempt.registration_id == registration_id)
            .take(limit)
            .cloned()
            .collect())
    }
}
