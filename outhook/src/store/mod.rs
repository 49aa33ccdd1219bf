//! Storage abstraction for registrations and delivery history.
//!
//! The delivery core does not own a database. It talks to a generic record
//! store through [`WebhookStore`], injected into the registry, recorder and
//! dispatcher constructors. [`MemoryStore`] is the bundled backend, used by
//! the test suite and by embeddable deployments; production deployments
//! implement the trait over their own persistence layer.

pub mod errors;
pub mod memory;
pub mod models;

pub use errors::{Result, StoreError};
pub use memory::MemoryStore;
pub use models::{DeliveryAttempt, RegistrationUpdate, WebhookRegistration};

use async_trait::async_trait;

use crate::types::RegistrationId;

/// Record store for webhook registrations and delivery attempts.
///
/// Implementations must make `append_delivery` safe under concurrent calls
/// from multiple in-flight deliveries; no coordination beyond independent
/// row inserts is expected.
#[async_trait]
pub trait WebhookStore: Send + Sync {
    async fn insert_registration(&self, registration: WebhookRegistration) -> Result<()>;

    async fn get_registration(&self, id: RegistrationId) -> Result<Option<WebhookRegistration>>;

    /// Replace an existing registration. Fails with [`StoreError::NotFound`]
    /// if no record with the same ID exists.
    async fn update_registration(&self, registration: WebhookRegistration) -> Result<()>;

    /// Returns `true` if a record was deleted. Past delivery attempts are
    /// not cascaded — they remain for audit purposes.
    async fn delete_registration(&self, id: RegistrationId) -> Result<bool>;

    async fn list_registrations(&self) -> Result<Vec<WebhookRegistration>>;

    async fn append_delivery(&self, attempt: DeliveryAttempt) -> Result<()>;

    /// Delivery attempts for one registration, newest-first, capped at
    /// `limit` rows.
    async fn list_deliveries(&self, registration_id: RegistrationId, limit: usize) -> Result<Vec<DeliveryAttempt>>;
}
