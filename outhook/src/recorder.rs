//! Append-only delivery history.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::events::EventEnvelope;
use crate::executor::DeliveryOutcome;
use crate::store::{self, DeliveryAttempt, WebhookStore};
use crate::types::RegistrationId;

/// Records one immutable row per delivery attempt and serves the history
/// back newest-first for delivery-health visibility.
#[derive(Clone)]
pub struct DeliveryRecorder {
    store: Arc<dyn WebhookStore>,
}

impl DeliveryRecorder {
    pub fn new(store: Arc<dyn WebhookStore>) -> Self {
        Self { store }
    }

    /// Append one attempt row. Rows are never updated or deleted.
    pub async fn append(
        &self,
        registration_id: RegistrationId,
        envelope: &EventEnvelope,
        payload: &str,
        outcome: &DeliveryOutcome,
        attempt_number: u32,
    ) -> store::Result<()> {
        let attempt = DeliveryAttempt {
            id: Uuid::new_v4(),
            registration_id,
            event_id: envelope.id,
            event_type: envelope.event_type,
            payload: payload.to_string(),
            status_code: outcome.status_code,
            success: outcome.success,
            error: outcome.error.clone(),
            duration_ms: outcome.duration_ms,
            attempt_number,
            created_at: Utc::now(),
        };

        self.store.append_delivery(attempt).await
    }

    /// Delivery attempts for one registration, newest-first.
    pub async fn query(&self, registration_id: RegistrationId, limit: usize) -> store::Result<Vec<DeliveryAttempt>> {
        self.store.list_deliveries(registration_id, limit).await
    }
}
