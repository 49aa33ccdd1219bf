//! Persisted records: webhook registrations and delivery attempts.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::EventType;
use crate::types::{DeliveryId, EventId, OwnerId, RegistrationId};

/// A webhook registration: one owner's subscription of a target URL to a set
/// of event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookRegistration {
    pub id: RegistrationId,
    pub owner_id: OwnerId,
    /// Target URL; must accept POST requests
    pub url: String,
    /// Signing secret. Immutable in place — rotation replaces it wholesale
    /// and invalidates the old one.
    pub secret: String,
    /// Non-empty set of subscribed event types
    pub events: BTreeSet<EventType>,
    /// Disabled registrations are excluded from dispatch entirely
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WebhookRegistration {
    /// Check if this registration should receive the given event type.
    pub fn accepts_event(&self, event_type: EventType) -> bool {
        self.enabled && self.events.contains(&event_type)
    }
}

/// Fields of a registration that may be mutated after creation.
///
/// The ID and secret are immutable; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct RegistrationUpdate {
    pub url: Option<String>,
    pub events: Option<BTreeSet<EventType>>,
    pub enabled: Option<bool>,
}

/// One persisted delivery attempt. Append-only: rows are never updated or
/// deleted, and they reference the registration by value so they survive its
/// deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    pub id: DeliveryId,
    pub registration_id: RegistrationId,
    pub event_id: EventId,
    pub event_type: EventType,
    /// Full serialized payload, kept for replay/debugging
    pub payload: String,
    /// Absent on network-level failure
    pub status_code: Option<u16>,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
    /// 1-based, contiguous per (event, registration) pair
    pub attempt_number: u32,
    pub created_at: DateTime<Utc>,
}
