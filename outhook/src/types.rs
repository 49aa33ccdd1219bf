//! Common type definitions.
//!
//! All entity IDs are UUIDs wrapped in type aliases for better type safety:
//!
//! - [`OwnerId`]: The party that registered a webhook (merchant account)
//! - [`RegistrationId`]: Webhook registration identifier
//! - [`EventId`]: Unique identifier of one emitted event envelope
//! - [`DeliveryId`]: Identifier of one persisted delivery attempt

use uuid::Uuid;

pub type OwnerId = Uuid;
pub type RegistrationId = Uuid;
pub type EventId = Uuid;
pub type DeliveryId = Uuid;

/// Abbreviate a UUID to its first 8 characters for log fields.
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}
