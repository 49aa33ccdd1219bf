//! Event types and the envelope sent to webhook receivers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::EventId;

/// Domain event types that can trigger webhook deliveries.
///
/// The vocabulary is closed: receivers subscribe to members of this enum and
/// the serialized tag (e.g. `payment.completed`) is versioned with the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// A payment reached its terminal successful state
    #[serde(rename = "payment.completed")]
    PaymentCompleted,
    /// A payment failed terminally
    #[serde(rename = "payment.failed")]
    PaymentFailed,
    /// A settlement was scheduled for payout
    #[serde(rename = "settlement.scheduled")]
    SettlementScheduled,
    /// A settlement payout completed
    #[serde(rename = "settlement.completed")]
    SettlementCompleted,
    /// A voucher was redeemed against a payment
    #[serde(rename = "voucher.redeemed")]
    VoucherRedeemed,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentCompleted => "payment.completed",
            Self::PaymentFailed => "payment.failed",
            Self::SettlementScheduled => "settlement.scheduled",
            Self::SettlementCompleted => "settlement.completed",
            Self::VoucherRedeemed => "voucher.redeemed",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payment.completed" => Ok(Self::PaymentCompleted),
            "payment.failed" => Ok(Self::PaymentFailed),
            "settlement.scheduled" => Ok(Self::SettlementScheduled),
            "settlement.completed" => Ok(Self::SettlementCompleted),
            "voucher.redeemed" => Ok(Self::VoucherRedeemed),
            _ => Err(format!("Unknown event type: {}", s)),
        }
    }
}

/// The immutable, uniquely identified unit of data emitted for one domain
/// occurrence.
///
/// One envelope is built per emission; when an event fans out to N
/// registrations, all N deliveries share the same event ID and payload
/// bytes. The envelope is ephemeral — only delivery attempts are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Fresh per emission
    pub id: EventId,
    #[serde(rename = "event")]
    pub event_type: EventType,
    /// When the event was emitted
    pub timestamp: DateTime<Utc>,
    /// Opaque structured body; not interpreted by the dispatch core
    pub data: serde_json::Value,
}

impl EventEnvelope {
    /// Build an envelope for one emission: fresh ID, current timestamp, the
    /// data wrapped unmodified.
    pub fn build(event_type: EventType, data: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            timestamp: Utc::now(),
            data,
        }
    }

    /// Serialize the envelope to the exact JSON string that is both signed
    /// and transmitted.
    pub fn to_payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
