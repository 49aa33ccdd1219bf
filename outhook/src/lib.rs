//! # outhook: Outbound Webhook Delivery Core
//!
//! `outhook` signs, dispatches, retries and audits asynchronous event
//! notifications sent to merchant-registered HTTP listeners whenever domain
//! events occur (payment completed, settlement scheduled, voucher redeemed).
//!
//! ## Architecture
//!
//! One event emission flows through the components like this:
//!
//! ```text
//! emit(event_type, data, owner_filter?)
//!   ├─ WebhookRegistry::find_matching()   // enabled + subscribed, match first
//!   ├─ EventEnvelope::build()             // fresh event ID, serialized once
//!   └─ per registration (semaphore-bounded pool):
//!        RetryScheduler::run()            // PENDING → ATTEMPTING → ... state machine
//!          ├─ DeliveryExecutor::attempt() // sign (HMAC-SHA256) + single POST, 30s timeout
//!          └─ DeliveryRecorder::append()  // one immutable row per attempt
//! ```
//!
//! Delivery is at-least-once: a bounded schedule of attempts (immediate,
//! then 1s/5s/30s later) per registration, each recorded in an append-only
//! history that survives registration deletion. Nothing in the delivery loop
//! propagates an error to the emitter — an unreachable receiver only shows
//! up in logs and the delivery history.
//!
//! Persistence is behind the [`store::WebhookStore`] trait; the bundled
//! [`store::MemoryStore`] serves tests and embedded use, while deployments
//! implement the trait over their own record store.
//!
//! Receivers authenticate payloads with the [`signing`] module: the
//! `webhook-signature` header carries `t={timestamp},v1={hex-hmac-sha256}`
//! computed over `{timestamp}.{body}` with the registration secret, and
//! verification tolerates bounded clock skew while comparing digests in
//! constant time.

pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod events;
pub mod executor;
pub mod recorder;
pub mod registry;
pub mod scheduler;
pub mod signing;
pub mod store;
pub mod types;

pub use config::DispatchConfig;
pub use dispatcher::WebhookDispatcher;
pub use errors::{Error, Result};
pub use events::{EventEnvelope, EventType};
pub use executor::{DeliveryExecutor, DeliveryOutcome, HttpDeliveryExecutor};
pub use recorder::DeliveryRecorder;
pub use registry::WebhookRegistry;
pub use scheduler::{DeliveryState, RetryPolicy, RetryScheduler, Sleeper, TokioSleeper};
pub use signing::SignatureVerifier;
pub use store::{DeliveryAttempt, MemoryStore, RegistrationUpdate, WebhookRegistration, WebhookStore};
