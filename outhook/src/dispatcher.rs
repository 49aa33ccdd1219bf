//! Top-level event emission: match registrations, build one envelope, fan
//! out retry sequences on a bounded worker pool.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::DispatchConfig;
use crate::events::{EventEnvelope, EventType};
use crate::executor::{DeliveryExecutor, HttpDeliveryExecutor};
use crate::recorder::DeliveryRecorder;
use crate::registry::WebhookRegistry;
use crate::scheduler::{RetryPolicy, RetryScheduler, Sleeper, TokioSleeper};
use crate::types::{OwnerId, abbrev_uuid};

/// Fans out one event to every enabled, subscribed registration.
///
/// `emit` is fire-and-forget from the caller's perspective: it never returns
/// an error and surfaces per-registration results only through the delivery
/// history and logs.
pub struct WebhookDispatcher {
    registry: WebhookRegistry,
    scheduler: Arc<RetryScheduler>,
    semaphore: Arc<Semaphore>,
}

impl WebhookDispatcher {
    /// Production dispatcher: HTTP executor and tokio timer.
    pub fn new(registry: WebhookRegistry, recorder: DeliveryRecorder, config: &DispatchConfig) -> Self {
        Self::with_parts(
            registry,
            recorder,
            Arc::new(HttpDeliveryExecutor::new(config)),
            Arc::new(TokioSleeper),
            config,
        )
    }

    /// Dispatcher over injected executor and sleeper, for tests and custom
    /// transports.
    pub fn with_parts(
        registry: WebhookRegistry,
        recorder: DeliveryRecorder,
        executor: Arc<dyn DeliveryExecutor>,
        sleeper: Arc<dyn Sleeper>,
        config: &DispatchConfig,
    ) -> Self {
        let scheduler = Arc::new(RetryScheduler::new(executor, recorder, RetryPolicy::from_config(config), sleeper));

        Self {
            registry,
            scheduler,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_sends)),
        }
    }

    /// Emit one event and run every matching registration's retry sequence
    /// to a terminal state.
    ///
    /// Matching happens before the envelope is built, so an emission with no
    /// subscribers has no side effects at all. Registrations claimed here
    /// keep their in-flight sequences even if they are disabled or deleted
    /// mid-delivery; the flag only affects future emissions.
    pub async fn emit(&self, event_type: EventType, data: serde_json::Value, owner_filter: Option<OwnerId>) {
        let registrations = match self.registry.find_matching(event_type, owner_filter).await {
            Ok(registrations) => registrations,
            Err(e) => {
                warn!(error = %e, event = %event_type, "Failed to look up webhook registrations");
                return;
            }
        };

        if registrations.is_empty() {
            debug!(event = %event_type, "No matching webhook registrations");
            return;
        }

        let envelope = EventEnvelope::build(event_type, data);
        // Serialized exactly once; all fan-out deliveries sign and send
        // these same bytes.
        let payload = match envelope.to_payload() {
            Ok(payload) => Arc::new(payload),
            Err(e) => {
                warn!(error = %e, event = %event_type, "Failed to serialize event payload");
                return;
            }
        };
        let envelope = Arc::new(envelope);

        debug!(
            event = %event_type,
            event_id = %abbrev_uuid(&envelope.id),
            registrations = registrations.len(),
            "Dispatching webhook event"
        );

        let mut sequences = JoinSet::new();
        for registration in registrations {
            let permit = match self.semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!("Webhook delivery semaphore closed");
                    break;
                }
            };

            let scheduler = self.scheduler.clone();
            let envelope = envelope.clone();
            let payload = payload.clone();

            sequences.spawn(async move {
                let _permit = permit;
                let state = scheduler.run(&registration, &envelope, payload.as_str()).await;
                debug!(
                    registration_id = %abbrev_uuid(&registration.id),
                    event_id = %abbrev_uuid(&envelope.id),
                    state = ?state,
                    "Webhook delivery sequence finished"
                );
            });
        }

        while sequences.join_next().await.is_some() {}
    }

    /// Spawn the whole fan-out in the background for callers that must not
    /// wait out retry delays. Delivery status is observable only through the
    /// recorder.
    pub fn emit_background(self: &Arc<Self>, event_type: EventType, data: serde_json::Value, owner_filter: Option<OwnerId>) {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            dispatcher.emit(event_type, data, owner_filter).await;
        });
    }
}
