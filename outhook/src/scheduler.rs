//! Bounded retry loop for one (registration, event) pair.
//!
//! The loop is an explicit state machine driven through injected executor
//! and sleep abstractions, so timing policy is testable without wall-clock
//! delays:
//!
//! ```text
//! PENDING → ATTEMPTING → SUCCEEDED (terminal)
//!               │
//!               ├→ RETRY_WAIT → ATTEMPTING (loop)
//!               └→ FAILED (terminal, schedule exhausted)
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::DispatchConfig;
use crate::events::EventEnvelope;
use crate::executor::DeliveryExecutor;
use crate::recorder::DeliveryRecorder;
use crate::store::WebhookRegistration;
use crate::types::abbrev_uuid;

/// Sleep abstraction so tests can observe delays instead of serving them.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Fixed inter-attempt delay schedule.
///
/// Attempt 1 is immediate; attempt N+1 follows `delays[N-1]`. The maximum
/// number of attempts is `delays.len() + 1`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl RetryPolicy {
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(config.retry_delays_secs.iter().map(|&secs| Duration::from_secs(secs)).collect())
    }

    pub fn max_attempts(&self) -> u32 {
        self.delays.len() as u32 + 1
    }

    /// Delay to apply after a failed attempt with this ordinal, or `None`
    /// when the schedule is exhausted.
    pub fn delay_after(&self, attempt_number: u32) -> Option<Duration> {
        self.delays.get(attempt_number as usize - 1).copied()
    }
}

impl Default for RetryPolicy {
    /// 1s → 5s → 30s between attempts, 4 attempts total.
    fn default() -> Self {
        Self::new(vec![Duration::from_secs(1), Duration::from_secs(5), Duration::from_secs(30)])
    }
}

/// Delivery sequence states. `Succeeded` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Pending,
    Attempting,
    RetryWait,
    Succeeded,
    Failed,
}

/// Drives the executor through a bounded sequence of attempts, recording
/// each one.
pub struct RetryScheduler {
    executor: Arc<dyn DeliveryExecutor>,
    recorder: DeliveryRecorder,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryScheduler {
    pub fn new(executor: Arc<dyn DeliveryExecutor>, recorder: DeliveryRecorder, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            executor,
            recorder,
            policy,
            sleeper,
        }
    }

    /// Run the sequence to a terminal state.
    ///
    /// Every attempt is recorded with its true 1-based ordinal. A failed
    /// recording write is surfaced as a warning but does not abort the
    /// delivery in progress.
    pub async fn run(&self, registration: &WebhookRegistration, envelope: &EventEnvelope, payload: &str) -> DeliveryState {
        let mut state = DeliveryState::Pending;
        let mut attempt_number: u32 = 1;

        loop {
            match state {
                DeliveryState::Pending => state = DeliveryState::Attempting,
                DeliveryState::Attempting => {
                    let outcome = self.executor.attempt(registration, envelope, payload).await;

                    if let Err(e) = self.recorder.append(registration.id, envelope, payload, &outcome, attempt_number).await {
                        warn!(
                            error = %e,
                            registration_id = %abbrev_uuid(&registration.id),
                            event_id = %abbrev_uuid(&envelope.id),
                            attempt = attempt_number,
                            "Failed to record delivery attempt"
                        );
                    }

                    state = if outcome.success {
                        debug!(
                            registration_id = %abbrev_uuid(&registration.id),
                            event_id = %abbrev_uuid(&envelope.id),
                            status = ?outcome.status_code,
                            attempt = attempt_number,
                            "Webhook delivered successfully"
                        );
                        DeliveryState::Succeeded
                    } else if self.policy.delay_after(attempt_number).is_some() {
                        debug!(
                            registration_id = %abbrev_uuid(&registration.id),
                            event_id = %abbrev_uuid(&envelope.id),
                            status = ?outcome.status_code,
                            error = ?outcome.error,
                            attempt = attempt_number,
                            "Webhook delivery attempt failed, will retry"
                        );
                        DeliveryState::RetryWait
                    } else {
                        warn!(
                            registration_id = %abbrev_uuid(&registration.id),
                            event_id = %abbrev_uuid(&envelope.id),
                            status = ?outcome.status_code,
                            error = ?outcome.error,
                            attempts = attempt_number,
                            "Webhook delivery exhausted all attempts"
                        );
                        DeliveryState::Failed
                    };
                }
                DeliveryState::RetryWait => {
                    if let Some(delay) = self.policy.delay_after(attempt_number) {
                        self.sleeper.sleep(delay).await;
                    }
                    attempt_number += 1;
                    state = DeliveryState::Attempting;
                }
                DeliveryState::Succeeded | DeliveryState::Failed => return state,
            }
        }
    }
}
