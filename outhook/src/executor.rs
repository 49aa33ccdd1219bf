//! Single-attempt HTTP delivery.
//!
//! The executor performs exactly one POST per call and reports the outcome;
//! retry policy lives one layer up in the scheduler.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;

use crate::config::DispatchConfig;
use crate::events::EventEnvelope;
use crate::signing;
use crate::store::WebhookRegistration;

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOutcome {
    /// Whether the receiver answered with a 2xx status
    pub success: bool,
    /// HTTP status code received, absent on transport-level failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Error message, absent on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Time taken for the attempt in milliseconds
    pub duration_ms: u64,
}

/// Performs one delivery attempt of a signed payload to one target.
///
/// `payload` is the exact serialized envelope: the same bytes are signed and
/// transmitted.
#[async_trait]
pub trait DeliveryExecutor: Send + Sync {
    async fn attempt(&self, registration: &WebhookRegistration, envelope: &EventEnvelope, payload: &str) -> DeliveryOutcome;
}

/// Production executor backed by `reqwest`.
///
/// Redirects are disabled: a 3xx answer is treated like any other non-2xx
/// response (failed attempt, eligible for retry) rather than being followed.
pub struct HttpDeliveryExecutor {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpDeliveryExecutor {
    pub fn new(config: &DispatchConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create webhook HTTP client");

        Self {
            client,
            user_agent: config.user_agent.clone(),
        }
    }
}

#[async_trait]
impl DeliveryExecutor for HttpDeliveryExecutor {
    async fn attempt(&self, registration: &WebhookRegistration, envelope: &EventEnvelope, payload: &str) -> DeliveryOutcome {
        // Fresh signature per attempt so the timestamp reflects send time
        let timestamp = Utc::now().timestamp();
        let signature = signing::sign(payload, &registration.secret, timestamp);

        let started = Instant::now();
        let result = self
            .client
            .post(&registration.url)
            .header("content-type", "application/json")
            .header("user-agent", &self.user_agent)
            .header("webhook-id", envelope.id.to_string())
            .header("webhook-event", envelope.event_type.as_str())
            .header("webhook-signature", signature)
            .body(payload.to_string())
            .send()
            .await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                let status_code = response.status().as_u16();
                if response.status().is_success() {
                    DeliveryOutcome {
                        success: true,
                        status_code: Some(status_code),
                        error: None,
                        duration_ms,
                    }
                } else {
                    DeliveryOutcome {
                        success: false,
                        status_code: Some(status_code),
                        error: Some(format!("HTTP {}", status_code)),
                        duration_ms,
                    }
                }
            }
            Err(e) => DeliveryOutcome {
                success: false,
                status_code: None,
                error: Some(e.to_string()),
                duration_ms,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Utc;
    use uuid::Uuid;
    use wiremock::matchers::{header_exists, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::events::EventType;

    fn make_registration(url: &str) -> WebhookRegistration {
        let now = Utc::now();
        WebhookRegistration {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            url: url.to_string(),
            secret: signing::generate_secret(),
            events: BTreeSet::from([EventType::PaymentCompleted]),
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn executor() -> HttpDeliveryExecutor {
        HttpDeliveryExecutor::new(&DispatchConfig::default())
    }

    #[tokio::test]
    async fn test_successful_delivery() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header_exists("webhook-signature"))
            .and(header_exists("webhook-id"))
            .and(header_exists("webhook-event"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let registration = make_registration(&mock_server.uri());
        let envelope = EventEnvelope::build(EventType::PaymentCompleted, serde_json::json!({"amount": 1000}));
        let payload = envelope.to_payload().unwrap();

        let outcome = executor().attempt(&registration, &envelope, &payload).await;
        assert!(outcome.success);
        assert_eq!(outcome.status_code, Some(200));
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn test_http_error_delivery() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let registration = make_registration(&mock_server.uri());
        let envelope = EventEnvelope::build(EventType::PaymentFailed, serde_json::json!({}));
        let payload = envelope.to_payload().unwrap();

        let outcome = executor().attempt(&registration, &envelope, &payload).await;
        assert!(!outcome.success);
        assert_eq!(outcome.status_code, Some(500));
        assert_eq!(outcome.error.as_deref(), Some("HTTP 500"));
    }

    #[tokio::test]
    async fn test_network_error_delivery() {
        // Point to a port that's not listening
        let registration = make_registration("http://127.0.0.1:1");
        let envelope = EventEnvelope::build(EventType::VoucherRedeemed, serde_json::json!({}));
        let payload = envelope.to_payload().unwrap();

        let outcome = executor().attempt(&registration, &envelope, &payload).await;
        assert!(!outcome.success);
        assert!(outcome.status_code.is_none());
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn test_redirect_is_a_failed_attempt() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "https://elsewhere.example"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let registration = make_registration(&mock_server.uri());
        let envelope = EventEnvelope::build(EventType::SettlementScheduled, serde_json::json!({}));
        let payload = envelope.to_payload().unwrap();

        let outcome = executor().attempt(&registration, &envelope, &payload).await;
        assert!(!outcome.success);
        assert_eq!(outcome.status_code, Some(302));
    }

    #[tokio::test]
    async fn test_signature_verifies_against_sent_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let registration = make_registration(&mock_server.uri());
        let envelope = EventEnvelope::build(EventType::PaymentCompleted, serde_json::json!({"amount": 1000}));
        let payload = envelope.to_payload().unwrap();

        executor().attempt(&registration, &envelope, &payload).await;

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);

        let body = String::from_utf8(requests[0].body.clone()).unwrap();
        assert_eq!(body, payload);

        let token = requests[0].headers.get("webhook-signature").unwrap().to_str().unwrap();
        assert!(signing::verify(
            &body,
            token,
            &registration.secret,
            Utc::now().timestamp(),
            signing::DEFAULT_TOLERANCE_SECS,
        ));
        assert_eq!(
            requests[0].headers.get("webhook-id").unwrap().to_str().unwrap(),
            envelope.id.to_string()
        );
        assert_eq!(
            requests[0].headers.get("webhook-event").unwrap().to_str().unwrap(),
            "payment.completed"
        );
    }
}
