//! Registration CRUD and event matching, scoped to an owning party.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use crate::errors::{Error, Result};
use crate::events::EventType;
use crate::signing;
use crate::store::{RegistrationUpdate, WebhookRegistration, WebhookStore};
use crate::types::{OwnerId, RegistrationId, abbrev_uuid};

/// Owns the set of webhook registrations over an injected store.
///
/// Update, delete and rotate require the caller's owner ID to match the
/// record's; a mismatch is reported as [`Error::NotFound`] so one owner
/// cannot probe for another owner's registrations.
#[derive(Clone)]
pub struct WebhookRegistry {
    store: Arc<dyn WebhookStore>,
}

impl WebhookRegistry {
    pub fn new(store: Arc<dyn WebhookStore>) -> Self {
        Self { store }
    }

    /// Create a registration with a fresh ID and secret.
    ///
    /// The returned record includes the secret; it is the caller's only
    /// chance to show it.
    #[instrument(skip(self, url, events), fields(owner_id = %abbrev_uuid(&owner_id)), err)]
    pub async fn register(&self, owner_id: OwnerId, url: &str, events: BTreeSet<EventType>) -> Result<WebhookRegistration> {
        validate_target_url(url)?;
        if events.is_empty() {
            return Err(Error::BadRequest {
                message: "At least one event type must be subscribed".to_string(),
            });
        }

        let now = Utc::now();
        let registration = WebhookRegistration {
            id: Uuid::new_v4(),
            owner_id,
            url: url.to_string(),
            secret: signing::generate_secret(),
            events,
            enabled: true,
            created_at: now,
            updated_at: now,
        };

        self.store.insert_registration(registration.clone()).await?;
        Ok(registration)
    }

    /// Update target, event set and/or enabled flag. ID and secret are
    /// immutable.
    #[instrument(skip(self, update), fields(registration_id = %abbrev_uuid(&id), owner_id = %abbrev_uuid(&owner_id)), err)]
    pub async fn update(&self, id: RegistrationId, owner_id: OwnerId, update: RegistrationUpdate) -> Result<WebhookRegistration> {
        let mut registration = self.get_owned(id, owner_id).await?;

        if let Some(url) = update.url {
            validate_target_url(&url)?;
            registration.url = url;
        }
        if let Some(events) = update.events {
            if events.is_empty() {
                return Err(Error::BadRequest {
                    message: "At least one event type must be subscribed".to_string(),
                });
            }
            registration.events = events;
        }
        if let Some(enabled) = update.enabled {
            registration.enabled = enabled;
        }
        registration.updated_at = Utc::now();

        self.store.update_registration(registration.clone()).await?;
        Ok(registration)
    }

    /// Delete a registration. Past delivery records are kept for audit.
    #[instrument(skip(self), fields(registration_id = %abbrev_uuid(&id), owner_id = %abbrev_uuid(&owner_id)), err)]
    pub async fn delete(&self, id: RegistrationId, owner_id: OwnerId) -> Result<()> {
        self.get_owned(id, owner_id).await?;
        self.store.delete_registration(id).await?;
        Ok(())
    }

    /// Replace the signing secret, invalidating the old one. The returned
    /// record is the only place the new secret is visible.
    #[instrument(skip(self), fields(registration_id = %abbrev_uuid(&id), owner_id = %abbrev_uuid(&owner_id)), err)]
    pub async fn rotate_secret(&self, id: RegistrationId, owner_id: OwnerId) -> Result<WebhookRegistration> {
        let mut registration = self.get_owned(id, owner_id).await?;
        registration.secret = signing::generate_secret();
        registration.updated_at = Utc::now();

        self.store.update_registration(registration.clone()).await?;
        Ok(registration)
    }

    /// All registrations belonging to one owner.
    #[instrument(skip(self), fields(owner_id = %abbrev_uuid(&owner_id)), err)]
    pub async fn list_for_owner(&self, owner_id: OwnerId) -> Result<Vec<WebhookRegistration>> {
        let registrations = self.store.list_registrations().await?;
        Ok(registrations.into_iter().filter(|r| r.owner_id == owner_id).collect())
    }

    /// Enabled registrations subscribed to `event_type`, optionally
    /// restricted to a single owner.
    #[instrument(skip(self), fields(event = %event_type), err)]
    pub async fn find_matching(&self, event_type: EventType, owner_filter: Option<OwnerId>) -> Result<Vec<WebhookRegistration>> {
        let registrations = self.store.list_registrations().await?;
        Ok(registrations
            .into_iter()
            .filter(|r| r.accepts_event(event_type))
            .filter(|r| owner_filter.is_none_or(|owner| r.owner_id == owner))
            .collect())
    }

    async fn get_owned(&self, id: RegistrationId, owner_id: OwnerId) -> Result<WebhookRegistration> {
        match self.store.get_registration(id).await? {
            Some(registration) if registration.owner_id == owner_id => Ok(registration),
            // Ownership mismatch is indistinguishable from absence
            _ => Err(Error::NotFound {
                resource: "Webhook registration",
                id: id.to_string(),
            }),
        }
    }
}

fn validate_target_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url).map_err(|e| Error::BadRequest {
        message: format!("Invalid webhook URL: {}", e),
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::BadRequest {
            message: "Webhook URL must use http or https".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn registry() -> WebhookRegistry {
        WebhookRegistry::new(Arc::new(MemoryStore::new()))
    }

    fn events(types: &[EventType]) -> BTreeSet<EventType> {
        types.iter().copied().collect()
    }

    #[tokio::test]
    async fn test_register_generates_id_and_secret() {
        let registry = registry();
        let owner = Uuid::new_v4();

        let registration = registry
            .register(owner, "https://merchant.example/hooks", events(&[EventType::PaymentCompleted]))
            .await
            .unwrap();

        assert!(registration.secret.starts_with(signing::SECRET_PREFIX));
        assert!(registration.enabled);
        assert_eq!(registration.owner_id, owner);

        let listed = registry.list_for_owner(owner).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, registration.id);
    }

    #[tokio::test]
    async fn test_register_rejects_empty_event_set_and_bad_urls() {
        let registry = registry();
        let owner = Uuid::new_v4();

        let result = registry.register(owner, "https://merchant.example/hooks", BTreeSet::new()).await;
        assert!(matches!(result, Err(Error::BadRequest { .. })));

        let result = registry.register(owner, "not a url", events(&[EventType::PaymentCompleted])).await;
        assert!(matches!(result, Err(Error::BadRequest { .. })));

        let result = registry
            .register(owner, "ftp://merchant.example/hooks", events(&[EventType::PaymentCompleted]))
            .await;
        assert!(matches!(result, Err(Error::BadRequest { .. })));
    }

    #[tokio::test]
    async fn test_update_mutates_allowed_fields_only() {
        let registry = registry();
        let owner = Uuid::new_v4();
        let registration = registry
            .register(owner, "https://merchant.example/hooks", events(&[EventType::PaymentCompleted]))
            .await
            .unwrap();

        let updated = registry
            .update(
                registration.id,
                owner,
                RegistrationUpdate {
                    url: Some("https://merchant.example/v2/hooks".to_string()),
                    events: Some(events(&[EventType::VoucherRedeemed])),
                    enabled: Some(false),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.url, "https://merchant.example/v2/hooks");
        assert_eq!(updated.events, events(&[EventType::VoucherRedeemed]));
        assert!(!updated.enabled);
        // Immutable fields
        assert_eq!(updated.id, registration.id);
        assert_eq!(updated.secret, registration.secret);
    }

    #[tokio::test]
    async fn test_cross_owner_update_and_delete_are_not_found() {
        let registry = registry();
        let owner = Uuid::new_v4();
        let other_owner = Uuid::new_v4();
        let registration = registry
            .register(owner, "https://merchant.example/hooks", events(&[EventType::PaymentCompleted]))
            .await
            .unwrap();

        let result = registry
            .update(registration.id, other_owner, RegistrationUpdate { enabled: Some(false), ..Default::default() })
            .await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        let result = registry.delete(registration.id, other_owner).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        // The rightful owner still can
        registry.delete(registration.id, owner).await.unwrap();
        let result = registry.delete(registration.id, owner).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_rotate_secret_replaces_it() {
        let registry = registry();
        let owner = Uuid::new_v4();
        let registration = registry
            .register(owner, "https://merchant.example/hooks", events(&[EventType::PaymentCompleted]))
            .await
            .unwrap();

        let rotated = registry.rotate_secret(registration.id, owner).await.unwrap();
        assert_ne!(rotated.secret, registration.secret);
        assert!(rotated.secret.starts_with(signing::SECRET_PREFIX));

        let result = registry.rotate_secret(registration.id, Uuid::new_v4()).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_find_matching_filters_disabled_and_unsubscribed() {
        let registry = registry();
        let owner = Uuid::new_v4();

        let subscribed = registry
            .register(owner, "https://a.example/hooks", events(&[EventType::PaymentCompleted]))
            .await
            .unwrap();
        let unsubscribed = registry
            .register(owner, "https://b.example/hooks", events(&[EventType::VoucherRedeemed]))
            .await
            .unwrap();
        let disabled = registry
            .register(owner, "https://c.example/hooks", events(&[EventType::PaymentCompleted]))
            .await
            .unwrap();
        registry
            .update(disabled.id, owner, RegistrationUpdate { enabled: Some(false), ..Default::default() })
            .await
            .unwrap();

        let matching = registry.find_matching(EventType::PaymentCompleted, None).await.unwrap();
        let ids: Vec<_> = matching.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![subscribed.id]);
        assert!(!ids.contains(&unsubscribed.id));
        assert!(!ids.contains(&disabled.id));
    }

    #[tokio::test]
    async fn test_find_matching_owner_filter() {
        let registry = registry();
        let owner_a = Uuid::new_v4();
        let owner_b = Uuid::new_v4();

        let a = registry
            .register(owner_a, "https://a.example/hooks", events(&[EventType::SettlementScheduled]))
            .await
            .unwrap();
        registry
            .register(owner_b, "https://b.example/hooks", events(&[EventType::SettlementScheduled]))
            .await
            .unwrap();

        let all = registry.find_matching(EventType::SettlementScheduled, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let filtered = registry.find_matching(EventType::SettlementScheduled, Some(owner_a)).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, a.id);
    }
}
