use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::domain::{
    clean_optional, Lead, LeadId, LeadRequest, NewsletterSubscription, WaitlistEntry,
};
use super::repository::SignupRepository;
use crate::access::{AccessError, AccessGuard, BanRepository, EmailAddress};
use crate::config::FeatureFlags;
use crate::store::RepositoryError;

/// Newsletter, waitlist and lead capture behind the e-mail admission rules.
pub struct SignupService<R, B> {
    repository: Arc<R>,
    access: Arc<AccessGuard<B>>,
    features: FeatureFlags,
}

impl<R, B> SignupService<R, B>
where
    R: SignupRepository + 'static,
    B: BanRepository + 'static,
{
    pub fn new(repository: Arc<R>, access: Arc<AccessGuard<B>>, features: FeatureFlags) -> Self {
        Self {
            repository,
            access,
            features,
        }
    }

    /// Subscribes `email`; subscribing an active address returns it unchanged.
    pub fn subscribe_newsletter(
        &self,
        email: &str,
    ) -> Result<NewsletterSubscription, SignupError> {
        self.ensure_enabled(self.features.newsletter, "newsletter")?;
        let email = self.access.admit(email)?;

        if let Some(existing) = self.repository.fetch_subscription(&email)? {
            if existing.subscribed {
                debug!(email = %email, "newsletter subscription already active");
                return Ok(existing);
            }
        }

        let subscription = self.repository.upsert_subscription(NewsletterSubscription {
            email,
            subscribed: true,
            subscribed_at: Utc::now(),
            unsubscribed_at: None,
        })?;
        info!(email = %subscription.email, "newsletter subscription stored");
        Ok(subscription)
    }

    /// Unsubscribing skips the ban list so blocked users can always opt out.
    pub fn unsubscribe_newsletter(
        &self,
        email: &str,
    ) -> Result<NewsletterSubscription, SignupError> {
        self.ensure_enabled(self.features.newsletter, "newsletter")?;
        let email = EmailAddress::parse(email)?;

        let mut subscription = self
            .repository
            .fetch_subscription(&email)?
            .ok_or(SignupError::Repository(RepositoryError::NotFound))?;
        if subscription.subscribed {
            subscription.subscribed = false;
            subscription.unsubscribed_at = Some(Utc::now());
            subscription = self.repository.upsert_subscription(subscription)?;
            info!(email = %email, "newsletter subscription cancelled");
        }
        Ok(subscription)
    }

    pub fn join_waitlist(
        &self,
        email: &str,
        name: Option<String>,
    ) -> Result<(WaitlistEntry, bool), SignupError> {
        self.ensure_enabled(self.features.waitlist, "waitlist")?;
        let email = self.access.admit(email)?;
        let (entry, created) =
            self.repository
                .join_waitlist(email, clean_optional(name), Utc::now())?;
        if created {
            info!(email = %entry.email, position = entry.position, "joined waitlist");
        }
        Ok((entry, created))
    }

    pub fn submit_lead(&self, request: LeadRequest) -> Result<Lead, SignupError> {
        self.ensure_enabled(self.features.leads, "leads")?;
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(SignupError::MissingField("name"));
        }
        let email = self.access.admit(&request.email)?;

        let lead = self.repository.insert_lead(Lead {
            id: LeadId::generate(),
            name,
            email,
            phone: clean_optional(request.phone),
            property_address: clean_optional(request.property_address),
            created_at: Utc::now(),
        })?;
        info!(lead_id = %lead.id, "lead captured");
        Ok(lead)
    }

    pub fn leads(&self, limit: usize) -> Result<Vec<Lead>, SignupError> {
        Ok(self.repository.leads(limit)?)
    }

    fn ensure_enabled(&self, enabled: bool, feature: &'static str) -> Result<(), SignupError> {
        if enabled {
            Ok(())
        } else {
            Err(SignupError::Disabled(feature))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SignupError {
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("{0} is not available")]
    Disabled(&'static str),
    #[error("field '{0}' is required")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmailPolicyConfig;
    use crate::store::memory::{InMemoryBanRepository, InMemorySignupRepository};

    fn service(features: FeatureFlags) -> SignupService<InMemorySignupRepository, InMemoryBanRepository> {
        let config = EmailPolicyConfig {
            allow_domains: Default::default(),
            deny_domains: ["mailinator.com".to_string()].into_iter().collect(),
        };
        let access = Arc::new(AccessGuard::new(
            &config,
            Arc::new(InMemoryBanRepository::default()),
        ));
        SignupService::new(Arc::new(InMemorySignupRepository::default()), access, features)
    }

    #[test]
    fn resubscribing_is_idempotent() {
        let service = service(FeatureFlags::default());
        let first = service
            .subscribe_newsletter("Reader@Example.com")
            .expect("subscribed");
        let second = service
            .subscribe_newsletter("reader@example.com")
            .expect("still subscribed");
        assert_eq!(first, second);

        let cancelled = service
            .unsubscribe_newsletter("reader@example.com")
            .expect("unsubscribed");
        assert!(!cancelled.subscribed);
        assert!(cancelled.unsubscribed_at.is_some());

        let again = service
            .subscribe_newsletter("reader@example.com")
            .expect("resubscribed");
        assert!(again.subscribed);
        assert_eq!(again.unsubscribed_at, None);
    }

    #[test]
    fn waitlist_positions_are_stable() {
        let service = service(FeatureFlags::default());
        let (first, created) = service
            .join_waitlist("one@example.com", Some("  Ada ".to_string()))
            .expect("joined");
        assert!(created);
        assert_eq!(first.position, 1);
        assert_eq!(first.name.as_deref(), Some("Ada"));

        let (second, _) = service
            .join_waitlist("two@example.com", None)
            .expect("joined");
        assert_eq!(second.position, 2);

        let (repeat, created) = service
            .join_waitlist("ONE@example.com", None)
            .expect("existing entry");
        assert!(!created);
        assert_eq!(repeat, first);
    }

    #[test]
    fn denied_domains_and_missing_names_are_rejected() {
        let service = service(FeatureFlags::default());
        assert!(matches!(
            service.join_waitlist("bot@mailinator.com", None),
            Err(SignupError::Access(AccessError::DomainDenied { .. }))
        ));
        let err = service
            .submit_lead(LeadRequest {
                name: "   ".to_string(),
                email: "seller@example.com".to_string(),
                phone: None,
                property_address: None,
            })
            .expect_err("name required");
        assert!(matches!(err, SignupError::MissingField("name")));
    }

    #[test]
    fn disabled_features_refuse_requests() {
        let features = FeatureFlags::parse("-waitlist").expect("valid flags");
        let service = service(features);
        assert!(matches!(
            service.join_waitlist("one@example.com", None),
            Err(SignupError::Disabled("waitlist"))
        ));
        assert!(service.subscribe_newsletter("one@example.com").is_ok());
    }
}
