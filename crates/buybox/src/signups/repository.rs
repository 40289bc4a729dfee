use chrono::{DateTime, Utc};

use super::domain::{Lead, NewsletterSubscription, WaitlistEntry};
use crate::access::EmailAddress;
use crate::store::RepositoryError;

/// Storage for the marketing-site sign-ups.
pub trait SignupRepository: Send + Sync {
    fn upsert_subscription(
        &self,
        subscription: NewsletterSubscription,
    ) -> Result<NewsletterSubscription, RepositoryError>;
    fn fetch_subscription(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<NewsletterSubscription>, RepositoryError>;

    /// Appends `email` to the waitlist with the next free position, or
    /// returns the existing entry. The flag reports whether an entry was
    /// created.
    fn join_waitlist(
        &self,
        email: EmailAddress,
        name: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<(WaitlistEntry, bool), RepositoryError>;

    fn insert_lead(&self, lead: Lead) -> Result<Lead, RepositoryError>;
    fn leads(&self, limit: usize) -> Result<Vec<Lead>, RepositoryError>;
}
