//! E-mail admission rules and shared-secret checks for public and admin
//! endpoints.

mod credentials;
mod email;

pub use credentials::{verify_bearer, verify_shared_secret, CredentialError};
pub use email::{EmailAddress, EmailPolicy};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EmailPolicyConfig;
use crate::store::RepositoryError;

/// A banned address; banned users cannot sign up or register properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ban {
    pub email: EmailAddress,
    pub reason: String,
    pub banned_at: DateTime<Utc>,
}

pub trait BanRepository: Send + Sync {
    fn upsert(&self, ban: Ban) -> Result<Ban, RepositoryError>;
    fn remove(&self, email: &EmailAddress) -> Result<bool, RepositoryError>;
    fn fetch(&self, email: &EmailAddress) -> Result<Option<Ban>, RepositoryError>;
    fn list(&self) -> Result<Vec<Ban>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("'{0}' is not a valid e-mail address")]
    InvalidEmail(String),
    #[error("e-mail domain '{domain}' is not accepted")]
    DomainDenied { domain: String },
    #[error("e-mail domain '{domain}' is not on the allow list")]
    DomainNotAllowed { domain: String },
    #[error("this e-mail address has been banned")]
    Banned,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Combines the configured e-mail policy with the ban list.
pub struct AccessGuard<B> {
    policy: EmailPolicy,
    bans: Arc<B>,
}

impl<B> AccessGuard<B>
where
    B: BanRepository + 'static,
{
    pub fn new(config: &EmailPolicyConfig, bans: Arc<B>) -> Self {
        Self {
            policy: EmailPolicy::from_config(config),
            bans,
        }
    }

    /// Normalizes the address and checks it against the policy and the ban list.
    pub fn admit(&self, raw: &str) -> Result<EmailAddress, AccessError> {
        let email = EmailAddress::parse(raw)?;
        self.policy.check(&email)?;
        if self.bans.fetch(&email)?.is_some() {
            tracing::info!(domain = email.domain(), "rejected banned address");
            return Err(AccessError::Banned);
        }
        Ok(email)
    }

    pub fn ban(&self, raw: &str, reason: &str) -> Result<Ban, AccessError> {
        let email = EmailAddress::parse(raw)?;
        let ban = Ban {
            email,
            reason: reason.trim().to_string(),
            banned_at: Utc::now(),
        };
        Ok(self.bans.upsert(ban)?)
    }

    pub fn unban(&self, raw: &str) -> Result<bool, AccessError> {
        let email = EmailAddress::parse(raw)?;
        Ok(self.bans.remove(&email)?)
    }

    pub fn bans(&self) -> Result<Vec<Ban>, AccessError> {
        Ok(self.bans.list()?)
    }
}
