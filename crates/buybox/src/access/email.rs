use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::AccessError;
use crate::config::EmailPolicyConfig;

/// Lower-cased, syntactically checked e-mail address.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: &str) -> Result<Self, AccessError> {
        let normalized = raw.trim().to_ascii_lowercase();
        let invalid = || AccessError::InvalidEmail(raw.trim().to_string());

        if normalized.len() > 254 || normalized.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        let (local, domain) = normalized.split_once('@').ok_or_else(invalid)?;
        if local.is_empty() || domain.contains('@') {
            return Err(invalid());
        }

        let labels: Vec<&str> = domain.split('.').collect();
        if labels.len() < 2
            || labels
                .iter()
                .any(|label| label.is_empty() || label.starts_with('-') || label.ends_with('-'))
        {
            return Err(invalid());
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn domain(&self) -> &str {
        self.0
            .split_once('@')
            .map(|(_, domain)| domain)
            .unwrap_or_default()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Domain allow/deny rules. An empty allow list admits every domain that is
/// not denied. Subdomains match their parent entry.
#[derive(Debug, Clone, Default)]
pub struct EmailPolicy {
    allow: BTreeSet<String>,
    deny: BTreeSet<String>,
}

impl EmailPolicy {
    pub fn from_config(config: &EmailPolicyConfig) -> Self {
        Self {
            allow: config.allow_domains.clone(),
            deny: config.deny_domains.clone(),
        }
    }

    pub fn check(&self, email: &EmailAddress) -> Result<(), AccessError> {
        let domain = email.domain();
        if matches_any(&self.deny, domain) {
            return Err(AccessError::DomainDenied {
                domain: domain.to_string(),
            });
        }
        if !self.allow.is_empty() && !matches_any(&self.allow, domain) {
            return Err(AccessError::DomainNotAllowed {
                domain: domain.to_string(),
            });
        }
        Ok(())
    }
}

fn matches_any(entries: &BTreeSet<String>, domain: &str) -> bool {
    entries.iter().any(|entry| {
        domain == entry
            || domain
                .strip_suffix(entry.as_str())
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}
