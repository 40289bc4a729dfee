use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::access::EmailAddress;
use crate::dashboard::DashboardView;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub String);

impl PropertyId {
    pub fn generate() -> Self {
        Self(format!("prop-{}", uuid::Uuid::new_v4().simple()))
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyAddress {
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub postcode: String,
}

impl PropertyAddress {
    /// Trims every field and reports the first required field left empty.
    pub fn normalized(self) -> Result<Self, &'static str> {
        let line1 = self.line1.trim().to_string();
        let city = self.city.trim().to_string();
        let postcode = self.postcode.trim().to_ascii_uppercase();
        if line1.is_empty() {
            return Err("line1");
        }
        if city.is_empty() {
            return Err("city");
        }
        if postcode.is_empty() {
            return Err("postcode");
        }
        Ok(Self {
            line1,
            line2: self
                .line2
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty()),
            city,
            postcode,
        })
    }
}

/// Raw third-party payload kept exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceivedPayload {
    pub received_at: DateTime<Utc>,
    pub payload: Value,
}

/// Property record. `dashboard_status` is the stored JSON blob; use
/// [`crate::dashboard::DashboardStatus::from_json`] to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub seller_email: EmailAddress,
    pub address: PropertyAddress,
    pub property_data: Option<Value>,
    pub status_updates: Vec<ReceivedPayload>,
    pub dashboard_status: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterProperty {
    pub seller_email: String,
    pub address: PropertyAddress,
}

/// Envelope shared by both webhooks: the target property plus an opaque body.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    pub property_id: String,
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusIngestOutcome {
    pub property_id: PropertyId,
    pub stored: bool,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<String>,
    pub dashboard: DashboardView,
}
