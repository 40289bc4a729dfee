use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use super::domain::{
    Property, PropertyId, ReceivedPayload, RegisterProperty, StatusIngestOutcome,
};
use crate::access::{AccessError, AccessGuard, BanRepository};
use crate::dashboard::{DashboardError, DashboardStatus, DashboardView, StatusUpdate};
use crate::store::RepositoryError;

/// Storage abstraction for property records.
pub trait PropertyRepository: Send + Sync {
    fn insert(&self, property: Property) -> Result<Property, RepositoryError>;
    /// Applies `apply` to the stored property under the store's lock and
    /// persists the result only when `apply` succeeds.
    fn modify<T, E, F>(&self, id: &PropertyId, apply: F) -> Result<T, E>
    where
        F: FnOnce(&mut Property) -> Result<T, E>,
        E: From<RepositoryError>;
    fn fetch(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError>;
    fn list(&self, limit: usize) -> Result<Vec<Property>, RepositoryError>;
}

/// Registers seller properties and ingests third-party webhook payloads.
pub struct PropertyService<R, B> {
    repository: Arc<R>,
    access: Arc<AccessGuard<B>>,
}

impl<R, B> PropertyService<R, B>
where
    R: PropertyRepository + 'static,
    B: BanRepository + 'static,
{
    pub fn new(repository: Arc<R>, access: Arc<AccessGuard<B>>) -> Self {
        Self { repository, access }
    }

    pub fn register(&self, request: RegisterProperty) -> Result<Property, PropertyServiceError> {
        let seller_email = self.access.admit(&request.seller_email)?;
        let address = request
            .address
            .normalized()
            .map_err(PropertyServiceError::InvalidAddress)?;

        let now = Utc::now();
        let property = Property {
            id: PropertyId::generate(),
            seller_email,
            address,
            property_data: None,
            status_updates: Vec::new(),
            dashboard_status: DashboardStatus::initial(now).to_json(),
            created_at: now,
            updated_at: now,
        };

        let stored = self.repository.insert(property)?;
        info!(property_id = %stored.id, "property registered");
        Ok(stored)
    }

    pub fn get(&self, id: &PropertyId) -> Result<Property, PropertyServiceError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| PropertyServiceError::NotFound(id.clone()))
    }

    pub fn list(&self, limit: usize) -> Result<Vec<Property>, PropertyServiceError> {
        Ok(self.repository.list(limit)?)
    }

    pub fn dashboard(&self, id: &PropertyId) -> Result<DashboardView, PropertyServiceError> {
        let property = self.get(id)?;
        Ok(DashboardStatus::from_json(&property.dashboard_status)?.view())
    }

    /// Stores the property-data webhook body verbatim, replacing any earlier one.
    pub fn ingest_property_data(
        &self,
        id: &PropertyId,
        payload: Value,
    ) -> Result<Property, PropertyServiceError> {
        let property = self.modify(id, |property| {
            property.property_data = Some(payload);
            property.updated_at = Utc::now();
            Ok(property.clone())
        })?;
        info!(property_id = %id, "property data stored");
        Ok(property)
    }

    /// Appends the raw status-update body to the property's log and, when it
    /// carries a recognizable transition, applies it to the dashboard status.
    /// Rejected transitions are reported in the outcome; the raw payload is
    /// kept either way.
    pub fn ingest_status_update(
        &self,
        id: &PropertyId,
        payload: Value,
    ) -> Result<StatusIngestOutcome, PropertyServiceError> {
        let update = serde_json::from_value::<StatusUpdate>(payload.clone()).ok();

        self.modify(id, |property| {
            let now = Utc::now();
            let mut dashboard = DashboardStatus::from_json(&property.dashboard_status)?;

            let (applied, rejection) = match update {
                Some(update) => match dashboard.apply(&update, now) {
                    Ok(()) => (true, None),
                    Err(err) => {
                        warn!(property_id = %id, error = %err, "status update rejected");
                        (false, Some(err.to_string()))
                    }
                },
                None => (false, None),
            };

            property.status_updates.push(ReceivedPayload {
                received_at: now,
                payload,
            });
            if applied {
                property.dashboard_status = dashboard.to_json();
            }
            property.updated_at = now;

            Ok(StatusIngestOutcome {
                property_id: id.clone(),
                stored: true,
                applied,
                rejection,
                dashboard: dashboard.view(),
            })
        })
    }

    fn modify<T, F>(&self, id: &PropertyId, apply: F) -> Result<T, PropertyServiceError>
    where
        F: FnOnce(&mut Property) -> Result<T, PropertyServiceError>,
    {
        self.repository
            .modify(id, apply)
            .map_err(|err| match err {
                PropertyServiceError::Repository(RepositoryError::NotFound) => {
                    PropertyServiceError::NotFound(id.clone())
                }
                other => other,
            })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PropertyServiceError {
    #[error("property '{0}' not found")]
    NotFound(PropertyId),
    #[error("address field '{0}' is required")]
    InvalidAddress(&'static str),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Dashboard(#[from] DashboardError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
