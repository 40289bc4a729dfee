//! Seller properties, their conveyancing dashboard, and the webhooks that
//! feed them third-party data.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{
    Property, PropertyAddress, PropertyId, ReceivedPayload, RegisterProperty,
    StatusIngestOutcome, WebhookEnvelope,
};
pub use router::{property_router, webhook_router, WEBHOOK_SECRET_HEADER};
pub use service::{PropertyRepository, PropertyService, PropertyServiceError};
