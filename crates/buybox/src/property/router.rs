use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};

use super::domain::{
    Property, PropertyId, RegisterProperty, StatusIngestOutcome, WebhookEnvelope,
};
use super::service::{PropertyRepository, PropertyService};
use crate::access::{verify_shared_secret, BanRepository};
use crate::dashboard::DashboardView;
use crate::error::AppError;

pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// Router builder exposing the `property` endpoints.
pub fn property_router<R, B>(service: Arc<PropertyService<R, B>>) -> Router
where
    R: PropertyRepository + 'static,
    B: BanRepository + 'static,
{
    Router::new()
        .route("/api/property", post(register_handler::<R, B>))
        .route("/api/property/:property_id", get(get_handler::<R, B>))
        .route(
            "/api/property/:property_id/dashboard",
            get(dashboard_handler::<R, B>),
        )
        .with_state(service)
}

pub(crate) struct WebhookState<R, B> {
    service: Arc<PropertyService<R, B>>,
    secret: Option<Arc<str>>,
}

impl<R, B> Clone for WebhookState<R, B> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            secret: self.secret.clone(),
        }
    }
}

/// Router builder for third-party webhooks, authenticated by a shared secret.
pub fn webhook_router<R, B>(service: Arc<PropertyService<R, B>>, secret: Option<String>) -> Router
where
    R: PropertyRepository + 'static,
    B: BanRepository + 'static,
{
    let state = WebhookState {
        service,
        secret: secret.map(Arc::from),
    };

    Router::new()
        .route(
            "/api/webhooks/property-data",
            post(property_data_handler::<R, B>),
        )
        .route(
            "/api/webhooks/status-update",
            post(status_update_handler::<R, B>),
        )
        .with_state(state)
}

pub(crate) async fn register_handler<R, B>(
    State(service): State<Arc<PropertyService<R, B>>>,
    Json(request): Json<RegisterProperty>,
) -> Result<(StatusCode, Json<Property>), AppError>
where
    R: PropertyRepository + 'static,
    B: BanRepository + 'static,
{
    let property = service.register(request)?;
    Ok((StatusCode::CREATED, Json(property)))
}

pub(crate) async fn get_handler<R, B>(
    State(service): State<Arc<PropertyService<R, B>>>,
    Path(property_id): Path<String>,
) -> Result<Json<Property>, AppError>
where
    R: PropertyRepository + 'static,
    B: BanRepository + 'static,
{
    Ok(Json(service.get(&PropertyId(property_id))?))
}

pub(crate) async fn dashboard_handler<R, B>(
    State(service): State<Arc<PropertyService<R, B>>>,
    Path(property_id): Path<String>,
) -> Result<Json<DashboardView>, AppError>
where
    R: PropertyRepository + 'static,
    B: BanRepository + 'static,
{
    Ok(Json(service.dashboard(&PropertyId(property_id))?))
}

fn authorize(secret: Option<&str>, headers: &HeaderMap) -> Result<(), AppError> {
    let provided = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    verify_shared_secret(secret, provided)?;
    Ok(())
}

/// Webhook bodies are read as raw bytes so the secret is checked before the
/// envelope is parsed.
fn parse_envelope(body: &[u8]) -> Result<WebhookEnvelope, AppError> {
    serde_json::from_slice(body)
        .map_err(|err| AppError::BadRequest(format!("invalid webhook body: {err}")))
}

pub(crate) async fn property_data_handler<R, B>(
    State(state): State<WebhookState<R, B>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError>
where
    R: PropertyRepository + 'static,
    B: BanRepository + 'static,
{
    authorize(state.secret.as_deref(), &headers)?;
    let envelope = parse_envelope(&body)?;
    let id = PropertyId(envelope.property_id);
    let property = state.service.ingest_property_data(&id, envelope.payload)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "property_id": property.id,
            "stored": true,
        })),
    ))
}

pub(crate) async fn status_update_handler<R, B>(
    State(state): State<WebhookState<R, B>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<StatusIngestOutcome>), AppError>
where
    R: PropertyRepository + 'static,
    B: BanRepository + 'static,
{
    authorize(state.secret.as_deref(), &headers)?;
    let envelope = parse_envelope(&body)?;
    let id = PropertyId(envelope.property_id);
    let outcome = state.service.ingest_status_update(&id, envelope.payload)?;
    Ok((StatusCode::ACCEPTED, Json(outcome)))
}
