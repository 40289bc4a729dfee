use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use super::domain::{
    Lead, LeadRequest, NewsletterRequest, NewsletterSubscription, WaitlistEntry, WaitlistRequest,
};
use super::repository::SignupRepository;
use super::service::SignupService;
use crate::access::BanRepository;
use crate::error::AppError;

/// Router builder for the public newsletter, waitlist and lead endpoints.
pub fn signup_router<R, B>(service: Arc<SignupService<R, B>>) -> Router
where
    R: SignupRepository + 'static,
    B: BanRepository + 'static,
{
    Router::new()
        .route("/api/newsletter/subscribe", post(subscribe_handler::<R, B>))
        .route(
            "/api/newsletter/unsubscribe",
            post(unsubscribe_handler::<R, B>),
        )
        .route("/api/waitlist", post(waitlist_handler::<R, B>))
        .route("/api/leads", post(lead_handler::<R, B>))
        .with_state(service)
}

pub(crate) async fn subscribe_handler<R, B>(
    State(service): State<Arc<SignupService<R, B>>>,
    Json(request): Json<NewsletterRequest>,
) -> Result<Json<NewsletterSubscription>, AppError>
where
    R: SignupRepository + 'static,
    B: BanRepository + 'static,
{
    Ok(Json(service.subscribe_newsletter(&request.email)?))
}

pub(crate) async fn unsubscribe_handler<R, B>(
    State(service): State<Arc<SignupService<R, B>>>,
    Json(request): Json<NewsletterRequest>,
) -> Result<Json<NewsletterSubscription>, AppError>
where
    R: SignupRepository + 'static,
    B: BanRepository + 'static,
{
    Ok(Json(service.unsubscribe_newsletter(&request.email)?))
}

pub(crate) async fn waitlist_handler<R, B>(
    State(service): State<Arc<SignupService<R, B>>>,
    Json(request): Json<WaitlistRequest>,
) -> Result<(StatusCode, Json<WaitlistEntry>), AppError>
where
    R: SignupRepository + 'static,
    B: BanRepository + 'static,
{
    let (entry, created) = service.join_waitlist(&request.email, request.name)?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(entry)))
}

pub(crate) async fn lead_handler<R, B>(
    State(service): State<Arc<SignupService<R, B>>>,
    Json(request): Json<LeadRequest>,
) -> Result<(StatusCode, Json<Lead>), AppError>
where
    R: SignupRepository + 'static,
    B: BanRepository + 'static,
{
    let lead = service.submit_lead(request)?;
    Ok((StatusCode::CREATED, Json(lead)))
}
