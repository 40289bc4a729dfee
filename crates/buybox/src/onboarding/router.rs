use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{
    BuyerOnboarding, OnboardingId, OnboardingProgressView, OnboardingView, StepPayload,
    StepSaveOutcome, UserId,
};
use super::repository::OnboardingRepository;
use super::service::BuyerOnboardingService;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub(crate) struct StartOnboardingRequest {
    pub(crate) user_id: String,
}

/// Router builder exposing the `buyer.onboarding` endpoints.
pub fn onboarding_router<R>(service: Arc<BuyerOnboardingService<R>>) -> Router
where
    R: OnboardingRepository + 'static,
{
    Router::new()
        .route("/api/buyer/onboarding", post(start_handler::<R>))
        .route("/api/buyer/onboarding/:onboarding_id", get(get_handler::<R>))
        .route(
            "/api/buyer/onboarding/:onboarding_id/progress",
            get(progress_handler::<R>),
        )
        .route(
            "/api/buyer/onboarding/:onboarding_id/steps",
            post(save_step_handler::<R>),
        )
        .route(
            "/api/buyer/onboarding/:onboarding_id/complete",
            post(complete_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn start_handler<R>(
    State(service): State<Arc<BuyerOnboardingService<R>>>,
    Json(request): Json<StartOnboardingRequest>,
) -> Result<(StatusCode, Json<BuyerOnboarding>), AppError>
where
    R: OnboardingRepository + 'static,
{
    let (onboarding, created) = service.start(UserId(request.user_id.trim().to_string()))?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(onboarding)))
}

pub(crate) async fn get_handler<R>(
    State(service): State<Arc<BuyerOnboardingService<R>>>,
    Path(onboarding_id): Path<String>,
) -> Result<Json<OnboardingView>, AppError>
where
    R: OnboardingRepository + 'static,
{
    Ok(Json(service.get(&OnboardingId(onboarding_id))?))
}

pub(crate) async fn progress_handler<R>(
    State(service): State<Arc<BuyerOnboardingService<R>>>,
    Path(onboarding_id): Path<String>,
) -> Result<Json<OnboardingProgressView>, AppError>
where
    R: OnboardingRepository + 'static,
{
    Ok(Json(service.progress(&OnboardingId(onboarding_id))?))
}

pub(crate) async fn save_step_handler<R>(
    State(service): State<Arc<BuyerOnboardingService<R>>>,
    Path(onboarding_id): Path<String>,
    Json(payload): Json<StepPayload>,
) -> Result<Json<StepSaveOutcome>, AppError>
where
    R: OnboardingRepository + 'static,
{
    Ok(Json(
        service.save_step(&OnboardingId(onboarding_id), payload)?,
    ))
}

pub(crate) async fn complete_handler<R>(
    State(service): State<Arc<BuyerOnboardingService<R>>>,
    Path(onboarding_id): Path<String>,
) -> Result<Json<BuyerOnboarding>, AppError>
where
    R: OnboardingRepository + 'static,
{
    Ok(Json(service.complete(&OnboardingId(onboarding_id))?))
}
