use crate::admin::admin_router;
use crate::infra::{AppState, Services};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;
use std::sync::atomic::Ordering;

use buybox::config::AppConfig;
use buybox::crawl::llms_router;
use buybox::onboarding::onboarding_router;
use buybox::property::{property_router, webhook_router};
use buybox::signups::signup_router;

/// Merges every domain router, mounting the optional groups the feature
/// flags leave switched on.
pub(crate) fn app_router(services: &Services, config: &AppConfig) -> Router {
    let features = config.features;
    let mut router = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .merge(onboarding_router(services.onboarding.clone()))
        .merge(property_router(services.properties.clone()))
        .merge(signup_router(services.signups.clone()))
        .merge(admin_router(
            services.clone(),
            config.security.admin_token.clone(),
        ));

    if features.webhooks {
        router = router.merge(webhook_router(
            services.properties.clone(),
            config.security.webhook_secret.clone(),
        ));
    }
    if features.llms_digest {
        router = router.merge(llms_router(services.digest.clone()));
    }
    router
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
