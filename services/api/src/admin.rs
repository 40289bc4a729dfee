use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use buybox::access::{verify_bearer, AccessError, Ban};
use buybox::error::AppError;
use buybox::onboarding::{write_progress_csv, OnboardingView};
use buybox::property::Property;
use buybox::signups::Lead;
use buybox::store::RepositoryError;

use crate::infra::Services;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1_000;

#[derive(Clone)]
pub(crate) struct AdminState {
    services: Services,
    token: Option<Arc<str>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    limit: Option<usize>,
}

impl ListQuery {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BanRequest {
    email: String,
    #[serde(default)]
    reason: Option<String>,
}

/// Back-office routes, all behind the admin bearer token.
pub(crate) fn admin_router(services: Services, token: Option<String>) -> Router {
    let state = AdminState {
        services,
        token: token.map(Arc::from),
    };
    Router::new()
        .route("/api/admin/bans", get(list_bans).post(create_ban))
        .route("/api/admin/bans/:email", delete(remove_ban))
        .route("/api/admin/onboardings", get(list_onboardings))
        .route("/api/admin/onboardings.csv", get(export_onboardings))
        .route("/api/admin/properties", get(list_properties))
        .route("/api/admin/leads", get(list_leads))
        .route("/api/admin/llms/refresh", post(refresh_digest))
        .with_state(state)
}

fn authorize(state: &AdminState, headers: &HeaderMap) -> Result<(), AppError> {
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    verify_bearer(state.token.as_deref(), provided)?;
    Ok(())
}

async fn list_bans(
    State(state): State<AdminState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Ban>>, AppError> {
    authorize(&state, &headers)?;
    Ok(Json(state.services.access.bans()?))
}

async fn create_ban(
    State(state): State<AdminState>,
    headers: HeaderMap,
    Json(request): Json<BanRequest>,
) -> Result<(StatusCode, Json<Ban>), AppError> {
    authorize(&state, &headers)?;
    let reason = request.reason.unwrap_or_default();
    let ban = state.services.access.ban(&request.email, reason.trim())?;
    info!(email = %ban.email, "address banned");
    Ok((StatusCode::CREATED, Json(ban)))
}

async fn remove_ban(
    State(state): State<AdminState>,
    headers: HeaderMap,
    Path(email): Path<String>,
) -> Result<StatusCode, AppError> {
    authorize(&state, &headers)?;
    if state.services.access.unban(&email)? {
        info!(%email, "ban lifted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AccessError::Repository(RepositoryError::NotFound).into())
    }
}

async fn list_onboardings(
    State(state): State<AdminState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<OnboardingView>>, AppError> {
    authorize(&state, &headers)?;
    Ok(Json(state.services.onboarding.list(query.limit())?))
}

async fn export_onboardings(
    State(state): State<AdminState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<([(header::HeaderName, &'static str); 2], Vec<u8>), AppError> {
    authorize(&state, &headers)?;
    let onboardings = state.services.onboarding.list(query.limit())?;
    let mut buffer = Vec::new();
    write_progress_csv(&onboardings, &mut buffer)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"onboardings.csv\"",
            ),
        ],
        buffer,
    ))
}

async fn list_properties(
    State(state): State<AdminState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Property>>, AppError> {
    authorize(&state, &headers)?;
    Ok(Json(state.services.properties.list(query.limit())?))
}

async fn list_leads(
    State(state): State<AdminState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Lead>>, AppError> {
    authorize(&state, &headers)?;
    Ok(Json(state.services.signups.leads(query.limit())?))
}

async fn refresh_digest(
    State(state): State<AdminState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Value>), AppError> {
    authorize(&state, &headers)?;
    state.services.digest.invalidate().await;
    info!("site digest cache invalidated");
    Ok((StatusCode::ACCEPTED, Json(json!({ "invalidated": true }))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::testing::{config, ADMIN_TOKEN};
    use axum::body::Body;
    use axum::http::Request;
    use axum::response::Response;
    use buybox::config::FeatureFlags;
    use buybox::onboarding::UserId;
    use tower::ServiceExt;

    fn app() -> (Router, Services) {
        let services = Services::in_memory(&config(FeatureFlags::default())).expect("services");
        (
            admin_router(services.clone(), Some(ADMIN_TOKEN.to_string())),
            services,
        )
    }

    fn authorized(builder: axum::http::request::Builder) -> axum::http::request::Builder {
        builder.header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body collected")
            .to_vec()
    }

    #[tokio::test]
    async fn admin_routes_require_the_bearer_token() {
        let (app, _) = app();
        let missing = app
            .clone()
            .oneshot(
                Request::get("/api/admin/bans")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let wrong = app
            .oneshot(
                Request::get("/api/admin/bans")
                    .header(header::AUTHORIZATION, "Bearer guess")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(wrong.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unconfigured_token_disables_admin_routes() {
        let services = Services::in_memory(&config(FeatureFlags::default())).expect("services");
        let response = admin_router(services, None)
            .oneshot(
                authorized(Request::get("/api/admin/leads"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn bans_can_be_created_listed_and_lifted() {
        let (app, services) = app();
        let response = app
            .clone()
            .oneshot(
                authorized(Request::post("/api/admin/bans"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "email": "Spam@Example.com", "reason": " abuse " }).to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(services.access.admit("spam@example.com").is_err());

        let response = app
            .clone()
            .oneshot(
                authorized(Request::get("/api/admin/bans"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        let bans: Value = serde_json::from_slice(&body_bytes(response).await).expect("json");
        assert_eq!(bans[0]["email"], "spam@example.com");
        assert_eq!(bans[0]["reason"], "abuse");

        let response = app
            .clone()
            .oneshot(
                authorized(Request::delete("/api/admin/bans/spam@example.com"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(services.access.admit("spam@example.com").is_ok());

        let response = app
            .oneshot(
                authorized(Request::delete("/api/admin/bans/spam@example.com"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn onboarding_export_is_served_as_csv() {
        let (app, services) = app();
        services
            .onboarding
            .start(UserId("buyer-9".to_string()))
            .expect("started");

        let response = app
            .oneshot(
                authorized(Request::get("/api/admin/onboardings.csv"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        let body = String::from_utf8(body_bytes(response).await).expect("utf-8");
        let mut lines = body.lines();
        assert!(lines
            .next()
            .expect("header row")
            .starts_with("onboarding_id,user_id,current_step"));
        let row = lines.next().expect("data row");
        assert!(row.contains("buyer-9"));
        assert!(row.contains("INITIAL_INQUIRY"));
    }

    #[test]
    fn list_limit_is_clamped() {
        assert_eq!(ListQuery::default().limit(), DEFAULT_LIMIT);
        assert_eq!(ListQuery { limit: Some(0) }.limit(), 1);
        assert_eq!(ListQuery { limit: Some(50_000) }.limit(), MAX_LIMIT);
    }
}
