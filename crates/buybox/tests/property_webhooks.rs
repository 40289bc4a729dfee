//! Property registration, the seller dashboard, and the third-party webhooks
//! that feed them, exercised through the HTTP routers.

mod common {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::response::Response;
    use axum::Router;
    use serde_json::Value;

    use buybox::access::AccessGuard;
    use buybox::config::EmailPolicyConfig;
    use buybox::property::{property_router, webhook_router, PropertyService};
    use buybox::store::memory::{InMemoryBanRepository, InMemoryPropertyRepository};

    pub(super) const SECRET: &str = "hook-secret";

    pub(super) fn app() -> Router {
        let config = EmailPolicyConfig {
            allow_domains: Default::default(),
            deny_domains: ["tempmail.dev".to_string()].into_iter().collect(),
        };
        let access = Arc::new(AccessGuard::new(
            &config,
            Arc::new(InMemoryBanRepository::default()),
        ));
        let service = Arc::new(PropertyService::new(
            Arc::new(InMemoryPropertyRepository::default()),
            access,
        ));
        property_router(service.clone()).merge(webhook_router(service, Some(SECRET.to_string())))
    }

    pub(super) fn post_json(uri: &str, secret: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(secret) = secret {
            builder = builder.header("x-webhook-secret", secret);
        }
        builder
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    pub(super) fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).expect("request builds")
    }

    pub(super) async fn read_json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body collected");
        serde_json::from_slice(&bytes).expect("valid json")
    }
}

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use common::*;

async fn register(app: &axum::Router) -> String {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/property",
            None,
            json!({
                "seller_email": "Seller@Example.com",
                "address": {
                    "line1": " 14 Harbour Row ",
                    "city": "Bristol",
                    "postcode": "bs1 5dd"
                }
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let property = read_json_body(response).await;
    assert_eq!(property["seller_email"], "seller@example.com");
    assert_eq!(property["address"]["postcode"], "BS1 5DD");
    property["id"].as_str().expect("id").to_string()
}

#[tokio::test]
async fn registration_starts_the_dashboard_at_offer_accepted() {
    let app = app();
    let id = register(&app).await;

    let response = app
        .oneshot(get(&format!("/api/property/{id}/dashboard")))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard = read_json_body(response).await;
    assert_eq!(dashboard["current_stage"], "OFFER_ACCEPTED");
    assert_eq!(dashboard["percent_complete"], 0);
    assert_eq!(dashboard["stages"].as_array().map(Vec::len), Some(7));
}

#[tokio::test]
async fn denied_seller_domains_are_forbidden() {
    let response = app()
        .oneshot(post_json(
            "/api/property",
            None,
            json!({
                "seller_email": "someone@tempmail.dev",
                "address": { "line1": "1 Main St", "city": "Leeds", "postcode": "LS1 1AA" }
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(read_json_body(response).await["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn property_data_is_stored_verbatim() {
    let app = app();
    let id = register(&app).await;
    let payload = json!({
        "epc_rating": "C",
        "bedrooms": 3,
        "valuation": { "provider": "acme-avm", "amount": 325000, "confidence": 0.82 },
        "unexpected": [null, true, "kept as-is"]
    });

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/webhooks/property-data",
            Some(SECRET),
            json!({ "property_id": id, "payload": payload.clone() }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = app
        .oneshot(get(&format!("/api/property/{id}")))
        .await
        .expect("route executes");
    let property = read_json_body(response).await;
    assert_eq!(property["property_data"], payload);
}

#[tokio::test]
async fn webhooks_require_the_shared_secret() {
    let app = app();
    let id = register(&app).await;

    let missing = app
        .clone()
        .oneshot(post_json(
            "/api/webhooks/status-update",
            None,
            json!({ "property_id": id, "payload": {} }),
        ))
        .await
        .expect("route executes");
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = app
        .oneshot(post_json(
            "/api/webhooks/status-update",
            Some("guess"),
            json!({ "property_id": id, "payload": {} }),
        ))
        .await
        .expect("route executes");
    assert_eq!(wrong.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn status_updates_move_the_dashboard_forward_only() {
    let app = app();
    let id = register(&app).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/webhooks/status-update",
            Some(SECRET),
            json!({
                "property_id": id,
                "payload": { "stage": "OFFER_ACCEPTED", "state": "COMPLETED", "note": "Memorandum issued" }
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let outcome = read_json_body(response).await;
    assert_eq!(outcome["applied"], true);
    assert_eq!(outcome["dashboard"]["current_stage"], "VALUATION");

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/webhooks/status-update",
            Some(SECRET),
            json!({
                "property_id": id,
                "payload": { "stage": "OFFER_ACCEPTED", "state": "IN_PROGRESS" }
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let outcome = read_json_body(response).await;
    assert_eq!(outcome["applied"], false);
    assert!(outcome["rejection"].as_str().is_some());
    assert_eq!(outcome["dashboard"]["current_stage"], "VALUATION");

    let response = app
        .oneshot(get(&format!("/api/property/{id}")))
        .await
        .expect("route executes");
    let property = read_json_body(response).await;
    let log = property["status_updates"].as_array().expect("update log");
    assert_eq!(log.len(), 2);
    assert_eq!(log[1]["payload"]["state"], "IN_PROGRESS");
    assert_eq!(
        property["dashboard_status"]["stages"][0]["state"],
        "COMPLETED"
    );
}

#[tokio::test]
async fn webhooks_for_unknown_properties_are_not_found() {
    let response = app()
        .oneshot(post_json(
            "/api/webhooks/property-data",
            Some(SECRET),
            json!({ "property_id": "prop-missing", "payload": { "a": 1 } }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn overlapping_deliveries_keep_every_payload() {
    use std::sync::Arc;

    use buybox::access::AccessGuard;
    use buybox::config::EmailPolicyConfig;
    use buybox::property::{PropertyAddress, PropertyService, RegisterProperty};
    use buybox::store::memory::{InMemoryBanRepository, InMemoryPropertyRepository};

    const WORKERS: usize = 8;
    const DELIVERIES: usize = 50;

    let access = Arc::new(AccessGuard::new(
        &EmailPolicyConfig::default(),
        Arc::new(InMemoryBanRepository::default()),
    ));
    let service = PropertyService::new(Arc::new(InMemoryPropertyRepository::default()), access);
    let property = service
        .register(RegisterProperty {
            seller_email: "seller@example.com".to_string(),
            address: PropertyAddress {
                line1: "9 Dock Rd".to_string(),
                line2: None,
                city: "Hull".to_string(),
                postcode: "HU1 1AA".to_string(),
            },
        })
        .expect("registered");

    std::thread::scope(|scope| {
        for worker in 0..WORKERS {
            let service = &service;
            let id = &property.id;
            scope.spawn(move || {
                for delivery in 0..DELIVERIES {
                    if delivery % 10 == 0 {
                        service
                            .ingest_property_data(id, json!({ "worker": worker }))
                            .expect("property data stored");
                    }
                    service
                        .ingest_status_update(
                            id,
                            json!({ "worker": worker, "delivery": delivery }),
                        )
                        .expect("status update stored");
                }
            });
        }
    });

    let stored = service.get(&property.id).expect("property");
    assert_eq!(stored.status_updates.len(), WORKERS * DELIVERIES);
    assert!(stored.property_data.is_some());
}

#[tokio::test]
async fn webhook_secret_is_checked_before_the_body_is_parsed() {
    use axum::body::Body;
    use axum::http::{header, Request};

    let raw = |secret: Option<&str>| {
        let mut builder = Request::post("/api/webhooks/status-update")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(secret) = secret {
            builder = builder.header("x-webhook-secret", secret);
        }
        builder
            .body(Body::from("{not json"))
            .expect("request builds")
    };

    let app = app();
    let missing = app.clone().oneshot(raw(None)).await.expect("route executes");
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = app
        .clone()
        .oneshot(raw(Some("guess")))
        .await
        .expect("route executes");
    assert_eq!(wrong.status(), StatusCode::FORBIDDEN);

    let malformed = app.oneshot(raw(Some(SECRET))).await.expect("route executes");
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_json_body(malformed).await["error"]["code"],
        "BAD_REQUEST"
    );
}
