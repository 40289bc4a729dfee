use std::sync::Arc;

use axum::{extract::State, routing::get, Router};

use super::fetch::PageFetcher;
use super::service::DigestService;
use crate::error::AppError;

pub const CACHE_HEADER: &str = "x-cache";
pub const DIGEST_VERSION_HEADER: &str = "x-digest-version";

/// Router builder exposing `GET /api/llms`.
pub fn llms_router<F>(service: Arc<DigestService<F>>) -> Router
where
    F: PageFetcher + ?Sized + 'static,
{
    Router::new()
        .route("/api/llms", get(llms_handler::<F>))
        .with_state(service)
}

pub(crate) async fn llms_handler<F>(
    State(service): State<Arc<DigestService<F>>>,
) -> Result<([(&'static str, String); 3], String), AppError>
where
    F: PageFetcher + ?Sized + 'static,
{
    let digest = service.digest().await?;
    Ok((
        [
            ("content-type", "text/plain; charset=utf-8".to_string()),
            (CACHE_HEADER, digest.cache.as_str().to_string()),
            (DIGEST_VERSION_HEADER, digest.version),
        ],
        digest.body.to_string(),
    ))
}
