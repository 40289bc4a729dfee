use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::cache::{CacheStatus, CachedDigest, DigestCache};
use super::crawler::SiteCrawler;
use super::digest::render_digest;
use super::fetch::PageFetcher;
use super::CrawlError;
use crate::config::CrawlConfig;

#[derive(Debug, Clone)]
pub struct DigestResponse {
    pub body: Arc<str>,
    pub version: String,
    pub built_at: DateTime<Utc>,
    pub cache: CacheStatus,
}

/// Serves the site digest from cache, crawling the site when the cached copy
/// is missing, stale, or built for another version.
pub struct DigestService<F: ?Sized> {
    crawler: SiteCrawler<F>,
    cache: DigestCache,
    version: String,
}

impl<F> DigestService<F>
where
    F: PageFetcher + ?Sized + 'static,
{
    pub fn new(crawler: SiteCrawler<F>, config: &CrawlConfig) -> Self {
        Self {
            crawler,
            cache: DigestCache::new(config.cache_ttl),
            version: config.version.clone(),
        }
    }

    pub async fn digest(&self) -> Result<DigestResponse, CrawlError> {
        self.digest_at(Utc::now()).await
    }

    pub async fn digest_at(&self, now: DateTime<Utc>) -> Result<DigestResponse, CrawlError> {
        let (entry, cache) = self
            .cache
            .get_or_build(&self.version, now, || self.build())
            .await?;
        Ok(DigestResponse {
            body: entry.body,
            version: entry.version,
            built_at: entry.built_at,
            cache,
        })
    }

    /// Crawls the site and renders a fresh digest without touching the cache.
    pub async fn build(&self) -> Result<CachedDigest, CrawlError> {
        let pages = self.crawler.crawl().await?;
        let built_at = Utc::now();
        let body = render_digest(self.crawler.base_url(), &self.version, built_at, &pages);
        info!(
            version = %self.version,
            pages = pages.len(),
            bytes = body.len(),
            "site digest built"
        );
        Ok(CachedDigest {
            version: self.version.clone(),
            built_at,
            body: Arc::from(body),
        })
    }

    pub async fn invalidate(&self) {
        self.cache.invalidate().await;
        info!(version = %self.version, "site digest cache cleared");
    }
}
