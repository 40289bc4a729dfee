use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::CrawlError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedDigest {
    pub version: String,
    pub built_at: DateTime<Utc>,
    pub body: Arc<str>,
}

/// Single-entry digest cache keyed by version and age.
///
/// The lock is held while a digest is rebuilt, so concurrent misses wait for
/// the first build and then see its result.
pub struct DigestCache {
    ttl: Duration,
    slot: Mutex<Option<CachedDigest>>,
}

impl DigestCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// An entry is fresh when it carries `version` and is younger than the TTL.
    /// Entries stamped after `now` count as fresh.
    pub fn is_fresh(&self, entry: &CachedDigest, version: &str, now: DateTime<Utc>) -> bool {
        if entry.version != version {
            return false;
        }
        match now.signed_duration_since(entry.built_at).to_std() {
            Ok(age) => age < self.ttl,
            Err(_) => true,
        }
    }

    pub async fn get_or_build<B, Fut>(
        &self,
        version: &str,
        now: DateTime<Utc>,
        build: B,
    ) -> Result<(CachedDigest, CacheStatus), CrawlError>
    where
        B: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedDigest, CrawlError>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(entry) = slot.as_ref() {
            if self.is_fresh(entry, version, now) {
                return Ok((entry.clone(), CacheStatus::Hit));
            }
        }

        // A failed build leaves the previous entry in place.
        let fresh = build().await?;
        *slot = Some(fresh.clone());
        Ok((fresh, CacheStatus::Miss))
    }

    pub async fn invalidate(&self) {
        self.slot.lock().await.take();
    }
}
