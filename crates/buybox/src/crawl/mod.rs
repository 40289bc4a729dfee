//! `/api/llms`: a plain-text digest of the public site, crawled from the
//! configured base URL and cached in memory.

pub mod cache;
pub mod crawler;
pub mod digest;
pub mod extract;
pub mod fetch;
pub mod links;
pub mod router;
pub mod service;

pub use cache::{CacheStatus, CachedDigest, DigestCache};
pub use crawler::SiteCrawler;
pub use digest::render_digest;
pub use extract::{extract_page, PageContent, TextBlock};
pub use fetch::{
    fetch_with_retry, FetchError, FetchedPage, HttpFetcher, PageFetcher, RetryPolicy,
};
pub use router::{llms_router, CACHE_HEADER, DIGEST_VERSION_HEADER};
pub use service::{DigestResponse, DigestService};

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("http client could not be created: {0}")]
    Client(String),
    #[error("entry page {url} could not be fetched")]
    EntryPage {
        url: String,
        #[source]
        source: FetchError,
    },
}
