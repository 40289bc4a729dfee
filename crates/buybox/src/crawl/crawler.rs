use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use super::extract::{extract_page, PageContent};
use super::fetch::{fetch_with_retry, PageFetcher, RetryPolicy};
use super::links;
use super::CrawlError;
use crate::config::CrawlConfig;

/// Breadth-first crawler restricted to the origin of `base_url`.
pub struct SiteCrawler<F: ?Sized> {
    fetcher: Arc<F>,
    base_url: Url,
    max_pages: usize,
    exclude_paths: Vec<String>,
    retry: RetryPolicy,
}

impl<F> SiteCrawler<F>
where
    F: PageFetcher + ?Sized,
{
    pub fn new(fetcher: Arc<F>, config: &CrawlConfig) -> Self {
        Self {
            fetcher,
            base_url: links::normalize(&config.base_url),
            max_pages: config.max_pages.max(1),
            exclude_paths: config.exclude_paths.clone(),
            retry: RetryPolicy::new(config.max_retries),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Visits at most `max_pages` pages. The entry page must load; failures
    /// on any other page are logged and skipped.
    pub async fn crawl(&self) -> Result<Vec<PageContent>, CrawlError> {
        let mut queue = VecDeque::from([self.base_url.clone()]);
        let mut seen: HashSet<Url> = HashSet::from([self.base_url.clone()]);
        let mut pages = Vec::new();

        while let Some(url) = queue.pop_front() {
            if pages.len() >= self.max_pages {
                break;
            }

            let page = match fetch_with_retry(self.fetcher.as_ref(), &url, &self.retry).await {
                Ok(page) => page,
                Err(source) if url == self.base_url => {
                    return Err(CrawlError::EntryPage {
                        url: url.to_string(),
                        source,
                    })
                }
                Err(err) => {
                    warn!(url = %url, error = %err, "skipping page");
                    continue;
                }
            };

            if !page.is_html() {
                debug!(url = %url, content_type = ?page.content_type, "skipping non-html page");
                continue;
            }

            let (content, outgoing) = extract_page(&page.url, &page.body);
            pages.push(content);

            for link in outgoing {
                let link = links::normalize(&link);
                if !links::same_origin(&link, &self.base_url)
                    || !links::looks_like_page(&link)
                    || links::is_excluded(&link, &self.exclude_paths)
                {
                    continue;
                }
                if seen.insert(link.clone()) {
                    queue.push_back(link);
                }
            }
        }

        info!(
            base_url = %self.base_url,
            pages = pages.len(),
            discovered = seen.len(),
            "site crawl finished"
        );
        Ok(pages)
    }
}
