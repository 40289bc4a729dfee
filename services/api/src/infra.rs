use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use buybox::access::AccessGuard;
use buybox::config::AppConfig;
use buybox::crawl::{CrawlError, DigestService, HttpFetcher, SiteCrawler};
use buybox::onboarding::BuyerOnboardingService;
use buybox::property::PropertyService;
use buybox::signups::SignupService;
use buybox::store::memory::{
    InMemoryBanRepository, InMemoryOnboardingRepository, InMemoryPropertyRepository,
    InMemorySignupRepository,
};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) type Access = AccessGuard<InMemoryBanRepository>;
pub(crate) type Onboarding = BuyerOnboardingService<InMemoryOnboardingRepository>;
pub(crate) type Properties = PropertyService<InMemoryPropertyRepository, InMemoryBanRepository>;
pub(crate) type Signups = SignupService<InMemorySignupRepository, InMemoryBanRepository>;
pub(crate) type Digest = DigestService<HttpFetcher>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Domain services shared by the HTTP routers.
#[derive(Clone)]
pub(crate) struct Services {
    pub(crate) access: Arc<Access>,
    pub(crate) onboarding: Arc<Onboarding>,
    pub(crate) properties: Arc<Properties>,
    pub(crate) signups: Arc<Signups>,
    pub(crate) digest: Arc<Digest>,
}

impl Services {
    /// Wires every service against the in-memory stores.
    pub(crate) fn in_memory(config: &AppConfig) -> Result<Self, CrawlError> {
        let bans = Arc::new(InMemoryBanRepository::default());
        let access = Arc::new(AccessGuard::new(&config.email, bans));

        let onboarding = Arc::new(BuyerOnboardingService::new(Arc::new(
            InMemoryOnboardingRepository::default(),
        )));
        let properties = Arc::new(PropertyService::new(
            Arc::new(InMemoryPropertyRepository::default()),
            access.clone(),
        ));
        let signups = Arc::new(SignupService::new(
            Arc::new(InMemorySignupRepository::default()),
            access.clone(),
            config.features,
        ));

        Ok(Self {
            access,
            onboarding,
            properties,
            signups,
            digest: Arc::new(digest_service(config)?),
        })
    }
}

pub(crate) fn digest_service(config: &AppConfig) -> Result<Digest, CrawlError> {
    let fetcher =
        HttpFetcher::new(FETCH_TIMEOUT).map_err(|err| CrawlError::Client(err.to_string()))?;
    let crawler = SiteCrawler::new(Arc::new(fetcher), &config.crawl);
    Ok(DigestService::new(crawler, &config.crawl))
}
