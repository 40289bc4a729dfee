use std::collections::BTreeSet;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use url::Url;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub crawl: CrawlConfig,
    pub email: EmailPolicyConfig,
    pub features: FeatureFlags,
    pub security: SecurityConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let base_url = env::var("SITE_BASE_URL").unwrap_or_else(|_| format!("http://{host}:{port}"));
        let base_url = Url::parse(&base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            value: base_url.clone(),
            source,
        })?;

        let crawl = CrawlConfig {
            base_url,
            version: env::var("CRAWL_VERSION").unwrap_or_else(|_| "1".to_string()),
            cache_ttl: Duration::from_secs(parse_number("CRAWL_CACHE_TTL_SECS", 3600)?),
            max_pages: parse_bounded("CRAWL_MAX_PAGES", 50)?,
            max_retries: parse_bounded("CRAWL_MAX_RETRIES", 3)?,
            exclude_paths: split_list(&env::var("CRAWL_EXCLUDE_PATHS").unwrap_or_else(|_| {
                "/api,/admin,/dashboard,/onboarding".to_string()
            })),
        };

        let email = EmailPolicyConfig {
            allow_domains: split_list(&env::var("EMAIL_ALLOW_DOMAINS").unwrap_or_default())
                .into_iter()
                .map(|domain| domain.to_ascii_lowercase())
                .collect(),
            deny_domains: split_list(&env::var("EMAIL_DENY_DOMAINS").unwrap_or_default())
                .into_iter()
                .map(|domain| domain.to_ascii_lowercase())
                .collect(),
        };

        let features = match env::var("FEATURE_FLAGS") {
            Ok(raw) => FeatureFlags::parse(&raw)?,
            Err(_) => FeatureFlags::default(),
        };

        let security = SecurityConfig {
            webhook_secret: env::var("WEBHOOK_SECRET").ok().filter(|v| !v.is_empty()),
            admin_token: env::var("ADMIN_API_TOKEN").ok().filter(|v| !v.is_empty()),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            crawl,
            email,
            features,
            security,
        })
    }
}

fn parse_number(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Like [`parse_number`], rejecting values that do not fit the target type.
fn parse_bounded<T: TryFrom<u64>>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .ok()
            .and_then(|value| T::try_from(value).ok())
            .ok_or(ConfigError::InvalidNumber { key, value: raw }),
        Err(_) => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Crawl rules for the `/api/llms` site digest.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub base_url: Url,
    pub version: String,
    pub cache_ttl: Duration,
    pub max_pages: usize,
    pub max_retries: u32,
    pub exclude_paths: Vec<String>,
}

/// E-mail allow and deny lists applied to public sign-up forms.
#[derive(Debug, Clone, Default)]
pub struct EmailPolicyConfig {
    pub allow_domains: BTreeSet<String>,
    pub deny_domains: BTreeSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SecurityConfig {
    pub webhook_secret: Option<String>,
    pub admin_token: Option<String>,
}

/// Feature switches gating optional route groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    pub llms_digest: bool,
    pub waitlist: bool,
    pub newsletter: bool,
    pub leads: bool,
    pub webhooks: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            llms_digest: true,
            waitlist: true,
            newsletter: true,
            leads: true,
            webhooks: true,
        }
    }
}

impl FeatureFlags {
    /// Parses a comma separated list such as `waitlist,-leads`. Names prefixed
    /// with `-` switch a feature off; bare names switch it on.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut flags = Self::default();
        for item in split_list(raw) {
            let (enabled, name) = match item.strip_prefix('-') {
                Some(name) => (false, name),
                None => (true, item.strip_prefix('+').unwrap_or(item.as_str())),
            };
            let slot = match name.to_ascii_lowercase().as_str() {
                "llms_digest" | "llms" => &mut flags.llms_digest,
                "waitlist" => &mut flags.waitlist,
                "newsletter" => &mut flags.newsletter,
                "leads" => &mut flags.leads,
                "webhooks" => &mut flags.webhooks,
                _ => {
                    return Err(ConfigError::UnknownFeature {
                        name: name.to_string(),
                    })
                }
            };
            *slot = enabled;
        }
        Ok(flags)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidNumber {
        key: &'static str,
        value: String,
    },
    InvalidBaseUrl {
        value: String,
        source: url::ParseError,
    },
    UnknownFeature {
        name: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a non-negative integer, got '{value}'")
            }
            ConfigError::InvalidBaseUrl { value, .. } => {
                write!(f, "SITE_BASE_URL '{value}' is not an absolute URL")
            }
            ConfigError::UnknownFeature { name } => {
                write!(f, "FEATURE_FLAGS contains unknown feature '{name}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidBaseUrl { source, .. } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::UnknownFeature { .. } => None,
        }
    }
}
