use crate::access::{AccessError, CredentialError};
use crate::config::ConfigError;
use crate::crawl::CrawlError;
use crate::dashboard::DashboardError;
use crate::onboarding::OnboardingServiceError;
use crate::property::PropertyServiceError;
use crate::signups::SignupError;
use crate::store::RepositoryError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// Error codes surfaced to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    InternalServerError,
}

impl ApiErrorCode {
    pub const fn status(self) -> StatusCode {
        match self {
            ApiErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ApiErrorCode::BadRequest => "BAD_REQUEST",
            ApiErrorCode::Unauthorized => "UNAUTHORIZED",
            ApiErrorCode::Forbidden => "FORBIDDEN",
            ApiErrorCode::NotFound => "NOT_FOUND",
            ApiErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Export(csv::Error),
    Credentials(CredentialError),
    Access(AccessError),
    Onboarding(OnboardingServiceError),
    Property(PropertyServiceError),
    Signup(SignupError),
    Crawl(CrawlError),
    BadRequest(String),
}

impl AppError {
    pub fn code(&self) -> ApiErrorCode {
        match self {
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Export(_)
            | AppError::Crawl(_) => ApiErrorCode::InternalServerError,
            AppError::BadRequest(_) => ApiErrorCode::BadRequest,
            AppError::Credentials(err) => match err {
                CredentialError::Missing => ApiErrorCode::Unauthorized,
                CredentialError::Rejected | CredentialError::NotConfigured => {
                    ApiErrorCode::Forbidden
                }
            },
            AppError::Access(err) => access_code(err),
            AppError::Onboarding(err) => match err {
                OnboardingServiceError::NotFound(_) => ApiErrorCode::NotFound,
                OnboardingServiceError::Repository(err) => repository_code(err),
                OnboardingServiceError::MissingUser
                | OnboardingServiceError::Validation(_)
                | OnboardingServiceError::StepNotReached { .. }
                | OnboardingServiceError::AlreadyCompleted(_)
                | OnboardingServiceError::Incomplete { .. } => ApiErrorCode::BadRequest,
            },
            AppError::Property(err) => match err {
                PropertyServiceError::NotFound(_) => ApiErrorCode::NotFound,
                PropertyServiceError::Access(err) => access_code(err),
                PropertyServiceError::Repository(err) => repository_code(err),
                PropertyServiceError::InvalidAddress(_) => ApiErrorCode::BadRequest,
                PropertyServiceError::Dashboard(err) => match err {
                    DashboardError::Regression { .. } | DashboardError::OutOfOrder { .. } => {
                        ApiErrorCode::BadRequest
                    }
                    DashboardError::Unreadable(_) | DashboardError::MalformedStages => {
                        ApiErrorCode::InternalServerError
                    }
                },
            },
            AppError::Signup(err) => match err {
                SignupError::Access(err) => access_code(err),
                SignupError::Repository(err) => repository_code(err),
                SignupError::Disabled(_) => ApiErrorCode::NotFound,
                SignupError::MissingField(_) => ApiErrorCode::BadRequest,
            },
        }
    }
}

fn access_code(err: &AccessError) -> ApiErrorCode {
    match err {
        AccessError::InvalidEmail(_) => ApiErrorCode::BadRequest,
        AccessError::DomainDenied { .. }
        | AccessError::DomainNotAllowed { .. }
        | AccessError::Banned => ApiErrorCode::Forbidden,
        AccessError::Repository(err) => repository_code(err),
    }
}

fn repository_code(err: &RepositoryError) -> ApiErrorCode {
    match err {
        RepositoryError::NotFound => ApiErrorCode::NotFound,
        RepositoryError::Conflict => ApiErrorCode::BadRequest,
        RepositoryError::Unavailable(_) => ApiErrorCode::InternalServerError,
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Export(err) => write!(f, "export error: {}", err),
            AppError::Credentials(err) => write!(f, "{}", err),
            AppError::Access(err) => write!(f, "{}", err),
            AppError::Onboarding(err) => write!(f, "{}", err),
            AppError::Property(err) => write!(f, "{}", err),
            AppError::Signup(err) => write!(f, "{}", err),
            AppError::Crawl(err) => write!(f, "site digest unavailable: {}", err),
            AppError::BadRequest(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Export(err) => Some(err),
            AppError::Credentials(err) => Some(err),
            AppError::Access(err) => Some(err),
            AppError::Onboarding(err) => Some(err),
            AppError::Property(err) => Some(err),
            AppError::Signup(err) => Some(err),
            AppError::Crawl(err) => Some(err),
            AppError::BadRequest(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let message = if code == ApiErrorCode::InternalServerError {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            tracing::debug!(code = code.as_str(), error = %self, "request rejected");
            self.to_string()
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));
        (code.status(), body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<csv::Error> for AppError {
    fn from(value: csv::Error) -> Self {
        Self::Export(value)
    }
}

impl From<CredentialError> for AppError {
    fn from(value: CredentialError) -> Self {
        Self::Credentials(value)
    }
}

impl From<AccessError> for AppError {
    fn from(value: AccessError) -> Self {
        Self::Access(value)
    }
}

impl From<OnboardingServiceError> for AppError {
    fn from(value: OnboardingServiceError) -> Self {
        Self::Onboarding(value)
    }
}

impl From<PropertyServiceError> for AppError {
    fn from(value: PropertyServiceError) -> Self {
        Self::Property(value)
    }
}

impl From<SignupError> for AppError {
    fn from(value: SignupError) -> Self {
        Self::Signup(value)
    }
}

impl From<CrawlError> for AppError {
    fn from(value: CrawlError) -> Self {
        Self::Crawl(value)
    }
}
