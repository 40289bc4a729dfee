pub mod access;
pub mod config;
pub mod crawl;
pub mod dashboard;
pub mod error;
pub mod onboarding;
pub mod property;
pub mod signups;
pub mod store;
pub mod telemetry;
