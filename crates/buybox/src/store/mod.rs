//! Storage contracts shared by the domain services.
//!
//! Every domain declares its own repository trait next to its service; the
//! in-memory implementations used by the HTTP service and the tests live in
//! [`memory`].

pub mod memory;

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
