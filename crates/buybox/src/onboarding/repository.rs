use chrono::{DateTime, Utc};

use super::domain::{BuyerOnboarding, OnboardingId, OnboardingStep, StepRecord, UserId};
use crate::store::RepositoryError;

/// Storage abstraction so the service module can be exercised in isolation.
pub trait OnboardingRepository: Send + Sync {
    /// Inserts a new onboarding; `Conflict` when the user already has one.
    fn insert(&self, onboarding: BuyerOnboarding) -> Result<BuyerOnboarding, RepositoryError>;
    fn fetch(&self, id: &OnboardingId) -> Result<Option<BuyerOnboarding>, RepositoryError>;
    fn fetch_by_user(&self, user_id: &UserId) -> Result<Option<BuyerOnboarding>, RepositoryError>;
    fn list(&self, limit: usize) -> Result<Vec<BuyerOnboarding>, RepositoryError>;
    fn steps(&self, id: &OnboardingId) -> Result<Vec<StepRecord>, RepositoryError>;

    /// Upserts `record` on `(onboarding_id, step)` and, when `advance_to` is
    /// set and the stored `current_step` still equals `record.step`, moves the
    /// onboarding to `advance_to`. Both writes land together or not at all.
    /// `Conflict` once the onboarding is completed.
    fn record_step(
        &self,
        record: StepRecord,
        advance_to: Option<OnboardingStep>,
    ) -> Result<BuyerOnboarding, RepositoryError>;

    fn mark_completed(
        &self,
        id: &OnboardingId,
        at: DateTime<Utc>,
    ) -> Result<BuyerOnboarding, RepositoryError>;
}
