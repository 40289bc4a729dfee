use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::domain::{
    BuyerOnboarding, OnboardingId, OnboardingProgressView, OnboardingStep, OnboardingView,
    StepPayload, StepRecord, StepSaveOutcome, UserId,
};
use super::repository::OnboardingRepository;
use super::steps::StepValidationError;
use crate::store::RepositoryError;

/// Drives a buyer through the nine onboarding steps.
pub struct BuyerOnboardingService<R> {
    repository: Arc<R>,
}

impl<R> BuyerOnboardingService<R>
where
    R: OnboardingRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Returns the user's onboarding, creating one when none exists. The flag
    /// reports whether a new record was created.
    pub fn start(&self, user_id: UserId) -> Result<(BuyerOnboarding, bool), OnboardingServiceError> {
        if user_id.0.trim().is_empty() {
            return Err(OnboardingServiceError::MissingUser);
        }

        if let Some(existing) = self.repository.fetch_by_user(&user_id)? {
            return Ok((existing, false));
        }

        let onboarding = BuyerOnboarding::new(user_id.clone(), Utc::now());
        match self.repository.insert(onboarding) {
            Ok(stored) => {
                info!(onboarding_id = %stored.id.0, "buyer onboarding started");
                Ok((stored, true))
            }
            // Lost a race with a concurrent start for the same user.
            Err(RepositoryError::Conflict) => self
                .repository
                .fetch_by_user(&user_id)?
                .map(|existing| (existing, false))
                .ok_or_else(|| RepositoryError::Conflict.into()),
            Err(other) => Err(other.into()),
        }
    }

    pub fn get(&self, id: &OnboardingId) -> Result<OnboardingView, OnboardingServiceError> {
        let onboarding = self.load(id)?;
        let steps = self.ordered_steps(id)?;
        Ok(OnboardingView { onboarding, steps })
    }

    pub fn current_step(&self, id: &OnboardingId) -> Result<OnboardingStep, OnboardingServiceError> {
        Ok(self.load(id)?.current_step)
    }

    pub fn progress(
        &self,
        id: &OnboardingId,
    ) -> Result<OnboardingProgressView, OnboardingServiceError> {
        let onboarding = self.load(id)?;
        let steps = self.repository.steps(id)?;
        Ok(OnboardingProgressView::build(&onboarding, &steps))
    }

    pub fn list(&self, limit: usize) -> Result<Vec<OnboardingView>, OnboardingServiceError> {
        self.repository
            .list(limit)?
            .into_iter()
            .map(|onboarding| {
                let steps = self.ordered_steps(&onboarding.id)?;
                Ok(OnboardingView { onboarding, steps })
            })
            .collect()
    }

    /// Stores a step and advances `current_step` when the saved step is the
    /// current one. Earlier steps may be re-saved; later steps are rejected.
    pub fn save_step(
        &self,
        id: &OnboardingId,
        payload: StepPayload,
    ) -> Result<StepSaveOutcome, OnboardingServiceError> {
        payload.validate()?;

        let onboarding = self.load(id)?;
        let step = payload.step();

        if onboarding.is_completed() {
            return Err(OnboardingServiceError::AlreadyCompleted(id.clone()));
        }
        if step > onboarding.current_step {
            return Err(OnboardingServiceError::StepNotReached {
                requested: step,
                current: onboarding.current_step,
            });
        }

        let advance_to = if step == onboarding.current_step {
            step.next_data_step()
        } else {
            None
        };

        let record = StepRecord {
            onboarding_id: id.clone(),
            step,
            payload,
            completed: true,
            updated_at: Utc::now(),
        };

        let updated = match self.repository.record_step(record.clone(), advance_to) {
            Ok(updated) => updated,
            Err(RepositoryError::Conflict) => {
                return Err(OnboardingServiceError::AlreadyCompleted(id.clone()))
            }
            Err(err) => return Err(err.into()),
        };
        let advanced = updated.current_step != onboarding.current_step;

        if advanced {
            info!(
                onboarding_id = %id.0,
                from = step.code(),
                to = updated.current_step.code(),
                "onboarding step advanced"
            );
        } else {
            debug!(onboarding_id = %id.0, step = step.code(), "onboarding step re-saved");
        }

        Ok(StepSaveOutcome {
            onboarding: updated,
            step: record,
            advanced,
        })
    }

    /// Moves the onboarding to `Completed` once every data step is stored and
    /// flagged complete.
    pub fn complete(&self, id: &OnboardingId) -> Result<BuyerOnboarding, OnboardingServiceError> {
        let onboarding = self.load(id)?;
        if onboarding.is_completed() {
            return Ok(onboarding);
        }

        let steps = self.repository.steps(id)?;
        let missing: Vec<OnboardingStep> = OnboardingStep::DATA_STEPS
            .iter()
            .copied()
            .filter(|step| {
                !steps
                    .iter()
                    .any(|record| record.step == *step && record.completed)
            })
            .collect();

        if !missing.is_empty() {
            return Err(OnboardingServiceError::Incomplete { missing });
        }

        let completed = self.repository.mark_completed(id, Utc::now())?;
        info!(onboarding_id = %id.0, "buyer onboarding completed");
        Ok(completed)
    }

    fn load(&self, id: &OnboardingId) -> Result<BuyerOnboarding, OnboardingServiceError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| OnboardingServiceError::NotFound(id.clone()))
    }

    fn ordered_steps(&self, id: &OnboardingId) -> Result<Vec<StepRecord>, OnboardingServiceError> {
        let mut steps = self.repository.steps(id)?;
        steps.sort_by_key(|record| record.step);
        Ok(steps)
    }
}

/// Error raised by the onboarding service.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingServiceError {
    #[error("a user id is required to start onboarding")]
    MissingUser,
    #[error("onboarding '{0}' not found")]
    NotFound(OnboardingId),
    #[error("invalid step data: {0}")]
    Validation(#[from] StepValidationError),
    #[error("step {requested} is not reachable yet; current step is {current}")]
    StepNotReached {
        requested: OnboardingStep,
        current: OnboardingStep,
    },
    #[error("onboarding '{0}' is already completed")]
    AlreadyCompleted(OnboardingId),
    #[error("onboarding cannot be completed; incomplete steps: {}", format_steps(.missing))]
    Incomplete { missing: Vec<OnboardingStep> },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn format_steps(steps: &[OnboardingStep]) -> String {
    steps
        .iter()
        .map(|step| step.code())
        .collect::<Vec<_>>()
        .join(", ")
}
