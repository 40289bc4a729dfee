//! Buyer onboarding: nine data-collection steps walked strictly forward,
//! followed by an explicit completion once every step is stored.

pub mod domain;
pub mod export;
pub mod repository;
pub mod router;
pub mod service;
pub mod steps;

#[cfg(test)]
mod tests;

pub use domain::{
    BuyerOnboarding, OnboardingId, OnboardingProgressView, OnboardingStep, OnboardingView,
    StepPayload, StepRecord, StepSaveOutcome, UserId,
};
pub use export::write_progress_csv;
pub use repository::OnboardingRepository;
pub use router::onboarding_router;
pub use service::{BuyerOnboardingService, OnboardingServiceError};
pub use steps::StepValidationError;
