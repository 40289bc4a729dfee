use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::onboarding::domain::{
    BuyerOnboarding, OnboardingId, OnboardingStep, StepPayload, StepRecord, UserId,
};
use crate::onboarding::repository::OnboardingRepository;
use crate::onboarding::steps::{
    AccreditationStatus, BudgetRange, BuyBoxAllocation, ContactPreference, DueDiligenceLegal,
    InitialInquiry, InvestmentTimeline, InvestorProfile, LiquidityPreference, MonitoringReporting,
    NotificationChannel, PlatformTraining, QualificationKycAml, ReportFrequency, RiskTolerance,
    SecondaryMarket, TransactionExecution,
};
use crate::onboarding::BuyerOnboardingService;
use crate::store::memory::InMemoryOnboardingRepository;
use crate::store::RepositoryError;

/// A valid payload for every data step.
pub(super) fn payload(step: OnboardingStep) -> StepPayload {
    match step {
        OnboardingStep::InitialInquiry => StepPayload::InitialInquiry(InitialInquiry {
            investment_goals: vec!["Rental yield".to_string()],
            budget: BudgetRange {
                min: 250_000,
                max: 500_000,
            },
            timeline: InvestmentTimeline::WithinThreeMonths,
            contact_preference: ContactPreference::Email,
        }),
        OnboardingStep::QualificationKycAml => StepPayload::QualificationKycAml(QualificationKycAml {
            identity_verified: true,
            accreditation: AccreditationStatus::Sophisticated,
            source_of_funds: "Salary savings".to_string(),
            aml_cleared: true,
        }),
        OnboardingStep::DueDiligenceLegal => StepPayload::DueDiligenceLegal(DueDiligenceLegal {
            agreements_signed: true,
            risk_disclosure_acknowledged: true,
            legal_counsel: None,
        }),
        OnboardingStep::InvestorProfile => StepPayload::InvestorProfile(InvestorProfile {
            risk_tolerance: RiskTolerance::Balanced,
            horizon_years: 10,
            preferred_regions: vec!["North West".to_string()],
        }),
        OnboardingStep::PlatformTraining => StepPayload::PlatformTraining(PlatformTraining {
            modules_completed: vec!["marketplace-basics".to_string()],
            assessment_passed: true,
        }),
        OnboardingStep::BuyBoxAllocation => StepPayload::BuyBoxAllocation(BuyBoxAllocation {
            buy_box_id: "bb-manchester-01".to_string(),
            allocation_amount: 2_500_000,
        }),
        OnboardingStep::TransactionExecution => {
            StepPayload::TransactionExecution(TransactionExecution {
                transaction_reference: "TX-20250502-001".to_string(),
                funds_transferred: true,
                executed_at: None,
            })
        }
        OnboardingStep::MonitoringReporting => StepPayload::MonitoringReporting(MonitoringReporting {
            report_frequency: ReportFrequency::Quarterly,
            notification_channels: vec![NotificationChannel::Email],
        }),
        OnboardingStep::SecondaryMarket | OnboardingStep::Completed => {
            StepPayload::SecondaryMarket(SecondaryMarket {
                opted_in: true,
                liquidity_preference: LiquidityPreference::PartialExit,
            })
        }
    }
}

pub(super) fn build_service() -> (
    BuyerOnboardingService<InMemoryOnboardingRepository>,
    Arc<InMemoryOnboardingRepository>,
) {
    let repository = Arc::new(InMemoryOnboardingRepository::default());
    let service = BuyerOnboardingService::new(repository.clone());
    (service, repository)
}

/// Starts an onboarding and saves every data step in order.
pub(super) fn walk_all_steps(
    service: &BuyerOnboardingService<InMemoryOnboardingRepository>,
    user: &str,
) -> OnboardingId {
    let (onboarding, _) = service
        .start(UserId(user.to_string()))
        .expect("onboarding starts");
    for step in OnboardingStep::DATA_STEPS {
        service
            .save_step(&onboarding.id, payload(step))
            .expect("step saves");
    }
    onboarding.id
}

pub(super) struct UnavailableRepository;

impl OnboardingRepository for UnavailableRepository {
    fn insert(&self, _onboarding: BuyerOnboarding) -> Result<BuyerOnboarding, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &OnboardingId) -> Result<Option<BuyerOnboarding>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_by_user(&self, _user_id: &UserId) -> Result<Option<BuyerOnboarding>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _limit: usize) -> Result<Vec<BuyerOnboarding>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn steps(&self, _id: &OnboardingId) -> Result<Vec<StepRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn record_step(
        &self,
        _record: StepRecord,
        _advance_to: Option<OnboardingStep>,
    ) -> Result<BuyerOnboarding, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn mark_completed(
        &self,
        _id: &OnboardingId,
        _at: DateTime<Utc>,
    ) -> Result<BuyerOnboarding, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Completes the onboarding just before a step is recorded, as a concurrent
/// `complete` call landing between the service's read and its write would.
#[derive(Default)]
pub(super) struct CompletesBeforeRecord {
    pub(super) inner: InMemoryOnboardingRepository,
}

impl OnboardingRepository for CompletesBeforeRecord {
    fn insert(&self, onboarding: BuyerOnboarding) -> Result<BuyerOnboarding, RepositoryError> {
        self.inner.insert(onboarding)
    }

    fn fetch(&self, id: &OnboardingId) -> Result<Option<BuyerOnboarding>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn fetch_by_user(&self, user_id: &UserId) -> Result<Option<BuyerOnboarding>, RepositoryError> {
        self.inner.fetch_by_user(user_id)
    }

    fn list(&self, limit: usize) -> Result<Vec<BuyerOnboarding>, RepositoryError> {
        self.inner.list(limit)
    }

    fn steps(&self, id: &OnboardingId) -> Result<Vec<StepRecord>, RepositoryError> {
        self.inner.steps(id)
    }

    fn record_step(
        &self,
        record: StepRecord,
        advance_to: Option<OnboardingStep>,
    ) -> Result<BuyerOnboarding, RepositoryError> {
        self.inner.mark_completed(&record.onboarding_id, Utc::now())?;
        self.inner.record_step(record, advance_to)
    }

    fn mark_completed(
        &self,
        id: &OnboardingId,
        at: DateTime<Utc>,
    ) -> Result<BuyerOnboarding, RepositoryError> {
        self.inner.mark_completed(id, at)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("body collected");
    serde_json::from_slice(&bytes).expect("valid json")
}
