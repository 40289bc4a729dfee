use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::steps::{
    BuyBoxAllocation, DueDiligenceLegal, InitialInquiry, InvestorProfile, MonitoringReporting,
    PlatformTraining, QualificationKycAml, SecondaryMarket, StepValidationError,
    TransactionExecution,
};

/// Identifier wrapper for buyer onboarding records.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OnboardingId(pub String);

impl OnboardingId {
    pub fn generate() -> Self {
        Self(format!("onb-{}", uuid::Uuid::new_v4().simple()))
    }
}

impl fmt::Display for OnboardingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the buyer as issued by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Onboarding stages in the order a buyer walks through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnboardingStep {
    InitialInquiry,
    QualificationKycAml,
    DueDiligenceLegal,
    InvestorProfile,
    PlatformTraining,
    BuyBoxAllocation,
    TransactionExecution,
    MonitoringReporting,
    SecondaryMarket,
    Completed,
}

impl OnboardingStep {
    /// The nine data-collection steps; `Completed` is not one of them.
    pub const DATA_STEPS: [OnboardingStep; 9] = [
        OnboardingStep::InitialInquiry,
        OnboardingStep::QualificationKycAml,
        OnboardingStep::DueDiligenceLegal,
        OnboardingStep::InvestorProfile,
        OnboardingStep::PlatformTraining,
        OnboardingStep::BuyBoxAllocation,
        OnboardingStep::TransactionExecution,
        OnboardingStep::MonitoringReporting,
        OnboardingStep::SecondaryMarket,
    ];

    pub const fn is_data_step(self) -> bool {
        !matches!(self, OnboardingStep::Completed)
    }

    /// Step reached by saving this one. The last data step has no successor
    /// here: `Completed` is only reachable through an explicit completion.
    pub const fn next_data_step(self) -> Option<OnboardingStep> {
        match self {
            OnboardingStep::InitialInquiry => Some(OnboardingStep::QualificationKycAml),
            OnboardingStep::QualificationKycAml => Some(OnboardingStep::DueDiligenceLegal),
            OnboardingStep::DueDiligenceLegal => Some(OnboardingStep::InvestorProfile),
            OnboardingStep::InvestorProfile => Some(OnboardingStep::PlatformTraining),
            OnboardingStep::PlatformTraining => Some(OnboardingStep::BuyBoxAllocation),
            OnboardingStep::BuyBoxAllocation => Some(OnboardingStep::TransactionExecution),
            OnboardingStep::TransactionExecution => Some(OnboardingStep::MonitoringReporting),
            OnboardingStep::MonitoringReporting => Some(OnboardingStep::SecondaryMarket),
            OnboardingStep::SecondaryMarket | OnboardingStep::Completed => None,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            OnboardingStep::InitialInquiry => "INITIAL_INQUIRY",
            OnboardingStep::QualificationKycAml => "QUALIFICATION_KYC_AML",
            OnboardingStep::DueDiligenceLegal => "DUE_DILIGENCE_LEGAL",
            OnboardingStep::InvestorProfile => "INVESTOR_PROFILE",
            OnboardingStep::PlatformTraining => "PLATFORM_TRAINING",
            OnboardingStep::BuyBoxAllocation => "BUY_BOX_ALLOCATION",
            OnboardingStep::TransactionExecution => "TRANSACTION_EXECUTION",
            OnboardingStep::MonitoringReporting => "MONITORING_REPORTING",
            OnboardingStep::SecondaryMarket => "SECONDARY_MARKET",
            OnboardingStep::Completed => "COMPLETED",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            OnboardingStep::InitialInquiry => "Initial inquiry",
            OnboardingStep::QualificationKycAml => "Qualification (KYC/AML)",
            OnboardingStep::DueDiligenceLegal => "Due diligence & legal",
            OnboardingStep::InvestorProfile => "Investor profile",
            OnboardingStep::PlatformTraining => "Platform training",
            OnboardingStep::BuyBoxAllocation => "BuyBox allocation",
            OnboardingStep::TransactionExecution => "Transaction execution",
            OnboardingStep::MonitoringReporting => "Monitoring & reporting",
            OnboardingStep::SecondaryMarket => "Secondary market",
            OnboardingStep::Completed => "Completed",
        }
    }
}

impl fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Buyer onboarding header row. `current_step` only ever moves forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerOnboarding {
    pub id: OnboardingId,
    pub user_id: UserId,
    pub current_step: OnboardingStep,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl BuyerOnboarding {
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: OnboardingId::generate(),
            user_id,
            current_step: OnboardingStep::InitialInquiry,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.current_step == OnboardingStep::Completed
    }
}

/// Stored data for one step; unique per `(onboarding_id, step)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub onboarding_id: OnboardingId,
    pub step: OnboardingStep,
    pub payload: StepPayload,
    pub completed: bool,
    pub updated_at: DateTime<Utc>,
}

/// Step data submitted by the buyer, tagged with the step it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepPayload {
    InitialInquiry(InitialInquiry),
    QualificationKycAml(QualificationKycAml),
    DueDiligenceLegal(DueDiligenceLegal),
    InvestorProfile(InvestorProfile),
    PlatformTraining(PlatformTraining),
    BuyBoxAllocation(BuyBoxAllocation),
    TransactionExecution(TransactionExecution),
    MonitoringReporting(MonitoringReporting),
    SecondaryMarket(SecondaryMarket),
}

impl StepPayload {
    pub fn step(&self) -> OnboardingStep {
        match self {
            StepPayload::InitialInquiry(_) => OnboardingStep::InitialInquiry,
            StepPayload::QualificationKycAml(_) => OnboardingStep::QualificationKycAml,
            StepPayload::DueDiligenceLegal(_) => OnboardingStep::DueDiligenceLegal,
            StepPayload::InvestorProfile(_) => OnboardingStep::InvestorProfile,
            StepPayload::PlatformTraining(_) => OnboardingStep::PlatformTraining,
            StepPayload::BuyBoxAllocation(_) => OnboardingStep::BuyBoxAllocation,
            StepPayload::TransactionExecution(_) => OnboardingStep::TransactionExecution,
            StepPayload::MonitoringReporting(_) => OnboardingStep::MonitoringReporting,
            StepPayload::SecondaryMarket(_) => OnboardingStep::SecondaryMarket,
        }
    }

    pub fn validate(&self) -> Result<(), StepValidationError> {
        match self {
            StepPayload::InitialInquiry(data) => data.validate(),
            StepPayload::QualificationKycAml(data) => data.validate(),
            StepPayload::DueDiligenceLegal(data) => data.validate(),
            StepPayload::InvestorProfile(data) => data.validate(),
            StepPayload::PlatformTraining(data) => data.validate(),
            StepPayload::BuyBoxAllocation(data) => data.validate(),
            StepPayload::TransactionExecution(data) => data.validate(),
            StepPayload::MonitoringReporting(data) => data.validate(),
            StepPayload::SecondaryMarket(data) => data.validate(),
        }
    }
}

/// Progress summary returned to the buyer dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnboardingProgressView {
    pub onboarding_id: OnboardingId,
    pub current_step: OnboardingStep,
    pub current_step_label: &'static str,
    pub completed_steps: Vec<OnboardingStep>,
    pub completed_count: usize,
    pub total_steps: usize,
    pub percent_complete: u8,
}

impl OnboardingProgressView {
    pub fn build(onboarding: &BuyerOnboarding, steps: &[StepRecord]) -> Self {
        let completed_steps: Vec<OnboardingStep> = OnboardingStep::DATA_STEPS
            .iter()
            .copied()
            .filter(|step| {
                steps
                    .iter()
                    .any(|record| record.step == *step && record.completed)
            })
            .collect();
        let total_steps = OnboardingStep::DATA_STEPS.len();
        let completed_count = completed_steps.len();
        let percent_complete = if onboarding.is_completed() {
            100
        } else {
            ((completed_count * 100) / total_steps) as u8
        };

        Self {
            onboarding_id: onboarding.id.clone(),
            current_step: onboarding.current_step,
            current_step_label: onboarding.current_step.label(),
            completed_steps,
            completed_count,
            total_steps,
            percent_complete,
        }
    }
}

/// Onboarding header together with its step records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OnboardingView {
    pub onboarding: BuyerOnboarding,
    pub steps: Vec<StepRecord>,
}

/// Result of saving one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepSaveOutcome {
    pub onboarding: BuyerOnboarding,
    pub step: StepRecord,
    pub advanced: bool,
}
