//! Data captured by each onboarding step and the field checks applied before
//! a step is stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::OnboardingStep;

/// Field-level validation failure for a step payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{step}.{field}: {reason}")]
pub struct StepValidationError {
    pub step: OnboardingStep,
    pub field: &'static str,
    pub reason: String,
}

impl StepValidationError {
    fn new(step: OnboardingStep, field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            step,
            field,
            reason: reason.into(),
        }
    }
}

fn require_text(
    step: OnboardingStep,
    field: &'static str,
    value: &str,
) -> Result<(), StepValidationError> {
    if value.trim().is_empty() {
        Err(StepValidationError::new(step, field, "must not be empty"))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactPreference {
    Email,
    Phone,
    VideoCall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentTimeline {
    Immediate,
    WithinThreeMonths,
    WithinYear,
    Exploring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetRange {
    pub min: u64,
    pub max: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialInquiry {
    pub investment_goals: Vec<String>,
    pub budget: BudgetRange,
    pub timeline: InvestmentTimeline,
    pub contact_preference: ContactPreference,
}

impl InitialInquiry {
    pub fn validate(&self) -> Result<(), StepValidationError> {
        const STEP: OnboardingStep = OnboardingStep::InitialInquiry;
        if self.investment_goals.iter().all(|goal| goal.trim().is_empty()) {
            return Err(StepValidationError::new(
                STEP,
                "investment_goals",
                "at least one goal is required",
            ));
        }
        if self.budget.max == 0 || self.budget.min > self.budget.max {
            return Err(StepValidationError::new(
                STEP,
                "budget",
                "max must be positive and not below min",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccreditationStatus {
    Accredited,
    Sophisticated,
    HighNetWorth,
    Retail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationKycAml {
    pub identity_verified: bool,
    pub accreditation: AccreditationStatus,
    pub source_of_funds: String,
    pub aml_cleared: bool,
}

impl QualificationKycAml {
    pub fn validate(&self) -> Result<(), StepValidationError> {
        require_text(
            OnboardingStep::QualificationKycAml,
            "source_of_funds",
            &self.source_of_funds,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueDiligenceLegal {
    pub agreements_signed: bool,
    pub risk_disclosure_acknowledged: bool,
    #[serde(default)]
    pub legal_counsel: Option<String>,
}

impl DueDiligenceLegal {
    pub fn validate(&self) -> Result<(), StepValidationError> {
        if !self.risk_disclosure_acknowledged {
            return Err(StepValidationError::new(
                OnboardingStep::DueDiligenceLegal,
                "risk_disclosure_acknowledged",
                "the risk disclosure must be acknowledged",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    Conservative,
    Balanced,
    Growth,
    Aggressive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestorProfile {
    pub risk_tolerance: RiskTolerance,
    pub horizon_years: u8,
    #[serde(default)]
    pub preferred_regions: Vec<String>,
}

impl InvestorProfile {
    pub fn validate(&self) -> Result<(), StepValidationError> {
        if !(1..=50).contains(&self.horizon_years) {
            return Err(StepValidationError::new(
                OnboardingStep::InvestorProfile,
                "horizon_years",
                "must be between 1 and 50",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformTraining {
    #[serde(default)]
    pub modules_completed: Vec<String>,
    pub assessment_passed: bool,
}

impl PlatformTraining {
    pub fn validate(&self) -> Result<(), StepValidationError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyBoxAllocation {
    pub buy_box_id: String,
    /// Allocation in minor currency units.
    pub allocation_amount: u64,
}

impl BuyBoxAllocation {
    pub fn validate(&self) -> Result<(), StepValidationError> {
        const STEP: OnboardingStep = OnboardingStep::BuyBoxAllocation;
        require_text(STEP, "buy_box_id", &self.buy_box_id)?;
        if self.allocation_amount == 0 {
            return Err(StepValidationError::new(
                STEP,
                "allocation_amount",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionExecution {
    pub transaction_reference: String,
    pub funds_transferred: bool,
    #[serde(default)]
    pub executed_at: Option<DateTime<Utc>>,
}

impl TransactionExecution {
    pub fn validate(&self) -> Result<(), StepValidationError> {
        require_text(
            OnboardingStep::TransactionExecution,
            "transaction_reference",
            &self.transaction_reference,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFrequency {
    Monthly,
    Quarterly,
    Annually,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Sms,
    InApp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringReporting {
    pub report_frequency: ReportFrequency,
    pub notification_channels: Vec<NotificationChannel>,
}

impl MonitoringReporting {
    pub fn validate(&self) -> Result<(), StepValidationError> {
        if self.notification_channels.is_empty() {
            return Err(StepValidationError::new(
                OnboardingStep::MonitoringReporting,
                "notification_channels",
                "choose at least one channel",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityPreference {
    HoldToMaturity,
    PartialExit,
    FullExit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryMarket {
    pub opted_in: bool,
    pub liquidity_preference: LiquidityPreference,
}

impl SecondaryMarket {
    pub fn validate(&self) -> Result<(), StepValidationError> {
        Ok(())
    }
}
