//! Seller-facing conveyancing progress. The status is persisted as a JSON
//! blob on the property and parsed back into [`DashboardStatus`] on read.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Conveyancing stages, in the order they must be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConveyancingStage {
    OfferAccepted,
    Valuation,
    LegalSearches,
    ContractsDrafted,
    ContractsExchanged,
    Completion,
    FundsReleased,
}

impl ConveyancingStage {
    pub const ALL: [ConveyancingStage; 7] = [
        ConveyancingStage::OfferAccepted,
        ConveyancingStage::Valuation,
        ConveyancingStage::LegalSearches,
        ConveyancingStage::ContractsDrafted,
        ConveyancingStage::ContractsExchanged,
        ConveyancingStage::Completion,
        ConveyancingStage::FundsReleased,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ConveyancingStage::OfferAccepted => "Offer accepted",
            ConveyancingStage::Valuation => "Valuation",
            ConveyancingStage::LegalSearches => "Legal searches",
            ConveyancingStage::ContractsDrafted => "Contracts drafted",
            ConveyancingStage::ContractsExchanged => "Contracts exchanged",
            ConveyancingStage::Completion => "Completion",
            ConveyancingStage::FundsReleased => "Funds released",
        }
    }
}

impl fmt::Display for ConveyancingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageState {
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEntry {
    pub stage: ConveyancingStage,
    pub state: StageState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A transition request, usually carried by a status-update webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub stage: ConveyancingStage,
    pub state: StageState,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("dashboard status blob is not readable: {0}")]
    Unreadable(#[source] serde_json::Error),
    #[error("dashboard status blob must list every stage exactly once, in order")]
    MalformedStages,
    #[error("{stage} cannot move back from {from:?} to {to:?}")]
    Regression {
        stage: ConveyancingStage,
        from: StageState,
        to: StageState,
    },
    #[error("{stage} cannot start before {blocking} is completed")]
    OutOfOrder {
        stage: ConveyancingStage,
        blocking: ConveyancingStage,
    },
}

/// Linear conveyancing progress shown on the seller dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStatus {
    pub stages: Vec<StageEntry>,
    pub updated_at: DateTime<Utc>,
}

impl DashboardStatus {
    /// Fresh status: the accepted offer is in progress, everything else pending.
    pub fn initial(now: DateTime<Utc>) -> Self {
        let stages = ConveyancingStage::ALL
            .iter()
            .map(|stage| StageEntry {
                stage: *stage,
                state: if *stage == ConveyancingStage::OfferAccepted {
                    StageState::InProgress
                } else {
                    StageState::Pending
                },
                note: None,
                updated_at: (*stage == ConveyancingStage::OfferAccepted).then_some(now),
            })
            .collect();

        Self {
            stages,
            updated_at: now,
        }
    }

    pub fn from_json(value: &Value) -> Result<Self, DashboardError> {
        let status: DashboardStatus =
            serde_json::from_value(value.clone()).map_err(DashboardError::Unreadable)?;
        let in_order = status.stages.len() == ConveyancingStage::ALL.len()
            && status
                .stages
                .iter()
                .zip(ConveyancingStage::ALL.iter())
                .all(|(entry, stage)| entry.stage == *stage);
        if !in_order {
            return Err(DashboardError::MalformedStages);
        }
        Ok(status)
    }

    pub fn to_json(&self) -> Value {
        // Plain data with string keys always serializes.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// `None` only for a status built without [`DashboardStatus::from_json`]
    /// that is missing stages.
    pub fn entry(&self, stage: ConveyancingStage) -> Option<&StageEntry> {
        self.stages.get(stage as usize).filter(|entry| entry.stage == stage)
    }

    /// First stage that is not completed; `None` once funds are released.
    pub fn current_stage(&self) -> Option<ConveyancingStage> {
        self.stages
            .iter()
            .find(|entry| entry.state != StageState::Completed)
            .map(|entry| entry.stage)
    }

    pub fn percent_complete(&self) -> u8 {
        let completed = self
            .stages
            .iter()
            .filter(|entry| entry.state == StageState::Completed)
            .count();
        ((completed * 100) / self.stages.len().max(1)) as u8
    }

    /// Applies a forward transition. Repeating the current state only
    /// refreshes the note; moving a stage backward or starting a stage while
    /// an earlier one is open is rejected.
    pub fn apply(&mut self, update: &StatusUpdate, now: DateTime<Utc>) -> Result<(), DashboardError> {
        let index = update.stage as usize;
        let current = self
            .entry(update.stage)
            .ok_or(DashboardError::MalformedStages)?
            .state;

        if update.state < current {
            return Err(DashboardError::Regression {
                stage: update.stage,
                from: current,
                to: update.state,
            });
        }

        if update.state != StageState::Pending {
            if let Some(blocking) = self
                .stages
                .iter()
                .take(index)
                .find(|entry| entry.state != StageState::Completed)
            {
                return Err(DashboardError::OutOfOrder {
                    stage: update.stage,
                    blocking: blocking.stage,
                });
            }
        }

        let Some(entry) = self.stages.get_mut(index) else {
            return Err(DashboardError::MalformedStages);
        };
        entry.state = update.state;
        if let Some(note) = update.note.as_ref().filter(|note| !note.trim().is_empty()) {
            entry.note = Some(note.trim().to_string());
        }
        entry.updated_at = Some(now);

        if update.state == StageState::Completed {
            if let Some(next) = self.stages.get_mut(index + 1) {
                if next.state == StageState::Pending {
                    next.state = StageState::InProgress;
                    next.updated_at = Some(now);
                }
            }
        }

        self.updated_at = now;
        Ok(())
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            current_stage: self.current_stage(),
            current_stage_label: self.current_stage().map(ConveyancingStage::label),
            percent_complete: self.percent_complete(),
            stages: self.stages.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// Dashboard status with derived progress fields for the seller UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub current_stage: Option<ConveyancingStage>,
    pub current_stage_label: Option<&'static str>,
    pub percent_complete: u8,
    pub stages: Vec<StageEntry>,
    pub updated_at: DateTime<Utc>,
}
