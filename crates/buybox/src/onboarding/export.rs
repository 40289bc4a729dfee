use std::io::Write;

use chrono::SecondsFormat;
use serde::Serialize;

use super::domain::{OnboardingProgressView, OnboardingView};

#[derive(Debug, Serialize)]
struct ProgressRow<'a> {
    onboarding_id: &'a str,
    user_id: &'a str,
    current_step: &'static str,
    completed_steps: usize,
    percent_complete: u8,
    created_at: String,
    updated_at: String,
    completed_at: String,
}

const HEADER: [&str; 8] = [
    "onboarding_id",
    "user_id",
    "current_step",
    "completed_steps",
    "percent_complete",
    "created_at",
    "updated_at",
    "completed_at",
];

/// Writes one CSV row per onboarding for the admin back-office export. The
/// header row is written even when there are no onboardings.
pub fn write_progress_csv<W: Write>(
    onboardings: &[OnboardingView],
    writer: W,
) -> Result<(), csv::Error> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(HEADER)?;
    for view in onboardings {
        let progress = OnboardingProgressView::build(&view.onboarding, &view.steps);
        let onboarding = &view.onboarding;
        csv.serialize(ProgressRow {
            onboarding_id: &onboarding.id.0,
            user_id: &onboarding.user_id.0,
            current_step: onboarding.current_step.code(),
            completed_steps: progress.completed_count,
            percent_complete: progress.percent_complete,
            created_at: onboarding
                .created_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            updated_at: onboarding
                .updated_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            completed_at: onboarding
                .completed_at
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_default(),
        })?;
    }
    csv.flush()?;
    Ok(())
}
