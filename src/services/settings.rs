use jiff::civil::Time;
use thiserror::Error;

use crate::{
    backend::{Backend, BackendError},
    client::Planner,
    models::profile::{Profile, ProfileSettings},
    priority::ScoreError,
};

#[derive(Debug, Error)]
pub enum UpdateSettingsError {
    #[error("Nothing to change")]
    NothingToChange,

    #[error("Invalid time '{0}': {1}")]
    InvalidTime(String, String),

    #[error("{field} must end after it starts")]
    EmptyInterval { field: &'static str },

    #[error("Daily work hours must be between 0 and 24, got {0}")]
    InvalidWorkHours(f64),

    #[error("{0}")]
    Weights(#[from] ScoreError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

#[derive(Default)]
pub struct UpdateSettingsParameters {
    pub display_name: Option<String>,
    pub work_start_time: Option<String>,
    pub work_end_time: Option<String>,
    pub break_duration_minutes: Option<u32>,
    pub peak_hours_start: Option<String>,
    pub peak_hours_end: Option<String>,
    pub daily_work_hours: Option<f64>,
    pub ahp_weight_urgency: Option<f64>,
    pub ahp_weight_grade: Option<f64>,
    pub ahp_weight_difficulty: Option<f64>,
}

fn parse_time(input: Option<String>) -> Result<Option<Time>, UpdateSettingsError> {
    input
        .map(|raw| {
            raw.trim()
                .parse::<Time>()
                .map_err(|e| UpdateSettingsError::InvalidTime(raw.clone(), e.to_string()))
        })
        .transpose()
}

/// Merges the given fields into the stored profile. The merged result must
/// still produce a usable weight set and ordered intervals.
pub fn update_settings<B: Backend>(
    planner: &mut Planner<B>,
    parameters: UpdateSettingsParameters,
) -> Result<ProfileSettings, UpdateSettingsError> {
    let changes = Profile {
        user_id: planner.owner().to_string(),
        display_name: parameters.display_name,
        work_start_time: parse_time(parameters.work_start_time)?,
        work_end_time: parse_time(parameters.work_end_time)?,
        break_duration_minutes: parameters.break_duration_minutes,
        peak_hours_start: parse_time(parameters.peak_hours_start)?,
        peak_hours_end: parse_time(parameters.peak_hours_end)?,
        daily_work_hours: parameters.daily_work_hours,
        ahp_weight_urgency: parameters.ahp_weight_urgency,
        ahp_weight_grade: parameters.ahp_weight_grade,
        ahp_weight_difficulty: parameters.ahp_weight_difficulty,
    };
    if changes
        == (Profile {
            user_id: changes.user_id.clone(),
            ..Profile::default()
        })
    {
        return Err(UpdateSettingsError::NothingToChange);
    }

    if let Some(hours) = changes.daily_work_hours
        && !(0.0..=24.0).contains(&hours)
    {
        return Err(UpdateSettingsError::InvalidWorkHours(hours));
    }

    let current = planner.profile()?.unwrap_or_else(|| Profile {
        user_id: planner.owner().to_string(),
        ..Profile::default()
    });
    let merged = current.merged_with(changes);

    let resolved = ProfileSettings::resolve(Some(&merged));
    resolved.weights.normalized()?;
    if resolved.work_end_time <= resolved.work_start_time {
        return Err(UpdateSettingsError::EmptyInterval {
            field: "Work hours",
        });
    }
    if resolved.peak_hours_end <= resolved.peak_hours_start {
        return Err(UpdateSettingsError::EmptyInterval {
            field: "Peak hours",
        });
    }

    planner.save_profile(merged)?;
    tracing::info!(owner = planner.owner(), "settings updated");
    Ok(resolved)
}
