use jiff::civil::{Time, time};
use serde::{Deserialize, Serialize};

use crate::priority::Weights;

/// Per-user settings row. Every field may be missing; read it through
/// [`ProfileSettings`] to get the defaults applied.
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct Profile {
    pub user_id: String,
    pub display_name: Option<String>,
    pub work_start_time: Option<Time>,
    pub work_end_time: Option<Time>,
    pub break_duration_minutes: Option<u32>,
    pub peak_hours_start: Option<Time>,
    pub peak_hours_end: Option<Time>,
    pub daily_work_hours: Option<f64>,
    pub ahp_weight_urgency: Option<f64>,
    pub ahp_weight_grade: Option<f64>,
    pub ahp_weight_difficulty: Option<f64>,
}

impl Profile {
    /// Overlays every field set in `changes` on top of `self`.
    pub fn merged_with(self, changes: Profile) -> Profile {
        Profile {
            user_id: self.user_id,
            display_name: changes.display_name.or(self.display_name),
            work_start_time: changes.work_start_time.or(self.work_start_time),
            work_end_time: changes.work_end_time.or(self.work_end_time),
            break_duration_minutes: changes
                .break_duration_minutes
                .or(self.break_duration_minutes),
            peak_hours_start: changes.peak_hours_start.or(self.peak_hours_start),
            peak_hours_end: changes.peak_hours_end.or(self.peak_hours_end),
            daily_work_hours: changes.daily_work_hours.or(self.daily_work_hours),
            ahp_weight_urgency: changes.ahp_weight_urgency.or(self.ahp_weight_urgency),
            ahp_weight_grade: changes.ahp_weight_grade.or(self.ahp_weight_grade),
            ahp_weight_difficulty: changes
                .ahp_weight_difficulty
                .or(self.ahp_weight_difficulty),
        }
    }
}

/// Fully resolved user settings.
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileSettings {
    /// Defaults to an empty name
    pub display_name: String,
    /// Defaults to 09:00
    pub work_start_time: Time,
    /// Defaults to 17:00
    pub work_end_time: Time,
    /// Defaults to 15 minutes
    pub break_duration_minutes: u32,
    /// Defaults to 09:00
    pub peak_hours_start: Time,
    /// Defaults to 12:00
    pub peak_hours_end: Time,
    /// Defaults to 8 hours
    pub daily_work_hours: f64,
    /// Defaults to urgency 0.4, grade 0.35, difficulty 0.25
    pub weights: Weights,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            display_name: String::new(),
            work_start_time: time(9, 0, 0, 0),
            work_end_time: time(17, 0, 0, 0),
            break_duration_minutes: 15,
            peak_hours_start: time(9, 0, 0, 0),
            peak_hours_end: time(12, 0, 0, 0),
            daily_work_hours: 8.0,
            weights: Weights::default(),
        }
    }
}

impl ProfileSettings {
    pub fn resolve(profile: Option<&Profile>) -> Self {
        let defaults = Self::default();
        let Some(profile) = profile else {
            return defaults;
        };

        Self {
            display_name: profile
                .display_name
                .clone()
                .unwrap_or(defaults.display_name),
            work_start_time: profile.work_start_time.unwrap_or(defaults.work_start_time),
            work_end_time: profile.work_end_time.unwrap_or(defaults.work_end_time),
            break_duration_minutes: profile
                .break_duration_minutes
                .unwrap_or(defaults.break_duration_minutes),
            peak_hours_start: profile.peak_hours_start.unwrap_or(defaults.peak_hours_start),
            peak_hours_end: profile.peak_hours_end.unwrap_or(defaults.peak_hours_end),
            daily_work_hours: profile.daily_work_hours.unwrap_or(defaults.daily_work_hours),
            weights: Weights {
                urgency: profile
                    .ahp_weight_urgency
                    .unwrap_or(defaults.weights.urgency),
                grade: profile.ahp_weight_grade.unwrap_or(defaults.weights.grade),
                difficulty: profile
                    .ahp_weight_difficulty
                    .unwrap_or(defaults.weights.difficulty),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_profile_resolves_to_defaults() {
        let settings = ProfileSettings::resolve(None);
        assert_eq!(settings.work_start_time, time(9, 0, 0, 0));
        assert_eq!(settings.work_end_time, time(17, 0, 0, 0));
        assert_eq!(settings.break_duration_minutes, 15);
        assert_eq!(settings.peak_hours_end, time(12, 0, 0, 0));
        assert_eq!(settings.daily_work_hours, 8.0);
        assert_eq!(settings.weights, Weights::default());
    }

    #[test]
    fn test_partial_profile_keeps_defaults_for_missing_fields() {
        let profile = Profile {
            user_id: String::from("ana"),
            display_name: Some(String::from("Ana")),
            work_end_time: Some(time(18, 30, 0, 0)),
            ahp_weight_grade: Some(0.5),
            ..Profile::default()
        };

        let settings = ProfileSettings::resolve(Some(&profile));
        assert_eq!(settings.display_name, "Ana");
        assert_eq!(settings.work_start_time, time(9, 0, 0, 0));
        assert_eq!(settings.work_end_time, time(18, 30, 0, 0));
        assert_eq!(settings.weights.urgency, 0.4);
        assert_eq!(settings.weights.grade, 0.5);
        assert_eq!(settings.weights.difficulty, 0.25);
    }

    #[test]
    fn test_merge_only_overrides_set_fields() {
        let stored = Profile {
            user_id: String::from("ana"),
            display_name: Some(String::from("Ana")),
            break_duration_minutes: Some(10),
            ..Profile::default()
        };
        let changes = Profile {
            break_duration_minutes: Some(20),
            ahp_weight_urgency: Some(0.6),
            ..Profile::default()
        };

        let merged = stored.merged_with(changes);
        assert_eq!(merged.user_id, "ana");
        assert_eq!(merged.display_name.as_deref(), Some("Ana"));
        assert_eq!(merged.break_duration_minutes, Some(20));
        assert_eq!(merged.ahp_weight_urgency, Some(0.6));
    }
}
