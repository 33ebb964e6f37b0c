//! Habit card progress
//!
//! Computes what a habit card shows for the current renewal period: how much
//! of the period has elapsed, how urgent the habit is, and for numeric habits
//! how far the logged value is from the target.

use serde::Serialize;

use crate::types::{Habit, HabitType};

/// Remaining hours at or below which a habit is critical
const CRITICAL_HOURS: u32 = 2;

/// Remaining hours at or below which a habit needs attention
const WARNING_HOURS: u32 = 6;

/// How close the current period is to renewing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Normal,
    Warning,
    Critical,
}

impl Urgency {
    pub fn from_remaining_hours(remaining_hours: u32) -> Self {
        if remaining_hours <= CRITICAL_HOURS {
            Urgency::Critical
        } else if remaining_hours <= WARNING_HOURS {
            Urgency::Warning
        } else {
            Urgency::Normal
        }
    }
}

/// Progress of a habit within its current renewal period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitProgress {
    pub is_completed: bool,
    pub remaining_hours: u32,
    /// Fraction of the period that has elapsed (0-1)
    pub time_progress: f64,
    pub urgency: Urgency,
    /// Fraction of the numeric target reached (0-1)
    pub value_progress: Option<f64>,
    /// Human readable numeric progress line
    pub summary: Option<String>,
}

impl HabitProgress {
    /// Progress for `habit` after `elapsed_hours` of its current period
    pub fn for_period(
        habit: &Habit,
        current_value: Option<f64>,
        is_completed: bool,
        elapsed_hours: u32,
    ) -> Self {
        let remaining_hours = habit.renewal_hours.saturating_sub(elapsed_hours);
        let time_progress = if habit.renewal_hours == 0 {
            1.0
        } else {
            (elapsed_hours as f64 / habit.renewal_hours as f64).clamp(0.0, 1.0)
        };

        let (value_progress, summary) = match &habit.habit_type {
            HabitType::Boolean => (None, None),
            HabitType::Numeric {
                unit,
                target,
                prefix,
                suffix,
            } => {
                let current = current_value.unwrap_or(0.0);
                let progress = if *target > 0.0 {
                    (current / target).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let summary = numeric_summary(current, *target, unit, prefix, suffix, is_completed);
                (Some(progress), Some(summary))
            }
        };

        Self {
            is_completed,
            remaining_hours,
            time_progress,
            urgency: Urgency::from_remaining_hours(remaining_hours),
            value_progress,
            summary,
        }
    }
}

/// "{prefix} {current} {unit} {suffix}", plus the remaining amount while incomplete
fn numeric_summary(
    current: f64,
    target: f64,
    unit: &str,
    prefix: &str,
    suffix: &str,
    is_completed: bool,
) -> String {
    let current_text = format_amount(current);
    let mut summary = join_words(&[prefix, &current_text, unit, suffix]);

    if !is_completed {
        let remaining = format_amount((target - current).max(0.0));
        summary.push(' ');
        summary.push_str(&join_words(&[&remaining, unit, "remaining."]));
    }

    summary
}

fn join_words(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whole amounts without a fractional part, others as written
fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn habit(habit_type: HabitType, renewal_hours: u32) -> Habit {
        let now = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Habit::new("Test", habit_type, renewal_hours, now)
    }

    fn run_habit() -> Habit {
        habit(
            HabitType::Numeric {
                unit: "km".to_string(),
                target: 5.0,
                prefix: "Today".to_string(),
                suffix: "done".to_string(),
            },
            24,
        )
    }

    #[test]
    fn test_urgency_thresholds() {
        assert_eq!(Urgency::from_remaining_hours(0), Urgency::Critical);
        assert_eq!(Urgency::from_remaining_hours(2), Urgency::Critical);
        assert_eq!(Urgency::from_remaining_hours(3), Urgency::Warning);
        assert_eq!(Urgency::from_remaining_hours(6), Urgency::Warning);
        assert_eq!(Urgency::from_remaining_hours(7), Urgency::Normal);
    }

    #[test]
    fn test_boolean_progress() {
        let progress = HabitProgress::for_period(&habit(HabitType::Boolean, 12), None, false, 3);
        assert_eq!(progress.remaining_hours, 9);
        assert_eq!(progress.time_progress, 0.25);
        assert_eq!(progress.urgency, Urgency::Normal);
        assert_eq!(progress.value_progress, None);
        assert_eq!(progress.summary, None);
    }

    #[test]
    fn test_elapsed_past_renewal_saturates() {
        let progress = HabitProgress::for_period(&habit(HabitType::Boolean, 6), None, false, 10);
        assert_eq!(progress.remaining_hours, 0);
        assert_eq!(progress.time_progress, 1.0);
        assert_eq!(progress.urgency, Urgency::Critical);
    }

    #[test]
    fn test_numeric_incomplete_summary() {
        let progress = HabitProgress::for_period(&run_habit(), Some(2.0), false, 20);
        assert_eq!(progress.value_progress, Some(0.4));
        assert_eq!(
            progress.summary.as_deref(),
            Some("Today 2 km done 3 km remaining.")
        );
        assert_eq!(progress.urgency, Urgency::Warning);
    }

    #[test]
    fn test_numeric_completed_summary() {
        let progress = HabitProgress::for_period(&run_habit(), Some(6.5), true, 1);
        assert_eq!(progress.value_progress, Some(1.0));
        assert_eq!(progress.summary.as_deref(), Some("Today 6.5 km done"));
    }

    #[test]
    fn test_numeric_without_prefix_or_value() {
        let progress =
            HabitProgress::for_period(&habit(HabitType::numeric("pages", 100.0), 24), None, false, 0);
        assert_eq!(progress.value_progress, Some(0.0));
        assert_eq!(
            progress.summary.as_deref(),
            Some("0 pages 100 pages remaining.")
        );
    }

    #[test]
    fn test_zero_target_does_not_divide() {
        let progress =
            HabitProgress::for_period(&habit(HabitType::numeric("x", 0.0), 24), Some(3.0), false, 0);
        assert_eq!(progress.value_progress, Some(0.0));
    }
}
