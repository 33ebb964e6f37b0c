//! Add-habit form
//!
//! Holds the raw text a user typed while defining a habit and turns it into
//! a [`Habit`] once it is valid.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;
use crate::types::{Habit, HabitType};

/// Which kind of habit is being defined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitKind {
    #[default]
    Boolean,
    Numeric,
}

/// Unit the renewal period is entered in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenewalUnit {
    #[default]
    Hours,
    Days,
}

impl RenewalUnit {
    pub fn display_name(&self) -> &'static str {
        match self {
            RenewalUnit::Hours => "Hours",
            RenewalUnit::Days => "Days",
        }
    }

    /// Hours per unit
    pub fn to_hours(&self) -> u32 {
        match self {
            RenewalUnit::Hours => 1,
            RenewalUnit::Days => 24,
        }
    }
}

/// Unvalidated form input for a new habit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitDraft {
    pub name: String,
    pub kind: HabitKind,
    pub renewal_period: String,
    pub renewal_unit: RenewalUnit,
    pub target_value: String,
    pub unit: String,
    pub prefix: String,
    pub suffix: String,
}

impl Default for HabitDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: HabitKind::Boolean,
            renewal_period: "24".to_string(),
            renewal_unit: RenewalUnit::Hours,
            target_value: String::new(),
            unit: String::new(),
            prefix: String::new(),
            suffix: String::new(),
        }
    }
}

impl HabitDraft {
    /// Whether the save action should be offered
    pub fn is_save_enabled(&self) -> bool {
        let renewal_ok = self.renewal_hours().is_ok();
        let type_ok = match self.kind {
            HabitKind::Boolean => true,
            HabitKind::Numeric => {
                !self.target_value.trim().is_empty()
                    && self.target_value.trim().parse::<f64>().is_ok()
                    && !self.unit.trim().is_empty()
            }
        };

        !self.name.trim().is_empty() && renewal_ok && type_ok
    }

    /// Renewal period in hours
    pub fn renewal_hours(&self) -> Result<u32, TrackerError> {
        let period: i64 = self.renewal_period.trim().parse().map_err(|_| {
            TrackerError::InvalidHabit(format!(
                "renewal period {:?} is not a whole number",
                self.renewal_period
            ))
        })?;
        if period <= 0 {
            return Err(TrackerError::InvalidHabit(
                "renewal period must be positive".to_string(),
            ));
        }

        u32::try_from(period)
            .ok()
            .and_then(|p| p.checked_mul(self.renewal_unit.to_hours()))
            .ok_or_else(|| TrackerError::InvalidHabit("renewal period is too long".to_string()))
    }

    /// Habit type described by the draft
    pub fn habit_type(&self) -> Result<HabitType, TrackerError> {
        let habit_type = match self.kind {
            HabitKind::Boolean => HabitType::Boolean,
            HabitKind::Numeric => {
                if self.unit.trim().is_empty() {
                    return Err(TrackerError::InvalidHabit("unit is required".to_string()));
                }
                let target: f64 = self.target_value.trim().parse().map_err(|_| {
                    TrackerError::InvalidHabit(format!(
                        "target {:?} is not a number",
                        self.target_value
                    ))
                })?;
                HabitType::Numeric {
                    unit: self.unit.clone(),
                    target,
                    prefix: self.prefix.clone(),
                    suffix: self.suffix.clone(),
                }
            }
        };

        habit_type.validate()?;
        Ok(habit_type)
    }

    /// Build an unsaved habit created at `now`
    pub fn into_habit(self, now: NaiveDateTime) -> Result<Habit, TrackerError> {
        if self.name.trim().is_empty() {
            return Err(TrackerError::InvalidHabit("name is required".to_string()));
        }
        let renewal_hours = self.renewal_hours()?;
        let habit_type = self.habit_type()?;

        Ok(Habit::new(self.name, habit_type, renewal_hours, now))
    }
}
