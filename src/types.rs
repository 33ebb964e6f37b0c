//! Core types for the habit tracker
//!
//! This module defines the data structures shared by every layer: the habit
//! definition and its type, the persisted row shape, the per-period activity
//! history, and the calendar header runs derived from it.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::codec::{HabitTypeCodec, FIELD_DELIMITER};
use crate::error::TrackerError;

/// What a habit measures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HabitType {
    /// Done / not done
    Boolean,
    /// A measured quantity checked against a target
    Numeric {
        unit: String,
        target: f64,
        #[serde(default)]
        prefix: String,
        #[serde(default)]
        suffix: String,
    },
}

impl HabitType {
    /// Numeric habit with empty prefix and suffix
    pub fn numeric(unit: impl Into<String>, target: f64) -> Self {
        HabitType::Numeric {
            unit: unit.into(),
            target,
            prefix: String::new(),
            suffix: String::new(),
        }
    }

    /// Target value, if this is a numeric habit
    pub fn target(&self) -> Option<f64> {
        match self {
            HabitType::Boolean => None,
            HabitType::Numeric { target, .. } => Some(*target),
        }
    }

    /// Legend labels for the empty and fully achieved calendar cells
    pub fn legend_labels(&self) -> (&'static str, &'static str) {
        match self {
            HabitType::Boolean => ("Not done", "Done"),
            HabitType::Numeric { .. } => ("No entry", "Target achieved"),
        }
    }

    /// Check that the value can be stored and read back unchanged
    pub fn validate(&self) -> Result<(), TrackerError> {
        match self {
            HabitType::Boolean => Ok(()),
            HabitType::Numeric {
                unit,
                target,
                prefix,
                suffix,
            } => {
                for (field, value) in [("unit", unit), ("prefix", prefix), ("suffix", suffix)] {
                    if value.contains(FIELD_DELIMITER) {
                        return Err(TrackerError::InvalidHabit(format!(
                            "{field} must not contain '{FIELD_DELIMITER}'"
                        )));
                    }
                }
                if !target.is_finite() {
                    return Err(TrackerError::InvalidHabit(format!(
                        "target must be a finite number, got {target}"
                    )));
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for HabitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&HabitTypeCodec::encode(self))
    }
}

impl FromStr for HabitType {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HabitTypeCodec::decode(s)
    }
}

/// A user-defined recurring habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Row id; 0 until the habit has been stored
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub habit_type: HabitType,
    /// Hours between resets of the completion state
    pub renewal_hours: u32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Habit {
    /// Create an unsaved habit stamped with `now`
    pub fn new(
        name: impl Into<String>,
        habit_type: HabitType,
        renewal_hours: u32,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            habit_type,
            renewal_hours,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A habit as persisted: one text column per field, the type encoded by
/// [`HabitTypeCodec`] and timestamps as ISO local date-times
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitRow {
    pub id: i64,
    pub name: String,
    pub habit_type: String,
    pub renewal_hours: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// One renewal period of a habit's activity history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodData {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub is_completed: bool,
    #[serde(default)]
    pub value: Option<f64>,
    /// Overrides the habit target for this period
    #[serde(default)]
    pub target: Option<f64>,
}

impl PeriodData {
    /// Calendar day this period is bucketed under
    pub fn day(&self) -> NaiveDate {
        self.start_time.date()
    }
}

/// Colour class of a single calendar cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    /// Not done / no entry
    Empty,
    /// Numeric entry below target
    Partial,
    /// Done / target achieved
    Complete,
}

impl CellStatus {
    /// Classify a period for the given habit type
    pub fn of(period: &PeriodData, habit_type: &HabitType) -> Self {
        match habit_type {
            HabitType::Boolean => {
                if period.is_completed {
                    CellStatus::Complete
                } else {
                    CellStatus::Empty
                }
            }
            HabitType::Numeric { target, .. } => match period.value {
                Some(value) if period.is_completed => {
                    if value >= period.target.unwrap_or(*target) {
                        CellStatus::Complete
                    } else {
                        CellStatus::Partial
                    }
                }
                _ => CellStatus::Empty,
            },
        }
    }
}

/// A maximal run of consecutive days sharing a year or month label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRun {
    pub label: String,
    pub day_count: usize,
}

impl HeaderRun {
    pub fn new(label: impl Into<String>, day_count: usize) -> Self {
        Self {
            label: label.into(),
            day_count,
        }
    }
}

/// Year and month header bands for the activity calendar
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateHeaders {
    pub years: Vec<HeaderRun>,
    pub months: Vec<HeaderRun>,
}

impl DateHeaders {
    pub fn is_empty(&self) -> bool {
        self.years.is_empty() && self.months.is_empty()
    }
}
