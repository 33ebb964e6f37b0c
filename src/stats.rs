//! Streak and completion statistics
//!
//! Statistics are computed from a habit's period history. A period counts as
//! achieved when its calendar cell would be fully complete: done for boolean
//! habits, at or above target for numeric ones.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::types::{CellStatus, HabitType, PeriodData};

/// Summary statistics for one habit
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HabitStats {
    /// Achieved periods counted back from the most recent one
    pub current_streak: usize,
    /// Longest run of consecutive achieved periods
    pub best_streak: usize,
    pub total_periods: usize,
    pub achieved_periods: usize,
    /// Distinct days with at least one achieved period
    pub active_days: usize,
    /// Achieved periods as a percentage of all periods (0-100)
    pub success_rate: f64,
}

impl HabitStats {
    /// Compute statistics over `periods`, in any order
    pub fn from_periods(periods: &[PeriodData], habit_type: &HabitType) -> Self {
        if periods.is_empty() {
            return Self::default();
        }

        let mut ordered: Vec<&PeriodData> = periods.iter().collect();
        ordered.sort_by_key(|p| p.start_time);

        let achieved: Vec<bool> = ordered
            .iter()
            .map(|p| CellStatus::of(p, habit_type) == CellStatus::Complete)
            .collect();

        let mut best_streak = 0;
        let mut run = 0;
        for &hit in &achieved {
            if hit {
                run += 1;
                best_streak = best_streak.max(run);
            } else {
                run = 0;
            }
        }

        let current_streak = achieved.iter().rev().take_while(|hit| **hit).count();
        let achieved_periods = achieved.iter().filter(|hit| **hit).count();

        let active_days: BTreeSet<NaiveDate> = ordered
            .iter()
            .zip(&achieved)
            .filter(|(_, hit)| **hit)
            .map(|(p, _)| p.day())
            .collect();

        Self {
            current_streak,
            best_streak,
            total_periods: ordered.len(),
            achieved_periods,
            active_days: active_days.len(),
            success_rate: achieved_periods as f64 / ordered.len() as f64 * 100.0,
        }
    }
}
