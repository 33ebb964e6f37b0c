//! Contribution calendar
//!
//! Activity history is shown as a horizontally scrolling grid with one column
//! per calendar day. Above the grid sit two header bands, years and months,
//! each made of runs whose width is proportional to the number of day columns
//! they span.
//!
//! Flow: periods → [`group_by_day`] → [`CalendarHeaderAggregator`] → [`CalendarLayout`]

use chrono::{Datelike, Locale, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::{MonthRunKey, TrackerConfig};
use crate::types::{CellStatus, DateHeaders, HabitType, HeaderRun, PeriodData};

/// Width of one day column, in display units
pub const DEFAULT_CELL_WIDTH: u32 = 40;

const HOURS_PER_DAY: u32 = 24;

/// Group periods by the calendar day they start on
///
/// Days are in ascending order and the periods of each day are sorted by
/// start time. The keys of the result are exactly the unique, sorted dates
/// [`CalendarHeaderAggregator::aggregate`] expects.
pub fn group_by_day(periods: &[PeriodData]) -> BTreeMap<NaiveDate, Vec<PeriodData>> {
    let mut by_day: BTreeMap<NaiveDate, Vec<PeriodData>> = BTreeMap::new();
    for period in periods {
        by_day.entry(period.day()).or_default().push(period.clone());
    }
    for day_periods in by_day.values_mut() {
        day_periods.sort_by_key(|p| p.start_time);
    }
    by_day
}

/// Builds year and month header runs from a sequence of days
#[derive(Debug, Clone, Copy)]
pub struct CalendarHeaderAggregator {
    locale: Locale,
    month_key: MonthRunKey,
}

impl Default for CalendarHeaderAggregator {
    fn default() -> Self {
        Self::new(crate::config::system_locale())
    }
}

impl CalendarHeaderAggregator {
    /// Aggregator labelling months in `locale`
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            month_key: MonthRunKey::Label,
        }
    }

    /// Aggregator configured from a resolved [`TrackerConfig`]
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.locale).with_month_key(config.month_run_key)
    }

    pub fn with_month_key(mut self, month_key: MonthRunKey) -> Self {
        self.month_key = month_key;
        self
    }

    /// Abbreviated month name of `date`, e.g. "Jan"
    pub fn month_label(&self, date: NaiveDate) -> String {
        match date.and_hms_opt(0, 0, 0) {
            Some(midnight) => Utc
                .from_utc_datetime(&midnight)
                .format_localized("%b", self.locale)
                .to_string(),
            None => date.format("%b").to_string(),
        }
    }

    /// Run-length encode `dates` into year and month header runs
    ///
    /// `dates` must be ascending and free of duplicates; see [`group_by_day`].
    /// Other input still produces runs, just not meaningful ones. Year and
    /// month runs are tracked independently, so a month run can start
    /// without a year run starting.
    pub fn aggregate(&self, dates: &[NaiveDate]) -> DateHeaders {
        let mut years = RunBuilder::default();
        let mut months = RunBuilder::default();

        for date in dates {
            let month_label = self.month_label(*date);
            let month_key = match self.month_key {
                MonthRunKey::Label => month_label.clone(),
                MonthRunKey::YearMonth => format!("{}-{}", date.year(), month_label),
            };

            years.push(date.year().to_string(), date.year().to_string());
            months.push(month_key, month_label);
        }

        DateHeaders {
            years: years.finish(),
            months: months.finish(),
        }
    }
}

/// Single-band run-length encoder
///
/// Runs are compared by `key` and emitted with their display `label`.
#[derive(Default)]
struct RunBuilder {
    runs: Vec<HeaderRun>,
    current: Option<(String, HeaderRun)>,
}

impl RunBuilder {
    fn push(&mut self, key: String, label: String) {
        if let Some((current_key, run)) = &mut self.current {
            if *current_key == key {
                run.day_count += 1;
                return;
            }
        }
        if let Some((_, run)) = self.current.take() {
            self.runs.push(run);
        }
        self.current = Some((key, HeaderRun::new(label, 1)));
    }

    fn finish(mut self) -> Vec<HeaderRun> {
        if let Some((_, run)) = self.current.take() {
            self.runs.push(run);
        }
        self.runs
    }
}

/// One day column of the calendar grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayColumn {
    pub date: NaiveDate,
    /// Day of month shown above the cells
    pub day_of_month: u32,
    /// Cell status per period, in start time order
    pub cells: Vec<CellStatus>,
    /// Spacer slots that pad the column to a full day of periods
    pub empty_slots: usize,
}

/// Everything needed to draw the contribution calendar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarLayout {
    pub headers: DateHeaders,
    pub days: Vec<DayColumn>,
    pub renewal_hours: u32,
    pub empty_label: String,
    pub complete_label: String,
}

impl CalendarLayout {
    /// Lay out `periods` for a habit of `habit_type` renewing every `renewal_hours`
    pub fn build(
        periods: &[PeriodData],
        habit_type: &HabitType,
        renewal_hours: u32,
        aggregator: &CalendarHeaderAggregator,
    ) -> Self {
        let by_day = group_by_day(periods);
        let dates: Vec<NaiveDate> = by_day.keys().copied().collect();
        let headers = aggregator.aggregate(&dates);
        let slots_per_day = max_periods_per_day(renewal_hours);

        let days = by_day
            .into_iter()
            .map(|(date, day_periods)| DayColumn {
                date,
                day_of_month: date.day(),
                cells: day_periods
                    .iter()
                    .map(|p| CellStatus::of(p, habit_type))
                    .collect(),
                empty_slots: slots_per_day.saturating_sub(day_periods.len()),
            })
            .collect();

        let (empty_label, complete_label) = habit_type.legend_labels();

        Self {
            headers,
            days,
            renewal_hours,
            empty_label: empty_label.to_string(),
            complete_label: complete_label.to_string(),
        }
    }

    /// Display widths of the year header runs
    pub fn year_widths(&self, cell_width: u32) -> Vec<u32> {
        run_widths(&self.headers.years, cell_width)
    }

    /// Display widths of the month header runs
    pub fn month_widths(&self, cell_width: u32) -> Vec<u32> {
        run_widths(&self.headers.months, cell_width)
    }
}

/// Periods that fit in one day; habits renewing less than daily still get one slot
pub fn max_periods_per_day(renewal_hours: u32) -> usize {
    if renewal_hours == 0 {
        return 1;
    }
    (HOURS_PER_DAY / renewal_hours).max(1) as usize
}

fn run_widths(runs: &[HeaderRun], cell_width: u32) -> Vec<u32> {
    runs.iter()
        .map(|run| {
            u32::try_from(run.day_count)
                .unwrap_or(u32::MAX)
                .saturating_mul(cell_width)
        })
        .collect()
}
