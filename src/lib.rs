//! Habit Core - Persistence and calendar engine for the habit tracker
//!
//! Habits are stored as flat text rows: the habit type is packed into a single
//! delimited column by the [`HabitTypeCodec`] and timestamps are ISO local
//! date-times. Activity history is rendered as a contribution calendar whose
//! year and month header bands come from the [`CalendarHeaderAggregator`].
//!
//! ## Modules
//!
//! - **Codec**: Habit type and timestamp encoding for storage rows
//! - **Calendar**: Day grouping, header runs and calendar layout
//! - **Repository**: Habit persistence over SQLite or in-memory row stores
//! - **Form / Progress / Stats**: Draft validation, period progress and streaks

pub mod calendar;
pub mod codec;
pub mod config;
pub mod error;
pub mod form;
pub mod progress;
pub mod repository;
pub mod stats;
pub mod store;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use calendar::{group_by_day, CalendarHeaderAggregator, CalendarLayout, DayColumn};
pub use codec::HabitTypeCodec;
pub use config::{MonthRunKey, TrackerConfig};
pub use error::TrackerError;
pub use form::HabitDraft;
pub use progress::HabitProgress;
pub use repository::{HabitListing, HabitRepository};
pub use stats::HabitStats;
pub use store::{MemoryRowStore, RowStore, SqliteRowStore};
pub use types::{CellStatus, DateHeaders, Habit, HabitRow, HabitType, HeaderRun, PeriodData};

/// Library version
pub const TRACKER_VERSION: &str = env!("CARGO_PKG_VERSION");
