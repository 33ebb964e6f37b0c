//! Habit row storage
//!
//! The repository only needs a store that can keep one [`HabitRow`] per id.
//! Rows are opaque text here; decoding them is the repository's job.

mod memory;
mod sqlite;

pub use memory::MemoryRowStore;
pub use sqlite::SqliteRowStore;

use crate::error::TrackerError;
use crate::types::HabitRow;

/// Trait for habit row stores
pub trait RowStore {
    /// Insert a row and return its id. An id of 0 asks the store to assign one.
    fn insert(&mut self, row: &HabitRow) -> Result<i64, TrackerError>;

    /// Replace the row with the same id
    ///
    /// Fails with [`TrackerError::NotFound`] when no such row exists.
    fn update(&mut self, row: &HabitRow) -> Result<(), TrackerError>;

    /// Fetch a row by id
    fn get(&self, id: i64) -> Result<Option<HabitRow>, TrackerError>;

    /// All rows, newest `created_at` first
    fn all(&self) -> Result<Vec<HabitRow>, TrackerError>;

    /// Delete a row by id, returning whether it existed
    fn delete(&mut self, id: i64) -> Result<bool, TrackerError>;
}
