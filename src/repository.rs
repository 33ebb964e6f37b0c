//! Habit repository
//!
//! This module provides the public persistence API. It maps domain [`Habit`]s
//! to the text rows a [`RowStore`] keeps, encoding the habit type and
//! timestamps on the way in and decoding them on the way out.
//!
//! A row that fails to decode is never coerced into a default value. Strict
//! reads fail with the decode error; [`HabitRepository::get_all_habits_lenient`]
//! sets such rows aside and reports them.

use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

use crate::codec::{decode_date_time, encode_date_time, HabitTypeCodec};
use crate::error::TrackerError;
use crate::store::{MemoryRowStore, RowStore, SqliteRowStore};
use crate::types::{Habit, HabitRow};

/// A stored row that could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorruptRow {
    pub id: i64,
    pub reason: String,
}

/// Habits read with corrupt rows set aside
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HabitListing {
    pub habits: Vec<Habit>,
    pub corrupt: Vec<CorruptRow>,
}

/// Encode a habit into its persisted row
pub fn habit_to_row(habit: &Habit) -> HabitRow {
    HabitRow {
        id: habit.id,
        name: habit.name.clone(),
        habit_type: HabitTypeCodec::encode(&habit.habit_type),
        renewal_hours: i64::from(habit.renewal_hours),
        created_at: encode_date_time(&habit.created_at),
        updated_at: encode_date_time(&habit.updated_at),
    }
}

/// Decode a persisted row into a habit
pub fn row_to_habit(row: &HabitRow) -> Result<Habit, TrackerError> {
    let renewal_hours = u32::try_from(row.renewal_hours).map_err(|_| {
        TrackerError::InvalidHabit(format!(
            "row {} has invalid renewal hours {}",
            row.id, row.renewal_hours
        ))
    })?;

    Ok(Habit {
        id: row.id,
        name: row.name.clone(),
        habit_type: HabitTypeCodec::decode(&row.habit_type)?,
        renewal_hours,
        created_at: decode_date_time(&row.created_at)?,
        updated_at: decode_date_time(&row.updated_at)?,
    })
}

/// Habit persistence over a row store
pub struct HabitRepository<S: RowStore> {
    store: S,
}

impl HabitRepository<SqliteRowStore> {
    /// Repository backed by a SQLite database file
    pub fn open(db_path: &Path) -> Result<Self, TrackerError> {
        debug!(db_path = %db_path.display(), "opening habit database");
        Ok(Self::new(SqliteRowStore::open(db_path)?))
    }
}

impl HabitRepository<MemoryRowStore> {
    /// Repository that keeps everything in memory
    pub fn in_memory() -> Self {
        Self::new(MemoryRowStore::new())
    }
}

impl<S: RowStore> HabitRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying row store
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// All habits, newest first; fails on the first corrupt row
    pub fn get_all_habits(&self) -> Result<Vec<Habit>, TrackerError> {
        self.store.all()?.iter().map(row_to_habit).collect()
    }

    /// All decodable habits, newest first, with corrupt rows listed separately
    pub fn get_all_habits_lenient(&self) -> Result<HabitListing, TrackerError> {
        let mut listing = HabitListing::default();

        for row in self.store.all()? {
            match row_to_habit(&row) {
                Ok(habit) => listing.habits.push(habit),
                Err(e) => {
                    warn!(id = row.id, error = %e, "skipping corrupt habit row");
                    listing.corrupt.push(CorruptRow {
                        id: row.id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(listing)
    }

    pub fn get_habit_by_id(&self, id: i64) -> Result<Option<Habit>, TrackerError> {
        self.store.get(id)?.as_ref().map(row_to_habit).transpose()
    }

    /// Store a new habit and return its id
    pub fn insert_habit(&mut self, habit: &Habit) -> Result<i64, TrackerError> {
        habit.habit_type.validate()?;
        let id = self.store.insert(&habit_to_row(habit))?;
        debug!(id, name = %habit.name, "inserted habit");
        Ok(id)
    }

    pub fn update_habit(&mut self, habit: &Habit) -> Result<(), TrackerError> {
        habit.habit_type.validate()?;
        self.store.update(&habit_to_row(habit))?;
        debug!(id = habit.id, "updated habit");
        Ok(())
    }

    /// Delete a habit, returning whether it existed
    pub fn delete_habit(&mut self, id: i64) -> Result<bool, TrackerError> {
        let deleted = self.store.delete(id)?;
        debug!(id, deleted, "deleted habit");
        Ok(deleted)
    }
}
