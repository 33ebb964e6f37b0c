//! In-memory habit row store

use std::collections::BTreeMap;

use super::RowStore;
use crate::error::TrackerError;
use crate::types::HabitRow;

/// Habit rows kept in a map; nothing survives the process
#[derive(Debug, Clone, Default)]
pub struct MemoryRowStore {
    rows: BTreeMap<i64, HabitRow>,
    last_id: i64,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RowStore for MemoryRowStore {
    fn insert(&mut self, row: &HabitRow) -> Result<i64, TrackerError> {
        let id = if row.id == 0 { self.last_id + 1 } else { row.id };
        if self.rows.contains_key(&id) {
            return Err(TrackerError::InvalidHabit(format!(
                "habit id {id} already exists"
            )));
        }

        self.last_id = self.last_id.max(id);
        self.rows.insert(id, HabitRow { id, ..row.clone() });
        Ok(id)
    }

    fn update(&mut self, row: &HabitRow) -> Result<(), TrackerError> {
        match self.rows.get_mut(&row.id) {
            Some(existing) => {
                *existing = row.clone();
                Ok(())
            }
            None => Err(TrackerError::NotFound(row.id)),
        }
    }

    fn get(&self, id: i64) -> Result<Option<HabitRow>, TrackerError> {
        Ok(self.rows.get(&id).cloned())
    }

    fn all(&self) -> Result<Vec<HabitRow>, TrackerError> {
        let mut rows: Vec<HabitRow> = self.rows.values().cloned().collect();
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(rows)
    }

    fn delete(&mut self, id: i64) -> Result<bool, TrackerError> {
        Ok(self.rows.remove(&id).is_some())
    }
}
