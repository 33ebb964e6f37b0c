//! SQLite-backed habit row store

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::RowStore;
use crate::error::TrackerError;
use crate::types::HabitRow;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS habits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    renewalHours INTEGER NOT NULL,
    createdAt TEXT NOT NULL,
    updatedAt TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_habits_created_at ON habits(createdAt);
";

const SELECT_COLUMNS: &str = "SELECT id, name, type, renewalHours, createdAt, updatedAt FROM habits";

/// Habit rows in a SQLite database
pub struct SqliteRowStore {
    conn: Connection,
}

impl SqliteRowStore {
    /// Open or create a database file, creating parent directories as needed
    pub fn open(db_path: &Path) -> Result<Self, TrackerError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;")?;
        Self::with_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, TrackerError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, TrackerError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Underlying connection, for maintenance queries
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HabitRow> {
        Ok(HabitRow {
            id: row.get(0)?,
            name: row.get(1)?,
            habit_type: row.get(2)?,
            renewal_hours: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl RowStore for SqliteRowStore {
    fn insert(&mut self, row: &HabitRow) -> Result<i64, TrackerError> {
        if row.id == 0 {
            self.conn.execute(
                "INSERT INTO habits (name, type, renewalHours, createdAt, updatedAt)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    row.name,
                    row.habit_type,
                    row.renewal_hours,
                    row.created_at,
                    row.updated_at
                ],
            )?;
        } else {
            self.conn.execute(
                "INSERT INTO habits (id, name, type, renewalHours, createdAt, updatedAt)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    row.id,
                    row.name,
                    row.habit_type,
                    row.renewal_hours,
                    row.created_at,
                    row.updated_at
                ],
            )?;
        }
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&mut self, row: &HabitRow) -> Result<(), TrackerError> {
        let changed = self.conn.execute(
            "UPDATE habits
             SET name = ?2, type = ?3, renewalHours = ?4, createdAt = ?5, updatedAt = ?6
             WHERE id = ?1",
            params![
                row.id,
                row.name,
                row.habit_type,
                row.renewal_hours,
                row.created_at,
                row.updated_at
            ],
        )?;
        if changed == 0 {
            return Err(TrackerError::NotFound(row.id));
        }
        Ok(())
    }

    fn get(&self, id: i64) -> Result<Option<HabitRow>, TrackerError> {
        let row = self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    fn all(&self) -> Result<Vec<HabitRow>, TrackerError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY createdAt DESC, id DESC"))?;
        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn delete(&mut self, id: i64) -> Result<bool, TrackerError> {
        let changed = self
            .conn
            .execute("DELETE FROM habits WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(name: &str, created_at: &str) -> HabitRow {
        HabitRow {
            id: 0,
            name: name.to_string(),
            habit_type: "BOOLEAN".to_string(),
            renewal_hours: 24,
            created_at: created_at.to_string(),
            updated_at: created_at.to_string(),
        }
    }

    #[test]
    fn test_insert_assigns_ids() {
        let mut store = SqliteRowStore::open_in_memory().unwrap();
        let first = store.insert(&row("Run", "2024-01-01T08:00:00")).unwrap();
        let second = store.insert(&row("Read", "2024-01-02T08:00:00")).unwrap();
        assert!(first > 0);
        assert!(second > first);

        let fetched = store.get(first).unwrap().unwrap();
        assert_eq!(fetched.name, "Run");
        assert_eq!(fetched.id, first);
    }

    #[test]
    fn test_insert_with_explicit_id() {
        let mut store = SqliteRowStore::open_in_memory().unwrap();
        let mut explicit = row("Water", "2024-01-01T08:00:00");
        explicit.id = 42;
        assert_eq!(store.insert(&explicit).unwrap(), 42);

        // Duplicate primary key is a storage error
        assert!(matches!(
            store.insert(&explicit),
            Err(TrackerError::Storage(_))
        ));
    }

    #[test]
    fn test_all_newest_first() {
        let mut store = SqliteRowStore::open_in_memory().unwrap();
        store.insert(&row("Old", "2023-05-01T08:00:00")).unwrap();
        store.insert(&row("New", "2024-05-01T08:00:00")).unwrap();
        store.insert(&row("Mid", "2024-01-01T08:00:00.5")).unwrap();

        let names: Vec<String> = store.all().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["New", "Mid", "Old"]);
    }

    #[test]
    fn test_update_and_delete() {
        let mut store = SqliteRowStore::open_in_memory().unwrap();
        let id = store.insert(&row("Run", "2024-01-01T08:00:00")).unwrap();

        let mut changed = store.get(id).unwrap().unwrap();
        changed.habit_type = "NUMERIC|km|5.0||".to_string();
        store.update(&changed).unwrap();
        assert_eq!(store.get(id).unwrap().unwrap(), changed);

        assert!(store.delete(id).unwrap());
        assert!(!store.delete(id).unwrap());
        assert_eq!(store.get(id).unwrap(), None);
    }

    #[test]
    fn test_update_missing_row() {
        let mut store = SqliteRowStore::open_in_memory().unwrap();
        let mut missing = row("Ghost", "2024-01-01T08:00:00");
        missing.id = 7;
        assert!(matches!(
            store.update(&missing),
            Err(TrackerError::NotFound(7))
        ));
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("habits.db");

        let id = {
            let mut store = SqliteRowStore::open(&path).unwrap();
            store.insert(&row("Run", "2024-01-01T08:00:00")).unwrap()
        };

        let store = SqliteRowStore::open(&path).unwrap();
        assert_eq!(store.get(id).unwrap().unwrap().name, "Run");
    }
}
