//! SQLite adapter: Implementation of HistoryStore.
//!
//! Provides an append-only `history` table as an alternative to the CSV log.
//!
//! # Mutex Behavior
//!
//! Database connection is protected by `Mutex`. A poisoned mutex (from panic
//! in another thread) will cause panic, failing fast rather than writing
//! after a half-finished append.
use std::path::Path;
use std::sync::Mutex;

use chrono::SecondsFormat;
use rusqlite::{params, Connection};

use super::StorageError;
use crate::domain::{parse_timestamp, HistoryRecord, RiskCategory};
use crate::ports::HistoryStore;

/// SQLite history adapter.
pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock().expect("Lock failed");

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                glucose REAL NOT NULL,
                blood_pressure REAL NOT NULL,
                bmi REAL NOT NULL,
                age INTEGER NOT NULL,
                prediction TEXT NOT NULL
            );
            ",
        )?;

        Ok(())
    }

    fn prediction_to_string(category: RiskCategory) -> &'static str {
        match category {
            RiskCategory::Low => "Low",
            RiskCategory::High => "High",
        }
    }

    fn string_to_prediction(row: usize, s: &str) -> Result<RiskCategory, StorageError> {
        match s {
            "Low" | "Non-Diabetic" | "0" => Ok(RiskCategory::Low),
            "High" | "Diabetic" | "1" => Ok(RiskCategory::High),
            other => Err(StorageError::Corrupt {
                row,
                reason: format!("unknown prediction {other:?}"),
            }),
        }
    }
}

impl HistoryStore for SqliteHistoryStore {
    type Error = StorageError;

    fn append(&self, record: &HistoryRecord) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        conn.execute(
            r"
            INSERT INTO history (
                timestamp, glucose, blood_pressure, bmi, age, prediction
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                record
                    .timestamp
                    .to_rfc3339_opts(SecondsFormat::AutoSi, true),
                record.glucose,
                record.blood_pressure,
                record.bmi,
                i64::from(record.age),
                Self::prediction_to_string(record.prediction),
            ],
        )?;

        tracing::debug!("Saved history row to storage");
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<HistoryRecord>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let mut stmt = conn.prepare(
            r"
            SELECT id, timestamp, glucose, blood_pressure, bmi, age, prediction
            FROM history
            ORDER BY id ASC
            ",
        )?;

        let rows = stmt
            .query_map([], |row| {
                let id: i64 = row.get(0)?;
                let timestamp: String = row.get(1)?;
                let glucose: f64 = row.get(2)?;
                let blood_pressure: f64 = row.get(3)?;
                let bmi: f64 = row.get(4)?;
                let age: i64 = row.get(5)?;
                let prediction: String = row.get(6)?;
                Ok((id, timestamp, glucose, blood_pressure, bmi, age, prediction))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, timestamp, glucose, blood_pressure, bmi, age, prediction)| {
                let row = id as usize;
                let timestamp =
                    parse_timestamp(&timestamp).ok_or_else(|| StorageError::Corrupt {
                        row,
                        reason: format!("invalid timestamp {timestamp:?}"),
                    })?;
                let age = u32::try_from(age).map_err(|_| StorageError::Corrupt {
                    row,
                    reason: format!("invalid age {age}"),
                })?;

                Ok(HistoryRecord {
                    timestamp,
                    glucose,
                    blood_pressure,
                    bmi,
                    age,
                    prediction: Self::string_to_prediction(row, &prediction)?,
                })
            })
            .collect()
    }

    fn count(&self) -> Result<usize, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;

        Ok(count as usize)
    }
}
