//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `model`: JSON classifier exports (logistic regression, random forest)
//! - `csv_store`: CSV history log
//! - `sqlite`: SQLite history log
//! - `sanitize`: PII filtering for logs

pub mod csv_store;
pub mod model;
pub mod sanitize;
pub mod sqlite;

use std::path::Path;

use crate::domain::HistoryRecord;
use crate::ports::HistoryStore;

/// Error type for history storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt history row {row}: {reason}")]
    Corrupt { row: usize, reason: String },
}

/// History storage selected by configuration.
pub enum HistoryBackend {
    Csv(csv_store::CsvHistoryStore),
    Sqlite(sqlite::SqliteHistoryStore),
}

impl HistoryBackend {
    /// Open the backend named `kind` (`csv` or `sqlite`) at `path`.
    ///
    /// # Errors
    /// Returns error if the store cannot be opened.
    pub fn open(
        kind: crate::config::HistoryBackendKind,
        path: &Path,
    ) -> Result<Self, StorageError> {
        match kind {
            crate::config::HistoryBackendKind::Csv => {
                Ok(Self::Csv(csv_store::CsvHistoryStore::new(path)))
            }
            crate::config::HistoryBackendKind::Sqlite => {
                Ok(Self::Sqlite(sqlite::SqliteHistoryStore::new(path)?))
            }
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Csv(_) => "csv",
            Self::Sqlite(_) => "sqlite",
        }
    }
}

impl HistoryStore for HistoryBackend {
    type Error = StorageError;

    fn append(&self, record: &HistoryRecord) -> Result<(), Self::Error> {
        match self {
            Self::Csv(store) => store.append(record),
            Self::Sqlite(store) => store.append(record),
        }
    }

    fn load_all(&self) -> Result<Vec<HistoryRecord>, Self::Error> {
        match self {
            Self::Csv(store) => store.load_all(),
            Self::Sqlite(store) => store.load_all(),
        }
    }

    fn count(&self) -> Result<usize, Self::Error> {
        match self {
            Self::Csv(store) => store.count(),
            Self::Sqlite(store) => store.count(),
        }
    }
}
