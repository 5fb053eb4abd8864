//! History port: Trait for the append-only prediction log.

use crate::domain::HistoryRecord;

/// Trait for prediction history storage.
///
/// Rows are only ever appended. Nothing in this crate updates or deletes them.
pub trait HistoryStore: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Append one record. Concurrent callers are serialized.
    ///
    /// # Errors
    /// Returns error if the record cannot be written.
    fn append(&self, record: &HistoryRecord) -> Result<(), Self::Error>;

    /// Load every record in insertion order.
    ///
    /// # Errors
    /// Returns error if storage cannot be read.
    fn load_all(&self) -> Result<Vec<HistoryRecord>, Self::Error>;

    /// Number of stored records.
    ///
    /// # Errors
    /// Returns error if storage cannot be read.
    fn count(&self) -> Result<usize, Self::Error> {
        Ok(self.load_all()?.len())
    }
}
