//! CSV adapter: Implementation of HistoryStore on an append-only CSV file.
//!
//! The file carries the header
//! `Timestamp,Glucose,BloodPressure,BMI,Age,Prediction` and is created on
//! first append.
//!
//! # Append Behavior
//!
//! Appends within a process are serialized by a `Mutex`; appends from other
//! processes are serialized by an exclusive advisory lock on the file, held
//! across the header check and the write. Each row is formatted into memory
//! first and handed to the OS in a single `write_all`.
//!
//! Reads take a shared lock and skip rows that do not parse.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use csv::{ReaderBuilder, WriterBuilder};
use fd_lock::RwLock;

use super::StorageError;
use crate::domain::HistoryRecord;
use crate::ports::HistoryStore;

/// CSV history log.
pub struct CsvHistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvHistoryStore {
    /// Create a store backed by `path`. The file is not touched until the first append.
    #[must_use]
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Format one record (and the header when `with_header`) into a buffer.
    fn encode(record: &HistoryRecord, with_header: bool) -> Result<Vec<u8>, StorageError> {
        let mut buf = Vec::new();
        {
            let mut writer = WriterBuilder::new()
                .has_headers(with_header)
                .from_writer(&mut buf);
            writer.serialize(record)?;
            writer.flush()?;
        }
        Ok(buf)
    }
}

impl HistoryStore for CsvHistoryStore {
    type Error = StorageError;

    fn append(&self, record: &HistoryRecord) -> Result<(), Self::Error> {
        let _guard = self.write_lock.lock().expect("Lock failed");

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut lock = RwLock::new(file);
        let mut file = lock.write()?;

        // Checked under the lock so only the first writer adds the header.
        let needs_header = file.metadata()?.len() == 0;

        let bytes = Self::encode(record, needs_header)?;
        file.write_all(&bytes)?;
        file.flush()?;

        tracing::debug!("Appended history row to {:?}", self.path);
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<HistoryRecord>, Self::Error> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let lock = RwLock::new(File::open(&self.path)?);
        let file = lock.read()?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(&*file);

        let mut records = Vec::new();
        for (index, row) in reader.deserialize::<HistoryRecord>().enumerate() {
            match row {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("Skipping unreadable history row {}: {}", index + 1, e),
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RiskCategory;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::tempdir;

    fn record(glucose: f64, prediction: RiskCategory) -> HistoryRecord {
        HistoryRecord {
            timestamp: Utc::now(),
            glucose,
            blood_pressure: 80.0,
            bmi: 24.5,
            age: 41,
            prediction,
        }
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let dir = tempdir().expect("tempdir");
        let store = CsvHistoryStore::new(dir.path().join("history.csv"));
        assert!(store.load_all().expect("Should load").is_empty());
        assert_eq!(store.count().expect("Should count"), 0);
    }

    #[test]
    fn test_append_writes_header_once() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("logs").join("history.csv");
        let store = CsvHistoryStore::new(&path);

        let first = record(110.0, RiskCategory::Low);
        let mut second = record(190.0, RiskCategory::High);
        second.timestamp = first.timestamp + Duration::seconds(1);

        store.append(&first).expect("Should append");
        store.append(&second).expect("Should append");

        let content = std::fs::read_to_string(&path).expect("Should read");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Timestamp,Glucose,BloodPressure,BMI,Age,Prediction");
        assert!(lines[2].ends_with(",High"));

        let loaded = store.load_all().expect("Should load");
        assert_eq!(loaded, vec![first, second]);
    }

    #[test]
    fn test_reads_legacy_prediction_labels() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("legacy.csv");
        std::fs::write(
            &path,
            "Timestamp,Glucose,BloodPressure,BMI,Age,Prediction\n\
             2024-03-01T10:00:00Z,148,72,33.6,50,Diabetic\n\
             2024-03-02T10:00:00Z,85,66,26.6,31,Non-Diabetic\n",
        )
        .expect("write");

        let store = CsvHistoryStore::new(&path);
        let loaded = store.load_all().expect("Should load");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].prediction, RiskCategory::High);
        assert_eq!(loaded[1].prediction, RiskCategory::Low);
        assert_eq!(loaded[1].age, 31);
    }

    #[test]
    fn test_concurrent_appends_keep_rows_intact() {
        let dir = tempdir().expect("tempdir");
        let store = std::sync::Arc::new(CsvHistoryStore::new(dir.path().join("history.csv")));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        store
                            .append(&record(100.0 + f64::from(i), RiskCategory::Low))
                            .expect("Should append");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread");
        }

        assert_eq!(store.load_all().expect("Should load").len(), 80);
    }

    #[test]
    fn test_separate_stores_write_one_header() {
        let dir = tempdir().expect("tempdir");

        for trial in 0..50 {
            let path = dir.path().join(format!("race-{trial}.csv"));
            let barrier = std::sync::Arc::new(std::sync::Barrier::new(2));

            let handles: Vec<_> = [110.0, 190.0]
                .into_iter()
                .map(|glucose| {
                    // Each writer has its own store, so only the file lock orders them.
                    let store = CsvHistoryStore::new(&path);
                    let barrier = barrier.clone();
                    std::thread::spawn(move || {
                        barrier.wait();
                        store
                            .append(&record(glucose, RiskCategory::Low))
                            .expect("Should append");
                    })
                })
                .collect();
            for handle in handles {
                handle.join().expect("thread");
            }

            let content = std::fs::read_to_string(&path).expect("Should read");
            assert_eq!(content.matches("Timestamp,").count(), 1, "trial {trial}");
            assert!(
                content.starts_with("Timestamp,Glucose,BloodPressure,BMI,Age,Prediction\n"),
                "trial {trial}"
            );

            let loaded = CsvHistoryStore::new(&path).load_all().expect("Should load");
            assert_eq!(loaded.len(), 2, "trial {trial}");
        }
    }

    #[test]
    fn test_load_skips_bad_rows_and_reads_naive_timestamps() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("mixed.csv");
        std::fs::write(
            &path,
            "Timestamp,Glucose,BloodPressure,BMI,Age,Prediction\n\
             2024-03-01T09:00:00Z,120,70,25.0,40,Low\n\
             Timestamp,Glucose,BloodPressure,BMI,Age,Prediction\n\
             2024-03-01 10:00:00,148,72,33.6,50,Diabetic\n\
             not-a-date,abc,70,25.0,40,Low\n\
             2024-03-02T10:00:00+02:00,85,66,26.6,31,Non-Diabetic\n",
        )
        .expect("write");

        let store = CsvHistoryStore::new(&path);
        let loaded = store.load_all().expect("Should load");

        assert_eq!(loaded.len(), 3);
        assert_eq!(
            loaded[1].timestamp,
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(loaded[1].prediction, RiskCategory::High);
        assert_eq!(
            loaded[2].timestamp,
            Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap()
        );
        assert_eq!(store.count().expect("Should count"), 3);
    }
}
