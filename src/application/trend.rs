//! History trend: aggregate view over the prediction log.

use crate::domain::{HistoryRecord, RiskCategory};

/// Glucose change smaller than this (mg/dL) counts as stable.
const STABLE_GLUCOSE_DELTA: f64 = 5.0;

/// Number of rows kept for the "recent" table.
pub const RECENT_ROWS: usize = 10;

/// Direction of glucose between the first and last recorded submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Rising,
    Falling,
    Stable,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rising => write!(f, "rising"),
            Self::Falling => write!(f, "falling"),
            Self::Stable => write!(f, "stable"),
        }
    }
}

/// Summary of all history rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryTrend {
    pub total: usize,
    pub low: usize,
    pub high: usize,
    /// Glucose per submission, oldest first.
    pub glucose: Vec<f64>,
    /// BMI per submission, oldest first.
    pub bmi: Vec<f64>,
    pub mean_glucose: Option<f64>,
    pub mean_bmi: Option<f64>,
    pub glucose_direction: Option<Direction>,
    /// Up to [`RECENT_ROWS`] rows, newest first.
    pub recent: Vec<HistoryRecord>,
}

impl HistoryTrend {
    /// Build the trend from rows in any order; they are sorted by timestamp.
    #[must_use]
    pub fn from_records(records: &[HistoryRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let mut sorted: Vec<&HistoryRecord> = records.iter().collect();
        sorted.sort_by_key(|r| r.timestamp);

        let high = sorted
            .iter()
            .filter(|r| r.prediction == RiskCategory::High)
            .count();
        let glucose: Vec<f64> = sorted.iter().map(|r| r.glucose).collect();
        let bmi: Vec<f64> = sorted.iter().map(|r| r.bmi).collect();

        let glucose_direction = match (glucose.first(), glucose.last()) {
            (Some(first), Some(last)) if glucose.len() > 1 => {
                let delta = last - first;
                Some(if delta.abs() < STABLE_GLUCOSE_DELTA {
                    Direction::Stable
                } else if delta > 0.0 {
                    Direction::Rising
                } else {
                    Direction::Falling
                })
            }
            _ => None,
        };

        Self {
            total: sorted.len(),
            low: sorted.len() - high,
            high,
            mean_glucose: mean(&glucose),
            mean_bmi: mean(&bmi),
            glucose,
            bmi,
            glucose_direction,
            recent: sorted
                .iter()
                .rev()
                .take(RECENT_ROWS)
                .map(|r| (*r).clone())
                .collect(),
        }
    }

    /// Share of `High` predictions in `[0, 1]`.
    #[must_use]
    pub fn high_share(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.high as f64 / self.total as f64
        }
    }

    #[must_use]
    pub fn latest(&self) -> Option<&HistoryRecord> {
        self.recent.first()
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn row(minutes: i64, glucose: f64, bmi: f64, prediction: RiskCategory) -> HistoryRecord {
        HistoryRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
                + Duration::minutes(minutes),
            glucose,
            blood_pressure: 80.0,
            bmi,
            age: 45,
            prediction,
        }
    }

    #[test]
    fn test_empty_history() {
        let trend = HistoryTrend::from_records(&[]);
        assert_eq!(trend.total, 0);
        assert!(trend.mean_glucose.is_none());
        assert!(trend.latest().is_none());
        assert_eq!(trend.high_share(), 0.0);
    }

    #[test]
    fn test_counts_means_and_order() {
        // Deliberately out of order.
        let records = vec![
            row(20, 160.0, 31.0, RiskCategory::High),
            row(0, 100.0, 25.0, RiskCategory::Low),
            row(10, 130.0, 28.0, RiskCategory::Low),
        ];
        let trend = HistoryTrend::from_records(&records);

        assert_eq!(trend.total, 3);
        assert_eq!(trend.low, 2);
        assert_eq!(trend.high, 1);
        assert_eq!(trend.glucose, vec![100.0, 130.0, 160.0]);
        assert!((trend.mean_glucose.expect("mean") - 130.0).abs() < 1e-9);
        assert!((trend.mean_bmi.expect("mean") - 28.0).abs() < 1e-9);
        assert_eq!(trend.glucose_direction, Some(Direction::Rising));
        assert!((trend.latest().expect("latest").glucose - 160.0).abs() < 1e-9);
        assert!((trend.high_share() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_direction_stable_and_falling() {
        let stable = HistoryTrend::from_records(&[
            row(0, 120.0, 25.0, RiskCategory::Low),
            row(1, 123.0, 25.0, RiskCategory::Low),
        ]);
        assert_eq!(stable.glucose_direction, Some(Direction::Stable));

        let falling = HistoryTrend::from_records(&[
            row(0, 180.0, 25.0, RiskCategory::High),
            row(1, 120.0, 25.0, RiskCategory::Low),
        ]);
        assert_eq!(falling.glucose_direction, Some(Direction::Falling));

        let single = HistoryTrend::from_records(&[row(0, 180.0, 25.0, RiskCategory::High)]);
        assert!(single.glucose_direction.is_none());
    }

    #[test]
    fn test_recent_is_capped_newest_first() {
        let records: Vec<_> = (0..15)
            .map(|i| row(i, 100.0 + i as f64, 25.0, RiskCategory::Low))
            .collect();
        let trend = HistoryTrend::from_records(&records);
        assert_eq!(trend.recent.len(), RECENT_ROWS);
        assert!((trend.recent[0].glucose - 114.0).abs() < 1e-9);
        assert_eq!(trend.glucose.len(), 15);
    }
}
