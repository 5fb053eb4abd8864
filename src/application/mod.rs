//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod assessment;
pub mod report;
pub mod trend;

pub use assessment::{Assessment, AssessmentService};
pub use report::{build_csv_report, build_report, export_report, ReportFormat};
pub use trend::HistoryTrend;
