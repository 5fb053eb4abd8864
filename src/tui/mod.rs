//! TUI module: Terminal User Interface using Ratatui.
//!
//! Screens:
//! - Dashboard with model and history status
//! - Health metric intake form
//! - Prediction result with report export
//! - History trend

mod app;
mod styles;
mod ui;

pub use app::{App, Screen};
pub use styles::Theme;
