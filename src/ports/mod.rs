//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (the model, the history log).

mod classifier;
mod history;

pub use classifier::{ClassifierCapability, ClassifierError, LabelPredictor, ProbabilityPredictor};
pub use history::HistoryStore;
