//! Glucorisk: diabetes risk assessment in the terminal.
//!
//! Main entry point for the terminal application.

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use glucorisk::adapters::model::load_classifier;
use glucorisk::adapters::sanitize::SanitizingMakeWriter;
use glucorisk::adapters::HistoryBackend;
use glucorisk::application::AssessmentService;
use glucorisk::config::AppConfig;
use glucorisk::tui::App;

fn main() -> Result<()> {
    let config = AppConfig::from_env()?;

    // Writing logs to the terminal corrupts the TUI (alternate screen), so an
    // interactive session logs to a file unless told otherwise.
    let (writer, _guard) = if config.log_mode.use_file(std::io::stdout().is_terminal()) {
        if let Some(parent) = config.log_file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting Glucorisk...");

    // Refuse to start without a usable model.
    let classifier = load_classifier(&config.model_path, config.require_model_manifest)
        .map_err(|e| anyhow!("Failed to load model from {:?}: {}", config.model_path, e))?;

    let history = HistoryBackend::open(config.history_backend, &config.history_path)?;
    let backend_kind = history.kind();
    tracing::info!(
        "History backend {} at {:?} (persist={})",
        backend_kind,
        config.history_path,
        config.persist_history
    );

    let service = AssessmentService::new(classifier, Arc::new(history))
        .with_persistence(config.persist_history);

    let model_label = config
        .model_path
        .file_name()
        .map_or_else(
            || config.model_path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        );

    let mut app = App::new(service, model_label, backend_kind, config.report_dir.clone());
    app.run()?;

    tracing::info!("Glucorisk shutdown complete.");
    Ok(())
}
