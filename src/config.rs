//! Runtime configuration from `GLUCORISK_*` environment variables.
//!
//! | variable | default |
//! |---|---|
//! | `GLUCORISK_MODEL_PATH` | `models/diabetes_model.json` |
//! | `GLUCORISK_REQUIRE_MODEL_MANIFEST` | `false` |
//! | `GLUCORISK_HISTORY_BACKEND` | `csv` |
//! | `GLUCORISK_HISTORY_PATH` | `prediction_history.csv` (`.db` for sqlite) |
//! | `GLUCORISK_PERSIST_HISTORY` | `true` |
//! | `GLUCORISK_REPORT_DIR` | `reports` |
//! | `GLUCORISK_LOG_MODE` | `auto` |
//! | `GLUCORISK_LOG_FILE` | `glucorisk.log` |

use std::path::PathBuf;

use crate::GlucoriskError;

pub const DEFAULT_MODEL_PATH: &str = "models/diabetes_model.json";
pub const DEFAULT_CSV_HISTORY_PATH: &str = "prediction_history.csv";
pub const DEFAULT_SQLITE_HISTORY_PATH: &str = "prediction_history.db";
pub const DEFAULT_REPORT_DIR: &str = "reports";
pub const DEFAULT_LOG_FILE: &str = "glucorisk.log";

/// Which history store to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryBackendKind {
    #[default]
    Csv,
    Sqlite,
}

impl std::str::FromStr for HistoryBackendKind {
    type Err = GlucoriskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(GlucoriskError::Config(format!(
                "unknown history backend {other:?} (expected csv or sqlite)"
            ))),
        }
    }
}

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// File when stdout is a terminal, stdout otherwise.
    #[default]
    Auto,
    File,
    Stdout,
}

impl LogMode {
    fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Auto,
        }
    }

    /// Resolve `Auto` against whether stdout is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub require_model_manifest: bool,
    pub history_backend: HistoryBackendKind,
    pub history_path: PathBuf,
    pub persist_history: bool,
    pub report_dir: PathBuf,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            require_model_manifest: false,
            history_backend: HistoryBackendKind::Csv,
            history_path: PathBuf::from(DEFAULT_CSV_HISTORY_PATH),
            persist_history: true,
            report_dir: PathBuf::from(DEFAULT_REPORT_DIR),
            log_mode: LogMode::Auto,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns `Config` for an unknown history backend.
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns `Config` for an unknown history backend.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let history_backend = var("GLUCORISK_HISTORY_BACKEND")
            .map(|v| v.parse::<HistoryBackendKind>())
            .transpose()?
            .unwrap_or_default();

        let history_path = var("GLUCORISK_HISTORY_PATH").map_or_else(
            || match history_backend {
                HistoryBackendKind::Csv => PathBuf::from(DEFAULT_CSV_HISTORY_PATH),
                HistoryBackendKind::Sqlite => PathBuf::from(DEFAULT_SQLITE_HISTORY_PATH),
            },
            PathBuf::from,
        );

        Ok(Self {
            model_path: var("GLUCORISK_MODEL_PATH").map_or(defaults.model_path, PathBuf::from),
            require_model_manifest: var("GLUCORISK_REQUIRE_MODEL_MANIFEST")
                .is_some_and(|v| parse_bool(&v)),
            history_backend,
            history_path,
            persist_history: var("GLUCORISK_PERSIST_HISTORY")
                .map_or(defaults.persist_history, |v| parse_bool(&v)),
            report_dir: var("GLUCORISK_REPORT_DIR").map_or(defaults.report_dir, PathBuf::from),
            log_mode: var("GLUCORISK_LOG_MODE").map_or(defaults.log_mode, |v| LogMode::parse(&v)),
            log_file: var("GLUCORISK_LOG_FILE").map_or(defaults.log_file, PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.history_path, PathBuf::from("prediction_history.csv"));
        assert!(config.persist_history);
        assert!(!config.require_model_manifest);
    }

    #[test]
    fn test_sqlite_backend_changes_default_path() {
        let config = AppConfig::from_lookup(lookup(&[("GLUCORISK_HISTORY_BACKEND", "SQLite")]))
            .expect("config");
        assert_eq!(config.history_backend, HistoryBackendKind::Sqlite);
        assert_eq!(config.history_path, PathBuf::from("prediction_history.db"));
    }

    #[test]
    fn test_explicit_values() {
        let config = AppConfig::from_lookup(lookup(&[
            ("GLUCORISK_MODEL_PATH", "/srv/models/rf.json"),
            ("GLUCORISK_REQUIRE_MODEL_MANIFEST", "YES"),
            ("GLUCORISK_HISTORY_PATH", "/tmp/h.csv"),
            ("GLUCORISK_PERSIST_HISTORY", "0"),
            ("GLUCORISK_LOG_MODE", "stdout"),
        ]))
        .expect("config");

        assert_eq!(config.model_path, PathBuf::from("/srv/models/rf.json"));
        assert!(config.require_model_manifest);
        assert_eq!(config.history_path, PathBuf::from("/tmp/h.csv"));
        assert!(!config.persist_history);
        assert_eq!(config.log_mode, LogMode::Stdout);
    }

    #[test]
    fn test_unknown_backend_is_error() {
        let err = AppConfig::from_lookup(lookup(&[("GLUCORISK_HISTORY_BACKEND", "postgres")]))
            .expect_err("must fail");
        assert!(matches!(err, GlucoriskError::Config(_)));
    }

    #[test]
    fn test_log_mode_resolution() {
        assert!(LogMode::Auto.use_file(true));
        assert!(!LogMode::Auto.use_file(false));
        assert!(LogMode::File.use_file(false));
        assert!(!LogMode::Stdout.use_file(true));
        assert_eq!(LogMode::parse("bogus"), LogMode::Auto);
    }
}
