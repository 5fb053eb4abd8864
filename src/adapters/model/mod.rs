//! Model adapter: loads a JSON classifier export into a [`ClassifierCapability`].
//!
//! # Integrity
//!
//! When a `manifest.json` sits next to the model file, every file it lists
//! is hashed with SHA-256 and compared in constant time before the model is
//! parsed. The model file itself must be listed. A missing manifest is
//! tolerated unless `require_manifest` is set, in which case loading fails
//! closed.
//!
//! The manifest is written by the `hash_model` binary.

mod estimator;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use estimator::{DecisionTree, ForestModel, LogisticModel};

use crate::domain::{FEATURE_COUNT, FEATURE_NAMES};
use crate::ports::ClassifierCapability;

/// Only export version understood by this loader.
pub const FORMAT_VERSION: u32 = 1;

/// File name of the integrity manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Errors raised while loading a model export.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error reading model: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid model JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unsupported model format version {0}")]
    UnsupportedVersion(u32),

    #[error("Feature mismatch: expected {expected:?}, got {actual:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Invalid estimator: {0}")]
    InvalidEstimator(String),

    #[error("Model integrity check failed: {0}")]
    Integrity(String),
}

/// Call shape the export advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportedCapability {
    Probability,
    HardLabel,
}

/// Estimator parameters, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    Logistic(LogisticModel),
    Forest(ForestModel),
}

/// Top-level JSON export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelExport {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub capability: ExportedCapability,
    pub estimator: Estimator,
}

impl ModelExport {
    /// Check version, feature order, and estimator shape.
    ///
    /// # Errors
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.format_version != FORMAT_VERSION {
            return Err(ModelError::UnsupportedVersion(self.format_version));
        }

        let names_match = self.feature_names.len() == FEATURE_COUNT
            && self
                .feature_names
                .iter()
                .zip(FEATURE_NAMES)
                .all(|(got, want)| got.eq_ignore_ascii_case(want));
        if !names_match {
            return Err(ModelError::FeatureMismatch {
                expected: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
                actual: self.feature_names.clone(),
            });
        }

        match &self.estimator {
            Estimator::Logistic(model) => model.validate(),
            Estimator::Forest(model) => model.validate(),
        }
        .map_err(ModelError::InvalidEstimator)
    }

    /// Wrap the estimator in the advertised capability.
    #[must_use]
    pub fn into_capability(self) -> ClassifierCapability {
        match (self.capability, self.estimator) {
            (ExportedCapability::Probability, Estimator::Logistic(m)) => {
                ClassifierCapability::probability(m)
            }
            (ExportedCapability::Probability, Estimator::Forest(m)) => {
                ClassifierCapability::probability(m)
            }
            (ExportedCapability::HardLabel, Estimator::Logistic(m)) => {
                ClassifierCapability::hard_label(m)
            }
            (ExportedCapability::HardLabel, Estimator::Forest(m)) => {
                ClassifierCapability::hard_label(m)
            }
        }
    }
}

/// Integrity manifest: relative file name to lowercase hex SHA-256.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    #[serde(default)]
    pub created_at: Option<String>,
    pub files: BTreeMap<String, String>,
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

// Constant-time compare for ASCII strings (used for SHA-256 hex digests).
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Verify the manifest next to `model_path`, if any.
///
/// Returns whether a manifest was found and checked.
///
/// # Errors
/// Returns `Integrity` if a listed file is missing or its hash differs, if
/// the model file is not listed, or if the manifest is required but absent.
pub fn verify_manifest(model_path: &Path, require_manifest: bool) -> Result<bool, ModelError> {
    let base_dir = model_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let manifest_path = base_dir.join(MANIFEST_FILE);

    if !manifest_path.exists() {
        if require_manifest {
            tracing::error!("Model manifest not found at {:?}", manifest_path);
            return Err(ModelError::Integrity(format!(
                "{MANIFEST_FILE} required but not found"
            )));
        }
        tracing::warn!("No model manifest found; loading unverified model");
        return Ok(false);
    }

    let manifest: ModelManifest = serde_json::from_slice(&fs::read(&manifest_path)?)?;
    if manifest.files.is_empty() {
        return Err(ModelError::Integrity(format!(
            "{MANIFEST_FILE} contains no files"
        )));
    }

    let model_name = model_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if !manifest.files.contains_key(model_name) {
        return Err(ModelError::Integrity(format!(
            "{MANIFEST_FILE} does not list {model_name}"
        )));
    }

    for (rel, expected_hex) in &manifest.files {
        let path = base_dir.join(rel);
        let bytes = fs::read(&path).map_err(|e| {
            ModelError::Integrity(format!(
                "manifest references missing/unreadable file {path:?}: {e}"
            ))
        })?;

        if !constant_time_eq_str(&sha256_hex(&bytes), &expected_hex.to_ascii_lowercase()) {
            return Err(ModelError::Integrity(format!("file hash mismatch for {rel}")));
        }
    }

    tracing::info!("Model manifest verified ({} files)", manifest.files.len());
    Ok(true)
}

/// Load the classifier export at `path`.
///
/// # Errors
/// Returns error if the file is missing, fails the integrity check, or is
/// not a valid export.
pub fn load_classifier(
    path: &Path,
    require_manifest: bool,
) -> Result<ClassifierCapability, ModelError> {
    if !path.is_file() {
        return Err(ModelError::NotFound(path.to_path_buf()));
    }

    verify_manifest(path, require_manifest)?;

    let content = fs::read_to_string(path)?;
    let export: ModelExport = serde_json::from_str(&content)?;
    export.validate()?;

    let estimator_kind = match &export.estimator {
        Estimator::Logistic(_) => "logistic",
        Estimator::Forest(m) => {
            tracing::debug!("Forest export holds {} trees", m.trees.len());
            "forest"
        }
    };

    let capability = export.into_capability();
    tracing::info!(
        "Loaded {} model from {:?} (capability={})",
        estimator_kind,
        path,
        capability.kind()
    );

    Ok(capability)
}
