//! Model manifest utility.
//!
//! Writes `manifest.json` with the SHA-256 of every model JSON file in a
//! directory, so the loader can detect tampered or truncated exports.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin hash_model -- <model_dir | model.json>
//! ```

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;

use glucorisk::adapters::model::{sha256_hex, ModelManifest, FORMAT_VERSION, MANIFEST_FILE};

fn usage() -> String {
    "Usage: hash_model <model_dir | model.json>".to_string()
}

fn parse_args() -> Result<PathBuf> {
    let mut args = env::args().skip(1);
    let path = match args.next().as_deref() {
        None | Some("-h" | "--help") => return Err(anyhow!(usage())),
        Some(arg) => PathBuf::from(arg),
    };
    if args.next().is_some() {
        return Err(anyhow!(usage()));
    }
    Ok(path)
}

fn main() -> Result<()> {
    let path = parse_args()?;

    let model_dir = if path.is_file() {
        path.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), PathBuf::from)
    } else {
        path
    };

    let mut files = BTreeMap::new();
    let entries =
        fs::read_dir(&model_dir).with_context(|| format!("Failed to read {model_dir:?}"))?;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == MANIFEST_FILE || !name.ends_with(".json") || !entry.file_type()?.is_file() {
            continue;
        }
        let bytes = fs::read(entry.path()).with_context(|| format!("Failed to read {name}"))?;
        files.insert(name, sha256_hex(&bytes));
    }

    if files.is_empty() {
        return Err(anyhow!("No model JSON found in {model_dir:?}"));
    }

    let manifest = ModelManifest {
        version: FORMAT_VERSION,
        created_at: Some(Utc::now().to_rfc3339()),
        files,
    };

    let manifest_path = model_dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, serde_json::to_vec_pretty(&manifest)?)
        .with_context(|| format!("Failed to write {manifest_path:?}"))?;

    for (name, digest) in &manifest.files {
        println!("{digest}  {name}");
    }
    println!("Wrote manifest: {manifest_path:?}");

    Ok(())
}
