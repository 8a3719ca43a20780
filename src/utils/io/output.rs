//! JSON artifact I/O
//!
//! Per-trait outputs and the manifest are written pretty-printed, with an
//! optional byte-identical copy in a public mirror directory.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::models::{Manifest, TraitOutput};

/// Artifact file name for a trait
#[must_use]
pub fn trait_file_name(trait_key: &str) -> String {
    format!("{trait_key}.json")
}

/// Write a value as pretty JSON, creating parent directories
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text)?;
    Ok(())
}

/// Read a JSON file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Copy a written artifact to its mirror location
fn mirror(source: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(source, target)?;
    Ok(())
}

/// Write a trait artifact (and its public mirror) and return its path
pub fn write_trait_output(
    output_dir: &Path,
    public_dir: Option<&Path>,
    trait_key: &str,
    output: &TraitOutput,
) -> Result<PathBuf> {
    let path = output_dir.join(trait_file_name(trait_key));
    write_json(&path, output)?;
    if let Some(public_dir) = public_dir {
        mirror(&path, &public_dir.join(trait_file_name(trait_key)))?;
    }
    log::info!("Wrote trait probabilities: {}", path.display());
    Ok(path)
}

/// Read a trait artifact back, `None` when the file does not exist
pub fn read_trait_output(output_dir: &Path, trait_key: &str) -> Result<Option<TraitOutput>> {
    let path = output_dir.join(trait_file_name(trait_key));
    if !path.exists() {
        return Ok(None);
    }
    read_json(&path).map(Some)
}

/// Write the manifest (and its public mirror)
pub fn write_manifest(path: &Path, public_path: Option<&Path>, manifest: &Manifest) -> Result<()> {
    write_json(path, manifest)?;
    if let Some(public_path) = public_path {
        mirror(path, public_path)?;
    }
    log::info!("Wrote manifest: {}", path.display());
    Ok(())
}
