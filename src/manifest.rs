//! Version manifest reading
//!
//! Deploys that do not pass `--version` read it from a package.json-style
//! manifest. Only the top-level `version` field matters; everything else in
//! the file is ignored.

use crate::error::{LongshoreError, LongshoreResult};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    version: Option<String>,
}

/// Version string from a JSON manifest's top-level `version` field.
pub fn version_from_manifest(path: &Path) -> LongshoreResult<String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| LongshoreError::InvalidManifest {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;
    let manifest: Manifest =
        serde_json::from_str(&content).map_err(|e| LongshoreError::InvalidManifest {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;
    match manifest.version {
        Some(version) if !version.trim().is_empty() => Ok(version),
        _ => Err(LongshoreError::MissingVersion),
    }
}
