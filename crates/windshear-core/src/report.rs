//! Class-map reporting
//!
//! Serializes the final name mapping as `{origin, replacement, usedBy}`
//! triples, in first-encounter order, for persistence next to the build
//! output.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ctx::Context;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write class map to `{path}`")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize class map")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassMapEntry {
    pub origin: String,
    pub replacement: String,
    pub used_by: Vec<String>,
}

/// The generated mappings of a session, in insertion order.
pub fn class_map_entries(ctx: &Context) -> Vec<ClassMapEntry> {
    ctx.generated_entries()
        .into_iter()
        .map(|(origin, replacement, used_by)| ClassMapEntry { origin, replacement, used_by })
        .collect()
}

/// Write the class map as JSON; `loose` pretty-prints it.
pub fn write_class_map(path: &Path, entries: &[ClassMapEntry], loose: bool) -> Result<(), ReportError> {
    let json = if loose {
        serde_json::to_string_pretty(entries)?
    } else {
        serde_json::to_string(entries)?
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|source| ReportError::Write { path: path.to_path_buf(), source })?;
        }
    }
    std::fs::write(path, json)
        .map_err(|source| ReportError::Write { path: path.to_path_buf(), source })?;
    tracing::info!(path = %path.display(), "class map generated");
    Ok(())
}
