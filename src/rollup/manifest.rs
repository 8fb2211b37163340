use crate::error::RollupError;
use crate::rollup::util::write_json_atomic;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyRecord {
    pub name: String,
    pub url: String,
}

/// Durable rollup state, tracked in version control next to the captures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub daily: Vec<String>,
    pub monthly: Vec<String>,
    pub yearly: Vec<YearlyRecord>,
}

pub fn load(path: &Path) -> Result<Manifest> {
    if !path.exists() {
        return Err(RollupError::ManifestMissing(path.display().to_string()).into());
    }

    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let parsed: Manifest = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(parsed)
}

/// Replace the manifest atomically.
pub fn save(path: &Path, manifest: &Manifest) -> Result<()> {
    write_json_atomic(path, manifest)
}

/// Load, apply `mutate`, persist, and hand back the stored document.
pub fn update<F>(path: &Path, mutate: F) -> Result<Manifest>
where
    F: FnOnce(&mut Manifest),
{
    let mut manifest = load(path)?;
    mutate(&mut manifest);
    save(path, &manifest)?;
    Ok(manifest)
}
