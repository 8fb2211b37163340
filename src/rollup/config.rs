use crate::error::RollupError;
use crate::rollup::paths::RollupPaths;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Pending daily captures allowed before monthly consolidation fires.
    pub monthly: usize,
    /// Pending monthly archives allowed before yearly consolidation fires.
    pub yearly: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            monthly: 30,
            yearly: 12,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    pub path: PathBuf,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("manifest.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReleaseConfig {
    /// `owner/name`; when unset the release host infers it from the checkout.
    pub repo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    pub remote: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColdStorageConfig {
    pub collection: String,
    pub identifier_prefix: String,
    pub title: String,
    pub mediatype: String,
    pub creator: String,
    pub download_base_url: String,
}

impl Default for ColdStorageConfig {
    fn default() -> Self {
        Self {
            collection: "opensource_media".to_string(),
            identifier_prefix: "scrape-archive".to_string(),
            title: "Scrape archive".to_string(),
            mediatype: "data".to_string(),
            creator: "archive-rollup".to_string(),
            download_base_url: "https://archive.org/download".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RollupConfig {
    pub thresholds: Thresholds,
    pub manifest: ManifestConfig,
    pub release: ReleaseConfig,
    pub git: GitConfig,
    pub cold_storage: ColdStorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialRollupConfig {
    thresholds: Option<Thresholds>,
    manifest: Option<ManifestConfig>,
    release: Option<ReleaseConfig>,
    git: Option<GitConfig>,
    cold_storage: Option<ColdStorageConfig>,
}

type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn env_or_usize(lookup: EnvLookup<'_>, var: &str, fallback: usize) -> usize {
    match lookup(var) {
        Some(v) => v.trim().parse::<usize>().ok().unwrap_or(fallback),
        None => fallback,
    }
}

fn env_or_string(lookup: EnvLookup<'_>, var: &str, fallback: &str) -> String {
    match lookup(var) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_or_optional(lookup: EnvLookup<'_>, var: &str, fallback: Option<String>) -> Option<String> {
    match lookup(var) {
        Some(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => fallback,
    }
}

pub fn validate(cfg: &RollupConfig) -> Result<()> {
    if cfg.thresholds.monthly == 0 {
        return Err(RollupError::InvalidConfig("monthly threshold must be >= 1".into()).into());
    }
    if cfg.thresholds.yearly == 0 {
        return Err(RollupError::InvalidConfig("yearly threshold must be >= 1".into()).into());
    }
    if cfg.manifest.path.as_os_str().is_empty() {
        return Err(RollupError::InvalidConfig("manifest path cannot be empty".into()).into());
    }
    if cfg.git.remote.trim().is_empty() {
        return Err(RollupError::InvalidConfig("git remote cannot be empty".into()).into());
    }
    let cold = &cfg.cold_storage;
    if cold.collection.trim().is_empty() {
        return Err(
            RollupError::InvalidConfig("cold storage collection cannot be empty".into()).into(),
        );
    }
    if cold.identifier_prefix.trim().is_empty() {
        return Err(RollupError::InvalidConfig(
            "cold storage identifier prefix cannot be empty".into(),
        )
        .into());
    }
    if cold.identifier_prefix.chars().any(char::is_whitespace) {
        return Err(RollupError::InvalidConfig(
            "cold storage identifier prefix cannot contain whitespace".into(),
        )
        .into());
    }
    if !cold.download_base_url.starts_with("http://")
        && !cold.download_base_url.starts_with("https://")
    {
        return Err(RollupError::InvalidConfig(
            "cold storage download base url must be http(s)".into(),
        )
        .into());
    }
    Ok(())
}

fn resolve_config_path(paths: &RollupPaths) -> Option<PathBuf> {
    if let Ok(custom) = env::var("ROLLUP_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let local = paths.work_dir.join("rollup.toml");
    if local.exists() {
        return Some(local);
    }

    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("archive-rollup").join("rollup.toml"))
}

fn merge_toml(base: &mut RollupConfig, raw: &str) -> Result<()> {
    let parsed: PartialRollupConfig = toml::from_str(raw)?;
    if let Some(thresholds) = parsed.thresholds {
        base.thresholds = thresholds;
    }
    if let Some(manifest) = parsed.manifest {
        base.manifest = manifest;
    }
    if let Some(release) = parsed.release {
        base.release = release;
    }
    if let Some(git) = parsed.git {
        base.git = git;
    }
    if let Some(cold_storage) = parsed.cold_storage {
        base.cold_storage = cold_storage;
    }
    Ok(())
}

fn merge_file_config(base: &mut RollupConfig, paths: &RollupPaths) -> Result<Option<PathBuf>> {
    let Some(path) = resolve_config_path(paths) else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(&path)?;
    merge_toml(base, &raw)
        .map_err(|err| anyhow!("failed to parse rollup config {}: {err}", path.display()))?;
    Ok(Some(path))
}

fn apply_env_overrides(cfg: &mut RollupConfig, lookup: EnvLookup<'_>) {
    cfg.thresholds.monthly =
        env_or_usize(lookup, "ROLLUP_MONTHLY_THRESHOLD", cfg.thresholds.monthly);
    cfg.thresholds.yearly = env_or_usize(lookup, "ROLLUP_YEARLY_THRESHOLD", cfg.thresholds.yearly);
    cfg.manifest.path = PathBuf::from(env_or_string(
        lookup,
        "ROLLUP_MANIFEST_PATH",
        &cfg.manifest.path.to_string_lossy(),
    ));
    cfg.release.repo = env_or_optional(lookup, "ROLLUP_RELEASE_REPO", cfg.release.repo.take());
    cfg.git.remote = env_or_string(lookup, "ROLLUP_GIT_REMOTE", &cfg.git.remote);

    let cold = &mut cfg.cold_storage;
    cold.collection = env_or_string(lookup, "ROLLUP_ARCHIVE_COLLECTION", &cold.collection);
    cold.identifier_prefix =
        env_or_string(lookup, "ROLLUP_ARCHIVE_PREFIX", &cold.identifier_prefix);
    cold.title = env_or_string(lookup, "ROLLUP_ARCHIVE_TITLE", &cold.title);
    cold.mediatype = env_or_string(lookup, "ROLLUP_ARCHIVE_MEDIATYPE", &cold.mediatype);
    cold.creator = env_or_string(lookup, "ROLLUP_ARCHIVE_CREATOR", &cold.creator);
    cold.download_base_url =
        env_or_string(lookup, "ROLLUP_ARCHIVE_BASE_URL", &cold.download_base_url);
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: RollupConfig,
    pub source: Option<PathBuf>,
}

pub fn load_config(paths: &RollupPaths) -> Result<LoadedConfig> {
    let mut cfg = RollupConfig::default();
    let source = merge_file_config(&mut cfg, paths)?;
    apply_env_overrides(&mut cfg, &|var: &str| env::var(var).ok());
    validate(&cfg)?;
    Ok(LoadedConfig {
        config: cfg,
        source,
    })
}
