use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RollupPaths {
    pub work_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl RollupPaths {
    pub fn in_dir(work_dir: &Path) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            logs_dir: work_dir.join(".rollup").join("logs"),
        }
    }

    /// Manifest path from config, resolved against the work dir when relative.
    pub fn manifest_file(&self, configured: &Path) -> PathBuf {
        if configured.is_absolute() {
            configured.to_path_buf()
        } else {
            self.work_dir.join(configured)
        }
    }

    pub fn daily_file(&self, id: &str) -> PathBuf {
        self.work_dir.join(daily_file_name(id))
    }

    pub fn archive_file(&self, name: &str) -> PathBuf {
        self.work_dir.join(archive_file_name(name))
    }

    pub fn combined_file(&self, name: &str) -> PathBuf {
        self.work_dir.join(format!("{name}.ndjson"))
    }

    /// Release tags whose deletion is still owed by an earlier consolidation.
    pub fn cleanup_queue_file(&self) -> PathBuf {
        self.work_dir.join(".rollup").join("pending_cleanup.json")
    }
}

pub fn daily_file_name(id: &str) -> String {
    format!("daily_{id}.ndjson")
}

pub fn archive_file_name(name: &str) -> String {
    format!("{name}.ndjson.gz")
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<RollupPaths> {
    let cwd = env::current_dir().context("current directory could not be resolved")?;
    let work_dir = env_or_default_path("ROLLUP_WORK_DIR", cwd);
    let mut paths = RollupPaths::in_dir(&work_dir);
    paths.logs_dir = env_or_default_path("ROLLUP_LOGS_DIR", paths.logs_dir);

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_follow_tier_conventions() {
        let paths = RollupPaths::in_dir(Path::new("/data"));
        assert_eq!(
            paths.daily_file("20240105"),
            PathBuf::from("/data/daily_20240105.ndjson")
        );
        assert_eq!(
            paths.archive_file("monthly_20240101_20240131"),
            PathBuf::from("/data/monthly_20240101_20240131.ndjson.gz")
        );
        assert_eq!(
            paths.combined_file("yearly_20240101_20241231"),
            PathBuf::from("/data/yearly_20240101_20241231.ndjson")
        );
        assert_eq!(
            paths.cleanup_queue_file(),
            PathBuf::from("/data/.rollup/pending_cleanup.json")
        );
    }

    #[test]
    fn manifest_path_is_relative_to_work_dir() {
        let paths = RollupPaths::in_dir(Path::new("/data"));
        assert_eq!(
            paths.manifest_file(Path::new("manifest.json")),
            PathBuf::from("/data/manifest.json")
        );
        assert_eq!(
            paths.manifest_file(Path::new("/etc/rollup/manifest.json")),
            PathBuf::from("/etc/rollup/manifest.json")
        );
    }
}
