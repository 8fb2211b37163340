use crate::rollup::paths::RollupPaths;
use crate::rollup::util::now_epoch_secs;
use crate::rollup::warn::{self, WarnEvent};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub at_epoch_secs: u64,
    pub phase: String,
    pub status: String,
    pub message: String,
}

pub fn audit_log_path(paths: &RollupPaths) -> PathBuf {
    paths.logs_dir.join("audit.log")
}

pub fn append_event(paths: &RollupPaths, phase: &str, status: &str, message: &str) -> Result<()> {
    fs::create_dir_all(&paths.logs_dir)
        .with_context(|| format!("failed to create {}", paths.logs_dir.display()))?;
    let event = AuditEvent {
        at_epoch_secs: now_epoch_secs()?,
        phase: phase.to_string(),
        status: status.to_string(),
        message: message.to_string(),
    };

    let line = format!("{}\n", serde_json::to_string(&event)?);
    let path = audit_log_path(paths);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

/// Audit write for steps that follow a remote change which cannot be undone.
/// A failed write goes to the warn channel and the stage carries on.
pub fn append_event_or_warn(paths: &RollupPaths, phase: &str, status: &str, message: &str) {
    if let Err(err) = append_event(paths, phase, status, message) {
        let target = audit_log_path(paths).display().to_string();
        let err_text = format!("{err:#}");
        warn::emit(WarnEvent {
            code: "AUDIT_WRITE_FAILED",
            stage: phase,
            action: "append-audit",
            target: &target,
            retry: "none",
            reason: "audit-log-unwritable",
            err: &err_text,
        });
    }
}

#[cfg(test)]
pub fn read_events(paths: &RollupPaths) -> Result<Vec<AuditEvent>> {
    let path = audit_log_path(paths);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(&path)?;
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| Ok(serde_json::from_str(line)?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn events_append_as_json_lines() {
        let tmp = tempdir().expect("tempdir");
        let paths = RollupPaths::in_dir(tmp.path());
        append_event(&paths, "daily", "ok", "tag=daily_20240101").expect("first");
        append_event(&paths, "monthly", "skipped", "pending=2").expect("second");

        let events = read_events(&paths).expect("read");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].phase, "daily");
        assert_eq!(events[1].status, "skipped");
    }

    #[test]
    fn unwritable_log_does_not_propagate() {
        let tmp = tempdir().expect("tempdir");
        let paths = RollupPaths::in_dir(tmp.path());
        fs::create_dir_all(audit_log_path(&paths)).expect("block log path with a dir");

        assert!(append_event(&paths, "yearly", "ok", "name=x").is_err());
        append_event_or_warn(&paths, "yearly", "ok", "name=x");
    }
}
