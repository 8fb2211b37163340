use crate::rollup::paths::RollupPaths;
use crate::rollup::util::write_json_atomic;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

/// Release tags queued for deletion. Entries are added before the manifest
/// drops the consolidated items and removed once both the release and the
/// tag are gone, so an interrupted cleanup resumes on the next run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupQueue {
    pub tags: Vec<String>,
}

pub fn load(paths: &RollupPaths) -> Result<CleanupQueue> {
    let path = paths.cleanup_queue_file();
    if !path.exists() {
        return Ok(CleanupQueue::default());
    }
    let raw =
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn save(paths: &RollupPaths, queue: &CleanupQueue) -> Result<()> {
    write_json_atomic(&paths.cleanup_queue_file(), queue)
}

pub fn enqueue(paths: &RollupPaths, tags: &[String]) -> Result<()> {
    let mut queue = load(paths)?;
    let before = queue.tags.len();
    for tag in tags {
        if !queue.tags.contains(tag) {
            queue.tags.push(tag.clone());
        }
    }
    if queue.tags.len() == before && paths.cleanup_queue_file().exists() {
        return Ok(());
    }
    save(paths, &queue)
}

/// Drop `tags` from the queue.
pub fn settle(paths: &RollupPaths, tags: &[String]) -> Result<()> {
    if tags.is_empty() {
        return Ok(());
    }
    let mut queue = load(paths)?;
    let before = queue.tags.len();
    queue.tags.retain(|tag| !tags.contains(tag));
    if queue.tags.len() == before {
        return Ok(());
    }
    save(paths, &queue)
}
