use crate::error::RollupError;
use crate::rollup::audit;
use crate::rollup::cleanup_queue;
use crate::rollup::commit::commit_and_tag;
use crate::rollup::manifest::Manifest;
use crate::rollup::naming::daily_tag;
use crate::rollup::pipeline::StageContext;
use crate::rollup::warn::{self, WarnEvent};
use anyhow::Result;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    Published,
    AlreadyPublished,
    Deferred,
}

impl PublishState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::AlreadyPublished => "already-published",
            Self::Deferred => "deferred",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupOutcome {
    pub attempted: Vec<String>,
    pub failures: Vec<String>,
}

/// Make sure `local` exists, downloading `asset` from release `tag` if needed.
/// Returns whether a download happened.
pub fn ensure_local(ctx: &StageContext<'_>, tag: &str, asset: &str, local: &Path) -> Result<bool> {
    if local.is_file() {
        return Ok(false);
    }

    ctx.remotes
        .releases
        .download_asset(tag, asset, &ctx.paths.work_dir)
        .map_err(|err| RollupError::MissingRemoteAsset {
            tag: tag.to_string(),
            asset: asset.to_string(),
            reason: format!("{err:#}"),
        })?;

    if !local.is_file() {
        return Err(RollupError::MissingRemoteAsset {
            tag: tag.to_string(),
            asset: asset.to_string(),
            reason: format!("download did not produce {}", local.display()),
        }
        .into());
    }
    Ok(true)
}

/// Commit and tag `tag`, then create its release unless it already exists.
pub fn publish(
    ctx: &StageContext<'_>,
    tag: &str,
    asset: &Path,
    notes: &str,
) -> Result<PublishState> {
    commit_and_tag(ctx.remotes.vcs, &ctx.manifest_path, tag)?;
    if ctx.remotes.releases.release_exists(tag)? {
        return Ok(PublishState::AlreadyPublished);
    }
    ctx.remotes.releases.create_release(tag, asset, tag, notes)?;
    Ok(PublishState::Published)
}

/// Delete the release and tag of every consolidated entry. Failures are
/// reported through the warn channel and never abort the stage; tags that
/// fail stay in the cleanup queue for the next run.
pub fn cleanup_releases(ctx: &StageContext<'_>, stage: &str, tags: &[String]) -> CleanupOutcome {
    let mut out = CleanupOutcome::default();
    let mut settled = Vec::new();
    for tag in tags {
        out.attempted.push(tag.clone());
        let failures_before = out.failures.len();

        if let Err(err) = ctx.remotes.releases.delete_release(tag) {
            let err_text = format!("{err:#}");
            warn::emit(WarnEvent {
                code: "CLEANUP_FAILED",
                stage,
                action: "delete-release",
                target: tag,
                retry: "next-run",
                reason: "release-delete-failed",
                err: &err_text,
            });
            out.failures.push(format!("release {tag}: {err_text}"));
        }

        if let Err(err) = ctx.remotes.vcs.delete_tag(tag) {
            let err_text = format!("{err:#}");
            warn::emit(WarnEvent {
                code: "CLEANUP_FAILED",
                stage,
                action: "delete-tag",
                target: tag,
                retry: "next-run",
                reason: "tag-delete-failed",
                err: &err_text,
            });
            out.failures.push(format!("tag {tag}: {err_text}"));
        }

        if out.failures.len() == failures_before {
            settled.push(tag.clone());
        }
    }

    if let Err(err) = cleanup_queue::settle(ctx.paths, &settled) {
        let target = ctx.paths.cleanup_queue_file().display().to_string();
        let err_text = format!("{err:#}");
        warn::emit(WarnEvent {
            code: "QUEUE_WRITE_FAILED",
            stage,
            action: "settle-cleanup",
            target: &target,
            retry: "next-run",
            reason: "cleanup-queue-unwritable",
            err: &err_text,
        });
    }
    out
}

/// Tags the manifest still references; their releases are live.
fn live_tags(manifest: &Manifest) -> Vec<String> {
    manifest
        .daily
        .iter()
        .map(|id| daily_tag(id))
        .chain(manifest.monthly.iter().cloned())
        .collect()
}

/// Retry deletions an earlier run queued but never finished. Tags attempted
/// in this run are skipped; tags the manifest references again are dropped
/// from the queue without touching their releases.
pub fn retry_pending_cleanup(
    ctx: &StageContext<'_>,
    manifest: &Manifest,
    attempted_this_run: &[String],
) -> Result<CleanupOutcome> {
    let queue = cleanup_queue::load(ctx.paths)?;
    if queue.tags.is_empty() {
        return Ok(CleanupOutcome::default());
    }

    let live = live_tags(manifest);
    let (stale, pending): (Vec<String>, Vec<String>) =
        queue.tags.into_iter().partition(|tag| live.contains(tag));
    cleanup_queue::settle(ctx.paths, &stale)?;

    let due = pending
        .into_iter()
        .filter(|tag| !attempted_this_run.contains(tag))
        .collect::<Vec<_>>();
    if due.is_empty() {
        return Ok(CleanupOutcome::default());
    }

    let out = cleanup_releases(ctx, "recovery", &due);
    audit::append_event_or_warn(
        ctx.paths,
        "cleanup-retry",
        if out.failures.is_empty() {
            "ok"
        } else {
            "degraded"
        },
        &format!(
            "attempted={} failed={} tags={}",
            out.attempted.len(),
            out.failures.len(),
            out.attempted.join(",")
        ),
    );
    Ok(out)
}
