use crate::rollup::audit;
use crate::rollup::cleanup_queue;
use crate::rollup::commit::{CommitTagOutcome, commit_and_tag};
use crate::rollup::compress::{compress_replace, concat_files, file_hash};
use crate::rollup::manifest;
use crate::rollup::naming::{daily_tag, derive_range, monthly_name};
use crate::rollup::paths::daily_file_name;
use crate::rollup::pipeline::StageContext;
use crate::rollup::tier::{self, CleanupOutcome, PublishState};
use crate::rollup::transitions::{monthly_due, monthly_publish_due};
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyRollup {
    pub name: String,
    pub consolidated: Vec<String>,
    pub fetched: Vec<String>,
    pub archive_path: PathBuf,
    pub bytes: u64,
    pub sha256: String,
    pub commit: CommitTagOutcome,
    pub publish: PublishState,
    pub cleanup: CleanupOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthlyOutcome {
    NotDue { pending: usize },
    /// The newest monthly archive was consolidated earlier but never published.
    CaughtUp { name: String, publish: PublishState },
    Consolidated(MonthlyRollup),
}

fn publish_if_allowed(ctx: &StageContext<'_>, name: &str) -> Result<PublishState> {
    let manifest = manifest::load(&ctx.manifest_path)?;
    if !monthly_publish_due(&manifest, &ctx.cfg.thresholds) {
        return Ok(PublishState::Deferred);
    }
    let archive = ctx.paths.archive_file(name);
    tier::publish(ctx, name, &archive, &format!("Monthly archive {name}"))
}

fn catch_up(ctx: &StageContext<'_>, pending: usize) -> Result<MonthlyOutcome> {
    let manifest = manifest::load(&ctx.manifest_path)?;
    let Some(name) = manifest.monthly.last().cloned() else {
        return Ok(MonthlyOutcome::NotDue { pending });
    };
    if !monthly_publish_due(&manifest, &ctx.cfg.thresholds)
        || !ctx.paths.archive_file(&name).is_file()
        || ctx.remotes.releases.release_exists(&name)?
    {
        return Ok(MonthlyOutcome::NotDue { pending });
    }

    let publish = publish_if_allowed(ctx, &name)?;
    audit::append_event_or_warn(
        ctx.paths,
        "monthly",
        "ok",
        &format!("name={name} release={} reason=catch-up", publish.as_str()),
    );
    Ok(MonthlyOutcome::CaughtUp { name, publish })
}

pub fn run(ctx: &StageContext<'_>) -> Result<MonthlyOutcome> {
    let current = manifest::load(&ctx.manifest_path)?;
    let pending = current.daily.len();
    if !monthly_due(&current, &ctx.cfg.thresholds) {
        return catch_up(ctx, pending);
    }

    let ids = current.daily.clone();
    let range = derive_range(&ids)?;
    let name = monthly_name(&range);

    let mut fetched = Vec::new();
    let mut inputs = Vec::with_capacity(ids.len());
    for id in &ids {
        let local = ctx.paths.daily_file(id);
        if tier::ensure_local(ctx, &daily_tag(id), &daily_file_name(id), &local)? {
            fetched.push(id.clone());
        }
        inputs.push(local);
    }

    let combined = ctx.paths.combined_file(&name);
    let bytes = concat_files(&inputs, &combined)
        .with_context(|| format!("failed to build {}", combined.display()))?;
    let archive_path = ctx.paths.archive_file(&name);
    compress_replace(&combined, &archive_path)?;
    let sha256 = file_hash(&archive_path)?;

    let tags = ids.iter().map(|id| daily_tag(id)).collect::<Vec<_>>();
    cleanup_queue::enqueue(ctx.paths, &tags)?;
    manifest::update(&ctx.manifest_path, |m| {
        m.daily.clear();
        m.monthly.push(name.clone());
    })?;
    let commit = commit_and_tag(ctx.remotes.vcs, &ctx.manifest_path, &name)?;
    audit::append_event_or_warn(
        ctx.paths,
        "monthly",
        "ok",
        &format!(
            "name={name} inputs={} fetched={} bytes={bytes} sha256={sha256} {}",
            ids.len(),
            fetched.len(),
            commit.summary()
        ),
    );

    let publish = publish_if_allowed(ctx, &name)?;

    let cleanup = tier::cleanup_releases(ctx, "monthly", &tags);
    audit::append_event_or_warn(
        ctx.paths,
        "monthly-cleanup",
        if cleanup.failures.is_empty() {
            "ok"
        } else {
            "degraded"
        },
        &format!(
            "name={name} release={} attempted={} failed={}",
            publish.as_str(),
            cleanup.attempted.len(),
            cleanup.failures.len()
        ),
    );

    Ok(MonthlyOutcome::Consolidated(MonthlyRollup {
        name,
        consolidated: ids,
        fetched,
        archive_path,
        bytes,
        sha256,
        commit,
        publish,
        cleanup,
    }))
}
