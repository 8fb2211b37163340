use crate::remote::ArchiveMetadata;
use crate::rollup::audit;
use crate::rollup::cleanup_queue;
use crate::rollup::commit::{CommitTagOutcome, commit_and_tag};
use crate::rollup::compress::{compress_replace, decompress_concat, file_hash};
use crate::rollup::manifest::{self, Manifest, YearlyRecord};
use crate::rollup::naming::{Range, cold_storage_identifier, derive_range, yearly_name};
use crate::rollup::paths::archive_file_name;
use crate::rollup::pipeline::StageContext;
use crate::rollup::tier::{self, CleanupOutcome};
use crate::rollup::transitions::yearly_due;
use crate::rollup::util::identifier_timestamp;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearlyRollup {
    pub record: YearlyRecord,
    pub identifier: String,
    pub consolidated: Vec<String>,
    pub fetched: Vec<String>,
    pub archive_path: PathBuf,
    pub bytes: u64,
    pub sha256: String,
    pub commit: CommitTagOutcome,
    pub cleanup: CleanupOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearlyOutcome {
    NotDue { pending: usize },
    /// The newest yearly bundle was recorded but its commit or tag was missing.
    Resumed { name: String, commit: CommitTagOutcome },
    Consolidated(YearlyRollup),
}

fn archive_metadata(ctx: &StageContext<'_>, range: &Range) -> ArchiveMetadata {
    let cold = &ctx.cfg.cold_storage;
    ArchiveMetadata {
        collection: cold.collection.clone(),
        title: format!("{} {}-{}", cold.title, range.start, range.end),
        mediatype: cold.mediatype.clone(),
        creator: cold.creator.clone(),
    }
}

/// Finish the commit and tag of the newest yearly record. Once the monthly
/// list is cleared the threshold never fires again for that bundle, so this
/// is the only retry it gets.
fn resume(ctx: &StageContext<'_>, current: &Manifest) -> Result<YearlyOutcome> {
    let pending = current.monthly.len();
    let Some(record) = current.yearly.last() else {
        return Ok(YearlyOutcome::NotDue { pending });
    };
    let commit = commit_and_tag(ctx.remotes.vcs, &ctx.manifest_path, &record.name)?;
    if !commit.did_work() {
        return Ok(YearlyOutcome::NotDue { pending });
    }
    audit::append_event_or_warn(
        ctx.paths,
        "yearly",
        "ok",
        &format!("name={} reason=resume {}", record.name, commit.summary()),
    );
    Ok(YearlyOutcome::Resumed {
        name: record.name.clone(),
        commit,
    })
}

pub fn run(ctx: &StageContext<'_>, now: DateTime<Utc>) -> Result<YearlyOutcome> {
    let current = manifest::load(&ctx.manifest_path)?;
    if !yearly_due(&current, &ctx.cfg.thresholds) {
        return resume(ctx, &current);
    }

    let names = current.monthly.clone();
    let range = derive_range(&names)?;
    let name = yearly_name(&range);

    let mut fetched = Vec::new();
    let mut inputs = Vec::with_capacity(names.len());
    for monthly in &names {
        let local = ctx.paths.archive_file(monthly);
        if tier::ensure_local(ctx, monthly, &archive_file_name(monthly), &local)? {
            fetched.push(monthly.clone());
        }
        inputs.push(local);
    }

    let combined = ctx.paths.combined_file(&name);
    let bytes = decompress_concat(&inputs, &combined)
        .with_context(|| format!("failed to build {}", combined.display()))?;
    let archive_path = ctx.paths.archive_file(&name);
    compress_replace(&combined, &archive_path)?;
    let sha256 = file_hash(&archive_path)?;

    let identifier = cold_storage_identifier(
        &ctx.cfg.cold_storage.identifier_prefix,
        &range,
        &identifier_timestamp(now),
    );
    cleanup_queue::enqueue(ctx.paths, &names)?;
    ctx.remotes
        .cold
        .upload(&identifier, &archive_path, &archive_metadata(ctx, &range))?;
    let url = ctx
        .remotes
        .cold
        .download_url(&identifier, &archive_file_name(&name));

    // Recorded right after the upload; cold storage cannot be rolled back.
    let record = YearlyRecord {
        name: name.clone(),
        url: url.clone(),
    };
    manifest::update(&ctx.manifest_path, |m| {
        m.monthly.clear();
        m.yearly.push(record.clone());
    })?;
    audit::append_event_or_warn(
        ctx.paths,
        "yearly-upload",
        "ok",
        &format!("name={name} identifier={identifier} url={url} bytes={bytes} sha256={sha256}"),
    );
    let commit = commit_and_tag(ctx.remotes.vcs, &ctx.manifest_path, &name)?;

    let cleanup = tier::cleanup_releases(ctx, "yearly", &names);
    audit::append_event_or_warn(
        ctx.paths,
        "yearly",
        if cleanup.failures.is_empty() {
            "ok"
        } else {
            "degraded"
        },
        &format!(
            "name={name} inputs={} fetched={} {} cleanup_attempted={} cleanup_failed={}",
            names.len(),
            fetched.len(),
            commit.summary(),
            cleanup.attempted.len(),
            cleanup.failures.len()
        ),
    );

    Ok(YearlyOutcome::Consolidated(YearlyRollup {
        record,
        identifier,
        consolidated: names,
        fetched,
        archive_path,
        bytes,
        sha256,
        commit,
        cleanup,
    }))
}
