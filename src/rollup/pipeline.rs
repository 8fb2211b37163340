use crate::remote::Remotes;
use crate::remote::gh::GhReleases;
use crate::remote::git::GitRepo;
use crate::remote::ia::IaArchive;
use crate::remote::process::{REQUIRED_TOOLS, resolve_bin};
use crate::rollup::config::{RollupConfig, load_config};
use crate::rollup::daily::{self, DailyOutcome};
use crate::rollup::manifest::{self, Manifest};
use crate::rollup::monthly::{self, MonthlyOutcome};
use crate::rollup::paths::{RollupPaths, resolve_paths};
use crate::rollup::tier::{self, CleanupOutcome};
use crate::rollup::transitions::Transition;
use crate::rollup::yearly::{self, YearlyOutcome};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Everything a stage needs. Stages read the manifest from disk themselves
/// so each threshold check sees what the previous stage persisted.
pub struct StageContext<'a> {
    pub paths: &'a RollupPaths,
    pub cfg: &'a RollupConfig,
    pub manifest_path: PathBuf,
    pub remotes: Remotes<'a>,
}

impl<'a> StageContext<'a> {
    pub fn new(paths: &'a RollupPaths, cfg: &'a RollupConfig, remotes: Remotes<'a>) -> Self {
        Self {
            paths,
            cfg,
            manifest_path: paths.manifest_file(&cfg.manifest.path),
            remotes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub manifest_path: PathBuf,
    pub transitions: Vec<Transition>,
    pub daily: DailyOutcome,
    pub monthly: MonthlyOutcome,
    pub yearly: YearlyOutcome,
    /// Deletions queued by earlier runs and retried at the end of this one.
    pub recovered: CleanupOutcome,
    pub manifest: Manifest,
}

impl RunOutcome {
    fn stage_cleanups(&self) -> impl Iterator<Item = &CleanupOutcome> {
        let monthly = match &self.monthly {
            MonthlyOutcome::Consolidated(rollup) => Some(&rollup.cleanup),
            _ => None,
        };
        let yearly = match &self.yearly {
            YearlyOutcome::Consolidated(rollup) => Some(&rollup.cleanup),
            _ => None,
        };
        monthly.into_iter().chain(yearly)
    }

    pub fn cleanup_failures(&self) -> Vec<String> {
        self.stage_cleanups()
            .chain(std::iter::once(&self.recovered))
            .flat_map(|cleanup| cleanup.failures.iter().cloned())
            .collect()
    }
}

/// Run the three stages in order against already-resolved collaborators.
pub fn run_stages(ctx: &StageContext<'_>, now: DateTime<Utc>) -> Result<RunOutcome> {
    manifest::load(&ctx.manifest_path)?;

    let mut transitions = Vec::new();

    let daily = daily::run(ctx)?;
    if matches!(daily, DailyOutcome::Publish { .. }) {
        transitions.push(Transition::DailyPublish);
    }

    let monthly = monthly::run(ctx)?;
    if matches!(monthly, MonthlyOutcome::Consolidated(_)) {
        transitions.push(Transition::MonthlyConsolidate);
    }

    let yearly = yearly::run(ctx, now)?;
    if matches!(yearly, YearlyOutcome::Consolidated(_)) {
        transitions.push(Transition::YearlyConsolidate);
    }

    let manifest = manifest::load(&ctx.manifest_path)?;
    let mut outcome = RunOutcome {
        manifest_path: ctx.manifest_path.clone(),
        transitions,
        daily,
        monthly,
        yearly,
        recovered: CleanupOutcome::default(),
        manifest,
    };
    let attempted = outcome
        .stage_cleanups()
        .flat_map(|cleanup| cleanup.attempted.iter().cloned())
        .collect::<Vec<_>>();
    outcome.recovered = tier::retry_pending_cleanup(ctx, &outcome.manifest, &attempted)?;
    Ok(outcome)
}

/// Startup checks: every external tool resolves and the manifest exists.
pub fn preflight(paths: &RollupPaths, cfg: &RollupConfig) -> Result<Vec<(String, PathBuf)>> {
    let mut tools = Vec::with_capacity(REQUIRED_TOOLS.len());
    for tool in &REQUIRED_TOOLS {
        tools.push((tool.name.to_string(), resolve_bin(tool)?));
    }
    manifest::load(&paths.manifest_file(&cfg.manifest.path))?;
    Ok(tools)
}

pub fn run_once() -> Result<RunOutcome> {
    let paths = resolve_paths()?;
    let cfg = load_config(&paths)?.config;
    preflight(&paths, &cfg)?;

    let releases = GhReleases::resolve(&paths.work_dir, cfg.release.repo.clone())?;
    let vcs = GitRepo::resolve(&paths.work_dir, &cfg.git.remote)?;
    let cold = IaArchive::resolve(&paths.work_dir, &cfg.cold_storage.download_base_url)?;
    let ctx = StageContext::new(
        &paths,
        &cfg,
        Remotes {
            releases: &releases,
            vcs: &vcs,
            cold: &cold,
        },
    );

    run_stages(&ctx, Utc::now())
}
