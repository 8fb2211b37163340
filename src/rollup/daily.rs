use crate::error::RollupError;
use crate::rollup::audit;
use crate::rollup::manifest;
use crate::rollup::naming::daily_tag;
use crate::rollup::pipeline::StageContext;
use crate::rollup::tier::{self, PublishState};
use crate::rollup::transitions::daily_publish_due;
use anyhow::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyOutcome {
    NothingToDo,
    /// Over the monthly threshold; the capture is folded into the monthly rollup.
    Deferred { tag: String, pending: usize },
    Publish { tag: String, state: PublishState },
}

pub fn run(ctx: &StageContext<'_>) -> Result<DailyOutcome> {
    let manifest = manifest::load(&ctx.manifest_path)?;
    let Some(id) = manifest.daily.last() else {
        audit::append_event(ctx.paths, "daily", "skipped", "nothing to do")?;
        return Ok(DailyOutcome::NothingToDo);
    };

    let file = ctx.paths.daily_file(id);
    if !file.is_file() {
        return Err(RollupError::MissingLocalFile(file.display().to_string()).into());
    }

    let tag = daily_tag(id);
    let pending = manifest.daily.len();
    if !daily_publish_due(&manifest, &ctx.cfg.thresholds) {
        audit::append_event(
            ctx.paths,
            "daily",
            "skipped",
            &format!(
                "tag={tag} pending={pending} threshold={} reason=monthly-rollup-pending",
                ctx.cfg.thresholds.monthly
            ),
        )?;
        return Ok(DailyOutcome::Deferred { tag, pending });
    }

    let state = tier::publish(ctx, &tag, &file, &format!("Daily capture {id}"))?;
    audit::append_event(
        ctx.paths,
        "daily",
        "ok",
        &format!("tag={tag} pending={pending} release={}", state.as_str()),
    )?;
    Ok(DailyOutcome::Publish { tag, state })
}
