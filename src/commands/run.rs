use anyhow::Result;

use crate::commands::CommandReport;
use crate::rollup::daily::DailyOutcome;
use crate::rollup::monthly::MonthlyOutcome;
use crate::rollup::pipeline::{self, RunOutcome};
use crate::rollup::yearly::YearlyOutcome;

fn describe(outcome: &RunOutcome, report: &mut CommandReport) {
    report.detail(format!("manifest={}", outcome.manifest_path.display()));

    match &outcome.daily {
        DailyOutcome::NothingToDo => report.detail("daily: nothing to do"),
        DailyOutcome::Deferred { tag, pending } => report.detail(format!(
            "daily: {tag} deferred to monthly rollup (pending={pending})"
        )),
        DailyOutcome::Publish { tag, state } => {
            report.detail(format!("daily: {tag} {}", state.as_str()))
        }
    }

    match &outcome.monthly {
        MonthlyOutcome::NotDue { pending } => {
            report.detail(format!("monthly: not due (pending daily={pending})"))
        }
        MonthlyOutcome::CaughtUp { name, publish } => {
            report.detail(format!("monthly: {name} {} (catch-up)", publish.as_str()))
        }
        MonthlyOutcome::Consolidated(rollup) => {
            report.detail(format!(
                "monthly: consolidated {} daily captures into {}",
                rollup.consolidated.len(),
                rollup.name
            ));
            report.detail(format!("monthly.archive={}", rollup.archive_path.display()));
            report.detail(format!("monthly.bytes={}", rollup.bytes));
            report.detail(format!("monthly.sha256={}", rollup.sha256));
            report.detail(format!("monthly.fetched={}", rollup.fetched.join(",")));
            report.detail(format!("monthly.release={}", rollup.publish.as_str()));
            report.detail(format!("monthly.commit={}", rollup.commit.summary()));
            report.detail(format!(
                "monthly.cleanup attempted={} failed={}",
                rollup.cleanup.attempted.len(),
                rollup.cleanup.failures.len()
            ));
        }
    }

    match &outcome.yearly {
        YearlyOutcome::NotDue { pending } => {
            report.detail(format!("yearly: not due (pending monthly={pending})"))
        }
        YearlyOutcome::Resumed { name, commit } => {
            report.detail(format!("yearly: {name} resumed ({})", commit.summary()))
        }
        YearlyOutcome::Consolidated(rollup) => {
            report.detail(format!(
                "yearly: consolidated {} monthly archives into {}",
                rollup.consolidated.len(),
                rollup.record.name
            ));
            report.detail(format!("yearly.identifier={}", rollup.identifier));
            report.detail(format!("yearly.url={}", rollup.record.url));
            report.detail(format!("yearly.archive={}", rollup.archive_path.display()));
            report.detail(format!("yearly.bytes={}", rollup.bytes));
            report.detail(format!("yearly.fetched={}", rollup.fetched.join(",")));
            report.detail(format!("yearly.sha256={}", rollup.sha256));
            report.detail(format!("yearly.commit={}", rollup.commit.summary()));
            report.detail(format!(
                "yearly.cleanup attempted={} failed={}",
                rollup.cleanup.attempted.len(),
                rollup.cleanup.failures.len()
            ));
        }
    }

    let transitions = outcome
        .transitions
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>();
    report.detail(format!(
        "transitions={}",
        if transitions.is_empty() {
            "none".to_string()
        } else {
            transitions.join(",")
        }
    ));
    if !outcome.recovered.attempted.is_empty() {
        report.detail(format!(
            "cleanup.retried={} failed={}",
            outcome.recovered.attempted.join(","),
            outcome.recovered.failures.len()
        ));
    }
    for failure in outcome.cleanup_failures() {
        report.detail(format!("cleanup.warning={failure}"));
    }
    report.detail(format!(
        "counts daily={} monthly={} yearly={}",
        outcome.manifest.daily.len(),
        outcome.manifest.monthly.len(),
        outcome.manifest.yearly.len()
    ));
}

pub fn run() -> Result<CommandReport> {
    let mut report = CommandReport::new("run");
    let outcome = pipeline::run_once()?;
    describe(&outcome, &mut report);
    Ok(report)
}
