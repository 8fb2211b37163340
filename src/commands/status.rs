use anyhow::Result;

use crate::commands::CommandReport;
use crate::rollup::cleanup_queue;
use crate::rollup::config::load_config;
use crate::rollup::manifest;
use crate::rollup::paths::resolve_paths;
use crate::rollup::transitions::plan;

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let loaded = load_config(&paths)?;
    let cfg = &loaded.config;
    let mut report = CommandReport::new("status");

    report.detail(format!("work_dir={}", paths.work_dir.display()));
    report.detail(format!("logs_dir={}", paths.logs_dir.display()));
    report.detail(format!(
        "config={}",
        loaded
            .source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "defaults".to_string())
    ));
    report.detail(format!(
        "threshold.monthly={} threshold.yearly={}",
        cfg.thresholds.monthly, cfg.thresholds.yearly
    ));

    let manifest_path = paths.manifest_file(&cfg.manifest.path);
    report.detail(format!("manifest={}", manifest_path.display()));
    let manifest = match manifest::load(&manifest_path) {
        Ok(manifest) => manifest,
        Err(err) => {
            report.issue(format!("{err:#}"));
            return Ok(report);
        }
    };

    report.detail(format!(
        "pending.daily={} pending.monthly={} yearly={}",
        manifest.daily.len(),
        manifest.monthly.len(),
        manifest.yearly.len()
    ));
    if let Some(id) = manifest.daily.last() {
        report.detail(format!("latest.daily={id}"));
        if !paths.daily_file(id).is_file() {
            report.issue(format!(
                "latest daily capture missing locally: {}",
                paths.daily_file(id).display()
            ));
        }
    }
    if let Some(name) = manifest.monthly.last() {
        report.detail(format!("latest.monthly={name}"));
    }
    if let Some(record) = manifest.yearly.last() {
        report.detail(format!("latest.yearly={} url={}", record.name, record.url));
    }

    match cleanup_queue::load(&paths) {
        Ok(queue) if !queue.tags.is_empty() => {
            report.detail(format!("pending.cleanup={}", queue.tags.join(",")))
        }
        Ok(_) => {}
        Err(err) => report.issue(format!("{err:#}")),
    }

    let planned = plan(&manifest, &cfg.thresholds);
    report.detail(format!(
        "planned={}",
        if planned.is_empty() {
            "none".to_string()
        } else {
            planned
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(",")
        }
    ));

    Ok(report)
}
