use anyhow::Result;
use std::env;

use crate::commands::{CommandReport, ensure_tools_available, status};

include!(concat!(env!("OUT_DIR"), "/rollup_env_allowlist.rs"));

const ENV_PREFIX: &str = "ROLLUP_";

#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    pub strict: bool,
}

/// Prefixed variables that nothing in this binary reads.
fn unknown_env_keys<I>(vars: I, allowlist: &[&str]) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut unknown = vars
        .into_iter()
        .filter(|key| key.starts_with(ENV_PREFIX))
        .filter(|key| !allowlist.contains(&key.as_str()))
        .collect::<Vec<_>>();
    unknown.sort();
    unknown.dedup();
    unknown
}

pub fn run(opts: &VerifyOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("verify");

    if ensure_tools_available(&mut report) {
        report.detail("tools: ok");
    }

    let unknown = unknown_env_keys(env::vars().map(|(key, _)| key), GENERATED_ROLLUP_ENV_ALLOWLIST);
    for key in &unknown {
        if opts.strict {
            report.issue(format!("unknown environment variable: {key}"));
        } else {
            report.detail(format!("warning: unknown environment variable: {key}"));
        }
    }

    match status::run() {
        Ok(status_report) => report.merge(status_report),
        Err(err) => report.issue(format!("{err:#}")),
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::unknown_env_keys;

    #[test]
    fn flags_only_prefixed_keys_missing_from_allowlist() {
        let prefix = super::ENV_PREFIX;
        let known = format!("{prefix}KNOWN");
        let typo = format!("{prefix}MONTHY_THRESHOLD");
        let allowlist = [known.as_str()];
        let vars = vec![
            "PATH".to_string(),
            known.clone(),
            typo.clone(),
            typo.clone(),
        ];
        assert_eq!(unknown_env_keys(vars, &allowlist), vec![typo]);
    }

    #[test]
    fn generated_allowlist_covers_runtime_keys() {
        let allowlist = super::GENERATED_ROLLUP_ENV_ALLOWLIST;
        for tool in &crate::remote::process::REQUIRED_TOOLS {
            assert!(allowlist.contains(&tool.env_var), "{}", tool.env_var);
        }
        assert!(!allowlist.iter().any(|key| key.ends_with("WARN")));
    }
}
