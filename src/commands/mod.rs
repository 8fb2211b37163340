pub mod run;
pub mod status;
pub mod verify;

use crate::remote::process::{REQUIRED_TOOLS, resolve_bin};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }

    pub fn merge(&mut self, mut other: CommandReport) {
        self.ok &= other.ok;
        self.details.append(&mut other.details);
        self.issues.append(&mut other.issues);
    }
}

/// Record every required tool, flagging the ones that do not resolve.
pub fn ensure_tools_available(report: &mut CommandReport) -> bool {
    let mut all_ok = true;
    for tool in &REQUIRED_TOOLS {
        match resolve_bin(tool) {
            Ok(path) => report.detail(format!("tool.{}={}", tool.name, path.display())),
            Err(err) => {
                all_ok = false;
                report.issue(format!("{err}; set {} or put it on PATH", tool.env_var));
            }
        }
    }
    all_ok
}

#[cfg(test)]
mod tests {
    use super::CommandReport;

    #[test]
    fn merge_keeps_failures_sticky() {
        let mut report = CommandReport::new("verify");
        report.detail("a");
        let mut other = CommandReport::new("status");
        other.issue("manifest missing");
        report.merge(other);
        assert!(!report.ok);
        assert_eq!(report.details, vec!["a".to_string()]);
        assert_eq!(report.issues, vec!["manifest missing".to_string()]);
    }
}
