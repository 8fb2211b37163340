use crate::remote::VersionControl;
use crate::remote::process::{GIT, Tool, combined_lowercase};
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::Path;

pub struct GitRepo {
    tool: Tool,
    remote: String,
}

impl GitRepo {
    pub fn resolve(work_dir: &Path, remote: &str) -> Result<Self> {
        Ok(Self {
            tool: Tool::resolve(&GIT, work_dir)?,
            remote: remote.to_string(),
        })
    }
}

fn has_subject(log: &str, message: &str) -> bool {
    log.lines().any(|line| line == message)
}

impl VersionControl for GitRepo {
    fn commit_exists(&self, message: &str) -> Result<bool> {
        let out = self.tool.output(&["log", "--format=%s"])?;
        if !out.status.success() {
            let lowered = combined_lowercase(&out);
            if lowered.contains("does not have any commits") {
                return Ok(false);
            }
            anyhow::bail!(
                "git log failed: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }
        Ok(has_subject(&String::from_utf8_lossy(&out.stdout), message))
    }

    fn commit_and_push(&self, paths: &[&Path], message: &str) -> Result<()> {
        let mut add: Vec<OsString> = vec!["add".into(), "--".into()];
        add.extend(paths.iter().map(|p| p.as_os_str().to_owned()));
        self.tool.run(&add).context("failed to stage manifest")?;

        // Empty commits are allowed so the label lands even when the
        // manifest was already committed under another message.
        self.tool
            .run(&["commit", "--allow-empty", "-m", message])
            .with_context(|| format!("failed to commit `{message}`"))?;
        self.tool
            .run(&["push", self.remote.as_str(), "HEAD"])
            .with_context(|| format!("failed to push `{message}`"))?;
        Ok(())
    }

    fn local_tag_exists(&self, tag: &str) -> Result<bool> {
        let out = self.tool.run(&["tag", "--list", tag])?;
        Ok(has_subject(&String::from_utf8_lossy(&out.stdout), tag))
    }

    fn remote_tag_exists(&self, tag: &str) -> Result<bool> {
        let reference = format!("refs/tags/{tag}");
        let out = self.tool.run(&[
            "ls-remote",
            "--tags",
            self.remote.as_str(),
            reference.as_str(),
        ])?;
        Ok(!String::from_utf8_lossy(&out.stdout).trim().is_empty())
    }

    fn create_tag(&self, tag: &str) -> Result<()> {
        self.tool
            .run(&["tag", tag])
            .with_context(|| format!("failed to create tag {tag}"))?;
        Ok(())
    }

    fn push_tag(&self, tag: &str) -> Result<()> {
        let reference = format!("refs/tags/{tag}");
        self.tool
            .run(&["push", self.remote.as_str(), reference.as_str()])
            .with_context(|| format!("failed to push tag {tag}"))?;
        Ok(())
    }

    fn delete_tag(&self, tag: &str) -> Result<()> {
        let mut failures = Vec::new();
        if self.local_tag_exists(tag)? {
            if let Err(err) = self.tool.run(&["tag", "-d", tag]) {
                failures.push(format!("local: {err:#}"));
            }
        }
        if self.remote_tag_exists(tag)? {
            let reference = format!(":refs/tags/{tag}");
            if let Err(err) = self.tool.run(&["push", self.remote.as_str(), reference.as_str()]) {
                failures.push(format!("remote: {err:#}"));
            }
        }
        if failures.is_empty() {
            return Ok(());
        }
        anyhow::bail!("failed to delete tag {tag}: {}", failures.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::has_subject;

    #[test]
    fn commit_subjects_match_exactly() {
        let log = "monthly_20240101_20240131\ndaily_20240131\n";
        assert!(has_subject(log, "daily_20240131"));
        assert!(!has_subject(log, "daily_2024013"));
        assert!(!has_subject("", "daily_20240131"));
    }
}
