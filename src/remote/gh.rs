use crate::remote::ReleaseHost;
use crate::remote::process::{GH, Tool, combined_lowercase};
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::Path;

/// Releases managed through the `gh` CLI.
pub struct GhReleases {
    tool: Tool,
    repo: Option<String>,
}

/// gh's wording for an absent release; other "not found" errors (unknown
/// repo, bad host) are real failures.
fn is_missing_release(lowered: &str) -> bool {
    lowered.contains("release not found")
}

impl GhReleases {
    pub fn resolve(work_dir: &Path, repo: Option<String>) -> Result<Self> {
        Ok(Self {
            tool: Tool::resolve(&GH, work_dir)?,
            repo,
        })
    }

    fn args<I, S>(&self, base: I) -> Vec<OsString>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut out: Vec<OsString> = base.into_iter().map(Into::into).collect();
        if let Some(repo) = &self.repo {
            out.push("--repo".into());
            out.push(repo.into());
        }
        out
    }
}

impl ReleaseHost for GhReleases {
    fn release_exists(&self, tag: &str) -> Result<bool> {
        let out = self.tool.output(&self.args(["release", "view", tag]))?;
        if out.status.success() {
            return Ok(true);
        }
        let lowered = combined_lowercase(&out);
        if is_missing_release(&lowered) {
            return Ok(false);
        }
        anyhow::bail!(
            "gh release view {tag} failed: {}",
            String::from_utf8_lossy(&out.stderr).trim()
        )
    }

    fn create_release(&self, tag: &str, asset: &Path, title: &str, notes: &str) -> Result<()> {
        let mut base: Vec<OsString> = vec!["release".into(), "create".into(), tag.into()];
        base.push(asset.as_os_str().to_owned());
        base.extend(["--title".into(), title.into(), "--notes".into(), notes.into()]);
        self.tool
            .run(&self.args(base))
            .with_context(|| format!("failed to create release {tag}"))?;
        Ok(())
    }

    fn download_asset(&self, tag: &str, pattern: &str, dest_dir: &Path) -> Result<()> {
        let mut base: Vec<OsString> = vec![
            "release".into(),
            "download".into(),
            tag.into(),
            "--pattern".into(),
            pattern.into(),
            "--dir".into(),
        ];
        base.push(dest_dir.as_os_str().to_owned());
        base.push("--clobber".into());
        self.tool.run(&self.args(base))?;
        Ok(())
    }

    fn delete_release(&self, tag: &str) -> Result<()> {
        let out = self
            .tool
            .output(&self.args(["release", "delete", tag, "--yes", "--cleanup-tag"]))?;
        if out.status.success() {
            return Ok(());
        }
        let lowered = combined_lowercase(&out);
        if is_missing_release(&lowered) {
            return Ok(());
        }
        anyhow::bail!(
            "gh release delete {tag} failed: {}",
            String::from_utf8_lossy(&out.stderr).trim()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::is_missing_release;

    #[test]
    fn missing_release_detection_matches_gh_wording() {
        assert!(is_missing_release("\nrelease not found\n"));
        assert!(!is_missing_release("http 401: bad credentials"));
        assert!(!is_missing_release(
            "http 404: not found (https://api.github.com/repos/acme/scrpes/releases/tags/daily_20240101)"
        ));
        assert!(!is_missing_release("could not resolve to a repository: not found"));
    }
}
