use crate::remote::VersionControl;
use anyhow::{Context, Result};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitTagOutcome {
    pub committed: bool,
    pub tag_created: bool,
    pub tag_pushed: bool,
}

impl CommitTagOutcome {
    pub fn did_work(&self) -> bool {
        self.committed || self.tag_created || self.tag_pushed
    }

    pub fn summary(&self) -> String {
        format!(
            "committed={} tag_created={} tag_pushed={}",
            self.committed, self.tag_created, self.tag_pushed
        )
    }
}

/// Commit the manifest under `label` and tag it, skipping whatever a previous
/// run already finished. The commit check and the tag checks are independent
/// so a run that committed but failed to push its tag completes on retry.
pub fn commit_and_tag(
    vcs: &dyn VersionControl,
    manifest_path: &Path,
    label: &str,
) -> Result<CommitTagOutcome> {
    let mut out = CommitTagOutcome::default();

    if !vcs.commit_exists(label)? {
        vcs.commit_and_push(&[manifest_path], label)
            .with_context(|| format!("failed to commit manifest as `{label}`"))?;
        out.committed = true;
    }

    if !vcs.local_tag_exists(label)? {
        vcs.create_tag(label)?;
        out.tag_created = true;
    }

    if !vcs.remote_tag_exists(label)? {
        vcs.push_tag(label)?;
        out.tag_pushed = true;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::fake::FakeRemotes;

    #[test]
    fn second_call_is_a_no_op() {
        let fake = FakeRemotes::default();
        let first = commit_and_tag(&fake, Path::new("manifest.json"), "daily_20240101")
            .expect("first");
        assert_eq!(
            first,
            CommitTagOutcome {
                committed: true,
                tag_created: true,
                tag_pushed: true
            }
        );

        let second = commit_and_tag(&fake, Path::new("manifest.json"), "daily_20240101")
            .expect("second");
        assert_eq!(second, CommitTagOutcome::default());
        assert_eq!(fake.snapshot().commits, vec!["daily_20240101".to_string()]);
    }

    #[test]
    fn unpushed_tag_is_completed_without_recommitting() {
        let fake = FakeRemotes::default();
        {
            let mut state = fake.state.borrow_mut();
            state.commits.push("monthly_20240101_20240131".into());
            state.local_tags.insert("monthly_20240101_20240131".into());
        }

        let out = commit_and_tag(&fake, Path::new("manifest.json"), "monthly_20240101_20240131")
            .expect("retry");
        assert!(!out.committed);
        assert!(!out.tag_created);
        assert!(out.tag_pushed);
        assert_eq!(fake.snapshot().commits.len(), 1);
    }
}
