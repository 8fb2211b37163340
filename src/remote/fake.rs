use crate::remote::{ArchiveMetadata, ColdStorage, ReleaseHost, VersionControl};
use anyhow::{Result, anyhow};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FakeRelease {
    pub asset_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct FakeUpload {
    pub identifier: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub metadata: ArchiveMetadata,
}

#[derive(Debug, Clone, Default)]
pub struct FakeState {
    pub releases: BTreeMap<String, FakeRelease>,
    pub deleted_releases: BTreeSet<String>,
    pub commits: Vec<String>,
    pub local_tags: BTreeSet<String>,
    pub remote_tags: BTreeSet<String>,
    pub uploads: Vec<FakeUpload>,
    pub calls: Vec<String>,
    pub fail_deletes: bool,
    pub fail_pushes: bool,
    /// Once a call starting with the prefix is made, turn the path into a
    /// directory so later appends to it fail.
    pub wedge_after: Option<(String, PathBuf)>,
}

/// In-memory release host, repository and cold archive.
#[derive(Debug, Default)]
pub struct FakeRemotes {
    pub state: RefCell<FakeState>,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

impl FakeRemotes {
    pub fn snapshot(&self) -> FakeState {
        self.state.borrow().clone()
    }

    pub fn seed_release(&self, tag: &str, asset: &Path) {
        let bytes = fs::read(asset).expect("read seeded asset");
        self.state.borrow_mut().releases.insert(
            tag.to_string(),
            FakeRelease {
                asset_name: file_name(asset),
                bytes,
            },
        );
    }

    fn record(&self, call: String) {
        let mut state = self.state.borrow_mut();
        if let Some((prefix, path)) = &state.wedge_after
            && call.starts_with(prefix.as_str())
        {
            let _ = fs::remove_file(path);
            fs::create_dir_all(path).expect("wedge path");
        }
        state.calls.push(call);
    }
}

impl ReleaseHost for FakeRemotes {
    fn release_exists(&self, tag: &str) -> Result<bool> {
        self.record(format!("release-exists {tag}"));
        Ok(self.state.borrow().releases.contains_key(tag))
    }

    fn create_release(&self, tag: &str, asset: &Path, _title: &str, _notes: &str) -> Result<()> {
        self.record(format!("release-create {tag}"));
        let bytes = fs::read(asset)?;
        let mut state = self.state.borrow_mut();
        if state.releases.contains_key(tag) {
            return Err(anyhow!("release {tag} already exists"));
        }
        state.releases.insert(
            tag.to_string(),
            FakeRelease {
                asset_name: file_name(asset),
                bytes,
            },
        );
        Ok(())
    }

    fn download_asset(&self, tag: &str, pattern: &str, dest_dir: &Path) -> Result<()> {
        self.record(format!("release-download {tag} {pattern}"));
        let state = self.state.borrow();
        let release = state
            .releases
            .get(tag)
            .ok_or_else(|| anyhow!("release not found"))?;
        if release.asset_name != pattern {
            return Err(anyhow!("no assets match the file pattern"));
        }
        fs::write(dest_dir.join(&release.asset_name), &release.bytes)?;
        Ok(())
    }

    fn delete_release(&self, tag: &str) -> Result<()> {
        self.record(format!("release-delete {tag}"));
        let mut state = self.state.borrow_mut();
        if state.fail_deletes {
            return Err(anyhow!("HTTP 502"));
        }
        state.deleted_releases.insert(tag.to_string());
        if state.releases.remove(tag).is_some() {
            state.remote_tags.remove(tag);
        }
        Ok(())
    }
}

impl VersionControl for FakeRemotes {
    fn commit_exists(&self, message: &str) -> Result<bool> {
        Ok(self.state.borrow().commits.iter().any(|c| c == message))
    }

    fn commit_and_push(&self, _paths: &[&Path], message: &str) -> Result<()> {
        self.record(format!("commit {message}"));
        let mut state = self.state.borrow_mut();
        if state.fail_pushes {
            return Err(anyhow!("push rejected"));
        }
        state.commits.push(message.to_string());
        Ok(())
    }

    fn local_tag_exists(&self, tag: &str) -> Result<bool> {
        Ok(self.state.borrow().local_tags.contains(tag))
    }

    fn remote_tag_exists(&self, tag: &str) -> Result<bool> {
        Ok(self.state.borrow().remote_tags.contains(tag))
    }

    fn create_tag(&self, tag: &str) -> Result<()> {
        self.record(format!("tag {tag}"));
        if !self.state.borrow_mut().local_tags.insert(tag.to_string()) {
            return Err(anyhow!("tag {tag} already exists"));
        }
        Ok(())
    }

    fn push_tag(&self, tag: &str) -> Result<()> {
        self.record(format!("push-tag {tag}"));
        let mut state = self.state.borrow_mut();
        if state.fail_pushes {
            return Err(anyhow!("push rejected"));
        }
        state.remote_tags.insert(tag.to_string());
        Ok(())
    }

    fn delete_tag(&self, tag: &str) -> Result<()> {
        self.record(format!("delete-tag {tag}"));
        let mut state = self.state.borrow_mut();
        if state.fail_deletes {
            return Err(anyhow!("remote rejected"));
        }
        state.local_tags.remove(tag);
        state.remote_tags.remove(tag);
        Ok(())
    }
}

impl ColdStorage for FakeRemotes {
    fn upload(&self, identifier: &str, file: &Path, metadata: &ArchiveMetadata) -> Result<()> {
        self.record(format!("upload {identifier}"));
        let bytes = fs::read(file)?;
        self.state.borrow_mut().uploads.push(FakeUpload {
            identifier: identifier.to_string(),
            file_name: file_name(file),
            bytes,
            metadata: metadata.clone(),
        });
        Ok(())
    }

    fn download_url(&self, identifier: &str, file_name: &str) -> String {
        format!("https://cold.test/{identifier}/{file_name}")
    }
}
