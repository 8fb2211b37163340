pub mod gh;
pub mod git;
pub mod ia;
pub mod process;

#[cfg(test)]
pub mod fake;

use anyhow::Result;
use std::path::Path;

/// Short-term release storage on the version-control host.
pub trait ReleaseHost {
    fn release_exists(&self, tag: &str) -> Result<bool>;
    fn create_release(&self, tag: &str, asset: &Path, title: &str, notes: &str) -> Result<()>;
    /// Download the asset matching `pattern` from release `tag` into `dest_dir`.
    fn download_asset(&self, tag: &str, pattern: &str, dest_dir: &Path) -> Result<()>;
    /// Delete release `tag`; a release that does not exist is not an error.
    fn delete_release(&self, tag: &str) -> Result<()>;
}

pub trait VersionControl {
    fn commit_exists(&self, message: &str) -> Result<bool>;
    /// Stage `paths`, commit with `message`, and push the current branch.
    fn commit_and_push(&self, paths: &[&Path], message: &str) -> Result<()>;
    fn local_tag_exists(&self, tag: &str) -> Result<bool>;
    fn remote_tag_exists(&self, tag: &str) -> Result<bool>;
    fn create_tag(&self, tag: &str) -> Result<()>;
    fn push_tag(&self, tag: &str) -> Result<()>;
    /// Remove `tag` locally and on the remote.
    fn delete_tag(&self, tag: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMetadata {
    pub collection: String,
    pub title: String,
    pub mediatype: String,
    pub creator: String,
}

/// Append-only cold archive for yearly bundles.
pub trait ColdStorage {
    fn upload(&self, identifier: &str, file: &Path, metadata: &ArchiveMetadata) -> Result<()>;
    fn download_url(&self, identifier: &str, file_name: &str) -> String;
}

/// The collaborators one pipeline run talks to.
#[derive(Clone, Copy)]
pub struct Remotes<'a> {
    pub releases: &'a dyn ReleaseHost,
    pub vcs: &'a dyn VersionControl,
    pub cold: &'a dyn ColdStorage,
}
