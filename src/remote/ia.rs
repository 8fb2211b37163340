use crate::remote::process::{IA, Tool};
use crate::remote::{ArchiveMetadata, ColdStorage};
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::Path;

/// Cold storage through the `ia` uploader.
pub struct IaArchive {
    tool: Tool,
    download_base_url: String,
}

impl IaArchive {
    pub fn resolve(work_dir: &Path, download_base_url: &str) -> Result<Self> {
        Ok(Self {
            tool: Tool::resolve(&IA, work_dir)?,
            download_base_url: download_base_url.to_string(),
        })
    }
}

pub fn download_url(base_url: &str, identifier: &str, file_name: &str) -> String {
    format!(
        "{}/{identifier}/{file_name}",
        base_url.trim_end_matches('/')
    )
}

fn metadata_args(metadata: &ArchiveMetadata) -> Vec<String> {
    vec![
        format!("--metadata=collection:{}", metadata.collection),
        format!("--metadata=title:{}", metadata.title),
        format!("--metadata=mediatype:{}", metadata.mediatype),
        format!("--metadata=creator:{}", metadata.creator),
    ]
}

impl ColdStorage for IaArchive {
    fn upload(&self, identifier: &str, file: &Path, metadata: &ArchiveMetadata) -> Result<()> {
        let mut args: Vec<OsString> = vec!["upload".into(), identifier.into()];
        args.push(file.as_os_str().to_owned());
        args.extend(metadata_args(metadata).into_iter().map(OsString::from));
        self.tool
            .run(&args)
            .with_context(|| format!("cold storage upload failed for {identifier}"))?;
        Ok(())
    }

    fn download_url(&self, identifier: &str, file_name: &str) -> String {
        download_url(&self.download_base_url, identifier, file_name)
    }
}
