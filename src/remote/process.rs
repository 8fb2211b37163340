use crate::error::RollupError;
use crate::rollup::util::tail_chars;
use anyhow::{Context, Result};
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const OUTPUT_TAIL_CHARS: usize = 600;

#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub env_var: &'static str,
}

pub const GH: ToolSpec = ToolSpec {
    name: "gh",
    env_var: "ROLLUP_GH_BIN",
};
pub const GIT: ToolSpec = ToolSpec {
    name: "git",
    env_var: "ROLLUP_GIT_BIN",
};
pub const IA: ToolSpec = ToolSpec {
    name: "ia",
    env_var: "ROLLUP_IA_BIN",
};

pub const REQUIRED_TOOLS: [ToolSpec; 3] = [GH, GIT, IA];

fn ensure_file(path: &Path, tool: &ToolSpec) -> Result<()> {
    let meta = fs::metadata(path).map_err(|_| {
        RollupError::MissingTool(format!(
            "{} path from {} does not exist: {}",
            tool.name,
            tool.env_var,
            path.display()
        ))
    })?;
    if !meta.is_file() {
        return Err(RollupError::MissingTool(format!(
            "{} path from {} is not a file: {}",
            tool.name,
            tool.env_var,
            path.display()
        ))
        .into());
    }
    Ok(())
}

/// Binary from the tool's env override, else from PATH.
pub fn resolve_bin(tool: &ToolSpec) -> Result<PathBuf> {
    if let Ok(custom) = env::var(tool.env_var) {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            let path = PathBuf::from(trimmed);
            ensure_file(&path, tool)?;
            return Ok(path);
        }
    }
    which::which(tool.name).map_err(|_| {
        RollupError::MissingTool(format!(
            "{} not found in {} or PATH",
            tool.name, tool.env_var
        ))
        .into()
    })
}

#[derive(Debug, Clone)]
pub struct Tool {
    bin: PathBuf,
    cwd: PathBuf,
}

impl Tool {
    pub fn resolve(spec: &ToolSpec, cwd: &Path) -> Result<Self> {
        Ok(Self {
            bin: resolve_bin(spec)?,
            cwd: cwd.to_path_buf(),
        })
    }

    fn describe<S: AsRef<OsStr>>(&self, args: &[S]) -> String {
        let mut out = self.bin.display().to_string();
        for arg in args {
            out.push(' ');
            out.push_str(&arg.as_ref().to_string_lossy());
        }
        out
    }

    /// Run to completion and return the raw output, whatever the exit status.
    pub fn output<S: AsRef<OsStr>>(&self, args: &[S]) -> Result<Output> {
        Command::new(&self.bin)
            .args(args)
            .current_dir(&self.cwd)
            .output()
            .with_context(|| format!("failed to run `{}`", self.describe(args)))
    }

    /// Run and fail unless the command exits successfully.
    pub fn run<S: AsRef<OsStr>>(&self, args: &[S]) -> Result<Output> {
        let out = self.output(args)?;
        if out.status.success() {
            return Ok(out);
        }
        anyhow::bail!(
            "command failed: {}\nstdout: {}\nstderr: {}",
            self.describe(args),
            tail_chars(&String::from_utf8_lossy(&out.stdout), OUTPUT_TAIL_CHARS),
            tail_chars(&String::from_utf8_lossy(&out.stderr), OUTPUT_TAIL_CHARS)
        )
    }
}

pub fn combined_lowercase(out: &Output) -> String {
    format!(
        "{}\n{}",
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    )
    .to_ascii_lowercase()
}
