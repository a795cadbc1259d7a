use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use tokio::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitStatus {
    pub branch: String,
    pub dirty: bool,
}

impl GitStatus {
    /// `(main)` or `(main*)` when the worktree has changes.
    pub fn label(&self) -> String {
        let marker = if self.dirty { "*" } else { "" };
        format!("({}{marker})", self.branch)
    }
}

/// Reads branch and dirtiness from `git status --porcelain=v1 --branch`.
#[derive(Debug, Clone)]
pub struct GitStatusProbe {
    cwd: Option<PathBuf>,
    timeout: Duration,
}

impl GitStatusProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { cwd: None, timeout }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// `Ok(None)` outside a repository or when git is too slow to answer.
    pub async fn status(&self) -> anyhow::Result<Option<GitStatus>> {
        let mut command = Command::new("git");
        command
            .args(["status", "--porcelain=v1", "--branch"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(output) => output.context("failed to run git status")?,
            Err(_) => {
                tracing::debug!("git status timed out after {}ms", self.timeout.as_millis());
                return Ok(None);
            }
        };
        if !output.status.success() {
            return Ok(None);
        }
        Ok(parse_porcelain(&String::from_utf8_lossy(&output.stdout)))
    }
}

pub(crate) fn parse_porcelain(output: &str) -> Option<GitStatus> {
    let mut lines = output.lines();
    let header = lines.next()?.strip_prefix("## ")?;
    let branch = if let Some(rest) = header.strip_prefix("No commits yet on ") {
        rest.to_string()
    } else if header.starts_with("HEAD (no branch)") {
        "HEAD".to_string()
    } else {
        let end = header.find("...").or_else(|| header.find(' ')).unwrap_or(header.len());
        header[..end].to_string()
    };
    let dirty = lines.any(|line| !line.trim().is_empty());
    Some(GitStatus { branch, dirty })
}
