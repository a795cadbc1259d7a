use std::path::Path;
use std::process::Stdio;

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;

use super::Explainer;

/// Explains a command line by the one-line manual summary of its program.
#[derive(Debug, Clone)]
pub struct WhatisExplainer {
    program: String,
}

impl Default for WhatisExplainer {
    fn default() -> Self {
        Self::with_program("whatis")
    }
}

impl WhatisExplainer {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

fn program_name(text: &str) -> Option<String> {
    let words = shlex::split(text)
        .unwrap_or_else(|| text.split_whitespace().map(String::from).collect());
    let first = words
        .into_iter()
        .find(|word| !word.contains('=') || word.starts_with('='))?;
    let name = Path::new(&first)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or(first);
    Some(name)
}

#[async_trait]
impl Explainer for WhatisExplainer {
    async fn explain(&self, text: &str) -> anyhow::Result<String> {
        let Some(name) = program_name(text) else {
            return Ok(String::new());
        };
        let output = Command::new(&self.program)
            .arg(&name)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to run {}", self.program))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let first_line = stdout
            .lines()
            .next()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_default();
        if !output.status.success() || first_line.is_empty() {
            return Ok(format!("{name}: no manual entry"));
        }
        Ok(first_line)
    }
}
