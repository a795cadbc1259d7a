use std::time::Duration;

use lookahead_shell_command::SyntaxError;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("terminal unavailable: {0}")]
    Terminal(String),

    #[error("input closed before the line was finished")]
    HostClosed,
}

/// A failed or timed-out provider call, flattened to its message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProviderFailure {
    message: String,
}

impl ProviderFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn timed_out(limit: Duration) -> Self {
        Self::new(format!("timed out after {}ms", limit.as_millis()))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<anyhow::Error> for ProviderFailure {
    fn from(err: anyhow::Error) -> Self {
        Self::new(format!("{err:#}"))
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderFailure>;
