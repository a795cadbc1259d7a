use async_trait::async_trait;

use super::GitStatusProbe;
use super::PromptGenerator;
use super::abbreviate_home;
use super::user_at_host;

#[derive(Debug, Clone)]
pub struct StaticPrompt(pub String);

#[async_trait]
impl PromptGenerator for StaticPrompt {
    async fn prompt(&self) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}

/// `user@host:~/dir (branch*)$ `
#[derive(Debug, Clone)]
pub struct CwdPrompt {
    git: GitStatusProbe,
}

impl CwdPrompt {
    pub fn new(git: GitStatusProbe) -> Self {
        Self { git }
    }
}

#[async_trait]
impl PromptGenerator for CwdPrompt {
    async fn prompt(&self) -> anyhow::Result<String> {
        let cwd = std::env::current_dir()?;
        let cwd = abbreviate_home(&cwd, dirs::home_dir().as_deref());
        let branch = match self.git.status().await {
            Ok(Some(status)) => format!(" {}", status.label()),
            Ok(None) | Err(_) => String::new(),
        };
        Ok(format!("{}:{cwd}{branch}$ ", user_at_host()))
    }
}
