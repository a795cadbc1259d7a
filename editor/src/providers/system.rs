use std::path::Path;

use async_trait::async_trait;

use super::ContextProbe;
use super::ContextSnapshot;
use super::GitStatusProbe;

/// Samples cwd, git status, load average, and `user@host` from the machine.
#[derive(Debug, Clone)]
pub struct SystemProbe {
    git: GitStatusProbe,
}

impl SystemProbe {
    pub fn new(git: GitStatusProbe) -> Self {
        Self { git }
    }
}

#[async_trait]
impl ContextProbe for SystemProbe {
    async fn probe(&self) -> anyhow::Result<ContextSnapshot> {
        let cwd = std::env::current_dir()
            .ok()
            .map(|cwd| abbreviate_home(&cwd, dirs::home_dir().as_deref()));
        let git = match self.git.status().await {
            Ok(status) => status,
            Err(err) => {
                tracing::debug!("git probe failed: {err:#}");
                None
            }
        };
        Ok(ContextSnapshot {
            cwd,
            git,
            load_average: read_load_average().await,
            user_host: Some(user_at_host()),
        })
    }
}

/// Display `path` with the home directory shown as `~`.
pub fn abbreviate_home(path: &Path, home: Option<&Path>) -> String {
    if let Some(home) = home
        && let Ok(rest) = path.strip_prefix(home)
    {
        if rest.as_os_str().is_empty() {
            return "~".to_string();
        }
        return format!("~/{}", rest.display());
    }
    path.display().to_string()
}

pub fn user_at_host() -> String {
    let host = gethostname::gethostname();
    let host = host.to_string_lossy();
    let short_host = host.split('.').next().unwrap_or_default();
    format!("{}@{short_host}", whoami::username())
}

async fn read_load_average() -> Option<f64> {
    let contents = tokio::fs::read_to_string("/proc/loadavg").await.ok()?;
    parse_load_average(&contents)
}

fn parse_load_average(contents: &str) -> Option<f64> {
    contents.split_whitespace().next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn home_is_abbreviated() {
        let home = PathBuf::from("/home/dev");
        assert_eq!(abbreviate_home(Path::new("/home/dev/src/app"), Some(&home)), "~/src/app");
        assert_eq!(abbreviate_home(Path::new("/home/dev"), Some(&home)), "~");
        assert_eq!(abbreviate_home(Path::new("/tmp"), Some(&home)), "/tmp");
        assert_eq!(abbreviate_home(Path::new("/tmp"), None), "/tmp");
    }

    #[test]
    fn load_average_takes_first_field() {
        assert_eq!(parse_load_average("0.42 0.30 0.25 1/123 4567\n"), Some(0.42));
        assert_eq!(parse_load_average(""), None);
    }

    #[tokio::test]
    async fn load_average_is_read_where_procfs_exists() {
        let load = read_load_average().await;
        assert_eq!(load.is_some(), Path::new("/proc/loadavg").exists());
    }
}
