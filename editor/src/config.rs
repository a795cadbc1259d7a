use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

pub const CONFIG_TOML_FILE: &str = "config.toml";
const HOME_ENV_VAR: &str = "LOOKAHEAD_HOME";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("could not find home directory")]
    NoHome,
}

/// On-disk representation of `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigToml {
    pub debounce_ms: Option<u64>,
    pub predict_timeout_ms: Option<u64>,
    pub explain_timeout_ms: Option<u64>,
    pub idle_summary_timeout_ms: Option<u64>,
    pub git_probe_timeout_ms: Option<u64>,
    pub prompt_refresh_timeout_ms: Option<u64>,
    /// Zero disables idle summaries.
    pub idle_threshold_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub box_height: Option<u16>,
    pub badge: Option<String>,
    pub continuation_prompt: Option<String>,
    pub default_explanation: Option<String>,
}

/// Programmatic overrides applied on top of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub idle_threshold: Option<Duration>,
    pub box_height: Option<u16>,
    pub badge: Option<String>,
    pub debounce: Option<Duration>,
}

impl ConfigOverrides {
    pub fn with_idle_threshold(mut self, threshold: Duration) -> Self {
        self.idle_threshold = Some(threshold);
        self
    }

    pub fn with_box_height(mut self, height: u16) -> Self {
        self.box_height = Some(height);
        self
    }

    pub fn with_badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = Some(badge.into());
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = Some(debounce);
        self
    }
}

/// Resolved editor settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    pub debounce: Duration,
    pub predict_timeout: Duration,
    pub explain_timeout: Duration,
    pub idle_summary_timeout: Duration,
    pub git_probe_timeout: Duration,
    pub prompt_refresh_timeout: Duration,
    pub idle_threshold: Option<Duration>,
    pub poll_interval: Duration,
    /// Content rows inside the assistant box.
    pub box_height: u16,
    pub badge: String,
    pub continuation_prompt: String,
    pub default_explanation: String,
    pub lookahead_home: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::from_toml(ConfigToml::default(), ConfigOverrides::default(), None)
    }
}

impl EditorConfig {
    pub fn from_toml(
        cfg: ConfigToml,
        overrides: ConfigOverrides,
        lookahead_home: Option<PathBuf>,
    ) -> Self {
        let ms = |value: Option<u64>, default: u64| Duration::from_millis(value.unwrap_or(default));
        let idle_threshold = overrides
            .idle_threshold
            .or_else(|| cfg.idle_threshold_secs.map(Duration::from_secs))
            .filter(|threshold| !threshold.is_zero());

        Self {
            debounce: overrides.debounce.unwrap_or_else(|| ms(cfg.debounce_ms, 200)),
            predict_timeout: ms(cfg.predict_timeout_ms, 10_000),
            explain_timeout: ms(cfg.explain_timeout_ms, 10_000),
            idle_summary_timeout: ms(cfg.idle_summary_timeout_ms, 30_000),
            git_probe_timeout: ms(cfg.git_probe_timeout_ms, 1_000),
            prompt_refresh_timeout: ms(cfg.prompt_refresh_timeout_ms, 2_000),
            idle_threshold,
            poll_interval: ms(cfg.poll_interval_ms, 5_000).max(Duration::from_millis(100)),
            box_height: overrides.box_height.or(cfg.box_height).unwrap_or(8).max(1),
            badge: overrides
                .badge
                .or(cfg.badge)
                .unwrap_or_else(|| "lookahead".to_string()),
            continuation_prompt: cfg.continuation_prompt.unwrap_or_else(|| "> ".to_string()),
            default_explanation: cfg.default_explanation.unwrap_or_default(),
            lookahead_home,
        }
    }

    /// Load `<home>/config.toml`, falling back to defaults when it is absent.
    pub fn load_with_overrides(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let home = find_lookahead_home()?;
        let cfg = load_config_toml(&home)?;
        Ok(Self::from_toml(cfg, overrides, Some(home)))
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.lookahead_home.as_ref().map(|home| home.join("log"))
    }
}

/// Returns the lookahead state directory: `$LOOKAHEAD_HOME` when set and
/// non-empty, else `~/.lookahead`. The directory is not required to exist.
pub fn find_lookahead_home() -> Result<PathBuf, ConfigError> {
    if let Some(value) = std::env::var_os(HOME_ENV_VAR)
        && !value.is_empty()
    {
        return Ok(PathBuf::from(value));
    }
    let mut home = dirs::home_dir().ok_or(ConfigError::NoHome)?;
    home.push(".lookahead");
    Ok(home)
}

pub fn load_config_toml(lookahead_home: &Path) -> Result<ConfigToml, ConfigError> {
    let path = lookahead_home.join(CONFIG_TOML_FILE);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("{} not found, using defaults", path.display());
            return Ok(ConfigToml::default());
        }
        Err(source) => return Err(ConfigError::Read { path, source }),
    };
    toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
}
