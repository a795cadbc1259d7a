use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use lookahead_editor::ConfigOverrides;
use lookahead_editor::EditorConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod repl;

const LOG_FILE: &str = "lookahead.log";
const DEFAULT_LOG_FILTER: &str = "lookahead=info";

/// Interactive shell line editor with predicted completions.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// Seconds on an empty line before the idle summary appears. 0 disables it.
    #[arg(long = "idle-threshold", value_name = "SECS")]
    idle_threshold: Option<u64>,

    /// Content rows inside the assistant box.
    #[arg(long = "box-height", value_name = "ROWS")]
    box_height: Option<u16>,

    /// Label shown in the top border of the assistant box.
    #[arg(long)]
    badge: Option<String>,

    /// Quiet period after the last keystroke before a prediction is requested.
    #[arg(long = "debounce-ms", value_name = "MS")]
    debounce_ms: Option<u64>,

    /// Shell that runs committed commands with `-c`.
    #[arg(long, default_value = "sh")]
    shell: String,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::default();
        if let Some(secs) = self.idle_threshold {
            overrides = overrides.with_idle_threshold(Duration::from_secs(secs));
        }
        if let Some(rows) = self.box_height {
            overrides = overrides.with_box_height(rows);
        }
        if let Some(badge) = &self.badge {
            overrides = overrides.with_badge(badge.clone());
        }
        if let Some(ms) = self.debounce_ms {
            overrides = overrides.with_debounce(Duration::from_millis(ms));
        }
        overrides
    }
}

/// Log to `<home>/log/lookahead.log`; stderr belongs to the editor frame.
fn init_logging(config: &EditorConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let Some(log_dir) = config.log_dir() else {
        return Ok(None);
    };
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(&log_dir, LOG_FILE));

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(writer)
        .try_init();
    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = EditorConfig::load_with_overrides(cli.overrides()).context("failed to load configuration")?;
    let _log_guard = init_logging(&config)?;
    tracing::info!("starting lookahead {}", env!("CARGO_PKG_VERSION"));
    repl::run(&cli.shell, &config).await
}
