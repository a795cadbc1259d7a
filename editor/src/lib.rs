//! Interactive line editor with asynchronous command prediction.
//!
//! One call to [`edit_line`] runs one editing turn: keystrokes, timers and
//! provider results are fed through [`SessionController`] and every state
//! change is repainted through a [`Host`].

use std::sync::Arc;

use lookahead_shell_command::BashOracle;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;

mod completion;
mod config;
mod controller;
mod debounce;
mod error;
mod event;
mod generation;
mod history;
mod host;
mod idle;
mod line_buffer;
mod multiline;
pub mod providers;
mod render;
mod runtime;
#[cfg(any(test, feature = "test-helpers"))]
mod scripted_host;
mod scroll_state;
mod session;
mod text_formatting;

pub use completion::CompletionMenu;
pub use config::CONFIG_TOML_FILE;
pub use config::ConfigError;
pub use config::ConfigOverrides;
pub use config::ConfigToml;
pub use config::EditorConfig;
pub use config::find_lookahead_home;
pub use config::load_config_toml;
pub use controller::EditRequest;
pub use controller::SessionController;
pub use debounce::Debouncer;
pub use error::EditorError;
pub use error::ProviderFailure;
pub use error::ProviderResult;
pub use event::Command;
pub use event::Completion;
pub use event::EditorEvent;
pub use event::TimerKind;
pub use event::TimerToken;
pub use generation::Generation;
pub use generation::GenerationTracker;
pub use history::HistoryNav;
pub use history::HistorySearch;
pub use host::Host;
pub use host::TerminalHost;
pub use idle::IdleState;
pub use line_buffer::LineBuffer;
pub use multiline::EnteredLine;
pub use multiline::MultilineAssembler;
pub use providers::Providers;
pub use render::Frame;
pub use render::RenderOptions;
pub use render::render;
#[cfg(any(test, feature = "test-helpers"))]
pub use scripted_host::ScriptStep;
#[cfg(any(test, feature = "test-helpers"))]
pub use scripted_host::ScriptedHost;
pub use session::Mode;
pub use session::Session;
pub use session::Submission;

use runtime::CommandRunner;
use runtime::EventSender;

/// What an editing turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineOutcome {
    pub submission: Submission,
    /// Last prompt shown, for the caller to reuse on the next turn.
    pub prompt: String,
}

/// Run one editing turn to completion.
///
/// Returns once the line is committed, interrupted or input ends. In-flight
/// provider calls are aborted on return.
pub async fn edit_line<H: Host>(
    host: &mut H,
    request: EditRequest,
    providers: &Providers,
    config: &EditorConfig,
) -> Result<LineOutcome, EditorError> {
    let oracle = Arc::new(BashOracle::new()?);
    let mut controller = SessionController::new(
        request,
        config,
        oracle,
        providers.completion.clone(),
        providers.idle_summary.is_some(),
        Instant::now(),
    );
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut runner = CommandRunner::new(providers, config, EventSender::new(tx));
    let options = RenderOptions::from(config);
    let (mut width, mut height) = host.size();

    runner.run_all(controller.start());
    host.paint(&render(controller.session(), &options, width, height))?;

    let mut poll = tokio::time::interval_at(Instant::now() + config.poll_interval, config.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while !controller.is_finished() {
        let event = tokio::select! {
            event = host.next_event() => event?.ok_or(EditorError::HostClosed)?,
            Some(event) = rx.recv() => event,
            _ = poll.tick() => EditorEvent::Tick,
        };
        if let EditorEvent::Resize {
            width: new_width,
            height: new_height,
        } = event
        {
            width = new_width;
            height = new_height;
        }
        let commands = controller.handle(event, Instant::now());
        runner.run_all(commands);
        if !controller.is_finished() {
            host.paint(&render(controller.session(), &options, width, height))?;
        }
    }

    let session = controller.session();
    host.finish(&render(session, &options, width, height))?;
    let submission = session.result().cloned().unwrap_or(Submission::Interrupted);
    Ok(LineOutcome {
        submission,
        prompt: session.prompt().to_string(),
    })
}
