use std::time::Duration;

use crossterm::event::KeyEvent;

use crate::error::ProviderResult;
use crate::generation::Generation;
use crate::providers::ContextSnapshot;
use crate::providers::Prediction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Debounce,
    Idle,
}

/// Identifies a timer by what it is for and the generation it was armed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken {
    pub kind: TimerKind,
    pub generation: Generation,
}

/// Everything the controller reacts to, delivered one at a time.
#[derive(Debug, Clone)]
pub enum EditorEvent {
    Key(KeyEvent),
    Paste(String),
    Resize { width: u16, height: u16 },
    /// Periodic poll for prompt and chrome refresh.
    Tick,
    TimerFired(TimerToken),
    Completed(Completion),
}

/// Result of an async provider call, tagged with its issue generation.
#[derive(Debug, Clone)]
pub enum Completion {
    Prediction {
        generation: Generation,
        result: ProviderResult<Prediction>,
    },
    Explanation {
        generation: Generation,
        result: ProviderResult<String>,
    },
    IdleSummary {
        generation: Generation,
        result: ProviderResult<String>,
    },
    Prompt {
        generation: Generation,
        result: ProviderResult<String>,
    },
    Context(ProviderResult<ContextSnapshot>),
}

/// Side effects requested by the controller. The runtime executes them and
/// feeds results back as [`EditorEvent`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartTimer { token: TimerToken, after: Duration },
    Predict { generation: Generation, buffer: String },
    Explain { generation: Generation, text: String },
    IdleSummary { generation: Generation },
    RefreshPrompt { generation: Generation },
    ProbeContext,
}
