use crate::completion::CompletionMenu;
use crate::generation::Generation;
use crate::generation::GenerationTracker;
use crate::history::HistoryNav;
use crate::history::HistorySearch;
use crate::idle::IdleScheduler;
use crate::idle::IdleState;
use crate::line_buffer::LineBuffer;
use crate::multiline::EnteredLine;
use crate::multiline::MultilineAssembler;
use crate::providers::ContextSnapshot;
use crate::providers::Prediction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Active,
    Committed,
    Interrupted,
}

/// How an editing turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// A complete command. Empty when the accumulation held nothing to run.
    Command(String),
    /// Ctrl+D on an empty line.
    EndOfInput,
    /// Ctrl+C. The committed text is empty.
    Interrupted,
}

impl Submission {
    /// The committed text; empty for everything but a command.
    pub fn text(&self) -> &str {
        match self {
            Self::Command(text) => text,
            Self::EndOfInput | Self::Interrupted => "",
        }
    }
}

/// Which step of the prediction pipeline the current generation is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Debounce,
    Prediction,
    Explanation,
}

/// All state of one editing turn. Owned and mutated only by the controller.
#[derive(Debug)]
pub struct Session {
    pub(crate) buffer: LineBuffer,
    pub(crate) mode: Mode,
    pub(crate) dirty: bool,
    pub(crate) prediction_gen: GenerationTracker,
    pub(crate) prediction: Option<Prediction>,
    pub(crate) explanation: Option<String>,
    pub(crate) default_explanation: String,
    pub(crate) last_error: Option<String>,
    pub(crate) idle: IdleScheduler,
    pub(crate) multiline: MultilineAssembler,
    pub(crate) result: Option<Submission>,
    /// Lines shown in the final frame once the turn has ended.
    pub(crate) transcript: Vec<EnteredLine>,
    pub(crate) prompt: String,
    pub(crate) prompt_gen: GenerationTracker,
    pub(crate) applied_prompt: Generation,
    pub(crate) continuation_prompt: Option<String>,
    pub(crate) stage: Option<(Stage, Generation)>,
    pub(crate) history: HistoryNav,
    pub(crate) search: Option<HistorySearch>,
    pub(crate) completion: Option<CompletionMenu>,
    pub(crate) show_help: bool,
    pub(crate) context: ContextSnapshot,
}

impl Session {
    pub(crate) fn new(
        prompt: String,
        history: Vec<String>,
        default_explanation: String,
        idle: IdleScheduler,
        multiline: MultilineAssembler,
    ) -> Self {
        Self {
            buffer: LineBuffer::new(),
            mode: Mode::Active,
            dirty: false,
            prediction_gen: GenerationTracker::new(),
            prediction: None,
            explanation: None,
            default_explanation,
            last_error: None,
            idle,
            multiline,
            result: None,
            transcript: Vec::new(),
            prompt,
            prompt_gen: GenerationTracker::new(),
            applied_prompt: Generation::default(),
            continuation_prompt: None,
            stage: None,
            history: HistoryNav::new(history),
            search: None,
            completion: None,
            show_help: false,
            context: ContextSnapshot::default(),
        }
    }

    pub fn buffer(&self) -> &LineBuffer {
        &self.buffer
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn prediction_generation(&self) -> Generation {
        self.prediction_gen.current()
    }

    pub fn idle_generation(&self) -> Generation {
        self.idle.generation()
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        self.prediction.as_ref()
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    pub fn default_explanation(&self) -> &str {
        &self.default_explanation
    }

    /// Explanation shown in the assistant box, falling back to the default.
    pub fn visible_explanation(&self) -> &str {
        self.explanation.as_deref().unwrap_or(&self.default_explanation)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn idle_state(&self) -> &IdleState {
        self.idle.state()
    }

    pub fn result(&self) -> Option<&Submission> {
        self.result.as_ref()
    }

    pub fn multiline_lines(&self) -> &[EnteredLine] {
        self.multiline.lines()
    }

    pub fn is_multiline_open(&self) -> bool {
        self.multiline.is_open()
    }

    pub fn transcript(&self) -> &[EnteredLine] {
        &self.transcript
    }

    /// The cached primary prompt.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Prompt in front of the live line: the continuation prompt while a
    /// multi-line command is open.
    pub fn active_prompt(&self) -> &str {
        self.continuation_prompt.as_deref().unwrap_or(&self.prompt)
    }

    pub fn context(&self) -> &ContextSnapshot {
        &self.context
    }

    pub fn search(&self) -> Option<&HistorySearch> {
        self.search.as_ref()
    }

    pub fn completion(&self) -> Option<&CompletionMenu> {
        self.completion.as_ref()
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    /// Remainder of the prediction past the buffer, when it extends it.
    pub fn ghost_text(&self) -> Option<&str> {
        let suggestion = &self.prediction.as_ref()?.suggestion;
        suggestion
            .strip_prefix(self.buffer.text())
            .filter(|rest| !rest.is_empty())
    }

    pub(crate) fn stage(&self) -> Option<Stage> {
        self.stage
            .filter(|(_, generation)| self.prediction_gen.is_current(*generation))
            .map(|(stage, _)| stage)
    }

    pub fn is_finished(&self) -> bool {
        self.mode != Mode::Active
    }

    /// Enter a terminal mode. The result is set once; later calls are ignored.
    pub(crate) fn finish(&mut self, mode: Mode, submission: Submission, transcript: Vec<EnteredLine>) {
        if self.result.is_some() || mode == Mode::Active {
            return;
        }
        tracing::info!("editing turn ended: {mode:?}");
        self.mode = mode;
        self.result = Some(submission);
        self.transcript = transcript;
        self.prediction = None;
        self.stage = None;
        self.search = None;
        self.completion = None;
        self.multiline.reset();
        self.continuation_prompt = None;
    }
}
