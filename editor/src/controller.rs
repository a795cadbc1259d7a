//! The editing-turn state machine.
//!
//! [`SessionController::handle`] consumes one event and returns the commands
//! the runtime must execute. Async results come back as events tagged with
//! the generation they were issued under and are dropped when that
//! generation is no longer current.

use std::sync::Arc;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use lookahead_shell_command::SyntaxOracle;
use tokio::time::Instant;

use crate::completion::CompletionMenu;
use crate::completion::completion_target;
use crate::config::EditorConfig;
use crate::debounce::Debouncer;
use crate::event::Command;
use crate::event::Completion;
use crate::event::EditorEvent;
use crate::event::TimerKind;
use crate::event::TimerToken;
use crate::history::HistorySearch;
use crate::idle::IdleCheck;
use crate::idle::IdleScheduler;
use crate::line_buffer::LineBuffer;
use crate::multiline::EnteredLine;
use crate::multiline::MultilineAssembler;
use crate::providers::Candidate;
use crate::providers::CompletionProvider;
use crate::session::Mode;
use crate::session::Session;
use crate::session::Stage;
use crate::session::Submission;

/// Inputs for one editing turn.
#[derive(Debug, Clone, Default)]
pub struct EditRequest {
    pub prompt: String,
    /// Oldest first.
    pub history: Vec<String>,
    /// Replaces the configured default explanation when set.
    pub initial_explanation: Option<String>,
}

impl EditRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    pub fn with_history(mut self, history: Vec<String>) -> Self {
        self.history = history;
        self
    }

    pub fn with_initial_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.initial_explanation = Some(explanation.into());
        self
    }
}

pub struct SessionController {
    session: Session,
    debouncer: Debouncer,
    completion_provider: Option<Arc<dyn CompletionProvider>>,
    continuation_prompt: String,
    visible_rows: usize,
}

impl SessionController {
    /// `idle_enabled` tells whether a summary generator is available; the
    /// threshold itself comes from `config`.
    pub fn new(
        request: EditRequest,
        config: &EditorConfig,
        oracle: Arc<dyn SyntaxOracle>,
        completion_provider: Option<Arc<dyn CompletionProvider>>,
        idle_enabled: bool,
        now: Instant,
    ) -> Self {
        let threshold = config.idle_threshold.filter(|_| idle_enabled);
        let default_explanation = request
            .initial_explanation
            .unwrap_or_else(|| config.default_explanation.clone());
        let session = Session::new(
            request.prompt,
            request.history,
            default_explanation,
            IdleScheduler::new(threshold, now),
            MultilineAssembler::new(oracle),
        );
        Self {
            session,
            debouncer: Debouncer::new(config.debounce),
            completion_provider,
            continuation_prompt: config.continuation_prompt.clone(),
            visible_rows: usize::from(config.box_height),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_finished(&self) -> bool {
        self.session.is_finished()
    }

    /// Commands to issue when the turn begins.
    pub fn start(&mut self) -> Vec<Command> {
        let mut commands = vec![
            Command::RefreshPrompt {
                generation: self.session.prompt_gen.advance(),
            },
            Command::ProbeContext,
        ];
        commands.extend(self.arm_idle());
        commands
    }

    pub fn handle(&mut self, event: EditorEvent, now: Instant) -> Vec<Command> {
        if self.session.is_finished() {
            return Vec::new();
        }
        match event {
            EditorEvent::Key(key) => self.handle_key(key, now),
            EditorEvent::Paste(text) => {
                let text = text.replace("\r\n", " ").replace(['\n', '\r'], " ");
                self.close_overlays();
                self.session.buffer.insert_str(&text);
                self.typed_edit(now)
            }
            EditorEvent::Resize { .. } => Vec::new(),
            EditorEvent::Tick => vec![
                Command::RefreshPrompt {
                    generation: self.session.prompt_gen.advance(),
                },
                Command::ProbeContext,
            ],
            EditorEvent::TimerFired(token) => self.on_timer(token, now),
            EditorEvent::Completed(completion) => self.on_completion(completion),
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Command> {
        if key.kind == KeyEventKind::Release {
            return Vec::new();
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        if ctrl && key.code == KeyCode::Char('c') {
            return self.interrupt();
        }
        if self.session.search.is_some() {
            return self.handle_search_key(key, now);
        }
        if self.session.completion.is_some()
            && let Some(commands) = self.handle_menu_key(key, now)
        {
            return commands;
        }

        let ghost_at_end = self.session.buffer.at_end() && self.session.ghost_text().is_some();
        match key.code {
            KeyCode::Char('d') if ctrl => {
                if self.session.buffer.is_empty() {
                    let transcript = self.live_transcript();
                    self.session.finish(Mode::Committed, Submission::EndOfInput, transcript);
                    Vec::new()
                } else if self.session.buffer.delete() {
                    self.typed_edit(now)
                } else {
                    Vec::new()
                }
            }
            KeyCode::Enter => self.submit(now),
            KeyCode::Esc => self.escape(),
            KeyCode::Tab => self.complete(now),
            KeyCode::F(1) => {
                self.session.show_help = !self.session.show_help;
                Vec::new()
            }
            KeyCode::Char('r') if ctrl => {
                self.session.search = Some(HistorySearch::new(self.session.history.entries()));
                Vec::new()
            }
            KeyCode::Up => self.history_older(now),
            KeyCode::Char('p') if ctrl => self.history_older(now),
            KeyCode::Down => self.history_newer(now),
            KeyCode::Char('n') if ctrl => self.history_newer(now),
            KeyCode::Backspace => {
                if self.session.buffer.is_empty() {
                    // Nothing to delete, but drop any suggestion immediately.
                    self.edit(now, true)
                } else {
                    self.session.buffer.backspace();
                    self.typed_edit(now)
                }
            }
            KeyCode::Delete => {
                if self.session.buffer.delete() {
                    self.typed_edit(now)
                } else {
                    Vec::new()
                }
            }
            KeyCode::Right if alt => self.accept_ghost_word(now),
            KeyCode::Right | KeyCode::End if ghost_at_end => self.accept_ghost(now),
            KeyCode::Char('f') if ctrl => {
                if ghost_at_end {
                    self.accept_ghost(now)
                } else {
                    self.session.buffer.move_right();
                    Vec::new()
                }
            }
            KeyCode::Right => {
                self.session.buffer.move_right();
                Vec::new()
            }
            KeyCode::Char('e') | KeyCode::Char('E') if ctrl => {
                if ghost_at_end {
                    self.accept_ghost(now)
                } else {
                    self.session.buffer.move_end();
                    Vec::new()
                }
            }
            KeyCode::End => {
                self.session.buffer.move_end();
                Vec::new()
            }
            KeyCode::Left if alt => {
                self.session.buffer.word_left();
                Vec::new()
            }
            KeyCode::Left => {
                self.session.buffer.move_left();
                Vec::new()
            }
            KeyCode::Char('b') if ctrl => {
                self.session.buffer.move_left();
                Vec::new()
            }
            KeyCode::Char('b') if alt => {
                self.session.buffer.word_left();
                Vec::new()
            }
            KeyCode::Char('f') if alt => {
                self.session.buffer.word_right();
                Vec::new()
            }
            KeyCode::Home => {
                self.session.buffer.move_home();
                Vec::new()
            }
            KeyCode::Char('a') if ctrl => {
                self.session.buffer.move_home();
                Vec::new()
            }
            KeyCode::Char('u') if ctrl => self.kill(now, LineBuffer::kill_to_start),
            KeyCode::Char('k') if ctrl => self.kill(now, LineBuffer::kill_to_end),
            KeyCode::Char('w') if ctrl => self.kill(now, LineBuffer::kill_prev_word),
            KeyCode::Char(_) if ctrl || alt => Vec::new(),
            KeyCode::Char(ch) => {
                self.session.buffer.insert_char(ch);
                self.typed_edit(now)
            }
            _ => Vec::new(),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Command> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let rows = self.visible_rows.saturating_sub(1).max(1);
        let session = &mut self.session;
        let Some(search) = session.search.as_mut() else {
            return Vec::new();
        };
        match key.code {
            KeyCode::Esc => session.search = None,
            KeyCode::Char('g') if ctrl => session.search = None,
            KeyCode::Enter | KeyCode::Tab => {
                let selected = search.selected().map(str::to_string);
                session.search = None;
                if let Some(selected) = selected {
                    session.history.detach();
                    session.buffer.set(selected);
                    return self.edit(now, true);
                }
            }
            KeyCode::Char('r') if ctrl => search.select_older(rows),
            KeyCode::Down => search.select_older(rows),
            KeyCode::Up => search.select_newer(rows),
            KeyCode::Backspace => search.pop_char(session.history.entries()),
            KeyCode::Char(ch) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                search.push_char(ch, session.history.entries());
            }
            _ => {}
        }
        Vec::new()
    }

    /// Returns `None` when the key closes the menu and should be processed
    /// as an ordinary key.
    fn handle_menu_key(&mut self, key: KeyEvent, now: Instant) -> Option<Vec<Command>> {
        let rows = self.visible_rows;
        let menu = self.session.completion.as_mut()?;
        match key.code {
            KeyCode::Tab | KeyCode::Down => menu.select_next(rows),
            KeyCode::BackTab | KeyCode::Up => menu.select_prev(rows),
            KeyCode::Enter => {
                let selected = self.session.completion.take().and_then(CompletionMenu::into_selected);
                return Some(match selected {
                    Some((word_start, candidate)) => self.apply_candidate(word_start, &candidate, now),
                    None => Vec::new(),
                });
            }
            KeyCode::Esc => self.session.completion = None,
            _ => {
                self.session.completion = None;
                return None;
            }
        }
        Some(Vec::new())
    }

    fn submit(&mut self, now: Instant) -> Vec<Command> {
        let line = self.session.buffer.text().to_string();
        let prompt = self.session.active_prompt().to_string();
        match self.session.multiline.add_line(&prompt, &line) {
            Err(hint) => {
                let continuation = hint
                    .prompt_label()
                    .map(str::to_string)
                    .unwrap_or_else(|| self.continuation_prompt.clone());
                tracing::debug!("command incomplete ({hint:?}), continuing");
                self.session.continuation_prompt = Some(continuation);
                self.session.buffer.clear();
                self.session.history.detach();
                self.edit(now, true)
            }
            Ok(()) => {
                let transcript = self.session.multiline.lines().to_vec();
                let command = self.session.multiline.take_command();
                self.debouncer.cancel();
                self.session
                    .finish(Mode::Committed, Submission::Command(command), transcript);
                Vec::new()
            }
        }
    }

    fn interrupt(&mut self) -> Vec<Command> {
        let transcript = self.live_transcript();
        self.debouncer.cancel();
        self.session.finish(Mode::Interrupted, Submission::Interrupted, transcript);
        Vec::new()
    }

    /// Accumulated lines followed by the live line.
    fn live_transcript(&self) -> Vec<EnteredLine> {
        let mut transcript = self.session.multiline.lines().to_vec();
        transcript.push(EnteredLine {
            prompt: self.session.active_prompt().to_string(),
            text: self.session.buffer.text().to_string(),
        });
        transcript
    }

    fn escape(&mut self) -> Vec<Command> {
        if let Some(restored) = self.session.idle.dismiss() {
            self.session.default_explanation = restored;
            return self.arm_idle();
        }
        self.session.show_help = false;
        Vec::new()
    }

    fn complete(&mut self, now: Instant) -> Vec<Command> {
        let Some(provider) = &self.completion_provider else {
            return Vec::new();
        };
        let (word_start, word, preceding) = completion_target(self.session.buffer.before_cursor());
        let mut candidates = provider.completions(word, &preceding);
        match candidates.len() {
            0 => Vec::new(),
            1 => {
                let candidate = candidates.remove(0);
                self.apply_candidate(word_start, &candidate, now)
            }
            _ => {
                self.session.completion = Some(CompletionMenu::new(candidates, word_start));
                Vec::new()
            }
        }
    }

    fn apply_candidate(&mut self, word_start: usize, candidate: &Candidate, now: Instant) -> Vec<Command> {
        let buffer = &mut self.session.buffer;
        buffer.replace_before_cursor(word_start, &candidate.value);
        if !candidate.value.ends_with('/') && !buffer.after_cursor().starts_with(' ') {
            buffer.insert_char(' ');
        }
        self.typed_edit(now)
    }

    fn history_older(&mut self, now: Instant) -> Vec<Command> {
        let session = &mut self.session;
        let Some(entry) = session.history.older(session.buffer.text()).map(str::to_string) else {
            return Vec::new();
        };
        session.buffer.set(entry);
        self.edit(now, true)
    }

    fn history_newer(&mut self, now: Instant) -> Vec<Command> {
        let Some(entry) = self.session.history.newer() else {
            return Vec::new();
        };
        self.session.buffer.set(entry);
        self.edit(now, true)
    }

    fn accept_ghost(&mut self, now: Instant) -> Vec<Command> {
        let Some(suggestion) = self.session.prediction.as_ref().map(|p| p.suggestion.clone()) else {
            return Vec::new();
        };
        self.session.buffer.set(suggestion);
        self.typed_edit(now)
    }

    fn accept_ghost_word(&mut self, now: Instant) -> Vec<Command> {
        let Some(ghost) = self.session.ghost_text().filter(|_| self.session.buffer.at_end()) else {
            self.session.buffer.word_right();
            return Vec::new();
        };
        let leading_ws = ghost.len() - ghost.trim_start().len();
        let word_len = ghost[leading_ws..]
            .find(char::is_whitespace)
            .unwrap_or(ghost.len() - leading_ws);
        let chunk = ghost[..leading_ws + word_len].to_string();
        self.session.buffer.insert_str(&chunk);
        self.typed_edit(now)
    }

    fn kill(&mut self, now: Instant, op: impl FnOnce(&mut LineBuffer) -> bool) -> Vec<Command> {
        if op(&mut self.session.buffer) {
            self.session.history.detach();
            self.edit(now, true)
        } else {
            Vec::new()
        }
    }

    fn close_overlays(&mut self) {
        self.session.completion = None;
        self.session.search = None;
    }

    /// An edit made by typing, as opposed to history recall.
    fn typed_edit(&mut self, now: Instant) -> Vec<Command> {
        self.session.history.detach();
        self.edit(now, false)
    }

    /// Bookkeeping after any change to the buffer.
    ///
    /// `cleared` marks edits that explicitly discarded text; those always
    /// drop the current prediction.
    fn edit(&mut self, now: Instant, cleared: bool) -> Vec<Command> {
        let session = &mut self.session;
        let generation = session.prediction_gen.advance();
        session.last_error = None;
        if let Some(restored) = session.idle.note_input(now) {
            session.default_explanation = restored;
        }

        if session.buffer.is_empty() {
            if session.dirty {
                tracing::trace!("buffer cleared, restoring default explanation");
            }
            session.dirty = false;
            session.prediction = None;
            session.explanation = None;
            session.stage = None;
            self.debouncer.cancel();
            return self.arm_idle();
        }
        session.dirty = true;

        let text = session.buffer.text();
        let extends_prediction = session
            .prediction
            .as_ref()
            .is_some_and(|prediction| prediction.suggestion.starts_with(text));
        if extends_prediction && !cleared {
            self.debouncer.cancel();
            if session.explanation.is_some() {
                session.stage = None;
                return Vec::new();
            }
            // The in-flight explanation was tagged with the previous
            // generation; ask again under the new one.
            let text = session
                .prediction
                .as_ref()
                .map(|prediction| prediction.suggestion.clone())
                .unwrap_or_default();
            session.stage = Some((Stage::Explanation, generation));
            return vec![Command::Explain { generation, text }];
        }

        session.prediction = None;
        session.explanation = None;
        session.stage = Some((Stage::Debounce, generation));
        let after = self.debouncer.schedule(generation);
        vec![Command::StartTimer {
            token: TimerToken {
                kind: TimerKind::Debounce,
                generation,
            },
            after,
        }]
    }

    fn arm_idle(&self) -> Vec<Command> {
        self.session
            .idle
            .arm()
            .map(|(generation, after)| Command::StartTimer {
                token: TimerToken {
                    kind: TimerKind::Idle,
                    generation,
                },
                after,
            })
            .into_iter()
            .collect()
    }

    fn on_timer(&mut self, token: TimerToken, now: Instant) -> Vec<Command> {
        let session = &mut self.session;
        match token.kind {
            TimerKind::Debounce => {
                let current = session.prediction_gen.is_current(token.generation);
                if !(self.debouncer.fire(token.generation) && current) {
                    tracing::trace!("debounce timer {} superseded", token.generation);
                    return Vec::new();
                }
                session.stage = Some((Stage::Prediction, token.generation));
                vec![Command::Predict {
                    generation: token.generation,
                    buffer: session.buffer.text().to_string(),
                }]
            }
            TimerKind::Idle => {
                let idle_line = session.buffer.is_empty() && !session.multiline.is_open();
                match session.idle.on_timer(token.generation, idle_line, now) {
                    IdleCheck::Stale => Vec::new(),
                    IdleCheck::Reschedule(after) => vec![Command::StartTimer { token, after }],
                    IdleCheck::Request => vec![Command::IdleSummary {
                        generation: token.generation,
                    }],
                }
            }
        }
    }

    fn on_completion(&mut self, completion: Completion) -> Vec<Command> {
        let session = &mut self.session;
        match completion {
            Completion::Prediction { generation, result } => {
                if !session.prediction_gen.is_current(generation) {
                    tracing::debug!("dropping stale prediction {generation}");
                    return Vec::new();
                }
                let prediction = match result {
                    Ok(prediction) => prediction,
                    Err(err) => {
                        tracing::warn!("prediction failed: {err}");
                        session.last_error = Some(err.message().to_string());
                        session.prediction = None;
                        session.explanation = None;
                        session.stage = None;
                        return Vec::new();
                    }
                };
                session.last_error = None;
                if prediction.suggestion.is_empty() && session.buffer.is_empty() {
                    session.prediction = None;
                    session.explanation = None;
                    session.stage = None;
                    return Vec::new();
                }
                let text = if prediction.suggestion.is_empty() {
                    session.buffer.text().to_string()
                } else {
                    prediction.suggestion.clone()
                };
                session.prediction = Some(prediction).filter(|p| !p.suggestion.is_empty());
                session.stage = Some((Stage::Explanation, generation));
                vec![Command::Explain { generation, text }]
            }
            Completion::Explanation { generation, result } => {
                if !session.prediction_gen.is_current(generation) {
                    tracing::debug!("dropping stale explanation {generation}");
                    return Vec::new();
                }
                session.stage = None;
                session.explanation = match result {
                    Ok(text) if !text.trim().is_empty() => Some(text),
                    Ok(_) => None,
                    Err(err) => {
                        tracing::warn!("explanation failed: {err}");
                        None
                    }
                };
                Vec::new()
            }
            Completion::IdleSummary { generation, result } => {
                if let Some(summary) =
                    session
                        .idle
                        .on_summary(generation, result, &session.default_explanation)
                {
                    session.default_explanation = summary;
                }
                Vec::new()
            }
            Completion::Prompt { generation, result } => {
                match result {
                    Ok(prompt) if !prompt.is_empty() && generation > session.applied_prompt => {
                        session.applied_prompt = generation;
                        session.prompt = prompt;
                    }
                    Ok(_) => {}
                    Err(err) => tracing::debug!("prompt refresh failed: {err}"),
                }
                Vec::new()
            }
            Completion::Context(result) => {
                match result {
                    Ok(context) => session.context = context,
                    Err(err) => tracing::debug!("context probe failed: {err}"),
                }
                Vec::new()
            }
        }
    }
}
