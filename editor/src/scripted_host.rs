//! Scripted [`Host`] for driving whole editing turns in tests.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use tokio::time::Instant;

use crate::error::EditorError;
use crate::event::EditorEvent;
use crate::host::Host;
use crate::render::Frame;

#[derive(Debug, Clone)]
pub enum ScriptStep {
    Key(KeyEvent),
    Paste(String),
    Resize(u16, u16),
    /// Let time pass without input.
    Wait(Duration),
}

/// Replays a fixed input script and records every frame it is given.
#[derive(Debug, Clone)]
pub struct ScriptedHost {
    steps: VecDeque<ScriptStep>,
    /// Deadline of the `Wait` at the front, kept across cancelled polls.
    deadline: Option<Instant>,
    size: (u16, u16),
    frames: Vec<Frame>,
    final_frame: Option<Frame>,
}

impl ScriptedHost {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            steps: VecDeque::new(),
            deadline: None,
            size: (width, height),
            frames: Vec::new(),
            final_frame: None,
        }
    }

    pub fn step(mut self, step: ScriptStep) -> Self {
        self.steps.push_back(step);
        self
    }

    pub fn key(self, code: KeyCode) -> Self {
        self.step(ScriptStep::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    pub fn ctrl(self, ch: char) -> Self {
        self.step(ScriptStep::Key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)))
    }

    /// One key press per character.
    pub fn type_text(self, text: &str) -> Self {
        text.chars().fold(self, |host, ch| host.key(KeyCode::Char(ch)))
    }

    pub fn wait(self, duration: Duration) -> Self {
        self.step(ScriptStep::Wait(duration))
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn final_frame(&self) -> Option<&Frame> {
        self.final_frame.as_ref()
    }
}

#[async_trait]
impl Host for ScriptedHost {
    async fn next_event(&mut self) -> Result<Option<EditorEvent>, EditorError> {
        loop {
            let Some(step) = self.steps.front() else {
                return Ok(None);
            };
            if let ScriptStep::Wait(duration) = step {
                let deadline = *self.deadline.get_or_insert_with(|| Instant::now() + *duration);
                tokio::time::sleep_until(deadline).await;
                self.deadline = None;
                self.steps.pop_front();
                continue;
            }
            let event = match self.steps.pop_front() {
                Some(ScriptStep::Key(key)) => EditorEvent::Key(key),
                Some(ScriptStep::Paste(text)) => EditorEvent::Paste(text),
                Some(ScriptStep::Resize(width, height)) => {
                    self.size = (width, height);
                    EditorEvent::Resize { width, height }
                }
                Some(ScriptStep::Wait(_)) | None => continue,
            };
            return Ok(Some(event));
        }
    }

    fn size(&self) -> (u16, u16) {
        self.size
    }

    fn paint(&mut self, frame: &Frame) -> Result<(), EditorError> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self, frame: &Frame) -> Result<(), EditorError> {
        self.final_frame = Some(frame.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn waits_survive_cancellation() {
        let mut host = ScriptedHost::new(80, 24)
            .wait(Duration::from_secs(1))
            .key(KeyCode::Enter);
        let start = Instant::now();

        let poll = tokio::time::timeout(Duration::from_millis(600), host.next_event()).await;
        assert!(poll.is_err());
        let event = host.next_event().await;
        assert_matches!(event, Ok(Some(EditorEvent::Key(key))) if key.code == KeyCode::Enter);
        assert_eq!(start.elapsed(), Duration::from_secs(1));

        assert_matches!(host.next_event().await, Ok(None));
    }

    #[tokio::test]
    async fn resize_updates_the_reported_size() {
        let mut host = ScriptedHost::new(80, 24).step(ScriptStep::Resize(40, 10));
        let event = host.next_event().await;
        assert_matches!(event, Ok(Some(EditorEvent::Resize { width: 40, height: 10 })));
        assert_eq!(host.size(), (40, 10));
    }
}
