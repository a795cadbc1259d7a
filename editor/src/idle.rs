//! Idle-summary scheduling for an empty input line.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::ProviderResult;
use crate::generation::Generation;
use crate::generation::GenerationTracker;

#[derive(Debug, Clone)]
pub struct IdleState {
    pub shown: bool,
    pub pending: bool,
    pub last_input: Instant,
    /// Default explanation displaced by the summary now on screen.
    pub original_explanation: Option<String>,
}

/// What to do with a fired idle timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleCheck {
    /// The timer belongs to a superseded generation.
    Stale,
    /// Conditions do not hold yet; arm again after the given delay.
    Reschedule(Duration),
    /// Issue the summary request now.
    Request,
}

#[derive(Debug, Clone)]
pub struct IdleScheduler {
    threshold: Option<Duration>,
    state: IdleState,
    generations: GenerationTracker,
}

impl IdleScheduler {
    /// `threshold` of `None` disables idle summaries entirely.
    pub fn new(threshold: Option<Duration>, now: Instant) -> Self {
        Self {
            threshold: threshold.filter(|threshold| !threshold.is_zero()),
            state: IdleState {
                shown: false,
                pending: false,
                last_input: now,
                original_explanation: None,
            },
            generations: GenerationTracker::new(),
        }
    }

    pub fn state(&self) -> &IdleState {
        &self.state
    }

    pub fn generation(&self) -> Generation {
        self.generations.current()
    }

    /// Timer to arm for the current generation, if enabled.
    pub fn arm(&self) -> Option<(Generation, Duration)> {
        self.threshold
            .map(|threshold| (self.generations.current(), threshold))
    }

    /// Record an edit. Returns the explanation to restore when a summary was
    /// on screen.
    pub fn note_input(&mut self, now: Instant) -> Option<String> {
        self.state.last_input = now;
        self.state.pending = false;
        self.generations.advance();
        self.take_shown()
    }

    /// Hide a visible summary. Returns the explanation to restore, or `None`
    /// when nothing was shown.
    pub fn dismiss(&mut self) -> Option<String> {
        if !self.state.shown {
            return None;
        }
        self.generations.advance();
        self.take_shown()
    }

    pub fn on_timer(&mut self, generation: Generation, buffer_empty: bool, now: Instant) -> IdleCheck {
        let Some(threshold) = self.threshold else {
            return IdleCheck::Stale;
        };
        if !self.generations.is_current(generation) {
            return IdleCheck::Stale;
        }
        if self.state.shown || self.state.pending || !buffer_empty {
            return IdleCheck::Reschedule(threshold);
        }
        let idle_for = now.saturating_duration_since(self.state.last_input);
        if idle_for < threshold {
            return IdleCheck::Reschedule(threshold - idle_for);
        }
        self.state.pending = true;
        IdleCheck::Request
    }

    /// Apply a summary response. Returns the text to install as the default
    /// explanation when the summary should be shown.
    pub fn on_summary(
        &mut self,
        generation: Generation,
        result: ProviderResult<String>,
        current_default: &str,
    ) -> Option<String> {
        if !self.generations.is_current(generation) {
            tracing::debug!("dropping stale idle summary {generation}");
            return None;
        }
        self.state.pending = false;
        let summary = match result {
            Ok(summary) if !summary.trim().is_empty() => summary,
            Ok(_) => return None,
            Err(err) => {
                tracing::debug!("idle summary failed: {err}");
                return None;
            }
        };
        if self.state.original_explanation.is_none() {
            self.state.original_explanation = Some(current_default.to_string());
        }
        self.state.shown = true;
        Some(summary)
    }

    fn take_shown(&mut self) -> Option<String> {
        if !self.state.shown {
            return None;
        }
        self.state.shown = false;
        self.state.original_explanation.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const THRESHOLD: Duration = Duration::from_secs(30);

    #[test]
    fn disabled_scheduler_never_arms() {
        let scheduler = IdleScheduler::new(Some(Duration::ZERO), Instant::now());
        assert_eq!(scheduler.arm(), None);
    }

    #[test]
    fn fires_once_idle_long_enough() {
        let start = Instant::now();
        let mut scheduler = IdleScheduler::new(Some(THRESHOLD), start);
        let (generation, delay) = scheduler.arm().unwrap_or_default();
        assert_eq!(delay, THRESHOLD);

        let early = start + Duration::from_secs(10);
        assert_eq!(
            scheduler.on_timer(generation, true, early),
            IdleCheck::Reschedule(Duration::from_secs(20))
        );
        assert_eq!(scheduler.on_timer(generation, true, start + THRESHOLD), IdleCheck::Request);
        assert!(scheduler.state().pending);
        assert_eq!(
            scheduler.on_timer(generation, true, start + THRESHOLD),
            IdleCheck::Reschedule(THRESHOLD),
            "a pending request suppresses another"
        );
    }

    #[test]
    fn edits_hide_summary_and_restore_explanation() {
        let start = Instant::now();
        let mut scheduler = IdleScheduler::new(Some(THRESHOLD), start);
        let generation = scheduler.generation();
        assert_eq!(scheduler.on_timer(generation, true, start + THRESHOLD), IdleCheck::Request);
        let shown = scheduler.on_summary(generation, Ok("recent: ls".to_string()), "welcome");
        assert_eq!(shown, Some("recent: ls".to_string()));
        assert!(scheduler.state().shown);

        let restored = scheduler.note_input(start + THRESHOLD);
        assert_eq!(restored, Some("welcome".to_string()));
        assert!(!scheduler.state().shown);
        assert_eq!(scheduler.on_timer(generation, true, start + THRESHOLD * 3), IdleCheck::Stale);
    }

    #[test]
    fn failed_or_empty_summary_is_silent() {
        let start = Instant::now();
        let mut scheduler = IdleScheduler::new(Some(THRESHOLD), start);
        let generation = scheduler.generation();
        scheduler.on_timer(generation, true, start + THRESHOLD);
        assert_eq!(scheduler.on_summary(generation, Ok("  ".to_string()), ""), None);
        assert!(!scheduler.state().pending);
        assert!(!scheduler.state().shown);
        assert_eq!(scheduler.dismiss(), None);
    }
}
