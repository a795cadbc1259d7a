use std::time::Duration;

use crate::generation::Generation;

/// Coalesces bursts of edits into one trigger after a quiet window.
///
/// Every `schedule` supersedes the previous one; only the timer armed for the
/// latest generation is allowed to fire.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    armed: Option<Generation>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            armed: None,
        }
    }

    /// Arm for `generation` and return how long the timer must wait.
    pub fn schedule(&mut self, generation: Generation) -> Duration {
        self.armed = Some(generation);
        self.window
    }

    /// Returns true when a timer tagged `generation` should trigger work.
    pub fn fire(&mut self, generation: Generation) -> bool {
        if self.armed == Some(generation) {
            self.armed = None;
            true
        } else {
            false
        }
    }

    pub fn cancel(&mut self) {
        self.armed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationTracker;

    #[test]
    fn only_latest_schedule_fires() {
        let mut generations = GenerationTracker::new();
        let mut debouncer = Debouncer::new(Duration::from_millis(200));
        let first = generations.advance();
        debouncer.schedule(first);
        let second = generations.advance();
        debouncer.schedule(second);

        assert!(!debouncer.fire(first));
        assert!(debouncer.fire(second));
        assert!(!debouncer.fire(second), "a timer fires at most once");
    }

    #[test]
    fn cancel_disarms() {
        let mut debouncer = Debouncer::new(Duration::from_millis(200));
        let generation = GenerationTracker::new().advance();
        debouncer.schedule(generation);
        debouncer.cancel();
        assert!(!debouncer.fire(generation));
    }
}
