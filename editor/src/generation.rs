/// Token identifying one input state of a request family.
///
/// Async work is tagged with the generation current when it was issued and is
/// applied only if that generation is still current when the result arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic source of [`Generation`] tokens. Never moves backwards.
#[derive(Debug, Default, Clone)]
pub struct GenerationTracker {
    current: Generation,
}

impl GenerationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Generation {
        self.current
    }

    /// Invalidate everything issued so far and return the new current token.
    pub fn advance(&mut self) -> Generation {
        self.current = Generation(self.current.0.saturating_add(1));
        self.current
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation == self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn advance_is_monotonic_and_invalidates_older_tokens() {
        let mut tracker = GenerationTracker::new();
        let first = tracker.advance();
        let second = tracker.advance();
        assert!(second > first);
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
        assert_eq!(tracker.current().value(), 2);
    }
}
