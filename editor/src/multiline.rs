use std::sync::Arc;

use lookahead_shell_command::Completeness;
use lookahead_shell_command::ContinuationHint;
use lookahead_shell_command::SyntaxOracle;

/// A line already consumed into the accumulation, with the prompt it was
/// typed after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnteredLine {
    pub prompt: String,
    pub text: String,
}

/// Accumulates lines until the oracle reports one complete command.
#[derive(Clone)]
pub struct MultilineAssembler {
    oracle: Arc<dyn SyntaxOracle>,
    lines: Vec<EnteredLine>,
    open: bool,
}

impl std::fmt::Debug for MultilineAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultilineAssembler")
            .field("lines", &self.lines)
            .field("open", &self.open)
            .finish_non_exhaustive()
    }
}

impl MultilineAssembler {
    pub fn new(oracle: Arc<dyn SyntaxOracle>) -> Self {
        Self {
            oracle,
            lines: Vec::new(),
            open: false,
        }
    }

    /// Append `text` and check the accumulated command.
    ///
    /// Returns `Ok(())` when complete, or the construct still open.
    pub fn add_line(&mut self, prompt: &str, text: &str) -> Result<(), ContinuationHint> {
        self.lines.push(EnteredLine {
            prompt: prompt.to_string(),
            text: text.to_string(),
        });
        match self.oracle.check(&self.pending_text()) {
            Completeness::Complete => {
                self.open = false;
                Ok(())
            }
            Completeness::Incomplete(hint) => {
                self.open = true;
                Err(hint)
            }
        }
    }

    /// Take the accumulated command (lines joined by `\n`) and reset.
    ///
    /// A whitespace-only accumulation yields an empty string.
    pub fn take_command(&mut self) -> String {
        let text = self.pending_text();
        self.reset();
        if text.trim().is_empty() {
            String::new()
        } else {
            text
        }
    }

    pub fn reset(&mut self) {
        self.lines.clear();
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Lines consumed since the last reset.
    pub fn lines(&self) -> &[EnteredLine] {
        &self.lines
    }

    fn pending_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookahead_shell_command::BashOracle;
    use pretty_assertions::assert_eq;

    #[allow(clippy::expect_used)]
    fn assembler() -> MultilineAssembler {
        MultilineAssembler::new(Arc::new(BashOracle::new().expect("bash grammar")))
    }

    #[test]
    fn for_loop_round_trip() {
        let mut assembler = assembler();
        assert!(assembler.add_line("$ ", "for i in 1 2 3; do").is_err());
        assert!(assembler.is_open());
        assert!(assembler.add_line("loop> ", "echo $i").is_err());
        assert_eq!(assembler.lines().len(), 2);
        assert_eq!(assembler.add_line("loop> ", "done"), Ok(()));
        assert_eq!(
            assembler.take_command(),
            "for i in 1 2 3; do\necho $i\ndone".to_string()
        );
        assert!(!assembler.is_open());
        assert!(assembler.lines().is_empty());
    }

    #[test]
    fn open_quote_reports_its_hint() {
        let mut assembler = assembler();
        assert_eq!(
            assembler.add_line("$ ", "echo \"hello"),
            Err(ContinuationHint::DoubleQuote)
        );
        assembler.reset();
        assert!(!assembler.is_open());
        assert_eq!(assembler.add_line("$ ", "echo hi"), Ok(()));
    }

    #[test]
    fn blank_accumulation_composes_to_nothing() {
        let mut assembler = assembler();
        assert_eq!(assembler.add_line("$ ", "   "), Ok(()));
        assert_eq!(assembler.take_command(), String::new());
    }
}
