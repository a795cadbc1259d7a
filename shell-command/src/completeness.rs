use tree_sitter::Language;
use tree_sitter::Node;
use tree_sitter::Parser;
use tree_sitter::Tree;

use crate::SyntaxError;
use crate::lexer;

/// The construct an incomplete command is still waiting to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuationHint {
    SingleQuote,
    DoubleQuote,
    Backtick,
    HereDoc,
    LineContinuation,
    Pipe,
    AndIf,
    OrIf,
    Subshell,
    Brace,
    If,
    Loop,
    Case,
    /// The grammar rejected the text without a recognisable open construct.
    Unparsed,
}

impl ContinuationHint {
    /// Prompt shown in front of the next continuation line, or `None` to use
    /// the configured generic continuation prompt.
    pub fn prompt_label(self) -> Option<&'static str> {
        let label = match self {
            Self::SingleQuote => "quote> ",
            Self::DoubleQuote => "dquote> ",
            Self::Backtick => "bquote> ",
            Self::HereDoc => "heredoc> ",
            Self::LineContinuation => "> ",
            Self::Pipe => "pipe> ",
            Self::AndIf => "cmdand> ",
            Self::OrIf => "cmdor> ",
            Self::Subshell => "subsh> ",
            Self::Brace => "cursh> ",
            Self::If => "if> ",
            Self::Loop => "loop> ",
            Self::Case => "case> ",
            Self::Unparsed => return None,
        };
        Some(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    Complete,
    Incomplete(ContinuationHint),
}

/// Decides whether accumulated shell text forms one complete command.
pub trait SyntaxOracle: Send + Sync {
    fn check(&self, text: &str) -> Completeness;
}

/// Completeness oracle backed by the tree-sitter bash grammar.
///
/// Text the grammar cannot parse is reported as incomplete so the editor keeps
/// accumulating lines instead of discarding what the user typed. A clean parse
/// is still incomplete while a here-document waits for its delimiter line or
/// the text ends in a line continuation.
#[derive(Clone)]
pub struct BashOracle {
    language: Language,
}

impl BashOracle {
    pub fn new() -> Result<Self, SyntaxError> {
        let language: Language = tree_sitter_bash::LANGUAGE.into();
        Parser::new().set_language(&language)?;
        Ok(Self { language })
    }

    fn parse(&self, text: &str) -> Option<Tree> {
        let mut parser = Parser::new();
        if let Err(err) = parser.set_language(&self.language) {
            tracing::warn!("bash grammar unavailable: {err}");
            return None;
        }
        parser.parse(text, None)
    }
}

impl SyntaxOracle for BashOracle {
    fn check(&self, text: &str) -> Completeness {
        if text.trim().is_empty() {
            return Completeness::Complete;
        }
        let Some(tree) = self.parse(text) else {
            return Completeness::Incomplete(rejected_hint(text));
        };
        let root = tree.root_node();
        if root.has_error() {
            return Completeness::Incomplete(rejected_hint(text));
        }
        if has_open_heredoc(root, text) {
            return Completeness::Incomplete(ContinuationHint::HereDoc);
        }
        if ends_with_continuation(root, text) {
            return Completeness::Incomplete(ContinuationHint::LineContinuation);
        }
        Completeness::Complete
    }
}

/// Labels text the grammar rejected.
fn rejected_hint(text: &str) -> ContinuationHint {
    lexer::open_construct(text)
        .or_else(|| lexer::open_keyword(text))
        .unwrap_or(ContinuationHint::Unparsed)
}

struct HereDocStart {
    row: usize,
    delimiter: String,
    strip_tabs: bool,
}

fn heredoc_starts(root: Node<'_>, text: &str) -> Vec<HereDocStart> {
    let mut starts = Vec::new();
    let mut cursor = root.walk();
    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        if node.kind() == "heredoc_redirect" {
            let mut children = node.walk();
            let start = node
                .children(&mut children)
                .find(|child| child.kind() == "heredoc_start")
                .and_then(|child| child.utf8_text(text.as_bytes()).ok());
            if let Some(start) = start {
                starts.push(HereDocStart {
                    row: node.start_position().row,
                    delimiter: start.chars().filter(|c| !matches!(c, '\'' | '"' | '\\')).collect(),
                    strip_tabs: node
                        .utf8_text(text.as_bytes())
                        .is_ok_and(|redirect| redirect.starts_with("<<-")),
                });
            }
        }
        pending.extend(node.children(&mut cursor));
    }
    starts.sort_by_key(|start| start.row);
    starts
}

/// True when some here-document has no delimiter line after it. Bodies are
/// consumed in the order their redirections appear.
fn has_open_heredoc(root: Node<'_>, text: &str) -> bool {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut next_line = 0;
    for start in heredoc_starts(root, text) {
        let from = next_line.max(start.row + 1);
        let terminator = lines.iter().enumerate().skip(from).find(|(_, line)| {
            let line: &str = if start.strip_tabs {
                line.trim_start_matches('\t')
            } else {
                line
            };
            line == start.delimiter
        });
        match terminator {
            Some((idx, _)) => next_line = idx + 1,
            None => return true,
        }
    }
    false
}

const LITERAL_KINDS: &[&str] = &["raw_string", "comment", "heredoc_body", "ansi_c_string"];

/// True when the text ends in an unescaped backslash outside quotes,
/// comments and here-document bodies.
fn ends_with_continuation(root: Node<'_>, text: &str) -> bool {
    let trailing = text.chars().rev().take_while(|c| *c == '\\').count();
    if trailing % 2 == 0 {
        return false;
    }
    let pos = text.len() - 1;
    let mut node = root.descendant_for_byte_range(pos, pos + 1);
    while let Some(current) = node {
        if LITERAL_KINDS.contains(&current.kind()) {
            return false;
        }
        node = current.parent();
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[allow(clippy::expect_used)]
    fn oracle() -> BashOracle {
        BashOracle::new().expect("bash grammar")
    }

    #[test]
    fn simple_commands_are_complete() {
        let oracle = oracle();
        assert_eq!(oracle.check("echo hello"), Completeness::Complete);
        assert_eq!(oracle.check("ls -la | wc -l"), Completeness::Complete);
        assert_eq!(oracle.check(""), Completeness::Complete);
        assert_eq!(oracle.check("   "), Completeness::Complete);
    }

    #[test]
    fn loop_accumulates_until_done() {
        let oracle = oracle();
        assert_eq!(
            oracle.check("for i in 1 2 3; do"),
            Completeness::Incomplete(ContinuationHint::Loop)
        );
        assert_eq!(
            oracle.check("for i in 1 2 3; do\necho $i"),
            Completeness::Incomplete(ContinuationHint::Loop)
        );
        assert_eq!(
            oracle.check("for i in 1 2 3; do\necho $i\ndone"),
            Completeness::Complete
        );
    }

    #[test]
    fn if_without_fi_is_incomplete() {
        assert_eq!(
            oracle().check("if true; then"),
            Completeness::Incomplete(ContinuationHint::If)
        );
    }

    #[test]
    fn open_quotes_and_heredocs_are_incomplete() {
        let oracle = oracle();
        assert_eq!(
            oracle.check("echo 'unterminated"),
            Completeness::Incomplete(ContinuationHint::SingleQuote)
        );
        assert_eq!(
            oracle.check("cat <<EOF\nbody"),
            Completeness::Incomplete(ContinuationHint::HereDoc)
        );
        assert_eq!(
            oracle.check("cat <<EOF"),
            Completeness::Incomplete(ContinuationHint::HereDoc)
        );
        assert_eq!(oracle.check("cat <<EOF\nbody\nEOF"), Completeness::Complete);
        assert_eq!(oracle.check("cat <<-'END'\n\tbody\n\tEND"), Completeness::Complete);
    }

    #[test]
    fn arithmetic_shifts_are_not_heredocs() {
        let oracle = oracle();
        assert_eq!(oracle.check("echo $((1<<2))"), Completeness::Complete);
        assert_eq!(oracle.check("echo $((1 << 2))"), Completeness::Complete);
        assert_eq!(oracle.check("(( x <<= 1 ))"), Completeness::Complete);
    }

    #[test]
    fn brace_argument_is_a_plain_word() {
        let oracle = oracle();
        assert_eq!(oracle.check("echo {"), Completeness::Complete);
        assert_eq!(oracle.check("echo {a,b}"), Completeness::Complete);
    }

    #[test]
    fn trailing_backslash_continues_outside_quotes() {
        let oracle = oracle();
        assert_eq!(
            oracle.check("make \\"),
            Completeness::Incomplete(ContinuationHint::LineContinuation)
        );
        assert_eq!(oracle.check("make \\\nall"), Completeness::Complete);
        assert_eq!(oracle.check("echo 'a\\'"), Completeness::Complete);
        assert_eq!(oracle.check("echo done # \\"), Completeness::Complete);
    }

    #[test]
    fn dangling_pipe_gets_pipe_prompt() {
        let hint = match oracle().check("git log |") {
            Completeness::Incomplete(hint) => hint,
            Completeness::Complete => ContinuationHint::Unparsed,
        };
        assert_eq!(hint.prompt_label(), Some("pipe> "));
    }

    #[test]
    fn prompt_labels() {
        assert_eq!(ContinuationHint::DoubleQuote.prompt_label(), Some("dquote> "));
        assert_eq!(ContinuationHint::Unparsed.prompt_label(), None);
    }
}
