//! Lexical scan that labels the continuation prompt once the grammar has
//! rejected the text: open quotes, trailing backslashes, unterminated
//! here-documents, unclosed groups and dangling pipeline operators.

use std::collections::VecDeque;

use crate::ContinuationHint;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
    Single,
    Double,
    Backtick,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Open {
    Paren,
    Brace,
    Param,
}

struct HereDoc {
    delimiter: String,
    strip_tabs: bool,
}

fn at_word_start(chars: &[char], idx: usize) -> bool {
    idx == 0 || {
        let prev = chars[idx - 1];
        prev.is_whitespace() || matches!(prev, ';' | '|' | '&' | '(' | ')')
    }
}

fn ends_heredoc_word(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, ';' | '|' | '&' | '<' | '>' | '(' | ')')
}

/// Returns the construct left open at the end of `text`, if any.
pub(crate) fn open_construct(text: &str) -> Option<ContinuationHint> {
    let mut quote: Option<Quote> = None;
    let mut stack: Vec<Open> = Vec::new();
    let mut heredocs: VecDeque<HereDoc> = VecDeque::new();
    let mut last_sig: Option<char> = None;
    let mut prev_sig: Option<char> = None;
    let mut continued = false;

    for line in text.split('\n') {
        if let Some(doc) = heredocs.front() {
            let candidate = if doc.strip_tabs {
                line.trim_start_matches('\t')
            } else {
                line
            };
            if candidate == doc.delimiter {
                heredocs.pop_front();
            }
            continue;
        }

        continued = false;
        let chars: Vec<char> = line.chars().collect();
        let mut idx = 0;
        while idx < chars.len() {
            let ch = chars[idx];
            match quote {
                Some(Quote::Single) => {
                    if ch == '\'' {
                        quote = None;
                    }
                    idx += 1;
                    continue;
                }
                Some(open @ (Quote::Double | Quote::Backtick)) => {
                    let closing = if open == Quote::Double { '"' } else { '`' };
                    if ch == '\\' {
                        continued = idx + 1 == chars.len();
                        idx += 2;
                        continue;
                    }
                    if ch == closing {
                        quote = None;
                    }
                    idx += 1;
                    continue;
                }
                None => {}
            }

            let next = chars.get(idx + 1).copied();
            match ch {
                '\\' => {
                    if next.is_none() {
                        continued = true;
                    } else {
                        prev_sig = last_sig;
                        last_sig = Some('w');
                    }
                    idx += 2;
                    continue;
                }
                '\'' => quote = Some(Quote::Single),
                '"' => quote = Some(Quote::Double),
                '`' => quote = Some(Quote::Backtick),
                '#' if at_word_start(&chars, idx) => break,
                '$' if next == Some('(') => {
                    stack.push(Open::Paren);
                    prev_sig = last_sig;
                    last_sig = Some('(');
                    idx += 2;
                    continue;
                }
                '$' if next == Some('{') => {
                    stack.push(Open::Param);
                    prev_sig = last_sig;
                    last_sig = Some('{');
                    idx += 2;
                    continue;
                }
                '(' => stack.push(Open::Paren),
                ')' => {
                    if stack.last() == Some(&Open::Paren) {
                        stack.pop();
                    }
                }
                '{' if at_word_start(&chars, idx) && next.is_none_or(char::is_whitespace) => {
                    stack.push(Open::Brace);
                }
                '}' => match stack.last() {
                    Some(Open::Param) => {
                        stack.pop();
                    }
                    Some(Open::Brace) if at_word_start(&chars, idx) => {
                        stack.pop();
                    }
                    _ => {}
                },
                '<' if next == Some('<') && chars.get(idx + 2) == Some(&'<') => {
                    // Here-string; the word that follows is an ordinary argument.
                    prev_sig = last_sig;
                    last_sig = Some('<');
                    idx += 3;
                    continue;
                }
                '<' if next == Some('<') => {
                    let mut end = idx + 2;
                    let strip_tabs = chars.get(end) == Some(&'-');
                    if strip_tabs {
                        end += 1;
                    }
                    while chars.get(end).is_some_and(|c| *c == ' ' || *c == '\t') {
                        end += 1;
                    }
                    let mut delimiter = String::new();
                    while let Some(&c) = chars.get(end) {
                        if ends_heredoc_word(c) {
                            break;
                        }
                        if !matches!(c, '\'' | '"' | '\\') {
                            delimiter.push(c);
                        }
                        end += 1;
                    }
                    prev_sig = last_sig;
                    last_sig = Some(if delimiter.is_empty() { '<' } else { 'w' });
                    if !delimiter.is_empty() {
                        heredocs.push_back(HereDoc {
                            delimiter,
                            strip_tabs,
                        });
                    }
                    idx = end;
                    continue;
                }
                _ => {}
            }
            if !ch.is_whitespace() {
                prev_sig = last_sig;
                last_sig = Some(ch);
            }
            idx += 1;
        }
    }

    if let Some(quote) = quote {
        return Some(match quote {
            Quote::Single => ContinuationHint::SingleQuote,
            Quote::Double => ContinuationHint::DoubleQuote,
            Quote::Backtick => ContinuationHint::Backtick,
        });
    }
    if continued {
        return Some(ContinuationHint::LineContinuation);
    }
    if !heredocs.is_empty() {
        return Some(ContinuationHint::HereDoc);
    }
    if let Some(open) = stack.last() {
        return Some(match open {
            Open::Paren => ContinuationHint::Subshell,
            Open::Brace | Open::Param => ContinuationHint::Brace,
        });
    }
    match (prev_sig, last_sig) {
        (Some('|'), Some('|')) => Some(ContinuationHint::OrIf),
        (_, Some('|')) => Some(ContinuationHint::Pipe),
        (Some('&'), Some('&')) => Some(ContinuationHint::AndIf),
        _ => None,
    }
}

/// Innermost compound keyword still waiting for its terminator.
///
/// Only used to label the continuation prompt; completeness itself comes from
/// the grammar.
pub(crate) fn open_keyword(text: &str) -> Option<ContinuationHint> {
    fn close(stack: &mut Vec<ContinuationHint>, hint: ContinuationHint) {
        if stack.last() == Some(&hint) {
            stack.pop();
        }
    }

    let mut stack: Vec<ContinuationHint> = Vec::new();
    for word in text.split(|c: char| c.is_whitespace() || matches!(c, ';' | '&' | '|' | '(' | ')')) {
        match word {
            "if" => stack.push(ContinuationHint::If),
            "fi" => close(&mut stack, ContinuationHint::If),
            "for" | "while" | "until" | "select" => stack.push(ContinuationHint::Loop),
            "done" => close(&mut stack, ContinuationHint::Loop),
            "case" => stack.push(ContinuationHint::Case),
            "esac" => close(&mut stack, ContinuationHint::Case),
            _ => {}
        }
    }
    stack.last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn quotes_span_lines() {
        assert_eq!(open_construct("echo 'abc"), Some(ContinuationHint::SingleQuote));
        assert_eq!(open_construct("echo 'abc\ndef'"), None);
        assert_eq!(open_construct("echo \"a \\\" b"), Some(ContinuationHint::DoubleQuote));
        assert_eq!(open_construct("echo `date"), Some(ContinuationHint::Backtick));
    }

    #[test]
    fn trailing_backslash_continues() {
        assert_eq!(open_construct("make \\"), Some(ContinuationHint::LineContinuation));
        assert_eq!(open_construct("make \\\nall"), None);
        assert_eq!(open_construct("echo '\\'"), None);
    }

    #[test]
    fn heredoc_waits_for_delimiter() {
        assert_eq!(open_construct("cat <<EOF\nhello"), Some(ContinuationHint::HereDoc));
        assert_eq!(open_construct("cat <<'EOF'\nhello\nEOF"), None);
        assert_eq!(open_construct("cat <<-END\n\tbody\n\tEND"), None);
        assert_eq!(open_construct("cat <<< word"), None);
    }

    #[test]
    fn groups_and_substitutions() {
        assert_eq!(open_construct("(cd /tmp"), Some(ContinuationHint::Subshell));
        assert_eq!(open_construct("echo $(date"), Some(ContinuationHint::Subshell));
        assert_eq!(open_construct("echo $((1 + 2))"), None);
        assert_eq!(open_construct("f() {"), Some(ContinuationHint::Brace));
        assert_eq!(open_construct("f() { echo hi; }"), None);
        assert_eq!(open_construct("echo {a,b} ${HOME}"), None);
    }

    #[test]
    fn dangling_operators() {
        assert_eq!(open_construct("ls |"), Some(ContinuationHint::Pipe));
        assert_eq!(open_construct("make &&"), Some(ContinuationHint::AndIf));
        assert_eq!(open_construct("test -f x ||  "), Some(ContinuationHint::OrIf));
        assert_eq!(open_construct("sleep 1 &"), None);
        assert_eq!(open_construct("ls | wc -l"), None);
        assert_eq!(open_construct("echo \\|"), None);
    }

    #[test]
    fn comments_hide_everything_after_them() {
        assert_eq!(open_construct("echo hi # it's |"), None);
        assert_eq!(open_construct("echo a#b |"), Some(ContinuationHint::Pipe));
    }

    #[test]
    fn keywords_nest() {
        assert_eq!(open_keyword("for i in 1 2 3; do"), Some(ContinuationHint::Loop));
        assert_eq!(open_keyword("if true; then\nfor x in y; do\ndone"), Some(ContinuationHint::If));
        assert_eq!(open_keyword("case $x in\na) ;;\nesac"), None);
    }
}
