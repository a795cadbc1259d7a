//! Styled-line helpers.
//!
//! Styled input (a prompt with SGR escapes, say) is parsed into ratatui
//! [`Line`]s with `ansi-to-tui`. Measuring, cutting, padding and wrapping then
//! work span by span so every piece of text keeps the style it came with.

use std::borrow::Cow;

use ansi_to_tui::IntoText;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::text::Text;
use unicode_width::UnicodeWidthChar;

const TAB: &str = "    ";

/// Display width of a single char; control characters count as zero.
pub fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

/// Remove every escape sequence from `s`.
pub fn strip_ansi(s: &str) -> String {
    match strip_ansi_escapes::strip(s) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(err) => {
            tracing::warn!("failed to strip ANSI escapes: {err}");
            s.to_string()
        }
    }
}

/// Expand tabs to four spaces so painted and measured widths agree.
pub fn expand_tabs(s: &str) -> Cow<'_, str> {
    if s.contains('\t') {
        Cow::Owned(s.replace('\t', TAB))
    } else {
        Cow::Borrowed(s)
    }
}

/// Longest prefix of `s` that fits in `max_width` columns, the rest, and the
/// prefix width. Zero-width chars stay with the char before them.
pub fn take_prefix_by_width(s: &str, max_width: usize) -> (&str, &str, usize) {
    let mut width = 0usize;
    for (idx, ch) in s.char_indices() {
        let ch_width = char_width(ch);
        if width + ch_width > max_width {
            return (&s[..idx], &s[idx..], width);
        }
        width += ch_width;
    }
    (s, "", width)
}

fn owned_span(span: &Span<'_>) -> Span<'static> {
    Span::styled(span.content.to_string(), span.style)
}

fn with_spans(line: &Line<'_>, spans: Vec<Span<'static>>) -> Line<'static> {
    Line {
        spans,
        style: line.style,
        alignment: line.alignment,
    }
}

/// Cut `line` to at most `max_width` columns. A span cut in half keeps its
/// style; a wide char that would straddle the edge is dropped.
pub fn truncate_line(line: &Line<'_>, max_width: usize) -> Line<'static> {
    let mut spans = Vec::with_capacity(line.spans.len());
    let mut width = 0usize;
    for span in &line.spans {
        let span_width = span.width();
        if width + span_width <= max_width {
            width += span_width;
            spans.push(owned_span(span));
            continue;
        }
        let (prefix, _, _) = take_prefix_by_width(&span.content, max_width - width);
        if !prefix.is_empty() {
            spans.push(Span::styled(prefix.to_string(), span.style));
        }
        break;
    }
    with_spans(line, spans)
}

/// Cut `line` to `max_width` columns, ending with `suffix` when anything was
/// cut. Falls back to a plain cut when the suffix alone does not fit.
pub fn truncate_line_with_suffix(line: &Line<'_>, max_width: usize, suffix: &str) -> Line<'static> {
    if line.width() <= max_width {
        return with_spans(line, line.spans.iter().map(owned_span).collect());
    }
    let suffix_width = Span::raw(suffix).width();
    if max_width <= suffix_width {
        return truncate_line(line, max_width);
    }
    let mut out = truncate_line(line, max_width - suffix_width);
    out.spans.push(Span::raw(suffix.to_string()));
    out
}

/// Pad `line` with trailing spaces to exactly `width` columns, truncating
/// first if it is wider.
pub fn pad_line(line: &Line<'_>, width: usize) -> Line<'static> {
    let mut out = truncate_line(line, width);
    let current = out.width();
    if current < width {
        out.spans.push(Span::raw(" ".repeat(width - current)));
    }
    out
}

/// Break `line` into rows of at most `width` columns without looking for
/// word boundaries.
pub fn hard_wrap_line(line: &Line<'_>, width: usize) -> Vec<Line<'static>> {
    hard_wrap_with_cursor(line, width, usize::MAX).0
}

/// [`hard_wrap_line`], also mapping the column offset `cursor` of the
/// unwrapped line to `(column, row)` in the wrapped rows.
///
/// A wide char that does not fit at the end of a row moves to the next one,
/// and a cursor in front of it moves along. A cursor past a full last row
/// lands at column 0 of the row after it, which may not exist yet.
pub fn hard_wrap_with_cursor(
    line: &Line<'_>,
    width: usize,
    cursor: usize,
) -> (Vec<Line<'static>>, (usize, usize)) {
    let width = width.max(1);
    let mut rows: Vec<Line<'static>> = Vec::new();
    let mut row: Vec<Span<'static>> = Vec::new();
    let mut row_width = 0usize;
    let mut offset = 0usize;
    let mut position = None;

    for span in &line.spans {
        let mut piece = String::new();
        for ch in span.content.chars() {
            let ch_width = char_width(ch);
            if ch_width > 0 {
                if row_width > 0 && row_width + ch_width > width {
                    if !piece.is_empty() {
                        row.push(Span::styled(std::mem::take(&mut piece), span.style));
                    }
                    rows.push(with_spans(line, std::mem::take(&mut row)));
                    row_width = 0;
                }
                if position.is_none() && offset >= cursor {
                    position = Some((row_width, rows.len()));
                }
                offset += ch_width;
                row_width += ch_width;
            }
            piece.push(ch);
        }
        if !piece.is_empty() {
            row.push(Span::styled(piece, span.style));
        }
    }
    rows.push(with_spans(line, row));

    let position = position.unwrap_or(if row_width >= width {
        (0, rows.len())
    } else {
        (row_width, rows.len() - 1)
    });
    (rows, position)
}

/// Convert a single ANSI-styled line into a ratatui [`Line`].
pub fn ansi_escape_line(s: &str) -> Line<'static> {
    let s = expand_tabs(s);
    let text = ansi_escape(&s);
    match text.lines.as_slice() {
        [] => Line::from(""),
        [only] => only.clone(),
        [first, rest @ ..] => {
            tracing::warn!("ansi_escape_line: expected a single line, got {first:?} and {rest:?}");
            first.clone()
        }
    }
}

/// Convert ANSI-styled text into ratatui [`Text`].
///
/// Malformed input degrades to the unstyled text rather than failing.
pub fn ansi_escape(s: &str) -> Text<'static> {
    match s.into_text() {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!("failed to parse ANSI escapes: {err}");
            Text::raw(strip_ansi(s))
        }
    }
}
