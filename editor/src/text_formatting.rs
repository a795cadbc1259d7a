use lookahead_ansi_escape::pad_line;
use ratatui::text::Line;

/// Word-wrap `text` to `width` display columns.
///
/// Newlines are hard breaks and blank lines survive. Words wider than the
/// row are broken on character boundaries.
pub(crate) fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }
    let mut rows = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            rows.push(String::new());
            continue;
        }
        rows.extend(
            textwrap::wrap(line, width)
                .into_iter()
                .map(|row| row.trim_end().to_string()),
        );
    }
    rows
}

/// Fit `rows` into exactly `height` rows: cut the excess, or pad with blank
/// rows split evenly above and below, the odd row going below.
pub(crate) fn center_vertically<T: Clone + Default>(mut rows: Vec<T>, height: usize) -> Vec<T> {
    rows.truncate(height);
    let spare = height - rows.len();
    let top = spare / 2;
    let mut out = Vec::with_capacity(height);
    out.extend(std::iter::repeat_n(T::default(), top));
    out.append(&mut rows);
    out.resize(height, T::default());
    out
}

/// Join two columns row by row; the left column is padded to `left_width`.
pub(crate) fn side_by_side(
    left: &[Line<'static>],
    right: &[Line<'static>],
    left_width: usize,
) -> Vec<Line<'static>> {
    let height = left.len().max(right.len());
    let blank = Line::default();
    (0..height)
        .map(|idx| {
            let mut row = pad_line(left.get(idx).unwrap_or(&blank), left_width);
            if let Some(right) = right.get(idx) {
                row.spans.extend(right.spans.iter().cloned());
            }
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ratatui::style::Stylize;
    use ratatui::text::Span;

    const EXPLANATION: &str = "git status shows the working tree status: paths that differ between \
        the index and HEAD, paths that differ between the worktree and the index, and untracked \
        paths. 日本語のテキストも正しく折り返されます 🚀🚀🚀.\n\nSecond paragraph.";

    #[test]
    fn wrapped_rows_fit_the_width() {
        for width in [8, 13, 20, 37] {
            for row in wrap_text(EXPLANATION, width) {
                assert!(Span::raw(row.as_str()).width() <= width, "{row:?} wider than {width}");
            }
        }
    }

    #[test]
    fn wrapping_is_idempotent() {
        for width in [8, 13, 20, 37] {
            let once = wrap_text(EXPLANATION, width);
            let twice = wrap_text(&once.join("\n"), width);
            assert_eq!(twice, once, "width {width}");
        }
    }

    #[test]
    fn blank_lines_are_preserved() {
        assert_eq!(
            wrap_text("one\n\ntwo", 10),
            vec!["one".to_string(), String::new(), "two".to_string()]
        );
    }

    #[test]
    fn centering_biases_the_remainder_downwards() {
        let rows = center_vertically(vec!["a".to_string()], 4);
        assert_eq!(rows, vec!["", "a", "", ""]);
        let rows = center_vertically(vec!["a".to_string(), "b".to_string(), "c".to_string()], 2);
        assert_eq!(rows, vec!["a", "b"]);
    }

    #[test]
    fn columns_are_padded() {
        let rows = side_by_side(&[Line::raw("ab")], &[Line::from("x".dark_gray()), Line::raw("y")], 4);
        let plain: Vec<String> = rows
            .iter()
            .map(|row| row.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect();
        assert_eq!(plain, vec!["ab  x", "    y"]);
        assert_eq!(rows[0].spans.last(), Some(&"x".dark_gray()));
    }
}
