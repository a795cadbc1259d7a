//! Frame layout: input lines on top, the assistant box below.

use lookahead_ansi_escape::ansi_escape_line;
use lookahead_ansi_escape::expand_tabs;
use lookahead_ansi_escape::hard_wrap_line;
use lookahead_ansi_escape::hard_wrap_with_cursor;
use lookahead_ansi_escape::pad_line;
use lookahead_ansi_escape::truncate_line_with_suffix;
use lookahead_shell_command::CommandRisk;
use lookahead_shell_command::classify;
use ratatui::style::Style;
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::text::Span;

use crate::completion::CompletionMenu;
use crate::config::EditorConfig;
use crate::history::HistorySearch;
use crate::session::Mode;
use crate::session::Session;
use crate::session::Stage;
use crate::text_formatting::center_vertically;
use crate::text_formatting::side_by_side;
use crate::text_formatting::wrap_text;

const DIVIDER: &str = "│";
const ELLIPSIS: &str = "…";
/// Minimum border fill kept between bottom-border segments.
const SEGMENT_MARGIN: usize = 2;
const INTERRUPT_MARKER: &str = "^C";

const KEY_HELP: &str = "Enter      run, or continue an open command\n\
Tab        complete the word at the cursor\n\
Right/End  accept the suggestion (Alt+Right: one word)\n\
Up/Down    browse history, Ctrl+R to search it\n\
Ctrl+A/E   start/end of line, Alt+B/F by word\n\
Ctrl+U/K/W kill to start, to end, previous word\n\
Esc        dismiss the idle summary or this help\n\
Ctrl+C     discard the line, Ctrl+D on empty line to quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub badge: String,
    /// Content rows inside the assistant box.
    pub box_height: u16,
}

impl From<&EditorConfig> for RenderOptions {
    fn from(config: &EditorConfig) -> Self {
        Self {
            badge: config.badge.clone(),
            box_height: config.box_height,
        }
    }
}

/// Rendered rows, plus where the cursor goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub lines: Vec<Line<'static>>,
    /// `(column, row)` relative to the first line.
    pub cursor: Option<(u16, u16)>,
}

impl Frame {
    pub fn height(&self) -> u16 {
        u16::try_from(self.lines.len()).unwrap_or(u16::MAX)
    }
}

pub fn render(session: &Session, options: &RenderOptions, width: u16, height: u16) -> Frame {
    let width = usize::from(width.max(1));
    if session.is_finished() {
        return render_final(session, width);
    }

    let (mut lines, (cursor_col, mut cursor_row)) = input_rows(session, width);
    let height = usize::from(height.max(1));
    if lines.len() > height {
        let excess = lines.len() - height;
        lines.drain(..excess);
        cursor_row = cursor_row.saturating_sub(excess);
    }

    let available = usize::from(options.box_height).min(height.saturating_sub(lines.len() + 2));
    // Corners plus one column of padding on each side.
    if available > 0 && width >= 6 {
        let inner_width = width - 2;
        let content_width = inner_width - 2;
        lines.push(top_border(session, &options.badge, inner_width));
        for row in box_rows(session, content_width, available) {
            let mut spans = vec!["│ ".dark_gray()];
            spans.extend(pad_line(&row, content_width).spans);
            spans.push(" │".dark_gray());
            lines.push(Line::from(spans));
        }
        lines.push(bottom_border(session, inner_width));
    }

    Frame {
        lines,
        cursor: Some((to_u16(cursor_col), to_u16(cursor_row))),
    }
}

fn to_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

fn text_width(text: &str) -> usize {
    Span::raw(text).width()
}

/// Patch `style` onto every span.
fn restyle(line: Line<'static>, style: Style) -> Line<'static> {
    Line::from(
        line.spans
            .into_iter()
            .map(|span| span.patch_style(style))
            .collect::<Vec<_>>(),
    )
}

/// A styled prompt followed by plain text.
fn prompted(prompt: &str, text: &str) -> Line<'static> {
    let mut line = ansi_escape_line(prompt);
    line.spans.push(Span::raw(expand_tabs(text).into_owned()));
    line
}

/// Accumulated lines, then the live line with ghost text after the cursor.
fn input_rows(session: &Session, width: usize) -> (Vec<Line<'static>>, (usize, usize)) {
    let mut rows = Vec::new();
    if session.is_multiline_open() {
        for line in session.multiline_lines() {
            rows.extend(hard_wrap_line(&prompted(&line.prompt, &line.text), width));
        }
    }

    let buffer = session.buffer();
    let mut live = ansi_escape_line(session.active_prompt());
    let offset = live.width() + text_width(&expand_tabs(buffer.before_cursor()));
    live.spans.push(Span::raw(expand_tabs(buffer.text()).into_owned()));
    if buffer.at_end()
        && let Some(ghost) = session.ghost_text()
    {
        live.spans.push(Span::raw(expand_tabs(ghost).into_owned()).dark_gray());
    }

    let (wrapped, (cursor_col, row)) = hard_wrap_with_cursor(&live, width, offset);
    let cursor_row = rows.len() + row;
    rows.extend(wrapped);
    while rows.len() <= cursor_row {
        rows.push(Line::default());
    }
    (rows, (cursor_col, cursor_row))
}

/// Transcript of the finished turn; no box, no cursor.
fn render_final(session: &Session, width: usize) -> Frame {
    let transcript = session.transcript();
    let mut lines = Vec::new();
    for (idx, line) in transcript.iter().enumerate() {
        let mut text = prompted(&line.prompt, &line.text);
        if session.mode() == Mode::Interrupted && idx + 1 == transcript.len() {
            text.spans.push(INTERRUPT_MARKER.red());
        }
        lines.extend(hard_wrap_line(&text, width));
    }
    Frame {
        lines,
        cursor: None,
    }
}

fn plain_rows(rows: Vec<String>, style: Style) -> Vec<Line<'static>> {
    rows.into_iter().map(|row| Line::from(Span::styled(row, style))).collect()
}

/// Box content in priority order: error, history search, completion with
/// help, completion, help, explanation.
fn box_rows(session: &Session, content_width: usize, available: usize) -> Vec<Line<'static>> {
    if let Some(error) = session.last_error() {
        let rows = wrap_text(&format!("error: {error}"), content_width);
        return center_vertically(plain_rows(rows, Style::new().red()), available);
    }
    if let Some(search) = session.search() {
        return center_vertically(search_rows(search, content_width, available), available);
    }
    if let Some(menu) = session.completion() {
        let help = menu.selected().and_then(|candidate| candidate.description.as_deref());
        let rows = match help {
            Some(help) => {
                let left_width = content_width / 2;
                let right_width = content_width - left_width;
                let list = completion_rows(menu, left_width.saturating_sub(1), available);
                let help = plain_rows(wrap_text(help, right_width), Style::new().dark_gray());
                side_by_side(&list, &help, left_width)
            }
            None => completion_rows(menu, content_width, available),
        };
        return center_vertically(rows, available);
    }
    let text = if session.show_help() {
        KEY_HELP
    } else {
        session.visible_explanation()
    };
    center_vertically(plain_rows(wrap_text(text, content_width), Style::new()), available)
}

fn highlighted_row(text: &str, width: usize, selected: bool) -> Line<'static> {
    let marker = if selected { "› " } else { "  " };
    let row = Line::raw(format!("{marker}{text}"));
    let row = pad_line(&truncate_line_with_suffix(&row, width, ELLIPSIS), width);
    if selected {
        restyle(row, Style::new().reversed())
    } else {
        row
    }
}

fn completion_rows(menu: &CompletionMenu, width: usize, available: usize) -> Vec<Line<'static>> {
    let candidates = menu.candidates();
    menu.scroll
        .window(candidates.len(), available)
        .map(|idx| {
            let selected = menu.scroll.selected_idx == Some(idx);
            highlighted_row(&candidates[idx].value, width, selected)
        })
        .collect()
}

fn search_rows(search: &HistorySearch, width: usize, available: usize) -> Vec<Line<'static>> {
    let header = Line::raw(format!("search: {}▏", search.query()));
    let mut rows = vec![restyle(
        truncate_line_with_suffix(&header, width, ELLIPSIS),
        Style::new().bold(),
    )];
    let matches = search.matches();
    if matches.is_empty() {
        rows.push(Line::from("  no matches".dark_gray()));
        return rows;
    }
    let visible = available.saturating_sub(1).max(1);
    rows.extend(search.scroll.window(matches.len(), visible).map(|idx| {
        let selected = search.scroll.selected_idx == Some(idx);
        highlighted_row(&matches[idx], width, selected)
    }));
    rows
}

fn risk_glyph(risk: CommandRisk) -> Span<'static> {
    let glyph = risk.glyph();
    match risk {
        CommandRisk::Safe => glyph.green(),
        CommandRisk::Caution => glyph.yellow(),
        CommandRisk::Danger => glyph.red(),
    }
}

fn top_border(session: &Session, badge: &str, inner_width: usize) -> Line<'static> {
    let target = session
        .prediction()
        .map(|prediction| prediction.suggestion.as_str())
        .unwrap_or(session.buffer().text());
    let mut segment = vec![
        Span::raw(" "),
        Span::raw(badge.to_string()).bold(),
        Span::raw(" "),
        risk_glyph(classify(target)),
        Span::raw(" "),
    ];

    let context = session.context();
    let mut location = context.cwd.clone().unwrap_or_default();
    if let Some(git) = &context.git {
        if !location.is_empty() {
            location.push(' ');
        }
        location.push_str(&git.label());
    }
    if !location.is_empty() {
        segment.push(DIVIDER.dark_gray());
        segment.push(Span::raw(format!(" {location} ")));
    }

    let segment = truncate_line_with_suffix(&Line::from(segment), inner_width, ELLIPSIS);
    let fill = inner_width - segment.width().min(inner_width);
    let mut spans = vec!["╭".dark_gray()];
    spans.extend(segment.spans);
    spans.push(Span::raw(format!("{}╮", "─".repeat(fill))).dark_gray());
    Line::from(spans)
}

fn status_indicator(session: &Session) -> Span<'static> {
    if session.last_error().is_some() {
        return " error ".red();
    }
    let label = match session.stage() {
        Some(Stage::Debounce | Stage::Prediction) => " predicting… ",
        Some(Stage::Explanation) => " explaining… ",
        None if session.idle_state().pending => " summarizing… ",
        None => return " ready ".green(),
    };
    label.yellow()
}

fn bottom_border(session: &Session, inner_width: usize) -> Line<'static> {
    let context = session.context();
    let left = context
        .load_average
        .map(|load| format!(" load {load:.2} "))
        .unwrap_or_default();
    let center = context
        .user_host
        .as_ref()
        .map(|user_host| format!(" {user_host} "))
        .unwrap_or_default();
    let indicator = status_indicator(session);

    let left_width = text_width(&left);
    let center_width = text_width(&center);
    let indicator_width = indicator.width();
    let fill = |n: usize| Span::raw("─".repeat(n)).dark_gray();

    let mut spans = vec!["╰".dark_gray()];
    if indicator_width > inner_width {
        spans.push(fill(inner_width));
    } else if left_width + indicator_width + SEGMENT_MARGIN > inner_width {
        spans.extend([fill(inner_width - indicator_width), indicator]);
    } else if center_width > 0 && left_width + center_width + indicator_width + 2 * SEGMENT_MARGIN <= inner_width {
        let earliest = left_width + SEGMENT_MARGIN;
        let latest = inner_width - indicator_width - SEGMENT_MARGIN - center_width;
        let start = ((inner_width - center_width) / 2).clamp(earliest, latest);
        let after_center = inner_width - start - center_width - indicator_width;
        spans.extend([
            Span::raw(left),
            fill(start - left_width),
            Span::raw(center),
            fill(after_center),
            indicator,
        ]);
    } else {
        let between = inner_width - left_width - indicator_width;
        spans.extend([Span::raw(left), fill(between), indicator]);
    }
    spans.push("╯".dark_gray());
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crossterm::event::KeyCode;
    use crossterm::event::KeyEvent;
    use crossterm::event::KeyModifiers;
    use lookahead_shell_command::BashOracle;
    use pretty_assertions::assert_eq;
    use tokio::time::Instant;

    use super::*;
    use crate::controller::EditRequest;
    use crate::controller::SessionController;
    use crate::error::ProviderFailure;
    use crate::event::Completion;
    use crate::event::EditorEvent;
    use crate::providers::ContextSnapshot;
    use crate::providers::GitStatus;

    fn options() -> RenderOptions {
        RenderOptions {
            badge: "la".to_string(),
            box_height: 4,
        }
    }

    fn controller(explanation: &str) -> SessionController {
        SessionController::new(
            EditRequest::new("$ ").with_initial_explanation(explanation),
            &EditorConfig::default(),
            Arc::new(BashOracle::new().unwrap()),
            None,
            false,
            Instant::now(),
        )
    }

    fn press(controller: &mut SessionController, code: KeyCode, modifiers: KeyModifiers) {
        controller.handle(EditorEvent::Key(KeyEvent::new(code, modifiers)), Instant::now());
    }

    fn type_str(controller: &mut SessionController, text: &str) {
        for ch in text.chars() {
            press(controller, KeyCode::Char(ch), KeyModifiers::NONE);
        }
    }

    fn plain(frame: &Frame) -> Vec<String> {
        frame
            .lines
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn every_box_row_spans_the_width() {
        let mut controller = controller("Explains things at length so that wrapping kicks in.");
        type_str(&mut controller, "ls");
        let frame = render(controller.session(), &options(), 30, 20);
        assert_eq!(frame.lines.len(), 1 + 4 + 2);
        for line in &plain(&frame)[1..] {
            assert_eq!(text_width(line), 30, "{line:?}");
        }
        assert_eq!(frame.cursor, Some((4, 0)));
    }

    #[test]
    fn short_content_is_centered_with_remainder_below() {
        let controller = controller("hello");
        let frame = render(controller.session(), &options(), 20, 20);
        let rows = plain(&frame);
        assert_eq!(rows[2], format!("│ {:<16} │", ""));
        assert_eq!(rows[3], format!("│ {:<16} │", "hello"));
        assert_eq!(rows[4], format!("│ {:<16} │", ""));
        assert_eq!(rows[5], format!("│ {:<16} │", ""));
    }

    #[test]
    fn error_outranks_explanation() {
        let mut controller = controller("hello");
        type_str(&mut controller, "x");
        let generation = controller.session().prediction_generation();
        controller.handle(
            EditorEvent::Completed(Completion::Prediction {
                generation,
                result: Err(ProviderFailure::new("model offline")),
            }),
            Instant::now(),
        );
        let rows = plain(&render(controller.session(), &options(), 40, 20));
        assert!(rows.iter().any(|row| row.contains("error: model offline")));
        assert!(!rows.iter().any(|row| row.contains("hello")));
        assert!(rows.last().is_some_and(|row| row.contains(" error ")));
    }

    #[test]
    fn ghost_text_follows_the_buffer() {
        let mut controller = controller("");
        type_str(&mut controller, "git");
        let generation = controller.session().prediction_generation();
        controller.handle(
            EditorEvent::Completed(Completion::Prediction {
                generation,
                result: Ok(crate::providers::Prediction::new("git status")),
            }),
            Instant::now(),
        );
        let frame = render(controller.session(), &options(), 40, 20);
        assert_eq!(plain(&frame)[0], "$ git status");
        assert_eq!(frame.cursor, Some((5, 0)));
        assert!(plain(&frame).last().is_some_and(|row| row.contains("explaining…")));
    }

    #[test]
    fn borders_show_chrome_and_drop_center_when_narrow() {
        let mut controller = controller("");
        controller.handle(
            EditorEvent::Completed(Completion::Context(Ok(ContextSnapshot {
                cwd: Some("~/src/app".to_string()),
                git: Some(GitStatus {
                    branch: "main".to_string(),
                    dirty: true,
                }),
                load_average: Some(0.42),
                user_host: Some("dev@box".to_string()),
            }))),
            Instant::now(),
        );
        let rows = plain(&render(controller.session(), &options(), 60, 20));
        let top = &rows[1];
        assert!(top.starts_with("╭ la ● │ ~/src/app (main*) ─"), "{top:?}");
        let bottom = rows.last().cloned().unwrap_or_default();
        assert!(bottom.starts_with("╰ load 0.42 ─"), "{bottom:?}");
        assert!(bottom.contains(" dev@box "));
        assert!(bottom.ends_with(" ready ╯"));

        let narrow = plain(&render(controller.session(), &options(), 26, 20));
        let bottom = narrow.last().cloned().unwrap_or_default();
        assert_eq!(text_width(&bottom), 26);
        assert!(!bottom.contains("dev@box"), "{bottom:?}");
        assert!(bottom.contains("load 0.42"));
    }

    #[test]
    fn interrupted_transcript_keeps_accumulated_lines() {
        let mut controller = controller("");
        type_str(&mut controller, "if true; then");
        press(&mut controller, KeyCode::Enter, KeyModifiers::NONE);
        type_str(&mut controller, "echo 1");
        let open = plain(&render(controller.session(), &options(), 40, 20));
        assert_eq!(open[..2], ["$ if true; then".to_string(), "if> echo 1".to_string()]);

        press(&mut controller, KeyCode::Char('c'), KeyModifiers::CONTROL);
        let frame = render(controller.session(), &options(), 40, 20);
        assert_eq!(plain(&frame), vec!["$ if true; then", "if> echo 1^C"]);
        assert_eq!(frame.cursor, None);
    }

    #[test]
    fn cursor_tracks_tabs_and_wrapped_wide_chars() {
        let mut tabbed = controller("");
        tabbed.handle(EditorEvent::Paste("a\tb".to_string()), Instant::now());
        let frame = render(tabbed.session(), &options(), 40, 20);
        assert_eq!(plain(&frame)[0], "$ a    b");
        assert_eq!(frame.cursor, Some((8, 0)));

        let mut wide = controller("");
        type_str(&mut wide, "abcdefg日");
        press(&mut wide, KeyCode::Left, KeyModifiers::NONE);
        let frame = render(wide.session(), &options(), 10, 20);
        assert_eq!(plain(&frame)[..2], ["$ abcdefg".to_string(), "日".to_string()]);
        assert_eq!(frame.cursor, Some((0, 1)));
    }

    #[test]
    fn short_terminal_keeps_the_selected_candidate_visible() {
        use crate::providers::Candidate;
        use crate::providers::CompletionProvider;

        struct Many;
        impl CompletionProvider for Many {
            fn completions(&self, _word: &str, _preceding_args: &[String]) -> Vec<Candidate> {
                (0..10).map(|idx| Candidate::new(format!("c{idx}"))).collect()
            }
        }

        let config = EditorConfig {
            box_height: 8,
            ..EditorConfig::default()
        };
        let mut controller = SessionController::new(
            EditRequest::new("$ "),
            &config,
            Arc::new(BashOracle::new().unwrap()),
            Some(Arc::new(Many)),
            false,
            Instant::now(),
        );
        type_str(&mut controller, "ls ");
        for _ in 0..6 {
            press(&mut controller, KeyCode::Tab, KeyModifiers::NONE);
        }
        let options = RenderOptions::from(&config);
        let rows = plain(&render(controller.session(), &options, 30, 6));
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().any(|row| row.contains("› c5")), "{rows:?}");
    }

    #[test]
    fn completion_and_help_share_the_box() {
        use crate::providers::Candidate;
        use crate::providers::CompletionProvider;

        struct Branches;
        impl CompletionProvider for Branches {
            fn completions(&self, _word: &str, _preceding_args: &[String]) -> Vec<Candidate> {
                vec![
                    Candidate::new("main").with_description("default branch"),
                    Candidate::new("dev").with_description("integration"),
                ]
            }
        }

        let mut controller = SessionController::new(
            EditRequest::new("$ "),
            &EditorConfig::default(),
            Arc::new(BashOracle::new().unwrap()),
            Some(Arc::new(Branches)),
            false,
            Instant::now(),
        );
        type_str(&mut controller, "git switch ");
        press(&mut controller, KeyCode::Tab, KeyModifiers::NONE);
        let rows = plain(&render(controller.session(), &options(), 44, 20));
        let row = rows.iter().find(|row| row.contains("› main")).cloned().unwrap_or_default();
        assert!(row.contains("default branch"), "{row:?}");
        assert!(rows.iter().any(|row| row.contains("  dev")));

        press(&mut controller, KeyCode::Esc, KeyModifiers::NONE);
        press(&mut controller, KeyCode::F(1), KeyModifiers::NONE);
        let rows = plain(&render(controller.session(), &options(), 70, 20));
        assert!(rows.iter().any(|row| row.contains("Tab        complete")));
    }
}
