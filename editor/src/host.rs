//! Where frames are painted and input comes from.

use std::io::IsTerminal;
use std::io::Stdout;
use std::io::Write;

use async_trait::async_trait;
use crossterm::cursor::MoveTo;
use crossterm::event::DisableBracketedPaste;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::Event;
use crossterm::event::EventStream;
use crossterm::execute;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::Clear;
use crossterm::terminal::ClearType;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use futures::StreamExt;
use ratatui::Terminal;
use ratatui::TerminalOptions;
use ratatui::Viewport;
use ratatui::backend::CrosstermBackend;
use ratatui::text::Text;
use ratatui::widgets::Paragraph;

use crate::error::EditorError;
use crate::event::EditorEvent;
use crate::render::Frame;

const FALLBACK_SIZE: (u16, u16) = (80, 24);

#[async_trait]
pub trait Host: Send {
    /// Next input event, or `None` once input is exhausted.
    ///
    /// Must be cancel-safe: the edit loop polls it inside `select!`.
    async fn next_event(&mut self) -> Result<Option<EditorEvent>, EditorError>;

    /// `(width, height)` in cells.
    fn size(&self) -> (u16, u16);

    fn paint(&mut self, frame: &Frame) -> Result<(), EditorError>;

    /// Paint the final frame and leave the cursor on the line below it.
    fn finish(&mut self, frame: &Frame) -> Result<(), EditorError>;
}

type Backend = CrosstermBackend<Stdout>;

/// Inline viewport under the shell's scrollback, in raw mode for the
/// lifetime of the host.
pub struct TerminalHost {
    terminal: Option<Terminal<Backend>>,
    viewport_height: u16,
    events: EventStream,
}

impl TerminalHost {
    pub fn new() -> Result<Self, EditorError> {
        if !std::io::stdin().is_terminal() {
            return Err(EditorError::Terminal("stdin is not a terminal".to_string()));
        }
        enable_raw_mode()?;
        execute!(std::io::stdout(), EnableBracketedPaste)?;
        Ok(Self {
            terminal: None,
            viewport_height: 0,
            events: EventStream::new(),
        })
    }

    /// The inline terminal, grown to at least `height` rows.
    ///
    /// Growing clears the old viewport and opens a taller one at the same
    /// origin; ratatui scrolls the screen when the new one does not fit.
    fn terminal(&mut self, height: u16) -> Result<&mut Terminal<Backend>, EditorError> {
        let height = height.max(1);
        if self.viewport_height < height
            && let Some(mut old) = self.terminal.take()
        {
            old.clear()?;
        }
        if self.terminal.is_none() {
            self.viewport_height = self.viewport_height.max(height);
            let terminal = Terminal::with_options(
                CrosstermBackend::new(std::io::stdout()),
                TerminalOptions {
                    viewport: Viewport::Inline(self.viewport_height),
                },
            )?;
            self.terminal = Some(terminal);
        }
        self.terminal
            .as_mut()
            .ok_or_else(|| EditorError::Terminal("viewport not initialized".to_string()))
    }

    fn draw(&mut self, frame: &Frame) -> Result<u16, EditorError> {
        let text = Text::from(frame.lines.clone());
        let cursor = frame.cursor;
        let terminal = self.terminal(frame.height())?;
        let completed = terminal.draw(|f| {
            let area = f.area();
            f.render_widget(Paragraph::new(text), area);
            if let Some((x, y)) = cursor {
                let x = area.x + x.min(area.width.saturating_sub(1));
                let y = area.y + y.min(area.height.saturating_sub(1));
                f.set_cursor_position((x, y));
            }
        })?;
        Ok(completed.area.y)
    }
}

#[async_trait]
impl Host for TerminalHost {
    async fn next_event(&mut self) -> Result<Option<EditorEvent>, EditorError> {
        loop {
            let Some(event) = self.events.next().await else {
                return Ok(None);
            };
            match event? {
                Event::Key(key) => return Ok(Some(EditorEvent::Key(key))),
                Event::Paste(text) => return Ok(Some(EditorEvent::Paste(text))),
                Event::Resize(width, height) => {
                    return Ok(Some(EditorEvent::Resize { width, height }));
                }
                _ => {}
            }
        }
    }

    fn size(&self) -> (u16, u16) {
        crossterm::terminal::size().unwrap_or(FALLBACK_SIZE)
    }

    fn paint(&mut self, frame: &Frame) -> Result<(), EditorError> {
        self.draw(frame).map(|_| ())
    }

    fn finish(&mut self, frame: &Frame) -> Result<(), EditorError> {
        let top = self.draw(frame)?;
        let mut out = std::io::stdout();
        let last = top + frame.height().saturating_sub(1);
        queue!(out, MoveTo(0, last))?;
        if !frame.lines.is_empty() {
            queue!(out, Print("\r\n"))?;
        }
        queue!(out, Clear(ClearType::FromCursorDown))?;
        out.flush()?;
        if let Some(mut terminal) = self.terminal.take() {
            terminal.show_cursor()?;
        }
        Ok(())
    }
}

impl Drop for TerminalHost {
    fn drop(&mut self) {
        if let Err(err) = execute!(std::io::stdout(), DisableBracketedPaste) {
            tracing::warn!("failed to disable bracketed paste: {err}");
        }
        if let Err(err) = disable_raw_mode() {
            tracing::warn!("failed to leave raw mode: {err}");
        }
    }
}
