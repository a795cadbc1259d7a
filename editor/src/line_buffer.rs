use unicode_segmentation::UnicodeSegmentation;

/// Single-line text with a cursor kept on a grapheme boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    text: String,
    /// Byte offset into `text`.
    cursor: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn at_end(&self) -> bool {
        self.cursor == self.text.len()
    }

    pub fn before_cursor(&self) -> &str {
        &self.text[..self.cursor]
    }

    pub fn after_cursor(&self) -> &str {
        &self.text[self.cursor..]
    }

    /// Replace the contents and park the cursor at the end.
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn insert_str(&mut self, s: &str) {
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
    }

    pub fn insert_char(&mut self, ch: char) {
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    /// Replace `start..self.cursor` with `replacement`.
    pub fn replace_before_cursor(&mut self, start: usize, replacement: &str) {
        let start = start.min(self.cursor);
        self.text.replace_range(start..self.cursor, replacement);
        self.cursor = start + replacement.len();
    }

    pub fn backspace(&mut self) -> bool {
        match self.prev_boundary() {
            Some(start) => {
                self.text.replace_range(start..self.cursor, "");
                self.cursor = start;
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self) -> bool {
        match self.next_boundary() {
            Some(end) => {
                self.text.replace_range(self.cursor..end, "");
                true
            }
            None => false,
        }
    }

    pub fn move_left(&mut self) -> bool {
        self.prev_boundary().map(|idx| self.cursor = idx).is_some()
    }

    pub fn move_right(&mut self) -> bool {
        self.next_boundary().map(|idx| self.cursor = idx).is_some()
    }

    pub fn move_home(&mut self) -> bool {
        let moved = self.cursor != 0;
        self.cursor = 0;
        moved
    }

    pub fn move_end(&mut self) -> bool {
        let moved = !self.at_end();
        self.cursor = self.text.len();
        moved
    }

    pub fn kill_to_start(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.text.replace_range(..self.cursor, "");
        self.cursor = 0;
        true
    }

    pub fn kill_to_end(&mut self) -> bool {
        if self.at_end() {
            return false;
        }
        self.text.truncate(self.cursor);
        true
    }

    /// Delete the whitespace-delimited word before the cursor (Ctrl+W).
    pub fn kill_prev_word(&mut self) -> bool {
        let start = self.word_start_before(self.cursor);
        if start == self.cursor {
            return false;
        }
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
        true
    }

    pub fn word_left(&mut self) -> bool {
        let start = self.word_start_before(self.cursor);
        let moved = start != self.cursor;
        self.cursor = start;
        moved
    }

    pub fn word_right(&mut self) -> bool {
        let rest = &self.text[self.cursor..];
        let skipped_ws = rest.len() - rest.trim_start().len();
        let word_len = rest[skipped_ws..]
            .find(char::is_whitespace)
            .unwrap_or(rest.len() - skipped_ws);
        let end = self.cursor + skipped_ws + word_len;
        let moved = end != self.cursor;
        self.cursor = end;
        moved
    }

    /// Byte offset where the word ending at `idx` starts.
    pub fn word_start_before(&self, idx: usize) -> usize {
        let head = &self.text[..idx];
        let trimmed = head.trim_end();
        trimmed
            .rfind(char::is_whitespace)
            .map(|pos| pos + trimmed[pos..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(0)
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.text[..self.cursor]
            .grapheme_indices(true)
            .next_back()
            .map(|(idx, _)| idx)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.text[self.cursor..]
            .graphemes(true)
            .next()
            .map(|g| self.cursor + g.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn buffer(text: &str) -> LineBuffer {
        let mut buffer = LineBuffer::new();
        buffer.set(text);
        buffer
    }

    #[test]
    fn cursor_moves_over_whole_graphemes() {
        let mut buf = buffer("né👍🏽");
        assert!(buf.move_left());
        assert_eq!(buf.after_cursor(), "👍🏽");
        assert!(buf.backspace());
        assert_eq!(buf.text(), "n👍🏽");
        assert!(buf.delete());
        assert_eq!(buf.text(), "n");
        assert!(!buf.delete());
    }

    #[test]
    fn kill_commands() {
        let mut buf = buffer("git commit -m message");
        assert!(buf.kill_prev_word());
        assert_eq!(buf.text(), "git commit -m ");
        buf.word_left();
        buf.word_left();
        assert_eq!(buf.before_cursor(), "git ");
        assert!(buf.kill_to_end());
        assert_eq!(buf.text(), "git ");
        assert!(buf.kill_to_start());
        assert!(buf.is_empty());
    }

    #[test]
    fn word_motion() {
        let mut buf = buffer("ls  -la dir");
        buf.move_home();
        assert!(buf.word_right());
        assert_eq!(buf.before_cursor(), "ls");
        assert!(buf.word_right());
        assert_eq!(buf.before_cursor(), "ls  -la");
        assert_eq!(buf.word_start_before(buf.cursor()), 4);
    }

    #[test]
    fn replace_before_cursor_keeps_tail() {
        let mut buf = buffer("cat sr rest");
        buf.move_home();
        for _ in 0..6 {
            buf.move_right();
        }
        buf.replace_before_cursor(4, "src/");
        assert_eq!(buf.text(), "cat src/ rest");
        assert_eq!(buf.before_cursor(), "cat src/");
    }
}
