/// Selection and scroll window for the completion and history-search lists.
///
/// Navigation wraps around at both ends and `scroll_top` follows the
/// selection so the selected row stays inside the visible window.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScrollState {
    pub selected_idx: Option<usize>,
    pub scroll_top: usize,
}

impl ScrollState {
    /// Select the first row of a list of `len` items, or nothing when empty.
    pub fn first(len: usize) -> Self {
        Self {
            selected_idx: (len > 0).then_some(0),
            scroll_top: 0,
        }
    }

    pub fn move_up_wrap(&mut self, len: usize) {
        if len == 0 {
            *self = Self::default();
            return;
        }
        self.selected_idx = Some(match self.selected_idx {
            Some(idx) if idx > 0 => idx - 1,
            Some(_) => len - 1,
            None => 0,
        });
    }

    pub fn move_down_wrap(&mut self, len: usize) {
        if len == 0 {
            *self = Self::default();
            return;
        }
        self.selected_idx = Some(match self.selected_idx {
            Some(idx) if idx + 1 < len => idx + 1,
            _ => 0,
        });
    }

    pub fn ensure_visible(&mut self, len: usize, visible_rows: usize) {
        if len == 0 || visible_rows == 0 {
            self.scroll_top = 0;
            return;
        }
        match self.selected_idx {
            Some(sel) if sel < self.scroll_top => self.scroll_top = sel,
            Some(sel) if sel >= self.scroll_top + visible_rows => {
                self.scroll_top = sel + 1 - visible_rows;
            }
            Some(_) => {}
            None => self.scroll_top = 0,
        }
    }

    /// Rows `scroll_top..` that fit in `visible_rows`, as a range into the list.
    ///
    /// Starts later when fewer rows are painted than `scroll_top` was kept
    /// for, so the selection is always inside the range.
    pub fn window(&self, len: usize, visible_rows: usize) -> std::ops::Range<usize> {
        let mut start = self.scroll_top;
        if let Some(sel) = self.selected_idx
            && visible_rows > 0
            && sel >= start + visible_rows
        {
            start = sel + 1 - visible_rows;
        }
        let start = start.min(len);
        start..(start + visible_rows).min(len)
    }
}

#[cfg(test)]
mod tests {
    use super::ScrollState;
    use pretty_assertions::assert_eq;

    #[test]
    fn wrap_and_follow_selection() {
        let mut state = ScrollState::first(5);
        state.move_up_wrap(5);
        state.ensure_visible(5, 3);
        assert_eq!(state.selected_idx, Some(4));
        assert_eq!(state.scroll_top, 2);
        assert_eq!(state.window(5, 3), 2..5);

        state.move_down_wrap(5);
        state.ensure_visible(5, 3);
        assert_eq!(state.selected_idx, Some(0));
        assert_eq!(state.scroll_top, 0);
    }

    #[test]
    fn shorter_window_still_holds_the_selection() {
        let mut state = ScrollState::first(10);
        for _ in 0..6 {
            state.move_down_wrap(10);
        }
        state.ensure_visible(10, 8);
        assert_eq!(state.scroll_top, 0);
        assert_eq!(state.window(10, 8), 0..8);
        assert_eq!(state.window(10, 3), 4..7);
    }

    #[test]
    fn empty_list_clears_selection() {
        let mut state = ScrollState::first(3);
        state.move_down_wrap(0);
        assert_eq!(state, ScrollState::default());
        assert_eq!(ScrollState::first(0).selected_idx, None);
    }
}
