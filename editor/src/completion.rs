use crate::providers::Candidate;
use crate::scroll_state::ScrollState;

/// Open completion box for the word starting at `word_start`.
#[derive(Debug, Clone)]
pub struct CompletionMenu {
    candidates: Vec<Candidate>,
    word_start: usize,
    pub(crate) scroll: ScrollState,
}

impl CompletionMenu {
    pub fn new(candidates: Vec<Candidate>, word_start: usize) -> Self {
        let scroll = ScrollState::first(candidates.len());
        Self {
            candidates,
            word_start,
            scroll,
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn word_start(&self) -> usize {
        self.word_start
    }

    pub fn selected(&self) -> Option<&Candidate> {
        self.scroll.selected_idx.and_then(|idx| self.candidates.get(idx))
    }

    pub fn select_next(&mut self, visible_rows: usize) {
        self.scroll.move_down_wrap(self.candidates.len());
        self.scroll.ensure_visible(self.candidates.len(), visible_rows);
    }

    pub fn select_prev(&mut self, visible_rows: usize) {
        self.scroll.move_up_wrap(self.candidates.len());
        self.scroll.ensure_visible(self.candidates.len(), visible_rows);
    }

    pub fn into_selected(self) -> Option<(usize, Candidate)> {
        let idx = self.scroll.selected_idx?;
        let word_start = self.word_start;
        self.candidates.into_iter().nth(idx).map(|c| (word_start, c))
    }
}

/// Split the text before the cursor into the word being completed (and where
/// it starts) plus the words before it.
pub(crate) fn completion_target(before_cursor: &str) -> (usize, &str, Vec<String>) {
    let start = before_cursor
        .char_indices()
        .rev()
        .find(|(_, ch)| ch.is_whitespace())
        .map(|(idx, ch)| idx + ch.len_utf8())
        .unwrap_or(0);
    let head = &before_cursor[..start];
    let preceding = shlex::split(head)
        .unwrap_or_else(|| head.split_whitespace().map(String::from).collect());
    (start, &before_cursor[start..], preceding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn target_splits_word_and_arguments() {
        assert_eq!(
            completion_target("git checkout ma"),
            (13, "ma", vec!["git".to_string(), "checkout".to_string()])
        );
        assert_eq!(completion_target("ls "), (3, "", vec!["ls".to_string()]));
        assert_eq!(completion_target("ca"), (0, "ca", Vec::new()));
    }

    #[test]
    fn menu_cycles_and_yields_selection() {
        let mut menu = CompletionMenu::new(
            vec![Candidate::new("main"), Candidate::new("master")],
            13,
        );
        menu.select_next(4);
        assert_eq!(menu.selected().map(|c| c.value.as_str()), Some("master"));
        menu.select_next(4);
        assert_eq!(menu.selected().map(|c| c.value.as_str()), Some("main"));
        menu.select_prev(4);
        assert_eq!(menu.into_selected(), Some((13, Candidate::new("master"))));
    }
}
