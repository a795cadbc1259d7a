use crate::scroll_state::ScrollState;

/// Up/Down navigation over history values (oldest first).
#[derive(Debug, Clone, Default)]
pub struct HistoryNav {
    entries: Vec<String>,
    index: Option<usize>,
    draft: String,
}

impl HistoryNav {
    pub fn new(entries: Vec<String>) -> Self {
        Self {
            entries,
            index: None,
            draft: String::new(),
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_browsing(&self) -> bool {
        self.index.is_some()
    }

    /// Step to an older entry. `current` is remembered as the draft when
    /// navigation starts.
    pub fn older(&mut self, current: &str) -> Option<&str> {
        let next = match self.index {
            None if self.entries.is_empty() => return None,
            None => {
                self.draft = current.to_string();
                self.entries.len() - 1
            }
            Some(0) => return None,
            Some(idx) => idx - 1,
        };
        self.index = Some(next);
        self.entries.get(next).map(String::as_str)
    }

    /// Step to a newer entry, or back to the draft past the newest one.
    pub fn newer(&mut self) -> Option<String> {
        let idx = self.index?;
        if idx + 1 < self.entries.len() {
            self.index = Some(idx + 1);
            return self.entries.get(idx + 1).cloned();
        }
        self.index = None;
        Some(std::mem::take(&mut self.draft))
    }

    /// Stop browsing without touching the buffer.
    pub fn detach(&mut self) {
        self.index = None;
        self.draft.clear();
    }
}

/// Incremental reverse search (Ctrl+R) over history values.
#[derive(Debug, Clone)]
pub struct HistorySearch {
    query: String,
    matches: Vec<String>,
    pub(crate) scroll: ScrollState,
}

impl HistorySearch {
    pub fn new(entries: &[String]) -> Self {
        let mut search = Self {
            query: String::new(),
            matches: Vec::new(),
            scroll: ScrollState::default(),
        };
        search.refresh(entries);
        search
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Matching entries, newest first, without duplicates.
    pub fn matches(&self) -> &[String] {
        &self.matches
    }

    pub fn selected(&self) -> Option<&str> {
        self.scroll
            .selected_idx
            .and_then(|idx| self.matches.get(idx))
            .map(String::as_str)
    }

    pub fn push_char(&mut self, ch: char, entries: &[String]) {
        self.query.push(ch);
        self.refresh(entries);
    }

    pub fn pop_char(&mut self, entries: &[String]) {
        self.query.pop();
        self.refresh(entries);
    }

    pub fn select_older(&mut self, visible_rows: usize) {
        self.scroll.move_down_wrap(self.matches.len());
        self.scroll.ensure_visible(self.matches.len(), visible_rows);
    }

    pub fn select_newer(&mut self, visible_rows: usize) {
        self.scroll.move_up_wrap(self.matches.len());
        self.scroll.ensure_visible(self.matches.len(), visible_rows);
    }

    fn refresh(&mut self, entries: &[String]) {
        let needle = self.query.to_lowercase();
        let mut matches: Vec<String> = Vec::new();
        for entry in entries.iter().rev() {
            if entry.to_lowercase().contains(&needle) && !matches.contains(entry) {
                matches.push(entry.clone());
            }
        }
        self.matches = matches;
        self.scroll = ScrollState::first(self.matches.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entries() -> Vec<String> {
        ["git status", "ls", "git log", "Git status"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn navigation_restores_draft() {
        let mut nav = HistoryNav::new(entries());
        assert_eq!(nav.older("gi"), Some("Git status"));
        assert_eq!(nav.older("ignored"), Some("git log"));
        assert_eq!(nav.newer(), Some("Git status".to_string()));
        assert_eq!(nav.newer(), Some("gi".to_string()));
        assert!(!nav.is_browsing());
        assert_eq!(nav.newer(), None);
    }

    #[test]
    fn older_stops_at_oldest() {
        let mut nav = HistoryNav::new(vec!["only".to_string()]);
        assert_eq!(nav.older(""), Some("only"));
        assert_eq!(nav.older(""), None);
    }

    #[test]
    fn search_is_case_insensitive_newest_first() {
        let entries = entries();
        let mut search = HistorySearch::new(&entries);
        for ch in "GIT".chars() {
            search.push_char(ch, &entries);
        }
        assert_eq!(
            search.matches(),
            &["Git status".to_string(), "git log".to_string(), "git status".to_string()]
        );
        assert_eq!(search.selected(), Some("Git status"));
        search.select_older(5);
        assert_eq!(search.selected(), Some("git log"));
        search.pop_char(&entries);
        assert_eq!(search.query(), "GI");
        assert_eq!(search.selected(), Some("Git status"));
    }

    #[test]
    fn duplicate_entries_collapse() {
        let entries: Vec<String> = ["make", "make", "make test"].into_iter().map(String::from).collect();
        let search = HistorySearch::new(&entries);
        assert_eq!(search.matches(), &["make test".to_string(), "make".to_string()]);
    }
}
