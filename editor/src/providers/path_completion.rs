use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;
use std::path::PathBuf;

use super::Candidate;
use super::CompletionProvider;

const MAX_CANDIDATES: usize = 200;

/// Completes command names from history and `$PATH`, and later words from
/// the filesystem.
#[derive(Debug, Clone)]
pub struct PathCompletionProvider {
    history: Vec<String>,
    search_path: Option<OsString>,
    cwd: Option<PathBuf>,
}

impl PathCompletionProvider {
    pub fn new(history: Vec<String>) -> Self {
        Self {
            history,
            search_path: std::env::var_os("PATH"),
            cwd: None,
        }
    }

    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    fn commands(&self, word: &str) -> Vec<Candidate> {
        let mut found: BTreeMap<String, &'static str> = BTreeMap::new();
        for entry in &self.history {
            if let Some(name) = entry.split_whitespace().next()
                && name.starts_with(word)
            {
                found.entry(name.to_string()).or_insert("from history");
            }
        }
        if let Some(search_path) = &self.search_path {
            for dir in std::env::split_paths(search_path) {
                let Ok(read_dir) = std::fs::read_dir(&dir) else {
                    continue;
                };
                for entry in read_dir.flatten() {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if name.starts_with(word) && is_executable(&entry.path()) {
                        found.entry(name).or_insert("command");
                    }
                }
            }
        }
        found
            .into_iter()
            .take(MAX_CANDIDATES)
            .map(|(name, description)| Candidate::new(name).with_description(description))
            .collect()
    }

    fn paths(&self, word: &str) -> Vec<Candidate> {
        let (dir_part, file_prefix) = match word.rfind('/') {
            Some(idx) => word.split_at(idx + 1),
            None => ("", word),
        };
        let base = match self.cwd.clone().or_else(|| std::env::current_dir().ok()) {
            Some(cwd) => cwd,
            None => return Vec::new(),
        };
        let dir = resolve_dir(&base, dir_part);
        let Ok(read_dir) = std::fs::read_dir(&dir) else {
            return Vec::new();
        };
        let mut candidates: Vec<Candidate> = read_dir
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !name.starts_with(file_prefix) || (name.starts_with('.') && !file_prefix.starts_with('.')) {
                    return None;
                }
                let is_dir = entry.file_type().map(|kind| kind.is_dir()).unwrap_or(false);
                let (suffix, description) = if is_dir { ("/", "directory") } else { ("", "file") };
                Some(Candidate::new(format!("{dir_part}{name}{suffix}")).with_description(description))
            })
            .collect();
        candidates.sort_by(|a, b| a.value.cmp(&b.value));
        candidates.truncate(MAX_CANDIDATES);
        candidates
    }
}

impl CompletionProvider for PathCompletionProvider {
    fn completions(&self, word: &str, preceding_args: &[String]) -> Vec<Candidate> {
        let looks_like_path = word.contains('/') || word.starts_with('.') || word.starts_with('~');
        if preceding_args.is_empty() && !looks_like_path {
            self.commands(word)
        } else {
            self.paths(word)
        }
    }
}

fn resolve_dir(base: &Path, dir_part: &str) -> PathBuf {
    if dir_part.is_empty() {
        return base.to_path_buf();
    }
    if let Some(rest) = dir_part.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    base.join(dir_part)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
