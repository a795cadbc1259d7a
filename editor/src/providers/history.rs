use async_trait::async_trait;

use super::IdleSummaryGenerator;
use super::Prediction;
use super::Predictor;

/// Predicts the newest history entry extending the buffer.
#[derive(Debug, Clone, Default)]
pub struct HistoryPredictor {
    entries: Vec<String>,
}

impl HistoryPredictor {
    /// `entries` are oldest first.
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl Predictor for HistoryPredictor {
    async fn predict(&self, buffer: &str) -> anyhow::Result<Prediction> {
        let found = self
            .entries
            .iter()
            .enumerate()
            .rev()
            .find(|(_, entry)| {
                buffer.is_empty() || (entry.starts_with(buffer) && entry.len() > buffer.len())
            });
        Ok(match found {
            Some((idx, entry)) => Prediction {
                suggestion: entry.clone(),
                input_context: Some(idx.to_string()),
            },
            None => Prediction::default(),
        })
    }
}

const SUMMARY_ENTRIES: usize = 3;

/// Idle summary listing the most recent distinct commands.
#[derive(Debug, Clone, Default)]
pub struct RecentHistorySummary {
    entries: Vec<String>,
}

impl RecentHistorySummary {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }
}

#[async_trait]
impl IdleSummaryGenerator for RecentHistorySummary {
    async fn summarize(&self) -> anyhow::Result<String> {
        let mut recent: Vec<&str> = Vec::with_capacity(SUMMARY_ENTRIES);
        for entry in self.entries.iter().rev() {
            if recent.len() == SUMMARY_ENTRIES {
                break;
            }
            if !entry.trim().is_empty() && !recent.contains(&entry.as_str()) {
                recent.push(entry);
            }
        }
        if recent.is_empty() {
            return Ok(String::new());
        }
        let mut summary = String::from("Recently run:");
        for entry in recent {
            summary.push_str("\n  ");
            summary.push_str(entry);
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entries() -> Vec<String> {
        ["git status", "ls", "git log --oneline", "ls"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[tokio::test]
    async fn predicts_newest_extension() {
        let predictor = HistoryPredictor::new(entries());
        let prediction = predictor.predict("git").await.unwrap();
        assert_eq!(prediction.suggestion, "git log --oneline");
        assert_eq!(prediction.input_context.as_deref(), Some("2"));

        assert_eq!(predictor.predict("ls").await.unwrap(), Prediction::default());
        assert_eq!(predictor.predict("").await.unwrap().suggestion, "ls");
    }

    #[tokio::test]
    async fn summary_lists_distinct_recent_entries() {
        let summary = RecentHistorySummary::new(entries()).summarize().await.unwrap();
        assert_eq!(summary, "Recently run:\n  ls\n  git log --oneline\n  git status");
        assert_eq!(
            RecentHistorySummary::default().summarize().await.unwrap(),
            String::new()
        );
    }
}
