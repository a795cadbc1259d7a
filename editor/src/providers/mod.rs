//! Collaborators the editor calls out to, plus built-in implementations that
//! need nothing beyond the local machine.

use std::sync::Arc;

use async_trait::async_trait;

mod git;
mod history;
mod path_completion;
mod prompt;
mod system;
mod whatis;

pub use git::GitStatus;
pub use git::GitStatusProbe;
pub use history::HistoryPredictor;
pub use history::RecentHistorySummary;
pub use path_completion::PathCompletionProvider;
pub use prompt::CwdPrompt;
pub use prompt::StaticPrompt;
pub use system::SystemProbe;
pub use system::abbreviate_home;
pub use system::user_at_host;
pub use whatis::WhatisExplainer;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prediction {
    /// Full predicted command line; the part past the buffer is ghost text.
    pub suggestion: String,
    /// Opaque provider context kept alongside the suggestion.
    pub input_context: Option<String>,
}

impl Prediction {
    pub fn new(suggestion: impl Into<String>) -> Self {
        Self {
            suggestion: suggestion.into(),
            input_context: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub value: String,
    pub description: Option<String>,
}

impl Candidate {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Chrome data shown in the assistant box borders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextSnapshot {
    pub cwd: Option<String>,
    pub git: Option<GitStatus>,
    pub load_average: Option<f64>,
    pub user_host: Option<String>,
}

#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, buffer: &str) -> anyhow::Result<Prediction>;
}

#[async_trait]
pub trait Explainer: Send + Sync {
    async fn explain(&self, text: &str) -> anyhow::Result<String>;
}

#[async_trait]
pub trait IdleSummaryGenerator: Send + Sync {
    async fn summarize(&self) -> anyhow::Result<String>;
}

/// Best-effort prompt text. An empty result keeps the cached prompt.
#[async_trait]
pub trait PromptGenerator: Send + Sync {
    async fn prompt(&self) -> anyhow::Result<String>;
}

pub trait CompletionProvider: Send + Sync {
    fn completions(&self, word: &str, preceding_args: &[String]) -> Vec<Candidate>;
}

#[async_trait]
pub trait ContextProbe: Send + Sync {
    async fn probe(&self) -> anyhow::Result<ContextSnapshot>;
}

/// Everything one editing turn may call out to.
#[derive(Clone)]
pub struct Providers {
    pub predictor: Arc<dyn Predictor>,
    pub explainer: Arc<dyn Explainer>,
    pub idle_summary: Option<Arc<dyn IdleSummaryGenerator>>,
    pub prompt: Option<Arc<dyn PromptGenerator>>,
    pub completion: Option<Arc<dyn CompletionProvider>>,
    pub context: Option<Arc<dyn ContextProbe>>,
}

impl Providers {
    pub fn new(predictor: Arc<dyn Predictor>, explainer: Arc<dyn Explainer>) -> Self {
        Self {
            predictor,
            explainer,
            idle_summary: None,
            prompt: None,
            completion: None,
            context: None,
        }
    }

    pub fn with_idle_summary(mut self, generator: Arc<dyn IdleSummaryGenerator>) -> Self {
        self.idle_summary = Some(generator);
        self
    }

    pub fn with_prompt(mut self, generator: Arc<dyn PromptGenerator>) -> Self {
        self.prompt = Some(generator);
        self
    }

    pub fn with_completion(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.completion = Some(provider);
        self
    }

    pub fn with_context(mut self, probe: Arc<dyn ContextProbe>) -> Self {
        self.context = Some(probe);
        self
    }
}
