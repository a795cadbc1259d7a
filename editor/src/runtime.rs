//! Executes controller commands as tokio tasks and reports back over a channel.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;

use crate::config::EditorConfig;
use crate::error::ProviderFailure;
use crate::error::ProviderResult;
use crate::event::Command;
use crate::event::Completion;
use crate::event::EditorEvent;
use crate::providers::Providers;

#[derive(Clone, Debug)]
pub(crate) struct EventSender {
    tx: UnboundedSender<EditorEvent>,
}

impl EventSender {
    pub(crate) fn new(tx: UnboundedSender<EditorEvent>) -> Self {
        Self { tx }
    }

    pub(crate) fn send(&self, event: EditorEvent) {
        // The receiver is gone once the turn has ended.
        if let Err(err) = self.tx.send(event) {
            tracing::debug!("dropping event after turn ended: {:?}", err.0);
        }
    }
}

/// Per-call limits, taken from [`EditorConfig`].
#[derive(Debug, Clone, Copy)]
struct Deadlines {
    predict: Duration,
    explain: Duration,
    idle_summary: Duration,
    prompt: Duration,
    context: Duration,
}

/// Runs commands for one editing turn. Dropping it aborts whatever is still
/// in flight.
pub(crate) struct CommandRunner {
    providers: Providers,
    deadlines: Deadlines,
    tx: EventSender,
    tasks: JoinSet<()>,
}

impl CommandRunner {
    pub(crate) fn new(providers: &Providers, config: &EditorConfig, tx: EventSender) -> Self {
        Self {
            providers: providers.clone(),
            deadlines: Deadlines {
                predict: config.predict_timeout,
                explain: config.explain_timeout,
                idle_summary: config.idle_summary_timeout,
                prompt: config.prompt_refresh_timeout,
                // A probe must not outlive the poll that will replace it.
                context: config.poll_interval,
            },
            tx,
            tasks: JoinSet::new(),
        }
    }

    pub(crate) fn run_all(&mut self, commands: Vec<Command>) {
        while self.tasks.try_join_next().is_some() {}
        for command in commands {
            self.run(command);
        }
    }

    fn run(&mut self, command: Command) {
        tracing::trace!("running {command:?}");
        match command {
            Command::StartTimer { token, after } => {
                self.spawn(async move {
                    tokio::time::sleep(after).await;
                    Some(EditorEvent::TimerFired(token))
                });
            }
            Command::Predict { generation, buffer } => {
                let predictor = Arc::clone(&self.providers.predictor);
                let limit = self.deadlines.predict;
                self.spawn(async move {
                    let result = with_deadline(limit, predictor.predict(&buffer)).await;
                    Some(EditorEvent::Completed(Completion::Prediction { generation, result }))
                });
            }
            Command::Explain { generation, text } => {
                let explainer = Arc::clone(&self.providers.explainer);
                let limit = self.deadlines.explain;
                self.spawn(async move {
                    let result = with_deadline(limit, explainer.explain(&text)).await;
                    Some(EditorEvent::Completed(Completion::Explanation { generation, result }))
                });
            }
            Command::IdleSummary { generation } => {
                let Some(generator) = self.providers.idle_summary.clone() else {
                    return;
                };
                let limit = self.deadlines.idle_summary;
                self.spawn(async move {
                    let result = with_deadline(limit, generator.summarize()).await;
                    Some(EditorEvent::Completed(Completion::IdleSummary { generation, result }))
                });
            }
            Command::RefreshPrompt { generation } => {
                let Some(generator) = self.providers.prompt.clone() else {
                    return;
                };
                let limit = self.deadlines.prompt;
                self.spawn(async move {
                    let result = with_deadline(limit, generator.prompt()).await;
                    Some(EditorEvent::Completed(Completion::Prompt { generation, result }))
                });
            }
            Command::ProbeContext => {
                let Some(probe) = self.providers.context.clone() else {
                    return;
                };
                let limit = self.deadlines.context;
                self.spawn(async move {
                    let result = with_deadline(limit, probe.probe()).await;
                    Some(EditorEvent::Completed(Completion::Context(result)))
                });
            }
        }
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Option<EditorEvent>> + Send + 'static,
    {
        let tx = self.tx.clone();
        self.tasks.spawn(async move {
            if let Some(event) = task.await {
                tx.send(event);
            }
        });
    }
}

async fn with_deadline<T>(
    limit: Duration,
    call: impl Future<Output = anyhow::Result<T>>,
) -> ProviderResult<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(ProviderFailure::from),
        Err(_) => Err(ProviderFailure::timed_out(limit)),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    use super::*;
    use crate::event::TimerKind;
    use crate::event::TimerToken;
    use crate::generation::GenerationTracker;
    use crate::providers::Explainer;
    use crate::providers::Prediction;
    use crate::providers::Predictor;

    struct SlowPredictor(Duration);

    #[async_trait]
    impl Predictor for SlowPredictor {
        async fn predict(&self, buffer: &str) -> anyhow::Result<Prediction> {
            tokio::time::sleep(self.0).await;
            Ok(Prediction::new(format!("{buffer} --help")))
        }
    }

    struct FailingExplainer;

    #[async_trait]
    impl Explainer for FailingExplainer {
        async fn explain(&self, _text: &str) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("backend unavailable"))
        }
    }

    fn runner(predict_delay: Duration) -> (CommandRunner, mpsc::UnboundedReceiver<EditorEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let providers = Providers::new(Arc::new(SlowPredictor(predict_delay)), Arc::new(FailingExplainer));
        (
            CommandRunner::new(&providers, &EditorConfig::default(), EventSender::new(tx)),
            rx,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn timers_fire_after_their_delay() {
        let (mut runner, mut rx) = runner(Duration::ZERO);
        let token = TimerToken {
            kind: TimerKind::Debounce,
            generation: GenerationTracker::new().advance(),
        };
        let start = tokio::time::Instant::now();
        runner.run_all(vec![Command::StartTimer {
            token,
            after: Duration::from_millis(200),
        }]);
        let event = rx.recv().await;
        assert_matches!(event, Some(EditorEvent::TimerFired(fired)) if fired == token);
        assert_eq!(start.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_predictions_time_out() {
        let (mut runner, mut rx) = runner(Duration::from_secs(60));
        let generation = GenerationTracker::new().advance();
        runner.run_all(vec![Command::Predict {
            generation,
            buffer: "ls".to_string(),
        }]);
        let event = rx.recv().await;
        assert_matches!(
            event,
            Some(EditorEvent::Completed(Completion::Prediction { result: Err(failure), .. }))
                if failure.message() == "timed out after 10000ms"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn provider_errors_keep_their_generation() {
        let (mut runner, mut rx) = runner(Duration::ZERO);
        let generation = GenerationTracker::new().advance();
        runner.run_all(vec![
            Command::Explain {
                generation,
                text: "ls".to_string(),
            },
            // No idle summary generator configured.
            Command::IdleSummary { generation },
        ]);
        let event = rx.recv().await;
        assert_matches!(
            event,
            Some(EditorEvent::Completed(Completion::Explanation { generation: got, result: Err(failure) }))
                if got == generation && failure.message() == "backend unavailable"
        );
        drop(runner);
        assert_matches!(rx.recv().await, None);
    }
}
