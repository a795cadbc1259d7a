use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::Arc;

use anyhow::Context;
use lookahead_editor::EditRequest;
use lookahead_editor::EditorConfig;
use lookahead_editor::Providers;
use lookahead_editor::Submission;
use lookahead_editor::TerminalHost;
use lookahead_editor::edit_line;
use lookahead_editor::providers::CwdPrompt;
use lookahead_editor::providers::GitStatusProbe;
use lookahead_editor::providers::HistoryPredictor;
use lookahead_editor::providers::PathCompletionProvider;
use lookahead_editor::providers::RecentHistorySummary;
use lookahead_editor::providers::SystemProbe;
use lookahead_editor::providers::WhatisExplainer;
use tokio::process::Command;

const INITIAL_PROMPT: &str = "$ ";

/// Commands that must run in this process to have any effect.
#[derive(Debug, PartialEq, Eq)]
enum Builtin {
    /// `cd` with no argument goes home.
    Cd(Option<PathBuf>),
    Exit,
}

fn parse_builtin(command: &str) -> Option<Builtin> {
    let words = shlex::split(command)?;
    match words.as_slice() {
        [cd] if cd == "cd" => Some(Builtin::Cd(None)),
        [cd, dir] if cd == "cd" => Some(Builtin::Cd(Some(expand_tilde(dir)))),
        [exit] if exit == "exit" => Some(Builtin::Exit),
        _ => None,
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    let home = dirs::home_dir();
    match (path.strip_prefix('~'), home) {
        (Some(""), Some(home)) => home,
        (Some(rest), Some(home)) if rest.starts_with('/') => home.join(rest.trim_start_matches('/')),
        _ => PathBuf::from(path),
    }
}

fn providers(history: &[String], git: &GitStatusProbe) -> Providers {
    Providers::new(
        Arc::new(HistoryPredictor::new(history.to_vec())),
        Arc::new(WhatisExplainer::default()),
    )
    .with_idle_summary(Arc::new(RecentHistorySummary::new(history.to_vec())))
    .with_prompt(Arc::new(CwdPrompt::new(git.clone())))
    .with_completion(Arc::new(PathCompletionProvider::new(history.to_vec())))
    .with_context(Arc::new(SystemProbe::new(git.clone())))
}

/// Edit, run, repeat until end of input.
pub(crate) async fn run(shell: &str, config: &EditorConfig) -> anyhow::Result<()> {
    let git = GitStatusProbe::new(config.git_probe_timeout);
    let mut history: Vec<String> = Vec::new();
    let mut prompt = INITIAL_PROMPT.to_string();

    loop {
        let outcome = {
            let mut host = TerminalHost::new().context("lookahead needs an interactive terminal")?;
            let request = EditRequest::new(prompt.clone()).with_history(history.clone());
            edit_line(&mut host, request, &providers(&history, &git), config).await?
        };
        prompt = outcome.prompt;

        let command = match outcome.submission {
            Submission::EndOfInput => break,
            Submission::Interrupted => continue,
            Submission::Command(command) if command.trim().is_empty() => continue,
            Submission::Command(command) => command,
        };
        if history.last() != Some(&command) {
            history.push(command.clone());
        }

        match parse_builtin(&command) {
            Some(Builtin::Exit) => break,
            Some(Builtin::Cd(dir)) => {
                let Some(dir) = dir.or_else(dirs::home_dir) else {
                    eprintln!("cd: HOME not set");
                    continue;
                };
                if let Err(err) = std::env::set_current_dir(&dir) {
                    eprintln!("cd: {}: {err}", dir.display());
                }
            }
            None => match run_command(shell, &command).await {
                Ok(status) => tracing::info!("command finished: {status}"),
                Err(err) => eprintln!("lookahead: {err:#}"),
            },
        }
    }
    Ok(())
}

/// Run `command` through `shell -c`. Ctrl+C reaches the child through the
/// foreground process group and is ignored here.
async fn run_command(shell: &str, command: &str) -> anyhow::Result<ExitStatus> {
    let mut child = Command::new(shell)
        .arg("-c")
        .arg(command)
        .spawn()
        .with_context(|| format!("failed to start {shell}"))?;
    loop {
        tokio::select! {
            status = child.wait() => return Ok(status?),
            _ = tokio::signal::ctrl_c() => tracing::debug!("interrupt forwarded to child"),
        }
    }
}
