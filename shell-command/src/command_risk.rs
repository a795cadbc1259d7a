/// Coarse risk level of a command line, shown as a badge glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum CommandRisk {
    #[default]
    Safe,
    Caution,
    Danger,
}

impl CommandRisk {
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Safe => "●",
            Self::Caution => "▲",
            Self::Danger => "✖",
        }
    }
}

/// Classify a whole script line by its riskiest plain command.
pub fn classify(script: &str) -> CommandRisk {
    if script.trim().is_empty() {
        return CommandRisk::Safe;
    }
    let Some(commands) = split_plain_commands(script) else {
        return CommandRisk::Caution;
    };
    commands
        .iter()
        .map(|command| classify_command(command))
        .max()
        .unwrap_or_default()
}

fn split_plain_commands(script: &str) -> Option<Vec<Vec<String>>> {
    let tokens = shlex::split(script)?;
    let mut all_commands: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for token in tokens {
        if matches!(token.as_str(), "|" | "||" | "&&" | ";") {
            if !current.is_empty() {
                all_commands.push(std::mem::take(&mut current));
            }
        } else if let Some(stripped) = token.strip_suffix(';') {
            if !stripped.is_empty() {
                current.push(stripped.to_string());
            }
            if !current.is_empty() {
                all_commands.push(std::mem::take(&mut current));
            }
        } else {
            current.push(token);
        }
    }
    if !current.is_empty() {
        all_commands.push(current);
    }
    Some(all_commands)
}

fn classify_command(command: &[String]) -> CommandRisk {
    if is_dangerous(command) {
        return CommandRisk::Danger;
    }
    if needs_caution(command) {
        return CommandRisk::Caution;
    }
    CommandRisk::Safe
}

fn is_dangerous(command: &[String]) -> bool {
    let Some(cmd0) = command.first().map(String::as_str) else {
        return false;
    };

    match cmd0 {
        cmd if cmd.ends_with("git") => {
            let Some((subcommand_idx, subcommand)) =
                find_git_subcommand(command, &["reset", "rm", "branch", "push", "clean"])
            else {
                return false;
            };
            let rest = &command[subcommand_idx + 1..];
            match subcommand {
                "reset" | "rm" => true,
                "branch" => git_branch_is_delete(rest),
                "push" => git_push_is_dangerous(rest),
                "clean" => git_clean_is_force(rest),
                _ => false,
            }
        }
        "rm" => command[1..]
            .iter()
            .any(|arg| short_flag_group_contains(arg, 'f') || arg == "--force"),
        "dd" => command[1..].iter().any(|arg| arg.starts_with("of=")),
        cmd if cmd.starts_with("mkfs") => true,
        "sudo" => is_dangerous(&command[1..]),
        _ => false,
    }
}

fn needs_caution(command: &[String]) -> bool {
    let Some(cmd0) = command.first().map(String::as_str) else {
        return false;
    };
    if command.iter().any(|arg| arg == ">") {
        return true;
    }
    match cmd0 {
        "sudo" => true,
        "chmod" | "chown" => command[1..].iter().any(|arg| arg == "-R" || arg == "--recursive"),
        "kill" | "pkill" => command[1..].iter().any(|arg| arg == "-9" || arg == "-KILL"),
        _ => false,
    }
}

fn is_git_global_option_with_value(arg: &str) -> bool {
    matches!(
        arg,
        "-C" | "-c" | "--config-env" | "--exec-path" | "--git-dir" | "--namespace" | "--work-tree"
    )
}

/// Find the git subcommand, skipping global options such as `-C <dir>`.
fn find_git_subcommand<'a>(command: &'a [String], subcommands: &[&str]) -> Option<(usize, &'a str)> {
    let mut skip_next = false;
    for (idx, arg) in command.iter().enumerate().skip(1) {
        if skip_next {
            skip_next = false;
            continue;
        }
        let arg = arg.as_str();
        if is_git_global_option_with_value(arg) {
            skip_next = true;
            continue;
        }
        if arg == "--" || arg.starts_with('-') {
            continue;
        }
        if subcommands.contains(&arg) {
            return Some((idx, arg));
        }
        // The first non-option token is the subcommand.
        return None;
    }
    None
}

fn git_branch_is_delete(branch_args: &[String]) -> bool {
    branch_args.iter().map(String::as_str).any(|arg| {
        matches!(arg, "-d" | "-D" | "--delete")
            || short_flag_group_contains(arg, 'd')
            || short_flag_group_contains(arg, 'D')
    })
}

fn short_flag_group_contains(arg: &str, target: char) -> bool {
    arg.starts_with('-') && !arg.starts_with("--") && arg.chars().skip(1).any(|c| c == target)
}

fn git_push_is_dangerous(push_args: &[String]) -> bool {
    push_args.iter().map(String::as_str).any(|arg| {
        matches!(arg, "--force" | "--force-with-lease" | "--delete")
            || arg.starts_with("--force-with-lease=")
            || short_flag_group_contains(arg, 'f')
            || short_flag_group_contains(arg, 'd')
            // `+<refspec>` forces updates and `:<dst>` deletes remote refs.
            || ((arg.starts_with('+') || arg.starts_with(':')) && arg.len() > 1)
    })
}

fn git_clean_is_force(clean_args: &[String]) -> bool {
    clean_args
        .iter()
        .map(String::as_str)
        .any(|arg| arg == "--force" || short_flag_group_contains(arg, 'f'))
}
