//! Path safety evaluation
//!
//! A second pass for path-mutating commands. Each simple command of the
//! input is tokenized, wrappers are stripped, and the operands of `rm`,
//! `mv`, `chmod` and friends are compared with the critical path list.

use crate::input::Command;
use crate::parser::{shell, wrapper};
use crate::rules::paths::{normalize_path, MoveCheck, Verb};
use crate::rules::RuleSet;

/// How many `sh -c` levels are followed
const MAX_SCRIPT_DEPTH: usize = 3;

/// A path operand that hit a critical path entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathHit {
    /// The mutating verb of the offending command
    pub verb: Verb,

    /// The operand after normalization
    pub operand: String,

    /// The critical path entry it matched
    pub protected: String,
}

/// Find the first operand of a mutating command that touches a critical path
pub fn find_protected_path(rules: &RuleSet, command: &Command) -> Option<PathHit> {
    if command.is_empty() {
        return None;
    }
    scan(rules, command.as_str(), 0)
}

fn scan(rules: &RuleSet, text: &str, depth: usize) -> Option<PathHit> {
    let mut segments = shell::split_segments(text);
    for segment in shell::split_lexical(text) {
        if !segments.contains(&segment) {
            segments.push(segment);
        }
    }

    for segment in segments {
        let tokens = shell::tokenize(segment);
        let words = shell::command_words(&tokens);
        let words = shell::command_words(wrapper::strip_wrappers(words, rules.wrappers()));

        if let Some(script) = shell::inline_script(words) {
            if depth < MAX_SCRIPT_DEPTH {
                if let Some(hit) = scan(rules, script, depth + 1) {
                    return Some(hit);
                }
            }
            continue;
        }

        let Some((first, args)) = words.split_first() else {
            continue;
        };
        let Some(verb) = Verb::from_command(first) else {
            continue;
        };

        for operand in operands(verb, args, rules.move_check()) {
            let Some(target) = normalize_path(operand, rules.home_dir()) else {
                continue;
            };
            if let Some(entry) = rules
                .paths()
                .iter()
                .find(|entry| entry.applies_to(verb) && entry.matches(&target))
            {
                return Some(PathHit {
                    verb,
                    operand: target,
                    protected: entry.path.clone(),
                });
            }
        }
    }
    None
}

/// Options that consume the following token as their value
fn value_options(verb: Verb) -> &'static [&'static str] {
    match verb {
        Verb::Mv => &["-S", "--suffix"],
        Verb::Shred => &["-n", "-s", "--iterations", "--size", "--random-source"],
        Verb::Chown | Verb::Chgrp => &["--from"],
        _ => &[],
    }
}

/// `chmod -w file` removes write permission; only these letters are flags
fn is_chmod_flag(arg: &str) -> bool {
    arg.len() > 1 && arg[1..].chars().all(|c| matches!(c, 'R' | 'f' | 'v' | 'c'))
}

/// Path operands of a mutating command, after its flags and option values
fn operands<'a>(verb: Verb, args: &'a [String], move_check: MoveCheck) -> Vec<&'a str> {
    let mut positional: Vec<&str> = Vec::new();
    let mut target_dir: Option<&str> = None;
    let mut has_reference = false;
    let mut flags_done = false;

    let mut iter = args.iter().map(String::as_str);
    while let Some(arg) = iter.next() {
        if let Some(detached) = shell::redirection(arg) {
            if detached {
                iter.next();
            }
            continue;
        }

        if flags_done || !arg.starts_with('-') || arg == "-" {
            positional.push(arg);
            continue;
        }
        if arg == "--" {
            flags_done = true;
            continue;
        }

        if let Some(long) = arg.strip_prefix("--") {
            let (name, value) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (long, None),
            };
            let name = format!("--{}", name);
            match name.as_str() {
                "--target-directory" if verb == Verb::Mv => {
                    target_dir = value.or_else(|| iter.next());
                }
                "--reference" if matches!(verb, Verb::Chmod | Verb::Chown | Verb::Chgrp) => {
                    has_reference = true;
                    if value.is_none() {
                        iter.next();
                    }
                }
                other if value.is_none() && value_options(verb).contains(&other) => {
                    iter.next();
                }
                _ => {}
            }
            continue;
        }

        if verb == Verb::Chmod && !is_chmod_flag(arg) {
            // A symbolic mode such as `-w` or `-x`
            positional.push(arg);
            continue;
        }

        if verb == Verb::Mv {
            if arg == "-t" {
                target_dir = iter.next();
                continue;
            }
            if let Some(dir) = arg.strip_prefix("-t") {
                target_dir = Some(dir);
                continue;
            }
        }

        if value_options(verb).contains(&arg) {
            iter.next();
        }
    }

    match verb {
        Verb::Chmod | Verb::Chown | Verb::Chgrp if !has_reference => {
            // The mode or owner comes first
            positional.into_iter().skip(1).collect()
        }
        Verb::Mv => split_move(positional, target_dir, move_check),
        _ => positional,
    }
}

fn split_move<'a>(
    mut positional: Vec<&'a str>,
    target_dir: Option<&'a str>,
    move_check: MoveCheck,
) -> Vec<&'a str> {
    let destination = match target_dir {
        Some(dir) => Some(dir),
        None if positional.len() >= 2 => positional.pop(),
        None => None,
    };

    let mut checked = Vec::new();
    if move_check != MoveCheck::Destination {
        checked.extend(positional);
    }
    if move_check != MoveCheck::Source {
        checked.extend(destination);
    }
    checked
}
