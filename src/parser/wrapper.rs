//! Wrapper command detection and unwrapping
//!
//! Handles commands like sudo, timeout, env, etc. that run another command,
//! so the path checks see `rm` in `sudo timeout 30 rm -rf /etc`.

/// Default wrapper commands to detect
pub const DEFAULT_WRAPPERS: &[&str] = &[
    "sudo",
    "doas", // BSD sudo alternative
    "timeout",
    "xargs",
    "env",
    "nice",
    "nohup",
    "ionice",
    "strace",
    "time",
    "unbuffer",
    "watch",
    "caffeinate", // macOS
    "command",
    "builtin",
    "exec",
    "stdbuf",
];

/// Strip wrapper commands from the front of a token list.
///
/// Returns the tokens of the wrapped command, or an empty slice when a
/// wrapper is not followed by a command.
///
/// Example: `sudo -u root timeout 30 rm -rf /` -> `rm -rf /`
pub fn strip_wrappers<'a>(tokens: &'a [String], wrappers: &[String]) -> &'a [String] {
    let mut rest = tokens;

    while let Some(first) = rest.first() {
        let name = first.rsplit('/').next().unwrap_or(first);
        if !wrappers.iter().any(|w| w == name) {
            break;
        }

        let skip = match name {
            "sudo" | "doas" => skip_sudo(rest),
            "timeout" => skip_timeout(rest),
            "env" => skip_env(rest),
            "xargs" => skip_options(
                rest,
                &["-n", "-L", "-I", "-E", "-s", "-P", "-d", "-a", "--max-args", "--max-procs"],
            ),
            "watch" => skip_options(rest, &["-n", "-d", "--interval", "--differences"]),
            _ => skip_options(
                rest,
                &["-n", "-c", "-p", "-o", "-e", "-t", "-w", "-a", "-s", "-f", "-i"],
            ),
        };

        rest = &rest[skip.min(rest.len())..];
    }

    rest
}

/// Skip option tokens; `with_value` options consume the next token too
fn skip_options(tokens: &[String], with_value: &[&str]) -> usize {
    let mut idx = 1;
    while idx < tokens.len() {
        let token = tokens[idx].as_str();
        if token == "--" {
            return idx + 1;
        }
        if !token.starts_with('-') || token == "-" {
            break;
        }
        idx += if with_value.contains(&token) { 2 } else { 1 };
    }
    idx
}

/// sudo [-u user] [-g group] [-E] [-H] ... command args...
fn skip_sudo(tokens: &[String]) -> usize {
    skip_options(
        tokens,
        &[
            "-u", "--user", "-g", "--group", "-C", "--close-from", "-h", "--host", "-p",
            "--prompt", "-r", "--role", "-t", "--type", "-D", "--chdir", "-U", "--other-user",
        ],
    )
}

/// timeout [options] duration command args...
fn skip_timeout(tokens: &[String]) -> usize {
    // The first non-option is the duration
    skip_options(tokens, &["-s", "--signal", "-k", "--kill-after"]) + 1
}

/// env [-i] [-u NAME] [VAR=val...] command args...
fn skip_env(tokens: &[String]) -> usize {
    let mut idx = skip_options(tokens, &["-u", "--unset", "-C", "--chdir"]);
    while idx < tokens.len() && tokens[idx].contains('=') && !tokens[idx].starts_with('=') {
        idx += 1;
    }
    idx
}
