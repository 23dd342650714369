//! Shell tokenization and analysis
//!
//! Lexical helpers only: commands are split and tokenized the way a shell
//! would, but nothing is expanded or executed.

use once_cell::sync::Lazy;
use regex::Regex;

/// Control operators and substitution boundaries, quoting ignored
static LEXICAL_SPLIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&&|\|\||;|\|&?|\n|\$\(|`|\(|\)|(?:^|\s)&(?:\s|$)").unwrap()
});

/// Redirection operators, optionally with a file descriptor and target
static REDIRECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d+|&)?(?:>>|>\||>&|<&|<<<|<<|<>|>|<)(.*)$").unwrap()
});

/// Reserved words that can precede a command in a segment
const KEYWORDS: &[&str] = &[
    "{", "}", "!", "if", "then", "else", "elif", "fi", "do", "done", "while", "until",
];

const SHELLS: &[&str] = &["sh", "bash", "zsh", "dash", "ksh", "ash", "fish"];

/// Split a command line into simple command segments.
///
/// Splits on `;`, `&&`, `||`, `|`, background `&`, newlines, `$(`,
/// backticks and parentheses outside quotes. A quoted `sh -c` script stays
/// whole inside its segment. Backslash escapes the next character outside
/// single quotes.
pub fn split_segments(command: &str) -> Vec<&str> {
    let bytes = command.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        match quote {
            Some(b'\'') => {
                if byte == b'\'' {
                    quote = None;
                }
                i += 1;
                continue;
            }
            Some(_) => {
                match byte {
                    b'\\' => i += 1,
                    b'"' => quote = None,
                    _ => {}
                }
                i += 1;
                continue;
            }
            None => {}
        }

        let prev = i.checked_sub(1).map(|p| bytes[p]);
        let next = bytes.get(i + 1).copied();
        let width = match byte {
            b'\\' => {
                i += 2;
                continue;
            }
            b'\'' | b'"' => {
                quote = Some(byte);
                i += 1;
                continue;
            }
            b'&' if next == Some(b'&') => 2,
            b'|' if next == Some(b'|') || next == Some(b'&') => 2,
            b'$' if next == Some(b'(') => 2,
            b';' | b'|' | b'\n' | b'`' | b'(' | b')' => 1,
            b'&' if is_blank(prev) && is_blank(next) => 1,
            _ => 0,
        };

        if width == 0 {
            i += 1;
            continue;
        }
        push_segment(&mut segments, &command[start..i]);
        i += width;
        start = i;
    }
    if start < command.len() {
        push_segment(&mut segments, &command[start..]);
    }
    segments
}

/// Split on every separator, including those inside quotes.
///
/// Reaches command substitutions inside double quotes (`"$(rm x)"`) that
/// [`split_segments`] keeps inside a word. Only ever adds segments to check.
pub fn split_lexical(command: &str) -> Vec<&str> {
    LEXICAL_SPLIT
        .split(command)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn is_blank(byte: Option<u8>) -> bool {
    byte.map_or(true, |b| b.is_ascii_whitespace())
}

fn push_segment<'a>(segments: &mut Vec<&'a str>, segment: &'a str) {
    let segment = segment.trim();
    if !segment.is_empty() {
        segments.push(segment);
    }
}

/// Tokenize a shell segment into words.
///
/// Uses shlex for proper quoting. Unbalanced quotes, as left by
/// [`split_lexical`] cutting through a quoted script, fall back to
/// whitespace splitting with stray quotes trimmed.
pub fn tokenize(segment: &str) -> Vec<String> {
    shlex::split(segment).unwrap_or_else(|| {
        segment
            .split_whitespace()
            .map(|word| word.trim_matches(|c| c == '\'' || c == '"'))
            .filter(|word| !word.is_empty())
            .map(String::from)
            .collect()
    })
}

/// Skip leading reserved words and `VAR=value` assignments
pub fn command_words(tokens: &[String]) -> &[String] {
    let skip = tokens
        .iter()
        .take_while(|t| KEYWORDS.contains(&t.as_str()) || is_assignment(t))
        .count();
    &tokens[skip..]
}

fn is_assignment(token: &str) -> bool {
    match token.split_once('=') {
        Some((name, _)) => {
            let mut chars = name.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

/// Classify a token as a redirection.
///
/// Returns `Some(true)` when the operator stands alone and the next token is
/// its target (`> out.txt`), `Some(false)` when the target is attached
/// (`2>/dev/null`, `2>&1`), and `None` for ordinary words.
pub fn redirection(token: &str) -> Option<bool> {
    REDIRECTION
        .captures(token)
        .map(|caps| caps.get(1).map_or(true, |target| target.as_str().is_empty()))
}

/// The inline script of `sh -c 'script'` style invocations
pub fn inline_script(words: &[String]) -> Option<&str> {
    let (first, args) = words.split_first()?;
    let name = first.rsplit('/').next().unwrap_or(first);
    if !SHELLS.contains(&name) {
        return None;
    }

    let mut saw_c = false;
    for arg in args {
        if arg == "--" {
            continue;
        }
        if arg.starts_with('-') && !arg.starts_with("--") && arg.len() > 1 {
            saw_c |= arg.contains('c');
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        return saw_c.then_some(arg.as_str());
    }
    None
}
