//! Command extraction from hook payloads
//!
//! Accepts a raw command string, a JSON string, or a JSON object that
//! carries the command directly or under a wrapper field such as
//! `tool_input`. Extraction never fails: anything unusable becomes the
//! empty command.

use serde_json::{Map, Value};
use std::fmt;

/// Wrapper fields searched, in order, before a top-level `command`
const WRAPPER_FIELDS: &[&str] = &["tool_input", "input", "params", "arguments"];

/// How deep wrapper fields are followed
const MAX_WRAPPER_DEPTH: usize = 4;

/// The canonical command string, as the caller intends to run it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command(String);

impl Command {
    pub fn new(command: impl Into<String>) -> Self {
        Command(command.into().trim().to_string())
    }

    pub fn empty() -> Self {
        Command(String::new())
    }

    /// Extract the command from a raw payload
    pub fn extract(raw: &str) -> Self {
        HookInput::parse(raw).command
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shortened form for messages and logs
    pub fn summary(&self, max_chars: usize) -> String {
        if self.0.chars().count() > max_chars {
            let head: String = self.0.chars().take(max_chars).collect();
            format!("{}...", head)
        } else {
            self.0.clone()
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Command {
    fn from(command: &str) -> Self {
        Command::new(command)
    }
}

/// A parsed hook invocation
#[derive(Debug, Clone, Default)]
pub struct HookInput {
    /// The extracted command (empty when none could be resolved)
    pub command: Command,

    /// Name of the tool being invoked (e.g., "Bash")
    pub tool_name: Option<String>,

    /// Optional session identifier
    pub session_id: Option<String>,

    /// Hook event name (e.g., "PreToolUse")
    pub hook_event_name: Option<String>,
}

impl HookInput {
    /// Parse any payload. Total: malformed input yields an empty command.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::default();
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(obj)) => Self::from_object(&obj),
            Ok(Value::String(command)) => Self::raw(&command),
            Ok(_) => Self::default(),
            // A JSON document cut short is a malformed payload. Any other
            // syntax error means the text is shell, e.g. `[[ -d x ]] && rm x`.
            Err(err) if err.is_eof() => Self::default(),
            Err(_) => Self::raw(trimmed),
        }
    }

    /// Wrap a bare command string
    pub fn raw(command: &str) -> Self {
        Self {
            command: Command::new(command),
            ..Self::default()
        }
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        let text = |key: &str| obj.get(key).and_then(Value::as_str).map(String::from);

        Self {
            command: command_from_object(obj, 0).map(Command::new).unwrap_or_default(),
            tool_name: text("tool_name"),
            session_id: text("session_id"),
            hook_event_name: text("hook_event_name"),
        }
    }

    /// Get a summary of the input for logging
    pub fn summary(&self) -> String {
        match &self.tool_name {
            Some(tool) => format!("{}: {}", tool, self.command.summary(100)),
            None => self.command.summary(100),
        }
    }
}

/// Nested wrapper object first, then a top-level `command` field
fn command_from_object(obj: &Map<String, Value>, depth: usize) -> Option<String> {
    if depth < MAX_WRAPPER_DEPTH {
        for field in WRAPPER_FIELDS {
            let found = match obj.get(*field) {
                Some(Value::Object(inner)) => command_from_object(inner, depth + 1),
                _ => None,
            };
            if let Some(command) = found.filter(|c| !c.trim().is_empty()) {
                return Some(command);
            }
        }
    }

    match obj.get("command")? {
        Value::String(command) => Some(command.clone()),
        Value::Array(argv) => join_argv(argv),
        _ => None,
    }
}

/// Exec-form command (`["rm", "-rf", "x"]`) as a shell-quoted line
fn join_argv(argv: &[Value]) -> Option<String> {
    let words: Option<Vec<&str>> = argv.iter().map(Value::as_str).collect();
    let words = words?;
    shlex::try_join(words.iter().copied()).ok()
}
