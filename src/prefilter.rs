//! Upstream command-name glob lists
//!
//! A coarse allow/deny layer keyed on globs over each simple command, such
//! as `git status*` or `mkfs*`. Deny globs block before the engine runs.
//! Allow globs are informational only: the engine still evaluates every
//! command and reaches its own verdict.

use glob::Pattern;

use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::input::Command;
use crate::parser::{shell, wrapper};

/// Result of running a command through the glob lists
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// A segment matched this deny glob
    Denied(String),
    /// Every segment matched an allow glob; this is the first one
    Allowed(String),
    /// Neither list decides
    Unlisted,
}

/// Compiled allow and deny globs
#[derive(Debug, Clone, Default)]
pub struct CommandFilter {
    allow: Vec<Pattern>,
    deny: Vec<Pattern>,
    wrappers: Vec<String>,
}

impl CommandFilter {
    /// Compile the `[prefilter]` section. An invalid glob is fatal.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            allow: compile(&config.prefilter.allow)?,
            deny: compile(&config.prefilter.deny)?,
            wrappers: config.shell.wrappers.clone(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.deny.is_empty()
    }

    pub fn check(&self, command: &Command) -> FilterOutcome {
        if command.is_empty() || self.is_empty() {
            return FilterOutcome::Unlisted;
        }

        let mut allowed_by: Option<&Pattern> = None;
        let mut all_allowed = true;

        for segment in shell::split_segments(command.as_str()) {
            let tokens = shell::tokenize(segment);
            let words = shell::command_words(&tokens);
            let unwrapped = wrapper::strip_wrappers(words, &self.wrappers);
            let candidates = [words.join(" "), unwrapped.join(" ")];

            let denied = self
                .deny
                .iter()
                .find(|glob| candidates.iter().any(|c| glob.matches(c)));
            if let Some(glob) = denied {
                return FilterOutcome::Denied(glob.as_str().to_string());
            }

            match self.allow.iter().find(|glob| glob.matches(&candidates[0])) {
                Some(glob) => {
                    allowed_by.get_or_insert(glob);
                }
                None => all_allowed = false,
            }
        }

        match allowed_by {
            Some(glob) if all_allowed => FilterOutcome::Allowed(glob.as_str().to_string()),
            _ => FilterOutcome::Unlisted,
        }
    }
}

fn compile(globs: &[String]) -> Result<Vec<Pattern>> {
    globs
        .iter()
        .map(|glob| {
            Pattern::new(glob).map_err(|source| ConfigError::InvalidGlob {
                glob: glob.clone(),
                source,
            })
        })
        .collect()
}
