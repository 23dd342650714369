//! JSONL audit logging for command-policy
//!
//! Records every decision to a JSONL file for later analysis. Secrets that
//! appear in a command line are redacted before they reach the log.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::input::HookInput;
use crate::output::Decision;
use crate::rules::Category;

/// Longest command excerpt written to the log
const LOGGED_COMMAND_CHARS: usize = 500;

/// Credentials commonly passed on a command line
static SECRET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // API keys and tokens (flexible matching for various formats)
        Regex::new(r"(?i)api[_-]?key\s*[=:]\s*['\x22]?[a-zA-Z0-9_]{16,}").unwrap(),
        Regex::new(r"(?i)secret[_-]?key\s*[=:]\s*['\x22]?[a-zA-Z0-9_]{16,}").unwrap(),
        Regex::new(r"(?i)access[_-]?token\s*[=:]\s*['\x22]?[a-zA-Z0-9_]{16,}").unwrap(),
        Regex::new(r"(?i)authorization:\s*(?:bearer|basic)\s+[a-zA-Z0-9._~+/=-]{8,}").unwrap(),
        // AWS
        Regex::new(r"AKIA[0-9A-Z]{16}").unwrap(),
        Regex::new(r"(?i)aws[_-]?secret[_-]?access[_-]?key\s*[=:]\s*['\x22]?[0-9a-zA-Z/+]{20,}").unwrap(),
        // GitHub
        Regex::new(r"gh[pousr]_[A-Za-z0-9_]{36,}").unwrap(),
        Regex::new(r"github_pat_[A-Za-z0-9_]{22,}").unwrap(),
        // Passwords in commands and URLs
        Regex::new(r"(?i)(password|passwd|pwd)\s*[=:]\s*['\x22][^'\x22]+['\x22]").unwrap(),
        Regex::new(r"://[^/\s:@]+:[^/\s@]+@").unwrap(),
    ]
});

/// Redact secrets in text for logging
pub fn redact_secrets(text: &str) -> String {
    let mut redacted = text.to_string();

    for pattern in SECRET_PATTERNS.iter() {
        redacted = pattern.replace_all(&redacted, "[REDACTED]").to_string();
    }

    redacted
}

/// Log level for audit entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Allowed,
    Blocked,
    /// Would have been blocked, but dry-run let it through
    DryRun,
    /// Evaluation failed and the command was denied
    Fault,
}

/// An audit log entry
#[derive(Debug, Serialize)]
pub struct AuditEntry {
    /// Timestamp of the decision
    pub timestamp: DateTime<Utc>,

    pub level: LogLevel,

    /// Tool that was invoked, when the payload named one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,

    /// Rule ID that matched (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,

    /// Critical path that matched (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,

    /// The command, truncated and with secrets redacted
    pub command: String,

    /// Session ID (if provided)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl AuditEntry {
    /// Create a new audit entry from input and decision
    pub fn new(input: &HookInput, decision: &Decision, dry_run: bool) -> Self {
        let level = match (decision.is_block(), dry_run) {
            (false, _) => LogLevel::Allowed,
            (true, true) => LogLevel::DryRun,
            (true, false) => LogLevel::Blocked,
        };
        Self::with_level(input, decision, level)
    }

    /// Entry for a command denied because evaluation failed
    pub fn fault(input: &HookInput, decision: &Decision) -> Self {
        Self::with_level(input, decision, LogLevel::Fault)
    }

    fn with_level(input: &HookInput, decision: &Decision, level: LogLevel) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            tool: input.tool_name.clone(),
            rule_id: decision.matched_rule_id.clone(),
            matched_path: decision.matched_path.clone(),
            category: decision.category,
            command: redact_secrets(&input.command.summary(LOGGED_COMMAND_CHARS)),
            session_id: input.session_id.clone(),
        }
    }
}

/// Audit logger
#[derive(Default)]
pub struct AuditLogger {
    writer: Option<BufWriter<File>>,
}

impl AuditLogger {
    /// Create a new audit logger. An unopenable file disables logging.
    pub fn new(path: Option<&Path>) -> Self {
        let writer = path.and_then(|p| {
            // Ensure parent directory exists
            if let Some(parent) = p.parent() {
                let _ = std::fs::create_dir_all(parent);
            }

            match OpenOptions::new().create(true).append(true).open(p) {
                Ok(file) => Some(BufWriter::new(file)),
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "audit log disabled");
                    None
                }
            }
        });

        Self { writer }
    }

    /// Log an audit entry
    pub fn log(&mut self, entry: &AuditEntry) -> Result<(), std::io::Error> {
        if let Some(ref mut writer) = self.writer {
            let json = serde_json::to_string(entry)?;
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }
        Ok(())
    }

    /// Log a decision
    pub fn log_decision(
        &mut self,
        input: &HookInput,
        decision: &Decision,
        dry_run: bool,
    ) -> Result<(), std::io::Error> {
        let entry = AuditEntry::new(input, decision, dry_run);
        self.log(&entry)
    }

    /// Check if logging is enabled
    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }
}
