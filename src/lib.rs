//! command-policy - A pre-execution policy check for agent shell commands
//!
//! This library classifies a proposed shell command as allowed or blocked
//! before an automated agent runs it. It never executes or expands the
//! command; all matching is lexical.
//!
//! # Features
//!
//! - **Pattern rules**: Regex rules for recursive deletion, disk formatting,
//!   fork bombs, `curl | sh` and similar, grouped by category
//! - **Critical paths**: Blocks `rm`, `mv`, `chmod` and friends on protected
//!   locations such as `/etc` or `~/.ssh`, matched by path component
//! - **Wrapper detection**: Sees the real command behind sudo, timeout, env, etc.
//! - **Safety levels**: Configurable strictness (critical, high, strict)
//! - **Declarative config**: Custom rules and protected paths in TOML
//! - **Audit logging**: JSONL log of all decisions
//!
//! # Example
//!
//! ```
//! use command_policy::{HookInput, PolicyEngine};
//!
//! let engine = PolicyEngine::builtin().unwrap();
//!
//! let input = r#"{"tool_name":"Bash","tool_input":{"command":"rm -rf /"}}"#;
//! let decision = engine.check(&HookInput::parse(input));
//! assert!(decision.is_block());
//!
//! assert!(engine.evaluate_str("git status").is_allow());
//! ```

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod output;
pub mod parser;
pub mod prefilter;
pub mod rules;

// Re-exports for convenience
pub use config::{Config, SafetyLevel};
pub use engine::PolicyEngine;
pub use error::ConfigError;
pub use input::{Command, HookInput};
pub use output::{Decision, ExitStatus, HookOutput, Verdict};
pub use rules::{Category, Rule, RuleSet};
