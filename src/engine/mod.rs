//! Policy engine for command-policy
//!
//! Runs the pattern and path evaluators over one command and reduces their
//! findings into a [`Decision`]. The engine owns its [`RuleSet`] and never
//! mutates it, so one engine can serve any number of threads.

pub mod paths;
pub mod pattern;

use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::input::{Command, HookInput};
use crate::output::Decision;
use crate::rules::RuleSet;

/// The command policy engine
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    rules: RuleSet,
}

impl PolicyEngine {
    /// Create an engine around an already validated rule set
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Build the rule set described by a configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(RuleSet::from_config(config)?))
    }

    /// Engine with the built-in rules at the default safety level
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(RuleSet::builtin()?))
    }

    /// Evaluate a command. The empty command is always allowed.
    pub fn evaluate(&self, command: &Command) -> Decision {
        if command.is_empty() {
            return Decision::allow();
        }

        let rule = pattern::find_match(&self.rules, command);
        let path = paths::find_protected_path(&self.rules, command);

        let decision = Decision::from_findings(command, rule, path.as_ref());
        if decision.is_block() {
            debug!(
                rule = decision.rule_id(),
                path = decision.matched_path(),
                "command blocked"
            );
        }
        decision
    }

    /// Evaluate a bare command string
    pub fn evaluate_str(&self, command: &str) -> Decision {
        self.evaluate(&Command::new(command))
    }

    /// Evaluate a parsed hook payload
    pub fn check(&self, input: &HookInput) -> Decision {
        self.evaluate(&input.command)
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}
