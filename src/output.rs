//! Decisions and hook responses
//!
//! Combines the evaluator findings into one [`Decision`] and renders it for
//! the caller: an exit status plus the JSON a pre-execution hook expects.

use serde::Serialize;

use crate::engine::paths::PathHit;
use crate::input::Command;
use crate::rules::{Category, Rule};

/// Longest command excerpt quoted in a block message
const MESSAGE_COMMAND_CHARS: usize = 120;

/// Process exit statuses of the hook binary
pub struct ExitStatus;

impl ExitStatus {
    /// The command may run
    pub const PERMIT: u8 = 0;
    /// The command was blocked by policy
    pub const DENY: u8 = 2;
    /// The policy could not be evaluated; treated as a block by callers
    pub const FAULT: u8 = 3;
}

/// Binary outcome of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Allow,
    Block,
}

/// The result of evaluating one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub verdict: Verdict,

    /// Id of the pattern rule that matched, if any
    pub matched_rule_id: Option<String>,

    /// Critical path entry that matched, if any
    pub matched_path: Option<String>,

    /// Category of the matched rule
    pub category: Option<Category>,

    /// User-facing explanation; empty on allow
    pub message: String,
}

impl Decision {
    /// Create an allow decision
    pub fn allow() -> Self {
        Decision {
            verdict: Verdict::Allow,
            matched_rule_id: None,
            matched_path: None,
            category: None,
            message: String::new(),
        }
    }

    /// Reduce the two evaluator findings into a decision
    pub fn from_findings(command: &Command, rule: Option<&Rule>, path: Option<&PathHit>) -> Self {
        if rule.is_none() && path.is_none() {
            return Decision::allow();
        }

        let mut reasons = Vec::new();
        if let Some(rule) = rule {
            reasons.push(format!("{} (rule {})", rule.reason, rule.id));
        }
        if let Some(hit) = path {
            reasons.push(format!(
                "`{}` targets protected path {} ({})",
                hit.verb, hit.protected, hit.operand
            ));
        }

        Decision {
            verdict: Verdict::Block,
            matched_rule_id: rule.map(|r| r.id.clone()),
            matched_path: path.map(|h| h.protected.clone()),
            category: rule.map(|r| r.category),
            message: block_message(command, &reasons.join("; ")),
        }
    }

    /// Block from the upstream glob deny list
    pub fn prefiltered(command: &Command, glob: &str) -> Self {
        Decision {
            verdict: Verdict::Block,
            matched_rule_id: Some(format!("prefilter:{}", glob)),
            matched_path: None,
            category: None,
            message: block_message(command, &format!("command matches deny glob `{}`", glob)),
        }
    }

    /// Block because the policy itself could not be evaluated
    pub fn fault(reason: impl Into<String>) -> Self {
        Decision {
            verdict: Verdict::Block,
            matched_rule_id: None,
            matched_path: None,
            category: None,
            message: format!(
                "Command policy could not be evaluated ({}). The command was not approved.",
                reason.into()
            ),
        }
    }

    pub fn is_allow(&self) -> bool {
        self.verdict == Verdict::Allow
    }

    pub fn is_block(&self) -> bool {
        self.verdict == Verdict::Block
    }

    pub fn rule_id(&self) -> Option<&str> {
        self.matched_rule_id.as_deref()
    }

    pub fn matched_path(&self) -> Option<&str> {
        self.matched_path.as_deref()
    }

    /// Exit status for this decision
    pub fn exit_code(&self) -> u8 {
        match self.verdict {
            Verdict::Allow => ExitStatus::PERMIT,
            Verdict::Block => ExitStatus::DENY,
        }
    }
}

fn block_message(command: &Command, reason: &str) -> String {
    format!(
        "Blocked `{}`: {}. If this is intended, run it manually outside the agent.",
        command.summary(MESSAGE_COMMAND_CHARS),
        reason
    )
}

/// Main output structure for pre-execution hooks
#[derive(Debug, Serialize)]
pub struct HookOutput {
    /// Hook-specific output containing the permission decision
    #[serde(rename = "hookSpecificOutput", skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<HookSpecificOutput>,

    /// Optional system message to show the user
    #[serde(rename = "systemMessage", skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
}

/// Hook-specific output with permission decision
#[derive(Debug, Serialize)]
pub struct HookSpecificOutput {
    /// The hook event name (typically "PreToolUse")
    #[serde(rename = "hookEventName")]
    pub hook_event_name: String,

    /// Permission decision: "allow" or "deny"
    #[serde(rename = "permissionDecision")]
    pub permission_decision: String,

    #[serde(rename = "permissionDecisionReason")]
    pub permission_decision_reason: String,
}

impl HookOutput {
    /// Create an allow response (empty output = allow)
    pub fn allow() -> Self {
        HookOutput {
            hook_specific_output: None,
            system_message: None,
        }
    }

    /// Create a deny response carrying the message and matched rule
    pub fn deny(tag: Option<&str>, message: &str) -> Self {
        let prefix = match tag {
            Some(tag) => format!("[command-policy:{}]", tag),
            None => "[command-policy]".to_string(),
        };
        HookOutput {
            hook_specific_output: Some(HookSpecificOutput {
                hook_event_name: "PreToolUse".to_string(),
                permission_decision: "deny".to_string(),
                permission_decision_reason: message.to_string(),
            }),
            system_message: Some(format!("{} {}", prefix, message)),
        }
    }

    /// Create output from a Decision
    pub fn from_decision(decision: &Decision) -> Self {
        match decision.verdict {
            Verdict::Allow => HookOutput::allow(),
            Verdict::Block => {
                let tag = decision.rule_id().or(decision.matched_path());
                HookOutput::deny(tag, &decision.message)
            }
        }
    }

    /// Deny response for an internal fault
    pub fn fault(reason: &str) -> Self {
        HookOutput::from_decision(&Decision::fault(reason))
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"hookSpecificOutput":{"hookEventName":"PreToolUse","permissionDecision":"deny"}}"#
                .to_string()
        })
    }
}
