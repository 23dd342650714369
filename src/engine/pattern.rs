//! Pattern evaluation
//!
//! Unanchored regex search of the whole command against the rule set.

use crate::input::Command;
use crate::rules::{Rule, RuleSet};

/// The first rule, in declared order, whose pattern matches the command
pub fn find_match<'r>(rules: &'r RuleSet, command: &Command) -> Option<&'r Rule> {
    if command.is_empty() {
        return None;
    }

    // RegexSet reports matches by index, lowest first.
    let index = rules.matcher().matches(command.as_str()).iter().next()?;
    rules.rules().get(index)
}

/// Every matching rule, in declared order
pub fn find_all_matches<'r>(rules: &'r RuleSet, command: &Command) -> Vec<&'r Rule> {
    if command.is_empty() {
        return Vec::new();
    }

    rules
        .matcher()
        .matches(command.as_str())
        .iter()
        .filter_map(|index| rules.rules().get(index))
        .collect()
}
