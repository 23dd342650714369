//! Shell parsing utilities for command-policy
//!
//! Segment splitting, tokenization and wrapper unwrapping used by the path
//! checks. There is no shell grammar here, only lexical rules.

pub mod shell;
pub mod wrapper;
