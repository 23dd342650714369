//! Error types for command-policy
//!
//! Every error here is a configuration error: evaluation itself is total
//! and never fails. A `ConfigError` means the engine must not start.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for rule set and configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading configuration or compiling the rule set.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML or does not fit the schema.
    #[error("invalid config in {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    /// The rule set declares a version this build does not understand.
    #[error("unsupported rule set version {found}; this build supports version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// A rule pattern failed to compile.
    #[error("rule `{id}` has an invalid pattern: {source}")]
    InvalidPattern {
        id: String,
        #[source]
        source: regex::Error,
    },

    /// Rule ids must be unique across built-in and custom rules.
    #[error("duplicate rule id `{0}`")]
    DuplicateRule(String),

    /// A rule id listed under `rules.disabled` does not exist.
    #[error("unknown rule id `{0}` in rules.disabled")]
    UnknownRule(String),

    /// Rule ids must be non-empty.
    #[error("rule id must not be empty")]
    EmptyRuleId,

    /// A prefilter glob failed to compile.
    #[error("invalid prefilter glob `{glob}`: {source}")]
    InvalidGlob {
        glob: String,
        #[source]
        source: glob::PatternError,
    },

    /// A protected path entry has an empty path.
    #[error("protected path entry must not be empty")]
    EmptyPath,

    /// A protected path entry lists no verbs, so it could never match.
    #[error("protected path `{0}` applies to no verbs")]
    NoVerbs(String),
}
