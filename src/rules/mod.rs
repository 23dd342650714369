//! Policy rules for command-policy
//!
//! A [`RuleSet`] is the engine's whole configuration: an ordered list of
//! compiled pattern rules plus the critical-path list. It is built once,
//! validated up front and never mutated afterwards.

pub mod dangerous;
pub mod paths;

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder, RegexSet};
use serde::{Deserialize, Serialize};

use crate::config::{Config, SafetyLevel};
use crate::error::{ConfigError, Result};
use crate::rules::paths::{CriticalPath, MoveCheck};

/// Rule set format version understood by this build
pub const RULESET_VERSION: u32 = 1;

/// Danger category a rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Deletion,
    DiskOp,
    ProcessControl,
    PrivilegeOrSystem,
    RemoteExec,
    NetworkControl,
    CredentialDestruction,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Deletion,
        Category::DiskOp,
        Category::ProcessControl,
        Category::PrivilegeOrSystem,
        Category::RemoteExec,
        Category::NetworkControl,
        Category::CredentialDestruction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Deletion => "deletion",
            Category::DiskOp => "disk_op",
            Category::ProcessControl => "process_control",
            Category::PrivilegeOrSystem => "privilege_or_system",
            Category::RemoteExec => "remote_exec",
            Category::NetworkControl => "network_control",
            Category::CredentialDestruction => "credential_destruction",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A built-in rule definition, compiled into a [`Rule`] at load time
#[derive(Debug, Clone, Copy)]
pub struct RuleDef {
    /// Unique identifier for this rule
    pub id: &'static str,

    /// Safety level at which this rule is active
    pub level: SafetyLevel,

    /// Danger category reported on a match
    pub category: Category,

    /// Regex pattern to search for
    pub pattern: &'static str,

    /// Human-readable reason for blocking
    pub reason: &'static str,

    /// Match case-sensitively instead of the default case-insensitive mode
    pub case_sensitive: bool,
}

impl RuleDef {
    pub const fn new(
        id: &'static str,
        level: SafetyLevel,
        category: Category,
        pattern: &'static str,
        reason: &'static str,
    ) -> Self {
        Self {
            id,
            level,
            category,
            pattern,
            reason,
            case_sensitive: false,
        }
    }

    /// Opt into case-sensitive matching (for flags like `-R` vs `-r`)
    pub const fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    /// Compile this definition
    pub fn compile(&self) -> Result<Rule> {
        Rule::compile(
            self.id,
            self.category,
            self.pattern,
            self.reason,
            self.case_sensitive,
            self.level,
        )
    }
}

/// A compiled pattern rule
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub category: Category,
    pub pattern: Regex,
    pub reason: String,
    pub case_sensitive: bool,
    pub level: SafetyLevel,
}

impl Rule {
    /// Compile a rule. An invalid pattern is reported, never skipped.
    pub fn compile(
        id: impl Into<String>,
        category: Category,
        pattern: &str,
        reason: impl Into<String>,
        case_sensitive: bool,
        level: SafetyLevel,
    ) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ConfigError::EmptyRuleId);
        }

        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|source| ConfigError::InvalidPattern {
                id: id.clone(),
                source,
            })?;

        Ok(Self {
            id,
            category,
            pattern,
            reason: reason.into(),
            case_sensitive,
            level,
        })
    }

    pub fn is_match(&self, command: &str) -> bool {
        self.pattern.is_match(command)
    }

    /// Pattern source with the case flag folded in, for use in a `RegexSet`
    fn set_source(&self) -> String {
        if self.case_sensitive {
            self.pattern.as_str().to_string()
        } else {
            format!("(?i:{})", self.pattern.as_str())
        }
    }
}

/// The ordered, versioned collection of pattern rules and critical paths
#[derive(Debug, Clone)]
pub struct RuleSet {
    version: u32,
    rules: Vec<Rule>,
    matcher: RegexSet,
    declared_paths: Vec<CriticalPath>,
    paths: Vec<CriticalPath>,
    move_check: MoveCheck,
    wrappers: Vec<String>,
    home_dir: Option<PathBuf>,
}

impl RuleSet {
    /// Build a rule set from compiled rules and critical paths.
    ///
    /// Rule ids must be unique. Critical paths are normalized against the
    /// current user's home directory.
    pub fn new(rules: Vec<Rule>, paths: Vec<CriticalPath>) -> Result<Self> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(ConfigError::DuplicateRule(rule.id.clone()));
            }
        }

        let sources: Vec<String> = rules.iter().map(Rule::set_source).collect();
        let matcher = RegexSet::new(&sources).map_err(|source| ConfigError::InvalidPattern {
            id: "<rule set>".to_string(),
            source,
        })?;

        let home_dir = dirs::home_dir();

        Ok(Self {
            version: RULESET_VERSION,
            rules,
            matcher,
            paths: normalize_entries(&paths, home_dir.as_deref()),
            declared_paths: paths,
            move_check: MoveCheck::default(),
            wrappers: crate::parser::wrapper::DEFAULT_WRAPPERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            home_dir,
        })
    }

    /// The built-in rules and critical paths at the default safety level
    pub fn builtin() -> Result<Self> {
        Self::from_config(&Config::default())
    }

    /// Compile the rule set described by a configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.version != RULESET_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: config.version,
                supported: RULESET_VERSION,
            });
        }

        let level = config.general.safety_level;
        let disabled: HashSet<&str> = config.rules.disabled.iter().map(String::as_str).collect();

        // Every disabled id must name a real rule, or a typo silently keeps
        // a rule the operator meant to drop.
        for id in &disabled {
            let builtin = dangerous::all_rules().any(|r| r.id == *id);
            let custom = config.rules.custom.iter().any(|r| r.id == *id);
            if !builtin && !custom {
                return Err(ConfigError::UnknownRule(id.to_string()));
            }
        }

        let mut rules = Vec::new();
        if config.rules.builtin {
            for def in dangerous::get_rules_for_level(level) {
                if !disabled.contains(def.id) {
                    rules.push(def.compile()?);
                }
            }
        }

        for custom in &config.rules.custom {
            // Compile before filtering so a bad pattern fails at every level.
            let rule = Rule::compile(
                custom.id.as_str(),
                custom.category,
                &custom.pattern,
                custom.reason.as_str(),
                custom.case_sensitive,
                custom.level,
            )?;
            if level.includes(custom.level) && !disabled.contains(custom.id.as_str()) {
                rules.push(rule);
            }
        }

        let mut critical = Vec::new();
        if config.paths.builtin {
            critical.extend(paths::builtin_paths());
        }
        for entry in &config.paths.protected {
            critical.push(entry.to_critical_path()?);
        }

        let mut set = Self::new(rules, critical)?;
        set.version = config.version;
        set.move_check = config.paths.move_check;
        set.wrappers = config.shell.wrappers.clone();
        Ok(set)
    }

    /// Use a specific home directory for `~` normalization
    pub fn with_home_dir(mut self, home_dir: Option<PathBuf>) -> Self {
        self.paths = normalize_entries(&self.declared_paths, home_dir.as_deref());
        self.home_dir = home_dir;
        self
    }

    /// Choose which side of a `mv` is checked against critical paths
    pub fn with_move_check(mut self, move_check: MoveCheck) -> Self {
        self.move_check = move_check;
        self
    }

    pub fn with_wrappers(mut self, wrappers: Vec<String>) -> Self {
        self.wrappers = wrappers;
        self
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Pattern rules in declared order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn paths(&self) -> &[CriticalPath] {
        &self.paths
    }

    pub fn move_check(&self) -> MoveCheck {
        self.move_check
    }

    pub fn wrappers(&self) -> &[String] {
        &self.wrappers
    }

    pub fn home_dir(&self) -> Option<&Path> {
        self.home_dir.as_deref()
    }

    pub(crate) fn matcher(&self) -> &RegexSet {
        &self.matcher
    }
}

fn normalize_entries(entries: &[CriticalPath], home: Option<&Path>) -> Vec<CriticalPath> {
    entries
        .iter()
        .map(|entry| entry.clone().normalized(home))
        .collect()
}
