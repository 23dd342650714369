//! Configuration loading for command-policy
//!
//! Supports TOML configuration with embedded defaults. Unlike a missing
//! file, a config that exists but cannot be read or parsed is an error:
//! the engine refuses to run on a rule source it could not load.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ConfigError, Result};
use crate::parser::wrapper::DEFAULT_WRAPPERS;
use crate::rules::paths::{CriticalPath, MoveCheck, PathMatch, Verb};
use crate::rules::{Category, RULESET_VERSION};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "COMMAND_POLICY_CONFIG";

/// Safety level determines which pattern rules are active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SafetyLevel {
    /// Only catastrophic operations (disk formatting, fork bombs)
    Critical,

    /// Critical + destructive operations (recursive delete, curl | sh)
    #[default]
    High,

    /// Everything above + risky but often legitimate operations
    Strict,
}

impl SafetyLevel {
    /// Check if a rule level is active under this safety level
    pub fn includes(&self, rule_level: SafetyLevel) -> bool {
        match self {
            SafetyLevel::Critical => rule_level == SafetyLevel::Critical,
            SafetyLevel::High => {
                rule_level == SafetyLevel::Critical || rule_level == SafetyLevel::High
            }
            SafetyLevel::Strict => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyLevel::Critical => "critical",
            SafetyLevel::High => "high",
            SafetyLevel::Strict => "strict",
        }
    }
}

impl FromStr for SafetyLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(SafetyLevel::Critical),
            "high" => Ok(SafetyLevel::High),
            "strict" => Ok(SafetyLevel::Strict),
            other => Err(format!("unknown safety level `{}`", other)),
        }
    }
}

/// General configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralConfig {
    /// Safety level for rule filtering
    pub safety_level: SafetyLevel,

    /// Enable audit logging
    pub audit_log: bool,

    /// Path to audit log file
    pub audit_path: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            safety_level: SafetyLevel::High,
            audit_log: true,
            audit_path: Some("~/.config/command-policy/audit.jsonl".to_string()),
        }
    }
}

/// An operator-defined pattern rule
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomRule {
    pub id: String,
    pub category: Category,
    pub pattern: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub level: SafetyLevel,
}

/// Pattern rule configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulesConfig {
    /// Include the built-in rules
    pub builtin: bool,

    /// Rule ids to drop from the active set
    pub disabled: Vec<String>,

    /// Extra rules, evaluated after the built-ins
    pub custom: Vec<CustomRule>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            builtin: true,
            disabled: Vec::new(),
            custom: Vec::new(),
        }
    }
}

/// An operator-defined protected path
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProtectedPath {
    pub path: String,

    #[serde(rename = "match", default)]
    pub kind: PathMatch,

    /// Verbs this entry guards; all mutating verbs when omitted
    #[serde(default)]
    pub verbs: Option<Vec<Verb>>,
}

impl ProtectedPath {
    pub fn to_critical_path(&self) -> Result<CriticalPath> {
        if self.path.trim().is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        let verbs = self.verbs.as_deref().unwrap_or(Verb::ALL);
        if verbs.is_empty() {
            return Err(ConfigError::NoVerbs(self.path.clone()));
        }
        Ok(CriticalPath::new(self.path.trim(), self.kind, verbs))
    }
}

/// Critical path configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Include the built-in critical paths
    pub builtin: bool,

    /// Which side of `mv` is checked
    pub move_check: MoveCheck,

    /// Extra protected paths
    pub protected: Vec<ProtectedPath>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            builtin: true,
            move_check: MoveCheck::Both,
            protected: Vec::new(),
        }
    }
}

/// Shell parsing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    /// Commands that run another command (stripped before verb detection)
    pub wrappers: Vec<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            wrappers: DEFAULT_WRAPPERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Upstream command-name glob lists
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct PrefilterConfig {
    pub allow: Vec<String>,
    pub deny: Vec<String>,
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Rule set format version
    pub version: u32,
    pub general: GeneralConfig,
    pub rules: RulesConfig,
    pub paths: PathsConfig,
    pub shell: ShellConfig,
    pub prefilter: PrefilterConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: RULESET_VERSION,
            general: GeneralConfig::default(),
            rules: RulesConfig::default(),
            paths: PathsConfig::default(),
            shell: ShellConfig::default(),
            prefilter: PrefilterConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the standard locations, or use defaults.
    ///
    /// `$COMMAND_POLICY_CONFIG` wins and must exist when set. Otherwise the
    /// first existing file among the user and system locations is used.
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load_from(Path::new(&path));
        }

        let config_paths = [
            // User-specific config
            dirs::home_dir().map(|p| p.join(".config/command-policy/config.toml")),
            // System-wide config
            Some(PathBuf::from("/etc/command-policy/config.toml")),
        ];

        for path in config_paths.into_iter().flatten() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading config");
                return Self::load_from(&path);
            }
        }

        Ok(Config::default())
    }

    /// Load from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, &path.display().to_string())
    }

    /// Parse a TOML document; `origin` names it in error messages
    pub fn from_toml(content: &str, origin: &str) -> Result<Self> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })
    }

    /// Expand ~ in path strings
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Get the audit log path (expanded), if audit logging is on
    pub fn audit_path(&self) -> Option<PathBuf> {
        if !self.general.audit_log {
            return None;
        }
        self.general.audit_path.as_deref().map(Self::expand_path)
    }
}

/// Embedded default configuration, printed by `--default-config`
pub const DEFAULT_CONFIG_TOML: &str = r#"# command-policy configuration
# Patterns use Rust regex syntax and are case-insensitive unless
# case_sensitive = true. An invalid pattern stops the engine from starting.
version = 1

[general]
safety_level = "high"   # critical | high | strict
audit_log = true
audit_path = "~/.config/command-policy/audit.jsonl"

[rules]
builtin = true
disabled = []

# [[rules.custom]]
# id = "terraform-destroy"
# category = "deletion"
# pattern = "\\bterraform\\s+destroy\\b"
# reason = "Destroying managed infrastructure"

[paths]
builtin = true
move_check = "both"     # both | source | destination

# [[paths.protected]]
# path = "/srv/data"
# match = "subtree"     # exact | subtree
# verbs = ["rm", "mv"]

[shell]
wrappers = ["sudo", "doas", "timeout", "xargs", "env", "nice", "nohup", "ionice", "strace", "time", "unbuffer", "watch", "caffeinate", "command", "builtin", "exec", "stdbuf"]

[prefilter]
allow = []
deny = []
"#;
