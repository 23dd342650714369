//! Critical path rules
//!
//! Protected filesystem locations and the mutating verbs they guard.
//! Matching is done on normalized paths, component by component, so `/etc`
//! protects `/etc/hosts` but not `/etcetera`.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

/// A path-mutating command verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Rm,
    Rmdir,
    Unlink,
    Shred,
    Mv,
    Chown,
    Chgrp,
    Chmod,
}

impl Verb {
    pub const ALL: &'static [Verb] = &[
        Verb::Rm,
        Verb::Rmdir,
        Verb::Unlink,
        Verb::Shred,
        Verb::Mv,
        Verb::Chown,
        Verb::Chgrp,
        Verb::Chmod,
    ];

    /// Verbs that destroy or relocate data, without permission changes
    pub const DESTRUCTIVE: &'static [Verb] = &[
        Verb::Rm,
        Verb::Rmdir,
        Verb::Unlink,
        Verb::Shred,
        Verb::Mv,
    ];

    /// Resolve a command word such as `rm`, `/bin/rm` or `\RM` to a verb
    pub fn from_command(word: &str) -> Option<Verb> {
        let word = word.trim_start_matches('\\');
        let name = word.rsplit('/').next().unwrap_or(word).to_ascii_lowercase();
        match name.as_str() {
            "rm" => Some(Verb::Rm),
            "rmdir" => Some(Verb::Rmdir),
            "unlink" => Some(Verb::Unlink),
            "shred" => Some(Verb::Shred),
            "mv" => Some(Verb::Mv),
            "chown" => Some(Verb::Chown),
            "chgrp" => Some(Verb::Chgrp),
            "chmod" => Some(Verb::Chmod),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Rm => "rm",
            Verb::Rmdir => "rmdir",
            Verb::Unlink => "unlink",
            Verb::Shred => "shred",
            Verb::Mv => "mv",
            Verb::Chown => "chown",
            Verb::Chgrp => "chgrp",
            Verb::Chmod => "chmod",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a protected path matches a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathMatch {
    /// Only the location itself
    Exact,
    /// The location and everything below it
    #[default]
    Subtree,
}

impl PathMatch {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathMatch::Exact => "exact",
            PathMatch::Subtree => "subtree",
        }
    }
}

/// Which operands of `mv` are checked against critical paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveCheck {
    Source,
    Destination,
    #[default]
    Both,
}

/// A protected filesystem location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriticalPath {
    pub path: String,
    pub kind: PathMatch,
    pub verbs: BTreeSet<Verb>,
}

impl CriticalPath {
    pub fn new(path: impl Into<String>, kind: PathMatch, verbs: &[Verb]) -> Self {
        Self {
            path: path.into(),
            kind,
            verbs: verbs.iter().copied().collect(),
        }
    }

    pub fn applies_to(&self, verb: Verb) -> bool {
        self.verbs.contains(&verb)
    }

    /// Check a normalized target path against this entry
    pub fn matches(&self, target: &str) -> bool {
        match self.kind {
            PathMatch::Exact => target == self.path,
            PathMatch::Subtree => target == self.path || Path::new(target).starts_with(&self.path),
        }
    }

    pub(crate) fn normalized(mut self, home: Option<&Path>) -> Self {
        if let Some(path) = normalize_path(&self.path, home) {
            self.path = path;
        }
        self
    }
}

/// A built-in critical path definition
struct PathDef {
    path: &'static str,
    kind: PathMatch,
    verbs: &'static [Verb],
}

const fn system(path: &'static str, kind: PathMatch) -> PathDef {
    PathDef {
        path,
        kind,
        verbs: Verb::ALL,
    }
}

const fn home(path: &'static str, kind: PathMatch) -> PathDef {
    PathDef {
        path,
        kind,
        verbs: Verb::DESTRUCTIVE,
    }
}

const BUILTIN_PATHS: &[PathDef] = &[
    // Filesystem roots and system trees
    system("/", PathMatch::Exact),
    system("/etc", PathMatch::Subtree),
    system("/usr", PathMatch::Subtree),
    system("/bin", PathMatch::Subtree),
    system("/sbin", PathMatch::Subtree),
    system("/lib", PathMatch::Subtree),
    system("/lib32", PathMatch::Subtree),
    system("/lib64", PathMatch::Subtree),
    system("/boot", PathMatch::Subtree),
    system("/dev", PathMatch::Subtree),
    system("/proc", PathMatch::Subtree),
    system("/sys", PathMatch::Subtree),
    system("/var", PathMatch::Exact),
    system("/var/lib", PathMatch::Subtree),
    system("/opt", PathMatch::Exact),
    system("/srv", PathMatch::Exact),
    system("/root", PathMatch::Exact),
    system("/home", PathMatch::Exact),
    // macOS
    system("/System", PathMatch::Subtree),
    system("/Library", PathMatch::Exact),
    system("/Applications", PathMatch::Exact),
    system("/Users", PathMatch::Exact),
    system("/private/etc", PathMatch::Subtree),
    system("/private/var", PathMatch::Exact),
    // Home directory and credentials
    home("~", PathMatch::Exact),
    home("~/.ssh", PathMatch::Subtree),
    home("~/.gnupg", PathMatch::Subtree),
    home("~/.aws", PathMatch::Subtree),
    home("~/.kube", PathMatch::Subtree),
    home("~/.config", PathMatch::Exact),
    home("~/.config/command-policy", PathMatch::Subtree),
    home("~/.bashrc", PathMatch::Exact),
    home("~/.bash_profile", PathMatch::Exact),
    home("~/.profile", PathMatch::Exact),
    home("~/.zshrc", PathMatch::Exact),
    home("~/.gitconfig", PathMatch::Exact),
];

/// The built-in critical path list, not yet normalized
pub fn builtin_paths() -> Vec<CriticalPath> {
    BUILTIN_PATHS
        .iter()
        .map(|def| CriticalPath::new(def.path, def.kind, def.verbs))
        .collect()
}

/// Normalize a path operand for comparison.
///
/// Home spellings (`~`, `$HOME`, `${HOME}` and the literal home directory)
/// become `~`. `.` and `..` are resolved lexically, repeated and trailing
/// slashes dropped. A glob is reduced to its literal directory prefix, so
/// `/etc/*` becomes `/etc`. Returns `None` when nothing literal remains.
pub fn normalize_path(raw: &str, home: Option<&Path>) -> Option<String> {
    let mut path = raw.trim();
    if path.is_empty() {
        return None;
    }

    if let Some(pos) = path.find(['*', '?', '[']) {
        let literal = &path[..pos];
        path = match literal.rfind('/') {
            Some(0) => "/",
            Some(idx) => &literal[..idx],
            None => return None,
        };
    }

    let expanded = expand_home(path);
    let absolute = match (expanded.strip_prefix('~'), home) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            format!("{}{}", home.display(), rest)
        }
        _ => expanded,
    };

    let cleaned = clean(&absolute)?;

    if let Some(home) = home {
        if let Ok(rest) = Path::new(&cleaned).strip_prefix(home) {
            let rest = rest.to_string_lossy();
            return Some(if rest.is_empty() {
                "~".to_string()
            } else {
                format!("~/{}", rest)
            });
        }
    }

    Some(cleaned)
}

fn expand_home(path: &str) -> String {
    for prefix in ["${HOME}", "$HOME"] {
        if let Some(rest) = path.strip_prefix(prefix) {
            if rest.is_empty() || rest.starts_with('/') {
                return format!("~{}", rest);
            }
        }
    }
    path.to_string()
}

/// Lexical cleanup; never touches the filesystem
fn clean(path: &str) -> Option<String> {
    let (anchor, rest) = if let Some(rest) = path.strip_prefix('/') {
        ("/", rest)
    } else if path == "~" {
        ("~", "")
    } else if let Some(rest) = path.strip_prefix("~/") {
        ("~", rest)
    } else {
        ("", path)
    };

    let mut parts: Vec<&str> = Vec::new();
    for component in Path::new(rest).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::ParentDir => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if anchor.is_empty() {
                    parts.push("..");
                }
            }
            _ => {}
        }
    }

    let joined = parts.join("/");
    Some(match anchor {
        "/" => format!("/{}", joined),
        "~" if joined.is_empty() => "~".to_string(),
        "~" => format!("~/{}", joined),
        _ if joined.is_empty() => ".".to_string(),
        _ => joined,
    })
}
