//! Built-in dangerous command rules
//!
//! Patterns use the `regex` crate dialect and are searched anywhere in the
//! command, so a match after a pipe, `;` or inside `$(...)` still counts.
//! Rules are case-insensitive unless marked otherwise.

use crate::config::SafetyLevel;
use crate::rules::{Category, RuleDef};

/// Critical level rules - catastrophic operations
pub const CRITICAL_RULES: &[RuleDef] = &[
    // Disk destruction
    RuleDef::new(
        "mkfs",
        SafetyLevel::Critical,
        Category::DiskOp,
        r#"(?:^|[\s;&|(`'"/\\])mk(?:e2)?fs(?:\.[a-z0-9]+)?(?:\s|$)"#,
        "Formatting a filesystem",
    ),
    RuleDef::new(
        "partition-table",
        SafetyLevel::Critical,
        Category::DiskOp,
        r#"(?:^|[\s;&|(`'"/\\])(?:fdisk|sfdisk|cfdisk|gdisk|sgdisk|parted|wipefs)(?:\s|$)"#,
        "Modifying a disk partition table",
    ),
    RuleDef::new(
        "dd-block-device",
        SafetyLevel::Critical,
        Category::DiskOp,
        r"\bdd\b.*\b(?:of|if)=/dev/(?:sd|hd|vd|xvd|nvme|mmcblk|disk|rdisk|md|loop|mapper/)",
        "Raw read or write on a block device",
    ),
    RuleDef::new(
        "redirect-block-device",
        SafetyLevel::Critical,
        Category::DiskOp,
        r">\s*/dev/(?:sd|hd|vd|xvd|nvme|mmcblk|disk|rdisk)[a-z0-9]*",
        "Redirecting output onto a block device",
    ),
    RuleDef::new(
        "diskutil-erase",
        SafetyLevel::Critical,
        Category::DiskOp,
        r"\bdiskutil\s+(?:erase\w*|zerodisk|randomdisk|secureerase|partitiondisk|reformat)\b",
        "Erasing or repartitioning a disk",
    ),
    // Process control
    RuleDef::new(
        "fork-bomb",
        SafetyLevel::Critical,
        Category::ProcessControl,
        r":\(\)\s*\{.*:\s*\|\s*:.*&",
        "Fork bomb detected",
    ),
    RuleDef::new(
        "fork-while-fork",
        SafetyLevel::Critical,
        Category::ProcessControl,
        r"\bfork\s+while\s+fork\b",
        "Fork bomb pattern detected",
    ),
    RuleDef::new(
        "kill-all-processes",
        SafetyLevel::Critical,
        Category::ProcessControl,
        r"\bkill\s+(?:\S+\s+)*?-1(?:\s*$|\s*[;&|)])",
        "Sending a signal to every process",
    ),
    RuleDef::new(
        "killall5",
        SafetyLevel::Critical,
        Category::ProcessControl,
        r"\bkillall5\b",
        "Sending a signal to every process",
    ),
    // System files
    RuleDef::new(
        "overwrite-system-file",
        SafetyLevel::Critical,
        Category::PrivilegeOrSystem,
        r"(?:^|[^>])>\s*/etc/(?:passwd|shadow|group|gshadow|sudoers|fstab|hosts)\b",
        "Overwriting a critical system file",
    ),
];

/// High level rules - destructive or irreversible operations
pub const HIGH_RULES: &[RuleDef] = &[
    // Deletion
    RuleDef::new(
        "rm-recursive",
        SafetyLevel::High,
        Category::Deletion,
        r#"(?:^|[\s;&|(`'"/\\])rm\s+(?:[^\s;&|]+\s+)*?(?:-[a-z]*r[a-z]*|--recursive)(?:\s|$|[;&|)'"`])"#,
        "Recursive deletion",
    ),
    RuleDef::new(
        "rm-history",
        SafetyLevel::High,
        Category::Deletion,
        r#"(?:(?:^|[\s;&|(`'"/\\])(?:rm|unlink|shred|truncate)\s[^;&|]*(?:_history|\.histfile)\b|(?:^|[^>])>\s*\S*(?:_history|\.histfile)\b)"#,
        "Deleting shell history",
    ),
    RuleDef::new(
        "history-clear",
        SafetyLevel::High,
        Category::Deletion,
        r"\bhistory\s+-[a-z]*c",
        "Clearing shell history",
    ),
    RuleDef::new(
        "shred",
        SafetyLevel::High,
        Category::Deletion,
        r#"(?:^|[\s;&|(`'"/\\])(?:shred|srm)\s"#,
        "Irrecoverably overwriting files",
    ),
    RuleDef::new(
        "crontab-remove",
        SafetyLevel::High,
        Category::Deletion,
        r"\bcrontab\s+(?:\S+\s+)*?-[a-z]*r\b",
        "Removing every cron job of a user",
    ),
    // Credentials
    RuleDef::new(
        "rm-credentials",
        SafetyLevel::High,
        Category::CredentialDestruction,
        r#"(?:^|[\s;&|(`'"/\\])(?:rm|unlink|shred|srm)\s[^;&|]*(?:\.ssh(?:/|\s|$)|id_(?:rsa|dsa|ecdsa|ed25519)|\.gnupg|\.aws/credentials|\.kube/config|\.docker/config\.json|\.netrc|\.pgpass|\.keychain)"#,
        "Deleting credentials or keys",
    ),
    RuleDef::new(
        "gpg-delete-secret",
        SafetyLevel::High,
        Category::CredentialDestruction,
        r"\bgpg2?\s+(?:\S+\s+)*?--delete-(?:secret-(?:and-public-)?)?keys?\b",
        "Deleting GPG keys",
    ),
    RuleDef::new(
        "keychain-delete",
        SafetyLevel::High,
        Category::CredentialDestruction,
        r"\bsecurity\s+delete-(?:keychain|generic-password|internet-password|certificate|identity)\b",
        "Deleting keychain entries",
    ),
    RuleDef::new(
        "truncate-authorized-keys",
        SafetyLevel::High,
        Category::CredentialDestruction,
        r"(?:^|[^>])>\s*\S*\.ssh/authorized_keys\b",
        "Overwriting SSH authorized_keys",
    ),
    // Process control
    RuleDef::new(
        "force-kill-by-name",
        SafetyLevel::High,
        Category::ProcessControl,
        r"\b(?:killall|pkill)\s+(?:\S+\s+)*?-(?:9|kill|sigkill|s\s+(?:kill|9))\b",
        "Force killing processes by name",
    ),
    // Privilege and system state
    RuleDef::new(
        "chmod-world-writable",
        SafetyLevel::High,
        Category::PrivilegeOrSystem,
        r"\bchmod\s+(?:[^\s;&|]+\s+)*?(?:[0-7]?[0-7]{2}[2367]|[ugoa]*[ao][ugoa]*[+=][rwxXst]*w[rwxXst]*)(?:\s|$)",
        "Setting world-writable permissions",
    ),
    RuleDef::new(
        "recursive-ownership-change",
        SafetyLevel::High,
        Category::PrivilegeOrSystem,
        r"\b(?i:chmod|chown|chgrp)\s+(?:[^\s;&|]+\s+)*?(?:-[a-zA-Z]*R[a-zA-Z]*|(?i:--recursive))(?:\s|$)",
        "Recursive permission or ownership change",
    )
    .case_sensitive(),
    RuleDef::new(
        "shutdown",
        SafetyLevel::High,
        Category::PrivilegeOrSystem,
        r"(?:^|[;&|(`]|\b(?:sudo|doas|exec|nohup)\s+(?:-\S+\s+)*)\s*(?:\S*/)?(?:shutdown|reboot|halt|poweroff)(?:\s|$|[;&|)`])",
        "Shutting down or rebooting the machine",
    ),
    RuleDef::new(
        "runlevel-change",
        SafetyLevel::High,
        Category::PrivilegeOrSystem,
        r"(?:(?:^|[\s;&|(`/])(?:init|telinit)\s+[0-6s]\b|\bsystemctl\s+(?:\S+\s+)*?(?:poweroff|reboot|halt|kexec|rescue|emergency|isolate|suspend|hibernate)\b)",
        "Changing the system run level",
    ),
    // Remote code execution
    RuleDef::new(
        "pipe-to-shell",
        SafetyLevel::High,
        Category::RemoteExec,
        r"\b(?:curl|wget|fetch|aria2c)\b.*\|\s*(?:sudo\s+(?:-\S+\s+)*)?(?:\S*/)?(?:env\s+)?(?:ba|z|k|c|tc|da|fi|a)?sh\b",
        "Piping downloaded content into a shell",
    ),
    RuleDef::new(
        "pipe-to-interpreter",
        SafetyLevel::High,
        Category::RemoteExec,
        r"\b(?:curl|wget|fetch|aria2c)\b.*\|\s*(?:sudo\s+(?:-\S+\s+)*)?(?:\S*/)?(?:env\s+)?(?:python[0-9.]*|perl|ruby|node|php|lua|osascript|pwsh|powershell)\b",
        "Piping downloaded content into an interpreter",
    ),
    RuleDef::new(
        "exec-downloaded-script",
        SafetyLevel::High,
        Category::RemoteExec,
        r#"(?:\b(?:ba|z|k|da)?sh|\bsource|\beval|(?:^|\s)\.)\s+(?:-c\s+)?['"]?(?:<|\$)\(\s*(?:curl|wget)\b"#,
        "Executing a downloaded script",
    ),
    // Network control
    RuleDef::new(
        "firewall-flush",
        SafetyLevel::High,
        Category::NetworkControl,
        r"\b(?i:ip6?tables(?:-legacy|-nft)?)\s+(?:\S+\s+)*?(?:-F|-X|(?i:--flush|--delete-chain)|(?:-P|--policy)\s+\S+\s+DROP)(?:\s|$)",
        "Flushing firewall rules",
    )
    .case_sensitive(),
    RuleDef::new(
        "ufw-disable",
        SafetyLevel::High,
        Category::NetworkControl,
        r"\bufw\s+(?:--force\s+)?(?:disable|reset)\b",
        "Disabling or resetting the firewall",
    ),
    RuleDef::new(
        "nft-flush",
        SafetyLevel::High,
        Category::NetworkControl,
        r"\bnft\s+(?:-\S+\s+)*flush\s+ruleset\b",
        "Flushing the nftables ruleset",
    ),
    RuleDef::new(
        "pfctl-flush",
        SafetyLevel::High,
        Category::NetworkControl,
        r"\b(?i:pfctl)\s+(?:\S+\s+)*?-[a-zA-Z]*[Fd]\b",
        "Flushing or disabling pf",
    )
    .case_sensitive(),
    RuleDef::new(
        "firewall-service-stop",
        SafetyLevel::High,
        Category::NetworkControl,
        r"\b(?:systemctl\s+(?:stop|disable|mask)\s+(?:firewalld|ufw|nftables|iptables)\b|firewall-cmd\s+.*--panic-on\b)",
        "Stopping the firewall service",
    ),
];

/// Strict level rules - risky but often legitimate operations
pub const STRICT_RULES: &[RuleDef] = &[
    RuleDef::new(
        "find-delete",
        SafetyLevel::Strict,
        Category::Deletion,
        r"\bfind\b.*(?:\s-delete\b|-exec\s+(?:\S*/)?rm\b)",
        "Bulk deletion through find",
    ),
    RuleDef::new(
        "setuid-bit",
        SafetyLevel::Strict,
        Category::PrivilegeOrSystem,
        r"\bchmod\s+(?:[^\s;&|]+\s+)*?(?:[ugoa]*\+[rwxX]*s|[2467][0-7]{3})(?:\s|$)",
        "Setting setuid or setgid bits",
    ),
    RuleDef::new(
        "sudo-rm",
        SafetyLevel::Strict,
        Category::Deletion,
        r"\bsudo\s+(?:-\S+\s+)*rm\b",
        "Using sudo with rm",
    ),
];

/// All built-in rules regardless of level
pub fn all_rules() -> impl Iterator<Item = &'static RuleDef> {
    CRITICAL_RULES
        .iter()
        .chain(HIGH_RULES.iter())
        .chain(STRICT_RULES.iter())
}

/// Get all rules up to and including the specified safety level
pub fn get_rules_for_level(level: SafetyLevel) -> Vec<&'static RuleDef> {
    all_rules().filter(|r| level.includes(r.level)).collect()
}
