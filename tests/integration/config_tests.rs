//! Integration tests for configuration loading and rule set validation

use std::io::Write;

use command_policy::{
    config::{Config, SafetyLevel, CONFIG_ENV},
    prefilter::CommandFilter,
    ConfigError, PolicyEngine,
};
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn engine_from(content: &str) -> Result<PolicyEngine, ConfigError> {
    let file = write_config(content);
    let config = Config::load_from(file.path())?;
    PolicyEngine::from_config(&config)
}

// ============================================================================
// Fatal configuration errors
// ============================================================================

#[test]
fn test_missing_file_is_error() {
    let err = Config::load_from(std::path::Path::new("/nonexistent/command-policy.toml"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn test_invalid_toml_is_error() {
    let err = engine_from("version = [").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_invalid_pattern_is_fatal() {
    let err = engine_from(
        r#"
        [[rules.custom]]
        id = "broken"
        category = "deletion"
        pattern = "rm\\s+("
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidPattern { ref id, .. } if id == "broken"));
    assert!(err.to_string().contains("broken"));
}

#[test]
fn test_duplicate_rule_id_is_fatal() {
    let err = engine_from(
        r#"
        [[rules.custom]]
        id = "rm-recursive"
        category = "deletion"
        pattern = "rm"
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateRule(ref id) if id == "rm-recursive"));
}

#[test]
fn test_unknown_disabled_rule_is_fatal() {
    let err = engine_from("[rules]\ndisabled = [\"rm-recursiv\"]\n").unwrap_err();
    assert!(matches!(err, ConfigError::UnknownRule(_)));
}

#[test]
fn test_unsupported_version_is_fatal() {
    let err = engine_from("version = 2\n").unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedVersion { found: 2, supported: 1 }));
}

#[test]
fn test_misspelled_key_is_fatal() {
    let err = engine_from("[[paths.protectd]]\npath = \"/srv/data\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));

    let err = engine_from("[paths]\nmove_chek = \"source\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_empty_protected_path_is_fatal() {
    let err = engine_from("[[paths.protected]]\npath = \"\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::EmptyPath));
}

#[test]
fn test_invalid_prefilter_glob_is_fatal() {
    let file = write_config("[prefilter]\ndeny = [\"rm [\"]\n");
    let config = Config::load_from(file.path()).unwrap();
    assert!(matches!(
        CommandFilter::from_config(&config),
        Err(ConfigError::InvalidGlob { .. })
    ));
}

// ============================================================================
// Rule customization
// ============================================================================

#[test]
fn test_custom_rule_blocks() {
    let engine = engine_from(
        r#"
        version = 1

        [[rules.custom]]
        id = "terraform-destroy"
        category = "deletion"
        pattern = "\\bterraform\\s+destroy\\b"
        reason = "Destroying managed infrastructure"
        "#,
    )
    .unwrap();

    let decision = engine.evaluate_str("cd infra && TERRAFORM destroy -auto-approve");
    assert!(decision.is_block());
    assert_eq!(decision.rule_id(), Some("terraform-destroy"));
    assert!(decision.message.contains("Destroying managed infrastructure"));
    assert!(engine.evaluate_str("terraform plan").is_allow());
}

#[test]
fn test_case_sensitive_custom_rule() {
    let engine = engine_from(
        r#"
        [[rules.custom]]
        id = "prod-drop"
        category = "deletion"
        pattern = "DROP DATABASE"
        case_sensitive = true
        "#,
    )
    .unwrap();
    assert!(engine.evaluate_str("psql -c 'DROP DATABASE app'").is_block());
    assert!(engine.evaluate_str("psql -c 'drop database app'").is_allow());
}

#[test]
fn test_disabled_builtin_rule() {
    let engine = engine_from("[rules]\ndisabled = [\"chmod-world-writable\"]\n").unwrap();
    assert!(engine.evaluate_str("chmod 777 file").is_allow());
    assert!(engine.evaluate_str("rm -rf build").is_block());
}

#[test]
fn test_safety_levels() {
    let critical = engine_from("[general]\nsafety_level = \"critical\"\n").unwrap();
    assert!(critical.evaluate_str("mkfs.ext4 /dev/sdb1").is_block());
    assert!(critical.evaluate_str("rm -rf build").is_allow());
    // Critical paths apply at every level
    assert!(critical.evaluate_str("rm /etc/hosts").is_block());

    let strict = engine_from("[general]\nsafety_level = \"strict\"\n").unwrap();
    assert!(strict.evaluate_str("find . -name '*.tmp' -delete").is_block());

    let high = engine_from("").unwrap();
    assert!(high.evaluate_str("find . -name '*.tmp' -delete").is_allow());
}

// ============================================================================
// Critical path customization
// ============================================================================

#[test]
fn test_protected_path_entry() {
    let engine = engine_from(
        r#"
        [[paths.protected]]
        path = "/srv/data/"
        verbs = ["rm"]
        "#,
    )
    .unwrap();

    let decision = engine.evaluate_str("rm /srv/data/db.sqlite");
    assert!(decision.is_block());
    assert_eq!(decision.matched_path(), Some("/srv/data"));
    assert!(engine.evaluate_str("mv /srv/data/db.sqlite /tmp").is_allow());
    assert!(engine.evaluate_str("rm /srv/database").is_allow());
}

#[test]
fn test_exact_protected_path() {
    let engine = engine_from(
        r#"
        [[paths.protected]]
        path = "/data"
        match = "exact"
        "#,
    )
    .unwrap();
    assert!(engine.evaluate_str("chmod 700 /data").is_block());
    assert!(engine.evaluate_str("rm /data/tmp.txt").is_allow());
}

#[test]
fn test_builtin_paths_disabled() {
    let engine = engine_from("[paths]\nbuiltin = false\n").unwrap();
    assert!(engine.evaluate_str("rm /etc/hosts").is_allow());
}

#[test]
fn test_move_check_destination() {
    let engine = engine_from("[paths]\nmove_check = \"destination\"\n").unwrap();
    assert!(engine.evaluate_str("mv /etc/app.conf ./app.conf").is_allow());
    assert!(engine.evaluate_str("mv ./app.conf /etc/app.conf").is_block());
}

#[test]
fn test_move_check_source() {
    let engine = engine_from("[paths]\nmove_check = \"source\"\n").unwrap();
    assert!(engine.evaluate_str("mv /etc/app.conf ./app.conf").is_block());
    assert!(engine.evaluate_str("mv ./app.conf /etc/app.conf").is_allow());
}

#[test]
fn test_custom_wrappers() {
    let engine = engine_from("[shell]\nwrappers = [\"with-lock\"]\n").unwrap();
    assert!(engine.evaluate_str("with-lock rm /etc/hosts").is_block());
}

// ============================================================================
// Config discovery
// ============================================================================

#[test]
fn test_load_from_env() {
    let file = write_config("[general]\nsafety_level = \"strict\"\naudit_log = false\n");
    std::env::set_var(CONFIG_ENV, file.path());
    let config = Config::load();
    std::env::remove_var(CONFIG_ENV);

    let config = config.unwrap();
    assert_eq!(config.general.safety_level, SafetyLevel::Strict);
    assert!(config.audit_path().is_none());
}
