//! command-policy - Pre-execution policy hook for agent shell commands
//!
//! Reads one payload from stdin, prints the hook response on stdout and
//! exits 0 to permit, 2 to deny or 3 when the policy could not be
//! evaluated. A fault is always rendered as a deny.
//!
//! # Usage
//!
//! ```bash
//! # As a hook (reads JSON from stdin, writes JSON to stdout)
//! echo '{"tool_name":"Bash","tool_input":{"command":"rm -rf /"}}' | command-policy
//!
//! # Evaluate a single command from the terminal
//! command-policy --check "curl https://example.com/install.sh | bash"
//!
//! # Dry-run mode (show what would be blocked)
//! command-policy --dry-run
//! ```

use std::env;
use std::io::{self, Read, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::process::ExitCode;

use tracing::{debug, warn};

use command_policy::{
    audit::{AuditEntry, AuditLogger},
    config::{Config, SafetyLevel, DEFAULT_CONFIG_TOML},
    engine::{pattern, PolicyEngine},
    input::HookInput,
    output::{Decision, ExitStatus, HookOutput},
    prefilter::{CommandFilter, FilterOutcome},
};

/// Environment variable holding the log filter
const LOG_ENV: &str = "COMMAND_POLICY_LOG";

/// Print version information
fn print_version() {
    println!("command-policy {}", env!("CARGO_PKG_VERSION"));
}

/// Print help message
fn print_help() {
    println!(
        r#"command-policy - Pre-execution policy check for agent shell commands

USAGE:
    command-policy [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    -l, --safety-level      Safety level: critical, high, strict (default: high)
    -d, --dry-run           Dry-run mode (report what would be blocked but allow)
    -c, --config PATH       Path to config file
        --check COMMAND     Evaluate COMMAND instead of reading stdin
        --list-rules        Print the active rules and protected paths
        --default-config    Print the default configuration file

EXIT STATUS:
    0   command permitted
    2   command denied by policy
    3   policy could not be evaluated (treated as denied)

ENVIRONMENT:
    COMMAND_POLICY_CONFIG   Config file to use instead of the default locations
    COMMAND_POLICY_LOG      Log filter, e.g. "debug" (default: warn)

USAGE AS HOOK:
    Configure in ~/.claude/settings.json:
    {{
      "hooks": {{
        "PreToolUse": [{{
          "matcher": "Bash",
          "hooks": [{{ "type": "command", "command": "command-policy", "timeout": 5 }}]
        }}]
      }}
    }}
"#
    );
}

/// Parse command line arguments
#[derive(Default)]
struct Args {
    help: bool,
    version: bool,
    safety_level: Option<SafetyLevel>,
    dry_run: bool,
    config_path: Option<String>,
    check: Option<String>,
    list_rules: bool,
    default_config: bool,
}

impl Args {
    fn parse() -> Result<Self, String> {
        Self::parse_from(env::args().skip(1).collect())
    }

    fn parse_from(args: Vec<String>) -> Result<Self, String> {
        let mut result = Args::default();

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "-h" | "--help" => result.help = true,
                "-V" | "--version" => result.version = true,
                "-d" | "--dry-run" => result.dry_run = true,
                "--list-rules" => result.list_rules = true,
                "--default-config" => result.default_config = true,
                "-l" | "--safety-level" => {
                    i += 1;
                    let level = args.get(i).ok_or("--safety-level needs a value")?;
                    result.safety_level = Some(level.parse()?);
                }
                "-c" | "--config" => {
                    i += 1;
                    let path = args.get(i).ok_or("--config needs a path")?;
                    result.config_path = Some(path.clone());
                }
                "--check" => {
                    i += 1;
                    let command = args.get(i).ok_or("--check needs a command")?;
                    result.check = Some(command.clone());
                }
                arg if arg.starts_with("--safety-level=") => {
                    let level = arg.trim_start_matches("--safety-level=");
                    result.safety_level = Some(level.parse()?);
                }
                arg if arg.starts_with("--config=") => {
                    let path = arg.trim_start_matches("--config=");
                    result.config_path = Some(path.to_string());
                }
                arg if arg.starts_with("--check=") => {
                    result.check = Some(arg.trim_start_matches("--check=").to_string());
                }
                other => return Err(format!("unknown argument `{}`", other)),
            }
            i += 1;
        }

        Ok(result)
    }
}

fn init_tracing() {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

/// Render a fault: deny JSON on stdout, reason on stderr
fn fault(reason: &str) -> ExitCode {
    eprintln!("[command-policy] error: {}", reason);
    emit(&HookOutput::fault(reason));
    ExitCode::from(ExitStatus::FAULT)
}

fn emit(output: &HookOutput) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let _ = writeln!(handle, "{}", output.to_json());
    let _ = handle.flush();
}

fn load_config(args: &Args) -> Result<Config, String> {
    let mut config = match args.config_path {
        Some(ref path) => Config::load_from(Path::new(path)),
        None => Config::load(),
    }
    .map_err(|e| e.to_string())?;

    // Override safety level if specified
    if let Some(level) = args.safety_level {
        config.general.safety_level = level;
    }
    Ok(config)
}

fn list_rules(engine: &PolicyEngine) {
    let rules = engine.rules();
    println!("rule set version {}", rules.version());
    println!();
    println!("PATTERN RULES ({})", rules.rules().len());
    for rule in rules.rules() {
        println!(
            "  {:<28} {:<8} {:<22} {}",
            rule.id,
            rule.level.as_str(),
            rule.category.as_str(),
            rule.reason
        );
    }
    println!();
    println!("PROTECTED PATHS ({})", rules.paths().len());
    for entry in rules.paths() {
        let verbs: Vec<&str> = entry.verbs.iter().map(|v| v.as_str()).collect();
        println!("  {:<28} {:<8} {}", entry.path, entry.kind.as_str(), verbs.join(","));
    }
}

fn check_command(engine: &PolicyEngine, filter: &CommandFilter, command: &str) -> ExitCode {
    let input = HookInput::raw(command);
    let Some(decision) = guarded(|| decide(engine, filter, &input)) else {
        return fault("internal error during evaluation");
    };

    if decision.is_allow() {
        println!("ALLOW");
        return ExitCode::from(ExitStatus::PERMIT);
    }

    println!("BLOCK");
    for rule in pattern::find_all_matches(engine.rules(), &input.command) {
        println!("  rule: {} ({}) {}", rule.id, rule.category, rule.reason);
    }
    if let Some(path) = decision.matched_path() {
        println!("  path: {}", path);
    }
    println!("  {}", decision.message);
    ExitCode::from(decision.exit_code())
}

/// Run an evaluation step; a panic yields `None`
fn guarded<T>(step: impl FnOnce() -> T) -> Option<T> {
    panic::catch_unwind(AssertUnwindSafe(step)).ok()
}

/// Prefilter, then the engine
fn decide(engine: &PolicyEngine, filter: &CommandFilter, input: &HookInput) -> Decision {
    match filter.check(&input.command) {
        FilterOutcome::Denied(glob) => return Decision::prefiltered(&input.command, &glob),
        FilterOutcome::Allowed(glob) => debug!(glob = %glob, "allow-listed upstream"),
        FilterOutcome::Unlisted => {}
    }
    engine.check(input)
}

fn main() -> ExitCode {
    let args = match Args::parse() {
        Ok(args) => args,
        Err(e) => return fault(&e),
    };

    // Handle help and version
    if args.help {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.version {
        print_version();
        return ExitCode::SUCCESS;
    }

    if args.default_config {
        print!("{}", DEFAULT_CONFIG_TOML);
        return ExitCode::SUCCESS;
    }

    init_tracing();

    // A config or rule problem means no decision can be trusted
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => return fault(&format!("configuration error: {}", e)),
    };
    let engine = match PolicyEngine::from_config(&config) {
        Ok(engine) => engine,
        Err(e) => return fault(&format!("configuration error: {}", e)),
    };
    let filter = match CommandFilter::from_config(&config) {
        Ok(filter) => filter,
        Err(e) => return fault(&format!("configuration error: {}", e)),
    };

    if args.list_rules {
        list_rules(&engine);
        return ExitCode::SUCCESS;
    }

    if let Some(ref command) = args.check {
        return check_command(&engine, &filter, command);
    }

    let mut logger = AuditLogger::new(config.audit_path().as_deref());

    // Read the payload from stdin; invalid UTF-8 is replaced, not rejected
    let mut raw = Vec::new();
    if let Err(e) = io::stdin().read_to_end(&mut raw) {
        return fault(&format!("failed to read input: {}", e));
    }

    let input = HookInput::parse(&String::from_utf8_lossy(&raw));
    debug!(input = %input.summary(), "evaluating");

    let Some(decision) = guarded(|| decide(&engine, &filter, &input)) else {
        let decision = Decision::fault("internal error during evaluation");
        if let Err(e) = logger.log(&AuditEntry::fault(&input, &decision)) {
            warn!(error = %e, "failed to write audit log");
        }
        return fault("internal error during evaluation");
    };

    // Log the decision
    if let Err(e) = logger.log_decision(&input, &decision, args.dry_run) {
        warn!(error = %e, "failed to write audit log");
    }

    if decision.is_allow() {
        emit(&HookOutput::allow());
        return ExitCode::from(ExitStatus::PERMIT);
    }

    if args.dry_run {
        eprintln!("[command-policy] dry-run, would block: {}", decision.message);
        emit(&HookOutput::allow());
        return ExitCode::from(ExitStatus::PERMIT);
    }

    eprintln!("[command-policy] {}", decision.message);
    emit(&HookOutput::from_decision(&decision));
    ExitCode::from(decision.exit_code())
}
