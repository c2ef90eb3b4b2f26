//! sitegate - command-line front end for sitegate page authentication.
//!
//! Logs in against the published credential sheet, keeps the session
//! marker in the cache directory, and answers page access checks.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use sitegate_core::auth::page_name;
use sitegate_core::utils::{short_hash, truncate_string};
use sitegate_core::{
    Config, CredentialVerifier, FileStore, GateDecision, LoginOutcome, SessionGate, SheetClient,
};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Directory for rolling log files; stderr only when unset
const ENV_LOG_DIR: &str = "SITEGATE_LOG_DIR";

const LOG_FILE_PREFIX: &str = "sitegate.log";

/// Roles come from an editable session file; keep status output to one line
const MAX_ROLE_DISPLAY_LEN: usize = 32;

const USAGE: &str = "\
Usage: sitegate <command>

Commands:
  login [username]   Verify credentials and start a session
  logout             End the current session
  check <path>       Check whether the page at <path> may render
  status             Show the current session
  hash <password>    Print the salted digest of a password for the credential sheet
  hash --user <name> Print the salted digest of a username (trimmed, as at login)";

type Gate = SessionGate<SheetClient, FileStore>;

/// Initialize the tracing subscriber for logging.
/// The returned guard flushes the file writer on drop.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(ENV_LOG_DIR) {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn build_gate(config: &Config) -> Result<Gate> {
    let client = SheetClient::from_config(config)?;
    let verifier = CredentialVerifier::from_config(client, config);
    let store = FileStore::new(config.cache_dir()?);
    Ok(SessionGate::from_config(verifier, store, config))
}

fn prompt_username() -> Result<String> {
    print!("Username: ");
    io::stdout().flush()?;

    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    Ok(username.trim().to_string())
}

async fn login(gate: &Gate, username: Option<&String>) -> Result<ExitCode> {
    let username = match username {
        Some(name) => name.clone(),
        None => prompt_username()?,
    };
    let password = rpassword::prompt_password("Password: ")
        .context("Failed to read password")?;

    if username.is_empty() || password.is_empty() {
        eprintln!("Please enter both username and password");
        return Ok(ExitCode::FAILURE);
    }

    match gate.login(&username, &password).await? {
        LoginOutcome::Success { role, redirect } => {
            println!("Logged in as {} - continue to {}", role, redirect);
            Ok(ExitCode::SUCCESS)
        }
        LoginOutcome::Failure { message, .. } => {
            eprintln!("{}", message);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn check(gate: &Gate, path: &str) -> ExitCode {
    match gate.check_auth(path) {
        GateDecision::Proceed => {
            println!("proceed");
            ExitCode::SUCCESS
        }
        GateDecision::Redirect(page) => {
            info!(page = page_name(path), redirect = %page, "Page access redirected");
            println!("redirect {}", page);
            ExitCode::FAILURE
        }
    }
}

fn status(gate: &Gate) {
    match gate.current_session() {
        Some(session) => println!(
            "logged in: role={} user={}",
            truncate_string(&session.role, MAX_ROLE_DISPLAY_LEN),
            short_hash(&session.user_hash)
        ),
        None => println!("not logged in"),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        eprintln!("{}", USAGE);
        return Ok(ExitCode::FAILURE);
    };

    let mut config = Config::load()?;
    config.apply_env();
    if config.uses_default_salt() {
        warn!("Using the built-in salt; set one in config.json or SITEGATE_SALT");
    }

    let gate = build_gate(&config)?;

    match command.as_str() {
        "login" => login(&gate, args.get(2)).await,
        "logout" => {
            let redirect = gate.logout()?;
            println!("Logged out - continue to {}", redirect);
            Ok(ExitCode::SUCCESS)
        }
        "check" => {
            let path = args.get(2).map(String::as_str).unwrap_or("/");
            Ok(check(&gate, path))
        }
        "status" => {
            status(&gate);
            Ok(ExitCode::SUCCESS)
        }
        "hash" => {
            let digest = match (args.get(2).map(String::as_str), args.get(3)) {
                (Some("--user"), Some(name)) => gate.verifier().username_hash(name),
                (Some(value), None) if value != "--user" => gate.verifier().hash(value),
                _ => {
                    eprintln!("{}", USAGE);
                    return Ok(ExitCode::FAILURE);
                }
            };
            match digest {
                Some(digest) => {
                    println!("{}", digest);
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("Secure hashing is not supported ({})", config.hash_algorithm);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(ExitCode::SUCCESS)
        }
        other => {
            eprintln!("Unknown command: {}\n\n{}", other, USAGE);
            Ok(ExitCode::FAILURE)
        }
    }
}
