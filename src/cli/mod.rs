//! CLI module for the AI Meals client.
//!
//! - Argument parsing
//! - Command handlers driving the session core
//!
//! # Usage
//!
//! ```ignore
//! use aimeals::cli::{parse_args, run_cli_command};
//!
//! let command = parse_args(std::env::args());
//! if let Err(e) = run_cli_command(command) {
//!     eprintln!("Error: {}", e);
//!     std::process::exit(1);
//! }
//! ```

pub mod args;
pub mod commands;

pub use args::{parse_args, CliCommand, USAGE};

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::sync::Arc;

use crate::adapters::ReqwestHttpClient;
use crate::auth::{AuthApi, NewAccount};
use crate::error::{AppError, AppResult, AuthError};
use crate::startup::{build_session, AppConfig};

/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a parsed command to completion.
///
/// Commands that need the network run on a fresh tokio runtime. Domain
/// errors are turned into a report carrying the user-facing message and a
/// recovery hint.
pub fn run_cli_command(command: CliCommand) -> Result<()> {
    match command {
        CliCommand::Version => {
            println!("aimeals {}", VERSION);
            Ok(())
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            Ok(())
        }
        CliCommand::Usage(message) => {
            eprintln!("{}", USAGE);
            Err(eyre!(message))
        }
        command => {
            let config = AppConfig::from_env().map_err(AppError::from).map_err(report)?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime
                .block_on(execute(command, &config))
                .map_err(report)
        }
    }
}

fn report(err: AppError) -> color_eyre::Report {
    eyre!(
        "{}\nHint: {}",
        err.user_message(),
        err.category().recovery_hint()
    )
}

async fn execute(command: CliCommand, config: &AppConfig) -> AppResult<()> {
    if command == CliCommand::Health {
        let http = ReqwestHttpClient::new().with_default_timeout(config.request_timeout);
        let api = AuthApi::new(&config.api_base_url, Arc::new(http));
        commands::health(&api).await?;
        return Ok(());
    }

    let session = build_session(config).await?;
    match command {
        CliCommand::Login { email } => {
            let password = commands::prompt_password("Password: ")?;
            commands::login(&session, &email, &password).await?;
        }
        CliCommand::Signup {
            email,
            first_name,
            last_name,
        } => {
            let password = commands::prompt_password("Choose a password: ")?;
            let confirm = commands::prompt_password("Confirm password: ")?;
            if password != confirm {
                return Err(AuthError::SignupFailed {
                    message: "Passwords do not match".to_string(),
                }
                .into());
            }
            let account = NewAccount {
                email,
                password,
                first_name,
                last_name,
            };
            commands::signup(&session, account).await?;
        }
        CliCommand::Logout => commands::logout(&session).await,
        CliCommand::Status => commands::status(&session).await,
        CliCommand::Whoami => {
            commands::whoami(&session).await?;
        }
        CliCommand::Fetch { path, method, data } => {
            commands::fetch(&session, &config.login_path, &path, method, data).await?;
        }
        CliCommand::Health
        | CliCommand::Version
        | CliCommand::Help
        | CliCommand::Usage(_) => {}
    }
    Ok(())
}
