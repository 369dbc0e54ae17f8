// ABOUTME: Main library for the employee records console
// ABOUTME: Contains startup (CLI, logging, config), the Outcome type and module declarations

use anyhow::Context;
use clap::{CommandFactory, FromArgMatches, Parser};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub mod commands;
pub mod config;
pub mod console;
pub mod db;
pub mod models;

use config::AppConfig;
use db::{DbError, EmployeeStore, SqlServerProvider};
use models::EmployeeId;

/// Environment variable that overrides the active profile's password
pub const PASSWORD_ENV: &str = "EMPLOYEE_RECORDS_PASSWORD";

/// Result of one console-initiated operation
#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    /// The operation ran but the requested employee does not exist
    NotFound,
    Failed(DbError),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// The successful value, if any. Failed queries never expose partial data.
    pub fn into_option(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::NotFound | Outcome::Failed(_) => None,
        }
    }
}

impl Outcome<EmployeeId> {
    /// The new id, or -1 for callers that still expect the sentinel
    pub fn legacy_id(&self) -> i64 {
        match self {
            Outcome::Success(id) => id.0,
            Outcome::NotFound | Outcome::Failed(_) => -1,
        }
    }
}

/// Console client for the employee stored procedures
#[derive(Debug, Parser)]
#[command(name = "employee-records", version, about)]
pub struct Cli {
    /// Config file to use instead of the per-user default
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Connection profile to use instead of the configured active one
    #[arg(long)]
    pub profile: Option<String>,
    /// Log informational messages to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The shared flags presented under another binary's name
    pub fn command_named(name: &'static str, about: &'static str) -> clap::Command {
        Cli::command().name(name).bin_name(name).about(about)
    }

    /// Parse the process arguments for a companion binary
    pub fn parse_named(name: &'static str, about: &'static str) -> Self {
        let matches = Self::command_named(name, about).get_matches();
        Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }
}

/// Install the stderr log subscriber; `RUST_LOG` wins over `verbose`
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "error" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Load the config selected on the command line and apply overrides
pub fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::load().context("Failed to load config")?,
    };

    if let Some(profile) = &cli.profile {
        config.select_profile(profile)?;
    }
    config.apply_password_override(std::env::var(PASSWORD_ENV).ok())?;
    Ok(config)
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let profile = config.active_profile()?.clone();
    log::info!(
        "Using profile {} ({}:{}/{})",
        config.active_profile,
        profile.host,
        profile.port,
        profile.database
    );

    let store = EmployeeStore::new(SqlServerProvider::new(
        profile,
        config.preferences.schema.clone(),
    ));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let mut console = console::Console::new(io::stdin().lock(), io::stdout());
    runtime
        .block_on(console::menu::run(
            &store,
            &mut console,
            &config.preferences.confirm_token,
        ))
        .context("Console I/O failed")?;
    Ok(())
}
