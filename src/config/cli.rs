use crate::config::toml_config::DEFAULT_CONFIG_PATH;
use crate::core::tasks::Task;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "booking-ops")]
#[command(about = "Task runner for the hotel booking API stack")]
pub struct OpsCli {
    /// Path to ops configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Print the commands without executing them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Decline confirmations and skip pauses instead of reading stdin
    #[arg(long, global = true)]
    pub non_interactive: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: OpsCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum OpsCommand {
    /// List every task with its description
    List,
    /// Install application and development dependencies
    Install,
    /// Run the API locally with auto-reload
    Dev,
    /// Run the test suite
    Test,
    /// Run the test suite with coverage reports
    TestCov,
    /// Run linters and type checks
    Lint,
    /// Format the code base
    Format,
    /// Remove caches and build artifacts
    Clean,
    /// Build container images
    Build,
    /// Start the stack in the background
    Start,
    /// Stop the stack
    Stop,
    /// Restart the stack
    Restart,
    /// Follow the stack logs
    Logs,
    /// Open a shell in the API container
    Shell,
    /// Create tables and initial data
    DbInit,
    /// Drop and recreate the database (asks for confirmation)
    DbReset,
    /// Apply schema migrations
    DbMigrate,
    /// Open psql in the database container
    DbShell,
    /// Dump the database to backups/backup_<timestamp>.sql
    Backup,
    /// Restore the database from a dump (asks for confirmation)
    Restore {
        /// Dump file to restore; prompted for when omitted
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Deploy the production stack
    DeployProd,
    /// Run security scanners
    SecurityScan,
    /// Run the load test
    PerfTest,
    /// Show where the API documentation is served
    Docs,
    /// Create .env from its template when missing
    SetupEnv,
    /// Format, lint and test
    Quality,
    /// Install dependencies, create .env and build images
    Setup,
}

impl OpsCommand {
    /// `List` has no task counterpart.
    pub fn task(&self) -> Option<Task> {
        let task = match self {
            OpsCommand::List => return None,
            OpsCommand::Install => Task::Install,
            OpsCommand::Dev => Task::Dev,
            OpsCommand::Test => Task::Test,
            OpsCommand::TestCov => Task::TestCov,
            OpsCommand::Lint => Task::Lint,
            OpsCommand::Format => Task::Format,
            OpsCommand::Clean => Task::Clean,
            OpsCommand::Build => Task::Build,
            OpsCommand::Start => Task::Start,
            OpsCommand::Stop => Task::Stop,
            OpsCommand::Restart => Task::Restart,
            OpsCommand::Logs => Task::Logs,
            OpsCommand::Shell => Task::Shell,
            OpsCommand::DbInit => Task::DbInit,
            OpsCommand::DbReset => Task::DbReset,
            OpsCommand::DbMigrate => Task::DbMigrate,
            OpsCommand::DbShell => Task::DbShell,
            OpsCommand::Backup => Task::Backup,
            OpsCommand::Restore { file } => Task::Restore { file: file.clone() },
            OpsCommand::DeployProd => Task::DeployProd,
            OpsCommand::SecurityScan => Task::SecurityScan,
            OpsCommand::PerfTest => Task::PerfTest,
            OpsCommand::Docs => Task::Docs,
            OpsCommand::SetupEnv => Task::SetupEnv,
            OpsCommand::Quality => Task::Quality,
            OpsCommand::Setup => Task::Setup,
        };
        Some(task)
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "deploy")]
#[command(about = "Tear down, rebuild and verify the Compose stack")]
pub struct DeployArgs {
    /// Target environment; "production" adds the overlay file
    #[arg(default_value = "development")]
    pub environment: String,

    /// Purge images and volumes before rebuilding
    #[arg(default_value = "false", action = clap::ArgAction::Set, value_parser = clap::builder::BoolishValueParser::new())]
    pub fresh_build: bool,

    /// Path to ops configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Print the deployment plan without executing it
    #[arg(long)]
    pub dry_run: bool,

    /// Do not wait for the operator after creating .env
    #[arg(long)]
    pub non_interactive: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "entrypoint")]
#[command(about = "Wait for dependencies, migrate, seed, then exec the service")]
pub struct EntrypointArgs {
    /// Path to ops configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Give up waiting for a dependency after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to exec once the container is ready
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}
