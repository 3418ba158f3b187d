//! Command-line interface

pub mod commands;
pub mod hook;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{InstallHookCommand, PlanCommand, PrePushCommand, RunCommand, ValidateCommand};
use std::ffi::OsString;

/// Quality-gate pipeline runner
#[derive(Debug, Parser, Clone)]
#[command(name = "qgate")]
#[command(version)]
#[command(about = "Run a quality-gate pipeline across an environment matrix", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log line format
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the full pipeline across every environment
    Run(RunCommand),

    /// Run the local gate; exits non-zero to reject a push
    PrePush(PrePushCommand),

    /// Validate a pipeline definition
    Validate(ValidateCommand),

    /// Show the jobs a run would execute, without running them
    Plan(PlanCommand),

    /// Install a git pre-push hook that runs the local gate
    InstallHook(InstallHookCommand),
}

/// Format of log lines written to stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
