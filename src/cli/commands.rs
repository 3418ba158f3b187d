//! CLI command definitions

use crate::core::{config::PipelineConfig, ConfigurationError};
use crate::execution::SchedulingStrategy;
use clap::Args;
use std::path::{Path, PathBuf};

/// Where the pipeline definition comes from
#[derive(Debug, Args, Clone)]
pub struct PipelineSource {
    /// Path to pipeline YAML file (defaults to ./qgate.yml, then the built-in gate)
    #[arg(short, long, env = "QGATE_FILE")]
    pub file: Option<PathBuf>,

    /// Source tree to validate
    #[arg(short = 'C', long, default_value = ".")]
    pub dir: PathBuf,
}

impl PipelineSource {
    /// Load the definition this source points at
    pub fn load(&self) -> Result<PipelineConfig, ConfigurationError> {
        PipelineConfig::discover(self.file.as_deref(), &self.dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Run the full pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    #[command(flatten)]
    pub source: PipelineSource,

    /// Only run the named environments (repeatable)
    #[arg(long = "only", value_name = "ENV")]
    pub only: Vec<String>,

    /// Scheduling strategy for jobs
    #[arg(long, value_enum, default_value_t = SchedulingStrategyArg::Parallel)]
    pub strategy: SchedulingStrategyArg,

    /// Concurrent jobs for the parallel-limited strategy
    #[arg(long, default_value_t = 2)]
    pub max_jobs: usize,

    /// Print the run verdict as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunCommand {
    pub fn scheduling_strategy(&self) -> SchedulingStrategy {
        match self.strategy {
            SchedulingStrategyArg::Sequential => SchedulingStrategy::Sequential,
            SchedulingStrategyArg::Parallel => SchedulingStrategy::Parallel,
            SchedulingStrategyArg::ParallelLimited => SchedulingStrategy::LimitedParallel(self.max_jobs),
        }
    }
}

/// Run the local gate
#[derive(Debug, Args, Clone)]
pub struct PrePushCommand {
    #[command(flatten)]
    pub source: PipelineSource,

    /// Git passes the remote name and URL to pre-push hooks; they are ignored
    #[arg(hide = true, num_args = 0..)]
    pub hook_args: Vec<String>,
}

/// Validate a pipeline definition
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    #[command(flatten)]
    pub source: PipelineSource,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show the matrix expansion
#[derive(Debug, Args, Clone)]
pub struct PlanCommand {
    #[command(flatten)]
    pub source: PipelineSource,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Install the git pre-push hook
#[derive(Debug, Args, Clone)]
pub struct InstallHookCommand {
    /// Repository root containing `.git`
    #[arg(short = 'C', long, default_value = ".")]
    pub dir: PathBuf,

    /// Overwrite an existing pre-push hook
    #[arg(long)]
    pub force: bool,
}

/// Scheduling strategy argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SchedulingStrategyArg {
    Sequential,
    Parallel,
    #[clap(name = "parallel-limited")]
    ParallelLimited,
}
