use anyhow::{Context, Result};
use qgate::cli::commands::{
    InstallHookCommand, PlanCommand, PrePushCommand, RunCommand, ValidateCommand,
};
use qgate::cli::hook::install_hook;
use qgate::cli::output::*;
use qgate::cli::{Cli, Command, LogFormat};
use qgate::core::{ConfigurationError, JobState, EXIT_CONFIGURATION, EXIT_FAILURE};
use qgate::execution::{EventBus, ExecutionEngine, ExecutionEvent, LocalGate, MatrixExpander};
use qgate::invoker::ProcessInvoker;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();
    init_tracing(cli.verbose, cli.log_format)?;

    let cancel = CancellationToken::new();
    let shutdown = shutdown_signal()?;
    let signal = cancel.clone();
    tokio::spawn(async move {
        shutdown.await;
        warn!("Shutdown signal received, cancelling run");
        signal.cancel();
    });

    let result = match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd, &cancel).await,
        Command::PrePush(cmd) => pre_push(cmd, &cancel).await,
        Command::Validate(cmd) => validate_pipeline(cmd),
        Command::Plan(cmd) => plan_pipeline(cmd),
        Command::InstallHook(cmd) => install_pre_push_hook(cmd),
    };

    let code = match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {}", CROSS, style(format!("{:#}", err)).red());
            if err.chain().any(|cause| cause.is::<ConfigurationError>()) {
                EXIT_CONFIGURATION
            } else {
                EXIT_FAILURE
            }
        }
    };
    std::process::exit(code)
}

/// Logs go to stderr so `--json` output on stdout stays machine-readable
fn init_tracing(verbose: bool, format: LogFormat) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr).json())
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    }
    .context("Failed to set logging subscriber")
}

/// Resolves on the first SIGINT or SIGTERM
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()> + Send + 'static> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to register SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to register SIGINT handler")?;
    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()> + Send + 'static> {
    Ok(async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    })
}

async fn run_pipeline(cmd: &RunCommand, cancel: &CancellationToken) -> Result<i32> {
    let config = cmd
        .source
        .load()
        .context("Failed to load pipeline definition")?;
    let pipeline = config.to_pipeline()?.restrict_to(&cmd.only)?;

    let invoker = ProcessInvoker::new().with_working_dir(cmd.source.dir());
    let engine = ExecutionEngine::new(invoker, cmd.scheduling_strategy());

    if !cmd.json {
        engine
            .add_event_handler(|event| println!("{}", format_execution_event(&event)))
            .await;
    }

    let verdict = engine.execute(&pipeline, cancel).await?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        println!("\n{}", format_verdict(&verdict));
    }

    Ok(verdict.exit_code())
}

async fn pre_push(cmd: &PrePushCommand, cancel: &CancellationToken) -> Result<i32> {
    let config = cmd
        .source
        .load()
        .context("Failed to load pipeline definition")?;
    let pipeline = config.to_pipeline()?;
    let gate = LocalGate::from_pipeline(&pipeline)?;

    if gate.is_empty() {
        println!("{} No local gate steps in {}; push allowed", WARN, style(gate.pipeline()).bold());
        return Ok(0);
    }

    let spinner = create_spinner(format!("Local gate: {}", gate.step_names().join(", ")));
    let events = EventBus::new();
    let progress = spinner.clone();
    events
        .subscribe(move |event| match &event {
            ExecutionEvent::StepStarted { step, command, .. } => {
                progress.set_message(format!("{} {}", step, style(command).dim()));
            }
            ExecutionEvent::StepFinished { .. } => {
                progress.println(format_execution_event(&event));
            }
            _ => {}
        })
        .await;

    let invoker = Arc::new(ProcessInvoker::new().with_working_dir(cmd.source.dir()));
    let report = gate.run(invoker, events, cancel).await;
    spinner.finish_and_clear();

    match &report.state {
        JobState::Passed => println!("{} Local gate passed; push allowed", CHECK),
        JobState::Aborted { .. } => println!("{} Local gate aborted; push rejected", STOP),
        _ => {
            if let Some(failing) = report.failing_step() {
                println!("{}", format_failure("local", failing));
            }
            println!("{} Local gate failed; push rejected", CROSS);
        }
    }

    Ok(report.exit_code())
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<i32> {
    if !cmd.json {
        println!("{} Validating pipeline...", INFO);
    }

    let config = cmd
        .source
        .load()
        .context("Pipeline definition is invalid")?;
    let pipeline = config.to_pipeline()?;
    let gate = LocalGate::from_pipeline(&pipeline)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(0);
    }

    println!("{} Pipeline definition is valid!", CHECK);
    println!("  Name: {}", style(&pipeline.name).bold());
    println!("  Steps: {}", style(pipeline.steps.len()).cyan());
    println!("  Environments: {}", style(pipeline.matrix.len()).cyan());
    println!("  Local gate: {}", style(gate.step_names().join(", ")).cyan());
    Ok(0)
}

fn plan_pipeline(cmd: &PlanCommand) -> Result<i32> {
    let config = cmd
        .source
        .load()
        .context("Failed to load pipeline definition")?;
    let pipeline = config.to_pipeline()?;
    let jobs = MatrixExpander::expand(&pipeline)?;
    let gate = LocalGate::from_pipeline(&pipeline)?;

    if cmd.json {
        let data = serde_json::json!({
            "pipeline": pipeline.name,
            "jobs": jobs
                .iter()
                .map(|job| serde_json::json!({
                    "environment": job.environment,
                    "steps": job.step_names(),
                }))
                .collect::<Vec<_>>(),
            "local_gate": gate.step_names(),
        });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        print!("{}", format_plan(&pipeline.name, &jobs, &gate));
    }
    Ok(0)
}

fn install_pre_push_hook(cmd: &InstallHookCommand) -> Result<i32> {
    let path = install_hook(&cmd.dir, cmd.force)?;
    println!("{} Installed pre-push hook at {}", CHECK, style(path.display()).bold());
    Ok(0)
}
