//! CLI output formatting

use crate::{
    core::{Job, JobReport, JobState, RunVerdict, Step, StepOutcome, StepRecord, Verdict},
    execution::{ExecutionEvent, LocalGate},
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static STOP: Emoji<'_, '_> = Emoji("🛑 ", "x ");

/// Create a spinner for a long-running phase
pub fn create_spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// A horizontal rule spanning the terminal width
pub fn separator() -> String {
    let width = term_size::dimensions_stdout().map(|(w, _)| w).unwrap_or(80);
    "─".repeat(width)
}

/// Format a step outcome for display
pub fn format_step_outcome(outcome: StepOutcome) -> String {
    match outcome {
        StepOutcome::Passed => style("PASSED").green().to_string(),
        StepOutcome::Failed => style("FAILED").red().to_string(),
        StepOutcome::Aborted => style("ABORTED").yellow().to_string(),
    }
}

/// Format a job state for display
pub fn format_job_state(state: &JobState) -> String {
    match state {
        JobState::Passed => style("PASSED").green().to_string(),
        JobState::Failed { step } => format!("{} at {}", style("FAILED").red(), style(step).bold()),
        JobState::Aborted { step: Some(step) } => {
            format!("{} during {}", style("ABORTED").yellow(), style(step).bold())
        }
        JobState::Aborted { step: None } => style("ABORTED").yellow().to_string(),
    }
}

pub fn format_duration_ms(ms: i64) -> String {
    let ms = ms.max(0);
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{}m {}s", ms / 60_000, (ms % 60_000) / 1000)
    }
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::RunStarted { run_id, pipeline, jobs } => format!(
            "{} Running {} on {} ({})",
            ROCKET,
            style(pipeline).bold(),
            style(jobs.join(", ")).cyan(),
            style(&run_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::JobStarted { environment, steps } => format!(
            "{} [{}] {} step(s): {}",
            INFO,
            style(environment).cyan(),
            steps.len(),
            style(steps.join(" → ")).dim()
        ),
        ExecutionEvent::StepStarted {
            environment,
            step,
            command,
        } => format!(
            "{} [{}] {} {}",
            SPINNER,
            style(environment).cyan(),
            style(step).bold(),
            style(command).dim()
        ),
        ExecutionEvent::StepFinished { environment, record } => {
            let icon = match record.outcome {
                StepOutcome::Passed => CHECK,
                StepOutcome::Failed => CROSS,
                StepOutcome::Aborted => STOP,
            };
            format!(
                "{} [{}] {} {} ({})",
                icon,
                style(environment).cyan(),
                style(&record.name).bold(),
                format_step_outcome(record.outcome),
                style(format_duration_ms(record.duration_ms())).dim()
            )
        }
        ExecutionEvent::JobFinished { environment, state } => {
            let icon = match state {
                JobState::Passed => CHECK,
                JobState::Aborted { .. } => STOP,
                _ => CROSS,
            };
            format!("{} [{}] job {}", icon, style(environment).cyan(), format_job_state(state))
        }
        ExecutionEvent::RunFinished { run_id, verdict } => format!(
            "{} Run {} {}",
            INFO,
            style(&run_id.to_string()[..8]).dim(),
            format_verdict_word(*verdict)
        ),
    }
}

fn format_verdict_word(verdict: Verdict) -> String {
    match verdict {
        Verdict::Pass => style("passed").green().to_string(),
        Verdict::Fail => style("failed").red().to_string(),
    }
}

/// Full captured output of the step that stopped a job
pub fn format_failure(environment: &str, record: &StepRecord) -> String {
    let mut out = format!(
        "{} {} in {}: {}\n  exit code: {}\n",
        CROSS,
        style(&record.name).red().bold(),
        style(environment).cyan(),
        style(&record.command).dim(),
        record
            .exit_code
            .map_or_else(|| "none".to_string(), |c| c.to_string())
    );
    out.push_str(&separator());
    out.push('\n');
    let output = record.output();
    if output.is_empty() {
        out.push_str(&style("(no output)").dim().to_string());
    } else {
        out.push_str(&output);
    }
    out.push('\n');
    out.push_str(&separator());
    out
}

/// Per-job summary lines plus failure dumps for a finished job
pub fn format_job_report(report: &JobReport) -> String {
    let mut out = format!(
        "  {} {} ({} step(s), {})",
        style(&report.environment).cyan().bold(),
        format_job_state(&report.state),
        report.steps.len(),
        format_duration_ms((report.finished_at - report.started_at).num_milliseconds())
    );
    if let Some(failing) = report.failing_step() {
        if failing.outcome == StepOutcome::Failed {
            out.push('\n');
            out.push_str(&format_failure(&report.environment, failing));
        }
    }
    out
}

/// Final summary of a run
pub fn format_verdict(verdict: &RunVerdict) -> String {
    let mut out = String::new();
    for job in &verdict.jobs {
        out.push_str(&format_job_report(job));
        out.push('\n');
    }
    let icon = if verdict.passed() { CHECK } else { CROSS };
    out.push_str(&format!(
        "\n{} {} {}",
        icon,
        style(&verdict.pipeline).bold(),
        format_verdict_word(verdict.verdict)
    ));
    if verdict.aborted() {
        out.push_str(&format!(" {}", style("(aborted)").yellow()));
    }
    out
}

/// Matrix expansion and local gate, as a human-readable plan
pub fn format_plan(pipeline: &str, jobs: &[Job], gate: &LocalGate) -> String {
    let mut out = format!("{} Plan for {}\n", INFO, style(pipeline).bold());
    for job in jobs {
        out.push_str(&format!(
            "\n  {} ({} step(s))\n",
            style(&job.environment.name).cyan().bold(),
            job.steps.len()
        ));
        for (index, step) in job.steps.iter().enumerate() {
            out.push_str(&format_plan_step(index, step));
        }
    }
    out.push_str(&format!("\n  {} (pre-push)\n", style("local gate").cyan().bold()));
    if gate.is_empty() {
        out.push_str(&format!("    {}\n", style("(no steps)").dim()));
    }
    for (index, step) in gate.steps().iter().enumerate() {
        out.push_str(&format_plan_step(index, step));
    }
    out
}

fn format_plan_step(index: usize, step: &Step) -> String {
    let mut line = format!(
        "    {}. {} {}\n",
        index + 1,
        style(&step.name).bold(),
        style(&step.invocation).dim()
    );
    if let Some(description) = &step.description {
        line.push_str(&format!("       {}\n", style(description).italic()));
    }
    line
}
