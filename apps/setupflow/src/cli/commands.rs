//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::FlagsAction;
use crate::api;
use crate::clock::{InstantClock, SharedClock, TokioClock};
use crate::settings::{FileFlags, FlagSource, load_install_config, render_flags};
use crate::simulator::Validator;
use crate::wizard::{Wizard, WizardEvent, WizardSnapshot};
use setupflow_core::{
    ComponentStatus, DeploymentMode, FlowState, Phase, PolicyFlags, ValidationReport, WizardError,
};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc;

/// How command output is rendered.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json_mode: bool,
    pub verbose: bool,
}

fn clock_for(instant: bool) -> SharedClock {
    if instant {
        Arc::new(InstantClock::new())
    } else {
        Arc::new(TokioClock)
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), WizardError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| WizardError::SerializationError(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

// =============================================================================
// RUN COMMAND
// =============================================================================

/// Drive the wizard, answering prompts from `answer` or stdin.
pub async fn cmd_run(
    mode: DeploymentMode,
    config: Option<&Path>,
    flags_path: &Path,
    answer: Option<bool>,
    instant: bool,
    output: Output,
) -> Result<(), WizardError> {
    let config = load_install_config(config)?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut wizard = Wizard::new(
        mode,
        config,
        Arc::new(FileFlags::new(flags_path)),
        clock_for(instant),
    )
    .with_events(tx);

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if !output.json_mode {
                print_event(&event, output.verbose);
            }
        }
    });

    // One reader for the whole run, so piped answers are not lost.
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut state = wizard.run().await?;
    loop {
        state = match state {
            FlowState::AwaitingConfirmation { phase } => {
                let question = format!("{} reported failures. Continue anyway?", phase.title());
                if ask(&question, answer, &mut input).await? {
                    wizard.confirm().await?
                } else {
                    wizard.decline()?
                }
            }
            FlowState::AwaitingAdvance { phase } => {
                let question = format!("{} passed. Continue?", phase.title());
                if ask(&question, answer, &mut input).await? {
                    wizard.next().await?
                } else {
                    break;
                }
            }
            _ => break,
        };
    }

    let snapshot = wizard.snapshot();
    drop(wizard);
    if printer.await.is_err() {
        tracing::warn!("Event printer stopped early");
    }

    if output.json_mode {
        return print_json(&snapshot);
    }
    print_summary(&snapshot);
    Ok(())
}

async fn ask<R: AsyncBufRead + Unpin>(
    question: &str,
    answer: Option<bool>,
    input: &mut Lines<R>,
) -> Result<bool, WizardError> {
    if let Some(answer) = answer {
        println!("{} {}", question, if answer { "yes" } else { "no" });
        return Ok(answer);
    }

    print!("{} [y/N] ", question);
    std::io::stdout()
        .flush()
        .map_err(|e| WizardError::IoError(e.to_string()))?;

    let line = input
        .next_line()
        .await
        .map_err(|e| WizardError::IoError(e.to_string()))?
        .unwrap_or_default();
    Ok(matches!(
        line.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn print_event(event: &WizardEvent, verbose: bool) {
    match event {
        WizardEvent::PhaseStarted { phase, attempt } => {
            if *attempt > 1 {
                println!("==> {} (attempt {})", phase.title(), attempt);
            } else {
                println!("==> {}", phase.title());
            }
        }
        WizardEvent::PhaseSkipped { phase, .. } => println!("==> {} skipped", phase.title()),
        WizardEvent::Patch { patch, .. } => {
            if verbose {
                for line in &patch.logs {
                    println!("    {}", line);
                }
            } else if let Some(update) = patch.component {
                let mark = match update.status {
                    ComponentStatus::Pending => " ",
                    ComponentStatus::InProgress => "~",
                    ComponentStatus::Completed => "+",
                    ComponentStatus::Failed => "!",
                };
                let progress = patch
                    .progress
                    .map(|p| format!(" ({}%)", p))
                    .unwrap_or_default();
                println!("  [{}] {}{}", mark, update.component.title(), progress);
            }
            if let Some(error) = &patch.error {
                println!("  Error: {}", error);
            }
        }
        WizardEvent::PhaseResolved { phase, outcome, .. } => match outcome {
            Some(outcome) => println!("<== {}: {:?}", phase.title(), outcome),
            None => println!("<== {}", phase.title()),
        },
        WizardEvent::PhaseFailed { phase, error } => {
            println!("<== {} failed: {}", phase.title(), error);
        }
        WizardEvent::Confirmed { .. } | WizardEvent::Declined { .. } => {}
        WizardEvent::Rerun { phase } => println!("Rerunning {}", phase.title()),
        WizardEvent::Advanced { to } => {
            if verbose {
                println!("Advancing to {}", to.title());
            }
        }
        WizardEvent::Complete => println!("Installation complete."),
    }
}

fn print_summary(snapshot: &WizardSnapshot) {
    println!();
    println!("setupflow Summary");
    println!("=================");
    println!("Mode:  {}", snapshot.mode);
    println!("State: {}", snapshot.flow);
    println!();
    for phase in &snapshot.phases {
        println!(
            "{:<28} {:?} (attempts: {})",
            phase.state.phase.title(),
            phase.state.status,
            phase.state.attempts
        );
        if let Some(error) = &phase.state.error {
            println!("  Error: {}", error);
        }
    }
    if let Some(current) = snapshot.current_phase.and_then(|p| snapshot.phase(p))
        && current.affordances.show_next_button
        && !snapshot.complete
    {
        println!();
        println!("{}", current.affordances.next_button_label);
    }
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Run the application preflights and print the report.
pub async fn cmd_check(
    config: Option<&Path>,
    flags_path: &Path,
    instant: bool,
    output: Output,
) -> Result<(), WizardError> {
    let config = load_install_config(config)?;
    let flags = FileFlags::new(flags_path).load()?;
    let report = Validator::new(clock_for(instant))
        .validate_environment(&config, &flags)
        .await;

    if output.json_mode {
        return print_json(&report);
    }
    print_report(Phase::Preflights, &report);
    Ok(())
}

fn print_report(phase: Phase, report: &ValidationReport) {
    println!("{}", phase.title());
    println!("{}", "=".repeat(phase.title().len()));
    for (name, result) in report.iter() {
        let mark = match (result.success, result.is_strict) {
            (true, _) => "PASS",
            (false, true) => "STRICT",
            (false, false) => "FAIL",
        };
        println!("{:<7} {:<12} {}", mark, name, result.message);
    }
    println!();
    println!("Failures: {}", report.failure_count());
}

// =============================================================================
// FLAGS COMMAND
// =============================================================================

/// Show, set or reset policy flags.
pub fn cmd_flags(
    flags_path: &Path,
    action: FlagsAction,
    output: Output,
) -> Result<(), WizardError> {
    let source = FileFlags::new(flags_path);

    let flags = match action {
        FlagsAction::Show => source.load()?,
        FlagsAction::Set { name, value } => {
            let mut flags = source.load()?;
            flags.set_flag(&name, &value)?;
            source.save(&flags)?;
            flags
        }
        FlagsAction::Reset => {
            let flags = PolicyFlags::default();
            source.save(&flags)?;
            flags
        }
    };

    if output.json_mode {
        return print_json(&flags);
    }
    println!("# {}", source.path().display());
    print!("{}", render_flags(&flags)?);
    Ok(())
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_serve(
    mode: DeploymentMode,
    config: Option<&Path>,
    flags_path: &Path,
    host: &str,
    port: u16,
    instant: bool,
) -> Result<(), WizardError> {
    let config = load_install_config(config)?;
    let wizard = Wizard::new(
        mode,
        config,
        Arc::new(FileFlags::new(flags_path)),
        clock_for(instant),
    );

    println!("setupflow Wizard Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:  {}", host);
    println!("  Port:  {}", port);
    println!("  Mode:  {}", mode);
    println!("  Flags: {}", flags_path.display());
    println!();
    println!("Endpoints:");
    println!("  GET  /health  - Health check");
    println!("  GET  /state   - Wizard snapshot");
    println!("  POST /run     - Run until input is needed");
    println!("  POST /confirm - Continue past failures");
    println!("  POST /decline - Stop at failures");
    println!("  POST /next    - Next button");
    println!("  POST /rerun   - Rerun current phase");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, wizard).await
}
