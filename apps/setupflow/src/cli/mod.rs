//! # setupflow CLI Module
//!
//! This module implements the CLI interface for setupflow.
//!
//! ## Available Commands
//!
//! - `run` - Drive the wizard to completion or until it is blocked
//! - `check` - Run the application preflights and print the report
//! - `flags show|set|reset` - Inspect or edit the policy flags file
//! - `serve` - Start the HTTP server

mod commands;

use clap::{Parser, Subcommand};
use setupflow_core::{DeploymentMode, WizardError};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// setupflow - installation wizard simulator
///
/// Walks an enterprise install through host preflights, infrastructure,
/// application preflights and the application install. Outcomes are
/// driven by policy flags; nothing is provisioned.
#[derive(Parser, Debug)]
#[command(name = "setupflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Deployment mode: "kubernetes" (existing cluster) or "linux" (bare hosts)
    #[arg(short, long, global = true, default_value = "kubernetes")]
    pub mode: String,

    /// Path to the install configuration (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the policy flags file (TOML)
    #[arg(short = 'F', long, global = true, default_value = crate::settings::DEFAULT_FLAGS_FILE)]
    pub flags: PathBuf,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the installation wizard
    Run {
        /// Answer "yes" to every prompt
        #[arg(short, long, conflicts_with = "no")]
        yes: bool,

        /// Answer "no" to every prompt
        #[arg(short, long)]
        no: bool,

        /// Skip simulated delays
        #[arg(long)]
        instant: bool,
    },

    /// Run the application preflights only
    Check {
        /// Skip simulated delays
        #[arg(long)]
        instant: bool,
    },

    /// Inspect or edit the policy flags file
    Flags {
        #[command(subcommand)]
        action: FlagsAction,
    },

    /// Start HTTP server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Skip simulated delays
        #[arg(long)]
        instant: bool,
    },
}

/// Policy flag operations.
#[derive(Subcommand, Debug)]
pub enum FlagsAction {
    /// Print the current flags
    Show,

    /// Set one flag, e.g. `fail_preflights true` or `manual_advance preflights,application`
    Set { name: String, value: String },

    /// Restore every flag to its default
    Reset,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), WizardError> {
    let mode = DeploymentMode::parse(&cli.mode)?;
    let output = Output {
        json_mode: cli.json_mode,
        verbose: cli.verbose,
    };

    match cli.command {
        Some(Commands::Run { yes, no, instant }) => {
            let answer = match (yes, no) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            cmd_run(mode, cli.config.as_deref(), &cli.flags, answer, instant, output).await
        }
        Some(Commands::Check { instant }) => {
            cmd_check(cli.config.as_deref(), &cli.flags, instant, output).await
        }
        Some(Commands::Flags { action }) => cmd_flags(&cli.flags, action, output),
        Some(Commands::Serve {
            host,
            port,
            instant,
        }) => cmd_serve(mode, cli.config.as_deref(), &cli.flags, &host, port, instant).await,
        None => {
            // No subcommand - show flags by default
            cmd_flags(&cli.flags, FlagsAction::Show, output)
        }
    }
}
