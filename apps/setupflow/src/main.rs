//! # setupflow - Installation Wizard
//!
//! The main binary for the setupflow installation wizard simulator.
//!
//! This application provides:
//! - CLI interface that drives the wizard in the terminal
//! - HTTP REST API server (axum-based) over the wizard snapshot
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    apps/setupflow (THE BINARY)                  │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐    │
//! │  │   CLI       │    │   HTTP API  │    │   Simulators     │    │
//! │  │  (clap)     │    │   (axum)    │    │  (clock-driven)  │    │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘    │
//! │         │                  │                    │              │
//! │         └───────────── Wizard runner ───────────┘              │
//! │                            ▼                                   │
//! │                   ┌────────────────┐                           │
//! │                   │ setupflow-core │                           │
//! │                   │  (THE LOGIC)   │                           │
//! │                   └────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Run the wizard against an existing cluster
//! setupflow run
//!
//! # Bare hosts, answering every prompt with yes, without delays
//! setupflow --mode linux run --yes --instant
//!
//! # Make the application preflights fail, then check
//! setupflow flags set fail_preflights true
//! setupflow check
//!
//! # Start the HTTP server
//! setupflow serve --host 0.0.0.0 --port 8080
//! ```

use clap::Parser;
use setupflow::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // SETUPFLOW_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("SETUPFLOW_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "setupflow=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Display startup banner
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the setupflow startup banner.
fn print_banner() {
    println!(
        r#"
  ┌─┐┌─┐┌┬┐┬ ┬┌─┐┌─┐┬  ┌─┐┬ ┬
  └─┐├┤  │ │ │├─┘├┤ │  │ ││││
  └─┘└─┘ ┴ └─┘┴  └  ┴─┘└─┘└┴┘

  Installation Wizard v{}

  Hosts • Infrastructure • Preflights • Application
"#,
        env!("CARGO_PKG_VERSION")
    );
}
