// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Confero - operator console for a consultation marketplace.
//!
//! Binary entry point: loads and validates configuration, initializes
//! tracing, and dispatches subcommands.

mod run;
mod status;

use clap::{Parser, Subcommand};

/// Confero - operator console for a consultation marketplace.
#[derive(Parser, Debug)]
#[command(name = "confero", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the console session against the configured backend.
    Run,
    /// Validate and print the effective configuration.
    Config,
    /// Check backend reachability.
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match confero_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            confero_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.operator.log_level);

    let result = match cli.command {
        Some(Commands::Run) => run::run(config).await,
        Some(Commands::Config) => {
            match toml::to_string_pretty(&config) {
                Ok(rendered) => {
                    println!("{rendered}");
                    Ok(())
                }
                Err(e) => Err(confero_core::ConferoError::Internal(format!(
                    "failed to render config: {e}"
                ))),
            }
        }
        Some(Commands::Status) => status::status(&config).await,
        None => {
            println!("confero: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("confero: {e}");
        std::process::exit(1);
    }
}

/// Initializes the fmt subscriber, honoring `RUST_LOG` when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("confero={log_level},warn")));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
