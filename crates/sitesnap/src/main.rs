// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sitesnap - Telegram photo-upload workflow bot for equipment
//! maintenance records.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod doctor;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sitesnap_config::SitesnapConfig;

/// Sitesnap - Telegram photo-upload workflow bot.
#[derive(Parser, Debug)]
#[command(name = "sitesnap", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot: Telegram dispatcher, workflow engine, job worker.
    Serve {
        /// Explicit config file path (otherwise the XDG hierarchy).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run non-destructive environment checks.
    Doctor {
        /// Explicit config file path (otherwise the XDG hierarchy).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

/// Load configuration, rendering diagnostics and exiting on failure.
fn load_or_exit(path: Option<&PathBuf>) -> SitesnapConfig {
    let result = match path {
        Some(path) => sitesnap_config::load_and_validate_path(path),
        None => sitesnap_config::load_and_validate(),
    };
    match result {
        Ok(config) => config,
        Err(errors) => {
            sitesnap_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { config }) => {
            let loaded = load_or_exit(config.as_ref());
            if let Err(e) = serve::run_serve(loaded).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Doctor { config, plain }) => {
            let loaded = load_or_exit(config.as_ref());
            match doctor::run_doctor(&loaded, config.as_deref(), plain).await {
                Ok(true) => {}
                Ok(false) => std::process::exit(1),
                Err(e) => {
                    eprintln!("error: {e}");
                    std::process::exit(1);
                }
            }
        }
        None => {
            println!("sitesnap: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn binary_loads_config_defaults() {
        // Verify config loads with defaults (no config file needed)
        let config = sitesnap_config::load_and_validate().expect("default config should be valid");
        assert_eq!(config.agent.name, "sitesnap");
    }
}
