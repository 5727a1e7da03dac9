// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Zoe - assistant core service.
//!
//! This is the binary entry point: it loads configuration, builds the
//! [`AppContext`] and runs one subcommand against it.

mod commands;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use zoe::AppContext;

/// Zoe - timers, intent modules and intent metrics.
#[derive(Parser, Debug)]
#[command(name = "zoe", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the timer service until interrupted (the default).
    Serve {
        /// Attach an interactive console for this user, reading from stdin.
        #[arg(long, value_name = "USER")]
        console: Option<String>,
    },
    /// Show enabled modules and what they provide.
    Modules,
    /// Run one utterance through the intent pipeline.
    Classify {
        text: String,
        #[arg(long, default_value = "local")]
        user: String,
    },
    /// List a user's running timers.
    Timers { user: String },
    /// Print the intent performance summary as JSON.
    Metrics {
        /// Trailing window in hours (defaults to `metrics.default_window_hours`).
        #[arg(long)]
        hours: Option<u32>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => zoe_config::load_and_validate_path(path),
        None => zoe_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            zoe_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let command = cli.command.unwrap_or(Commands::Serve { console: None });
    if matches!(command, Commands::Serve { .. }) {
        serve::init_tracing(&config.agent.log_level);
    }

    let ctx = match AppContext::build(config).await {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("zoe: failed to start: {e}");
            std::process::exit(1);
        }
    };

    let result = match command {
        Commands::Serve { console } => serve::run_serve(ctx, console).await,
        Commands::Modules => commands::modules(ctx).await,
        Commands::Classify { text, user } => commands::classify(ctx, &user, &text).await,
        Commands::Timers { user } => commands::timers(ctx, &user).await,
        Commands::Metrics { hours } => commands::metrics(ctx, hours).await,
    };

    if let Err(e) = result {
        eprintln!("zoe: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["zoe"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn classify_takes_text_and_user() {
        let cli = Cli::try_parse_from(["zoe", "classify", "set a timer for 5 minutes", "--user", "alice"])
            .unwrap();
        match cli.command {
            Some(Commands::Classify { text, user }) => {
                assert_eq!(text, "set a timer for 5 minutes");
                assert_eq!(user, "alice");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn metrics_window_is_optional() {
        let cli = Cli::try_parse_from(["zoe", "metrics", "--hours", "6"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Metrics { hours: Some(6) })));
        let cli = Cli::try_parse_from(["zoe", "metrics"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Metrics { hours: None })));
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["zoe", "timers", "alice", "--config", "/tmp/zoe.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/zoe.toml")));
    }
}
