//! Tilekit CLI
//!
//! Command-line interface for inspecting tile, tilemap and animation bundles.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use tilekit::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Tilekit v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.config.as_deref();
    match cli.command {
        Some(Commands::List { bundle }) => commands::list(&bundle, config)
            .with_context(|| format!("listing {}", bundle.display())),
        Some(Commands::Usage { bundle, source }) => commands::usage(&bundle, &source, config)
            .with_context(|| format!("checking usage of {}", bundle.display())),
        Some(Commands::Roundtrip { bundle }) => commands::roundtrip(&bundle, config)
            .with_context(|| format!("round-tripping {}", bundle.display())),
        None => {
            println!("Tilekit v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}
