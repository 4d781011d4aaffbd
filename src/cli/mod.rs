//! CLI Module
//!
//! Command-line interface for inspecting resource bundles.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tilekit - inspect and verify tile, tilemap and animation bundles
#[derive(Parser, Debug)]
#[command(name = "tilekit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every asset in a bundle
    #[command(name = "list")]
    List {
        /// Path to the bundle JSON
        bundle: PathBuf,
    },

    /// Report assets that no source file references
    #[command(name = "usage")]
    Usage {
        /// Path to the bundle JSON
        bundle: PathBuf,

        /// Directory containing .ts and .py sources
        #[arg(short, long)]
        source: PathBuf,
    },

    /// Reload and re-export a bundle, reporting entries whose encoding changes
    #[command(name = "roundtrip")]
    Roundtrip {
        /// Path to the bundle JSON
        bundle: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_usage_command() {
        let cli = Cli::parse_from(["tilekit", "--verbose", "usage", "assets.json", "--source", "src"]);
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Usage { bundle, source }) => {
                assert_eq!(bundle, PathBuf::from("assets.json"));
                assert_eq!(source, PathBuf::from("src"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
