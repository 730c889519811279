//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod convert;
mod inspect;
mod palette;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use convert::ConvertArgs;

/// Process exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// mksprite - Convert images and GIFs into MakeCode Arcade sprite code
#[derive(Parser)]
#[command(name = "mksprite")]
#[command(about = "Convert images and animated GIFs into MakeCode Arcade sprite code")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert an image or GIF into sprite or animation code
    Convert(ConvertArgs),

    /// Print the active palette
    Palette {
        /// Config file (default: discovered mksprite.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Show a built-in palette instead of the configured one
        #[arg(long, conflicts_with = "config")]
        builtin: Option<String>,

        /// List built-in palette names
        #[arg(long, conflicts_with_all = ["config", "builtin"])]
        list: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the structure of a GIF: frames, disposal and delays
    Inspect {
        /// Input GIF
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Convert(args) => convert::run_convert(&args),
        Commands::Palette { config, builtin, list, json } => {
            palette::run_palette(config.as_deref(), builtin.as_deref(), list, json)
        }
        Commands::Inspect { input, json } => inspect::run_inspect(&input, json),
    }
}

/// Install the stderr log subscriber. Stdout carries generated code only.
fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "mksprite=error",
        1 => "mksprite=info",
        _ => "mksprite=debug",
    };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert_flags() {
        let cli = Cli::try_parse_from([
            "mksprite",
            "-vv",
            "convert",
            "in.gif",
            "--size",
            "custom",
            "--width",
            "-5",
            "--color",
            "3=#ff0000",
            "--palette",
            "#000000,#111111",
            "--no-loop",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Convert(args) => {
                assert_eq!(args.input, PathBuf::from("in.gif"));
                assert_eq!(args.width, Some(-5));
                assert_eq!(args.colors, vec![("3".to_string(), "#ff0000".to_string())]);
                assert_eq!(args.palette.as_ref().map(Vec::len), Some(2));
                assert!(args.no_loop);
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_color_assignment() {
        assert!(Cli::try_parse_from(["mksprite", "convert", "in.png", "--color", "3"]).is_err());
    }
}
