//! CLI argument parsing and command dispatch

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use source_fetch::error::Result;

use crate::commands;

/// Fetch upstream projects described by a component spec file
#[derive(Parser, Debug)]
#[command(name = "source-fetch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Directory holding bare mirror clones and downloaded bundles.
    ///
    /// Can also be set with the `SOURCE_FETCH_CACHE` environment variable.
    #[arg(long, global = true, value_name = "DIR", env = "SOURCE_FETCH_CACHE")]
    cache_dir: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate tarballs from a spec file
    Archive(commands::archive::ArchiveArgs),

    /// Check out full source trees from a spec file
    Checkout(commands::checkout::CheckoutArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(self.verbose);

        match self.command {
            Commands::Archive(args) => commands::archive::execute(args, self.cache_dir),
            Commands::Checkout(args) => commands::checkout::execute(args, self.cache_dir),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Repeatable `-v` raises the level: warnings by default, then info, then
/// debug (which also traces every external command line).
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new().filter_level(level).init();
}
