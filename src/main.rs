//! # Source Fetch CLI
//!
//! This is the binary entry point for the `source-fetch` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Reporting any failure as a single `error:` line on stderr and exiting
//!   with the failure kind's documented exit code.
//!
//! The core application logic is defined in the `source_fetch` library
//! crate, ensuring that the binary is a thin wrapper around the reusable
//! library functionality.

mod cli;
mod commands;

use clap::Parser;
use std::process;

fn main() {
    let cli = cli::Cli::parse();
    if let Err(err) = cli.execute() {
        eprintln!("error: {}", err);
        process::exit(err.exit_code());
    }
}
