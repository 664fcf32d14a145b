//! # Archive Command Implementation
//!
//! This module implements the `archive` subcommand, which produces one
//! portable `<component>.tar` bundle per component of a spec file.
//!
//! The output directory is checked up front: the I/O error raised when
//! writing into a missing directory names the file path rather than the
//! directory, which makes for a confusing message, so the missing-directory
//! case is reported explicitly before any origin is contacted.

use clap::Args;
use std::path::PathBuf;

use source_fetch::error::{Error, Result};
use source_fetch::manifest;
use source_fetch::materialize::Materializer;

/// Generate tarballs from a spec file
#[derive(Args, Debug)]
pub struct ArchiveArgs {
    /// Restrict output to the named components (comma separated, repeatable)
    #[arg(long, value_name = "COMPONENT", value_delimiter = ',')]
    pub components: Vec<String>,

    /// Output directory for the generated bundles
    #[arg(short = 'o', long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Spec file naming the components to archive
    #[arg(value_name = "SPECFILE")]
    pub specfile: PathBuf,
}

/// Execute the `archive` command.
pub fn execute(args: ArchiveArgs, cache_dir: Option<PathBuf>) -> Result<()> {
    let manifest = manifest::from_file(&args.specfile)?;

    if !args.output_dir.is_dir() {
        return Err(Error::Precondition {
            message: format!("no such directory: {}", args.output_dir.display()),
        });
    }

    let materializer = Materializer::new(cache_dir);
    for (name, spec) in manifest.iter() {
        if !args.components.is_empty() && !args.components.iter().any(|c| c == name) {
            continue;
        }
        materializer.archive(name, spec, &args.output_dir)?;
    }
    Ok(())
}
