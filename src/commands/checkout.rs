//! # Checkout Command Implementation
//!
//! This module implements the `checkout` subcommand, which materializes
//! every component of a spec file as a working directory under the source
//! directory. Components are processed one at a time in name order; the
//! first failure aborts the run, leaving earlier components in place.

use clap::Args;
use std::path::PathBuf;

use source_fetch::error::Result;
use source_fetch::manifest;
use source_fetch::materialize::{CheckoutOptions, Materializer};

/// Check out full source trees from a spec file
#[derive(Args, Debug)]
pub struct CheckoutArgs {
    /// Directory to create the component working trees in
    #[arg(
        long = "srcdir",
        alias = "src-dir",
        value_name = "DIR",
        default_value = "."
    )]
    pub srcdir: PathBuf,

    /// Fetch only the pinned ref at depth 1 for version-pinned git
    /// components
    #[arg(long)]
    pub shallow: bool,

    /// Spec file naming the components to check out
    #[arg(value_name = "SPECFILE")]
    pub specfile: PathBuf,
}

/// Execute the `checkout` command.
pub fn execute(args: CheckoutArgs, cache_dir: Option<PathBuf>) -> Result<()> {
    let manifest = manifest::from_file(&args.specfile)?;

    let materializer = Materializer::new(cache_dir);
    let opts = CheckoutOptions {
        srcdir: args.srcdir,
        shallow: args.shallow,
    };
    for (name, spec) in manifest.iter() {
        materializer.checkout(name, spec, &opts)?;
    }
    Ok(())
}
