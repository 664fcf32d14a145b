//! # Build-Status Service Access
//!
//! Bldroot components defer to an external build-status service to find
//! their real origin. The service is consumed through the [`BuildStatus`]
//! trait so resolution can be exercised in tests without the `bld` tool;
//! the default implementation shells out to it.

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// Artifact kinds holding a tag's manifest, in preference order: the
/// pre-built snapshot first, the tag's raw spec second.
pub const ARTIFACT_KINDS: [&str; 2] = ["snp", "spc"];

/// Trait for build-status queries - allows mocking in tests
pub trait BuildStatus {
    /// Most recent tag on `channel` matching `status_filter`, if any.
    fn latest_tag(&self, channel: &str, status_filter: &str) -> Result<Option<String>>;

    /// Whether the service holds an artifact of `kind` for `tag`.
    fn artifact_exists(&self, kind: &str, tag: &str) -> Result<bool>;

    /// Retrieve the artifact of `kind` for `tag` into `dest`.
    fn fetch_artifact(&self, kind: &str, tag: &str, dest: &Path) -> Result<()>;
}

/// The default implementation of [`BuildStatus`], shelling out to the
/// `bld` command.
pub struct BldCli;

impl BldCli {
    fn run(&self, origin: &str, args: &[&str]) -> Result<std::process::Output> {
        log::debug!("bld {}", args.join(" "));
        Command::new("bld")
            .args(args)
            .output()
            .map_err(|err| Error::Origin {
                url: origin.to_string(),
                message: format!("failed to run bld: {}", err),
            })
    }
}

impl BuildStatus for BldCli {
    fn latest_tag(&self, channel: &str, status_filter: &str) -> Result<Option<String>> {
        let origin = format!("bldroot:{}", channel);
        let output = self.run(
            &origin,
            &[
                "build",
                "list",
                channel,
                "--status",
                status_filter,
                "--count",
                "1",
            ],
        )?;
        if !output.status.success() {
            return Err(Error::Origin {
                url: origin,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let tag = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(if tag.is_empty() { None } else { Some(tag) })
    }

    fn artifact_exists(&self, kind: &str, tag: &str) -> Result<bool> {
        let origin = format!("bldroot:{}", tag);
        let output = self.run(&origin, &["artifact", "exists", kind, tag])?;
        Ok(output.status.success())
    }

    fn fetch_artifact(&self, kind: &str, tag: &str, dest: &Path) -> Result<()> {
        let origin = format!("bldroot:{}", tag);
        let dest_arg = dest.to_string_lossy();
        let output = self.run(
            &origin,
            &["artifact", "get", "-o", dest_arg.as_ref(), kind, tag],
        )?;
        if !output.status.success() {
            return Err(Error::Origin {
                url: origin,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
