//! Patch-series parsing and application.
//!
//! A series document lists one patch identifier per non-blank line, in the
//! order the patches must be applied. Application shells out to `patch(1)`
//! with the target directory, matching how upstream series are produced.

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// Parse a series document into the ordered list of patch identifiers.
pub fn parse_series(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Apply one patch file to `dir`. `patch_name` identifies the patch in
/// diagnostics.
pub fn apply(dir: &Path, patch_file: &Path, patch_name: &str) -> Result<()> {
    log::debug!(
        "patch -d {} -i {}",
        dir.display(),
        patch_file.display()
    );
    let output = Command::new("patch")
        .arg("-d")
        .arg(dir)
        .arg("-i")
        .arg(patch_file)
        .output()
        .map_err(|err| Error::Patch {
            patch: patch_name.to_string(),
            message: format!("failed to run patch: {}", err),
        })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let message = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        return Err(Error::Patch {
            patch: patch_name.to_string(),
            message,
        });
    }
    Ok(())
}
