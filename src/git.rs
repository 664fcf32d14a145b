//! # Remote Git Driver
//!
//! A thin, failure-structured wrapper over the system `git` command.
//!
//! This uses the system git command, which automatically handles:
//! - SSH keys from ~/.ssh/
//! - Git credential helpers
//! - Personal access tokens
//! - Any authentication configured in ~/.gitconfig
//!
//! Every command line is recorded at debug level before execution, and any
//! invocation that exits non-zero surfaces a single [`Error::Origin`]
//! carrying the origin URL and the tool's raw stderr.
//!
//! ## Archive strategy
//!
//! [`GitRepo::archive_to`] first asks the remote to produce the archive
//! server-side (`git archive --remote`), a single round trip with no clone.
//! Remotes that reject the archive capability fall back to a mirror clone
//! into scratch space and a local `git archive` from that clone. Either way
//! a failed attempt never leaves a truncated output file behind.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Error, Result};
use crate::fsops;

/// Handle on one git repository: the origin URL plus, for local
/// operations, the working directory to run git in.
pub struct GitRepo {
    url: String,
    workdir: Option<PathBuf>,
}

impl GitRepo {
    /// A handle for remote-only operations such as server-side archiving.
    pub fn remote(url: &str) -> Self {
        Self {
            url: url.to_string(),
            workdir: None,
        }
    }

    /// A handle on an existing local repository cloned from `url`.
    pub fn at(url: &str, workdir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.to_string(),
            workdir: Some(workdir.into()),
        }
    }

    /// Clone `url` into exactly `dest` (no checkout). Callers own the
    /// staging discipline around `dest`.
    pub fn clone(url: &str, dest: &Path, mirror: bool) -> Result<GitRepo> {
        let mut args = vec!["clone", "-n", "-q"];
        if mirror {
            args.push("--mirror");
        }
        let dest_arg = dest.to_string_lossy();
        args.push(url);
        args.push(dest_arg.as_ref());
        run_git(url, None, &args)?;
        Ok(GitRepo::at(url, dest))
    }

    /// Initialize an empty repository at `dest` for shallow fetching.
    pub fn init(url: &str, dest: &Path) -> Result<GitRepo> {
        let dest_arg = dest.to_string_lossy();
        run_git(url, None, &["init", "-q", dest_arg.as_ref()])?;
        Ok(GitRepo::at(url, dest))
    }

    /// The origin URL this handle reports failures against.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Add the handle's URL as the `origin` remote.
    pub fn add_remote(&self) -> Result<()> {
        let url = self.url.as_str();
        self.run(&["remote", "add", "origin", url])
    }

    /// Fetch all configured refs.
    pub fn fetch(&self) -> Result<()> {
        self.run(&["fetch", "-q"])
    }

    /// Fetch from a specific named remote.
    pub fn fetch_remote(&self, remote: &str) -> Result<()> {
        self.run(&["fetch", "-q", remote])
    }

    /// Fetch only `refname` from origin at depth 1.
    pub fn fetch_shallow(&self, refname: &str) -> Result<()> {
        self.run(&["fetch", "-q", "--depth=1", "origin", refname])
    }

    /// Check out `refname`.
    pub fn checkout(&self, refname: &str) -> Result<()> {
        self.run(&["checkout", "-q", refname])
    }

    /// Discard any divergence from the checked-out ref.
    pub fn reset_hard(&self) -> Result<()> {
        self.run(&["reset", "--hard", "-q"])
    }

    /// Name of the currently checked-out branch.
    pub fn current_branch(&self) -> Result<String> {
        let stdout = self.run_capture(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        Ok(stdout.trim().to_string())
    }

    /// Create `local` tracking the existing ref `start`.
    pub fn branch_track(&self, local: &str, start: &str) -> Result<()> {
        self.run(&["branch", "--track", local, start])
    }

    /// Widen origin's fetch refspec so `refs/remotes/*` branches on the
    /// server become visible under `origin/remotes/`.
    pub fn add_remotes_refspec(&self) -> Result<()> {
        self.run(&[
            "config",
            "--add",
            "remote.origin.fetch",
            "+refs/remotes/*:refs/remotes/origin/remotes/*",
        ])
    }

    /// Configure the `vendors/ARM` remote whose branches live under
    /// `refs/vendors/ARM/*` on the server.
    pub fn add_arm_vendor_remote(&self) -> Result<()> {
        let url = self.url.as_str();
        self.run(&["config", "remote.vendors/ARM.url", url])?;
        self.run(&[
            "config",
            "remote.vendors/ARM.fetch",
            "+refs/vendors/ARM/*:refs/remotes/vendors/ARM/*",
        ])
    }

    /// Produce `out` containing `refname`'s tree under `prefix/`, trying a
    /// server-side archive first and falling back to a local archive from a
    /// scratch mirror clone. A failed attempt removes the partial output.
    pub fn archive_to(&self, refname: &str, prefix: &str, out: &Path) -> Result<()> {
        let result = self.archive_remote(refname, prefix, out).or_else(|err| {
            log::debug!(
                "server-side archive for {} failed ({}), falling back to mirror clone",
                self.url,
                err
            );
            self.archive_via_clone(refname, prefix, out)
        });
        if result.is_err() {
            let _ = fsops::remove_force(out);
        }
        result
    }

    fn archive_remote(&self, refname: &str, prefix: &str, out: &Path) -> Result<()> {
        let prefix_arg = format!("{}/", prefix);
        let file = fs::File::create(out)?;
        run_git_to_file(
            &self.url,
            None,
            &[
                "archive",
                "--prefix",
                &prefix_arg,
                "--format",
                "tar",
                "--remote",
                &self.url,
                refname,
            ],
            file,
        )
    }

    fn archive_via_clone(&self, refname: &str, prefix: &str, out: &Path) -> Result<()> {
        // Scratch clone lives in a TempDir and is removed on every exit path.
        let scratch = tempfile::tempdir()?;
        let clone_path = scratch.path().join(prefix);
        GitRepo::clone(&self.url, &clone_path, true)?;

        let prefix_arg = format!("{}/", prefix);
        // Recreate the output from scratch; a partial server-side response
        // must not survive underneath the fallback's bytes.
        let file = fs::File::create(out)?;
        run_git_to_file(
            &self.url,
            Some(&clone_path),
            &["archive", "--prefix", &prefix_arg, "--format", "tar", refname],
            file,
        )
    }

    fn run(&self, args: &[&str]) -> Result<()> {
        run_git(&self.url, self.workdir.as_deref(), args)?;
        Ok(())
    }

    fn run_capture(&self, args: &[&str]) -> Result<String> {
        run_git(&self.url, self.workdir.as_deref(), args)
    }
}

fn command(workdir: Option<&Path>, args: &[&str]) -> Command {
    log::debug!("git {}", args.join(" "));
    let mut cmd = Command::new("git");
    if let Some(dir) = workdir {
        cmd.current_dir(dir);
    }
    cmd.args(args);
    cmd
}

fn run_git(url: &str, workdir: Option<&Path>, args: &[&str]) -> Result<String> {
    let output = command(workdir, args).output().map_err(|err| Error::Origin {
        url: url.to_string(),
        message: format!("failed to run git: {}", err),
    })?;
    if !output.status.success() {
        return Err(Error::Origin {
            url: url.to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn run_git_to_file(url: &str, workdir: Option<&Path>, args: &[&str], stdout: fs::File) -> Result<()> {
    let output = command(workdir, args)
        .stdout(Stdio::from(stdout))
        .output()
        .map_err(|err| Error::Origin {
            url: url.to_string(),
            message: format!("failed to run git: {}", err),
        })?;
    if !output.status.success() {
        return Err(Error::Origin {
            url: url.to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_handle_has_no_workdir() {
        let repo = GitRepo::remote("https://example.com/repo.git");
        assert_eq!(repo.url(), "https://example.com/repo.git");
        assert!(repo.workdir.is_none());
    }

    #[test]
    fn test_local_handle_keeps_workdir() {
        let repo = GitRepo::at("https://example.com/repo.git", "/tmp/clone");
        assert_eq!(repo.workdir.as_deref(), Some(Path::new("/tmp/clone")));
    }

    // Note: integration tests for clone/fetch/archive would require actual
    // git repositories and network access, so they're omitted here; the
    // fallback and staging behavior is covered through the materializer's
    // collaborator seams.
}
