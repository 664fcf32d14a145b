//! # Artifact Downloading
//!
//! Fetching a URL to a local file sits behind the [`Downloader`] trait so
//! the materializer can be exercised in tests without network access. The
//! default implementation performs a plain blocking HTTP GET with no
//! timeout; a hung transfer hangs the run.
//!
//! Downloads are staged to a `.part` sibling and renamed into place only
//! when the body has been written completely, so an interrupted transfer
//! never leaves a truncated file at the destination path.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Error, Result};
use crate::fsops;

/// Trait for URL fetching - allows mocking in tests
pub trait Downloader {
    /// Fetch `url` into the file at `dest`, replacing any existing file.
    fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// The default implementation of [`Downloader`], performing blocking HTTP
/// transfers.
pub struct HttpDownloader;

impl Downloader for HttpDownloader {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        log::debug!("fetching {} -> {}", url, dest.display());
        let part = fsops::staging_path(dest, ".part");
        fsops::remove_force(&part)?;
        let outcome = write_body(url, &part);
        match outcome {
            Ok(()) => {
                fs::rename(&part, dest)?;
                Ok(())
            }
            Err(err) => {
                let _ = fsops::remove_force(&part);
                Err(err)
            }
        }
    }
}

fn write_body(url: &str, dest: &Path) -> Result<()> {
    let origin = |err: reqwest::Error| Error::Origin {
        url: url.to_string(),
        message: err.to_string(),
    };
    let mut response = reqwest::blocking::get(url)
        .map_err(origin)?
        .error_for_status()
        .map_err(origin)?;
    let mut file = fs::File::create(dest)?;
    io::copy(&mut response, &mut file)?;
    Ok(())
}

/// Idempotent fetch: skip entirely when `dest` already exists, creating
/// parent directories otherwise.
pub fn fetch_if_absent(downloader: &dyn Downloader, url: &str, dest: &Path) -> Result<()> {
    if dest.exists() {
        log::debug!("found {}, skipping fetch", dest.display());
        return Ok(());
    }
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    downloader.fetch(url, dest)
}
