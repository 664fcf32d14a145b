//! # Materialization Engine
//!
//! This module provides the [`Materializer`], which turns a
//! [`ComponentSpec`] into either a checked-out working directory or a
//! portable tar bundle.
//!
//! ## Design
//!
//! The materializer never implements fetching or build-status primitives
//! itself; it orchestrates them through two collaborator traits:
//!
//! - **[`Downloader`]**: fetches a URL to a local file (tarballs, series
//!   documents, patches).
//! - **[`BuildStatus`]**: queries the build-status service for bldroot
//!   resolution.
//!
//! Both default to the real implementations and can be replaced in tests,
//! so the orchestration paths (patch-series ordering, indirection
//! resolution, cycle rejection, precondition checks) are testable without
//! network access or external tools.
//!
//! ## Failure atomicity
//!
//! Checkout destinations are only ever populated by an atomic rename of a
//! fully prepared staging directory; any failure removes the staging tree
//! and leaves the destination absent. Archive outputs are removed on
//! failure so a truncated tar is never visible. Across a batch, components
//! already materialized stay on disk; the failing component aborts the run.

use std::fs;
use std::path::{Path, PathBuf};

use crate::buildstatus::{BldCli, BuildStatus, ARTIFACT_KINDS};
use crate::component::ComponentSpec;
use crate::download::{self, Downloader, HttpDownloader};
use crate::error::{Error, Result};
use crate::fsops;
use crate::git::GitRepo;
use crate::manifest;
use crate::patch;
use crate::tarfile;

/// Options shared by every checkout in a batch.
pub struct CheckoutOptions {
    /// Directory the component working trees are created in.
    pub srcdir: PathBuf,
    /// Fetch only the pinned ref at depth 1 for version-pinned git
    /// components.
    pub shallow: bool,
}

/// Per-variant checkout and archive orchestration.
pub struct Materializer {
    downloader: Box<dyn Downloader>,
    build_status: Box<dyn BuildStatus>,
    cache_dir: Option<PathBuf>,
}

impl Materializer {
    /// Create a materializer using the real collaborators. `cache_dir`, when
    /// given, holds bare mirror clones and downloaded bundles keyed by
    /// component name; it is reused across runs but not locked, so
    /// concurrent invocations against the same cache must be serialized by
    /// the caller.
    pub fn new(cache_dir: Option<PathBuf>) -> Self {
        Self {
            downloader: Box::new(HttpDownloader),
            build_status: Box::new(BldCli),
            cache_dir,
        }
    }

    /// Creates a `Materializer` with custom collaborators.
    ///
    /// This is primarily used for testing to inject mock operations.
    #[cfg(test)]
    pub fn with_collaborators(
        downloader: Box<dyn Downloader>,
        build_status: Box<dyn BuildStatus>,
        cache_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            downloader,
            build_status,
            cache_dir,
        }
    }

    /// Materialize `spec` as a working directory `<srcdir>/<name>`.
    pub fn checkout(&self, name: &str, spec: &ComponentSpec, opts: &CheckoutOptions) -> Result<()> {
        match spec {
            ComponentSpec::Tarball { url, series, .. } => {
                self.checkout_tarball(name, url, series.as_deref(), opts)
            }
            ComponentSpec::GitVersion { url, version, .. } => {
                self.checkout_git_version(name, url, version, opts)
            }
            ComponentSpec::GitBranch {
                url,
                local_branch,
                remote_branch,
                ..
            } => self.checkout_git_branch(name, url, local_branch, remote_branch.as_deref(), opts),
            ComponentSpec::SvnRevision { .. } => Err(Error::Unsupported {
                feature: "subversion checkout".to_string(),
            }),
            ComponentSpec::Bldroot {
                channel,
                status_filter,
            } => self.checkout_bldroot(name, channel, status_filter, opts),
        }
    }

    /// Materialize `spec` as `<output_dir>/<name>.tar`.
    pub fn archive(&self, name: &str, spec: &ComponentSpec, output_dir: &Path) -> Result<()> {
        let out = output_dir.join(format!("{}.tar", name));
        match spec {
            ComponentSpec::Tarball { url, .. } => {
                // Refresh the plain upstream artifact. Folding a patch
                // series into the bundle is out of scope.
                log::info!("fetching {}", url);
                self.downloader.fetch(url, &out)
            }
            ComponentSpec::GitVersion { url, version, .. } => {
                GitRepo::remote(url).archive_to(version, name, &out)
            }
            ComponentSpec::GitBranch {
                url,
                local_branch,
                remote_branch,
                ..
            } => {
                let refname = remote_branch.as_deref().unwrap_or(local_branch);
                GitRepo::remote(url).archive_to(refname, name, &out)
            }
            ComponentSpec::SvnRevision { .. } => Err(Error::Unsupported {
                feature: "subversion archive".to_string(),
            }),
            ComponentSpec::Bldroot { .. } => Err(Error::Unsupported {
                feature: "bldroot archive".to_string(),
            }),
        }
    }

    fn checkout_tarball(
        &self,
        name: &str,
        url: &str,
        series: Option<&str>,
        opts: &CheckoutOptions,
    ) -> Result<()> {
        let dest = opts.srcdir.join(name);
        if dest.is_dir() {
            // Tarball trees are a pure function of the spec, so an existing
            // destination counts as already materialized.
            log::info!("found {}, skipping", dest.display());
            return Ok(());
        }

        let bundle_name = url.rsplit('/').next().unwrap_or(url);
        let download_dir = self
            .cache_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let bundle_path = download_dir.join(bundle_name);
        log::info!("fetching {}", url);
        download::fetch_if_absent(self.downloader.as_ref(), url, &bundle_path)?;

        fs::create_dir_all(&opts.srcdir)?;
        fsops::with_staging(&dest, |staging| {
            fs::create_dir_all(staging)?;
            log::info!("expanding {}", url);
            tarfile::extract(&bundle_path, staging, 1)?;
            if let Some(series_url) = series {
                self.apply_series(staging, series_url)?;
            }
            Ok(())
        })
    }

    /// Fetch the series document into the staged tree (first time only) and
    /// apply its patches in listed order. Any patch failure propagates and
    /// aborts the surrounding checkout.
    fn apply_series(&self, dir: &Path, series_url: &str) -> Result<()> {
        let series_path = dir.join("=series");
        if !series_path.exists() {
            log::info!("fetching series file {}", series_url);
            download::fetch_if_absent(self.downloader.as_ref(), series_url, &series_path)?;
        }
        let base_url = series_url
            .rsplit_once('/')
            .map(|(base, _)| base)
            .unwrap_or("");
        let contents = fs::read_to_string(&series_path)?;
        for patch_name in patch::parse_series(&contents) {
            let scratch = tempfile::Builder::new().prefix("bld").tempdir()?;
            let patch_path = scratch.path().join("patch.diff");
            let patch_url = format!("{}/{}", base_url, patch_name);
            log::info!("fetching patch {}", patch_name);
            self.downloader.fetch(&patch_url, &patch_path)?;
            log::info!("applying patch {}", patch_name);
            patch::apply(dir, &patch_path, &patch_name)?;
        }
        Ok(())
    }

    fn checkout_git_version(
        &self,
        name: &str,
        url: &str,
        version: &str,
        opts: &CheckoutOptions,
    ) -> Result<()> {
        let dest = opts.srcdir.join(name);
        if dest.exists() {
            return Err(Error::Precondition {
                message: format!("{} already exists, please delete", dest.display()),
            });
        }

        // With a cache the working clone is made from a bare mirror kept up
        // to date across runs; without one it talks to the origin directly.
        let clone_source = match &self.cache_dir {
            Some(cache_dir) => {
                let mirror = cache_dir.join(name);
                if !mirror.exists() {
                    fs::create_dir_all(cache_dir)?;
                    log::debug!("creating mirror for {}", name);
                    fsops::with_staging(&mirror, |staging| {
                        GitRepo::clone(url, staging, true)?;
                        Ok(())
                    })?;
                }
                log::debug!("fetching mirror for {}", name);
                GitRepo::at(url, &mirror).fetch()?;
                mirror.to_string_lossy().into_owned()
            }
            None => url.to_string(),
        };

        fs::create_dir_all(&opts.srcdir)?;
        fsops::with_staging(&dest, |staging| {
            if opts.shallow {
                let repo = GitRepo::init(&clone_source, staging)?;
                repo.add_remote()?;
                repo.fetch_shallow(version)?;
                repo.checkout("FETCH_HEAD")?;
                repo.reset_hard()
            } else {
                let repo = GitRepo::clone(&clone_source, staging, false)?;
                repo.fetch()?;
                repo.checkout(version)?;
                repo.reset_hard()
            }
        })
    }

    fn checkout_git_branch(
        &self,
        name: &str,
        url: &str,
        local_branch: &str,
        remote_branch: Option<&str>,
        opts: &CheckoutOptions,
    ) -> Result<()> {
        let dest = opts.srcdir.join(name);
        if dest.exists() {
            return Err(Error::Precondition {
                message: format!("{} already exists, please delete", dest.display()),
            });
        }

        fs::create_dir_all(&opts.srcdir)?;
        fsops::with_staging(&dest, |staging| {
            let repo = GitRepo::clone(url, staging, false)?;
            if let Some(remote) = remote_branch {
                if remote.starts_with("remotes/") {
                    repo.add_remotes_refspec()?;
                    repo.fetch()?;
                } else if remote.starts_with("vendors/ARM/") {
                    repo.add_arm_vendor_remote()?;
                    repo.fetch_remote("vendors/ARM")?;
                }
                if repo.current_branch()? != local_branch {
                    let start = if remote.starts_with("remotes/") {
                        format!("remotes/origin/{}", remote)
                    } else if remote.starts_with("vendors/ARM/") {
                        format!("remotes/{}", remote)
                    } else {
                        format!("origin/{}", remote)
                    };
                    repo.branch_track(local_branch, &start)?;
                }
            }
            repo.checkout(local_branch)
        })
    }

    fn checkout_bldroot(
        &self,
        name: &str,
        channel: &str,
        status_filter: &str,
        opts: &CheckoutOptions,
    ) -> Result<()> {
        let origin = format!("bldroot:{}", channel);
        let tag = self
            .build_status
            .latest_tag(channel, status_filter)?
            .ok_or_else(|| Error::Origin {
                url: origin.clone(),
                message: format!("no tag on channel {} matches '{}'", channel, status_filter),
            })?;

        for kind in ARTIFACT_KINDS {
            if !self.build_status.artifact_exists(kind, &tag)? {
                continue;
            }
            let scratch = tempfile::Builder::new().prefix("bld").tempdir()?;
            let artifact = scratch.path().join(kind);
            self.build_status.fetch_artifact(kind, &tag, &artifact)?;
            let resolved = manifest::from_file(&artifact)?;
            let spec = resolved.get(name).ok_or_else(|| Error::Origin {
                url: origin.clone(),
                message: format!("tag {} does not define component {}", tag, name),
            })?;
            log::info!("checkout: {} using {} from {}", name, kind, tag);
            return self.checkout_resolved(name, spec, &tag, opts);
        }

        Err(Error::Origin {
            url: origin,
            message: format!("unable to resolve bldroot entry {}", name),
        })
    }

    /// Checkout dispatch for a spec obtained by bldroot resolution. At most
    /// one indirection hop is permitted, so a bldroot result is a cycle;
    /// this dispatch never resolves again.
    fn checkout_resolved(
        &self,
        name: &str,
        spec: &ComponentSpec,
        tag: &str,
        opts: &CheckoutOptions,
    ) -> Result<()> {
        match spec {
            ComponentSpec::Bldroot { .. } => Err(Error::Cycle {
                component: name.to_string(),
                tag: tag.to_string(),
            }),
            ComponentSpec::Tarball { url, series, .. } => {
                self.checkout_tarball(name, url, series.as_deref(), opts)
            }
            ComponentSpec::GitVersion { url, version, .. } => {
                self.checkout_git_version(name, url, version, opts)
            }
            ComponentSpec::GitBranch {
                url,
                local_branch,
                remote_branch,
                ..
            } => self.checkout_git_branch(name, url, local_branch, remote_branch.as_deref(), opts),
            ComponentSpec::SvnRevision { .. } => Err(Error::Unsupported {
                feature: "subversion checkout".to_string(),
            }),
        }
    }
}
