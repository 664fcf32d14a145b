//! # Component Specifications
//!
//! This module defines [`ComponentSpec`], the value type describing how one
//! named component's source snapshot is obtained. A spec is created once at
//! parse time and never mutated; the materializer consumes it read-only.
//!
//! ## Variants
//!
//! - **`Tarball`**: an upstream archive URL with an optional patch-series
//!   URL.
//! - **`GitVersion`**: a git URL pinned to a version token (tag or commit
//!   hash).
//! - **`GitBranch`**: a git URL tracking a branch; inherently a moving
//!   target.
//! - **`SvnRevision`**: a subversion URL pinned to a revision.
//! - **`Bldroot`**: an indirection resolved through the external
//!   build-status service by (channel, status filter).
//!
//! ## Equivalence
//!
//! Two specs are equivalent only if they are guaranteed to produce the same
//! source tree. Component names never participate: equivalence is a property
//! of the origin alone. The rules have two deliberate asymmetries:
//!
//! - A tarball with a patch series is never equal to anything, including an
//!   identical spec: without fetching and applying the series there is no
//!   way to know what tree results.
//! - A `GitBranch` spec is never equal to anything, *including itself*: the
//!   branch head may move between any two observations. This breaks
//!   reflexivity on purpose, which is why neither `ComponentSpec` nor
//!   containers of it implement `Eq`.
//!
//! The `extra` attribute map carries forwarded metadata and is excluded from
//! both equivalence and hashing.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Config-format options that may be forwarded onto a component frozen from
/// a bldroot entry, recording where the concrete spec came from.
pub const FORWARDABLE_OPTIONS: [&str; 4] = [
    "bldroot-channel",
    "bldroot-tag",
    "bldroot-status",
    "bldroot-status-filter",
];

/// Returns true if `option` is one of the forwardable provenance options.
pub fn is_forwardable(option: &str) -> bool {
    FORWARDABLE_OPTIONS.contains(&option)
}

/// The origin of one named component.
#[derive(Debug, Clone)]
pub enum ComponentSpec {
    /// An upstream tarball, optionally patched by a series document.
    Tarball {
        url: String,
        series: Option<String>,
        extra: BTreeMap<String, String>,
    },
    /// A git repository pinned to a version token (tag or commit hash).
    GitVersion {
        url: String,
        version: String,
        extra: BTreeMap<String, String>,
    },
    /// A git repository tracking a branch.
    ///
    /// `remote_branch` is optional in the legacy grammar; the config grammar
    /// fills in `"master"` for both branches when unspecified.
    GitBranch {
        url: String,
        local_branch: String,
        remote_branch: Option<String>,
        extra: BTreeMap<String, String>,
    },
    /// A subversion repository pinned to a revision.
    SvnRevision {
        url: String,
        revision: String,
        extra: BTreeMap<String, String>,
    },
    /// An indirection resolved through the build-status service.
    ///
    /// `status_filter` is held in normalized form; build with
    /// [`ComponentSpec::bldroot`].
    Bldroot {
        channel: String,
        status_filter: String,
    },
}

impl ComponentSpec {
    /// Builds a `Bldroot` spec, trimming the channel and normalizing the
    /// status filter so that equivalent filters compare equal.
    pub fn bldroot(channel: &str, status_filter: &str) -> Self {
        ComponentSpec::Bldroot {
            channel: channel.trim().to_string(),
            status_filter: normalize_status_filter(status_filter),
        }
    }

    /// The manifest keyword for this variant.
    pub fn kind(&self) -> &'static str {
        match self {
            ComponentSpec::Tarball { .. } => "tarball",
            ComponentSpec::GitVersion { .. } | ComponentSpec::GitBranch { .. } => "git",
            ComponentSpec::SvnRevision { .. } => "svn",
            ComponentSpec::Bldroot { .. } => "bldroot",
        }
    }

    /// The forwarded attribute map; `None` for variants that carry none.
    pub fn extra(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            ComponentSpec::Tarball { extra, .. }
            | ComponentSpec::GitVersion { extra, .. }
            | ComponentSpec::GitBranch { extra, .. }
            | ComponentSpec::SvnRevision { extra, .. } => Some(extra),
            ComponentSpec::Bldroot { .. } => None,
        }
    }
}

/// Sort, trim and dedupe a comma-separated status filter so that the order
/// a user wrote the statuses in does not affect equivalence.
pub fn normalize_status_filter(filter: &str) -> String {
    let mut parts: Vec<&str> = filter
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    parts.sort_unstable();
    parts.dedup();
    parts.join(",")
}

impl PartialEq for ComponentSpec {
    /// Origin equivalence: see the module documentation for the rules.
    /// A type mismatch is always unequal; `GitBranch` is unequal even to
    /// itself; the `extra` map never participates.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                ComponentSpec::Tarball {
                    url: a, series: sa, ..
                },
                ComponentSpec::Tarball {
                    url: b, series: sb, ..
                },
            ) => {
                // A series means patches we have not seen; be conservative.
                a == b && sa.is_none() && sb.is_none()
            }
            (
                ComponentSpec::GitVersion {
                    url: a, version: va, ..
                },
                ComponentSpec::GitVersion {
                    url: b, version: vb, ..
                },
            ) => a == b && va == vb,
            (ComponentSpec::GitBranch { .. }, ComponentSpec::GitBranch { .. }) => false,
            (
                ComponentSpec::SvnRevision {
                    url: a,
                    revision: ra,
                    ..
                },
                ComponentSpec::SvnRevision {
                    url: b,
                    revision: rb,
                    ..
                },
            ) => a == b && ra == rb,
            (
                ComponentSpec::Bldroot {
                    channel: a,
                    status_filter: fa,
                },
                ComponentSpec::Bldroot {
                    channel: b,
                    status_filter: fb,
                },
            ) => a == b && fa == fb,
            _ => false,
        }
    }
}

impl Hash for ComponentSpec {
    /// Hashes the identity fields only, so equal specs hash equal. The
    /// `extra` map is excluded to match the equivalence rule. `GitBranch`
    /// hashes its fields too; since it never compares equal, any consistent
    /// value satisfies the contract.
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            ComponentSpec::Tarball { url, series, .. } => {
                0u8.hash(state);
                url.hash(state);
                series.hash(state);
            }
            ComponentSpec::GitVersion { url, version, .. } => {
                1u8.hash(state);
                url.hash(state);
                version.hash(state);
            }
            ComponentSpec::GitBranch {
                url,
                local_branch,
                remote_branch,
                ..
            } => {
                2u8.hash(state);
                url.hash(state);
                local_branch.hash(state);
                remote_branch.hash(state);
            }
            ComponentSpec::SvnRevision { url, revision, .. } => {
                3u8.hash(state);
                url.hash(state);
                revision.hash(state);
            }
            ComponentSpec::Bldroot {
                channel,
                status_filter,
            } => {
                4u8.hash(state);
                channel.hash(state);
                status_filter.hash(state);
            }
        }
    }
}
