//! # Manifest Parsing and Serialization
//!
//! This module defines the [`Manifest`], the ordered mapping from component
//! name to [`ComponentSpec`], and the two on-disk grammars it can be read
//! from and written to.
//!
//! ## Formats
//!
//! 1. **Legacy format**: whitespace-tokenized records, one component per
//!    line, `#` starting a comment that runs to end of line:
//!
//!    ```text
//!    tarball NAME URL [SERIES]
//!    git NAME URL branch LOCAL [REMOTE]
//!    git NAME URL version|hash VERSION
//!    svn NAME URL version REVISION
//!    bldroot NAME channel CHANNEL filter FILTER
//!    ```
//!
//! 2. **Config format**: one ini section per component with a mandatory
//!    `type` option and per-type options mirroring the legacy fields, plus
//!    a whitelist of forwardable provenance options.
//!
//! ## Dispatch
//!
//! [`parse`] attempts the legacy reader first and falls back to the config
//! reader. When both fail, the error reports both diagnostics; neither
//! reader is silently preferred.
//!
//! ## Round trip
//!
//! `parse(write_legacy(m)) == m` and `parse(write_config(m)) == m` hold for
//! every manifest whose specs can compare equal at all; `GitBranch` specs
//! and series-bearing tarballs are excluded by the equivalence rules (a
//! documented limitation of the equivalence model, not of the writers).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ini::Ini;

use crate::component::{is_forwardable, ComponentSpec};
use crate::error::{Error, Result};

/// Ordered mapping of component name to origin spec.
///
/// Iteration is lexicographic by name. Two manifests are equal iff they
/// define the same name set and each pair of same-named specs is equal
/// under origin equivalence (so any `GitBranch` member makes a manifest
/// unequal even to a copy of itself).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    components: BTreeMap<String, ComponentSpec>,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a component.
    pub fn insert(&mut self, name: impl Into<String>, spec: ComponentSpec) {
        self.components.insert(name.into(), spec);
    }

    /// Look up a component by name.
    pub fn get(&self, name: &str) -> Option<&ComponentSpec> {
        self.components.get(name)
    }

    /// Remove a component, returning its spec if present.
    pub fn remove(&mut self, name: &str) -> Option<ComponentSpec> {
        self.components.remove(name)
    }

    /// True if a component of this name is defined.
    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Iterate components in lexicographic name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ComponentSpec)> {
        self.components.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Component names in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True if no components are defined.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Parse manifest text, trying the legacy format first and the config
/// format second. A dual failure reports both diagnostics.
pub fn parse(text: &str) -> Result<Manifest> {
    let legacy_err = match parse_legacy(text) {
        Ok(manifest) => return Ok(manifest),
        Err(err) => err,
    };
    match parse_config(text) {
        Ok(manifest) => Ok(manifest),
        Err(config_err) => Err(Error::Parse {
            message: format!(
                "legacy reader: {}; config reader: {}",
                reader_message(&legacy_err),
                reader_message(&config_err)
            ),
        }),
    }
}

/// Read and parse a manifest file.
pub fn from_file(path: &Path) -> Result<Manifest> {
    let text = fs::read_to_string(path)?;
    parse(&text).map_err(|err| Error::Parse {
        message: format!("cannot read {}: {}", path.display(), reader_message(&err)),
    })
}

fn reader_message(err: &Error) -> String {
    match err {
        Error::Parse { message } => message.clone(),
        other => other.to_string(),
    }
}

fn line_error(lineno: usize, line: &str, message: impl AsRef<str>) -> Error {
    Error::Parse {
        message: format!("line {}: {}: '{}'", lineno, message.as_ref(), line.trim()),
    }
}

/// Parse the legacy line-oriented format.
pub fn parse_legacy(text: &str) -> Result<Manifest> {
    let mut manifest = Manifest::new();
    for (index, raw) in text.lines().enumerate() {
        let lineno = index + 1;
        // Comments run from '#' to end of line.
        let line = raw.split('#').next().unwrap_or("");
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }
        let (name, spec) = match parts[0] {
            "tarball" => parse_legacy_tarball(lineno, raw, &parts)?,
            "git" => parse_legacy_git(lineno, raw, &parts)?,
            "svn" => parse_legacy_svn(lineno, raw, &parts)?,
            "bldroot" => parse_legacy_bldroot(lineno, raw, &parts)?,
            other => {
                return Err(line_error(
                    lineno,
                    raw,
                    format!("unknown entry type '{}'", other),
                ))
            }
        };
        manifest.insert(name, spec);
    }
    Ok(manifest)
}

fn parse_legacy_tarball(lineno: usize, raw: &str, parts: &[&str]) -> Result<(String, ComponentSpec)> {
    if !(3..=4).contains(&parts.len()) {
        return Err(line_error(
            lineno,
            raw,
            "tarball entry takes a name, a url and an optional series url",
        ));
    }
    let spec = ComponentSpec::Tarball {
        url: parts[2].to_string(),
        series: parts.get(3).map(|s| s.to_string()),
        extra: BTreeMap::new(),
    };
    Ok((parts[1].to_string(), spec))
}

fn parse_legacy_git(lineno: usize, raw: &str, parts: &[&str]) -> Result<(String, ComponentSpec)> {
    if parts.len() < 4 {
        return Err(line_error(
            lineno,
            raw,
            "git entry takes a name, a url and a branch/version/hash clause",
        ));
    }
    let name = parts[1].to_string();
    let url = parts[2].to_string();
    let rest = &parts[4..];
    let spec = match parts[3] {
        "branch" => {
            if rest.is_empty() || rest.len() > 2 {
                return Err(line_error(
                    lineno,
                    raw,
                    "git branch takes a local branch and an optional remote branch",
                ));
            }
            let local_branch = rest[0].to_string();
            let remote_branch = match rest.get(1) {
                Some(remote) => Some(strip_origin_prefix(remote, raw)),
                None => None,
            };
            ComponentSpec::GitBranch {
                url,
                local_branch,
                remote_branch,
                extra: BTreeMap::new(),
            }
        }
        "version" | "hash" => {
            if rest.len() != 1 {
                return Err(line_error(
                    lineno,
                    raw,
                    "git version/hash takes exactly one version token",
                ));
            }
            ComponentSpec::GitVersion {
                url,
                version: rest[0].to_string(),
                extra: BTreeMap::new(),
            }
        }
        other => {
            return Err(line_error(
                lineno,
                raw,
                format!("unknown git type '{}'", other),
            ))
        }
    };
    Ok((name, spec))
}

fn parse_legacy_svn(lineno: usize, raw: &str, parts: &[&str]) -> Result<(String, ComponentSpec)> {
    if parts.len() != 5 {
        return Err(line_error(
            lineno,
            raw,
            "svn entry takes a name, a url, 'version' and a revision",
        ));
    }
    if parts[3] != "version" {
        return Err(line_error(
            lineno,
            raw,
            format!("unknown svn type '{}'", parts[3]),
        ));
    }
    let spec = ComponentSpec::SvnRevision {
        url: parts[2].to_string(),
        revision: parts[4].to_string(),
        extra: BTreeMap::new(),
    };
    Ok((parts[1].to_string(), spec))
}

fn parse_legacy_bldroot(lineno: usize, raw: &str, parts: &[&str]) -> Result<(String, ComponentSpec)> {
    if parts.len() != 6 || parts[2] != "channel" || parts[4] != "filter" {
        return Err(line_error(
            lineno,
            raw,
            "bldroot entry takes a name, 'channel', a channel, 'filter' and a status filter",
        ));
    }
    Ok((
        parts[1].to_string(),
        ComponentSpec::bldroot(parts[3], parts[5]),
    ))
}

/// Legacy convention: remote branches were sometimes written with an
/// explicit `origin/` prefix. Strip it, with a warning, so the stored
/// remote branch is always origin-relative.
fn strip_origin_prefix(remote: &str, context: &str) -> String {
    match remote.strip_prefix("origin/") {
        Some(stripped) => {
            log::warn!(
                "remote branch prefixed with origin/ in '{}'",
                context.trim()
            );
            stripped.to_string()
        }
        None => remote.to_string(),
    }
}

/// Parse the ini config format.
pub fn parse_config(text: &str) -> Result<Manifest> {
    let ini = Ini::load_from_str(text).map_err(|err| Error::Parse {
        message: err.to_string(),
    })?;
    let mut manifest = Manifest::new();
    for (section, props) in ini.iter() {
        let name = match section {
            Some(name) => name,
            None => {
                if props.iter().next().is_some() {
                    return Err(Error::Parse {
                        message: "option outside of any component section".to_string(),
                    });
                }
                continue;
            }
        };
        let kind = props.get("type").ok_or_else(|| Error::Parse {
            message: format!("component '{}' has no type option", name),
        })?;
        let spec = match kind {
            "tarball" => parse_config_tarball(name, props)?,
            "git" => parse_config_git(name, props)?,
            "subversion" => parse_config_subversion(name, props)?,
            "bldroot" => parse_config_bldroot(name, props)?,
            other => {
                return Err(Error::Parse {
                    message: format!("component '{}' has unknown type '{}'", name, other),
                })
            }
        };
        manifest.insert(name, spec);
    }
    Ok(manifest)
}

fn unknown_option(name: &str, option: &str) -> Error {
    Error::Parse {
        message: format!("component '{}' has unknown option '{}'", name, option),
    }
}

fn missing_option(name: &str, option: &str) -> Error {
    Error::Parse {
        message: format!("component '{}' has no {} option", name, option),
    }
}

fn parse_config_tarball(name: &str, props: &ini::Properties) -> Result<ComponentSpec> {
    let mut url = None;
    let mut series = None;
    let mut extra = BTreeMap::new();
    for (option, value) in props.iter() {
        match option {
            "type" => {}
            "url" => url = Some(value.to_string()),
            "series" => series = Some(value.to_string()),
            option if is_forwardable(option) => {
                extra.insert(option.to_string(), value.to_string());
            }
            option => return Err(unknown_option(name, option)),
        }
    }
    Ok(ComponentSpec::Tarball {
        url: url.ok_or_else(|| missing_option(name, "url"))?,
        series,
        extra,
    })
}

fn parse_config_git(name: &str, props: &ini::Properties) -> Result<ComponentSpec> {
    let mut url = None;
    let mut version = None;
    let mut local_branch = None;
    let mut remote_branch = None;
    let mut extra = BTreeMap::new();
    for (option, value) in props.iter() {
        match option {
            "type" => {}
            "url" => url = Some(value.to_string()),
            "version" => version = Some(value.to_string()),
            "branch" => local_branch = Some(value.to_string()),
            "remote-branch" => remote_branch = Some(strip_origin_prefix(value, name)),
            option if is_forwardable(option) => {
                extra.insert(option.to_string(), value.to_string());
            }
            option => return Err(unknown_option(name, option)),
        }
    }
    // All options are collected before validation, so version/branch
    // conflicts are rejected regardless of the order they were written in.
    let url = url.ok_or_else(|| missing_option(name, "url"))?;
    match version {
        Some(version) => {
            if local_branch.is_some() || remote_branch.is_some() {
                return Err(Error::Parse {
                    message: format!("component '{}' has both version and branch options", name),
                });
            }
            Ok(ComponentSpec::GitVersion {
                url,
                version,
                extra,
            })
        }
        None => Ok(ComponentSpec::GitBranch {
            url,
            local_branch: local_branch.unwrap_or_else(|| "master".to_string()),
            remote_branch: Some(remote_branch.unwrap_or_else(|| "master".to_string())),
            extra,
        }),
    }
}

fn parse_config_subversion(name: &str, props: &ini::Properties) -> Result<ComponentSpec> {
    let mut url = None;
    let mut revision = None;
    let mut extra = BTreeMap::new();
    for (option, value) in props.iter() {
        match option {
            "type" => {}
            "url" => url = Some(value.to_string()),
            "revision" => revision = Some(value.to_string()),
            option if is_forwardable(option) => {
                extra.insert(option.to_string(), value.to_string());
            }
            option => return Err(unknown_option(name, option)),
        }
    }
    Ok(ComponentSpec::SvnRevision {
        url: url.ok_or_else(|| missing_option(name, "url"))?,
        revision: revision.ok_or_else(|| missing_option(name, "revision"))?,
        extra,
    })
}

fn parse_config_bldroot(name: &str, props: &ini::Properties) -> Result<ComponentSpec> {
    let mut channel = None;
    let mut status_filter = None;
    for (option, value) in props.iter() {
        match option {
            "type" => {}
            "channel" => channel = Some(value.to_string()),
            "status-filter" => status_filter = Some(value.to_string()),
            option => return Err(unknown_option(name, option)),
        }
    }
    let channel = channel.ok_or_else(|| missing_option(name, "channel"))?;
    let status_filter = status_filter.ok_or_else(|| missing_option(name, "status-filter"))?;
    Ok(ComponentSpec::bldroot(&channel, &status_filter))
}

/// Serialize to the legacy line-oriented format.
pub fn write_legacy(manifest: &Manifest) -> String {
    let mut out = String::new();
    for (name, spec) in manifest.iter() {
        match spec {
            ComponentSpec::Tarball { url, series, .. } => {
                out.push_str(&format!("tarball {} {}", name, url));
                if let Some(series) = series {
                    out.push_str(&format!(" {}", series));
                }
                out.push('\n');
            }
            ComponentSpec::GitBranch {
                url,
                local_branch,
                remote_branch,
                ..
            } => {
                out.push_str(&format!("git {} {} branch {}", name, url, local_branch));
                if let Some(remote) = remote_branch {
                    out.push_str(&format!(" {}", remote));
                }
                out.push('\n');
            }
            ComponentSpec::GitVersion { url, version, .. } => {
                out.push_str(&format!("git {} {} version {}\n", name, url, version));
            }
            ComponentSpec::SvnRevision { url, revision, .. } => {
                out.push_str(&format!("svn {} {} version {}\n", name, url, revision));
            }
            ComponentSpec::Bldroot {
                channel,
                status_filter,
            } => {
                out.push_str(&format!(
                    "bldroot {} channel {} filter {}\n",
                    name, channel, status_filter
                ));
            }
        }
    }
    out
}

/// Serialize to the ini config format.
pub fn write_config(manifest: &Manifest) -> String {
    let mut out = String::new();
    for (name, spec) in manifest.iter() {
        out.push_str(&format!("[{}]\n", name));
        match spec {
            ComponentSpec::Tarball { url, series, .. } => {
                out.push_str("type=tarball\n");
                out.push_str(&format!("url={}\n", url));
                if let Some(series) = series {
                    out.push_str(&format!("series={}\n", series));
                }
            }
            ComponentSpec::GitBranch {
                url,
                local_branch,
                remote_branch,
                ..
            } => {
                out.push_str("type=git\n");
                out.push_str(&format!("url={}\n", url));
                out.push_str(&format!("branch={}\n", local_branch));
                if let Some(remote) = remote_branch {
                    out.push_str(&format!("remote-branch={}\n", remote));
                }
            }
            ComponentSpec::GitVersion { url, version, .. } => {
                out.push_str("type=git\n");
                out.push_str(&format!("url={}\n", url));
                out.push_str(&format!("version={}\n", version));
            }
            ComponentSpec::SvnRevision { url, revision, .. } => {
                out.push_str("type=subversion\n");
                out.push_str(&format!("url={}\n", url));
                out.push_str(&format!("revision={}\n", revision));
            }
            ComponentSpec::Bldroot {
                channel,
                status_filter,
            } => {
                out.push_str("type=bldroot\n");
                out.push_str(&format!("channel={}\n", channel));
                out.push_str(&format!("status-filter={}\n", status_filter));
            }
        }
        if let Some(extra) = spec.extra() {
            for (key, value) in extra {
                out.push_str(&format!("{}={}\n", key, value));
            }
        }
        out.push('\n');
    }
    out
}
