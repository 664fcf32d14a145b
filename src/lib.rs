//! # Source Fetch Library
//!
//! This library resolves a manifest of named components, each describing how
//! to obtain a snapshot of upstream source code, and materializes each
//! component either as a full working directory or as a portable tar
//! archive. It is designed to be used by the `source-fetch` command-line
//! tool but can also be integrated into other release tooling.
//!
//! ## Quick Example
//!
//! ```
//! use source_fetch::manifest;
//!
//! let spec = "tarball zlib https://example/zlib-1.3.tar.gz\n";
//! let parsed = manifest::parse(spec).unwrap();
//! assert_eq!(parsed.len(), 1);
//! assert!(parsed.contains("zlib"));
//!
//! // Serializing reproduces the input.
//! assert_eq!(manifest::write_legacy(&parsed), spec);
//! ```
//!
//! ## Core Concepts
//!
//! - **Component Specs (`component`)**: immutable value objects encoding one
//!   origin kind (tarball, pinned git version, tracked git branch,
//!   subversion revision, or bldroot indirection) with per-variant
//!   equivalence rules.
//! - **Manifests (`manifest`)**: the ordered name-to-spec mapping, readable
//!   and writable in a legacy line-oriented format and an ini config format,
//!   with legacy-first fallback dispatch.
//! - **Materialization (`materialize`)**: the per-variant checkout and
//!   archive algorithms, including patch-series application and depth-1
//!   bldroot resolution with cycle rejection.
//! - **Origin Access (`git`, `download`, `buildstatus`, `patch`,
//!   `tarfile`)**: failure-structured wrappers over the external tools and
//!   transfers the materializer orchestrates.
//!
//! ## Execution Flow
//!
//! A run parses one manifest, then processes components strictly one at a
//! time in lexicographic name order. Every destination is staged and
//! atomically renamed into place (`fsops`), so interrupting a run never
//! leaves a half-populated tree at a final path. The first failing
//! component aborts the run; already-materialized components stay on disk.

pub mod buildstatus;
pub mod component;
pub mod download;
pub mod error;
pub mod fsops;
pub mod git;
pub mod manifest;
pub mod materialize;
pub mod patch;
pub mod tarfile;
