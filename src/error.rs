//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for
//! `source-fetch`. It uses the `thiserror` library to create an `Error` enum
//! covering every anticipated failure mode, each carrying enough context to
//! produce a useful single-line diagnostic.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum representing all failures: manifest parse
//!   errors, origin (VCS/network) failures, patch application failures,
//!   bldroot resolution cycles, precondition violations, unsupported
//!   operations, and wrapped I/O errors.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`, used
//!   throughout the crate to simplify function signatures.
//!
//! Every error kind maps to a fixed process exit code via
//! [`Error::exit_code`], so the top-level dispatcher can translate a failure
//! into the documented CLI exit-code taxonomy without inspecting message
//! text.

use thiserror::Error;

/// Main error type for source-fetch operations
#[derive(Error, Debug)]
pub enum Error {
    /// The manifest text could not be parsed in any supported format.
    #[error("manifest parse error: {message}")]
    Parse { message: String },

    /// An external VCS or network operation against an origin failed.
    ///
    /// Carries the origin identifier (URL or channel) and the tool's raw
    /// diagnostic output.
    #[error("origin operation failed for {url}: {message}")]
    Origin { url: String, message: String },

    /// A patch from a series failed to apply.
    #[error("patch {patch} failed to apply: {message}")]
    Patch { patch: String, message: String },

    /// A bldroot entry resolved to another bldroot entry for the same
    /// component. At most one indirection hop is permitted.
    #[error("bldroot cycle: component {component} resolved via tag {tag} to another bldroot entry")]
    Cycle { component: String, tag: String },

    /// A required precondition does not hold, e.g. the checkout destination
    /// already exists or the archive output directory is missing.
    #[error("{message}")]
    Precondition { message: String },

    /// The requested operation is not supported for this component kind.
    #[error("not supported: {feature}")]
    Unsupported { feature: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this failure kind.
    ///
    /// 3: precondition/I-O, 4: origin/patch/unsupported, 5: parse/cycle.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Parse { .. } | Error::Cycle { .. } => 5,
            Error::Origin { .. } | Error::Patch { .. } | Error::Unsupported { .. } => 4,
            Error::Precondition { .. } | Error::Io(_) => 3,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
