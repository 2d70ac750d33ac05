//! Error types for manifest resolution, provisioning and launch.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from resolving a manifest URL.
///
/// The variants separate "could not reach" ([`Transfer`](Self::Transfer))
/// from "reached but rejected" ([`HttpStatus`](Self::HttpStatus)) from
/// "reached but unusable" ([`InvalidJson`](Self::InvalidJson),
/// [`Schema`](Self::Schema)).
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Network or transport failure.
    #[error("failed to fetch manifest {url}: {source}")]
    Transfer {
        /// Manifest URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("manifest {url} returned HTTP {status}")]
    HttpStatus {
        /// Manifest URL.
        url: String,
        /// Status code returned.
        status: u16,
    },

    /// The body is not JSON.
    #[error("manifest {url} is not valid JSON: {source}")]
    InvalidJson {
        /// Manifest URL.
        url: String,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// The JSON lacks a required field or has one of the wrong type.
    #[error("manifest {url}: {field} {message}")]
    Schema {
        /// Manifest URL.
        url: String,
        /// Dotted field name, e.g. `runtime.version`.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Errors from the archive transfer primitive.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Network or transport failure.
    #[error("download of {url} failed: {source}")]
    Request {
        /// Archive URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("download of {url} returned HTTP {status}")]
    HttpStatus {
        /// Archive URL.
        url: String,
        /// Status code returned.
        status: u16,
    },

    /// Writing the downloaded bytes failed.
    #[error("I/O error while downloading: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from ensuring a runtime is installed.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The version string cannot be used as a directory name.
    #[error("invalid runtime version '{version}': {reason}")]
    InvalidVersion {
        /// Version as given by the manifest.
        version: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The archive could not be fetched.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Filesystem failure outside the archive itself.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being operated on.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The archive is unreadable, empty or too large.
    #[error("extraction error: {message}")]
    Extraction {
        /// Description of the extraction failure.
        message: String,
    },

    /// An archive entry would land outside the target directory.
    #[error("path traversal detected in archive entry: {entry}")]
    PathTraversal {
        /// Raw entry name.
        entry: String,
    },

    /// Extraction succeeded but did not produce the runtime executable.
    #[error("runtime executable still missing after extraction: {}", path.display())]
    RuntimeMissingAfterExtraction {
        /// Expected executable path.
        path: PathBuf,
    },
}

impl ProvisionError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

/// Errors from launching a runtime.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The OS refused to create the process.
    #[error("failed to start {}: {source}", path.display())]
    Spawn {
        /// Executable path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Why a single manifest was skipped during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Manifest resolution failed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Provisioning failed.
    #[error(transparent)]
    Provision(#[from] ProvisionError),
}

/// Result type for manifest resolution.
pub type ManifestResult<T> = Result<T, ManifestError>;
/// Result type for archive transfers.
pub type TransferResult<T> = Result<T, TransferError>;
/// Result type for provisioning.
pub type ProvisionResult<T> = Result<T, ProvisionError>;
/// Result type for launching.
pub type LaunchResult<T> = Result<T, LaunchError>;
