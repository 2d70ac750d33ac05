//! Runtime acquisition for rvm.
//!
//! Turns manifest URLs into installed runtimes:
//!
//! - [`ManifestResolver`] fetches a manifest and extracts the runtime version
//!   and arguments.
//! - [`RuntimeProvisioner`] makes sure that version exists under the runtime
//!   directory, downloading and extracting the platform archive if needed.
//! - [`launch`] starts an installed runtime against its manifest.
//! - [`Bootstrapper`] runs the first two over a list of URLs and builds the
//!   launch queue, skipping URLs that fail.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use rvm_runtime::{
//!     Arch, Bootstrapper, HttpDownloader, HttpOptions, ManifestResolver, RuntimeProvisioner,
//!     build_client,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = build_client(&HttpOptions::default())?;
//! let provisioner = RuntimeProvisioner::new(
//!     Arc::new(HttpDownloader::new(client.clone())),
//!     "https://cdn.openfin.co/release/runtime/linux",
//!     "openfin",
//! );
//! let bootstrapper = Bootstrapper::new(ManifestResolver::new(client), provisioner, Arch::detect());
//!
//! let urls = vec!["https://example.com/app.json".to_owned()];
//! let report = bootstrapper.run(&urls, Path::new("/opt/runtimes")).await;
//! println!("{} runtime(s) ready", report.queue.len());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod arch;
mod bootstrap;
mod download;
mod error;
mod extract;
mod http;
mod launch;
mod manifest;
mod provision;

pub use arch::Arch;
pub use bootstrap::{BootstrapReport, Bootstrapper, SkippedManifest, split_manifest_urls};
pub use download::{Downloader, HttpDownloader};
pub use error::{
    BootstrapError, LaunchError, LaunchResult, ManifestError, ManifestResult, ProvisionError,
    ProvisionResult, TransferError, TransferResult,
};
pub use extract::extract_zip;
pub use http::{HttpOptions, build_client};
pub use launch::{LaunchOutcome, LaunchRequest, RUNTIME_TIMEOUT_MS, launch, launch_arguments};
pub use manifest::{ManifestConfig, ManifestResolver};
pub use provision::RuntimeProvisioner;
