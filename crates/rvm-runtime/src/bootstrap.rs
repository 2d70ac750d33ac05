//! Startup orchestration: manifests in, launch queue out.

use std::path::Path;

use tracing::{error, info};

use crate::arch::Arch;
use crate::error::BootstrapError;
use crate::launch::LaunchRequest;
use crate::manifest::ManifestResolver;
use crate::provision::RuntimeProvisioner;

/// Split comma-delimited manifest URL lists into trimmed, non-empty URLs.
///
/// Each input may itself contain several comma-separated URLs, so repeated
/// `--config` flags and a single comma list are handled the same way.
pub fn split_manifest_urls<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .flat_map(|item| {
            item.as_ref()
                .split(',')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_owned)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// A manifest that was skipped, with the reason.
#[derive(Debug)]
pub struct SkippedManifest {
    /// Manifest URL.
    pub url: String,
    /// Why it was skipped.
    pub error: BootstrapError,
}

/// Outcome of a bootstrap pass.
#[derive(Debug, Default)]
pub struct BootstrapReport {
    /// One entry per manifest whose runtime is installed, in input order.
    pub queue: Vec<LaunchRequest>,
    /// Manifests that could not be resolved or provisioned.
    pub skipped: Vec<SkippedManifest>,
}

/// Resolves manifests and provisions their runtimes, one URL at a time.
#[derive(Debug, Clone)]
pub struct Bootstrapper {
    resolver: ManifestResolver,
    provisioner: RuntimeProvisioner,
    arch: Arch,
}

impl Bootstrapper {
    /// Create a bootstrapper for the given architecture.
    #[must_use]
    pub fn new(resolver: ManifestResolver, provisioner: RuntimeProvisioner, arch: Arch) -> Self {
        Self {
            resolver,
            provisioner,
            arch,
        }
    }

    /// Process every URL in order. A failure on one URL is logged and does
    /// not stop the others.
    pub async fn run(&self, urls: &[String], runtime_dir: &Path) -> BootstrapReport {
        let mut report = BootstrapReport::default();

        for url in urls {
            match self.bootstrap_one(url, runtime_dir).await {
                Ok(request) => {
                    info!(
                        url = %url,
                        version = %request.runtime_version,
                        path = %request.runtime_path.display(),
                        "runtime ready"
                    );
                    report.queue.push(request);
                },
                Err(e) => {
                    error!(url = %url, error = %e, "skipping manifest");
                    report.skipped.push(SkippedManifest {
                        url: url.clone(),
                        error: e,
                    });
                },
            }
        }

        info!(
            ready = report.queue.len(),
            skipped = report.skipped.len(),
            "bootstrap complete"
        );
        report
    }

    async fn bootstrap_one(
        &self,
        url: &str,
        runtime_dir: &Path,
    ) -> Result<LaunchRequest, BootstrapError> {
        let manifest = self.resolver.resolve(url).await?;
        let runtime_path = self
            .provisioner
            .ensure_runtime(runtime_dir, &manifest.runtime_version, self.arch)
            .await?;

        Ok(LaunchRequest {
            runtime_path,
            manifest_url: manifest.url,
            runtime_args: manifest.runtime_arguments,
            runtime_version: manifest.runtime_version,
        })
    }
}
