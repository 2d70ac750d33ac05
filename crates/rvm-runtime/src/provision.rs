//! Runtime installation.
//!
//! Runtimes live at `<root_dir>/<version>/<executable_name>`. A runtime is
//! considered installed exactly when that file exists; nothing else is
//! checked. Installing downloads
//! `<download_base>/<arch>/<version>` into a temporary zip, extracts it into
//! a staging directory under `root_dir`, and renames the staging directory
//! into place once the executable is confirmed present.
//!
//! The temporary zip and the staging directory both live in `root_dir` and
//! are removed on every exit path. The `.<version>.lock` file is left in
//! place after an install, since unlinking it while another installer is
//! blocked on it would let two installers hold the lock at once.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use tracing::{debug, info};

use crate::arch::Arch;
use crate::download::Downloader;
use crate::error::{ProvisionError, ProvisionResult};
use crate::extract::extract_zip;

/// Ensures a runtime version is present on disk.
#[derive(Clone)]
pub struct RuntimeProvisioner {
    downloader: Arc<dyn Downloader>,
    download_base: String,
    executable_name: String,
}

impl std::fmt::Debug for RuntimeProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeProvisioner")
            .field("download_base", &self.download_base)
            .field("executable_name", &self.executable_name)
            .finish_non_exhaustive()
    }
}

impl RuntimeProvisioner {
    /// Create a provisioner.
    ///
    /// `download_base` is used verbatim as the URL prefix; a trailing slash
    /// is tolerated.
    #[must_use]
    pub fn new(
        downloader: Arc<dyn Downloader>,
        download_base: impl Into<String>,
        executable_name: impl Into<String>,
    ) -> Self {
        Self {
            downloader,
            download_base: download_base.into(),
            executable_name: executable_name.into(),
        }
    }

    /// Archive URL for a version on an architecture.
    #[must_use]
    pub fn download_url(&self, arch: Arch, version: &str) -> String {
        format!(
            "{}/{}/{}",
            self.download_base.trim_end_matches('/'),
            arch.as_str(),
            version
        )
    }

    /// Where the executable for `version` lives under `root_dir`.
    #[must_use]
    pub fn executable_path(&self, root_dir: &Path, version: &str) -> PathBuf {
        root_dir.join(version).join(&self.executable_name)
    }

    /// Make sure `version` is installed under `root_dir`, downloading and
    /// extracting it if needed. Returns the executable path.
    ///
    /// When the executable already exists no network request is made.
    /// Concurrent callers, including other processes, serialize on a
    /// per-version lock file in `root_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::InvalidVersion`] if `version` is not a
    /// single path component, and the other [`ProvisionError`] variants for
    /// download, extraction or filesystem failures.
    pub async fn ensure_runtime(
        &self,
        root_dir: &Path,
        version: &str,
        arch: Arch,
    ) -> ProvisionResult<PathBuf> {
        validate_version(version)?;

        let executable = self.executable_path(root_dir, version);
        if executable.exists() {
            debug!(version, path = %executable.display(), "runtime already installed");
            return Ok(executable);
        }

        tokio::fs::create_dir_all(root_dir)
            .await
            .map_err(ProvisionError::io(root_dir))?;

        let lock_path = root_dir.join(format!(".{version}.lock"));
        let _guard = {
            let lock_path = lock_path.clone();
            tokio::task::spawn_blocking(move || InstallLock::acquire(&lock_path))
                .await
                .map_err(|e| ProvisionError::Extraction {
                    message: format!("lock task failed: {e}"),
                })??
        };

        // Another installer may have finished while we waited.
        if executable.exists() {
            debug!(version, "runtime installed by a concurrent provisioner");
            return Ok(executable);
        }

        let url = self.download_url(arch, version);
        info!(version, %arch, url, "downloading runtime");

        let archive = tempfile::Builder::new()
            .prefix(&format!(".{version}.download-"))
            .suffix(".zip")
            .tempfile_in(root_dir)
            .map_err(ProvisionError::io(root_dir))?;
        let bytes = self.downloader.download(&url, archive.path()).await?;
        debug!(version, bytes, "runtime archive downloaded");

        let staging = tempfile::Builder::new()
            .prefix(&format!(".{version}.staging-"))
            .tempdir_in(root_dir)
            .map_err(ProvisionError::io(root_dir))?;

        let archive_path = archive.path().to_path_buf();
        let staging_path = staging.path().to_path_buf();
        let files = tokio::task::spawn_blocking(move || extract_zip(&archive_path, &staging_path))
            .await
            .map_err(|e| ProvisionError::Extraction {
                message: format!("extraction task failed: {e}"),
            })??;

        if !staging.path().join(&self.executable_name).exists() {
            return Err(ProvisionError::RuntimeMissingAfterExtraction { path: executable });
        }

        let version_dir = root_dir.join(version);
        if version_dir.exists() {
            // Left over from an install that never produced an executable.
            tokio::fs::remove_dir_all(&version_dir)
                .await
                .map_err(ProvisionError::io(&version_dir))?;
        }
        tokio::fs::rename(staging.path(), &version_dir)
            .await
            .map_err(ProvisionError::io(&version_dir))?;

        info!(version, files, path = %executable.display(), "runtime installed");
        Ok(executable)
    }
}

/// A version must name exactly one directory under the runtime root.
fn validate_version(version: &str) -> ProvisionResult<()> {
    let reason = if version.is_empty() {
        Some("must not be empty")
    } else if version == "." || version == ".." {
        Some("must not be a relative directory reference")
    } else if version.contains(['/', '\\', '\0']) {
        Some("must not contain path separators")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ProvisionError::InvalidVersion {
            version: version.to_owned(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Exclusive advisory lock held for the duration of one install.
struct InstallLock {
    file: File,
}

impl InstallLock {
    fn acquire(path: &Path) -> ProvisionResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(ProvisionError::io(path))?;
        file.lock_exclusive().map_err(ProvisionError::io(path))?;
        Ok(Self { file })
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
