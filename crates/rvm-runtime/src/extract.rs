//! Zip extraction with path traversal protection.
//!
//! Guards against:
//! - Path traversal (`../` components)
//! - Absolute paths
//! - Excessive entry counts and decompressed sizes

use std::fs::{self, File};
use std::path::{Component, Path};

use zip::ZipArchive;

use crate::error::{ProvisionError, ProvisionResult};

/// Maximum number of entries allowed in a runtime archive.
const MAX_ENTRY_COUNT: usize = 100_000;

/// Maximum total extracted size (4 GB).
const MAX_EXTRACTED_SIZE: u64 = 4_000_000_000;

/// Mode applied to every extracted file. Runtime packages ship executables
/// and shared objects, and zip entries do not reliably carry unix modes.
/// Plain `0o644` would leave the runtime unlaunchable, so everything gets
/// the executable bits.
#[cfg(unix)]
const EXTRACTED_FILE_MODE: u32 = 0o755;

fn extraction(message: impl Into<String>) -> ProvisionError {
    ProvisionError::Extraction {
        message: message.into(),
    }
}

/// Extract the zip at `archive` into `dest`, returning the number of files
/// written.
///
/// Every non-directory entry is written as a regular file. Directories,
/// including implicit parents of files, are created as needed.
///
/// # Errors
///
/// Returns [`ProvisionError::Extraction`] if the archive is unreadable,
/// empty or over the size limits, [`ProvisionError::PathTraversal`] for an
/// entry that would escape `dest`, and [`ProvisionError::Io`] if writing
/// fails.
pub fn extract_zip(archive: &Path, dest: &Path) -> ProvisionResult<usize> {
    let file = File::open(archive).map_err(ProvisionError::io(archive))?;
    let mut zip =
        ZipArchive::new(file).map_err(|e| extraction(format!("failed to open archive: {e}")))?;

    if zip.is_empty() {
        return Err(extraction("archive is empty"));
    }
    if zip.len() > MAX_ENTRY_COUNT {
        return Err(extraction(format!(
            "archive exceeds maximum entry count ({MAX_ENTRY_COUNT})"
        )));
    }

    let mut total_size: u64 = 0;
    let mut files_written = 0usize;

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| extraction(format!("failed to read archive entry {index}: {e}")))?;

        let name = entry.name().to_owned();
        let relative = Path::new(&name);
        validate_entry_path(relative, &name)?;

        total_size = total_size.saturating_add(entry.size());
        if total_size > MAX_EXTRACTED_SIZE {
            return Err(extraction(format!(
                "archive exceeds maximum extracted size ({MAX_EXTRACTED_SIZE} bytes)"
            )));
        }

        let target = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(ProvisionError::io(&target))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(ProvisionError::io(parent))?;
        }

        let mut out = File::create(&target).map_err(ProvisionError::io(&target))?;
        std::io::copy(&mut entry, &mut out).map_err(ProvisionError::io(&target))?;
        drop(out);
        set_extracted_mode(&target)?;

        files_written = files_written.saturating_add(1);
    }

    Ok(files_written)
}

/// Reject absolute paths and components that could escape the destination.
fn validate_entry_path(path: &Path, raw: &str) -> ProvisionResult<()> {
    let traversal = || ProvisionError::PathTraversal {
        entry: raw.to_owned(),
    };

    if raw.is_empty() || path.is_absolute() {
        return Err(traversal());
    }
    for component in path.components() {
        if matches!(
            component,
            Component::ParentDir | Component::Prefix(_) | Component::RootDir
        ) {
            return Err(traversal());
        }
    }
    Ok(())
}

#[cfg(unix)]
fn set_extracted_mode(path: &Path) -> ProvisionResult<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(EXTRACTED_FILE_MODE))
        .map_err(ProvisionError::io(path))
}

#[cfg(not(unix))]
fn set_extracted_mode(_path: &Path) -> ProvisionResult<()> {
    Ok(())
}
