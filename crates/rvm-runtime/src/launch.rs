//! Fire-and-forget runtime launch.

use std::path::PathBuf;
use std::process::Stdio;

use tracing::{info, warn};

use crate::error::{LaunchError, LaunchResult};

/// Milliseconds passed to the runtime for its message and desktop-owner
/// settings timeouts.
pub const RUNTIME_TIMEOUT_MS: u32 = 5000;

/// One provisioned manifest, ready to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    /// Runtime executable.
    pub runtime_path: PathBuf,
    /// Manifest URL the runtime is started against.
    pub manifest_url: String,
    /// Extra arguments from the manifest, passed as a single argument.
    pub runtime_args: String,
    /// Runtime version from the manifest.
    pub runtime_version: String,
}

/// Result of a launch attempt that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The process was created.
    Started {
        /// OS process id, when still known.
        pid: Option<u32>,
    },
    /// The executable vanished between provisioning and launch.
    MissingExecutable,
}

/// Build the argument vector (excluding argv\[0\]) for a runtime launch.
#[must_use]
pub fn launch_arguments(request: &LaunchRequest) -> Vec<String> {
    let mut args = Vec::with_capacity(6);
    args.push(format!("--config={}", request.manifest_url));
    if !request.runtime_args.is_empty() {
        args.push(request.runtime_args.clone());
    }
    args.push("--v=1".to_owned());
    args.push(format!("--version-keyword={}", request.runtime_version));
    args.push(format!("--message-timeout={RUNTIME_TIMEOUT_MS}"));
    args.push(format!(
        "--desktop-owner-settings-timeout={RUNTIME_TIMEOUT_MS}"
    ));
    args
}

/// Start the runtime for `request` without waiting for it.
///
/// Must be called from within a Tokio runtime, which reaps the child once it
/// exits.
///
/// # Errors
///
/// Returns [`LaunchError::Spawn`] if the process cannot be created.
pub fn launch(request: &LaunchRequest) -> LaunchResult<LaunchOutcome> {
    let path = &request.runtime_path;
    info!(
        path = %path.display(),
        manifest = %request.manifest_url,
        "launching runtime"
    );

    if !path.exists() {
        warn!(path = %path.display(), "runtime executable not found, skipping launch");
        return Ok(LaunchOutcome::MissingExecutable);
    }

    let child = tokio::process::Command::new(path)
        .args(launch_arguments(request))
        .stdin(Stdio::null())
        .spawn()
        .map_err(|e| LaunchError::Spawn {
            path: path.clone(),
            source: e,
        })?;

    let pid = child.id();
    info!(pid, path = %path.display(), "runtime started");
    Ok(LaunchOutcome::Started { pid })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(runtime_args: &str) -> LaunchRequest {
        LaunchRequest {
            runtime_path: PathBuf::from("/opt/rt/1.0/openfin"),
            manifest_url: "https://apps.example.com/app.json".to_owned(),
            runtime_args: runtime_args.to_owned(),
            runtime_version: "1.0".to_owned(),
        }
    }

    #[test]
    fn arguments_without_extras() {
        assert_eq!(
            launch_arguments(&request("")),
            vec![
                "--config=https://apps.example.com/app.json",
                "--v=1",
                "--version-keyword=1.0",
                "--message-timeout=5000",
                "--desktop-owner-settings-timeout=5000",
            ]
        );
    }

    #[test]
    fn extra_arguments_stay_one_argument() {
        let args = launch_arguments(&request("--a=1 --b"));
        assert_eq!(args.len(), 6);
        assert_eq!(args[1], "--a=1 --b");
        assert_eq!(args[2], "--v=1");
    }

    #[tokio::test]
    async fn missing_executable_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = request("");
        req.runtime_path = dir.path().join("absent");

        assert_eq!(launch(&req).unwrap(), LaunchOutcome::MissingExecutable);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn spawn_failure_is_reported() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("openfin");
        std::fs::write(&exe, b"not executable").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o644)).unwrap();
        let mut req = request("");
        req.runtime_path = exe;

        let err = launch(&req).unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }), "{err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn started_process_receives_arguments() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("openfin");
        let out = dir.path().join("args.txt");
        std::fs::write(
            &exe,
            format!("#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\n", out.display()),
        )
        .unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
        let mut req = request("--x y");
        req.runtime_path = exe;

        let outcome = launch(&req).unwrap();
        assert!(matches!(outcome, LaunchOutcome::Started { pid: Some(_) }));

        let mut recorded = String::new();
        for _ in 0..100 {
            recorded = std::fs::read_to_string(&out).unwrap_or_default();
            if recorded.lines().count() == 6 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        let lines: Vec<&str> = recorded.lines().collect();
        assert_eq!(lines[0], "--config=https://apps.example.com/app.json");
        assert_eq!(lines[1], "--x y");
        assert_eq!(lines[5], "--desktop-owner-settings-timeout=5000");
    }
}
