//! Reply documents sent back to runtimes.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use rvm_runtime::Arch;
use serde::Serialize;

/// Version reported in `get-rvm-info` replies.
pub const RVM_VERSION: &str = "1.0.0.0";

/// Format of the `start-time` field.
pub const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reported when the running executable cannot be located.
const FALLBACK_EXECUTABLE: &str = "/usr/bin/rvm";

/// Facts about this process, captured once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    /// Local start time, already formatted.
    pub start_time: String,
    /// Path of the running executable.
    pub executable: PathBuf,
    /// Directory containing the executable.
    pub working_dir: PathBuf,
    /// Detected architecture.
    pub arch: Arch,
}

impl ProcessInfo {
    /// Capture process facts given the moment the process started.
    #[must_use]
    pub fn capture(started_at: DateTime<Local>) -> Self {
        let executable =
            std::env::current_exe().unwrap_or_else(|_| PathBuf::from(FALLBACK_EXECUTABLE));
        let working_dir = executable
            .parent()
            .map_or_else(|| PathBuf::from("."), std::path::Path::to_path_buf);

        Self {
            start_time: started_at.format(START_TIME_FORMAT).to_string(),
            executable,
            working_dir,
            arch: Arch::detect(),
        }
    }
}

/// Outbound message wrapper shared by every reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply<P> {
    #[serde(skip_serializing_if = "Option::is_none")]
    broadcast: Option<bool>,
    message_id: String,
    topic: &'static str,
    payload: P,
}

impl<P> Reply<P> {
    /// The reply's payload.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// The `messageId` echoed from the request.
    #[must_use]
    pub fn message_id(&self) -> &str {
        &self.message_id
    }
}

/// Any reply the control plane can send.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    /// Reply to `get-desktop-owner-settings`.
    DesktopOwnerSettings(Reply<DesktopOwnerSettings>),
    /// Reply to `get-rvm-info`.
    RvmInfo(Reply<RvmInfo>),
}

impl Response {
    /// Encode as compact JSON.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` serialization failures.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Payload granting an application full desktop-owner permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DesktopOwnerSettings {
    action: &'static str,
    application_settings_exists: bool,
    desktop_owner_file_exists: bool,
    openfin_system_applications: BTreeMap<String, ()>,
    success: bool,
    payload: BTreeMap<String, ApplicationSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ApplicationSettings {
    extensions: Vec<String>,
    licenses: Vec<String>,
    permissions: Permissions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct Permissions {
    #[serde(rename = "System")]
    system: SystemPermissions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct SystemPermissions {
    launch_external_process: LaunchExternalProcess,
    set_domain_settings: bool,
    resolve_domain_settings: bool,
    get_domain_settings: bool,
    get_current_domain_settings: bool,
    open_url_with_browser: bool,
    launch_log_uploader: bool,
    download_asset: bool,
    #[serde(rename = "getOSInfo")]
    get_os_info: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct LaunchExternalProcess {
    enabled: bool,
    executables: Enabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct Enabled {
    enabled: bool,
}

impl SystemPermissions {
    fn all() -> Self {
        Self {
            launch_external_process: LaunchExternalProcess {
                enabled: true,
                executables: Enabled { enabled: true },
            },
            set_domain_settings: true,
            resolve_domain_settings: true,
            get_domain_settings: true,
            get_current_domain_settings: true,
            open_url_with_browser: true,
            launch_log_uploader: true,
            download_asset: true,
            get_os_info: true,
        }
    }
}

/// Payload describing this process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RvmInfo {
    action: &'static str,
    os_arch: Arch,
    path: String,
    rvm_arch: Arch,
    #[serde(rename = "start-time")]
    start_time: String,
    version: &'static str,
    #[serde(rename = "working-dir")]
    working_dir: String,
}

impl RvmInfo {
    /// Reported architecture.
    #[must_use]
    pub fn arch(&self) -> Arch {
        self.rvm_arch
    }
}

/// Build the `get-desktop-owner-settings` reply for `manifest_url`.
#[must_use]
pub fn desktop_owner_settings(message_id: &str, manifest_url: &str) -> Response {
    let settings = ApplicationSettings {
        extensions: Vec::new(),
        licenses: Vec::new(),
        permissions: Permissions {
            system: SystemPermissions::all(),
        },
    };

    Response::DesktopOwnerSettings(Reply {
        broadcast: None,
        message_id: message_id.to_owned(),
        topic: "application",
        payload: DesktopOwnerSettings {
            action: "get-desktop-owner-settings",
            application_settings_exists: true,
            desktop_owner_file_exists: true,
            openfin_system_applications: BTreeMap::new(),
            success: true,
            payload: BTreeMap::from([(manifest_url.to_owned(), settings)]),
        },
    })
}

/// Build the `get-rvm-info` reply.
#[must_use]
pub fn rvm_info(message_id: &str, process: &ProcessInfo) -> Response {
    Response::RvmInfo(Reply {
        broadcast: Some(false),
        message_id: message_id.to_owned(),
        topic: "system",
        payload: RvmInfo {
            action: "get-rvm-info",
            os_arch: process.arch,
            path: process.executable.display().to_string(),
            rvm_arch: process.arch,
            start_time: process.start_time.clone(),
            version: RVM_VERSION,
            working_dir: process.working_dir.display().to_string(),
        },
    })
}
