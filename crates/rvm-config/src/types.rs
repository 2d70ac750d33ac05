//! Configuration types.
//!
//! Every struct implements [`Default`] with the production values so that a
//! bare `[section]` header in TOML produces a working configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Control-plane socket settings.
    pub control: ControlSection,
    /// Runtime download and layout settings.
    pub runtime: RuntimeSection,
    /// HTTP client settings shared by manifest and archive fetches.
    pub http: HttpSection,
    /// Logging defaults (overridable from the command line).
    pub logging: LoggingSection,
}

/// Control-plane socket settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSection {
    /// Well-known Unix socket address the control plane listens on. This is
    /// also the address embedded in every outbound reply frame.
    pub socket_path: PathBuf,
    /// Size of the single receive performed per inbound connection.
    pub max_message_bytes: usize,
}

impl Default for ControlSection {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/tmp/OpenFinRVM_Messaging"),
            max_message_bytes: 1024 * 1024,
        }
    }
}

/// Runtime download and on-disk layout settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSection {
    /// Base of the download URL; `/<arch>/<version>` is appended.
    pub download_base: String,
    /// File name of the runtime executable inside `<runtime-dir>/<version>/`.
    pub executable_name: String,
    /// Launch every provisioned runtime before entering serving mode.
    pub launch: bool,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            download_base: "https://cdn.openfin.co/release/runtime/linux".to_owned(),
            executable_name: "openfin".to_owned(),
            launch: false,
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// TCP/TLS connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds; `0` disables it (archives can be large).
    pub request_timeout_secs: u64,
    /// Maximum number of redirects followed.
    pub max_redirects: usize,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            user_agent: concat!("rvm/", env!("CARGO_PKG_VERSION")).to_owned(),
            connect_timeout_secs: 30,
            request_timeout_secs: 0,
            max_redirects: 10,
        }
    }
}

/// Logging defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Level filter (`error`, `warn`, `info`, `debug`, `trace`).
    pub level: String,
    /// Output format (`pretty`, `compact`, `json`, `full`).
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
        }
    }
}
