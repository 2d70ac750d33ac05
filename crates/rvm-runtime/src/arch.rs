//! CPU architecture names used in download URLs and the info response.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Runtime package architecture.
///
/// Only two packages are published. Every target that is not 64-bit ARM maps
/// to [`Arch::X64`], including targets the table does not know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// `x86_64` and the fallback for everything else.
    X64,
    /// `aarch64`.
    Arm64,
}

impl Arch {
    /// Architecture of the running binary.
    #[must_use]
    pub const fn detect() -> Self {
        if cfg!(target_arch = "aarch64") {
            Self::Arm64
        } else {
            Self::X64
        }
    }

    /// Map a Rust `target_arch` name to a package architecture.
    #[must_use]
    pub fn from_target_arch(target_arch: &str) -> Self {
        match target_arch {
            "aarch64" | "arm64" => Self::Arm64,
            _ => Self::X64,
        }
    }

    /// Name as it appears in download URLs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X64 => "x64",
            Self::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
