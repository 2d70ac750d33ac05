//! Environment variable fallbacks.
//!
//! Env vars are **fallback**, not override: they are only applied to fields
//! that no config file set.

use std::collections::HashMap;

use tracing::debug;

use crate::merge::{SetFields, set_string_field};

struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

/// All supported `RVM_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "RVM_SOCKET_PATH",
        field_path: "control.socket_path",
    },
    EnvMapping {
        var_name: "RVM_DOWNLOAD_BASE",
        field_path: "runtime.download_base",
    },
    EnvMapping {
        var_name: "RVM_EXECUTABLE_NAME",
        field_path: "runtime.executable_name",
    },
    EnvMapping {
        var_name: "RVM_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "RVM_LOG_FORMAT",
        field_path: "logging.format",
    },
];

/// Snapshot the process environment, keeping only `RVM_*` variables.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with("RVM_"))
        .collect()
}

/// Apply environment variable fallbacks to fields that were **not** set by
/// any config file layer.
///
/// Returns the number of env vars applied.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    set_fields: &SetFields,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        if set_fields.contains(mapping.field_path) {
            continue;
        }

        if let Some(val) = env_vars.get(mapping.var_name).filter(|v| !v.is_empty()) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );
            set_string_field(merged, mapping.field_path, val);
            count = count.saturating_add(1);
        }
    }

    count
}
