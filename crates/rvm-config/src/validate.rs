//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// `sun_path` is 108 bytes on Linux, including the trailing NUL.
const MAX_SOCKET_PATH_BYTES: usize = 107;

/// Bounds for the single-receive buffer used by the control plane.
const MIN_MESSAGE_BYTES: usize = 64;
const MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

const MAX_REDIRECTS: usize = 50;

const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_control(config)?;
    validate_runtime(config)?;
    validate_http(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_control(config: &Config) -> ConfigResult<()> {
    let c = &config.control;
    let len = c.socket_path.as_os_str().len();

    if len == 0 {
        return Err(invalid("control.socket_path", "must not be empty"));
    }
    if len > MAX_SOCKET_PATH_BYTES {
        return Err(invalid(
            "control.socket_path",
            format!("{len} bytes exceeds the {MAX_SOCKET_PATH_BYTES} byte socket address limit"),
        ));
    }
    if !(MIN_MESSAGE_BYTES..=MAX_MESSAGE_BYTES).contains(&c.max_message_bytes) {
        return Err(invalid(
            "control.max_message_bytes",
            format!(
                "{} is out of range; must be between {MIN_MESSAGE_BYTES} and {MAX_MESSAGE_BYTES}",
                c.max_message_bytes
            ),
        ));
    }
    Ok(())
}

fn validate_runtime(config: &Config) -> ConfigResult<()> {
    let r = &config.runtime;

    if !(r.download_base.starts_with("https://") || r.download_base.starts_with("http://")) {
        return Err(invalid(
            "runtime.download_base",
            format!("'{}' must be an http(s) URL", r.download_base),
        ));
    }

    let name = r.executable_name.as_str();
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(invalid(
            "runtime.executable_name",
            format!("'{name}' must be a plain file name"),
        ));
    }
    Ok(())
}

fn validate_http(config: &Config) -> ConfigResult<()> {
    let h = &config.http;

    if h.user_agent.trim().is_empty() {
        return Err(invalid("http.user_agent", "must not be empty"));
    }
    if h.connect_timeout_secs == 0 {
        return Err(invalid("http.connect_timeout_secs", "must be greater than zero"));
    }
    if h.max_redirects > MAX_REDIRECTS {
        return Err(invalid(
            "http.max_redirects",
            format!("{} exceeds the limit of {MAX_REDIRECTS}", h.max_redirects),
        ));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;

    if l.level.trim().is_empty() {
        return Err(invalid("logging.level", "must not be empty"));
    }
    if !LOG_FORMATS.contains(&l.format.to_ascii_lowercase().as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported format '{}'; expected one of: {}",
                l.format,
                LOG_FORMATS.join(", ")
            ),
        ));
    }
    Ok(())
}
