//! Bridge from `rvm_config::Config` to domain types.
//!
//! The config crate has no dependencies on other internal crates. These
//! conversions translate its sections into the option types used by the
//! runtime, control-plane and telemetry crates.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rvm_config::Config;
use rvm_control::{ProcessInfo, ServerContext};
use rvm_runtime::HttpOptions;
use rvm_telemetry::{LogConfig, LogFormat};

/// Convert the `[http]` section to [`HttpOptions`].
#[must_use]
pub(crate) fn to_http_options(cfg: &Config) -> HttpOptions {
    let request_timeout = match cfg.http.request_timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    HttpOptions {
        user_agent: cfg.http.user_agent.clone(),
        connect_timeout: Duration::from_secs(cfg.http.connect_timeout_secs),
        request_timeout,
        max_redirects: cfg.http.max_redirects,
    }
}

/// Convert the `[logging]` section plus command-line overrides to a
/// [`LogConfig`].
///
/// `verbose` forces `debug` and adds file/line info. `format` replaces the configured format.
/// `log_dir` switches output to daily-rotated files in that directory.
#[must_use]
pub(crate) fn to_log_config(
    cfg: &Config,
    verbose: bool,
    format: Option<LogFormat>,
    log_dir: Option<&Path>,
) -> LogConfig {
    let level = if verbose {
        "debug"
    } else {
        cfg.logging.level.as_str()
    };
    // Validated at load time; unknown values cannot reach here.
    let format = format.unwrap_or_else(|| cfg.logging.format.parse().unwrap_or_default());

    let mut log_config = LogConfig::new(level).with_format(format);
    if verbose {
        log_config = log_config.with_file_info();
    }
    match log_dir {
        Some(dir) => log_config.with_file_logging(dir, "rvm"),
        None => log_config,
    }
}

/// Build the control-plane context.
#[must_use]
pub(crate) fn to_server_context(
    cfg: &Config,
    manifest_url: &str,
    process: Arc<ProcessInfo>,
) -> ServerContext {
    ServerContext {
        socket_path: cfg.control.socket_path.clone(),
        manifest_url: manifest_url.to_owned(),
        max_message_bytes: cfg.control.max_message_bytes,
        process,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rvm_telemetry::LogTarget;

    use super::*;

    #[test]
    fn zero_request_timeout_means_none() {
        let cfg = Config::default();
        let options = to_http_options(&cfg);

        assert_eq!(options.request_timeout, None);
        assert_eq!(options.connect_timeout, Duration::from_secs(30));
        assert_eq!(options.max_redirects, 10);
    }

    #[test]
    fn request_timeout_is_carried() {
        let mut cfg = Config::default();
        cfg.http.request_timeout_secs = 90;
        assert_eq!(
            to_http_options(&cfg).request_timeout,
            Some(Duration::from_secs(90))
        );
    }

    #[test]
    fn verbose_overrides_level() {
        let mut cfg = Config::default();
        cfg.logging.level = "warn".to_owned();

        let quiet = to_log_config(&cfg, false, None, None);
        assert_eq!(quiet.level, "warn");
        assert!(!quiet.file_info);

        let verbose = to_log_config(&cfg, true, None, None);
        assert_eq!(verbose.level, "debug");
        assert!(verbose.file_info);
    }

    #[test]
    fn format_flag_overrides_config() {
        let mut cfg = Config::default();
        cfg.logging.format = "json".to_owned();

        assert_eq!(to_log_config(&cfg, false, None, None).format, LogFormat::Json);
        assert_eq!(
            to_log_config(&cfg, false, Some(LogFormat::Pretty), None).format,
            LogFormat::Pretty
        );
    }

    #[test]
    fn log_dir_selects_file_target() {
        let cfg = Config::default();
        let log_config = to_log_config(&cfg, false, None, Some(Path::new("/var/log/rvm")));
        assert_eq!(
            log_config.target,
            LogTarget::File(PathBuf::from("/var/log/rvm"))
        );
    }

    #[test]
    fn server_context_uses_control_section() {
        let mut cfg = Config::default();
        cfg.control.socket_path = PathBuf::from("/tmp/alt.sock");
        let process = Arc::new(ProcessInfo::capture(chrono::Local::now()));

        let ctx = to_server_context(&cfg, "https://a/app.json", process);

        assert_eq!(ctx.socket_path, PathBuf::from("/tmp/alt.sock"));
        assert_eq!(ctx.manifest_url, "https://a/app.json");
        assert_eq!(ctx.max_message_bytes, 1024 * 1024);
    }
}
