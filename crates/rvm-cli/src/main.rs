//! `rvm`: runtime bootstrapper and local control-plane agent.
//!
//! On startup every manifest URL passed via `--config` is resolved, and the
//! runtime version it names is installed under `--runtime-dir` if missing.
//! Manifests that fail are logged and skipped. With `--launch` each
//! provisioned runtime is then started. Finally the control-plane socket is
//! served until Ctrl+C or SIGTERM.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod config_bridge;
mod theme;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{error, info, warn};

use rvm_config::Config;
use rvm_control::{ControlPlaneServer, ProcessInfo};
use rvm_runtime::{
    Arch, Bootstrapper, HttpDownloader, LaunchOutcome, LaunchRequest, ManifestResolver,
    RuntimeProvisioner, build_client, launch, split_manifest_urls,
};
use rvm_telemetry::LogFormat;

use crate::theme::Theme;

/// Runtime bootstrapper: provisions runtimes for manifests and serves the
/// local control plane.
#[derive(Parser, Debug)]
#[command(name = "rvm")]
#[command(author, version, about)]
struct Args {
    /// Manifest URLs, comma-separated. May be repeated.
    #[arg(long = "config", value_name = "URL1,URL2,...", required = true)]
    config: Vec<String>,

    /// Directory runtimes are installed under.
    #[arg(long, value_name = "DIR")]
    runtime_dir: PathBuf,

    /// Explicit settings file layered over the user config.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Override the control-plane socket path.
    #[arg(long, value_name = "PATH")]
    socket_path: Option<PathBuf>,

    /// Launch provisioned runtimes before serving.
    #[arg(long)]
    launch: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// Log format: pretty, compact, json or full.
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    /// Write logs to daily-rotated files in this directory instead of stderr.
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let process = Arc::new(ProcessInfo::capture(chrono::Local::now()));
    let args = Args::parse();

    let resolved = Config::load(args.settings.as_deref()).context("failed to load settings")?;
    let mut cfg = resolved.config;
    if let Some(path) = &args.socket_path {
        cfg.control.socket_path.clone_from(path);
    }
    let launch_enabled = args.launch || cfg.runtime.launch;

    let log_config = config_bridge::to_log_config(
        &cfg,
        args.verbose,
        args.log_format,
        args.log_dir.as_deref(),
    );
    if let Err(e) = rvm_telemetry::setup_logging(&log_config) {
        eprintln!("{}", Theme::error(&format!("Failed to initialize logging: {e}")));
    }
    for file in &resolved.loaded_files {
        info!(path = %file, "settings loaded");
    }

    let urls = split_manifest_urls(&args.config);
    let Some(primary_url) = urls.first().cloned() else {
        bail!("--config did not contain any manifest URL");
    };

    info!(
        start_time = %process.start_time,
        arch = %process.arch,
        manifests = urls.len(),
        runtime_dir = %args.runtime_dir.display(),
        "rvm starting"
    );
    println!("{}", Theme::header(&format!("rvm {}", env!("CARGO_PKG_VERSION"))));

    let client = build_client(&config_bridge::to_http_options(&cfg))
        .context("failed to create HTTP client")?;
    let provisioner = RuntimeProvisioner::new(
        Arc::new(HttpDownloader::new(client.clone())),
        cfg.runtime.download_base.clone(),
        cfg.runtime.executable_name.clone(),
    );
    let bootstrapper = Bootstrapper::new(ManifestResolver::new(client), provisioner, Arch::detect());

    let report = bootstrapper.run(&urls, &args.runtime_dir).await;
    for skipped in &report.skipped {
        println!(
            "{}",
            Theme::warning(&format!("skipped {}: {}", skipped.url, skipped.error))
        );
    }
    println!(
        "{}",
        Theme::success(&format!(
            "{} of {} runtime(s) ready",
            report.queue.len(),
            urls.len()
        ))
    );

    if launch_enabled {
        launch_all(&report.queue);
    } else if !report.queue.is_empty() {
        info!(count = report.queue.len(), "launching disabled; runtimes left idle");
    }

    let context = config_bridge::to_server_context(&cfg, &primary_url, Arc::clone(&process));
    let server = ControlPlaneServer::bind(context).context("failed to start control plane")?;
    println!(
        "{}",
        Theme::header(&format!(
            "control plane listening on {}",
            server.socket_path().display()
        ))
    );

    server.serve_until(shutdown_signal()).await?;

    println!("{}", Theme::dimmed("rvm stopped"));
    Ok(())
}

fn launch_all(queue: &[LaunchRequest]) {
    for request in queue {
        match launch(request) {
            Ok(LaunchOutcome::Started { pid }) => {
                println!(
                    "{}",
                    Theme::success(&format!(
                        "started {} (pid {})",
                        request.manifest_url,
                        pid.map_or_else(|| "?".to_owned(), |p| p.to_string())
                    ))
                );
            },
            Ok(LaunchOutcome::MissingExecutable) => {
                warn!(url = %request.manifest_url, "runtime missing at launch time");
            },
            Err(e) => {
                error!(url = %request.manifest_url, error = %e, "launch failed");
            },
        }
    }
}

/// Completes on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            },
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            },
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_config_and_runtime_dir() {
        assert!(Args::try_parse_from(["rvm"]).is_err());
        assert!(Args::try_parse_from(["rvm", "--config=https://a/app.json"]).is_err());
        assert!(Args::try_parse_from(["rvm", "--runtime-dir=/opt/rt"]).is_err());
    }

    #[test]
    fn parses_equals_style_flags() {
        let args = Args::try_parse_from([
            "rvm",
            "--config=https://a/app.json, https://b/app.json",
            "--runtime-dir=/opt/rt",
        ])
        .unwrap();

        assert_eq!(args.runtime_dir, PathBuf::from("/opt/rt"));
        assert_eq!(
            split_manifest_urls(&args.config),
            vec!["https://a/app.json", "https://b/app.json"]
        );
        assert!(!args.launch);
    }

    #[test]
    fn parses_optional_flags() {
        let args = Args::try_parse_from([
            "rvm",
            "--config",
            "https://a/app.json",
            "--runtime-dir",
            "/opt/rt",
            "--settings",
            "/etc/rvm.toml",
            "--socket-path",
            "/run/rvm.sock",
            "--launch",
            "-v",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.settings, Some(PathBuf::from("/etc/rvm.toml")));
        assert_eq!(args.socket_path, Some(PathBuf::from("/run/rvm.sock")));
        assert!(args.launch);
        assert!(args.verbose);
        assert_eq!(args.log_format, Some(LogFormat::Json));
    }

    #[test]
    fn rejects_unknown_log_format() {
        let result = Args::try_parse_from([
            "rvm",
            "--config=https://a/app.json",
            "--runtime-dir=/opt/rt",
            "--log-format=xml",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
