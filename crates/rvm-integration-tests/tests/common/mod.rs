//! Shared fixtures for integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rvm_control::{ControlPlaneServer, ProcessInfo, ServerContext};
use rvm_runtime::Arch;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// How long a test waits for something that should happen.
pub const PATIENCE: Duration = Duration::from_secs(5);

/// Build an in-memory zip from `(name, body)` pairs.
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, body) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(body).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A manifest body naming `version` and optional arguments.
pub fn manifest_json(version: &str, arguments: Option<&str>) -> String {
    let mut runtime = serde_json::json!({ "version": version });
    if let Some(args) = arguments {
        runtime["arguments"] = Value::String(args.to_owned());
    }
    serde_json::json!({ "runtime": runtime, "startup_app": { "name": "test" } }).to_string()
}

/// Fixed process facts so replies are predictable.
pub fn process_info() -> Arc<ProcessInfo> {
    Arc::new(ProcessInfo {
        start_time: "2026-01-01 12:00:00".to_owned(),
        executable: PathBuf::from("/opt/rvm/rvm"),
        working_dir: PathBuf::from("/opt/rvm"),
        arch: Arch::X64,
    })
}

/// A control-plane server running on a socket inside `dir`.
pub struct TestServer {
    pub socket_path: PathBuf,
    handle: JoinHandle<rvm_control::ControlPlaneResult<()>>,
}

impl TestServer {
    pub fn start(dir: &Path, manifest_url: &str) -> Self {
        let socket_path = dir.join("control.sock");
        let server = ControlPlaneServer::bind(ServerContext {
            socket_path: socket_path.clone(),
            manifest_url: manifest_url.to_owned(),
            max_message_bytes: 1024 * 1024,
            process: process_info(),
        })
        .unwrap();
        Self {
            socket_path,
            handle: server.spawn(),
        }
    }

    /// Open a connection, send `data`, and return the 4-byte acknowledgement
    /// along with the still-open stream.
    pub async fn send(&self, data: &[u8]) -> ([u8; 4], UnixStream) {
        let mut stream = UnixStream::connect(&self.socket_path).await.unwrap();
        stream.write_all(data).await.unwrap();
        let mut ack = [0u8; 4];
        tokio::time::timeout(PATIENCE, stream.read_exact(&mut ack))
            .await
            .expect("no acknowledgement")
            .unwrap();
        (ack, stream)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A fake runtime listening for replies.
pub struct ReplyPeer {
    pub address: String,
    listener: UnixListener,
}

impl ReplyPeer {
    pub fn bind(dir: &Path, name: &str) -> Self {
        let path = dir.join(name);
        let listener = UnixListener::bind(&path).unwrap();
        Self {
            address: path.to_str().unwrap().to_owned(),
            listener,
        }
    }

    /// Wait for one reply connection, returning the stream without answering.
    pub async fn accept(&self) -> UnixStream {
        let (stream, _) = tokio::time::timeout(PATIENCE, self.listener.accept())
            .await
            .expect("no reply connection")
            .unwrap();
        stream
    }

    /// Assert that no reply connection arrives within `wait`.
    pub async fn expect_silence(&self, wait: Duration) {
        let result = tokio::time::timeout(wait, self.listener.accept()).await;
        assert!(result.is_err(), "unexpected reply connection");
    }

    /// Accept one reply, acknowledge it with `RESP`, and return the frame.
    pub async fn receive(&self) -> (String, Value) {
        let mut stream = self.accept().await;
        let frame = read_frame(&mut stream).await;
        stream.write_all(b"RESP").await.unwrap();
        frame
    }
}

/// Read from `stream` until a complete `<address>:S:<json>` frame has
/// arrived.
pub async fn read_frame(stream: &mut UnixStream) -> (String, Value) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = tokio::time::timeout(PATIENCE, stream.read(&mut chunk))
            .await
            .expect("frame incomplete")
            .unwrap();
        assert!(n > 0, "peer closed before a full frame arrived");
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).into_owned();
        if let Some((address, json)) = text.split_once(":S:")
            && let Ok(value) = serde_json::from_str::<Value>(json)
        {
            return (address.to_owned(), value);
        }
    }
}
