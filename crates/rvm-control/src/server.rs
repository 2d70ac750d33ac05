//! Unix domain socket server.
//!
//! Each connection is one request: read once, acknowledge with `RESP`,
//! dispatch, optionally deliver a reply over a separate connection to the
//! sender's address, then close. Connections are handled on their own tasks
//! and never wait on each other.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::delivery::deliver;
use crate::dispatch::respond;
use crate::envelope::{ACK_TOKEN, InboundMessage};
use crate::error::{ControlPlaneError, ControlPlaneResult};
use crate::responses::ProcessInfo;

/// Pause after a failed accept so a persistent error does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Immutable state shared by every connection.
#[derive(Debug, Clone)]
pub struct ServerContext {
    /// Path this server listens on, also used as the reply address.
    pub socket_path: PathBuf,
    /// Manifest URL keying desktop-owner settings replies.
    pub manifest_url: String,
    /// Size of the single receive buffer per connection.
    pub max_message_bytes: usize,
    /// Startup facts for `get-rvm-info`.
    pub process: Arc<ProcessInfo>,
}

impl ServerContext {
    fn own_address(&self) -> String {
        self.socket_path.to_string_lossy().into_owned()
    }
}

/// A bound control-plane listener.
#[derive(Debug)]
pub struct ControlPlaneServer {
    listener: UnixListener,
    context: Arc<ServerContext>,
}

impl ControlPlaneServer {
    /// Bind the listening socket, replacing any stale socket file.
    ///
    /// Must be called within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError::Io`] if the parent directory cannot be
    /// created or a stale socket cannot be removed, and
    /// [`ControlPlaneError::Bind`] if binding fails.
    pub fn bind(context: ServerContext) -> ControlPlaneResult<Self> {
        let path = context.socket_path.clone();

        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "removed stale socket"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => return Err(ControlPlaneError::Io { path, source: e }),
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| ControlPlaneError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let listener = UnixListener::bind(&path)
            .map_err(|e| ControlPlaneError::Bind { path: path.clone(), source: e })?;

        info!(path = %path.display(), "control plane listening");

        Ok(Self {
            listener,
            context: Arc::new(context),
        })
    }

    /// Socket path being served.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.context.socket_path
    }

    /// Accept connections forever.
    ///
    /// # Errors
    ///
    /// Never returns under normal operation; see [`serve_until`](Self::serve_until).
    pub async fn serve(self) -> ControlPlaneResult<()> {
        self.serve_until(std::future::pending()).await
    }

    /// Accept connections until `shutdown` completes, then remove the socket
    /// file. In-flight connections keep running on their own tasks.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError::Io`] if the socket file cannot be removed
    /// on shutdown.
    pub async fn serve_until<F>(self, shutdown: F) -> ControlPlaneResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _addr)) => {
                        let context = Arc::clone(&self.context);
                        let span = info_span!("connection", id = %Uuid::new_v4());
                        tokio::spawn(handle_connection(stream, context).instrument(span));
                    },
                    Err(e) => {
                        warn!(error = %e, "failed to accept control connection");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    },
                },
            }
        }

        info!(path = %self.context.socket_path.display(), "control plane shutting down");
        let path = self.context.socket_path.clone();
        drop(self.listener);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ControlPlaneError::Io { path, source: e }),
        }
    }

    /// Run [`serve`](Self::serve) on a background task.
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<ControlPlaneResult<()>> {
        tokio::spawn(self.serve())
    }
}

async fn handle_connection(mut stream: UnixStream, context: Arc<ServerContext>) {
    debug!("connection accepted");

    let mut buf = vec![0u8; context.max_message_bytes];
    let n = match stream.read(&mut buf).await {
        Ok(0) => {
            debug!("connection closed before any data");
            return;
        },
        Ok(n) => n,
        Err(e) => {
            warn!(error = %e, "failed to read from connection");
            return;
        },
    };
    let raw = buf.get(..n).unwrap_or_default();
    debug!(bytes = n, message = %String::from_utf8_lossy(raw), "message received");

    if let Err(e) = stream.write_all(ACK_TOKEN).await {
        warn!(error = %e, "failed to write acknowledgement");
        return;
    }

    let message = match InboundMessage::parse(raw) {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, "discarding malformed message");
            return;
        },
    };
    debug!(
        reply_to = %message.reply_to,
        topic = %message.topic,
        message_id = %message.message_id,
        action = %message.action,
        "message parsed"
    );

    let Some(response) = respond(&message, &context.manifest_url, &context.process) else {
        debug!(action = %message.action, "no handler for action");
        return;
    };

    match deliver(&message.reply_to, &context.own_address(), &response).await {
        Ok(_) => info!(action = %message.action, reply_to = %message.reply_to, "reply delivered"),
        Err(e) => warn!(error = %e, "failed to deliver reply"),
    }
}
