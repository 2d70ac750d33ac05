//! Reply delivery over a fresh connection to the runtime's socket.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::{debug, warn};

use crate::envelope::{ACK_TOKEN, frame};
use crate::error::{DeliveryError, DeliveryResult};
use crate::responses::Response;

/// Largest acknowledgement read back from the runtime.
pub const MAX_ACK_BYTES: usize = 1024;

/// What the runtime sent back after receiving a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acknowledgement {
    /// Exactly the expected token.
    Expected,
    /// Anything else, including nothing.
    Unexpected(Vec<u8>),
}

/// Send `response` to `reply_to`, framed with our own address, and wait for
/// the runtime's acknowledgement.
///
/// There is no timeout on the acknowledgement read. A peer that accepts and
/// never answers holds only the calling task.
///
/// # Errors
///
/// Returns a [`DeliveryError`] if encoding, connecting, writing or reading
/// fails. An unexpected acknowledgement is not an error; it is logged and
/// returned as [`Acknowledgement::Unexpected`].
pub async fn deliver(
    reply_to: &str,
    own_address: &str,
    response: &Response,
) -> DeliveryResult<Acknowledgement> {
    let json = response.to_json().map_err(DeliveryError::Encode)?;
    let message = frame(own_address, &json);

    let mut stream = UnixStream::connect(reply_to)
        .await
        .map_err(|e| DeliveryError::Connect {
            address: reply_to.to_owned(),
            source: e,
        })?;
    debug!(address = reply_to, "connected to reply socket");

    stream
        .write_all(message.as_bytes())
        .await
        .map_err(|e| DeliveryError::Send {
            address: reply_to.to_owned(),
            source: e,
        })?;
    debug!(address = reply_to, bytes = message.len(), "reply sent, awaiting acknowledgement");

    let mut buf = [0u8; MAX_ACK_BYTES];
    let n = stream
        .read(&mut buf)
        .await
        .map_err(|e| DeliveryError::Receive {
            address: reply_to.to_owned(),
            source: e,
        })?;
    let ack = buf.get(..n).unwrap_or_default();

    if ack == ACK_TOKEN {
        debug!(address = reply_to, "reply acknowledged");
        Ok(Acknowledgement::Expected)
    } else {
        warn!(
            address = reply_to,
            received = %String::from_utf8_lossy(ack),
            "unexpected acknowledgement from runtime"
        );
        Ok(Acknowledgement::Unexpected(ack.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rvm_runtime::Arch;
    use tokio::net::UnixListener;

    use super::*;
    use crate::responses::{ProcessInfo, rvm_info};

    fn response() -> Response {
        rvm_info(
            "m1",
            &ProcessInfo {
                start_time: "2026-01-01 00:00:00".to_owned(),
                executable: PathBuf::from("/usr/bin/rvm"),
                working_dir: PathBuf::from("/usr/bin"),
                arch: Arch::X64,
            },
        )
    }

    /// Accept one connection, record what was sent, answer with `ack`.
    async fn peer(listener: UnixListener, ack: &'static [u8]) -> Vec<u8> {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 64 * 1024];
        let n = stream.read(&mut buf).await.unwrap();
        stream.write_all(ack).await.unwrap();
        buf.truncate(n);
        buf
    }

    #[tokio::test]
    async fn delivers_framed_reply() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rt.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let received = tokio::spawn(peer(listener, b"RESP"));

        let ack = deliver(path.to_str().unwrap(), "/tmp/own.sock", &response())
            .await
            .unwrap();
        let sent = String::from_utf8(received.await.unwrap()).unwrap();

        assert_eq!(ack, Acknowledgement::Expected);
        let (address, json) = sent.split_once(":S:").unwrap();
        assert_eq!(address, "/tmp/own.sock");
        let body: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(body["messageId"], "m1");
    }

    #[tokio::test]
    async fn unexpected_ack_is_reported_not_failed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rt.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let _peer = tokio::spawn(peer(listener, b"NOPE"));

        let ack = deliver(path.to_str().unwrap(), "/tmp/own.sock", &response())
            .await
            .unwrap();
        assert_eq!(ack, Acknowledgement::Unexpected(b"NOPE".to_vec()));
    }

    #[tokio::test]
    async fn missing_peer_is_connect_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.sock");

        let err = deliver(path.to_str().unwrap(), "/tmp/own.sock", &response())
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Connect { .. }), "{err}");
    }
}
