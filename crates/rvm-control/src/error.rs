//! Error types for the control plane.

use std::path::PathBuf;

use thiserror::Error;

/// An inbound message that cannot be understood.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// No `:S:` separator between reply address and body.
    #[error("message has no ':S:' separator")]
    MalformedEnvelope,

    /// The body after the separator is not JSON.
    #[error("message body is not valid JSON: {0}")]
    MalformedPayload(#[source] serde_json::Error),
}

/// Failure to deliver a reply to a runtime's socket.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The reply could not be serialized.
    #[error("failed to encode reply: {0}")]
    Encode(#[source] serde_json::Error),

    /// Could not connect to the reply address.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        /// Reply socket address.
        address: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Could not write the framed reply.
    #[error("failed to send reply to {address}: {source}")]
    Send {
        /// Reply socket address.
        address: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Could not read the acknowledgement.
    #[error("failed to read acknowledgement from {address}: {source}")]
    Receive {
        /// Reply socket address.
        address: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Failure to run the control-plane server.
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    /// The listening socket could not be bound.
    #[error("failed to bind control socket {}: {source}", path.display())]
    Bind {
        /// Socket path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Filesystem failure while preparing or cleaning up the socket path.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path being operated on.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for message parsing.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
/// Result type for reply delivery.
pub type DeliveryResult<T> = Result<T, DeliveryError>;
/// Result type for the server.
pub type ControlPlaneResult<T> = Result<T, ControlPlaneError>;
