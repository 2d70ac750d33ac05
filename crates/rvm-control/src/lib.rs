//! Local control plane for rvm.
//!
//! Runtimes talk to rvm over a Unix domain socket using `<address>:S:<json>`
//! frames. Every inbound connection carries one message and receives the
//! 4-byte token `RESP`. Replies, when an action has one, travel over a new
//! connection to the address the sender named.
//!
//! Handled actions:
//!
//! | action                        | reply topic   |
//! |-------------------------------|---------------|
//! | `get-desktop-owner-settings`  | `application` |
//! | `get-rvm-info`                | `system`      |
//!
//! Anything else is acknowledged and dropped.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod delivery;
mod dispatch;
mod envelope;
mod error;
mod responses;
mod server;

pub use delivery::{Acknowledgement, MAX_ACK_BYTES, deliver};
pub use dispatch::{Action, respond};
pub use envelope::{ACK_TOKEN, InboundMessage, SEPARATOR, frame};
pub use error::{
    ControlPlaneError, ControlPlaneResult, DeliveryError, DeliveryResult, ProtocolError,
    ProtocolResult,
};
pub use responses::{
    DesktopOwnerSettings, ProcessInfo, RVM_VERSION, Reply, Response, RvmInfo, START_TIME_FORMAT,
    desktop_owner_settings, rvm_info,
};
pub use server::{ControlPlaneServer, ServerContext};
