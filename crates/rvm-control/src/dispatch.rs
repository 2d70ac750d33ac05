//! Action routing.

use crate::envelope::InboundMessage;
use crate::responses::{self, ProcessInfo, Response};

/// Actions the control plane answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `get-desktop-owner-settings`
    DesktopOwnerSettings,
    /// `get-rvm-info`
    RvmInfo,
    /// Anything else. Acknowledged but never answered.
    Unknown(String),
}

impl Action {
    /// Classify an action string. Matching is exact.
    #[must_use]
    pub fn parse(action: &str) -> Self {
        match action {
            "get-desktop-owner-settings" => Self::DesktopOwnerSettings,
            "get-rvm-info" => Self::RvmInfo,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

/// Build the reply for `message`, or `None` when the action is not handled.
///
/// `manifest_url` keys the desktop-owner settings payload.
#[must_use]
pub fn respond(message: &InboundMessage, manifest_url: &str, process: &ProcessInfo) -> Option<Response> {
    match Action::parse(&message.action) {
        Action::DesktopOwnerSettings => Some(responses::desktop_owner_settings(
            &message.message_id,
            manifest_url,
        )),
        Action::RvmInfo => Some(responses::rvm_info(&message.message_id, process)),
        Action::Unknown(_) => None,
    }
}
