//! Wire framing: `<address>:S:<json>`.
//!
//! The same framing is used in both directions. Inbound, `<address>` is the
//! socket the sender wants replies on; outbound, it is our own socket path.

use serde_json::Value;

use crate::error::{ProtocolError, ProtocolResult};

/// Separator between address and JSON body.
pub const SEPARATOR: &str = ":S:";

/// Acknowledgement written back on every connection that sent data.
pub const ACK_TOKEN: &[u8] = b"RESP";

/// A parsed inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Socket address to deliver any reply to.
    pub reply_to: String,
    /// `topic`, or empty.
    pub topic: String,
    /// `messageId`, or empty.
    pub message_id: String,
    /// `payload.action`, or empty.
    pub action: String,
    /// The full JSON body.
    pub body: Value,
}

impl InboundMessage {
    /// Parse raw bytes received from a connection.
    ///
    /// The address is everything before the first separator. Missing or
    /// non-string `topic`, `messageId` and `payload.action` become empty
    /// strings.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::MalformedEnvelope`] when there is no separator,
    /// [`ProtocolError::MalformedPayload`] when the body is not JSON.
    pub fn parse(raw: &[u8]) -> ProtocolResult<Self> {
        let sep = SEPARATOR.as_bytes();
        let split = raw
            .windows(sep.len())
            .position(|w| w == sep)
            .ok_or(ProtocolError::MalformedEnvelope)?;

        let (address, rest) = raw.split_at(split);
        let json = rest.get(sep.len()..).unwrap_or_default();
        let body: Value = serde_json::from_slice(json).map_err(ProtocolError::MalformedPayload)?;

        let text = |pointer: &str| {
            body.pointer(pointer)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned()
        };

        Ok(Self {
            reply_to: String::from_utf8_lossy(address).into_owned(),
            topic: text("/topic"),
            message_id: text("/messageId"),
            action: text("/payload/action"),
            body,
        })
    }
}

/// Frame an encoded JSON body for sending.
#[must_use]
pub fn frame(address: &str, json: &str) -> String {
    let mut out = String::with_capacity(
        address
            .len()
            .saturating_add(SEPARATOR.len())
            .saturating_add(json.len()),
    );
    out.push_str(address);
    out.push_str(SEPARATOR);
    out.push_str(json);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_message() {
        let msg = InboundMessage::parse(
            br#"/tmp/rt.sock:S:{"topic":"system","messageId":"m1","payload":{"action":"get-rvm-info"}}"#,
        )
        .unwrap();

        assert_eq!(msg.reply_to, "/tmp/rt.sock");
        assert_eq!(msg.topic, "system");
        assert_eq!(msg.message_id, "m1");
        assert_eq!(msg.action, "get-rvm-info");
    }

    #[test]
    fn splits_at_first_separator() {
        let msg = InboundMessage::parse(br#"X:S:{"topic":"a:S:b"}"#).unwrap();
        assert_eq!(msg.reply_to, "X");
        assert_eq!(msg.topic, "a:S:b");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let msg = InboundMessage::parse(b"X:S:{}").unwrap();
        assert_eq!(msg.topic, "");
        assert_eq!(msg.message_id, "");
        assert_eq!(msg.action, "");
    }

    #[test]
    fn non_string_fields_default_to_empty() {
        let msg = InboundMessage::parse(br#"X:S:{"messageId":7,"payload":"flat"}"#).unwrap();
        assert_eq!(msg.message_id, "");
        assert_eq!(msg.action, "");
    }

    #[test]
    fn empty_address_is_allowed() {
        let msg = InboundMessage::parse(b":S:{}").unwrap();
        assert_eq!(msg.reply_to, "");
    }

    #[test]
    fn missing_separator_is_malformed_envelope() {
        let err = InboundMessage::parse(br#"{"topic":"system"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedEnvelope));
    }

    #[test]
    fn bad_json_is_malformed_payload() {
        let err = InboundMessage::parse(b"X:S:{not json").unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedPayload(_)));
    }

    #[test]
    fn frame_joins_address_and_body() {
        assert_eq!(frame("/tmp/a", r#"{"x":1}"#), r#"/tmp/a:S:{"x":1}"#);
    }
}
