//! Inbound notification envelope.

use serde::Deserialize;

/// Payload carried by a duplex-transport text frame.
///
/// Only `message` is required; senders may attach additional fields and the
/// renderer ignores them. The envelope is ephemeral: rendered once, never
/// stored.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationEnvelope {
    /// Free-form notification text
    pub message: String,
}

impl NotificationEnvelope {
    /// Parse a text frame as a notification envelope.
    ///
    /// Parsing is guarded: a malformed payload is an `Err`, never a panic,
    /// so bad server input can be logged and dropped without disturbing the
    /// connection.
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_envelope() {
        let envelope = NotificationEnvelope::parse(r#"{"message":"hello"}"#).unwrap();
        assert_eq!(envelope.message, "hello");
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let envelope =
            NotificationEnvelope::parse(r#"{"message":"hi","priority":3,"source":"demo"}"#)
                .unwrap();
        assert_eq!(envelope.message, "hi");
    }

    #[test]
    fn test_missing_message_is_an_error() {
        assert!(NotificationEnvelope::parse(r#"{"priority":3}"#).is_err());
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        assert!(NotificationEnvelope::parse("not json").is_err());
        assert!(NotificationEnvelope::parse("").is_err());
    }
}
