//! Classifies inbound text frames into session events.
//!
//! One frame yields exactly one event: a decoded [`SessionEvent::Message`]
//! (unknown message types included, preserved as
//! `ServerMessage::Unknown`), or a single [`SessionEvent::Error`] when the
//! frame cannot be decoded.  A bad frame is dropped without touching the
//! connection; the session keeps running.

use tracing::warn;

use voicelink_core::decode_frame;

use super::session::SessionEvent;

/// Turns one inbound frame into the event delivered to subscribers.
pub fn route_frame(text: &str) -> SessionEvent {
    match decode_frame(text) {
        Ok(message) => SessionEvent::Message(message),
        Err(e) => {
            warn!("dropping undecodable frame: {e}");
            SessionEvent::Error(e.to_string())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use voicelink_core::ServerMessage;

    #[test]
    fn test_known_frame_routes_to_message_event() {
        // Arrange / Act
        let event = route_frame(r#"{"type":"pong","msg":"ok"}"#);

        // Assert
        let SessionEvent::Message(ServerMessage::Pong { msg }) = event else {
            panic!("expected Pong message event");
        };
        assert_eq!(msg.as_deref(), Some("ok"));
    }

    #[test]
    fn test_unknown_type_routes_as_message_not_error() {
        // Arrange / Act – a type this build does not model
        let event = route_frame(r#"{"type":"RoomInvite","room":"lobby"}"#);

        // Assert – preserved and surfaced, not treated as a failure
        assert!(matches!(
            event,
            SessionEvent::Message(ServerMessage::Unknown { .. })
        ));
    }

    #[test]
    fn test_malformed_frame_routes_to_single_error_event() {
        let event = route_frame("garbage {{{");
        assert!(matches!(event, SessionEvent::Error(_)));
    }

    #[test]
    fn test_frame_without_type_routes_to_error_event() {
        let event = route_frame(r#"{"code":200}"#);
        assert!(matches!(event, SessionEvent::Error(_)));
    }

    #[test]
    fn test_known_type_with_bad_fields_routes_to_error_event() {
        // "UserLogin" is modelled, so a schema mismatch is a decode failure.
        let event = route_frame(r#"{"type":"UserLogin","code":"nope"}"#);
        assert!(matches!(event, SessionEvent::Error(_)));
    }
}
