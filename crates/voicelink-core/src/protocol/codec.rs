//! JSON frame codec: text frame ⇄ typed message.
//!
//! Decoding is a two-step classification rather than a plain
//! `serde_json::from_str::<ServerMessage>`:
//!
//! 1. Parse the frame as a JSON value and read its `"type"` field.
//! 2. If the type is one this build models, decode it into the typed
//!    variant; field-level problems in a known type are a hard
//!    [`DecodeError`].  If the type is *not* modelled, the whole frame is
//!    wrapped in [`ServerMessage::Unknown`] instead — an older shell must
//!    keep working against a newer server.
//!
//! A decode error never tears down the connection; the caller reports it
//! and moves on to the next frame.

use serde_json::Value;
use thiserror::Error;

use super::messages::{ClientMessage, ServerMessage};

/// The WebSocket close code for a normal, deliberate closure (RFC 6455).
///
/// A close with this code is terminal; any other code is treated as an
/// abnormal termination and triggers reconnection.
pub const CLOSE_NORMAL: u16 = 1000;

/// Errors produced while decoding an inbound text frame.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The frame was not valid JSON at all.
    #[error("frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The frame parsed as JSON but carries no string `"type"` field,
    /// so it cannot be classified.
    #[error("frame has no string \"type\" field")]
    MissingType,

    /// The frame's `"type"` names a known message, but its fields do not
    /// match that message's schema.
    #[error("malformed {message_type:?} frame: {source}")]
    Malformed {
        /// The `"type"` value of the offending frame.
        message_type: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Decodes one inbound text frame into a [`ServerMessage`].
///
/// Unrecognised message types are preserved as [`ServerMessage::Unknown`]
/// with the full original payload.
///
/// # Errors
///
/// Returns [`DecodeError`] if the frame is not JSON, has no `"type"` field,
/// or names a known type whose fields fail to decode.
pub fn decode_frame(text: &str) -> Result<ServerMessage, DecodeError> {
    let value: Value = serde_json::from_str(text)?;

    let Some(message_type) = value.get("type").and_then(Value::as_str) else {
        return Err(DecodeError::MissingType);
    };

    if !ServerMessage::is_known_type(message_type) {
        return Ok(ServerMessage::Unknown {
            message_type: message_type.to_string(),
            payload: value,
        });
    }

    let message_type = message_type.to_string();
    serde_json::from_value(value).map_err(|source| DecodeError::Malformed {
        message_type,
        source,
    })
}

/// Serializes an outbound [`ClientMessage`] into its text-frame form.
///
/// # Errors
///
/// Returns the underlying serializer error; with the message shapes in this
/// crate that can only happen if serde_json itself fails.
pub fn encode_frame(message: &ClientMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
