//! JSON message types for the shell ↔ backend WebSocket protocol.
//!
//! Every frame is a JSON object with a `"type"` field that identifies the
//! variant; all other fields sit in the same object.  Serde's
//! `#[serde(tag = "type")]` attribute handles the discriminant automatically.
//!
//! # Why two separate unions?
//!
//! The two directions carry different information:
//!
//! - The shell *sends* requests (login, verification code, user data) and
//!   the periodic heartbeat ping.
//! - The server *sends* results keyed to those requests, plus the heartbeat
//!   reply.
//!
//! Using distinct enums makes it a compile-time error to feed a
//! server-only message into the outbound path, and vice versa.
//!
//! # Unknown message types
//!
//! The server is free to introduce new message types at any time.  The shell
//! must surface those to its consumers rather than drop them, so the decoder
//! in [`super::codec`] maps any unrecognised `"type"` to
//! [`ServerMessage::Unknown`] with the full payload preserved.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Server → shell messages ───────────────────────────────────────────────────

/// All messages the backend server can send to the shell.
///
/// # Serde representation
///
/// ```json
/// {"type":"UserLogin","code":200,"UserID":"u-1024"}
/// {"type":"CAPTCHA","code":200,"msg":"sent"}
/// {"type":"pong","msg":"ok"}
/// {"type":"GetUserData","code":200,"UserData":{"name":"ada","avatar":"…"}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Result of a `UserLogin` request.
    ///
    /// `code` 200 means the credentials were accepted and `UserID` carries
    /// the account identifier the shell uses for subsequent requests.  Any
    /// other code is a rejection; `msg` holds the human-readable reason.
    #[serde(rename = "UserLogin")]
    LoginResult {
        /// Server result code (200 = success).
        code: u16,
        /// Human-readable status message, present on failure.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        msg: Option<String>,
        /// Account identifier, present on success.
        #[serde(rename = "UserID", default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    },

    /// Result of a `CAPTCHA` (email verification code) request.
    #[serde(rename = "CAPTCHA")]
    CaptchaResult {
        /// Server result code (200 = code was emailed).
        code: u16,
        /// Human-readable status message, present on failure.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        msg: Option<String>,
    },

    /// Heartbeat reply to the shell's `{"type":"ping"}` keepalive.
    ///
    /// Delivered to subscribers unmodified so the UI can show liveness;
    /// the session itself never interprets it.
    #[serde(rename = "pong")]
    Pong {
        /// Free-form liveness text from the server.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        msg: Option<String>,
    },

    /// Result of a `GetUserData` request.
    #[serde(rename = "GetUserData")]
    UserDataResult {
        /// Server result code (200 = success).
        code: u16,
        /// Profile payload, present on success.
        #[serde(rename = "UserData", default, skip_serializing_if = "Option::is_none")]
        user_data: Option<UserData>,
    },

    /// A message type this build does not recognise.
    ///
    /// `payload` is the complete original JSON object, so consumers that do
    /// know the type can still act on it.
    Unknown {
        /// The wire value of the `"type"` field.
        message_type: String,
        /// The full, unmodified frame.
        payload: Value,
    },
}

impl ServerMessage {
    /// Returns the wire-level `"type"` discriminant for this message.
    #[must_use]
    pub fn message_type(&self) -> &str {
        match self {
            Self::LoginResult { .. } => "UserLogin",
            Self::CaptchaResult { .. } => "CAPTCHA",
            Self::Pong { .. } => "pong",
            Self::UserDataResult { .. } => "GetUserData",
            Self::Unknown { message_type, .. } => message_type,
        }
    }

    /// Returns `true` if `message_type` is a type this build decodes into a
    /// typed variant (as opposed to [`ServerMessage::Unknown`]).
    #[must_use]
    pub fn is_known_type(message_type: &str) -> bool {
        matches!(
            message_type,
            "UserLogin" | "CAPTCHA" | "pong" | "GetUserData"
        )
    }
}

/// Profile payload carried by [`ServerMessage::UserDataResult`].
///
/// The server owns this schema and extends it freely; fields the shell does
/// not model are preserved in `extra` rather than discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Avatar image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Any additional profile fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// ── Shell → server messages ───────────────────────────────────────────────────

/// All messages the shell can send to the backend server.
///
/// # Serde representation
///
/// ```json
/// {"type":"ping"}
/// {"type":"UserLogin","username":"ada@example.com","password":"…"}
/// {"type":"UserLogin","username":"ada@example.com","vercode":"123456","method":"vercode"}
/// {"type":"CAPTCHA","email":"ada@example.com","state":"login"}
/// {"type":"GetUserData","UserID":"u-1024"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Heartbeat keepalive, sent on a fixed interval while the connection
    /// is open.
    #[serde(rename = "ping")]
    Ping,

    /// Login request.  Either `password` or `vercode` + `method` is set,
    /// depending on which login flow the user chose.
    #[serde(rename = "UserLogin")]
    Login {
        /// Account email address.
        username: String,
        /// Password, for the password flow.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<String>,
        /// One-time verification code, for the code flow.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        vercode: Option<String>,
        /// Login flow discriminator (`"vercode"` for the code flow).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        method: Option<String>,
    },

    /// Request an email verification code.
    #[serde(rename = "CAPTCHA")]
    RequestCaptcha {
        /// Destination email address.
        email: String,
        /// Which flow the code is for (free-form server hint).
        state: String,
    },

    /// Request the profile data for an account.
    #[serde(rename = "GetUserData")]
    GetUserData {
        /// Account identifier from a successful login.
        #[serde(rename = "UserID")]
        user_id: String,
    },
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_serializes_to_bare_type_object() {
        // Arrange / Act
        let json = serde_json::to_string(&ClientMessage::Ping).unwrap();

        // Assert – exactly the frame the server's heartbeat handler expects
        assert_eq!(json, r#"{"type":"ping"}"#);
    }

    #[test]
    fn test_login_password_flow_omits_vercode_fields() {
        // Arrange
        let msg = ClientMessage::Login {
            username: "ada@example.com".to_string(),
            password: Some("hunter2".to_string()),
            vercode: None,
            method: None,
        };

        // Act
        let json = serde_json::to_string(&msg).unwrap();

        // Assert – None fields must not appear on the wire
        assert!(json.contains(r#""type":"UserLogin""#));
        assert!(json.contains(r#""password":"hunter2""#));
        assert!(!json.contains("vercode"));
        assert!(!json.contains("method"));
    }

    #[test]
    fn test_get_user_data_uses_wire_field_name() {
        let msg = ClientMessage::GetUserData {
            user_id: "u-1024".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""UserID":"u-1024""#));
    }

    #[test]
    fn test_login_result_deserializes_from_server_frame() {
        // Arrange – frame as the server sends it on success
        let json = r#"{"type":"UserLogin","code":200,"UserID":"u-7"}"#;

        // Act
        let msg: ServerMessage = serde_json::from_str(json).unwrap();

        // Assert
        match msg {
            ServerMessage::LoginResult { code, user_id, msg } => {
                assert_eq!(code, 200);
                assert_eq!(user_id.as_deref(), Some("u-7"));
                assert_eq!(msg, None);
            }
            other => panic!("expected LoginResult, got {other:?}"),
        }
    }

    #[test]
    fn test_pong_deserializes_with_and_without_msg() {
        let with: ServerMessage = serde_json::from_str(r#"{"type":"pong","msg":"ok"}"#).unwrap();
        let without: ServerMessage = serde_json::from_str(r#"{"type":"pong"}"#).unwrap();
        assert_eq!(with, ServerMessage::Pong { msg: Some("ok".to_string()) });
        assert_eq!(without, ServerMessage::Pong { msg: None });
    }

    #[test]
    fn test_user_data_preserves_unmodelled_fields() {
        // Arrange – server sends profile fields this build does not model
        let json = r#"{"type":"GetUserData","code":200,
            "UserData":{"name":"ada","avatar":"a.png","level":9}}"#;

        // Act
        let msg: ServerMessage = serde_json::from_str(json).unwrap();

        // Assert
        let ServerMessage::UserDataResult { user_data: Some(data), .. } = msg else {
            panic!("expected UserDataResult with data");
        };
        assert_eq!(data.name.as_deref(), Some("ada"));
        assert_eq!(data.extra.get("level"), Some(&serde_json::json!(9)));
    }

    #[test]
    fn test_message_type_reports_wire_discriminant() {
        let pong = ServerMessage::Pong { msg: None };
        assert_eq!(pong.message_type(), "pong");

        let unknown = ServerMessage::Unknown {
            message_type: "RoomInvite".to_string(),
            payload: serde_json::json!({"type": "RoomInvite"}),
        };
        assert_eq!(unknown.message_type(), "RoomInvite");
    }

    #[test]
    fn test_is_known_type_matches_typed_variants_only() {
        assert!(ServerMessage::is_known_type("pong"));
        assert!(ServerMessage::is_known_type("UserLogin"));
        assert!(!ServerMessage::is_known_type("RoomInvite"));
        assert!(!ServerMessage::is_known_type(""));
    }
}
