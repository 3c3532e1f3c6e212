//! Command bridge between UI surfaces and the connection session.
//!
//! This is the only module allowed to reference both the network layer and
//! the UI process boundary.  UI windows invoke the `ws_*` command functions;
//! each returns a [`CommandResult`] envelope:
//!
//! ```json
//! { "success": true,  "data": {...}, "error": null  }
//! { "success": false, "data": null,  "error": "..."  }
//! ```
//!
//! so the scripting side has one error-handling pattern for every command.
//!
//! # DTOs
//!
//! [`SessionHandle`] and [`SessionEvent`] carry channels and typed enums that
//! must not cross the process boundary.  [`StatusDto`] and [`EventDto`] are
//! the plain serializable snapshots that do.  `EventDto` keeps the event
//! vocabulary the windows already speak: `ws-open`, `ws-message`,
//! `ws-close`, `ws-error`.
//!
//! # Session ownership
//!
//! `ShellState` owns at most one session at a time.  `ws_connect` with the
//! URL of the live session is an idempotent re-connect request; a different
//! URL tears the old session down and spawns a fresh one.  The field is a
//! `tokio::sync::Mutex` because the command handlers are async and the
//! teardown path awaits the session's acknowledgement.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tracing::info;

use voicelink_core::ServerMessage;

use crate::infrastructure::network::{
    SessionConfig, SessionEvent, SessionHandle, Transport,
};

// ── Shared application state ──────────────────────────────────────────────────

/// Runtime state shared between UI commands.
pub struct ShellState {
    /// The live session, if one has been spawned.
    session: Mutex<Option<SessionHandle>>,
    /// Transport used when spawning sessions.
    transport: Arc<dyn Transport>,
    /// Timing defaults applied to every spawned session.
    defaults: SessionConfig,
}

impl ShellState {
    /// Creates shell state with no session yet.
    pub fn new(transport: Arc<dyn Transport>, defaults: SessionConfig) -> Arc<Self> {
        Arc::new(Self {
            session: Mutex::new(None),
            transport,
            defaults,
        })
    }
}

// ── DTOs ──────────────────────────────────────────────────────────────────────

/// Unified response wrapper for UI commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    /// `true` if the command completed successfully; `false` on error.
    pub success: bool,
    /// The command's return value, present only when `success` is `true`.
    pub data: Option<T>,
    /// A human-readable error message, present only when `success` is `false`.
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    /// Constructs a successful result containing `data`.
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    /// Constructs an error result containing the given message.
    pub fn err(msg: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(msg.into()) }
    }
}

/// Connection status snapshot returned to UI surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusDto {
    /// One of `disconnected`, `connecting`, `connected`, `closing`,
    /// `reconnecting`.
    pub status: String,
    /// Endpoint of the current session, absent before the first connect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Serializable event envelope forwarded to UI windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventDto {
    /// The connection was established.
    #[serde(rename = "ws-open")]
    Open,
    /// An inbound server message; `payload` is the frame in its wire shape.
    #[serde(rename = "ws-message")]
    Message { payload: Value },
    /// The connection ended.
    #[serde(rename = "ws-close")]
    Close { code: u16, reason: String },
    /// A transport or decode failure; the session keeps running.
    #[serde(rename = "ws-error")]
    Error { message: String },
}

impl From<SessionEvent> for EventDto {
    fn from(event: SessionEvent) -> Self {
        match event {
            SessionEvent::Opened => Self::Open,
            SessionEvent::Message(msg) => Self::Message { payload: message_payload(msg) },
            SessionEvent::Closed { code, reason } => Self::Close { code, reason },
            SessionEvent::Error(message) => Self::Error { message },
        }
    }
}

/// Renders a [`ServerMessage`] back into its wire-shaped JSON value.
///
/// Unknown messages already carry the original frame; known variants
/// serialize to the same tagged object the server sent.
fn message_payload(msg: ServerMessage) -> Value {
    match msg {
        ServerMessage::Unknown { payload, .. } => payload,
        other => serde_json::to_value(&other).unwrap_or(Value::Null),
    }
}

// ── UI commands ───────────────────────────────────────────────────────────────

/// Connects to `url`, reusing the live session when the endpoint matches.
///
/// With a matching URL this is an idempotent re-connect request (a no-op
/// while already connecting or open).  With a different URL the old session
/// is closed and a new one is spawned.
pub async fn ws_connect(state: &ShellState, url: &str) -> CommandResult<StatusDto> {
    let mut guard = state.session.lock().await;

    match guard.as_ref() {
        Some(session) if session.endpoint() == url => session.connect(),
        _ => {
            if let Some(old) = guard.take() {
                info!("switching endpoint {} -> {url}", old.endpoint());
                old.close().await;
            }
            let config = SessionConfig {
                url: url.to_string(),
                ..state.defaults.clone()
            };
            let session = SessionHandle::spawn(config, Arc::clone(&state.transport));
            session.connect();
            *guard = Some(session);
        }
    }

    CommandResult::ok(status_of(guard.as_ref()))
}

/// Sends one JSON payload to the server.
///
/// Returns `ok(true)` only if the connection was open and the frame was
/// handed to the transport; `ok(false)` otherwise.  Nothing is buffered.
pub async fn ws_send(state: &ShellState, payload: &Value) -> CommandResult<bool> {
    let guard = state.session.lock().await;
    let Some(session) = guard.as_ref() else {
        return CommandResult::ok(false);
    };
    match serde_json::to_string(payload) {
        Ok(frame) => CommandResult::ok(session.send(frame).await),
        Err(e) => CommandResult::err(format!("payload not serializable: {e}")),
    }
}

/// Tears the connection down deliberately.  No reconnect follows.
pub async fn ws_close(state: &ShellState) -> CommandResult<()> {
    let guard = state.session.lock().await;
    if let Some(session) = guard.as_ref() {
        session.close().await;
    }
    CommandResult::ok(())
}

/// Returns the current connection status snapshot.
pub async fn ws_get_status(state: &ShellState) -> CommandResult<StatusDto> {
    let guard = state.session.lock().await;
    CommandResult::ok(status_of(guard.as_ref()))
}

/// Registers a subscriber under `key` and returns its event stream.
///
/// Returns `None` when no session exists yet (`ws_connect` first).  The
/// stream yields every subsequent session event as a serializable
/// [`EventDto`]; the caller forwards them to its window.
pub async fn ws_subscribe(
    state: &ShellState,
    key: &str,
) -> Option<mpsc::UnboundedReceiver<EventDto>> {
    let guard = state.session.lock().await;
    let session = guard.as_ref()?;
    let mut events = session.subscribe(key.to_string());

    let (dto_tx, dto_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if dto_tx.send(EventDto::from(event)).is_err() {
                break;
            }
        }
    });
    Some(dto_rx)
}

/// Removes the subscriber registered under `key`, if any.
pub async fn ws_unsubscribe(state: &ShellState, key: &str) {
    let guard = state.session.lock().await;
    if let Some(session) = guard.as_ref() {
        session.unsubscribe(key.to_string());
    }
}

fn status_of(session: Option<&SessionHandle>) -> StatusDto {
    match session {
        Some(s) => StatusDto {
            status: s.state().as_status_str().to_string(),
            url: Some(s.endpoint().to_string()),
        },
        None => StatusDto {
            status: "disconnected".to_string(),
            url: None,
        },
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
