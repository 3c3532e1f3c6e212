//! # voicelink-core
//!
//! Shared library for the VoiceLink desktop shell containing the JSON wire
//! protocol spoken between the shell and the backend voice server.
//!
//! This crate is used by the shell application (`voicelink-client`) and by
//! any future tooling that needs to speak the protocol.  It has zero
//! dependencies on UI frameworks, sockets, or the async runtime.
//!
//! # Protocol overview
//!
//! The backend and the shell exchange WebSocket *text* frames, each a single
//! JSON object with a `"type"` field that identifies the message:
//!
//! ```json
//! {"type":"ping"}
//! {"type":"pong","msg":"ok"}
//! {"type":"UserLogin","code":200,"UserID":"u-1024"}
//! ```
//!
//! - **`protocol::messages`** – the typed inbound ([`ServerMessage`]) and
//!   outbound ([`ClientMessage`]) unions.
//! - **`protocol::codec`** – frame decoding with unknown-type preservation:
//!   a message type this build does not know about is surfaced as
//!   [`ServerMessage::Unknown`] rather than dropped, so newer servers can
//!   ship new message types without breaking older shells.

pub mod protocol;

// Re-export the most-used items at the crate root so callers can write
// `voicelink_core::ServerMessage` instead of the full path.
pub use protocol::codec::{decode_frame, encode_frame, DecodeError, CLOSE_NORMAL};
pub use protocol::messages::{ClientMessage, ServerMessage, UserData};
