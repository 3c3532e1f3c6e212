//! # voicelink-client
//!
//! Backend of the VoiceLink desktop shell: the persistent WebSocket
//! connection to the voice server, and the command bridge UI windows use to
//! drive it.
//!
//! # Layering
//!
//! - **`domain`** — configuration schema and persistence.  No I/O beyond the
//!   config file, no async.
//! - **`infrastructure`** — the network session (transport, state machine,
//!   subscriber registry, frame router) and the `ui_bridge` command surface.
//!
//! The domain layer never depends on infrastructure.  Within
//! infrastructure, only `ui_bridge` knows about UI concepts; the network
//! modules speak in terms of sessions, subscribers, and frames.

pub mod domain;
pub mod infrastructure;
