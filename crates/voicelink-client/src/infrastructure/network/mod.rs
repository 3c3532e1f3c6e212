//! Network infrastructure for the shell application.
//!
//! Maintains one long-lived WebSocket connection to the backend server and
//! fans inbound traffic out to UI subscribers.
//!
//! Architecture:
//! - [`transport`] — the dial-and-pump abstraction over the socket.  The
//!   session never touches `tokio-tungstenite` directly, which is what lets
//!   the test suite drive it with a scripted fake.
//! - [`session`] — the actor that owns the connection lifecycle: connect,
//!   heartbeat, reconnect-on-abnormal-close, and teardown.  All transitions
//!   happen on one task.
//! - [`registry`] — the subscriber table the session fans events out through.
//! - [`router`] — classifies each inbound text frame into a session event.

pub mod registry;
pub mod router;
pub mod session;
pub mod transport;

pub use registry::SubscriberRegistry;
pub use router::route_frame;
pub use session::{SessionConfig, SessionEvent, SessionHandle, SessionState};
pub use transport::{Transport, TransportError, TransportEvent, TransportLink, WsTransport};
