//! Infrastructure layer: everything that touches sockets, timers, or the UI
//! process boundary.
//!
//! - [`network`] — the persistent server connection: transport abstraction,
//!   session state machine, subscriber registry, frame router.
//! - [`ui_bridge`] — command functions and DTOs exposed to UI surfaces.

pub mod network;
pub mod ui_bridge;
