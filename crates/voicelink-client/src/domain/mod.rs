//! Domain layer: configuration schema and session-facing types.
//!
//! This layer has no dependency on sockets, timers, or the UI bridge.  The
//! infrastructure layer depends on it, never the other way around.

pub mod config;

pub use config::{ServerConfig, ShellConfig, ShellSettings};
