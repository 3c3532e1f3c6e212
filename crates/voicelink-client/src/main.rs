//! VoiceLink shell backend — entry point.
//!
//! Maintains one long-lived WebSocket connection to the VoiceLink server and
//! exposes it to UI surfaces through the `ui_bridge` command functions.  Run
//! standalone, this binary connects, subscribes, and logs every session
//! event; it doubles as a smoke-test harness against a real server.
//!
//! # Usage
//!
//! ```text
//! voicelink-client [OPTIONS]
//!
//! Options:
//!   --url <URL>                Server WebSocket URL [default: from config]
//!   --heartbeat-secs <SECS>    Heartbeat ping interval [default: from config]
//!   --reconnect-secs <SECS>    Reconnect delay [default: from config]
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable                  | Description                      |
//! |---------------------------|----------------------------------|
//! | `VOICELINK_URL`           | Server WebSocket URL             |
//! | `VOICELINK_HEARTBEAT`     | Heartbeat ping interval (secs)   |
//! | `VOICELINK_RECONNECT`     | Reconnect delay (secs)           |
//! | `RUST_LOG`                | Log filter (overrides config)    |
//!
//! # Configuration precedence
//!
//! CLI/env overrides > `config.toml` in the platform config directory >
//! built-in defaults (45 s heartbeat, 5 s reconnect).

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use voicelink_client::domain::config::{load_config, ShellConfig};
use voicelink_client::infrastructure::network::{SessionConfig, WsTransport};
use voicelink_client::infrastructure::ui_bridge::{
    ws_close, ws_connect, ws_subscribe, ShellState,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// VoiceLink shell backend.
///
/// Connects to the VoiceLink server and logs session events until Ctrl+C.
#[derive(Debug, Parser)]
#[command(
    name = "voicelink-client",
    about = "Persistent server connection for the VoiceLink desktop shell",
    version
)]
struct Cli {
    /// WebSocket URL of the VoiceLink server.
    ///
    /// Overrides the `server.url` field of the config file.
    #[arg(long, env = "VOICELINK_URL")]
    url: Option<String>,

    /// Heartbeat ping interval in seconds.
    ///
    /// While the connection is open, a `{"type":"ping"}` frame is sent this
    /// often to keep intermediaries from idling the connection out.
    #[arg(long, env = "VOICELINK_HEARTBEAT")]
    heartbeat_secs: Option<u64>,

    /// Reconnect delay in seconds.
    ///
    /// After an abnormal disconnect, the shell waits this long before
    /// redialling.  Deliberate closes (code 1000) never redial.
    #[arg(long, env = "VOICELINK_RECONNECT")]
    reconnect_secs: Option<u64>,
}

impl Cli {
    /// Applies the CLI overrides on top of the loaded config.
    fn apply_to(self, config: &mut ShellConfig) {
        if let Some(url) = self.url {
            config.server.url = url;
        }
        if let Some(secs) = self.heartbeat_secs {
            config.server.heartbeat_interval_secs = secs;
        }
        if let Some(secs) = self.reconnect_secs {
            config.server.reconnect_delay_secs = secs;
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config().context("failed to load configuration")?;
    cli.apply_to(&mut config);

    // `RUST_LOG` wins; otherwise the config file's log level applies.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.shell.log_level.clone())),
        )
        .init();

    info!(
        "VoiceLink shell starting — server={}, heartbeat={}s, reconnect={}s",
        config.server.url,
        config.server.heartbeat_interval_secs,
        config.server.reconnect_delay_secs
    );

    let state = ShellState::new(
        Arc::new(WsTransport),
        SessionConfig::from(&config.server),
    );

    ws_connect(&state, &config.server.url).await;
    let mut events = ws_subscribe(&state, "main")
        .await
        .context("session vanished before subscription")?;

    // Log events until Ctrl+C, then close deliberately so the server sees a
    // normal closure instead of a dropped socket.
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => info!("session event: {event:?}"),
                None => {
                    warn!("event stream ended");
                    break;
                }
            },
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => info!("received Ctrl+C — closing connection"),
                    Err(e) => warn!("failed to listen for Ctrl+C: {e}"),
                }
                break;
            }
        }
    }

    ws_close(&state).await;
    info!("VoiceLink shell stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
