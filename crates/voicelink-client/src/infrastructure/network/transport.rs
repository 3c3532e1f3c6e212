//! Transport abstraction over the WebSocket connection.
//!
//! The session state machine only ever sees a [`TransportLink`]: an outbound
//! sender of text frames plus an inbound stream of [`TransportEvent`]s.  The
//! real implementation ([`WsTransport`]) dials with `tokio-tungstenite` and
//! runs a pump task that bridges the socket to those channels; tests provide
//! a scripted implementation of the same [`Transport`] trait.
//!
//! A link emits at most one terminal event (`Closed` or `Error`) and then
//! stops.  Dropping the `TransportLink` (specifically its `outbound` sender)
//! tells the pump to send a close frame and shut the socket down.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, warn};

/// Close code reported when the socket ends without a close handshake
/// (RFC 6455 "abnormal closure").
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Errors produced while establishing a connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The WebSocket handshake to the server failed.
    #[error("failed to connect to {url}: {reason}")]
    ConnectFailed { url: String, reason: String },
}

/// Events a live link delivers to the session.
#[derive(Debug)]
pub enum TransportEvent {
    /// An inbound text frame.
    Frame(String),
    /// The connection ended with a close code.  `1000` is a deliberate
    /// closure; anything else is abnormal.
    Closed { code: u16, reason: String },
    /// The connection failed mid-stream without a close handshake.
    Error(String),
}

/// Handles to a live connection.
///
/// Frames written to `outbound` are sent to the server as text frames in
/// order.  `events` yields inbound traffic and exactly one terminal
/// `Closed`/`Error` event.
pub struct TransportLink {
    /// Outbound text frames.  Dropping this sender closes the connection.
    pub outbound: mpsc::UnboundedSender<String>,
    /// Inbound frames and lifecycle events.
    pub events: mpsc::Receiver<TransportEvent>,
}

/// Dials a server endpoint and produces a [`TransportLink`].
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Establishes a connection to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConnectFailed`] when the server cannot be
    /// reached or rejects the handshake.
    async fn connect(&self, url: &str) -> Result<TransportLink, TransportError>;
}

// ── WebSocket implementation ──────────────────────────────────────────────────

/// Production [`Transport`] backed by `tokio-tungstenite`.
pub struct WsTransport;

#[async_trait]
impl Transport for WsTransport {
    async fn connect(&self, url: &str) -> Result<TransportLink, TransportError> {
        let (socket, response) = connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        debug!("websocket handshake complete, HTTP status {}", response.status());

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (evt_tx, evt_rx) = mpsc::channel(128);
        tokio::spawn(pump(socket, out_rx, evt_tx));

        Ok(TransportLink {
            outbound: out_tx,
            events: evt_rx,
        })
    }
}

/// Drives one socket until it ends: writes queued outbound frames, forwards
/// inbound text frames, and emits exactly one terminal event.
async fn pump(
    socket: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    mut out_rx: mpsc::UnboundedReceiver<String>,
    evt_tx: mpsc::Sender<TransportEvent>,
) {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            queued = out_rx.recv() => match queued {
                Some(text) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        warn!("websocket write failed: {e}");
                        let _ = evt_tx.send(TransportEvent::Error(e.to_string())).await;
                        return;
                    }
                }
                None => {
                    // Link dropped by the session: close deliberately.
                    let _ = sink.send(Message::Close(None)).await;
                    return;
                }
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if evt_tx.send(TransportEvent::Frame(text)).await.is_err() {
                        return;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = match frame {
                        Some(f) => (u16::from(f.code), f.reason.to_string()),
                        None => (CLOSE_ABNORMAL, String::new()),
                    };
                    let _ = evt_tx.send(TransportEvent::Closed { code, reason }).await;
                    return;
                }
                // Control frames are answered by tungstenite itself; binary
                // frames are not part of this protocol.
                Some(Ok(other)) => {
                    debug!("ignoring non-text frame: {other:?}");
                }
                Some(Err(e)) => {
                    let _ = evt_tx.send(TransportEvent::Error(e.to_string())).await;
                    return;
                }
                None => {
                    // Stream ended without a close handshake.
                    let _ = evt_tx
                        .send(TransportEvent::Closed {
                            code: CLOSE_ABNORMAL,
                            reason: "connection lost".to_string(),
                        })
                        .await;
                    return;
                }
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
