//! The connection session: a single actor task that owns the WebSocket
//! lifecycle for one server endpoint.
//!
//! # State machine
//!
//! ```text
//!              connect()                 handshake ok
//! Disconnected ─────────> Connecting ──────────────────> Open
//!      ^                      ^  │ handshake failed        │
//!      │                      │  └───────────┐             │ close code 1000
//!      │        timer fires   │              v             v
//!      │                  Reconnecting <── (Error)      Closing
//!      │                      ^                            │
//!      │                      │ abnormal close / error     │
//!      │                      └────────────── Open         │
//!      └───────────────────────────────────────────────────┘
//! ```
//!
//! Every transition happens on the actor task: commands from handles,
//! transport events, the heartbeat deadline, and the reconnect deadline all
//! arrive through one `select!` loop, so no locking is needed and no two
//! transitions can race.
//!
//! # Reconnect policy
//!
//! A close with code `1000` is deliberate and terminal.  Any other close, a
//! mid-stream error, or a failed dial schedules exactly one reconnect timer
//! at a fixed delay; further failures while that timer is pending do not
//! stack a second one.
//!
//! # Stale-attempt guard
//!
//! Dialling happens on a helper task so the actor stays responsive.  Each
//! dial carries an epoch number; `close()` and every new dial bump the
//! epoch, so a handshake that completes after the session moved on is
//! recognised as stale and its link is dropped on the floor.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep, Sleep};
use tracing::{debug, info, warn};

use voicelink_core::{encode_frame, ClientMessage, ServerMessage, CLOSE_NORMAL};

use super::registry::SubscriberRegistry;
use super::router::route_frame;
use super::transport::{Transport, TransportError, TransportEvent, TransportLink};

// ── Public types ──────────────────────────────────────────────────────────────

/// Lifecycle state of the session, readable through [`SessionHandle::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No connection and none pending.
    Disconnected,
    /// A dial is in flight.
    Connecting,
    /// The connection is established and the heartbeat is running.
    Open,
    /// A deliberate teardown is in progress.
    Closing,
    /// A reconnect timer is pending after an abnormal disconnect.
    Reconnecting,
}

impl SessionState {
    /// The status string reported to UI surfaces.
    #[must_use]
    pub fn as_status_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "connected",
            Self::Closing => "closing",
            Self::Reconnecting => "reconnecting",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_status_str())
    }
}

/// Events fanned out to every registered subscriber, in order.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The connection was established.
    Opened,
    /// An inbound message, decoded.
    Message(ServerMessage),
    /// The connection ended with a close code.
    Closed { code: u16, reason: String },
    /// A dial failure, mid-stream transport error, or undecodable frame.
    /// The session keeps running.
    Error(String),
}

/// Timing and endpoint parameters for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// WebSocket URL of the server.
    pub url: String,
    /// Interval between heartbeat pings while the connection is open.
    pub heartbeat_interval: Duration,
    /// Delay before redialling after an abnormal disconnect.
    pub reconnect_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8080/ws".to_string(),
            heartbeat_interval: Duration::from_secs(45),
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

impl From<&crate::domain::config::ServerConfig> for SessionConfig {
    fn from(cfg: &crate::domain::config::ServerConfig) -> Self {
        Self {
            url: cfg.url.clone(),
            heartbeat_interval: cfg.heartbeat_interval(),
            reconnect_delay: cfg.reconnect_delay(),
        }
    }
}

// ── Handle ────────────────────────────────────────────────────────────────────

/// Cloneable handle to a running session actor.
///
/// All methods are non-blocking except [`send`](Self::send) and
/// [`close`](Self::close), which wait for the actor's acknowledgement.
#[derive(Clone)]
pub struct SessionHandle {
    endpoint: Arc<str>,
    commands: mpsc::UnboundedSender<SessionCommand>,
    state: watch::Receiver<SessionState>,
}

impl SessionHandle {
    /// Spawns a new session actor for `config.url` and returns its handle.
    ///
    /// The session starts in [`SessionState::Disconnected`]; call
    /// [`connect`](Self::connect) to dial.
    pub fn spawn(config: SessionConfig, transport: Arc<dyn Transport>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionState::Disconnected);
        let (dial_tx, dial_rx) = mpsc::unbounded_channel();

        let endpoint: Arc<str> = Arc::from(config.url.as_str());
        let actor = SessionActor {
            config,
            transport,
            registry: SubscriberRegistry::new(),
            state: state_tx,
            dial_tx,
            link_out: None,
            link_events: None,
            heartbeat: None,
            reconnect: None,
            epoch: 0,
        };
        tokio::spawn(actor.run(cmd_rx, dial_rx));

        Self {
            endpoint,
            commands: cmd_tx,
            state: state_rx,
        }
    }

    /// The endpoint URL this session was spawned for.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Current lifecycle state, read without locking.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// A watch receiver that observes every state change.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Requests a dial.  Idempotent: a no-op while already connecting or
    /// open; while a reconnect timer is pending the timer is cancelled and
    /// the dial happens immediately.
    pub fn connect(&self) {
        let _ = self.commands.send(SessionCommand::Connect);
    }

    /// Sends one text frame to the server.
    ///
    /// Returns `true` only if the session was open and the frame was handed
    /// to the transport.  Frames are never buffered for later delivery.
    pub async fn send(&self, frame: String) -> bool {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .commands
            .send(SessionCommand::Send { frame, reply: reply_tx })
            .is_err()
        {
            return false;
        }
        reply_rx.await.unwrap_or(false)
    }

    /// Tears the connection down deliberately.
    ///
    /// Cancels any pending heartbeat, reconnect timer, and in-flight dial.
    /// When this returns, the session is [`SessionState::Disconnected`] and
    /// no further events will be delivered for the old connection.
    pub async fn close(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self
            .commands
            .send(SessionCommand::Close { done: done_tx })
            .is_ok()
        {
            let _ = done_rx.await;
        }
    }

    /// Registers a subscriber under `key` and returns its event stream.
    ///
    /// Registering the same key again replaces the previous sink; the old
    /// receiver stops getting events.
    pub fn subscribe(&self, key: impl Into<String>) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (sink, events) = mpsc::unbounded_channel();
        let _ = self.commands.send(SessionCommand::Subscribe {
            key: key.into(),
            sink,
        });
        events
    }

    /// Removes the subscriber registered under `key`, if any.
    pub fn unsubscribe(&self, key: impl Into<String>) {
        let _ = self.commands.send(SessionCommand::Unsubscribe { key: key.into() });
    }
}

// ── Actor internals ───────────────────────────────────────────────────────────

enum SessionCommand {
    Connect,
    Send {
        frame: String,
        reply: oneshot::Sender<bool>,
    },
    Close {
        done: oneshot::Sender<()>,
    },
    Subscribe {
        key: String,
        sink: mpsc::UnboundedSender<SessionEvent>,
    },
    Unsubscribe {
        key: String,
    },
}

/// Outcome of one dial attempt, tagged with the epoch it was started under.
type DialResult = (u64, Result<TransportLink, TransportError>);

struct SessionActor {
    config: SessionConfig,
    transport: Arc<dyn Transport>,
    registry: SubscriberRegistry,
    state: watch::Sender<SessionState>,
    dial_tx: mpsc::UnboundedSender<DialResult>,
    link_out: Option<mpsc::UnboundedSender<String>>,
    link_events: Option<mpsc::Receiver<TransportEvent>>,
    heartbeat: Option<Pin<Box<Sleep>>>,
    reconnect: Option<Pin<Box<Sleep>>>,
    epoch: u64,
}

/// What woke the actor up.  Computed inside the `select!` so the borrows on
/// the actor's fields end before the handler runs.
enum Wake {
    Command(Option<SessionCommand>),
    Dial(DialResult),
    Link(Option<TransportEvent>),
    Heartbeat,
    Reconnect,
}

impl SessionActor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        mut dials: mpsc::UnboundedReceiver<DialResult>,
    ) {
        loop {
            let wake = {
                let link_events = &mut self.link_events;
                let heartbeat = &mut self.heartbeat;
                let reconnect = &mut self.reconnect;
                tokio::select! {
                    cmd = commands.recv() => Wake::Command(cmd),
                    Some(dial) = dials.recv() => Wake::Dial(dial),
                    evt = next_link_event(link_events) => Wake::Link(evt),
                    () = deadline(heartbeat) => Wake::Heartbeat,
                    () = deadline(reconnect) => Wake::Reconnect,
                }
            };

            match wake {
                Wake::Command(Some(cmd)) => self.handle_command(cmd),
                // All handles dropped: tear down and stop.
                Wake::Command(None) => {
                    self.drop_link();
                    self.set_state(SessionState::Disconnected);
                    break;
                }
                Wake::Dial(dial) => self.handle_dial(dial),
                Wake::Link(Some(evt)) => self.handle_transport_event(evt),
                Wake::Link(None) => self.handle_link_gone(),
                Wake::Heartbeat => self.handle_heartbeat(),
                Wake::Reconnect => self.handle_reconnect_fire(),
            }
        }
        debug!("session actor for {} stopped", self.config.url);
    }

    fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Connect => match self.current_state() {
                SessionState::Connecting | SessionState::Open => {
                    debug!("connect ignored, already {}", self.current_state());
                }
                SessionState::Reconnecting => {
                    // Dial now instead of waiting out the timer.
                    self.reconnect = None;
                    self.start_dial();
                }
                SessionState::Disconnected | SessionState::Closing => self.start_dial(),
            },
            SessionCommand::Send { frame, reply } => {
                let sent = self.current_state() == SessionState::Open
                    && self
                        .link_out
                        .as_ref()
                        .is_some_and(|out| out.send(frame).is_ok());
                let _ = reply.send(sent);
            }
            SessionCommand::Close { done } => {
                if self.link_out.is_some() {
                    self.set_state(SessionState::Closing);
                }
                self.drop_link();
                self.reconnect = None;
                self.set_state(SessionState::Disconnected);
                let _ = done.send(());
            }
            SessionCommand::Subscribe { key, sink } => {
                self.registry.register(key, sink);
            }
            SessionCommand::Unsubscribe { key } => {
                self.registry.unregister(&key);
            }
        }
    }

    fn handle_dial(&mut self, (epoch, result): DialResult) {
        if epoch != self.epoch {
            // The session closed or redialled while this attempt was in
            // flight; dropping the link (if any) closes the socket.
            debug!("discarding stale dial result (epoch {epoch} != {})", self.epoch);
            return;
        }
        match result {
            Ok(link) => {
                info!("connected to {}", self.config.url);
                self.link_out = Some(link.outbound);
                self.link_events = Some(link.events);
                self.set_state(SessionState::Open);
                self.registry.fanout(&SessionEvent::Opened);
                self.arm_heartbeat();
            }
            Err(e) => {
                warn!("dial failed: {e}");
                self.registry.fanout(&SessionEvent::Error(e.to_string()));
                self.schedule_reconnect();
            }
        }
    }

    fn handle_transport_event(&mut self, evt: TransportEvent) {
        match evt {
            TransportEvent::Frame(text) => {
                let event = route_frame(&text);
                self.registry.fanout(&event);
            }
            TransportEvent::Closed { code, reason } => {
                self.drop_link();
                self.registry.fanout(&SessionEvent::Closed {
                    code,
                    reason: reason.clone(),
                });
                if code == CLOSE_NORMAL {
                    info!("connection closed normally");
                    self.set_state(SessionState::Disconnected);
                } else {
                    warn!("abnormal close (code {code}, reason {reason:?})");
                    self.schedule_reconnect();
                }
            }
            TransportEvent::Error(msg) => {
                warn!("transport error: {msg}");
                self.drop_link();
                self.registry.fanout(&SessionEvent::Error(msg));
                self.schedule_reconnect();
            }
        }
    }

    /// The pump ended without delivering a terminal event (its channel
    /// closed first).  Treat it like an abnormal close if we were open.
    fn handle_link_gone(&mut self) {
        self.link_events = None;
        if self.current_state() == SessionState::Open {
            self.drop_link();
            self.registry.fanout(&SessionEvent::Closed {
                code: super::transport::CLOSE_ABNORMAL,
                reason: "connection lost".to_string(),
            });
            self.schedule_reconnect();
        }
    }

    fn handle_heartbeat(&mut self) {
        // Rearm first; a failed write is reported by the transport, not here.
        self.arm_heartbeat();
        match encode_frame(&ClientMessage::Ping) {
            Ok(frame) => {
                if let Some(out) = &self.link_out {
                    debug!("heartbeat ping");
                    let _ = out.send(frame);
                }
            }
            Err(e) => warn!("failed to encode heartbeat: {e}"),
        }
    }

    fn handle_reconnect_fire(&mut self) {
        self.reconnect = None;
        debug!("reconnect timer fired");
        self.start_dial();
    }

    fn start_dial(&mut self) {
        self.epoch += 1;
        self.set_state(SessionState::Connecting);

        let transport = Arc::clone(&self.transport);
        let url = self.config.url.clone();
        let dial_tx = self.dial_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let result = transport.connect(&url).await;
            let _ = dial_tx.send((epoch, result));
        });
    }

    /// Arms the reconnect timer unless one is already pending.
    fn schedule_reconnect(&mut self) {
        if self.reconnect.is_some() {
            return;
        }
        self.set_state(SessionState::Reconnecting);
        debug!("reconnecting in {:?}", self.config.reconnect_delay);
        self.reconnect = Some(Box::pin(sleep(self.config.reconnect_delay)));
    }

    fn arm_heartbeat(&mut self) {
        self.heartbeat = Some(Box::pin(sleep(self.config.heartbeat_interval)));
    }

    /// Drops the transport link and heartbeat, and invalidates any in-flight
    /// dial.  Dropping `link_out` makes the pump send a close frame.
    fn drop_link(&mut self) {
        self.epoch += 1;
        self.heartbeat = None;
        self.link_out = None;
        self.link_events = None;
    }

    fn current_state(&self) -> SessionState {
        *self.state.borrow()
    }

    fn set_state(&self, next: SessionState) {
        let prev = self.current_state();
        if prev != next {
            debug!("session state {prev} -> {next}");
            self.state.send_replace(next);
        }
    }
}

/// Awaits the next transport event, or forever when no link is installed.
async fn next_link_event(
    slot: &mut Option<mpsc::Receiver<TransportEvent>>,
) -> Option<TransportEvent> {
    match slot {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}

/// Awaits an armed timer, or forever when the slot is empty.
async fn deadline(slot: &mut Option<Pin<Box<Sleep>>>) {
    match slot {
        Some(timer) => timer.as_mut().await,
        None => std::future::pending().await,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
