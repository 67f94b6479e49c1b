//! The link actor.
//!
//! All state lives here and is mutated only by [`LinkActor::run`], which
//! consumes caller commands and connection events one at a time. Inbound
//! messages are therefore handled strictly in order: message N+1 is not
//! decoded until message N's handler has returned.

use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::state::{format_epoch, pong_event, rx_event, tx_event, LinkState};
use crate::clock::ClockEstimator;
use crate::config::{EndpointConfig, LinkConfig};
use crate::core::WallClock;
use crate::dispatch::ActionTable;
use crate::protocol::{decode, Message};
use crate::transport::{
    self, Connection, ConnectionEvent, ConnectionEventKind, LinkPhase, TransportError,
};

/// Result of a connect request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// A new connection attempt was started.
    Started,
    /// The link was not `Disconnected`; nothing was done.
    Ignored(LinkPhase),
}

/// Requests from [`TriggerLink`](super::TriggerLink) handles.
#[derive(Debug)]
pub(crate) enum Command {
    Connect {
        endpoint: EndpointConfig,
        ack: oneshot::Sender<ConnectOutcome>,
    },
    Disconnect {
        ack: oneshot::Sender<()>,
    },
    Send {
        text: String,
    },
    Report {
        status: String,
        ack: oneshot::Sender<()>,
    },
}

/// Completions delivered to the actor's event queue.
#[derive(Debug)]
pub(crate) enum Event {
    Opened {
        generation: u64,
        stream: TcpStream,
    },
    OpenFailed {
        generation: u64,
        error: TransportError,
    },
    Connection(ConnectionEvent),
    ReconnectDue {
        generation: u64,
    },
}

impl From<ConnectionEvent> for Event {
    fn from(event: ConnectionEvent) -> Self {
        Event::Connection(event)
    }
}

pub(crate) struct LinkActor {
    config: LinkConfig,
    table: ActionTable,
    clock: Arc<dyn WallClock>,

    commands: mpsc::UnboundedReceiver<Command>,
    events_tx: mpsc::UnboundedSender<Event>,
    events: mpsc::UnboundedReceiver<Event>,
    published: watch::Sender<LinkState>,

    /// Working copy of the published state.
    state: LinkState,
    /// Bumped on every connect attempt and every caller disconnect.
    generation: u64,
    connecting: Option<JoinHandle<()>>,
    connection: Option<Connection>,
    estimator: ClockEstimator,
    reconnect_attempt: u32,
    reconnect_timer: Option<JoinHandle<()>>,
}

impl LinkActor {
    pub(crate) fn new(
        config: LinkConfig,
        table: ActionTable,
        clock: Arc<dyn WallClock>,
        commands: mpsc::UnboundedReceiver<Command>,
        published: watch::Sender<LinkState>,
    ) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        let state = published.borrow().clone();
        Self {
            config,
            table,
            clock,
            commands,
            events_tx,
            events,
            published,
            state,
            generation: 0,
            connecting: None,
            connection: None,
            estimator: ClockEstimator::new(),
            reconnect_attempt: 0,
            reconnect_timer: None,
        }
    }

    /// Process commands and events until every handle is dropped.
    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = self.events.recv() => self.handle_event(event),
            }
        }

        debug!("all link handles dropped, shutting down");
        self.cancel_pending();
        self.teardown();
    }

    // =========================================================================
    // Commands
    // =========================================================================

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect { endpoint, ack } => {
                let outcome = if self.state.phase.accepts_connect() {
                    self.cancel_reconnect();
                    self.reconnect_attempt = 0;
                    self.start_connect(endpoint);
                    ConnectOutcome::Started
                } else {
                    debug!(phase = %self.state.phase, "connect ignored");
                    ConnectOutcome::Ignored(self.state.phase)
                };
                let _ = ack.send(outcome);
            }
            Command::Disconnect { ack } => {
                self.disconnect();
                let _ = ack.send(());
            }
            Command::Send { text } => self.send(&text),
            Command::Report { status, ack } => {
                self.record(status);
                self.publish();
                let _ = ack.send(());
            }
        }
    }

    fn start_connect(&mut self, endpoint: EndpointConfig) {
        self.generation += 1;
        let generation = self.generation;
        info!(%endpoint, generation, "connecting");

        self.estimator.reset();
        self.state.estimate = None;
        self.state.pong_count = 0;
        self.state.endpoint = Some(endpoint.clone());
        self.transition(LinkPhase::Connecting);
        self.publish();

        let timeout = self.config.connect_timeout();
        let events = self.events_tx.clone();
        self.connecting = Some(tokio::spawn(async move {
            let event = match transport::open(&endpoint, timeout).await {
                Ok(stream) => Event::Opened { generation, stream },
                Err(error) => Event::OpenFailed { generation, error },
            };
            let _ = events.send(event);
        }));
    }

    fn disconnect(&mut self) {
        let pending_reconnect = self.reconnect_timer.is_some();
        self.cancel_pending();
        if self.state.phase == LinkPhase::Disconnected {
            if pending_reconnect {
                self.record("Reconnect cancelled");
                self.publish();
            }
            return;
        }

        // Late completions from anything started before now are stale.
        self.generation += 1;
        self.teardown();
        self.transition(LinkPhase::Disconnected);
        info!("disconnected from server");
        self.record("Disconnected");
        self.publish();
    }

    fn send(&mut self, text: &str) {
        let queued = match &self.connection {
            Some(connection) => connection.send(text),
            None => Err(TransportError::NotConnected),
        };
        if let Err(e) = queued {
            warn!(text, "send dropped: {e}");
            self.record("Not connected");
            self.publish();
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Opened { generation, stream } => self.on_opened(generation, stream),
            Event::OpenFailed { generation, error } => {
                if !self.is_current_attempt(generation) {
                    debug!(generation, "dropping stale connect failure");
                    return;
                }
                self.connecting = None;
                warn!("failed to connect: {error}");
                self.record("Failed to connect");
                self.terminate(LinkPhase::Failed);
            }
            Event::Connection(event) => self.on_connection_event(event),
            Event::ReconnectDue { generation } => {
                self.reconnect_timer = None;
                if generation != self.generation || !self.state.phase.accepts_connect() {
                    debug!(generation, "dropping stale reconnect");
                    return;
                }
                if let Some(endpoint) = self.state.endpoint.clone() {
                    self.start_connect(endpoint);
                }
            }
        }
    }

    fn is_current_attempt(&self, generation: u64) -> bool {
        generation == self.generation && self.state.phase == LinkPhase::Connecting
    }

    fn on_opened(&mut self, generation: u64, stream: TcpStream) {
        if !self.is_current_attempt(generation) {
            debug!(generation, "dropping stale connection");
            return;
        }
        self.connecting = None;

        let connection = Connection::start(stream, generation, &self.config, self.events_tx.clone());
        info!(peer = ?connection.peer(), generation, "connected");
        self.connection = Some(connection);
        self.reconnect_attempt = 0;
        self.transition(LinkPhase::Ready);
        self.record("Connected");
        self.publish();
    }

    fn on_connection_event(&mut self, event: ConnectionEvent) {
        let current = self.connection.as_ref().map(Connection::generation);
        if current != Some(event.generation) {
            debug!(generation = event.generation, "dropping event from superseded connection");
            return;
        }

        match event.kind {
            ConnectionEventKind::HeartbeatDue => self.send_heartbeat(),
            ConnectionEventKind::Frame(bytes) => self.on_frame(&bytes),
            ConnectionEventKind::Written(text) => {
                debug!(text, "[TX]");
                self.record(tx_event(&text));
                self.publish();
            }
            ConnectionEventKind::Failed(error) => {
                warn!("connection failed: {error}");
                self.record("Connection failed");
                self.terminate(LinkPhase::Failed);
            }
            ConnectionEventKind::RemoteClosed => {
                info!("connection closed by the server");
                self.record("Connection closed by the server");
                self.terminate(LinkPhase::Closed);
            }
        }
    }

    fn send_heartbeat(&mut self) {
        let Some(connection) = &self.connection else {
            return;
        };
        self.estimator.on_ping_sent(self.clock.now());
        if let Err(e) = connection.send_heartbeat() {
            debug!("heartbeat not queued: {e}");
            self.estimator.clear_pending();
        }
    }

    fn on_frame(&mut self, bytes: &[u8]) {
        let message = match decode(bytes) {
            Ok(message) => message,
            Err(e) => {
                warn!("dropping malformed message: {e}");
                return;
            }
        };

        if message.is_pong() {
            self.on_pong(&message);
            return;
        }

        debug!(%message, "[RX]");
        self.record(rx_event(&message.to_string()));
        let outcome = self.table.dispatch(&message.flag, &message.payload);
        if let Some(reply) = outcome.reply {
            self.send(&reply);
        }
        self.publish();
    }

    fn on_pong(&mut self, message: &Message) {
        let rx_pong = self.clock.now();
        match self.estimator.on_pong(&message.payload, rx_pong) {
            Ok(estimate) => {
                let server_time = format_epoch(rx_pong - estimate.offset).unwrap_or_default();
                debug!(
                    server_time,
                    latency_ms = estimate.latency_ms(),
                    offset_ms = estimate.offset_ms(),
                    "pong"
                );
                self.state.estimate = Some(estimate);
                self.state.pong_count += 1;
                if self.config.log_pongs {
                    self.record(pong_event(&message.payload));
                }
                self.publish();
            }
            Err(e) => warn!(payload = %message.payload, "dropping pong: {e}"),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Enter `Failed`/`Closed`, release the connection, settle in `Disconnected`.
    fn terminate(&mut self, phase: LinkPhase) {
        self.transition(phase);
        self.publish();

        self.teardown();
        self.transition(LinkPhase::Disconnected);
        self.publish();

        self.schedule_reconnect();
    }

    /// Drop the live connection, if any. Cancels its heartbeat first.
    fn teardown(&mut self) {
        drop(self.connection.take());
        self.estimator.clear_pending();
    }

    fn cancel_pending(&mut self) {
        if let Some(task) = self.connecting.take() {
            task.abort();
        }
        self.cancel_reconnect();
    }

    fn cancel_reconnect(&mut self) {
        if let Some(timer) = self.reconnect_timer.take() {
            timer.abort();
        }
    }

    fn schedule_reconnect(&mut self) {
        let policy = &self.config.reconnect;
        if !policy.enabled {
            return;
        }
        let attempt = self.reconnect_attempt + 1;
        let Some(delay) = policy.next_delay(attempt) else {
            info!(attempts = self.reconnect_attempt, "giving up reconnect");
            self.record("Reconnect gave up");
            self.publish();
            return;
        };

        self.reconnect_attempt = attempt;
        let generation = self.generation;
        let events = self.events_tx.clone();
        info!(attempt, ?delay, "scheduling reconnect");
        self.record(format!("Reconnecting in {} ms", delay.as_millis()));
        self.publish();

        self.reconnect_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(Event::ReconnectDue { generation });
        }));
    }

    fn transition(&mut self, next: LinkPhase) {
        let current = self.state.phase;
        if current == next {
            return;
        }
        debug_assert!(
            current.can_transition_to(next),
            "illegal transition {current} -> {next}"
        );
        debug!(from = %current, to = %next, "phase");
        self.state.phase = next;
    }

    fn record(&mut self, entry: impl Into<String>) {
        self.state.recent.push(entry);
    }

    fn publish(&self) {
        self.published.send_replace(self.state.clone());
    }
}
