//! Live connection: heartbeat timer, receive loop and send queue.
//!
//! A [`Connection`] is created once per successful connect and never reused.
//! Its tasks report through [`ConnectionEvent`]s tagged with the connection's
//! generation, so the owner can discard events from a superseded connection.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, trace};

use super::error::{TransportError, TransportResult};
use crate::config::LinkConfig;
use crate::core::constants::PING;
use crate::protocol::{Framer, Framing};

/// Something that happened on a live connection.
#[derive(Debug)]
pub struct ConnectionEvent {
    /// Generation of the connection that raised the event.
    pub generation: u64,
    /// What happened.
    pub kind: ConnectionEventKind,
}

/// Kinds of [`ConnectionEvent`].
#[derive(Debug)]
pub enum ConnectionEventKind {
    /// The heartbeat timer fired; a ping should be sent.
    HeartbeatDue,
    /// A complete inbound message, without framing.
    Frame(Vec<u8>),
    /// A user message finished writing to the socket.
    Written(String),
    /// Reading or writing failed. The connection is unusable.
    Failed(TransportError),
    /// The remote ended the stream.
    RemoteClosed,
}

/// Sends events for one generation.
struct Emitter<E> {
    generation: u64,
    events: mpsc::UnboundedSender<E>,
}

impl<E> Clone for Emitter<E> {
    fn clone(&self) -> Self {
        Self {
            generation: self.generation,
            events: self.events.clone(),
        }
    }
}

impl<E: From<ConnectionEvent>> Emitter<E> {
    /// Returns `false` once nobody is listening.
    fn emit(&self, kind: ConnectionEventKind) -> bool {
        let event = ConnectionEvent {
            generation: self.generation,
            kind,
        };
        self.events.send(E::from(event)).is_ok()
    }
}

/// Bytes queued for the socket.
#[derive(Debug)]
struct Outbound {
    bytes: Vec<u8>,
    /// Text reported back in [`ConnectionEventKind::Written`]. Heartbeats have none.
    label: Option<String>,
}

/// A live TCP connection to the companion controller.
#[derive(Debug)]
pub struct Connection {
    generation: u64,
    peer: Option<SocketAddr>,
    framing: Framing,
    outbound: mpsc::UnboundedSender<Outbound>,
    heartbeat: JoinHandle<()>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Connection {
    /// Take ownership of `stream` and start the heartbeat, read and write tasks.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<E>(
        stream: TcpStream,
        generation: u64,
        config: &LinkConfig,
        events: mpsc::UnboundedSender<E>,
    ) -> Self
    where
        E: From<ConnectionEvent> + Send + 'static,
    {
        let peer = stream.peer_addr().ok();
        let (read_half, write_half) = stream.into_split();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let emitter = Emitter { generation, events };

        let writer = tokio::spawn(write_loop(write_half, outbound_rx, emitter.clone()));
        let reader = tokio::spawn(read_loop(
            read_half,
            config.framing.framer(),
            config.read_buffer_size,
            emitter.clone(),
        ));
        let heartbeat = tokio::spawn(heartbeat_loop(config.heartbeat_interval(), emitter));

        debug!(generation, ?peer, "connection started");
        Self {
            generation,
            peer,
            framing: config.framing,
            outbound: outbound_tx,
            heartbeat,
            reader,
            writer,
        }
    }

    /// Generation assigned by the owner.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Remote address, if known.
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Queue a user message. A [`ConnectionEventKind::Written`] follows once
    /// it reaches the socket.
    pub fn send(&self, text: &str) -> TransportResult<()> {
        self.enqueue(text, Some(text.to_string()))
    }

    /// Queue a heartbeat ping. No `Written` event is raised for it.
    pub fn send_heartbeat(&self) -> TransportResult<()> {
        self.enqueue(PING, None)
    }

    fn enqueue(&self, text: &str, label: Option<String>) -> TransportResult<()> {
        let bytes = self.framing.frame(text.as_bytes());
        self.outbound
            .send(Outbound { bytes, label })
            .map_err(|_| TransportError::NotConnected)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // Heartbeat goes first so no ping is queued against a closing socket.
        self.heartbeat.abort();
        self.reader.abort();
        self.writer.abort();
        debug!(generation = self.generation, "connection torn down");
    }
}

async fn heartbeat_loop<E>(period: Duration, emitter: Emitter<E>)
where
    E: From<ConnectionEvent>,
{
    // First ping one full period after connect.
    let mut ticker = time::interval_at(time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if !emitter.emit(ConnectionEventKind::HeartbeatDue) {
            return;
        }
    }
}

async fn read_loop<E>(
    mut reader: OwnedReadHalf,
    mut framer: Framer,
    buffer_size: usize,
    emitter: Emitter<E>,
) where
    E: From<ConnectionEvent>,
{
    let mut buf = vec![0u8; buffer_size];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                emitter.emit(ConnectionEventKind::RemoteClosed);
                return;
            }
            Ok(n) => {
                trace!(bytes = n, "read");
                for frame in framer.push(&buf[..n]) {
                    if !emitter.emit(ConnectionEventKind::Frame(frame)) {
                        return;
                    }
                }
            }
            Err(e) => {
                emitter.emit(ConnectionEventKind::Failed(e.into()));
                return;
            }
        }
    }
}

async fn write_loop<E>(
    mut writer: OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    emitter: Emitter<E>,
) where
    E: From<ConnectionEvent>,
{
    while let Some(Outbound { bytes, label }) = outbound.recv().await {
        if let Err(e) = writer.write_all(&bytes).await {
            emitter.emit(ConnectionEventKind::Failed(e.into()));
            return;
        }
        trace!(bytes = bytes.len(), "wrote");
        if let Some(label) = label {
            emitter.emit(ConnectionEventKind::Written(label));
        }
    }
}
