//! End-to-end tests for the link façade against a scripted companion
//! controller on loopback.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;

use trigger_link::core::ManualClock;
use trigger_link::link::{format_epoch, ConnectOutcome};
use trigger_link::prelude::*;
use trigger_link::reconnect::ReconnectPolicy;

const WAIT: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(300);

/// Scripted controller side of one accepted connection.
struct Peer {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Peer {
    async fn accept(listener: &TcpListener) -> Self {
        let (stream, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        let (read_half, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    async fn write(&mut self, text: &str) {
        self.writer.write_all(text.as_bytes()).await.unwrap();
    }

    /// Next line that is not a heartbeat.
    async fn next_message(&mut self) -> String {
        loop {
            let line = timeout(WAIT, self.lines.next_line())
                .await
                .unwrap()
                .unwrap()
                .expect("stream ended");
            if line != "ping" {
                return line;
            }
        }
    }
}

async fn listener() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port().to_string();
    (listener, port)
}

fn quiet_config() -> LinkConfig {
    LinkConfig::default().with_heartbeat_interval(Duration::from_secs(3600))
}

async fn wait(link: &TriggerLink, predicate: impl FnMut(&LinkState) -> bool) -> LinkState {
    timeout(WAIT, link.wait_for(predicate)).await.unwrap().unwrap()
}

/// Connect `link` and accept the resulting connection.
async fn connect(link: &TriggerLink, listener: &TcpListener, port: &str) -> Peer {
    let outcome = link.connect_to("127.0.0.1", port).await.unwrap();
    assert_eq!(outcome, ConnectOutcome::Started);
    let peer = Peer::accept(listener).await;
    wait(link, |state| state.is_connected()).await;
    peer
}

/// Action table forwarding every triggered flag and payload to a channel.
fn recording_table(flags: &[&str]) -> (ActionTable, mpsc::UnboundedReceiver<(String, String)>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut builder = ActionTable::builder();
    for flag in flags {
        let tx = tx.clone();
        let name = flag.to_string();
        builder = builder
            .on(flag, move |payload| {
                let _ = tx.send((name.clone(), payload.to_string()));
            })
            .unwrap();
    }
    (builder.build(), rx)
}

async fn triggered(rx: &mut mpsc::UnboundedReceiver<(String, String)>) -> (String, String) {
    timeout(WAIT, rx.recv()).await.unwrap().unwrap()
}

#[tokio::test]
async fn test_heartbeat_produces_clock_estimate() {
    let (listener, port) = listener().await;
    let clock = Arc::new(ManualClock::new(100.0));
    let config = LinkConfig::default().with_heartbeat_interval(Duration::from_millis(300));
    let link = TriggerLink::with_clock(ActionTable::empty(), config, clock.clone()).unwrap();

    let mut peer = connect(&link, &listener, &port).await;
    let first = timeout(WAIT, peer.lines.next_line()).await.unwrap().unwrap();
    assert_eq!(first.as_deref(), Some("ping"));

    clock.set(100.1);
    peer.write("pong;100.050\n").await;

    let state = wait(&link, |state| state.pong_count == 1).await;
    let estimate = state.estimate.expect("estimate after pong");
    assert!((estimate.latency - 0.05).abs() < 1e-9);
    assert!(estimate.offset.abs() < 1e-9);
    // Pongs are not recorded as inbound messages.
    assert!(!state.recent.contains_prefix("[RX]"));
}

#[tokio::test]
async fn test_pong_recorded_when_enabled() {
    let (listener, port) = listener().await;
    let clock = Arc::new(ManualClock::new(100.0));
    let config = LinkConfig::default()
        .with_heartbeat_interval(Duration::from_millis(300))
        .with_pong_log(true);
    let link = TriggerLink::with_clock(ActionTable::empty(), config, clock.clone()).unwrap();

    let mut peer = connect(&link, &listener, &port).await;
    let first = timeout(WAIT, peer.lines.next_line()).await.unwrap().unwrap();
    assert_eq!(first.as_deref(), Some("ping"));

    clock.set(100.1);
    peer.write("pong;100.050\n").await;

    let state = wait(&link, |state| state.pong_count == 1).await;
    let entry = state.recent.latest().unwrap();
    assert!(entry.starts_with("[RX]"));
    assert!(entry.ends_with(&format!(" pong {}", format_epoch(100.05).unwrap())));
}

#[tokio::test]
async fn test_start_flag_dispatches_action() {
    let (listener, port) = listener().await;
    let (table, mut rx) = recording_table(&["a", "b"]);
    let link = TriggerLink::new(table, quiet_config()).unwrap();

    let mut peer = connect(&link, &listener, &port).await;
    peer.write("a;\n").await;

    assert_eq!(triggered(&mut rx).await, ("a".to_string(), String::new()));
    let state = wait(&link, |state| state.recent.contains_prefix("[RX]")).await;
    assert!(state.recent.latest().unwrap().ends_with(" a;"));
}

#[tokio::test]
async fn test_messages_dispatched_in_order() {
    let (listener, port) = listener().await;
    let (table, mut rx) = recording_table(&["a", "b"]);
    let link = TriggerLink::new(table, quiet_config()).unwrap();

    let mut peer = connect(&link, &listener, &port).await;
    peer.write("a;1\nb;2\na;3\n").await;

    assert_eq!(triggered(&mut rx).await, ("a".to_string(), "1".to_string()));
    assert_eq!(triggered(&mut rx).await, ("b".to_string(), "2".to_string()));
    assert_eq!(triggered(&mut rx).await, ("a".to_string(), "3".to_string()));
}

#[tokio::test]
async fn test_unhandled_flag_keeps_link_up() {
    let (listener, port) = listener().await;
    let (table, mut rx) = recording_table(&["b"]);
    let link = TriggerLink::new(table, quiet_config()).unwrap();

    let mut peer = connect(&link, &listener, &port).await;
    peer.write("zzz;1\nb;ok\n").await;

    assert_eq!(triggered(&mut rx).await, ("b".to_string(), "ok".to_string()));
    assert_eq!(link.state().phase, LinkPhase::Ready);
}

#[tokio::test]
async fn test_malformed_message_is_dropped() {
    let (listener, port) = listener().await;
    let (table, mut rx) = recording_table(&["b"]);
    let link = TriggerLink::new(table, quiet_config()).unwrap();

    let mut peer = connect(&link, &listener, &port).await;
    peer.write("garbage\nb;x\n").await;

    assert_eq!(triggered(&mut rx).await, ("b".to_string(), "x".to_string()));
    let state = link.state();
    assert_eq!(state.phase, LinkPhase::Ready);
    assert!(state.recent.iter().all(|entry| !entry.contains("garbage")));
}

#[tokio::test]
async fn test_bad_pong_leaves_estimate_unset() {
    let (listener, port) = listener().await;
    let (table, mut rx) = recording_table(&["b"]);
    let link = TriggerLink::new(table, quiet_config()).unwrap();

    let mut peer = connect(&link, &listener, &port).await;
    // No ping is outstanding, and the payload is not a number either.
    peer.write("pong;abc\nb;\n").await;

    triggered(&mut rx).await;
    let state = link.state();
    assert_eq!(state.pong_count, 0);
    assert!(state.estimate.is_none());
}

#[tokio::test]
async fn test_invalid_port_does_not_connect() {
    let (listener, _) = listener().await;
    let link = TriggerLink::new(ActionTable::empty(), quiet_config()).unwrap();

    let result = link.connect_to("127.0.0.1", "not-a-number").await;
    assert!(matches!(result, Err(LinkError::Config(ConfigError::InvalidPort(_)))));

    let state = link.state();
    assert_eq!(state.phase, LinkPhase::Disconnected);
    assert_eq!(state.recent.latest(), Some("Invalid port: not-a-number"));
    assert!(timeout(QUIET, listener.accept()).await.is_err());
}

#[tokio::test]
async fn test_recent_log_keeps_last_three() {
    let (listener, port) = listener().await;
    let link = TriggerLink::new(ActionTable::empty(), quiet_config()).unwrap();

    let mut peer = connect(&link, &listener, &port).await;
    for text in ["m;1", "m;2", "m;3", "m;4"] {
        link.send(text).unwrap();
        assert_eq!(peer.next_message().await, text);
    }

    let state = wait(&link, |state| {
        state.recent.latest().is_some_and(|entry| entry.ends_with(" m;4"))
    })
    .await;
    let recent = state.recent.to_vec();
    assert_eq!(recent.len(), 3);
    assert!(recent[0].ends_with(" m;2"));
    assert!(recent[1].ends_with(" m;3"));
    assert!(recent[2].ends_with(" m;4"));
    assert!(recent.iter().all(|entry| entry.starts_with("[TX]")));
}

#[tokio::test]
async fn test_connect_while_ready_is_ignored() {
    let (listener, port) = listener().await;
    let link = TriggerLink::new(ActionTable::empty(), quiet_config()).unwrap();
    let _peer = connect(&link, &listener, &port).await;

    let outcome = link.connect_to("127.0.0.1", &port).await.unwrap();
    assert_eq!(outcome, ConnectOutcome::Ignored(LinkPhase::Ready));
    assert!(timeout(QUIET, listener.accept()).await.is_err());
    assert_eq!(link.state().phase, LinkPhase::Ready);
}

#[tokio::test]
async fn test_disconnect_stops_heartbeat() {
    let (listener, port) = listener().await;
    let config = LinkConfig::default().with_heartbeat_interval(Duration::from_millis(50));
    let link = TriggerLink::new(ActionTable::empty(), config).unwrap();

    let mut peer = connect(&link, &listener, &port).await;
    let first = timeout(WAIT, peer.lines.next_line()).await.unwrap().unwrap();
    assert_eq!(first.as_deref(), Some("ping"));

    link.disconnect().await.unwrap();
    let state = link.state();
    assert_eq!(state.phase, LinkPhase::Disconnected);
    assert_eq!(state.recent.latest(), Some("Disconnected"));

    // Whatever was in flight drains, then the socket reaches EOF.
    let mut rest = String::new();
    timeout(WAIT, peer.lines.get_mut().read_to_string(&mut rest))
        .await
        .unwrap()
        .unwrap();
    assert!(rest.lines().all(|line| line == "ping"));

    // A second disconnect changes nothing.
    link.disconnect().await.unwrap();
    assert_eq!(link.state(), state);
}

#[tokio::test]
async fn test_remote_close() {
    let (listener, port) = listener().await;
    let link = TriggerLink::new(ActionTable::empty(), quiet_config()).unwrap();

    let peer = connect(&link, &listener, &port).await;
    drop(peer);

    let state = wait(&link, |state| {
        state.recent.contains_prefix("Connection closed by the server")
    })
    .await;
    assert_eq!(state.phase, LinkPhase::Disconnected);

    // The link can connect again afterwards.
    let _peer = connect(&link, &listener, &port).await;
}

#[tokio::test]
async fn test_reply_sent_back() {
    let (listener, port) = listener().await;
    let table = ActionTable::builder()
        .reply("q", |payload| Some(format!("r;{payload}")))
        .unwrap()
        .build();
    let link = TriggerLink::new(table, quiet_config()).unwrap();

    let mut peer = connect(&link, &listener, &port).await;
    peer.write("q;42\n").await;
    assert_eq!(peer.next_message().await, "r;42");
}

#[tokio::test]
async fn test_send_requires_connection() {
    let (listener, port) = listener().await;
    let link = TriggerLink::new(ActionTable::empty(), quiet_config()).unwrap();

    link.send("early;1").unwrap();
    wait(&link, |state| state.recent.latest() == Some("Not connected")).await;

    let mut peer = connect(&link, &listener, &port).await;
    link.send("hello;world").unwrap();
    assert_eq!(peer.next_message().await, "hello;world");
}

#[tokio::test]
async fn test_connect_refused() {
    let (listener, port) = listener().await;
    drop(listener);

    let link = TriggerLink::new(ActionTable::empty(), quiet_config()).unwrap();
    link.connect_to("127.0.0.1", &port).await.unwrap();

    let state = wait(&link, |state| state.recent.contains_prefix("Failed to connect")).await;
    assert_eq!(state.phase, LinkPhase::Disconnected);
}

#[tokio::test]
async fn test_connect_with_settings() {
    let (listener, port) = listener().await;
    let link = TriggerLink::new(ActionTable::empty(), quiet_config()).unwrap();
    let settings = MemorySettings::with("127.0.0.1", port);

    link.connect_with(&settings).await.unwrap();
    let _peer = Peer::accept(&listener).await;
    let state = wait(&link, |state| state.is_connected()).await;
    assert_eq!(state.endpoint.unwrap().host(), "127.0.0.1");
}

#[tokio::test]
async fn test_reconnect_after_remote_close() {
    let (listener, port) = listener().await;
    let policy = ReconnectPolicy {
        base_delay_ms: 20,
        jitter_ms: 0,
        max_attempts: 3,
        ..ReconnectPolicy::enabled()
    };
    let link = TriggerLink::new(ActionTable::empty(), quiet_config().with_reconnect(policy)).unwrap();

    let peer = connect(&link, &listener, &port).await;
    drop(peer);

    let _again = Peer::accept(&listener).await;
    let state = wait(&link, |state| state.is_connected()).await;
    assert_eq!(state.recent.latest(), Some("Connected"));
}

#[tokio::test]
async fn test_disconnect_cancels_reconnect() {
    let (listener, port) = listener().await;
    let policy = ReconnectPolicy {
        base_delay_ms: 200,
        jitter_ms: 0,
        ..ReconnectPolicy::enabled()
    };
    let link = TriggerLink::new(ActionTable::empty(), quiet_config().with_reconnect(policy)).unwrap();

    let peer = connect(&link, &listener, &port).await;
    drop(peer);
    wait(&link, |state| state.recent.contains_prefix("Reconnecting")).await;

    link.disconnect().await.unwrap();
    assert_eq!(link.state().recent.latest(), Some("Reconnect cancelled"));
    assert!(timeout(Duration::from_millis(500), listener.accept()).await.is_err());
}
