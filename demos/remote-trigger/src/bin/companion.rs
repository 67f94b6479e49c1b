//! Minimal companion controller for manual testing.
//!
//! Accepts one capture device at a time, answers every `ping` with
//! `pong;<epoch seconds>`, logs the other lines it receives and sends each
//! stdin line to the connected device (`a;` starts recording, `b;` stops).
//!
//! Run:
//!   TRIGGER_BIND=0.0.0.0:8888 cargo run --bin companion

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "0.0.0.0:8888";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let bind = std::env::var("TRIGGER_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    // Stdin lines go to whichever device is connected at the time.
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if input_tx.send(line).is_err() {
                break;
            }
        }
    });

    loop {
        let (stream, peer) = listener.accept().await?;
        tracing::info!(%peer, "device connected");
        if let Err(e) = serve(stream, &mut input_rx).await {
            tracing::warn!(%peer, "connection error: {e:#}");
        }
        tracing::info!(%peer, "device disconnected");
    }
}

async fn serve(stream: TcpStream, input: &mut mpsc::UnboundedReceiver<String>) -> anyhow::Result<()> {
    let (read_half, mut writer) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(());
                };
                if line == "ping" {
                    let reply = format!("pong;{:.3}\n", epoch_seconds());
                    writer.write_all(reply.as_bytes()).await?;
                } else {
                    tracing::info!("[RX] {line}");
                }
            }
            Some(text) = input.recv() => {
                writer.write_all(format!("{text}\n").as_bytes()).await?;
                tracing::info!("[TX] {text}");
            }
        }
    }
}

fn epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
