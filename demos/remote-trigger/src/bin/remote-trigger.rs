//! Capture-device side of the link.
//!
//! Connects to the companion controller named by the saved settings, starts
//! and stops a pretend recording on flags `a` and `b`, prints every state
//! change and forwards stdin lines as messages.
//!
//! Run:
//!   TRIGGER_HOST=127.0.0.1 TRIGGER_PORT=8888 cargo run --bin remote-trigger
//!
//! `TRIGGER_HOST` / `TRIGGER_PORT` override and update the saved settings.
//! Type `quit` to disconnect.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use trigger_link::prelude::*;

/// Stand-in for a camera: only tracks whether it is recording.
#[derive(Default)]
struct LoggingRecorder {
    recording: AtomicBool,
}

impl CaptureController for LoggingRecorder {
    fn start(&self) {
        self.recording.store(true, Ordering::SeqCst);
        tracing::info!("recording started");
    }

    fn stop(&self) {
        self.recording.store(false, Ordering::SeqCst);
        tracing::info!("recording stopped");
    }

    fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut settings = FileSettings::open_default()?;
    if let Ok(host) = std::env::var("TRIGGER_HOST") {
        settings.set_host(&host)?;
    }
    if let Ok(port) = std::env::var("TRIGGER_PORT") {
        settings.set_port(&port)?;
    }
    tracing::info!(path = %settings.path().display(), "using settings");

    let recorder = Arc::new(LoggingRecorder::default());
    let mut builder = ActionTable::builder();
    default_recording_actions(&mut builder, recorder)?;
    let link = TriggerLink::new(builder.build(), LinkConfig::default())?;

    let watcher = tokio::spawn(print_changes(link.subscribe()));

    link.connect_with(&settings).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "quit" => break,
            text => link.send(text)?,
        }
    }

    link.disconnect().await?;
    watcher.abort();
    Ok(())
}

async fn print_changes(mut rx: tokio::sync::watch::Receiver<LinkState>) {
    while rx.changed().await.is_ok() {
        let state = rx.borrow_and_update().clone();
        let estimate = match state.estimate {
            Some(e) => format!("latency {:.1} ms, offset {:.1} ms", e.latency_ms(), e.offset_ms()),
            None => "no estimate".to_string(),
        };
        println!(
            "[{}] {} pongs, {} | {}",
            state.phase,
            state.pong_count,
            estimate,
            state.recent.iter().collect::<Vec<_>>().join(" / ")
        );
    }
}
