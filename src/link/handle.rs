//! Caller-facing handle to the link actor.

use std::sync::Arc;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::warn;

use super::actor::{Command, ConnectOutcome, LinkActor};
use super::state::LinkState;
use crate::config::{EndpointConfig, LinkConfig, SettingsStore};
use crate::core::{ConfigError, FlagError, SystemClock, WallClock};
use crate::dispatch::ActionTable;

/// Errors returned by [`TriggerLink`].
#[derive(Debug, Error)]
pub enum LinkError {
    /// Endpoint or link configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A trigger flag was rejected while building the action table.
    #[error(transparent)]
    Flag(#[from] FlagError),

    /// Called outside a tokio runtime.
    #[error("no tokio runtime available")]
    NoRuntime,

    /// The link actor has stopped.
    #[error("link has shut down")]
    Shutdown,
}

/// Result type for link operations.
pub type LinkResult<T> = Result<T, LinkError>;

/// Handle to a running link.
///
/// Cheap to clone. The actor behind it keeps running, and keeps any live
/// connection open, until the last handle is dropped.
#[derive(Debug, Clone)]
pub struct TriggerLink {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<LinkState>,
}

impl TriggerLink {
    /// Start a link using the system clock.
    ///
    /// The action table is frozen from here on. Must be called within a
    /// tokio runtime.
    pub fn new(table: ActionTable, config: LinkConfig) -> LinkResult<Self> {
        Self::with_clock(table, config, Arc::new(SystemClock))
    }

    /// Start a link that reads "now" from `clock`.
    pub fn with_clock(
        table: ActionTable,
        config: LinkConfig,
        clock: Arc<dyn WallClock>,
    ) -> LinkResult<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| LinkError::NoRuntime)?;

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(LinkState::with_capacity(config.recent_capacity));
        let actor = LinkActor::new(config, table, clock, commands_rx, state_tx);
        runtime.spawn(actor.run());

        Ok(Self {
            commands: commands_tx,
            state: state_rx,
        })
    }

    /// Start connecting to `endpoint`.
    ///
    /// Returns once the attempt has started; watch [`state`](Self::state) for
    /// the outcome. Ignored unless the link is disconnected.
    pub async fn connect(&self, endpoint: EndpointConfig) -> LinkResult<ConnectOutcome> {
        let (ack, done) = oneshot::channel();
        self.command(Command::Connect { endpoint, ack })?;
        done.await.map_err(|_| LinkError::Shutdown)
    }

    /// Connect to the endpoint held by `settings`.
    pub async fn connect_with<S>(&self, settings: &S) -> LinkResult<ConnectOutcome>
    where
        S: SettingsStore + ?Sized,
    {
        self.connect_to(&settings.host(), &settings.port()).await
    }

    /// Connect to a host and port given as raw strings.
    ///
    /// A rejected host or port is reported in the recent log and returned;
    /// the phase does not change.
    pub async fn connect_to(&self, host: &str, port: &str) -> LinkResult<ConnectOutcome> {
        match EndpointConfig::parse(host, port) {
            Ok(endpoint) => self.connect(endpoint).await,
            Err(err) => {
                warn!(host, port, "rejected endpoint: {err}");
                self.report(err.status()).await?;
                Err(err.into())
            }
        }
    }

    /// Close the link. Resolves after the connection is torn down.
    ///
    /// No-op when already disconnected.
    pub async fn disconnect(&self) -> LinkResult<()> {
        let (ack, done) = oneshot::channel();
        self.command(Command::Disconnect { ack })?;
        done.await.map_err(|_| LinkError::Shutdown)
    }

    /// Send `text` as-is.
    ///
    /// Without a live connection the message is dropped and "Not connected"
    /// is recorded.
    pub fn send(&self, text: impl Into<String>) -> LinkResult<()> {
        self.command(Command::Send { text: text.into() })
    }

    /// Current snapshot.
    pub fn state(&self) -> LinkState {
        self.state.borrow().clone()
    }

    /// A receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<LinkState> {
        self.state.clone()
    }

    /// Wait until the state satisfies `predicate`, returning that snapshot.
    pub async fn wait_for<F>(&self, mut predicate: F) -> LinkResult<LinkState>
    where
        F: FnMut(&LinkState) -> bool,
    {
        let mut rx = self.state.clone();
        let state = rx
            .wait_for(|state| predicate(state))
            .await
            .map_err(|_| LinkError::Shutdown)?;
        Ok(state.clone())
    }

    async fn report(&self, status: String) -> LinkResult<()> {
        let (ack, done) = oneshot::channel();
        self.command(Command::Report { status, ack })?;
        done.await.map_err(|_| LinkError::Shutdown)
    }

    fn command(&self, command: Command) -> LinkResult<()> {
        self.commands.send(command).map_err(|_| LinkError::Shutdown)
    }
}
