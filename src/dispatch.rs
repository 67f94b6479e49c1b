//! Action dispatch table.
//!
//! Routes inbound `(flag, payload)` messages to handlers supplied by the host
//! application. The table is assembled with an [`ActionTableBuilder`] and then
//! frozen: the link takes ownership of the finished [`ActionTable`] before any
//! connection can reach `Ready`, so no registration can race with dispatch.
//!
//! # Example
//!
//! ```
//! use trigger_link::dispatch::ActionTable;
//!
//! let table = ActionTable::builder()
//!     .on("a", |payload| println!("start {payload}"))?
//!     .on("b", |payload| println!("stop {payload}"))?
//!     .build();
//!
//! assert!(table.dispatch("a", "").handled);
//! assert!(!table.dispatch("z", "").handled);
//! # Ok::<(), trigger_link::core::FlagError>(())
//! ```

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::core::constants::{DELIMITER, PONG_FLAG};
use crate::core::FlagError;

/// Side-effect handler for a flag. Receives the payload.
pub type Action = Box<dyn Fn(&str) + Send + Sync>;

/// Auto-reply handler for a flag. A returned string is sent back verbatim.
pub type Responder = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// A validated flag token.
///
/// Non-empty, free of `;`, and not the reserved heartbeat reply flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Flag(String);

impl Flag {
    /// Validate and wrap a flag token.
    pub fn new(token: impl Into<String>) -> Result<Self, FlagError> {
        let token = token.into();
        if token.is_empty() {
            return Err(FlagError::Empty);
        }
        if token.contains(DELIMITER) {
            return Err(FlagError::ContainsDelimiter(token));
        }
        if token == PONG_FLAG {
            return Err(FlagError::Reserved(token));
        }
        Ok(Self(token))
    }

    /// The flag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Flag {
    type Err = FlagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Borrow<str> for Flag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Flag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Default)]
struct Entry {
    action: Option<Action>,
    responder: Option<Responder>,
}

/// Result of dispatching one message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dispatch {
    /// Whether any handler was registered for the flag.
    pub handled: bool,
    /// Reply produced by the flag's responder, to be sent back.
    pub reply: Option<String>,
}

/// Builder for an [`ActionTable`].
#[derive(Default)]
pub struct ActionTableBuilder {
    entries: HashMap<Flag, Entry>,
}

impl ActionTableBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action` for `flag`, replacing any earlier one.
    ///
    /// Returns `true` if an action was replaced.
    pub fn register<F>(&mut self, flag: Flag, action: F) -> bool
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let entry = self.entries.entry(flag).or_default();
        entry.action.replace(Box::new(action)).is_some()
    }

    /// Register an auto-reply for `flag`, replacing any earlier one.
    ///
    /// Returns `true` if a responder was replaced.
    pub fn register_reply<F>(&mut self, flag: Flag, responder: F) -> bool
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        let entry = self.entries.entry(flag).or_default();
        entry.responder.replace(Box::new(responder)).is_some()
    }

    /// Chaining form of [`register`](Self::register).
    pub fn on<F>(mut self, flag: &str, action: F) -> Result<Self, FlagError>
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.register(Flag::new(flag)?, action);
        Ok(self)
    }

    /// Chaining form of [`register_reply`](Self::register_reply).
    pub fn reply<F>(mut self, flag: &str, responder: F) -> Result<Self, FlagError>
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.register_reply(Flag::new(flag)?, responder);
        Ok(self)
    }

    /// Freeze the table.
    pub fn build(self) -> ActionTable {
        ActionTable {
            entries: self.entries,
        }
    }
}

/// Immutable flag → handler routing table.
#[derive(Default)]
pub struct ActionTable {
    entries: HashMap<Flag, Entry>,
}

impl ActionTable {
    /// Start building a table.
    pub fn builder() -> ActionTableBuilder {
        ActionTableBuilder::new()
    }

    /// A table with no handlers.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Invoke the handlers registered for `flag`.
    ///
    /// An unknown flag is logged and reported as unhandled; it is never an error.
    pub fn dispatch(&self, flag: &str, payload: &str) -> Dispatch {
        let Some(entry) = self.entries.get(flag) else {
            warn!(flag, "no action registered for flag");
            return Dispatch::default();
        };

        if let Some(action) = &entry.action {
            debug!(flag, payload, "dispatching action");
            action(payload);
        }
        let reply = entry.responder.as_ref().and_then(|respond| respond(payload));

        Dispatch {
            handled: true,
            reply,
        }
    }

    /// Check if any handler is registered for `flag`.
    pub fn contains(&self, flag: &str) -> bool {
        self.entries.contains_key(flag)
    }

    /// Registered flags, in no particular order.
    pub fn flags(&self) -> impl Iterator<Item = &Flag> {
        self.entries.keys()
    }

    /// Number of registered flags.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table has no handlers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ActionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut flags: Vec<&str> = self.entries.keys().map(Flag::as_str).collect();
        flags.sort_unstable();
        f.debug_struct("ActionTable").field("flags", &flags).finish()
    }
}
