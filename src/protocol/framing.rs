//! Stream framing.
//!
//! TCP delivers a byte stream, not messages. [`Framing::Newline`] terminates
//! every outbound message with `\n` and reassembles inbound lines across
//! reads. [`Framing::ReadBoundary`] treats each read as exactly one message,
//! which only works while the transport happens to preserve send boundaries.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::constants::{LINE_TERMINATOR, MAX_FRAME_SIZE};

/// How messages are delimited on the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Framing {
    /// One message per `\n`-terminated line.
    #[default]
    Newline,
    /// One message per transport read, nothing appended on send.
    ReadBoundary,
}

impl Framing {
    /// Wrap an encoded message for the wire.
    pub fn frame(&self, message: &[u8]) -> Vec<u8> {
        match self {
            Framing::Newline => {
                let mut out = Vec::with_capacity(message.len() + 1);
                out.extend_from_slice(message);
                out.push(LINE_TERMINATOR);
                out
            }
            Framing::ReadBoundary => message.to_vec(),
        }
    }

    /// Create an inbound framer for this mode.
    pub fn framer(&self) -> Framer {
        Framer::new(*self)
    }
}

/// Splits inbound reads into messages.
#[derive(Debug)]
pub struct Framer {
    framing: Framing,
    buffer: Vec<u8>,
    /// Dropping the rest of an oversized line until its terminator.
    discarding: bool,
}

impl Framer {
    /// Create a framer for the given mode.
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            buffer: Vec::new(),
            discarding: false,
        }
    }

    /// Feed one read's worth of bytes and return every complete message.
    ///
    /// Empty messages are skipped. Terminators (and a `\r` before `\n`) are
    /// not part of the returned frames. A line longer than [`MAX_FRAME_SIZE`]
    /// is dropped whole, up to and including its terminator.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        match self.framing {
            Framing::ReadBoundary => {
                if chunk.is_empty() {
                    Vec::new()
                } else {
                    vec![chunk.to_vec()]
                }
            }
            Framing::Newline => self.push_lines(chunk),
        }
    }

    fn push_lines(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        for &byte in chunk {
            if byte == LINE_TERMINATOR {
                if std::mem::take(&mut self.discarding) {
                    continue;
                }
                let mut line = std::mem::take(&mut self.buffer);
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                if !line.is_empty() {
                    frames.push(line);
                }
            } else if !self.discarding {
                if self.buffer.len() == MAX_FRAME_SIZE {
                    warn!("discarding line longer than {MAX_FRAME_SIZE} bytes");
                    self.buffer.clear();
                    self.discarding = true;
                } else {
                    self.buffer.push(byte);
                }
            }
        }
        frames
    }

    /// Bytes buffered toward an incomplete message.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Drop any partial message.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }
}
