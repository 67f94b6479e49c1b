//! Remote Trigger Link - Wire Protocol
//!
//! Messages are UTF-8 text of the form `<flag>;<payload>`. The heartbeat probe
//! is the bare literal `ping`; the reply is `pong;<server epoch seconds>`.
//!
//! - **Codec**: [`encode`] / [`decode`] between `(flag, payload)` and bytes
//! - **Framing**: [`Framing`] and [`Framer`] delimit messages on the byte stream
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   Message { flag, payload }             │  ← codec
//! ├─────────────────────────────────────────┤
//! │   "a;payload\n"                         │  ← framing
//! ├─────────────────────────────────────────┤
//! │              TCP                        │
//! └─────────────────────────────────────────┘
//! ```

mod codec;
mod framing;

pub use codec::*;
pub use framing::*;
