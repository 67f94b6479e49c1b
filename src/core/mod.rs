//! Core types shared by every layer of the link.
//!
//! - [`constants`]: wire tokens and default timings
//! - errors for the codec, clock, flags and configuration
//! - the [`WallClock`] time source

pub mod constants;
mod error;
mod traits;

pub use error::*;
pub use traits::*;
