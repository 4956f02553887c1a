#![deny(missing_docs)]
//! Ringq is a fixed capacity queue for passing values between threads.
//!
//! Producers never block: when the queue is full the oldest value is
//! dropped. Consumers block until a value arrives, optionally with a timeout.

mod config;
pub mod error;
mod queue;

pub use config::{config, Config};
pub use error::{Error, Result};
pub use queue::Queue;
