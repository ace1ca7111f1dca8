//! Logging
//!
//! Library code only emits `tracing` events; the process entry point calls
//! [`init_logging`] once.

mod logger;

pub use logger::{env_filter, init_logging};
