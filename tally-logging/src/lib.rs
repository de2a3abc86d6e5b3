//! Logging initialisation for Tally
//!
//! Installs a `tracing` subscriber configured from [`LoggingConfig`]. Records
//! emitted through the `log` facade, as the resilience crate does, are
//! forwarded into the same subscriber.

pub mod init;

pub use init::{build_env_filter, init_logging, init_simple_tracing};
pub use tally_config::domains::logging::{LogFormat, LogLevel};
pub use tally_config::LoggingConfig;
