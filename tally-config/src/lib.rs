//! Domain-driven configuration management for Tally
//!
//! Configuration is split by functional domain, loaded from YAML with
//! environment variable overrides, and validated before use.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{logging::LoggingConfig, TallyConfig};
pub use tally_resilience::RetryPolicy;
