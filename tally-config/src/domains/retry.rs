//! Retry configuration
//!
//! The retry domain is the resilience crate's own [`RetryPolicy`], so a
//! loaded config can be handed to a `RetryWrapper` without conversion.

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use std::time::Duration;
use tally_resilience::RetryPolicy;

/// Largest attempt budget accepted from configuration
pub const MAX_CONFIGURED_ATTEMPTS: u32 = 1000;

impl Validatable for RetryPolicy {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.max_attempts, "max_attempts", self.domain_name())?;

        if self.max_attempts > MAX_CONFIGURED_ATTEMPTS {
            return Err(self.validation_error(format!(
                "max_attempts cannot exceed {}, got {}",
                MAX_CONFIGURED_ATTEMPTS, self.max_attempts
            )));
        }

        if self.interval > Duration::from_secs(3600) {
            return Err(self.validation_error("interval cannot exceed 1 hour"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "retry"
    }
}
