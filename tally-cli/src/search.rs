//! Simulated regional search used as an illustrative retried operation

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("search in {region} unavailable (call {call})")]
    Unavailable { region: String, call: u32 },
}

/// A region that fails its first `failures` calls and answers afterwards
#[derive(Debug)]
pub struct SimulatedSearch {
    region: String,
    failures: u32,
    latency: Duration,
    calls: AtomicU32,
}

impl SimulatedSearch {
    pub fn new(region: impl Into<String>, failures: u32, latency: Duration) -> Self {
        Self {
            region: region.into(),
            failures,
            latency,
            calls: AtomicU32::new(0),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Number of calls made so far
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn search(&self) -> Result<String, SearchError> {
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }

        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            Err(SearchError::Unavailable {
                region: self.region.clone(),
                call,
            })
        } else {
            Ok(format!("results for {}", self.region))
        }
    }
}
