//! Resilience primitives for Tally
//!
//! This crate provides bounded retry for asynchronous operation factories and
//! a merger that runs many operations concurrently, succeeding when at least
//! one of them does.

pub mod error;
pub mod merge;
pub mod operation;
pub mod retry;

// Re-export commonly used types
pub use error::{FailureTrail, MergeFailure, MergeOutcome};
pub use merge::merge_successes;
pub use operation::{boxed, BoxOperation, OperationFuture};
pub use retry::{setup_retry, RetryPolicy, RetryWrapper};
