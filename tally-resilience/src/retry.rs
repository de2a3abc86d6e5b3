//! Retry policy and wrapper

use futures::FutureExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::FailureTrail;
use crate::operation::OperationFuture;

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,

    /// Delay between a failed attempt and the next one
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            interval: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Create a policy that retries back-to-back up to `max_attempts` times
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            interval: Duration::ZERO,
        }
    }

    /// Wait `interval` between attempts
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Create a retry wrapper with a back-to-back budget of `max_attempts`
pub fn setup_retry(max_attempts: u32) -> RetryWrapper {
    RetryWrapper::new(RetryPolicy::new(max_attempts))
}

/// Wraps operation factories with bounded retry.
///
/// A wrapped factory has the same shape as the one it wraps, so it can be
/// passed anywhere an operation is expected, including
/// [`merge_successes`](crate::merge::merge_successes).
#[derive(Debug, Clone, Default)]
pub struct RetryWrapper {
    policy: RetryPolicy,
}

impl RetryWrapper {
    /// Create a new retry wrapper with the given policy
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Policy applied to every operation this wrapper wraps
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Wrap `operation` so each call of the returned factory runs a fresh
    /// retry chain. `id` only tags diagnostics.
    ///
    /// Wrapping does not invoke the operation.
    pub fn wrap<F, Fut, T, E, I>(
        &self,
        operation: F,
        id: I,
    ) -> impl Fn() -> OperationFuture<T, FailureTrail<E>> + Clone + Send + Sync + 'static
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Debug + Send + 'static,
        I: Display + Send + Sync + 'static,
    {
        let operation = Arc::new(operation);
        let id = Arc::new(id);
        let policy = self.policy.clone();

        move || {
            let chain = RetryChain {
                operation: Arc::clone(&operation),
                id: Arc::clone(&id),
                policy: policy.clone(),
            };
            chain.run().boxed()
        }
    }

    /// Wrap every operation, tagging each with its position in the input
    pub fn wrap_all<Ops, F, Fut, T, E>(
        &self,
        operations: Ops,
    ) -> Vec<impl Fn() -> OperationFuture<T, FailureTrail<E>> + Clone + Send + Sync + 'static>
    where
        Ops: IntoIterator<Item = F>,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Debug + Send + 'static,
    {
        operations
            .into_iter()
            .enumerate()
            .map(|(index, operation)| self.wrap(operation, index))
            .collect()
    }
}

/// State of one logical retry chain. Never shared between chains.
struct RetryChain<F, I> {
    operation: Arc<F>,
    id: Arc<I>,
    policy: RetryPolicy,
}

impl<F, I> RetryChain<F, I> {
    async fn run<Fut, T, E>(self) -> Result<T, FailureTrail<E>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Debug,
        I: Display,
    {
        let operation = self.operation.as_ref();
        let max_attempts = self.policy.max_attempts;
        // Grows with failed attempts only; the budget may be far larger
        let mut trail = FailureTrail::new();

        for attempt in 1..=max_attempts {
            if attempt > 1 && !self.policy.interval.is_zero() {
                sleep(self.policy.interval).await;
            }

            debug!("id {} attempt {}/{} starting", self.id, attempt, max_attempts);

            match operation().await {
                Ok(value) => {
                    info!("id {} attempt {} succeeded", self.id, attempt);
                    return Ok(value);
                }
                Err(error) => {
                    warn!("id {} attempt {} failed: {:?}", self.id, attempt, error);
                    trail.push(error);
                }
            }
        }

        if max_attempts == 0 {
            debug!("id {} has no attempt budget, operation not invoked", self.id);
        } else {
            warn!("id {} exhausted {} attempts", self.id, max_attempts);
        }

        Err(trail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Operation that fails until `failures` calls have been made
    fn flaky(
        failures: u32,
        calls: Arc<AtomicU32>,
    ) -> impl Fn() -> futures::future::Ready<Result<String, String>> + Send + Sync + 'static {
        move || {
            let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= failures {
                futures::future::ready(Err(format!("failure {}", call)))
            } else {
                futures::future::ready(Ok(format!("success on {}", call)))
            }
        }
    }

    #[tokio::test]
    async fn test_always_failing_collects_every_reason() {
        for max_attempts in 1..=5 {
            let calls = Arc::new(AtomicU32::new(0));
            let wrapped = setup_retry(max_attempts).wrap(flaky(u32::MAX, calls.clone()), "always");

            let trail = wrapped().await.unwrap_err();

            assert_eq!(trail.len(), max_attempts as usize);
            assert_eq!(calls.load(Ordering::SeqCst), max_attempts);
            let expected: Vec<String> = (1..=max_attempts).map(|n| format!("failure {}", n)).collect();
            assert_eq!(trail.into_inner(), expected);
        }
    }

    #[tokio::test]
    async fn test_success_on_kth_attempt() {
        for k in 1..=4 {
            let calls = Arc::new(AtomicU32::new(0));
            let wrapped = setup_retry(4).wrap(flaky(k - 1, calls.clone()), "kth");

            let value = wrapped().await.unwrap();

            assert_eq!(value, format!("success on {}", k));
            assert_eq!(calls.load(Ordering::SeqCst), k);
        }
    }

    #[tokio::test]
    async fn test_zero_budget_never_invokes() {
        let calls = Arc::new(AtomicU32::new(0));
        let wrapped = setup_retry(0).wrap(flaky(0, calls.clone()), "zero");

        let trail = wrapped().await.unwrap_err();

        assert!(trail.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_huge_budget_succeeding_first_attempt() {
        let wrapped = setup_retry(u32::MAX).wrap(|| async { Ok::<_, [u8; 64]>("ok") }, "huge");
        assert_eq!(wrapped().await.unwrap(), "ok");

        let calls = Arc::new(AtomicU32::new(0));
        let wrapped = setup_retry(1_000_000_000).wrap(flaky(2, calls.clone()), "large");

        assert_eq!(wrapped().await.unwrap(), "success on 3");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_wrapper_exposes_its_policy() {
        assert_eq!(setup_retry(5).policy(), &RetryPolicy::new(5));

        let policy = RetryPolicy::new(2).with_interval(Duration::from_millis(10));
        assert_eq!(RetryWrapper::new(policy.clone()).policy(), &policy);
        assert_eq!(RetryWrapper::default().policy(), &RetryPolicy::default());
    }

    #[tokio::test]
    async fn test_single_attempt_has_no_retry() {
        let calls = Arc::new(AtomicU32::new(0));
        let wrapped = setup_retry(1).wrap(flaky(1, calls.clone()), "once");

        let trail = wrapped().await.unwrap_err();

        assert_eq!(trail.into_inner(), vec!["failure 1".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wrapping_is_lazy_and_each_call_restarts() {
        let calls = Arc::new(AtomicU32::new(0));
        let wrapped = setup_retry(2).wrap(flaky(u32::MAX, calls.clone()), "lazy");
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let first = wrapped().await.unwrap_err();
        let second = wrapped.clone()().await.unwrap_err();

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_eq!(second.first(), Some(&"failure 3".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_trail_order_matches_attempt_order() {
        let reasons = Arc::new(Mutex::new(vec!["third", "second", "first"]));
        let reasons_clone = reasons.clone();

        let wrapped = setup_retry(3).wrap(
            move || {
                let reason = reasons_clone.lock().unwrap().pop();
                async move { Err::<(), _>(reason) }
            },
            "ordered",
        );

        let trail = wrapped().await.unwrap_err();
        assert_eq!(
            trail.into_inner(),
            vec![Some("first"), Some("second"), Some("third")]
        );
        assert!(reasons.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_between_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let wrapper = RetryWrapper::new(RetryPolicy::new(3).with_interval(Duration::from_secs(1)));
        let wrapped = wrapper.wrap(flaky(2, calls.clone()), "spaced");

        let started = tokio::time::Instant::now();
        let value = wrapped().await.unwrap();

        assert_eq!(value, "success on 3");
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_wrap_all_preserves_input_order() {
        let wrapped = setup_retry(2).wrap_all((0..3u32).map(|n| move || async move {
            Ok::<_, String>(n * 10)
        }));

        assert_eq!(wrapped.len(), 3);
        for (index, operation) in wrapped.iter().enumerate() {
            assert_eq!(operation().await.unwrap(), index as u32 * 10);
        }
    }

    #[test]
    fn test_policy_serde() {
        let policy: RetryPolicy =
            serde_json::from_str(r#"{"max_attempts": 5, "interval": "250ms"}"#).unwrap();
        assert_eq!(policy, RetryPolicy::new(5).with_interval(Duration::from_millis(250)));

        let defaulted: RetryPolicy = serde_json::from_str(r#"{"max_attempts": 2}"#).unwrap();
        assert_eq!(defaulted.interval, Duration::ZERO);

        let empty: RetryPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, RetryPolicy::default());
        assert_eq!(empty.max_attempts, 3);
    }
}
