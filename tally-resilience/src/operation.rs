//! Operation factories
//!
//! An operation is a zero-argument factory that produces a not-yet-started
//! future. Nothing runs until the factory is called and the returned future is
//! polled, so operations can be wrapped and collected freely.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;

/// Future produced by a type-erased operation
pub type OperationFuture<T, E> = BoxFuture<'static, Result<T, E>>;

/// Type-erased operation factory
pub type BoxOperation<T, E> = Box<dyn Fn() -> OperationFuture<T, E> + Send + Sync>;

/// Erase an operation factory so differently-typed closures can share a collection
pub fn boxed<F, Fut, T, E>(operation: F) -> BoxOperation<T, E>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    Box::new(move || operation().boxed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_boxing_does_not_invoke() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let operation: BoxOperation<u32, String> = boxed(move || {
            let calls = calls_clone.clone();
            async move { Ok(calls.fetch_add(1, Ordering::SeqCst) + 1) }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(operation().await, Ok(1));
        assert_eq!(operation().await, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_heterogeneous_operations_share_a_vec() {
        let operations: Vec<BoxOperation<&'static str, &'static str>> = vec![
            boxed(|| async { Ok("ok") }),
            boxed(|| async { Err("nope") }),
        ];

        assert_eq!(operations[0]().await, Ok("ok"));
        assert_eq!(operations[1]().await, Err("nope"));
    }
}
