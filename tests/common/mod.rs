//! Scripted operations shared by the integration tests

#![allow(dead_code)]

use futures::future::{ready, Ready};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Replays a fixed list of outcomes, one per call. Calls past the end of the
/// script repeat the last outcome.
pub struct Script<T, E> {
    outcomes: Vec<Result<T, E>>,
    calls: AtomicUsize,
}

impl<T: Clone, E: Clone> Script<T, E> {
    pub fn new(outcomes: Vec<Result<T, E>>) -> Arc<Self> {
        assert!(!outcomes.is_empty(), "a script needs at least one outcome");
        Arc::new(Self {
            outcomes,
            calls: AtomicUsize::new(0),
        })
    }

    /// Number of times the operation has been invoked
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> Result<T, E> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes[call.min(self.outcomes.len() - 1)].clone()
    }
}

/// Operation factory that plays `script`
pub fn operation<T, E>(
    script: &Arc<Script<T, E>>,
) -> impl Fn() -> Ready<Result<T, E>> + Clone + Send + Sync + 'static
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    let script = Arc::clone(script);
    move || ready(script.next())
}
