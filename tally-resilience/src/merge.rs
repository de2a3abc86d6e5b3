//! Concurrent merging of operations under an at-least-one-success policy

use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info};
use std::future::Future;

use crate::error::{MergeFailure, MergeOutcome};

/// Run every operation concurrently and merge their outcomes.
///
/// All factories are invoked up front and their futures are driven together
/// on the calling task; none waits for another to start. The merge settles
/// once, after every operation has settled:
///
/// - if any operation succeeded, with one slot per input where failed
///   operations leave a `None` hole at their index;
/// - otherwise with a [`MergeFailure`] holding every failure in input order.
///
/// An empty input has no success and therefore fails with no failures.
pub async fn merge_successes<Ops, F, Fut, T, E>(operations: Ops) -> MergeOutcome<T, E>
where
    Ops: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut in_flight: FuturesUnordered<_> = operations
        .into_iter()
        .enumerate()
        .map(|(index, operation)| {
            let future = operation();
            async move { (index, future.await) }
        })
        .collect();

    let mut state = MergeState::new(in_flight.len());
    debug!("Merging {} operations", state.pending);

    while let Some((index, outcome)) = in_flight.next().await {
        if state.record(index, outcome) {
            break;
        }
    }

    state.settle()
}

/// Index-aligned bookkeeping for one merge call
struct MergeState<T, E> {
    results: Vec<Option<T>>,
    errors: Vec<Option<E>>,
    pending: usize,
    had_success: bool,
}

impl<T, E> MergeState<T, E> {
    fn new(len: usize) -> Self {
        Self {
            results: std::iter::repeat_with(|| None).take(len).collect(),
            errors: std::iter::repeat_with(|| None).take(len).collect(),
            pending: len,
            had_success: false,
        }
    }

    /// Record the settlement of operation `index`. Returns true once every
    /// operation has settled.
    fn record(&mut self, index: usize, outcome: Result<T, E>) -> bool {
        debug_assert!(
            self.results[index].is_none() && self.errors[index].is_none(),
            "slot {} settled twice",
            index
        );

        match outcome {
            Ok(value) => {
                self.results[index] = Some(value);
                self.had_success = true;
            }
            Err(error) => {
                self.errors[index] = Some(error);
            }
        }

        self.pending -= 1;
        self.pending == 0
    }

    fn settle(self) -> MergeOutcome<T, E> {
        debug_assert_eq!(self.pending, 0, "merge settled with operations pending");

        if self.had_success {
            let failed = self.results.iter().filter(|slot| slot.is_none()).count();
            info!(
                "Merge succeeded with {} of {} operations",
                self.results.len() - failed,
                self.results.len()
            );
            Ok(self.results)
        } else {
            info!("Merge failed: all {} operations failed", self.errors.len());
            // Without a success every slot holds an error.
            Err(MergeFailure {
                failures: self.errors.into_iter().flatten().collect(),
            })
        }
    }
}
