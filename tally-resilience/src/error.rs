//! Failure types shared by the retry wrapper and the success merger

use std::ops::Deref;

/// Every failure reason collected by one exhausted retry chain.
///
/// Reasons are kept in attempt order: the reason from the first attempt sits
/// at index 0 and the one that exhausted the budget is last. The trail is only
/// empty when the budget was zero and the operation never ran.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Operation failed after {} attempt(s)", .0.len())]
pub struct FailureTrail<E>(Vec<E>);

impl<E> FailureTrail<E> {
    pub(crate) fn new() -> Self {
        Self(Vec::new())
    }

    pub(crate) fn push(&mut self, reason: E) {
        self.0.push(reason);
    }

    /// Reason reported by the first attempt
    pub fn first(&self) -> Option<&E> {
        self.0.first()
    }

    /// Reason reported by the attempt that exhausted the budget
    pub fn last(&self) -> Option<&E> {
        self.0.last()
    }

    /// Consume the trail, returning the reasons in attempt order
    pub fn into_inner(self) -> Vec<E> {
        self.0
    }
}

impl<E> From<Vec<E>> for FailureTrail<E> {
    fn from(reasons: Vec<E>) -> Self {
        Self(reasons)
    }
}

impl<E> Deref for FailureTrail<E> {
    type Target = [E];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<E> IntoIterator for FailureTrail<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, E> IntoIterator for &'a FailureTrail<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Returned by a merge when no operation succeeded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("All {} merged operation(s) failed", .failures.len())]
pub struct MergeFailure<E> {
    /// One failure per input operation, in input order
    pub failures: Vec<E>,
}

impl<E> MergeFailure<E> {
    /// Consume the error, returning the index-aligned failures
    pub fn into_failures(self) -> Vec<E> {
        self.failures
    }
}

/// Outcome of a merge: index-aligned values with `None` holes for failed
/// operations, or every failure when nothing succeeded.
pub type MergeOutcome<T, E> = Result<Vec<Option<T>>, MergeFailure<E>>;
