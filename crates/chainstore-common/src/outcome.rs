//! Fan-out result aggregation.
//!
//! [`AggregatedOutcome`] keeps every sub-operation's result at its input
//! position and summarizes them as an [`OverallStatus`]. One failure never
//! hides another entry's success.

use bytes::Bytes;
use serde_json::Value;

use crate::protocol::content_id::ContentId;
use crate::protocol::error::{GatewayError, Result};

/// Summary of a fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverallStatus {
    AllSucceeded,
    PartialFailure,
    AllFailed,
}

/// Ordered results of a fan-out plus their overall status.
///
/// # Example
///
/// ```
/// use chainstore_common::outcome::{AggregatedOutcome, OverallStatus};
/// use chainstore_common::GatewayError;
///
/// let outcome = AggregatedOutcome::from_results(vec![
///     Ok(1),
///     Err(GatewayError::Timeout(100)),
///     Ok(3),
/// ]);
///
/// assert_eq!(outcome.status(), OverallStatus::PartialFailure);
/// let failed: Vec<usize> = outcome.failures().map(|(i, _)| i).collect();
/// assert_eq!(failed, vec![1]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedOutcome<T> {
    results: Vec<Result<T>>,
    status: OverallStatus,
}

impl<T> AggregatedOutcome<T> {
    /// Aggregates `results`, keeping their order.
    ///
    /// An empty fan-out counts as `AllSucceeded`.
    pub fn from_results(results: Vec<Result<T>>) -> Self {
        let failed = results.iter().filter(|r| r.is_err()).count();
        let status = if failed == 0 {
            OverallStatus::AllSucceeded
        } else if failed == results.len() {
            OverallStatus::AllFailed
        } else {
            OverallStatus::PartialFailure
        };
        Self { results, status }
    }

    pub fn status(&self) -> OverallStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == OverallStatus::AllSucceeded
    }

    pub fn results(&self) -> &[Result<T>] {
        &self.results
    }

    /// Failed entries with their input index (0-based).
    pub fn failures(&self) -> impl Iterator<Item = (usize, &GatewayError)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().err().map(|e| (i, e)))
    }

    /// Successful values with their input index (0-based).
    pub fn successes(&self) -> impl Iterator<Item = (usize, &T)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().ok().map(|v| (i, v)))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_results(self) -> Vec<Result<T>> {
        self.results
    }

    /// Maps every successful value, leaving failures and the status as is.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> AggregatedOutcome<U> {
        AggregatedOutcome {
            results: self.results.into_iter().map(|r| r.map(&mut f)).collect(),
            status: self.status,
        }
    }
}

impl<T> FromIterator<Result<T>> for AggregatedOutcome<T> {
    fn from_iter<I: IntoIterator<Item = Result<T>>>(iter: I) -> Self {
        Self::from_results(iter.into_iter().collect())
    }
}

impl<T> IntoIterator for AggregatedOutcome<T> {
    type Item = Result<T>;
    type IntoIter = std::vec::IntoIter<Result<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

/// A value produced by either side of the gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayValue {
    /// An RPC result.
    Json(Value),
    /// The id of stored content.
    Content(ContentId),
    /// Retrieved content.
    Bytes(Bytes),
}

impl From<Value> for GatewayValue {
    fn from(value: Value) -> Self {
        GatewayValue::Json(value)
    }
}

impl From<ContentId> for GatewayValue {
    fn from(id: ContentId) -> Self {
        GatewayValue::Content(id)
    }
}

impl From<Bytes> for GatewayValue {
    fn from(bytes: Bytes) -> Self {
        GatewayValue::Bytes(bytes)
    }
}
