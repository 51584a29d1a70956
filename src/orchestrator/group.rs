use std::future::Future;

use futures::{stream, StreamExt, TryStreamExt};

use crate::error::AppResult;

/// Fan-out with an ordered, all-or-nothing join.
///
/// Results come back in job order regardless of completion order. The first
/// failure (in job order) is returned and the remaining jobs are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyGroup {
    limit: Option<usize>,
}

impl ConcurrencyGroup {
    pub fn unbounded() -> Self {
        Self { limit: None }
    }

    /// At most `limit` jobs in flight; 0 is treated as 1.
    pub fn bounded(limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
        }
    }

    pub fn sequential() -> Self {
        Self::bounded(1)
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub async fn join_all<T, F>(&self, jobs: Vec<F>) -> AppResult<Vec<T>>
    where
        F: Future<Output = AppResult<T>>,
    {
        let width = self.limit.unwrap_or(jobs.len()).max(1);
        stream::iter(jobs).buffered(width).try_collect().await
    }
}
