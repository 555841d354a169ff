use super::progress::TransferProgress;
use futures::future::join_all;
use serde::Serialize;
use std::future::Future;
use utoipa::ToSchema;

/// One item that did not make it through a batched run.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct TransferFailure {
    pub item: String,
    pub error: String,
}

impl TransferFailure {
    pub fn new(item: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            item: item.into(),
            error: error.to_string(),
        }
    }
}

/// Outcome of a batched run. Failed items are reported, never retried;
/// whether they matter is up to the caller.
#[derive(Debug, Clone)]
pub struct BatchResult<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<TransferFailure>,
    pub batches: usize,
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
            batches: 0,
        }
    }
}

impl<T> BatchResult<T> {
    pub fn processed(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Number of batches needed for `total` items: `ceil(total / batch_size)`.
pub fn batch_count(total: usize, batch_size: usize) -> usize {
    total.div_ceil(batch_size.max(1))
}

/// Sizes of the contiguous batches `total` items split into.
pub fn batch_sizes(total: usize, batch_size: usize) -> Vec<usize> {
    let batch_size = batch_size.max(1);
    (0..batch_count(total, batch_size))
        .map(|i| (total - i * batch_size).min(batch_size))
        .collect()
}

/// Runs an async operation over items in fixed-size batches.
///
/// Every item of a batch is started together and the batch must fully settle
/// before the next one starts, so at most `batch_size` operations are in flight.
#[derive(Debug, Clone, Copy)]
pub struct BatchRunner {
    batch_size: usize,
}

impl BatchRunner {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub async fn run<I, T, F, Fut>(
        &self,
        items: Vec<I>,
        progress: &TransferProgress,
        op: F,
    ) -> BatchResult<T>
    where
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, TransferFailure>>,
    {
        let total = items.len();
        let expected_batches = batch_count(total, self.batch_size);
        let mut result = BatchResult::default();
        let mut remaining = items.into_iter();

        loop {
            let batch: Vec<I> = remaining.by_ref().take(self.batch_size).collect();
            if batch.is_empty() {
                break;
            }
            result.batches += 1;
            tracing::debug!(
                "📦 Batch {}/{} started with {} items",
                result.batches,
                expected_batches,
                batch.len()
            );

            let settled = join_all(batch.into_iter().map(|item| {
                let fut = op(item);
                async move {
                    let outcome = fut.await;
                    if let Err(failure) = &outcome {
                        tracing::warn!(
                            "⚠️  Transfer of '{}' failed: {}",
                            failure.item,
                            failure.error
                        );
                    }
                    progress.record_completion();
                    outcome
                }
            }))
            .await;

            for outcome in settled {
                match outcome {
                    Ok(value) => result.succeeded.push(value),
                    Err(failure) => result.failed.push(failure),
                }
            }

            tracing::debug!(
                "📦 Batch {}/{} settled, progress {}%",
                result.batches,
                expected_batches,
                progress.percent()
            );
        }

        result
    }
}
