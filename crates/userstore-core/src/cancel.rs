//! Cooperative cancellation for storage calls.
//!
//! Dropping an operation future already aborts the in-flight store call.
//! [`with_cancellation`] additionally lets a caller cancel through a shared
//! token and observe the outcome as [`StoreError::Cancelled`] instead of a
//! storage failure.

use tokio_util::sync::CancellationToken;

use crate::error::{Operation, StoreError, StoreResult};

/// Run `fut` until it completes or `token` is cancelled, whichever comes
/// first. A token that is already cancelled wins without polling `fut`.
pub async fn with_cancellation<T, F>(
    token: &CancellationToken,
    operation: Operation,
    fut: F,
) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(StoreError::Cancelled { operation }),
        result = fut => result,
    }
}
