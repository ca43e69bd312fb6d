//! Single local retry for transient backend failures (spec §7:
//! `BackendUnavailable` is retried once inside the adapter before it
//! surfaces to the caller).

use std::future::Future;

use ecss_core::StoreError;

pub(crate) async fn retry_once<T, F, Fut>(mut op: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    match op().await {
        Err(StoreError::BackendUnavailable(first_err)) => {
            tracing::warn!(error = %first_err, "transient backend error, retrying once");
            op().await
        }
        other => other,
    }
}
