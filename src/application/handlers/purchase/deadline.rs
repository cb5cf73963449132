//! Bounded collaborator calls.

use std::future::Future;
use std::time::Duration;

use crate::domain::purchase::PurchaseError;

/// Used when a handler is built without an explicit operation timeout.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Awaits `call` for at most `limit`.
///
/// An elapsed call becomes `Upstream("<operation> timed out")`. Nothing is
/// retried here.
pub(crate) async fn bounded<T, E, F>(
    limit: Duration,
    operation: &'static str,
    call: F,
) -> Result<T, PurchaseError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<PurchaseError>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => {
            tracing::warn!(
                operation,
                timeout_ms = limit.as_millis() as u64,
                "Collaborator call timed out"
            );
            Err(PurchaseError::Upstream(format!("{} timed out", operation)))
        }
    }
}
