//! Retry with exponential back-off and jitter for source clients.
//!
//! [`retry_with_backoff`] wraps any fallible async source call and retries
//! on transient errors (network failures, timeouts, rate limits, 5xx).
//! Everything else — bad credentials, invalid locations, parse failures —
//! is returned immediately without any retry.

use std::future::Future;
use std::time::Duration;

use crate::error::SourceError;

/// Returns `true` for errors worth retrying after a back-off delay.
///
/// **Retriable:**
/// - [`SourceError::NetworkUnavailable`] and [`SourceError::Timeout`].
/// - [`SourceError::RateLimited`] — the server asked us to back off.
/// - [`SourceError::Status`] with a 5xx code — transient upstream trouble.
///
/// **Not retriable (hard stop):**
/// - [`SourceError::Status`] with a 4xx code — retrying returns the same
///   answer.
/// - [`SourceError::ApiKeyMissing`], [`SourceError::InvalidLocation`],
///   [`SourceError::Deserialize`], [`SourceError::NotInstalled`],
///   [`SourceError::Unexpected`].
pub(crate) fn is_retriable(err: &SourceError) -> bool {
    match err {
        SourceError::NetworkUnavailable(_)
        | SourceError::Timeout
        | SourceError::RateLimited { .. } => true,
        SourceError::Status { status, .. } => (500u16..600).contains(status),
        SourceError::ApiKeyMissing { .. }
        | SourceError::InvalidLocation { .. }
        | SourceError::Deserialize { .. }
        | SourceError::NotInstalled { .. }
        | SourceError::Unexpected(_) => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors.
///
/// The wait before the n-th retry is `backoff_base_ms * 2^(n-1)` with
/// ±25% jitter, capped at 60 s. Non-retriable errors are returned
/// immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient source error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
