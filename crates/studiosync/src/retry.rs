//! Retry policy for rate-limited external calls.

use std::time::Duration;

use backon::ExponentialBuilder;

/// Initial backoff delay in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 1_000;

/// Maximum backoff delay in milliseconds.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Maximum retries for a single external call.
pub const MAX_RETRIES: usize = 5;

/// The standard backoff for record-store and asset-service calls:
/// 1s initial, 60s cap, 5 attempts, jittered.
///
/// ```ignore
/// use backon::Retryable;
///
/// let page = (|| client.query_page(collection, cursor.as_deref()))
///     .retry(default_backoff())
///     .when(RemoteError::is_rate_limited)
///     .await?;
/// ```
#[must_use]
pub fn default_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(INITIAL_BACKOFF_MS))
        .with_max_delay(Duration::from_millis(MAX_BACKOFF_MS))
        .with_max_times(MAX_RETRIES)
        .with_jitter()
}
