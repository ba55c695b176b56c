//! Proactive API rate limiting.
//!
//! Both external services throttle aggressively at single-operator scale;
//! waiting on a local limiter before each call is cheaper than eating 429
//! responses and backing off.

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Default requests-per-second budgets for the external services.
pub mod rate_limits {
    /// The record store allows an average of 3 requests per second.
    pub const RECORD_STORE_DEFAULT_RPS: u32 = 3;
    /// The asset service is more generous; 5/sec keeps well clear.
    pub const ASSET_SERVICE_DEFAULT_RPS: u32 = 5;
}

/// A shared, clonable rate limiter gating outbound API calls.
///
/// ```ignore
/// let limiter = ApiRateLimiter::new(rate_limits::RECORD_STORE_DEFAULT_RPS);
/// limiter.wait().await;
/// client.query_page(collection, None).await?;
/// ```
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
}

impl ApiRateLimiter {
    /// Create a limiter allowing `requests_per_second` calls. Zero is
    /// treated as one.
    #[must_use]
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second.max(1))
            .unwrap_or(NonZeroU32::MIN);
        Self {
            inner: Arc::new(RateLimiter::direct(Quota::per_second(rps))),
        }
    }

    /// Wait until the limiter admits another request.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }
}
