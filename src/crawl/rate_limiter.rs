use super::FetchError;
use super::fetcher::TOKEN_HINT;
use chrono::{DateTime, Local, Utc};
use core::fmt::{Display, Formatter};
use core::time::Duration;
use tokio::sync::Mutex;

const LOG_TARGET: &str = "     quota";

/// GitHub request allowance buckets, each with its own limit and reset time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuotaPool {
    /// Applies only to `/search` endpoints.
    Search,

    /// Applies to every other API endpoint.
    Core,
}

impl QuotaPool {
    /// Pick the pool an API endpoint path draws from.
    #[must_use]
    pub fn for_endpoint(endpoint: &str) -> Self {
        if endpoint.trim_start_matches('/').starts_with("search") {
            Self::Search
        } else {
            Self::Core
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Core => "core",
        }
    }
}

impl Display for QuotaPool {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quota values reported by the server, either through response headers or by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSnapshot {
    pub limit: Option<u64>,
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
}

/// Authoritative source of quota values, queried when the cached count can't be trusted.
///
/// Querying must not itself consume quota.
pub trait QuotaSource {
    fn quota_status(&self, pool: QuotaPool) -> impl Future<Output = Result<QuotaSnapshot, FetchError>> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
struct PoolState {
    /// `None` until the first observation; forces a status query.
    remaining: Option<u64>,
    reset_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Pools {
    search: PoolState,
    core: PoolState,
}

impl Pools {
    const fn get_mut(&mut self, pool: QuotaPool) -> &mut PoolState {
        match pool {
            QuotaPool::Search => &mut self.search,
            QuotaPool::Core => &mut self.core,
        }
    }
}

/// Tracks the remaining request count of each [`QuotaPool`] and waits out exhausted pools.
///
/// Counts are pushed in with [`RateLimiter::observe`] after every response that carries quota headers,
/// so [`RateLimiter::acquire`] only needs to ask the server when a pool reads as empty or unknown.
///
/// `acquire` holds the pool lock for its whole duration, including any wait for a reset, so concurrent
/// callers line up behind a single status query instead of each issuing their own.
#[derive(Debug)]
pub struct RateLimiter {
    pools: Mutex<Pools>,
    notification_interval: Duration,
    authenticated: bool,
}

impl RateLimiter {
    #[must_use]
    pub fn new(notification_interval: Duration, authenticated: bool) -> Self {
        Self {
            pools: Mutex::new(Pools::default()),
            notification_interval,
            authenticated,
        }
    }

    /// Record quota values seen on a response.
    pub async fn observe(&self, pool: QuotaPool, snapshot: QuotaSnapshot) {
        let mut pools = self.pools.lock().await;
        let state = pools.get_mut(pool);
        state.remaining = Some(snapshot.remaining);
        state.reset_at = Some(snapshot.reset_at);
    }

    /// Last known remaining request count for `pool`, if any.
    pub async fn remaining(&self, pool: QuotaPool) -> Option<u64> {
        self.pools.lock().await.get_mut(pool).remaining
    }

    /// Wait until at least one request may be issued against `pool`.
    ///
    /// A nonzero cached count is trusted as is. Otherwise `source` is asked for the real count and, when
    /// the pool is empty, this waits until the reset time has passed. The cached count is left at zero
    /// after such a wait so the next caller checks with the server again.
    pub async fn acquire(&self, pool: QuotaPool, source: &impl QuotaSource) -> Result<(), FetchError> {
        let mut pools = self.pools.lock().await;
        let state = pools.get_mut(pool);

        if state.remaining.is_some_and(|remaining| remaining > 0) {
            return Ok(());
        }

        let status = source.quota_status(pool).await?;
        if let Some(limit) = status.limit {
            log::info!(target: LOG_TARGET, "{pool} API request allotment: {limit}");
        }
        log::info!(target: LOG_TARGET, "Remaining {pool} API requests: {}", status.remaining);

        state.remaining = Some(status.remaining);
        state.reset_at = Some(status.reset_at);

        if status.remaining == 0 {
            self.wait_for_reset(pool, status.reset_at).await;
        }

        Ok(())
    }

    async fn wait_for_reset(&self, pool: QuotaPool, reset_at: DateTime<Utc>) {
        if !self.authenticated {
            eprintln!("{TOKEN_HINT}");
        }

        let formatted_time = reset_at.with_timezone(&Local).format("%T");
        log::info!(target: LOG_TARGET, "GitHub {pool} API request limit reached, waiting until {formatted_time}");

        // A negative remainder means the reset time has already passed
        while let Ok(left) = (reset_at - Utc::now()).to_std() {
            if left.is_zero() {
                break;
            }

            eprintln!(
                "GitHub {pool} API request limit reached. Time before limit reset: {} minutes",
                left.as_secs() / 60
            );

            let nap = if self.notification_interval.is_zero() {
                left
            } else {
                left.min(self.notification_interval)
            };
            tokio::time::sleep(nap).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct FakeSource {
        snapshot: QuotaSnapshot,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(remaining: u64, reset_at: DateTime<Utc>) -> Self {
            Self {
                snapshot: QuotaSnapshot {
                    limit: Some(5000),
                    remaining,
                    reset_at,
                },
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl QuotaSource for FakeSource {
        async fn quota_status(&self, _pool: QuotaPool) -> Result<QuotaSnapshot, FetchError> {
            let _ = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.snapshot)
        }
    }

    fn limiter() -> RateLimiter {
        RateLimiter::new(Duration::from_millis(50), true)
    }

    #[test]
    fn test_pool_for_endpoint() {
        assert_eq!(QuotaPool::for_endpoint("search/repositories"), QuotaPool::Search);
        assert_eq!(QuotaPool::for_endpoint("/search/code"), QuotaPool::Search);
        assert_eq!(QuotaPool::for_endpoint("repos/owner/repo/contents"), QuotaPool::Core);
        assert_eq!(QuotaPool::for_endpoint("rate_limit"), QuotaPool::Core);
    }

    #[tokio::test]
    async fn test_unknown_count_forces_status_query() {
        let limiter = limiter();
        let source = FakeSource::new(4999, Utc::now());

        limiter.acquire(QuotaPool::Core, &source).await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(limiter.remaining(QuotaPool::Core).await, Some(4999));
    }

    #[tokio::test]
    async fn test_cached_positive_count_skips_status_query() {
        let limiter = limiter();
        let source = FakeSource::new(0, Utc::now());
        limiter
            .observe(
                QuotaPool::Search,
                QuotaSnapshot {
                    limit: None,
                    remaining: 3,
                    reset_at: Utc::now(),
                },
            )
            .await;

        limiter.acquire(QuotaPool::Search, &source).await.unwrap();
        limiter.acquire(QuotaPool::Search, &source).await.unwrap();

        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_pools_are_independent() {
        let limiter = limiter();
        let source = FakeSource::new(10, Utc::now());
        limiter
            .observe(
                QuotaPool::Core,
                QuotaSnapshot {
                    limit: None,
                    remaining: 10,
                    reset_at: Utc::now(),
                },
            )
            .await;

        limiter.acquire(QuotaPool::Core, &source).await.unwrap();
        assert_eq!(source.calls(), 0);

        limiter.acquire(QuotaPool::Search, &source).await.unwrap();
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_pool_waits_for_reset() {
        let limiter = limiter();
        let source = FakeSource::new(0, Utc::now() + chrono::Duration::milliseconds(300));

        let start = tokio::time::Instant::now();
        limiter.acquire(QuotaPool::Core, &source).await.unwrap();
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(250), "waited only {elapsed:?}");
        assert_eq!(limiter.remaining(QuotaPool::Core).await, Some(0));

        // The count stays at zero, so the next caller asks the server again
        limiter.acquire(QuotaPool::Core, &source).await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_pool_with_past_reset_does_not_wait() {
        let limiter = limiter();
        let source = FakeSource::new(0, Utc::now() - chrono::Duration::seconds(5));

        let start = tokio::time::Instant::now();
        limiter.acquire(QuotaPool::Search, &source).await.unwrap();

        assert!(start.elapsed() < Duration::from_millis(200));
    }
}
