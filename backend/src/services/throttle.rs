//! Mutation throttling
//!
//! A [`Throttle`] counts calls per client identity over a fixed window and
//! denies every call past `limit` until the window closes. Two backends are
//! provided:
//!
//! - [`InMemoryThrottle`]: keyed `governor` limiter whose key is the
//!   identity plus the window index. The quota replenishes one cell per
//!   window, so no call is refunded before the window ends. State lives in
//!   the process.
//! - [`RedisThrottle`]: fixed-window counter (`INCR` + `EXPIRE` in one
//!   transaction), shared across replicas and restarts.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock, Reference},
    middleware::NoOpMiddleware,
    state::keyed::DashMapStateStore,
};
use parking_lot::Mutex;
use redis::aio::ConnectionManager;
use tracing::{debug, warn};

use crate::error::{ServiceError, ServiceResult};

/// Keys kept per limiter before idle ones are pruned
const PRUNE_THRESHOLD: usize = 10_000;

/// Limit applied to mutations, shared with resolvers through schema data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottlePolicy {
    pub limit: u32,
    pub window: Duration,
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            limit: 20,
            window: Duration::from_secs(60),
        }
    }
}

/// Rate-limit gate evaluated before mutations
#[async_trait]
pub trait Throttle: Send + Sync {
    /// Count one call for `identity`; `RateLimitExceeded` once more than
    /// `limit` calls land inside `window`.
    async fn check(&self, identity: &str, limit: u32, window: Duration) -> ServiceResult<()>;
}

fn validate(limit: u32, window: Duration) -> ServiceResult<NonZeroU32> {
    if window.is_zero() {
        return Err(ServiceError::validation("throttle window must be positive"));
    }
    NonZeroU32::new(limit).ok_or_else(|| ServiceError::validation("throttle limit must be positive"))
}

/// Whole seconds to wait, rounded up and never zero
fn retry_after_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}

/// Index of the window containing `elapsed`, and time until it closes
fn window_position(elapsed: Duration, window: Duration) -> (u64, Duration) {
    let window_nanos = window.as_nanos();
    let elapsed_nanos = elapsed.as_nanos();
    let index = u64::try_from(elapsed_nanos / window_nanos).unwrap_or(u64::MAX);
    let closes_in = window_nanos - elapsed_nanos % window_nanos;
    (
        index,
        Duration::from_nanos(u64::try_from(closes_in).unwrap_or(u64::MAX)),
    )
}

type WindowKey = (String, u64);
type KeyedLimiter<C> =
    RateLimiter<WindowKey, DashMapStateStore<WindowKey>, C, NoOpMiddleware<<C as Clock>::Instant>>;

/// In-process throttle backed by one keyed limiter per (limit, window).
///
/// Windows are aligned to the moment the throttle was created.
pub struct InMemoryThrottle<C: Clock = DefaultClock> {
    limiters: Mutex<HashMap<(u32, Duration), Arc<KeyedLimiter<C>>>>,
    clock: C,
    start: C::Instant,
}

impl InMemoryThrottle {
    pub fn new() -> Self {
        Self::with_clock(DefaultClock::default())
    }
}

impl Default for InMemoryThrottle {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryThrottle<C> {
    /// Build a throttle reading time from `clock`
    pub fn with_clock(clock: C) -> Self {
        let start = clock.now();
        Self {
            limiters: Mutex::new(HashMap::new()),
            clock,
            start,
        }
    }

    fn limiter(&self, limit: NonZeroU32, window: Duration) -> ServiceResult<Arc<KeyedLimiter<C>>> {
        let mut limiters = self.limiters.lock();
        if let Some(limiter) = limiters.get(&(limit.get(), window)) {
            return Ok(limiter.clone());
        }

        // One cell per window: a key never regains a call inside its own window
        let quota = Quota::with_period(window)
            .ok_or_else(|| ServiceError::validation("throttle window must be positive"))?
            .allow_burst(limit);
        let limiter = Arc::new(RateLimiter::dashmap_with_clock(quota, &self.clock));
        limiters.insert((limit.get(), window), limiter.clone());
        Ok(limiter)
    }
}

#[async_trait]
impl<C> Throttle for InMemoryThrottle<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn check(&self, identity: &str, limit: u32, window: Duration) -> ServiceResult<()> {
        let limit = validate(limit, window)?;
        let limiter = self.limiter(limit, window)?;

        if limiter.len() > PRUNE_THRESHOLD {
            limiter.retain_recent();
        }

        let elapsed = Duration::from(self.clock.now().duration_since(self.start));
        let (index, closes_in) = window_position(elapsed, window);

        match limiter.check_key(&(identity.to_string(), index)) {
            Ok(()) => {
                debug!(identity = %identity, "Throttle permit granted");
                Ok(())
            }
            Err(_) => {
                let retry_after_secs = retry_after_secs(closes_in);
                warn!(identity = %identity, retry_after_secs, "Throttle limit exceeded");
                Err(ServiceError::RateLimitExceeded { retry_after_secs })
            }
        }
    }
}

/// Throttle backed by fixed-window counters in Redis
pub struct RedisThrottle {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisThrottle {
    /// Connect to Redis at `url`
    pub async fn connect(url: &str) -> ServiceResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            prefix: "throttle".to_string(),
        })
    }

    /// Override the key prefix (default `throttle`)
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

/// Counter key for the window containing `now_secs`, and seconds until that
/// window closes.
fn window_key(prefix: &str, identity: &str, window_secs: u64, now_secs: u64) -> (String, u64) {
    let index = now_secs / window_secs;
    let closes_in = (index + 1) * window_secs - now_secs;
    (format!("{prefix}:{identity}:{index}"), closes_in)
}

#[async_trait]
impl Throttle for RedisThrottle {
    async fn check(&self, identity: &str, limit: u32, window: Duration) -> ServiceResult<()> {
        validate(limit, window)?;
        let window_secs = window.as_secs().max(1);
        let now_secs = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
        let (key, closes_in) = window_key(&self.prefix, identity, window_secs, now_secs);

        let mut conn = self.conn.clone();
        let (count,): (u64,) = redis::pipe()
            .atomic()
            .cmd("INCR")
            .arg(&key)
            .cmd("EXPIRE")
            .arg(&key)
            .arg(window_secs)
            .ignore()
            .query_async(&mut conn)
            .await?;

        if count > u64::from(limit) {
            warn!(identity = %identity, count, limit, "Throttle limit exceeded");
            return Err(ServiceError::RateLimitExceeded {
                retry_after_secs: closes_in.max(1),
            });
        }

        debug!(identity = %identity, count, limit, "Throttle permit granted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use governor::clock::FakeRelativeClock;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_limit_plus_one_is_denied() {
        let throttle = InMemoryThrottle::new();
        let window = Duration::from_secs(60);

        for _ in 0..3 {
            throttle.check("10.0.0.1", 3, window).await.unwrap();
        }

        assert_matches!(
            throttle.check("10.0.0.1", 3, window).await,
            Err(ServiceError::RateLimitExceeded { retry_after_secs }) if retry_after_secs >= 1
        );
    }

    #[tokio::test]
    async fn test_identities_are_independent() {
        let throttle = InMemoryThrottle::new();
        let window = Duration::from_secs(60);

        assert_ok!(throttle.check("alice", 1, window).await);
        assert_err!(throttle.check("alice", 1, window).await);
        assert_ok!(throttle.check("bob", 1, window).await);
    }

    #[tokio::test]
    async fn test_invalid_policy() {
        let throttle = InMemoryThrottle::new();

        assert_matches!(
            throttle.check("x", 0, Duration::from_secs(1)).await,
            Err(ServiceError::Validation(_))
        );
        assert_matches!(
            throttle.check("x", 1, Duration::ZERO).await,
            Err(ServiceError::Validation(_))
        );
    }

    #[tokio::test]
    async fn test_calls_are_not_refunded_inside_window() {
        let clock = FakeRelativeClock::default();
        let throttle = InMemoryThrottle::with_clock(clock.clone());
        let window = Duration::from_secs(60);

        // Spaced at window / limit: a replenishing bucket would admit a fourth call
        assert_ok!(throttle.check("10.0.0.1", 3, window).await);
        clock.advance(Duration::from_secs(20));
        assert_ok!(throttle.check("10.0.0.1", 3, window).await);
        clock.advance(Duration::from_secs(20));
        assert_ok!(throttle.check("10.0.0.1", 3, window).await);
        clock.advance(Duration::from_secs(19));

        assert_matches!(
            throttle.check("10.0.0.1", 3, window).await,
            Err(ServiceError::RateLimitExceeded { retry_after_secs: 1 })
        );
    }

    #[tokio::test]
    async fn test_window_roll_resets_count() {
        let clock = FakeRelativeClock::default();
        let throttle = InMemoryThrottle::with_clock(clock.clone());
        let window = Duration::from_secs(2);

        assert_ok!(throttle.check("ip", 2, window).await);
        assert_ok!(throttle.check("ip", 2, window).await);

        clock.advance(Duration::from_millis(1100));
        assert_matches!(
            throttle.check("ip", 2, window).await,
            Err(ServiceError::RateLimitExceeded { retry_after_secs: 1 })
        );

        clock.advance(Duration::from_millis(900));
        assert_ok!(throttle.check("ip", 2, window).await);
        assert_ok!(throttle.check("ip", 2, window).await);
        assert_err!(throttle.check("ip", 2, window).await);
    }

    #[test]
    fn test_window_position() {
        assert_eq!(
            window_position(Duration::from_millis(1100), Duration::from_secs(2)),
            (0, Duration::from_millis(900))
        );
        assert_eq!(
            window_position(Duration::from_secs(4), Duration::from_secs(2)),
            (2, Duration::from_secs(2))
        );
    }

    #[test]
    fn test_window_key() {
        assert_eq!(
            window_key("throttle", "1.2.3.4", 60, 125),
            ("throttle:1.2.3.4:2".to_string(), 55)
        );
        assert_eq!(window_key("t", "a", 10, 20), ("t:a:2".to_string(), 10));
    }

    #[test]
    fn test_retry_after_rounds_up() {
        assert_eq!(retry_after_secs(Duration::from_millis(1500)), 2);
        assert_eq!(retry_after_secs(Duration::from_secs(3)), 3);
        assert_eq!(retry_after_secs(Duration::ZERO), 1);
    }
}
