use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tracing::{debug, trace};

use crate::report::AnalysisResult;

/// How long a cached result stays fresh.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(10 * 60);
/// Maximum number of cached domains before the oldest is dropped.
pub const DEFAULT_MAX_ENTRIES: usize = 10;
/// Minimum spacing between outbound submissions, independent of the freshness window.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);
/// Interval for the background sweep that evicts stale entries.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Time source injected into the cache and throttle.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(|e| e.into_inner());
        *elapsed += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let elapsed = *self.elapsed.lock().unwrap_or_else(|e| e.into_inner());
        self.origin + elapsed
    }
}

/// Bounds for the per-domain result cache and the submission throttle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    pub freshness_window: Duration,
    pub max_entries: usize,
    pub cooldown: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
            max_entries: DEFAULT_MAX_ENTRIES,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub domain: String,
    pub result: AnalysisResult,
    pub created_at: Instant,
}

/// Time-windowed, count-bounded store of results keyed by domain.
///
/// Entries are kept in insertion order so the front is always the oldest.
pub struct ResultCache {
    entries: VecDeque<CacheEntry>,
    freshness_window: Duration,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl ResultCache {
    pub fn new(policy: &CachePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: VecDeque::with_capacity(policy.max_entries + 1),
            freshness_window: policy.freshness_window,
            max_entries: policy.max_entries,
            clock,
        }
    }

    /// Return the fresh result for `domain`, if any.
    pub fn lookup(&mut self, domain: &str) -> Option<AnalysisResult> {
        self.evict_expired(self.clock.now());
        let hit = self
            .entries
            .iter()
            .find(|entry| entry.domain == domain)
            .map(|entry| entry.result.clone());
        if hit.is_some() {
            debug!(%domain, "cache hit");
        }
        hit
    }

    /// Record `result` for `domain` at the current time, replacing any previous entry.
    pub fn store(&mut self, domain: &str, result: AnalysisResult) {
        let now = self.clock.now();
        self.evict_expired(now);
        self.entries.retain(|entry| entry.domain != domain);
        self.entries.push_back(CacheEntry {
            domain: domain.to_string(),
            result,
            created_at: now,
        });
        while self.entries.len() > self.max_entries {
            if let Some(evicted) = self.entries.pop_front() {
                trace!(domain = %evicted.domain, "evicted oldest cache entry");
            }
        }
    }

    /// Drop every entry whose age has reached the freshness window. Returns the number removed.
    pub fn evict_expired(&mut self, now: Instant) -> usize {
        let window = self.freshness_window;
        let before = self.entries.len();
        self.entries
            .retain(|entry| now.saturating_duration_since(entry.created_at) < window);
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, "evicted expired cache entries");
        }
        removed
    }

    /// Evict using the injected clock; suited to a periodic timer.
    pub fn sweep(&mut self) -> usize {
        self.evict_expired(self.clock.now())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.domain.as_str())
    }
}

/// Adapts the injected [`Clock`] to the time source `governor` expects.
#[derive(Clone)]
struct ThrottleClock(Arc<dyn Clock>);

impl governor::clock::Clock for ThrottleClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        self.0.now()
    }
}

type CooldownLimiter =
    RateLimiter<NotKeyed, InMemoryState, ThrottleClock, NoOpMiddleware<Instant>>;

/// Global cool-down between submissions, regardless of domain.
///
/// A zero cool-down disables throttling.
pub struct SubmissionThrottle {
    limiter: Option<CooldownLimiter>,
    clock: ThrottleClock,
}

impl SubmissionThrottle {
    pub fn new(cooldown: Duration, clock: Arc<dyn Clock>) -> Self {
        let clock = ThrottleClock(clock);
        let limiter = Quota::with_period(cooldown)
            .map(|quota| RateLimiter::direct_with_clock(quota, clock.clone()));
        Self { limiter, clock }
    }

    /// Claim the submission slot. `Err(remaining)` while the previous claim is still cooling down.
    pub fn acquire(&self) -> Result<(), Duration> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };
        limiter.check().map_err(|not_until| {
            not_until.wait_time_from(governor::clock::Clock::now(&self.clock))
        })
    }
}
