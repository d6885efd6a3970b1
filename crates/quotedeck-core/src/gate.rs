//! Serialized, paced dispatch queue for every upstream call.
//!
//! One gate per process: all callers enqueue through it, and requests reach
//! the network strictly in submission order with a minimum spacing between
//! dispatches. The spacing keeps a shared free-tier key under its per-minute
//! ceiling; a governor quota acts as a hard backstop should the spacing ever
//! be tuned too aggressively.

use std::future::Future;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

use crate::error::FetchError;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Gate tuning. The defaults target ~54 dispatches/minute against an
/// upstream ceiling of 60, leaving headroom for network jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateConfig {
    /// Minimum pause between the completion of one request and the dispatch
    /// of the next.
    pub min_spacing: Duration,
    /// Quota window for the hard ceiling.
    pub quota_window: Duration,
    /// Maximum dispatches per quota window.
    pub quota_limit: u32,
    /// Upper bound on a single operation; a hung upstream call otherwise
    /// stalls the whole queue.
    pub request_timeout: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_spacing: Duration::from_millis(1100),
            quota_window: Duration::from_secs(60),
            quota_limit: 55,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// FIFO request gate. `Clone` handles share the same queue.
///
/// Ordering relies on the fairness of `tokio::sync::Mutex`: waiters acquire
/// the slot in the order they started waiting, so dispatch order equals
/// submission order with no parallel dispatch.
#[derive(Clone)]
pub struct RequestGate {
    slot: Arc<tokio::sync::Mutex<()>>,
    limiter: Arc<DirectRateLimiter>,
    waiting: Arc<AtomicUsize>,
    config: GateConfig,
}

impl Default for RequestGate {
    fn default() -> Self {
        Self::new(GateConfig::default())
    }
}

impl RequestGate {
    pub fn new(config: GateConfig) -> Self {
        let quota = quota_from_window(config.quota_window, config.quota_limit);
        Self {
            slot: Arc::new(tokio::sync::Mutex::new(())),
            limiter: Arc::new(RateLimiter::direct(quota)),
            waiting: Arc::new(AtomicUsize::new(0)),
            config,
        }
    }

    pub const fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Operations queued but not yet dispatched.
    pub fn pending_len(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// Runs `op` once the queue reaches it: waits for every earlier
    /// operation to complete, sleeps the configured spacing, then dispatches.
    ///
    /// A failing operation (rate limit included) only fails its own caller;
    /// the queue moves on to the next entry regardless.
    pub async fn enqueue<T, F, Fut>(&self, label: &str, op: F) -> Result<T, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        self.waiting.fetch_add(1, Ordering::SeqCst);
        let _slot = self.slot.lock().await;
        self.waiting.fetch_sub(1, Ordering::SeqCst);

        tokio::time::sleep(self.config.min_spacing).await;
        self.limiter.until_ready().await;

        tracing::trace!(label, queued = self.pending_len(), "dispatching upstream call");

        match tokio::time::timeout(self.config.request_timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::network(format!(
                "operation '{label}' exceeded the {}ms gate timeout",
                self.config.request_timeout.as_millis()
            ))),
        }
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let safe_limit = quota_limit.max(1);
    let burst = NonZeroU32::new(safe_limit).expect("safe limit must be non-zero");

    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(safe_limit)).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .expect("period is always greater than zero")
        .allow_burst(burst)
}
