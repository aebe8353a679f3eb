use std::{
    sync::{Mutex, MutexGuard},
    time::Duration,
};
use tokio::time::Instant;
use tracing::debug;

use crate::{config::RateLimitSettings, utils::whole_tokens_for_elapsed};

/// Admission capability consulted before any routing happens
pub trait Admission: Send + Sync {
    /// Take one token if available. Never blocks.
    fn try_admit(&self) -> bool;
}

/// Process-wide token bucket.
///
/// The bucket starts full and earns one token every `refill_interval`, up to
/// `capacity`. Refill is counted in whole tokens: `last_refill` only advances
/// by whole intervals, so time that has not yet produced a token is kept for
/// the next check no matter how often the bucket is polled.
pub struct TokenBucket {
    capacity: u32,
    refill_interval: Duration,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: u32,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a full bucket holding at most `capacity` tokens.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or `refill_interval` is zero.
    pub fn new(capacity: u32, refill_interval: Duration) -> Self {
        Self::new_at(capacity, refill_interval, Instant::now())
    }

    /// Same as [`TokenBucket::new`] with an explicit creation instant
    pub fn new_at(capacity: u32, refill_interval: Duration, now: Instant) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        assert!(!refill_interval.is_zero(), "refill_interval must be greater than 0");

        Self {
            capacity,
            refill_interval,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: now,
            }),
        }
    }

    /// Build a bucket from validated settings
    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self::new(settings.capacity, settings.refill_interval())
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn refill_interval(&self) -> Duration {
        self.refill_interval
    }

    /// Refill for the time elapsed up to `now`, then take one token if there
    /// is one. The refill and the take happen under a single lock.
    pub fn try_admit_at(&self, now: Instant) -> bool {
        let mut state = self.lock_state();
        self.refill(&mut state, now);

        if state.tokens > 0 {
            state.tokens -= 1;
            debug!(remaining = state.tokens, "request admitted");
            true
        } else {
            debug!("request rejected");
            false
        }
    }

    /// Tokens currently available at `now`, refill applied, none consumed
    pub fn available_tokens_at(&self, now: Instant) -> u32 {
        let mut state = self.lock_state();
        self.refill(&mut state, now);
        state.tokens
    }

    pub fn available_tokens(&self) -> u32 {
        self.available_tokens_at(Instant::now())
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        // Callers racing with stale instants must not move the clock back
        if now <= state.last_refill {
            return;
        }
        if state.tokens >= self.capacity {
            // A full bucket does not bank idle time
            state.last_refill = now;
            return;
        }

        let elapsed = now.duration_since(state.last_refill);
        let earned = whole_tokens_for_elapsed(elapsed, self.refill_interval);
        if earned == 0 {
            return;
        }

        let missing = self.capacity - state.tokens;
        if earned >= u128::from(missing) {
            state.tokens = self.capacity;
            state.last_refill = now;
        } else {
            // earned < missing <= u32::MAX
            let earned = earned as u32;
            state.tokens += earned;
            state.last_refill += self.refill_interval * earned;
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, BucketState> {
        // Every update leaves the state consistent, so a poisoned lock is safe to reuse
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Admission for TokenBucket {
    fn try_admit(&self) -> bool {
        self.try_admit_at(Instant::now())
    }
}
