//! Token bucket for write calls
//!
//! Bucket level and last refill time share one `AtomicU64` so a check is a
//! single compare-exchange loop with no lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub(crate) struct RateLimiter {
    // Upper 32 bits: tokens left. Lower 32 bits: ms since `epoch` at last refill.
    packed: AtomicU64,
    epoch: Instant,
    burst: u32,
    per_second: u32,
}

fn pack(tokens: u32, at_ms: u32) -> u64 {
    ((tokens as u64) << 32) | at_ms as u64
}

fn unpack(packed: u64) -> (u32, u32) {
    ((packed >> 32) as u32, (packed & 0xFFFF_FFFF) as u32)
}

impl RateLimiter {
    /// `burst` calls at once, refilled at `per_second`
    pub(crate) fn new(burst: u32, per_second: u32) -> Self {
        Self {
            packed: AtomicU64::new(pack(burst, 0)),
            epoch: Instant::now(),
            burst,
            per_second,
        }
    }

    /// Take one token; false means the caller is throttled
    pub(crate) fn try_acquire(&self) -> bool {
        loop {
            let packed = self.packed.load(Ordering::Acquire);
            let (tokens, last_ms) = unpack(packed);

            let now_ms = self.epoch.elapsed().as_millis() as u32;
            let refill = (now_ms.saturating_sub(last_ms) as u64 * self.per_second as u64) / 1000;
            let available = (tokens as u64 + refill).min(self.burst as u64) as u32;

            if available == 0 {
                return false;
            }

            if self
                .packed
                .compare_exchange(
                    packed,
                    pack(available - 1, now_ms),
                    Ordering::Release,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                return true;
            }
        }
    }
}
