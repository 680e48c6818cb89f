// Source of "now" in epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

// Wall clock
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        // pre-epoch clocks clamp to 0
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

// Test clock, only moves when told to
#[cfg(test)]
pub use manual::ManualClock;
