use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::RateLimitExceeded;
use crate::policy::{RateLimitConfig, RateLimitKey};

pub const EXCEEDED_MESSAGE: &str = "Too many attempts. Please try again later.";

// Rate limit entry - one per key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_time: u64, // epoch ms when the window ends
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub reset_time: u64,
    pub remaining: u32,
}

impl RateLimitOutcome {
    // denial -> RateLimitExceeded, Retry-After measured from now_ms
    pub fn into_result(self, now_ms: u64) -> Result<RateLimitOutcome, RateLimitExceeded> {
        if self.success {
            return Ok(self);
        }
        Err(RateLimitExceeded {
            message: self.error.unwrap_or_else(|| EXCEEDED_MESSAGE.to_string()),
            retry_after_secs: retry_after_secs(self.reset_time, now_ms),
            reset_time: self.reset_time,
        })
    }
}

// ceil((reset_time - now) / 1000), never below one second
pub fn retry_after_secs(reset_time: u64, now_ms: u64) -> u64 {
    reset_time.saturating_sub(now_ms).div_ceil(1000).max(1)
}

// short SHA-256 prefix of a key, safe to put in logs
pub fn key_fingerprint(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key);
    let digest = format!("{:x}", hasher.finalize());
    digest[..12].to_string()
}

// Fixed-window limiter. Check and increment run under the key's shard lock,
// so at most max_attempts calls succeed per window.
pub struct RateLimiter {
    entries: DashMap<String, RateLimitEntry>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    pub fn check(&self, key: &RateLimitKey, config: RateLimitConfig) -> RateLimitOutcome {
        let now = self.clock.now_ms();
        let fresh = RateLimitEntry {
            count: 1,
            reset_time: now.saturating_add(config.window_ms()),
        };

        match self.entries.entry(key.as_str().to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(fresh);
                allowed(fresh, config)
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();

                // window expired..? start a new one
                if now >= entry.reset_time {
                    *entry = fresh;
                    return allowed(fresh, config);
                }

                // under limit..? count it
                if entry.count < config.max_attempts() {
                    entry.count += 1;
                    return allowed(*entry, config);
                }

                tracing::warn!(
                    key = %key_fingerprint(key.as_str()),
                    count = entry.count,
                    reset_time = entry.reset_time,
                    "rate limit exceeded"
                );
                RateLimitOutcome {
                    success: false,
                    error: Some(EXCEEDED_MESSAGE.to_string()),
                    reset_time: entry.reset_time,
                    remaining: 0,
                }
            }
        }
    }

    pub fn enforce(
        &self,
        key: &RateLimitKey,
        config: RateLimitConfig,
    ) -> Result<RateLimitOutcome, RateLimitExceeded> {
        let outcome = self.check(key, config);
        outcome.into_result(self.clock.now_ms())
    }

    pub fn reset(&self, key: &RateLimitKey) {
        if self.entries.remove(key.as_str()).is_some() {
            tracing::debug!(key = %key_fingerprint(key.as_str()), "rate limit reset");
        }
    }

    // drops every entry whose window has ended
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let live = entry.reset_time > now;
            if !live {
                removed += 1;
            }
            live
        });
        removed
    }

    #[cfg(test)]
    pub fn get(&self, key: &RateLimitKey) -> Option<RateLimitEntry> {
        self.entries.get(key.as_str()).map(|e| *e)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn allowed(entry: RateLimitEntry, config: RateLimitConfig) -> RateLimitOutcome {
    RateLimitOutcome {
        success: true,
        error: None,
        reset_time: entry.reset_time,
        remaining: config.max_attempts().saturating_sub(entry.count),
    }
}
