use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;

// Live-stream presence. A viewer is watching while its last heartbeat is
// younger than `stale_after`.
pub struct ViewerRegistry {
    // stream_id -> viewer_id -> last heartbeat (epoch ms)
    streams: DashMap<String, DashMap<String, u64>>,
    stale_after: Duration,
    clock: Arc<dyn Clock>,
}

impl ViewerRegistry {
    pub fn new(stale_after: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            streams: DashMap::new(),
            stale_after,
            clock,
        }
    }

    fn is_live(&self, last_seen: u64, now: u64) -> bool {
        now.saturating_sub(last_seen) < self.stale_after.as_millis() as u64
    }

    // returns the stream's active viewer count
    pub fn heartbeat(&self, stream_id: &str, viewer_id: &str) -> usize {
        let now = self.clock.now_ms();
        let viewers = self.streams.entry(stream_id.to_string()).or_default();
        viewers.insert(viewer_id.to_string(), now);
        viewers
            .iter()
            .filter(|v| self.is_live(*v.value(), now))
            .count()
    }

    pub fn active_count(&self, stream_id: &str) -> usize {
        let now = self.clock.now_ms();
        self.streams
            .get(stream_id)
            .map(|viewers| {
                viewers
                    .iter()
                    .filter(|v| self.is_live(*v.value(), now))
                    .count()
            })
            .unwrap_or(0)
    }

    // stale viewers first, then streams left empty
    pub fn sweep_stale(&self) -> usize {
        let now = self.clock.now_ms();
        let mut removed = 0;

        self.streams.retain(|_, viewers| {
            viewers.retain(|_, last_seen| {
                let live = self.is_live(*last_seen, now);
                if !live {
                    removed += 1;
                }
                live
            });
            !viewers.is_empty()
        });
        removed
    }

    pub fn session_count(&self) -> usize {
        self.streams.iter().map(|s| s.value().len()).sum()
    }

    #[cfg(test)]
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }
}
