use std::sync::Arc;
use std::time::Duration;
use crate::cache::TtlCache;
use crate::clock::Clock;
use crate::policy::PolicyTable;
use crate::rate_limit::RateLimiter;
use crate::viewers::ViewerRegistry;
// app's shared state

pub struct AppState {
    pub rate_limiter: RateLimiter,
    pub policies: PolicyTable,
    pub viewers: ViewerRegistry,
    pub viewer_counts: TtlCache<usize>, // stream_id -> active viewers
}

impl AppState {
    pub fn new(
        clock: Arc<dyn Clock>,
        policies: PolicyTable,
        cache_ttl: Duration,
        viewer_stale_after: Duration,
    ) -> Self {
        Self {
            rate_limiter: RateLimiter::new(clock.clone()),
            policies,
            viewers: ViewerRegistry::new(viewer_stale_after, clock.clone()),
            viewer_counts: TtlCache::new(cache_ttl, clock),
        }
    }
}
