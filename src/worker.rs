use std::sync::Arc;
use tokio::time::{Duration, interval};
use crate::metrics::{RATE_LIMIT_STORE_SIZE, SWEPT_ENTRIES, VIEWER_SESSIONS};
use crate::state::AppState;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub rate_limits: usize,
    pub viewers: usize,
    pub cache: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.rate_limits + self.viewers + self.cache
    }
}

// One pass over every in-memory store
pub fn sweep_once(state: &AppState) -> SweepReport {
    let report = SweepReport {
        rate_limits: state.rate_limiter.sweep_expired(),
        viewers: state.viewers.sweep_stale(),
        cache: state.viewer_counts.purge_expired(),
    };

    SWEPT_ENTRIES.inc_by(report.total() as f64);
    RATE_LIMIT_STORE_SIZE.set(state.rate_limiter.len() as f64);
    VIEWER_SESSIONS.set(state.viewers.session_count() as f64);
    report
}

// Background sweeper - runs every `sweep_interval`
pub async fn sweep_worker(state: Arc<AppState>, sweep_interval: Duration) {
    let mut interval = interval(sweep_interval);

    tracing::info!("Sweep worker started (interval: {:?})", sweep_interval);

    loop {
        interval.tick().await;

        let report = sweep_once(&state);
        if report.total() > 0 {
            tracing::debug!(
                rate_limits = report.rate_limits,
                viewers = report.viewers,
                cache = report.cache,
                "swept expired entries"
            );
        }
    }
}
