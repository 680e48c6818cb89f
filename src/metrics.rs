use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, register_counter, register_gauge};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("church_requests_total", "Total number of requests").unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter =
        register_counter!("church_rate_limited_total", "Requests denied by the rate limiter").unwrap();
    pub static ref RATE_LIMIT_STORE_SIZE: Gauge =
        register_gauge!("church_rate_limit_store_size", "Current number of rate limit entries").unwrap();
    pub static ref SWEPT_ENTRIES: Counter =
        register_counter!("church_swept_entries_total", "Expired entries removed by the sweeper").unwrap();
    pub static ref CACHE_HITS: Counter =
        register_counter!("church_cache_hits_total", "Total cache hits").unwrap();
    pub static ref CACHE_MISSES: Counter =
        register_counter!("church_cache_misses_total", "Total cache misses").unwrap();
    pub static ref VIEWER_SESSIONS: Gauge =
        register_gauge!("church_viewer_sessions", "Tracked live-stream viewer sessions").unwrap();
}
