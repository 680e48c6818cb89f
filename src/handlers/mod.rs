mod health;
mod metrics;
mod limits;
mod streams;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use limits::{check_handler, policies_handler, reset_handler};
pub use streams::{heartbeat_handler, viewers_handler};
