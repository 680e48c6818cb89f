use clap::Parser;
use std::time::Duration;

use crate::policy::{Policy, PolicyTable, RateLimitConfig};

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "church-gateway")]
#[command(about = "Rate limiting and live-stream presence service for the church app")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Cache TTL in seconds
    #[arg(short, long, default_value_t = 5)]
    pub cache_ttl: u64,

    // How often expired entries are swept, in seconds
    #[arg(long, default_value_t = 60)]
    pub sweep_interval: u64,

    // Seconds without a heartbeat before a viewer is stale
    #[arg(long, default_value_t = 45)]
    pub viewer_stale_after: u64,

    // Policy override, repeatable
    // Example: --policy login=20/600 (20 attempts per 600 seconds)
    #[arg(long = "policy", value_parser = parse_policy_override)]
    pub policies: Vec<PolicyOverride>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyOverride {
    pub policy: Policy,
    pub config: RateLimitConfig,
}

fn parse_policy_override(raw: &str) -> Result<PolicyOverride, String> {
    let (name, limits) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <policy>=<max>/<window_secs>, got {:?}", raw))?;
    let (max, window) = limits
        .split_once('/')
        .ok_or_else(|| format!("expected <max>/<window_secs>, got {:?}", limits))?;

    let policy: Policy = name.trim().parse().map_err(|e| format!("{}", e))?;
    let max_attempts: u32 = max
        .trim()
        .parse()
        .map_err(|e| format!("bad max attempts {:?}: {}", max, e))?;
    let window_secs: u64 = window
        .trim()
        .parse()
        .map_err(|e| format!("bad window {:?}: {}", window, e))?;

    let config = RateLimitConfig::new(max_attempts, window_secs.saturating_mul(1000))
        .map_err(|e| e.to_string())?;
    Ok(PolicyOverride { policy, config })
}

impl Args {
    pub fn policy_table(&self) -> PolicyTable {
        let mut table = PolicyTable::default();
        for o in &self.policies {
            table.set(o.policy, o.config);
        }
        table
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn sweep_interval(&self) -> Duration {
        // tokio interval panics on zero
        Duration::from_secs(self.sweep_interval.max(1))
    }

    pub fn viewer_stale_after(&self) -> Duration {
        Duration::from_secs(self.viewer_stale_after)
    }
}
