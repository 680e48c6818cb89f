use serde::{Deserialize, Serialize};

use crate::error::RateLimitError;
use crate::policy::{Policy, PolicyTable, RateLimitConfig, RateLimitKey};

// POST /api/rate-limit/check
// either `policy` or both `maxAttempts` and `windowMs`
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    pub key: String,
    #[serde(default)]
    pub policy: Option<String>,
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub window_ms: Option<u64>,
}

impl CheckRequest {
    pub fn resolve(
        &self,
        key: &RateLimitKey,
        table: &PolicyTable,
    ) -> Result<RateLimitConfig, RateLimitError> {
        let ad_hoc = self.max_attempts.is_some() || self.window_ms.is_some();

        match (&self.policy, self.max_attempts, self.window_ms) {
            (Some(_), _, _) if ad_hoc => Err(RateLimitError::InvalidConfig(
                "give either policy or maxAttempts/windowMs, not both".to_string(),
            )),
            (Some(name), _, _) => {
                let policy: Policy = name.parse()?;
                // a named policy only guards its own namespace
                if key.namespace() != policy.namespace() {
                    return Err(RateLimitError::InvalidKey(format!(
                        "policy {:?} does not apply to namespace {:?}",
                        policy.namespace(),
                        key.namespace()
                    )));
                }
                Ok(table.get(policy))
            }
            (None, Some(max_attempts), Some(window_ms)) => {
                RateLimitConfig::new(max_attempts, window_ms)
            }
            _ => Err(RateLimitError::InvalidConfig(
                "missing policy or maxAttempts/windowMs".to_string(),
            )),
        }
    }
}

// POST /api/rate-limit/reset
#[derive(Deserialize, Debug, Clone)]
pub struct ResetRequest {
    pub key: String,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PolicyView {
    pub policy: Policy,
    pub namespace: &'static str,
    #[serde(flatten)]
    pub config: RateLimitConfig,
}

// POST /api/streams/{stream_id}/heartbeat
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    pub viewer_id: String,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ViewerCount {
    pub stream_id: String,
    pub active_viewers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: String,
    pub rate_limit_store_size: usize,
    pub viewer_sessions: usize,
    pub cache_size: usize,
}
