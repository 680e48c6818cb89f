use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::RateLimitError;

const MAX_KEY_LEN: usize = 256;

const MINUTE_MS: u64 = 60 * 1000;
const HOUR_MS: u64 = 60 * MINUTE_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    max_attempts: u32,
    window_ms: u64,
}

impl RateLimitConfig {
    pub fn new(max_attempts: u32, window_ms: u64) -> Result<Self, RateLimitError> {
        if max_attempts == 0 {
            return Err(RateLimitError::InvalidConfig(
                "max_attempts must be positive".to_string(),
            ));
        }
        if window_ms == 0 {
            return Err(RateLimitError::InvalidConfig(
                "window_ms must be positive".to_string(),
            ));
        }
        Ok(Self {
            max_attempts,
            window_ms,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }
}

// `<namespace>:<identifier>`, e.g. `login:a@x.com` or `admin:42`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey(String);

impl RateLimitKey {
    pub fn new(namespace: &str, identifier: &str) -> Result<Self, RateLimitError> {
        let namespace = namespace.trim();
        let identifier = identifier.trim();

        if namespace.is_empty() {
            return Err(RateLimitError::InvalidKey("namespace is empty".to_string()));
        }
        if namespace.contains(':') || namespace.contains(char::is_whitespace) {
            return Err(RateLimitError::InvalidKey(format!(
                "namespace {:?} must not contain ':' or whitespace",
                namespace
            )));
        }
        if identifier.is_empty() {
            return Err(RateLimitError::InvalidKey("identifier is empty".to_string()));
        }

        let key = format!("{}:{}", namespace, identifier);
        if key.len() > MAX_KEY_LEN {
            return Err(RateLimitError::InvalidKey(format!(
                "key longer than {} bytes",
                MAX_KEY_LEN
            )));
        }
        Ok(Self(key))
    }

    // split on the first ':' so IPv6 identifiers survive
    pub fn parse(raw: &str) -> Result<Self, RateLimitError> {
        match raw.split_once(':') {
            Some((namespace, identifier)) => Self::new(namespace, identifier),
            None => Err(RateLimitError::InvalidKey(format!(
                "{:?} is not of the form <namespace>:<identifier>",
                raw
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn namespace(&self) -> &str {
        self.0.split_once(':').map(|(ns, _)| ns).unwrap_or(&self.0)
    }
}

impl fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    Login,
    Register,
    ResendVerification,
    PrayerRequest,
    Salvation,
    Admin,
    Heartbeat,
}

impl Policy {
    pub const ALL: [Policy; 7] = [
        Policy::Login,
        Policy::Register,
        Policy::ResendVerification,
        Policy::PrayerRequest,
        Policy::Salvation,
        Policy::Admin,
        Policy::Heartbeat,
    ];

    pub fn namespace(self) -> &'static str {
        match self {
            Policy::Login => "login",
            Policy::Register => "register",
            Policy::ResendVerification => "resend-verification",
            Policy::PrayerRequest => "prayer-request",
            Policy::Salvation => "salvation",
            Policy::Admin => "admin",
            Policy::Heartbeat => "heartbeat",
        }
    }

    fn default_limits(self) -> (u32, u64) {
        match self {
            Policy::Login => (10, 15 * MINUTE_MS),
            Policy::Register => (5, HOUR_MS),
            Policy::ResendVerification => (3, HOUR_MS),
            Policy::PrayerRequest => (5, HOUR_MS),
            Policy::Salvation => (3, HOUR_MS),
            Policy::Admin => (30, MINUTE_MS),
            Policy::Heartbeat => (12, MINUTE_MS),
        }
    }

    pub fn default_config(self) -> RateLimitConfig {
        let (max_attempts, window_ms) = self.default_limits();
        RateLimitConfig {
            max_attempts,
            window_ms,
        }
    }

    pub fn key(self, identifier: &str) -> Result<RateLimitKey, RateLimitError> {
        RateLimitKey::new(self.namespace(), identifier)
    }
}

impl FromStr for Policy {
    type Err = RateLimitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Policy::ALL
            .into_iter()
            .find(|p| p.namespace() == s)
            .ok_or_else(|| RateLimitError::InvalidConfig(format!("unknown policy {:?}", s)))
    }
}

#[derive(Debug, Clone)]
pub struct PolicyTable {
    configs: BTreeMap<Policy, RateLimitConfig>,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self {
            configs: Policy::ALL
                .into_iter()
                .map(|p| (p, p.default_config()))
                .collect(),
        }
    }
}

impl PolicyTable {
    pub fn get(&self, policy: Policy) -> RateLimitConfig {
        self.configs
            .get(&policy)
            .copied()
            .unwrap_or_else(|| policy.default_config())
    }

    pub fn set(&mut self, policy: Policy, config: RateLimitConfig) {
        self.configs.insert(policy, config);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Policy, RateLimitConfig)> + '_ {
        self.configs.iter().map(|(p, c)| (*p, *c))
    }
}
