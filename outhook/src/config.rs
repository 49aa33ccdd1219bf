//! Configuration for webhook dispatch.
//!
//! Deserializable with per-field defaults so partial configuration files
//! work; the `Default` impl carries the documented production defaults.

use serde::{Deserialize, Serialize};

/// Webhook dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// HTTP timeout for a single delivery attempt in seconds (default: 30)
    pub timeout_secs: u64,
    /// Fixed delays applied between attempts, in seconds. Attempt 1 is
    /// immediate; attempt N+1 follows `retry_delays_secs[N-1]`. The maximum
    /// number of attempts is the length of this list plus one.
    ///
    /// Default: [1, 5, 30]
    pub retry_delays_secs: Vec<u64>,
    /// Maximum concurrent outbound deliveries across all registrations
    /// (default: 16)
    pub max_concurrent_sends: usize,
    /// Replay tolerance window for signature verification in seconds
    /// (default: 300)
    pub tolerance_secs: i64,
    /// Client identifier sent as the `user-agent` header on deliveries
    pub user_agent: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            retry_delays_secs: vec![1, 5, 30],
            max_concurrent_sends: 16,
            tolerance_secs: 300,
            user_agent: concat!("outhook/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
