//! Transaction coordinator configuration.

use serde::{Deserialize, Serialize};

/// Retry policy for transactions that hit transient store conflicts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionConfig {
    /// Maximum number of retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff between attempts in milliseconds. Backoff grows
    /// linearly with the attempt number.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    25
}
