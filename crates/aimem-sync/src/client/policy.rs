//! Automatic reconnect policy

use aimem_common::ReconnectConfig;
use rand::Rng;
use std::time::Duration;

/// Bounded exponential backoff with jitter
///
/// Disabled by default: a failed connection stays `Errored` until the
/// caller reconnects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from(&ReconnectConfig::default())
    }
}

impl From<&ReconnectConfig> for ReconnectPolicy {
    fn from(config: &ReconnectConfig) -> Self {
        Self {
            enabled: config.enabled,
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl ReconnectPolicy {
    /// Policy that never retries
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Upper bound of the delay before attempt `attempt` (1-based)
    ///
    /// `None` once retries are exhausted or disabled.
    #[must_use]
    pub fn ceiling(&self, attempt: u32) -> Option<Duration> {
        if !self.enabled || attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let factor = 2u32.saturating_pow(attempt - 1);
        Some(self.base_delay.saturating_mul(factor).min(self.max_delay))
    }

    /// Delay before attempt `attempt`, jittered into `[ceiling/2, ceiling]`
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        let ceiling = self.ceiling(attempt)?;
        let half = ceiling / 2;
        let jitter_ms = rand::thread_rng().gen_range(0..=half.as_millis() as u64);
        Some(half + Duration::from_millis(jitter_ms))
    }
}
