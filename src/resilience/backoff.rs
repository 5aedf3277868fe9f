//! Retry delays: exponential growth from `base_delay_ms`, capped at
//! `max_delay_ms`, plus up to 10% jitter.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

impl RetryConfig {
    /// Delay before the next attempt after `failures` failed attempts.
    ///
    /// No failures means no wait. The jitter may push the delay up to 10%
    /// past `max_delay_ms`.
    pub fn delay_for(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }

        let factor = 1u64 << (failures - 1).min(63);
        let ceiling = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        let jitter = rand::thread_rng().gen_range(0..=ceiling / 10);

        Duration::from_millis(ceiling.saturating_add(jitter))
    }
}
