//! Retry logic.
//!
//! # Responsibilities
//! - Determine if a failed RPC call is retryable (transport errors only)
//! - Execute retries with exponential backoff + jitter
//!
//! # Design Decisions
//! - Callers only wrap idempotent calls; transaction submission is never retried
//! - Chain-level rejections (reverts, unsupported node) fail immediately

use std::future::Future;

use crate::chain::types::ChainResult;
use crate::config::RetryConfig;

/// Run `operation` until it succeeds, fails permanently, or attempts run out.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryConfig,
    method: &str,
    mut operation: F,
) -> ChainResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ChainResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    method = method,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying RPC call"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
