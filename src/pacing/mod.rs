//! Request pacing module
//!
//! This module keeps outbound traffic below a site's rate limits:
//! - Randomized inter-request waits with a power-law tail
//! - Minimum elapsed time between consecutive requests
//! - Bounded retry with backoff for transient failures

mod retry;
mod wait;

pub use retry::{BoxFuture, RetryExecutor};
pub use wait::{residual_wait, wait_cdf, wait_from_uniform, WaitScheduler};
