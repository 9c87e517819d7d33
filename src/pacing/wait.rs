//! Randomized request pacing
//!
//! Waits are drawn from a truncated power law with density proportional to
//! `t^-1.5` on `[min_wait, max_wait]`: most waits land close to the floor, with
//! an occasional long pause that makes the request rhythm look less mechanical.

use crate::ScraperError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Exponent of the wait-time density
const ALPHA: f64 = 1.5;

/// Default upper bound is this multiple of the lower bound
const DEFAULT_MAX_FACTOR: f64 = 3.0;

/// Draws a wait time for the uniform sample `u` in `[0, 1)` by inverting the CDF
///
/// With `beta = alpha - 1`, `b = min_wait` and `c = max_wait`, the CDF is
/// `F(x) = a / beta * (b^-beta - x^-beta)` where
/// `a = -beta / (c^-beta - b^-beta)` normalises it to 1 at `c`.
///
/// # Errors
///
/// `InvalidParameter` when `min_wait <= 0`, `max_wait < min_wait`, or either
/// bound is not finite.
pub fn wait_from_uniform(u: f64, min_wait: f64, max_wait: Option<f64>) -> Result<f64, ScraperError> {
    let (b, c) = checked_bounds(min_wait, max_wait)?;
    if b == c {
        return Ok(b);
    }

    let beta = ALPHA - 1.0;
    let a = -beta / (c.powf(-beta) - b.powf(-beta));
    let x = (b.powf(-beta) - beta * u / a).powf(-1.0 / beta);

    // Guard against rounding pushing the sample a hair outside the support
    Ok(x.clamp(b, c))
}

/// Cumulative distribution of the wait time at `x`
pub fn wait_cdf(x: f64, min_wait: f64, max_wait: Option<f64>) -> Result<f64, ScraperError> {
    let (b, c) = checked_bounds(min_wait, max_wait)?;
    if x <= b {
        return Ok(0.0);
    }
    if x >= c {
        return Ok(1.0);
    }

    let beta = ALPHA - 1.0;
    let a = -beta / (c.powf(-beta) - b.powf(-beta));
    Ok(a / beta * (b.powf(-beta) - x.powf(-beta)))
}

fn checked_bounds(min_wait: f64, max_wait: Option<f64>) -> Result<(f64, f64), ScraperError> {
    if !min_wait.is_finite() || min_wait <= 0.0 {
        return Err(ScraperError::InvalidParameter(format!(
            "min_wait must be a positive number of seconds, got {}",
            min_wait
        )));
    }

    let max_wait = max_wait.unwrap_or(DEFAULT_MAX_FACTOR * min_wait);
    if !max_wait.is_finite() || max_wait < min_wait {
        return Err(ScraperError::InvalidParameter(format!(
            "max_wait must be >= min_wait ({}), got {}",
            min_wait, max_wait
        )));
    }

    Ok((min_wait, max_wait))
}

/// Residual time still owed before the next request
///
/// Returns `None` when at least `wait` has already elapsed.
pub fn residual_wait(elapsed: Duration, wait: Duration) -> Option<Duration> {
    wait.checked_sub(elapsed).filter(|d| !d.is_zero())
}

/// Computes randomized waits and enforces gaps between requests
pub struct WaitScheduler {
    rng: Mutex<StdRng>,
}

impl WaitScheduler {
    /// Creates a scheduler seeded from system entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates a scheduler with a fixed seed, for reproducible sequences
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Draws a wait time in seconds from `[min_wait, max_wait]`
    ///
    /// `max_wait` defaults to three times `min_wait`.
    pub fn compute_wait(&self, min_wait: f64, max_wait: Option<f64>) -> Result<f64, ScraperError> {
        let u = self.uniform();
        wait_from_uniform(u, min_wait, max_wait)
    }

    /// Sleeps for a freshly drawn wait time
    pub async fn sleep(&self, min_wait: f64, max_wait: Option<f64>) -> Result<Duration, ScraperError> {
        let wait = Duration::from_secs_f64(self.compute_wait(min_wait, max_wait)?);
        tracing::trace!("Sleeping {:?}", wait);
        tokio::time::sleep(wait).await;
        Ok(wait)
    }

    /// Sleeps only for whatever part of a fresh wait has not yet elapsed
    /// since `last_request`
    ///
    /// Returns the time actually slept; zero when the gap was already
    /// satisfied or there was no previous request.
    pub async fn enforce_gap(
        &self,
        last_request: Option<Instant>,
        min_wait: f64,
        max_wait: Option<f64>,
    ) -> Result<Duration, ScraperError> {
        let wait = Duration::from_secs_f64(self.compute_wait(min_wait, max_wait)?);

        let Some(last) = last_request else {
            return Ok(Duration::ZERO);
        };

        match residual_wait(last.elapsed(), wait) {
            Some(remaining) => {
                tracing::trace!("Enforcing request gap, sleeping {:?}", remaining);
                tokio::time::sleep(remaining).await;
                Ok(remaining)
            }
            None => Ok(Duration::ZERO),
        }
    }

    fn uniform(&self) -> f64 {
        // A poisoned lock only means another caller panicked mid-draw; the
        // generator state is still usable.
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        rng.gen::<f64>()
    }
}

impl Default for WaitScheduler {
    fn default() -> Self {
        Self::new()
    }
}
