//! Bounded retry with randomized backoff

use crate::pacing::WaitScheduler;
use crate::ScraperError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future borrowing from the state it was handed
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Retries a fallible async operation a bounded number of times
///
/// Every retryable failure is logged with its attempt number and followed by a
/// wait drawn from the [`WaitScheduler`]. Errors that
/// [`ScraperError::is_retryable`] rejects are returned at once. After the last
/// attempt the executor hands back [`ScraperError::RetriesExhausted`]; whether
/// that is fatal is up to the caller.
#[derive(Clone)]
pub struct RetryExecutor {
    scheduler: Arc<WaitScheduler>,
    max_retries: u32,
    min_wait: f64,
}

impl RetryExecutor {
    /// Creates an executor making at most `max_retries` attempts
    ///
    /// # Errors
    ///
    /// `InvalidParameter` when `max_retries` is zero or `min_wait` is not a
    /// positive number.
    pub fn new(
        scheduler: Arc<WaitScheduler>,
        max_retries: u32,
        min_wait: f64,
    ) -> Result<Self, ScraperError> {
        if max_retries == 0 {
            return Err(ScraperError::InvalidParameter(
                "max_retries must be at least 1".to_string(),
            ));
        }
        // Fail now rather than on the first backoff
        scheduler.compute_wait(min_wait, None)?;

        Ok(Self {
            scheduler,
            max_retries,
            min_wait,
        })
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Runs `operation` until it succeeds or the attempts run out
    ///
    /// `label` names the operation in log lines.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, ScraperError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ScraperError>>,
    {
        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            match operation().await {
                Ok(value) => return Ok(self.succeeded(label, attempt, value)),
                Err(e) => last_error = self.absorb(label, attempt, e).await?,
            }
        }

        Err(self.exhausted(last_error))
    }

    /// Like [`RetryExecutor::run`], but lends `state` mutably to every attempt
    ///
    /// Browser steps need exclusive access to the page session while they
    /// run, which a plain closure cannot hand out across attempts.
    pub async fn run_with<S, T, F>(
        &self,
        label: &str,
        state: &mut S,
        mut operation: F,
    ) -> Result<T, ScraperError>
    where
        S: ?Sized,
        F: for<'a> FnMut(&'a mut S) -> BoxFuture<'a, Result<T, ScraperError>>,
    {
        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            match operation(state).await {
                Ok(value) => return Ok(self.succeeded(label, attempt, value)),
                Err(e) => last_error = self.absorb(label, attempt, e).await?,
            }
        }

        Err(self.exhausted(last_error))
    }

    fn succeeded<T>(&self, label: &str, attempt: u32, value: T) -> T {
        if attempt > 1 {
            tracing::debug!("{} succeeded at attempt {}", label, attempt);
        }
        value
    }

    /// Logs a failed attempt and backs off; non-retryable errors pass through
    async fn absorb(&self, label: &str, attempt: u32, error: ScraperError) -> Result<String, ScraperError> {
        if !error.is_retryable() {
            return Err(error);
        }

        tracing::warn!(
            "{} failed at attempt {}/{}: {:?}",
            label,
            attempt,
            self.max_retries,
            error
        );

        if attempt < self.max_retries {
            self.scheduler.sleep(self.min_wait, None).await?;
        }
        Ok(error.to_string())
    }

    fn exhausted(&self, last_error: String) -> ScraperError {
        ScraperError::RetriesExhausted {
            attempts: self.max_retries,
            last_error,
        }
    }
}
