use crate::config::ArtistConfig;
use crate::pacing::WaitScheduler;
use crate::session::{ElementRef, PageSession, Query};
use crate::ScraperError;
use indexmap::IndexSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Weight of the newest sample in the latency estimate
const LATENCY_SMOOTHING: f64 = 0.5;

/// Where a carousel keeps its control and its items
#[derive(Debug, Clone)]
pub struct CarouselLayout {
    /// Control that reveals more items, searched inside the container
    pub reveal_control: Query,
    /// Elements carrying item links
    pub items: Query,
    /// Attribute holding an item's link
    pub link_attribute: String,
    /// Attribute whose presence marks the control as actionable
    pub actionable_attribute: String,
}

impl CarouselLayout {
    pub fn from_config(config: &ArtistConfig) -> Self {
        Self {
            reveal_control: config.reveal_control.clone(),
            items: config.work_items.clone(),
            link_attribute: "href".to_string(),
            actionable_attribute: config.actionable_attribute.clone(),
        }
    }
}

/// Why a collection stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// As many items as the page announced were collected
    TargetReached,
    /// The reveal control is gone or no longer actionable
    ControlExhausted,
    /// Too many consecutive attempts revealed nothing new
    Stalled,
}

/// Outcome of a collection
#[derive(Debug, Clone)]
pub struct CollectionReport {
    /// Distinct item links in the order they were first seen
    pub items: Vec<String>,
    /// Number of times the reveal control was invoked
    pub attempts: u32,
    pub stop: StopReason,
}

/// Drives a "reveal more" control until the item count converges
///
/// After each invocation the collector waits a paced delay, then re-reads the
/// item set. The delay floor grows with the observed latency of the page, so
/// a slow site is given more time to render. Termination is guaranteed: each
/// round either grows the set toward the target or counts as a stall, and
/// more than `stall_limit` consecutive stalls end the loop.
pub struct PaginationCollector {
    scheduler: Arc<WaitScheduler>,
    min_wait: f64,
    stall_limit: u32,
    latency_scale: f64,
}

impl PaginationCollector {
    pub fn new(
        scheduler: Arc<WaitScheduler>,
        min_wait: f64,
        stall_limit: u32,
        latency_scale: f64,
    ) -> Result<Self, ScraperError> {
        scheduler.compute_wait(min_wait, None)?;
        if !latency_scale.is_finite() || latency_scale < 0.0 {
            return Err(ScraperError::InvalidParameter(format!(
                "latency scale must be a non-negative number, got {}",
                latency_scale
            )));
        }

        Ok(Self {
            scheduler,
            min_wait,
            stall_limit,
            latency_scale,
        })
    }

    pub fn stall_limit(&self) -> u32 {
        self.stall_limit
    }

    pub(super) fn scheduler(&self) -> &WaitScheduler {
        &self.scheduler
    }

    pub(super) fn min_wait(&self) -> f64 {
        self.min_wait
    }

    /// Collects item links from the carousel inside `container`
    ///
    /// `target` is the announced total; `None` leaves stalls and the control
    /// state as the only ways to stop.
    pub async fn collect(
        &self,
        session: &mut dyn PageSession,
        container: &ElementRef,
        layout: &CarouselLayout,
        target: Option<usize>,
    ) -> Result<CollectionReport, ScraperError> {
        let mut items = IndexSet::new();
        let mut stalls = 0u32;
        let mut attempts = 0u32;

        let started = Instant::now();
        if let Err(e) = read_items(session, container, layout, &mut items).await {
            absorb(e)?;
            stalls += 1;
        }
        let mut latency = started.elapsed();

        let stop = loop {
            if target.is_some_and(|t| items.len() >= t) {
                break StopReason::TargetReached;
            }
            if stalls > self.stall_limit {
                break StopReason::Stalled;
            }

            let before = items.len();
            match self
                .reveal(session, container, layout, &mut items, &mut latency, &mut attempts)
                .await
            {
                Ok(true) => {}
                Ok(false) => break StopReason::ControlExhausted,
                Err(e) => absorb(e)?,
            }

            if items.len() > before {
                stalls = 0;
            } else {
                stalls += 1;
            }

            tracing::debug!(
                "Pagination attempt {}: {} items (target {:?}, stalls {})",
                attempts,
                items.len(),
                target,
                stalls
            );
        };

        tracing::info!(
            "Collected {} items in {} attempts ({:?})",
            items.len(),
            attempts,
            stop
        );

        Ok(CollectionReport {
            items: items.into_iter().collect(),
            attempts,
            stop,
        })
    }

    /// One round: invoke the control, wait, re-read the items
    ///
    /// Returns `false` when no actionable control is left.
    async fn reveal(
        &self,
        session: &mut dyn PageSession,
        container: &ElementRef,
        layout: &CarouselLayout,
        items: &mut IndexSet<String>,
        latency: &mut Duration,
        attempts: &mut u32,
    ) -> Result<bool, ScraperError> {
        let Some(control) = self.actionable_control(session, container, layout).await? else {
            return Ok(false);
        };

        let started = Instant::now();
        session.click(&control).await?;
        let clicked = started.elapsed();
        *attempts += 1;

        self.pause(*latency).await?;

        let started = Instant::now();
        read_items(session, container, layout, items).await?;
        *latency = smooth(*latency, clicked + started.elapsed());
        Ok(true)
    }

    async fn actionable_control(
        &self,
        session: &mut dyn PageSession,
        container: &ElementRef,
        layout: &CarouselLayout,
    ) -> Result<Option<ElementRef>, ScraperError> {
        let Some(control) = session.find(Some(container), &layout.reveal_control).await? else {
            return Ok(None);
        };
        let actionable = session
            .attribute(&control, &layout.actionable_attribute)
            .await?
            .is_some();
        Ok(actionable.then_some(control))
    }

    /// Waits at least `latency_scale` times the observed page latency
    async fn pause(&self, latency: Duration) -> Result<Duration, ScraperError> {
        let floor = self.min_wait.max(self.latency_scale * latency.as_secs_f64());
        self.scheduler.sleep(floor, None).await
    }
}

async fn read_items(
    session: &mut dyn PageSession,
    container: &ElementRef,
    layout: &CarouselLayout,
    items: &mut IndexSet<String>,
) -> Result<(), ScraperError> {
    for element in session.find_all(Some(container), &layout.items).await? {
        match session.attribute(&element, &layout.link_attribute).await {
            Ok(Some(link)) => {
                items.insert(link);
            }
            Ok(None) => {}
            // Re-rendered under us; the next read sees its replacement
            Err(e) if e.is_retryable() => {
                tracing::debug!("Skipping item {}: {}", element.id(), e);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// A retryable failure costs the round but not the collection
fn absorb(error: ScraperError) -> Result<(), ScraperError> {
    if !error.is_retryable() {
        return Err(error);
    }
    tracing::warn!("Pagination round failed, counting it as a stall: {}", error);
    Ok(())
}

fn smooth(previous: Duration, sample: Duration) -> Duration {
    previous.mul_f64(1.0 - LATENCY_SMOOTHING) + sample.mul_f64(LATENCY_SMOOTHING)
}
