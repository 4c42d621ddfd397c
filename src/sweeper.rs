//! Periodic price sweeper.
//!
//! Once at startup and then on a fixed interval, the sweeper collects every
//! due checkpoint in the system, and for each active item with price
//! tracking enabled asks the [`PriceAnalyzer`] for a fresh price. A changed
//! price is appended to the item's history and becomes its current price.
//!
//! Failures are isolated per item: one item failing to refresh is logged and
//! counted, and the sweep carries on with the next item.
//!
//! The running loop is owned by a [`SweeperHandle`]. Stopping it cancels the
//! timer; a sweep that is already running is allowed to finish.

use crate::{
    analysis::PriceAnalyzer,
    errors::{Error, Result},
    store::{ItemChanges, ItemStore, ReviewStore},
};
use chrono::{DateTime, Utc};
use std::{collections::BTreeSet, sync::Arc, time::Duration};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

/// Prices closer than this are treated as unchanged
pub const PRICE_EPSILON: f64 = 0.005;

/// Shortest interval the loop accepts
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Counters describing one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Due checkpoints found
    pub due_reviews: usize,
    /// Items whose price was analyzed
    pub items_checked: usize,
    /// Items whose price changed and was recorded
    pub prices_updated: usize,
    /// Items passed over (missing, archived or not tracked)
    pub skipped: usize,
    /// Items whose refresh failed
    pub failures: usize,
}

enum RefreshOutcome {
    Updated,
    Unchanged,
    Skipped,
}

/// Background job that refreshes prices of items with due reviews.
pub struct PriceSweeper<S, A> {
    store: Arc<S>,
    analyzer: Arc<A>,
    interval: Duration,
}

impl<S, A> PriceSweeper<S, A>
where
    S: ItemStore + ReviewStore + 'static,
    A: PriceAnalyzer + 'static,
{
    /// Creates a sweeper that runs every `interval` once started.
    ///
    /// Intervals shorter than one second are raised to one second.
    pub fn new(store: Arc<S>, analyzer: Arc<A>, interval: Duration) -> Self {
        Self {
            store,
            analyzer,
            interval: interval.max(MIN_SWEEP_INTERVAL),
        }
    }

    /// Runs one sweep as of `now`.
    ///
    /// Each item is analyzed at most once, even when several of its
    /// checkpoints are due.
    ///
    /// # Errors
    /// Returns an error only if the due checkpoints cannot be listed.
    /// Per-item failures are counted in [`SweepReport::failures`].
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let due = self.store.get_due_reviews(None, now).await?;
        let mut report = SweepReport {
            due_reviews: due.len(),
            ..SweepReport::default()
        };

        let mut seen = BTreeSet::new();
        for review in &due {
            if !seen.insert(review.item_id) {
                continue;
            }
            match self.refresh_item(review.item_id, now).await {
                Ok(RefreshOutcome::Updated) => {
                    report.items_checked += 1;
                    report.prices_updated += 1;
                }
                Ok(RefreshOutcome::Unchanged) => report.items_checked += 1,
                Ok(RefreshOutcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    warn!(item_id = review.item_id, "Failed to refresh item price: {e}");
                    report.failures += 1;
                }
            }
        }

        info!(
            due_reviews = report.due_reviews,
            items_checked = report.items_checked,
            prices_updated = report.prices_updated,
            skipped = report.skipped,
            failures = report.failures,
            "Price sweep finished"
        );
        Ok(report)
    }

    async fn refresh_item(&self, item_id: i64, now: DateTime<Utc>) -> Result<RefreshOutcome> {
        let Some(item) = self.store.get_item(item_id, None).await? else {
            return Ok(RefreshOutcome::Skipped);
        };
        if item.is_archived || !item.ai_features.price_tracking {
            return Ok(RefreshOutcome::Skipped);
        }

        let analysis = self
            .analyzer
            .analyze_price(&item.name, item.current_price, item.product_url.as_deref())
            .await?;
        let new_price = analysis.current_price;
        if !new_price.is_finite() || new_price < 0.0 {
            return Err(Error::Analysis {
                message: format!("Analyzer returned unusable price {new_price}"),
            });
        }
        if (new_price - item.current_price).abs() < PRICE_EPSILON {
            debug!(item_id, price = new_price, "Price unchanged");
            return Ok(RefreshOutcome::Unchanged);
        }

        let mut history = item.price_history;
        history.push(new_price, now);
        self.store
            .update_item(
                item_id,
                None,
                ItemChanges {
                    current_price: Some(new_price),
                    price_history: Some(history),
                    ..ItemChanges::default()
                },
            )
            .await?;

        info!(
            item_id,
            old_price = item.current_price,
            new_price,
            "Recorded price change for '{}'",
            item.name
        );
        Ok(RefreshOutcome::Updated)
    }

    async fn run_once(&self) {
        let now = Utc::now();
        let span = info_span!("price_sweep", %now);
        if let Err(e) = self.sweep(now).instrument(span).await {
            error!("Price sweep failed: {e}");
        }
    }

    /// Spawns the sweep loop. The first sweep runs immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> SweeperHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            info!(interval = ?self.interval, "Price sweeper started");
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = ticker.tick() => self.run_once().await,
                }
            }
            info!("Price sweeper stopped");
        });

        SweeperHandle { cancel, task }
    }
}

/// Owner of a running sweep loop.
///
/// Dropping the handle leaves the loop running; call [`SweeperHandle::stop`]
/// to shut it down.
#[derive(Debug)]
pub struct SweeperHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Whether the loop is still running
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancels the timer and waits for the loop to exit.
    ///
    /// # Errors
    /// Returns an error if the loop task panicked.
    pub async fn stop(self) -> Result<()> {
        self.cancel.cancel();
        self.task.await?;
        Ok(())
    }
}
