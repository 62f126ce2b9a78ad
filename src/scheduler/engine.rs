//! Daily reminder firing.
//!
//! Each firing is an independent unit of work: compute the batch window
//! from civil midnight, range-query every owner's renewals inside it, and
//! fan one notification job out per match. Jobs fail independently; a
//! failed firing leaves the trigger armed for the next day. No
//! already-notified state is kept, so a renewal sitting in the window on
//! two consecutive days is mailed on both — accepted, not deduplicated.

use crate::error::{Result, TrackerError};
use crate::notify::NotificationDispatcher;
use crate::scheduler::trigger::DailyTrigger;
use crate::store::TrackerStore;
use chrono::{DateTime, Days, Duration, Utc};
use chrono_tz::Tz;
use futures_util::future::join_all;
use std::sync::Arc;

/// The batch window opens this many days after civil midnight.
///
/// Deliberately independent of the per-user interactive lookahead
/// preference; the two windows are never unified.
pub const BATCH_WINDOW_START_DAYS: u64 = 2;

/// The batch window closes one instant before this many days after civil
/// midnight, so renewals exactly 2 or 3 calendar days out are matched.
pub const BATCH_WINDOW_END_DAYS: u64 = 4;

/// The batch window for one firing, as UTC instants, inclusive on both
/// bounds: `[day_start + 2 days, day_start + 4 days − 1 ms]`.
pub fn batch_window(day_start: DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day_start
        .checked_add_days(Days::new(BATCH_WINDOW_START_DAYS))
        .unwrap_or(day_start);
    let end = day_start
        .checked_add_days(Days::new(BATCH_WINDOW_END_DAYS))
        .unwrap_or(day_start)
        - Duration::milliseconds(1);
    (start.with_timezone(&Utc), end.with_timezone(&Utc))
}

/// Outcome of one firing.
#[derive(Debug, Clone, Default)]
pub struct FiringReport {
    /// Notification jobs dispatched, one per matched subscription.
    pub attempted: usize,
    /// Jobs whose email attempt succeeded.
    pub delivered: usize,
    /// `(subscription id, error)` for each failed job.
    pub failures: Vec<(String, String)>,
}

/// The daily reminder engine: trigger + store + dispatcher.
pub struct ReminderEngine {
    store: Arc<TrackerStore>,
    dispatcher: Arc<NotificationDispatcher>,
    trigger: DailyTrigger,
}

impl ReminderEngine {
    pub fn new(
        store: Arc<TrackerStore>,
        dispatcher: Arc<NotificationDispatcher>,
        trigger: DailyTrigger,
    ) -> Self {
        Self {
            store,
            dispatcher,
            trigger,
        }
    }

    /// Execute one firing as of `now`.
    ///
    /// Fails only when the batch cannot be formed at all (the range query
    /// failed); individual job failures are contained in the report.
    pub async fn fire_at(&self, now: DateTime<Utc>) -> Result<FiringReport> {
        let day_start = self.trigger.civil_day_start(now);
        let (start, end) = batch_window(day_start);
        let matches = self
            .store
            .renewals_between(start, end)
            .map_err(TrackerError::from)?;

        let results = join_all(matches.iter().map(|sub| async move {
            self.dispatcher
                .notify(sub)
                .await
                .map_err(|e| (sub.id.clone(), e.to_string()))
        }))
        .await;

        let mut report = FiringReport {
            attempted: matches.len(),
            ..FiringReport::default()
        };
        for result in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err((id, error)) => {
                    tracing::warn!(subscription_id = %id, error = %error, "reminder delivery failed");
                    report.failures.push((id, error));
                }
            }
        }

        tracing::info!(
            attempted = report.attempted,
            delivered = report.delivered,
            "reminders sent"
        );
        Ok(report)
    }

    /// Run the daily loop forever.
    ///
    /// Firings are serialized by construction: the next trigger instant is
    /// not computed until the current firing completes, so overlapping
    /// firings cannot occur. A failed firing is logged and the trigger
    /// stays armed.
    pub async fn run(&self) {
        loop {
            let fire_time = self.trigger.wait_until_next().await;
            if let Err(e) = self.fire_at(fire_time).await {
                tracing::error!(error = %e, "reminder firing failed");
            }
        }
    }
}
