//! Per-owner reminder preference.
//!
//! Holds the lookahead (in days) the interactive upcoming path uses for
//! one owner. This is independent of the scheduler's fixed batch window;
//! the two are deliberately never unified.

use crate::store::sqlite::StoreError;
use crate::store::watch::WatchHandle;
use crate::store::TrackerStore;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Lookahead applied when an owner has no stored preference.
pub const DEFAULT_REMINDER_DAYS: u32 = 7;

/// Per-owner reminder-days preference, backed by the tracker store.
///
/// Records are created lazily: the first read materialises the default.
/// Stored values that are negative or non-numeric clamp to the default
/// rather than erroring.
pub struct PreferenceStore {
    store: Arc<TrackerStore>,
}

impl PreferenceStore {
    pub fn new(store: Arc<TrackerStore>) -> Self {
        Self { store }
    }

    /// Effective reminder-days for `owner_id`.
    ///
    /// Missing preference records are created with the default on first
    /// read; invalid stored values are clamped (and logged), not surfaced.
    pub fn reminder_days(&self, owner_id: &str) -> Result<u32, StoreError> {
        match self.store.read_reminder_days_raw(owner_id)? {
            None => {
                self.store.write_reminder_days(owner_id, DEFAULT_REMINDER_DAYS)?;
                Ok(DEFAULT_REMINDER_DAYS)
            }
            Some(days) if days < 0 => {
                tracing::warn!(owner_id, days, "negative reminder_days clamped to default");
                Ok(DEFAULT_REMINDER_DAYS)
            }
            Some(days) => Ok(days as u32),
        }
    }

    /// Store a new preference and push it to any active watches.
    pub fn set_reminder_days(&self, owner_id: &str, days: u32) -> Result<(), StoreError> {
        self.store.write_reminder_days(owner_id, days)?;
        self.store.pref_watchers().publish(owner_id, &days);
        Ok(())
    }

    /// Watch the effective preference for `owner_id`.
    ///
    /// The current value is delivered immediately, then again on every
    /// [`set_reminder_days`](Self::set_reminder_days), until the handle is
    /// cancelled or dropped.
    pub fn watch(
        &self,
        owner_id: &str,
    ) -> Result<(mpsc::UnboundedReceiver<u32>, WatchHandle), StoreError> {
        let current = self.reminder_days(owner_id)?;
        Ok(self.store.pref_watchers().register(owner_id, current))
    }
}
