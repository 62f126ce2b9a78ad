//! SQLite-backed subscription store.
//!
//! Thread-safe via an internal `Mutex<Connection>`. All writes are
//! serialized; reads can proceed concurrently with WAL mode on the SQLite
//! side, though we still acquire the mutex for simplicity. Live watches
//! are re-queried and published after every mutation that touches the
//! watched owner.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, params};
use tokio::sync::mpsc;

use super::schema::{apply_schema, read_schema_version};
use super::types::{
    Category, NewSubscription, OwnerContact, Recurrence, Subscription, SubscriptionPatch,
    epoch_millis, from_epoch_millis,
};
use super::watch::{WatchHandle, WatcherRegistry};
use crate::error::TrackerError;
use chrono::{DateTime, Utc};

/// Store-level error type.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying SQLite failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem failure opening the database.
    #[error("I/O error: {0}")]
    Io(String),

    /// The connection mutex was poisoned by a panicking holder.
    #[error("store lock poisoned")]
    Poisoned,

    /// A mutation referenced a record id that does not exist.
    #[error("subscription not found: {0}")]
    NotFound(String),

    /// A record failed validation.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

impl From<StoreError> for TrackerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => TrackerError::NotFound(id),
            StoreError::InvalidRecord(msg) => TrackerError::InvalidRecord(msg),
            other => TrackerError::StoreUnavailable(other.to_string()),
        }
    }
}

/// SQLite-backed store for subscriptions and owner records.
pub struct TrackerStore {
    conn: Mutex<Connection>,
    sub_watchers: WatcherRegistry<Vec<Subscription>>,
    pref_watchers: WatcherRegistry<u32>,
}

impl TrackerStore {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }
        let conn = Connection::open(path)?;
        apply_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            sub_watchers: WatcherRegistry::default(),
            pref_watchers: WatcherRegistry::default(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Read the current schema version from the database.
    pub fn schema_version(&self) -> Result<Option<u32>, StoreError> {
        let conn = self.lock()?;
        Ok(read_schema_version(&conn)?)
    }

    // -----------------------------------------------------------------
    // Subscription queries
    // -----------------------------------------------------------------

    /// Full current subscription set owned by `owner_id`. Unordered;
    /// callers sort when a deterministic order matters.
    pub fn subscriptions_for_owner(&self, owner_id: &str) -> Result<Vec<Subscription>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, owner_id, name, cost, renew_date, category, recurrence, created_at \
             FROM subscriptions WHERE owner_id = ?1",
        )?;
        let rows = stmt.query_map(params![owner_id], row_to_subscription)?;
        collect_rows(rows)
    }

    /// All subscriptions, across all owners, whose renewal instant falls in
    /// `[start, end]` inclusive. Records without a renewal date never match.
    pub fn renewals_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Subscription>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, owner_id, name, cost, renew_date, category, recurrence, created_at \
             FROM subscriptions \
             WHERE renew_date IS NOT NULL AND renew_date >= ?1 AND renew_date <= ?2",
        )?;
        let rows = stmt.query_map(params![epoch_millis(start), epoch_millis(end)], row_to_subscription)?;
        collect_rows(rows)
    }

    /// Fetch one subscription by id.
    pub fn subscription(&self, id: &str) -> Result<Subscription, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, owner_id, name, cost, renew_date, category, recurrence, created_at \
             FROM subscriptions WHERE id = ?1",
            params![id],
            row_to_subscription,
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(id.to_owned()))
    }

    // -----------------------------------------------------------------
    // Subscription mutations
    // -----------------------------------------------------------------

    /// Create a subscription. The store assigns the id and creation
    /// timestamp.
    pub fn create_subscription(&self, new: NewSubscription) -> Result<Subscription, StoreError> {
        validate_record(&new.name, new.cost)?;
        if new.owner_id.trim().is_empty() {
            return Err(StoreError::InvalidRecord("owner_id must not be empty".to_owned()));
        }

        let record = Subscription {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: new.owner_id,
            name: new.name,
            cost: new.cost,
            renew_date: new.renew_date,
            category: new.category,
            recurrence: Recurrence::Monthly,
            created_at: Utc::now(),
        };

        {
            let conn = self.lock()?;
            conn.execute(
                "INSERT INTO subscriptions \
                 (id, owner_id, name, cost, renew_date, category, recurrence, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id,
                    record.owner_id,
                    record.name,
                    record.cost,
                    record.renew_date.map(epoch_millis),
                    record.category.as_str(),
                    record.recurrence.as_str(),
                    epoch_millis(record.created_at),
                ],
            )?;
        }

        self.notify_subscription_watchers(&record.owner_id);
        Ok(record)
    }

    /// Apply a partial update. Fails with [`StoreError::NotFound`] if the
    /// id does not exist. Owner and recurrence are immutable.
    pub fn update_subscription(
        &self,
        id: &str,
        patch: SubscriptionPatch,
    ) -> Result<Subscription, StoreError> {
        let existing = self.subscription(id)?;

        let name = patch.name.unwrap_or(existing.name);
        let cost = patch.cost.unwrap_or(existing.cost);
        let renew_date = patch.renew_date.or(existing.renew_date);
        let category = patch.category.unwrap_or(existing.category);
        validate_record(&name, cost)?;

        {
            let conn = self.lock()?;
            conn.execute(
                "UPDATE subscriptions SET name = ?1, cost = ?2, renew_date = ?3, category = ?4 \
                 WHERE id = ?5",
                params![name, cost, renew_date.map(epoch_millis), category.as_str(), id],
            )?;
        }

        self.notify_subscription_watchers(&existing.owner_id);
        self.subscription(id)
    }

    /// Delete a subscription. Deleting an id that is already gone is a
    /// no-op, matching document-store delete semantics.
    pub fn delete_subscription(&self, id: &str) -> Result<(), StoreError> {
        let owner_id = {
            let conn = self.lock()?;
            let owner: Option<String> = conn
                .query_row(
                    "SELECT owner_id FROM subscriptions WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;
            conn.execute("DELETE FROM subscriptions WHERE id = ?1", params![id])?;
            owner
        };

        if let Some(owner_id) = owner_id {
            self.notify_subscription_watchers(&owner_id);
        }
        Ok(())
    }

    /// Account removal cascade: delete every subscription owned by
    /// `owner_id`, then the owner record (contact + preference).
    pub fn delete_owner_data(&self, owner_id: &str) -> Result<(), StoreError> {
        {
            let conn = self.lock()?;
            conn.execute("DELETE FROM subscriptions WHERE owner_id = ?1", params![owner_id])?;
            conn.execute("DELETE FROM owners WHERE owner_id = ?1", params![owner_id])?;
        }
        self.notify_subscription_watchers(owner_id);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Live watches
    // -----------------------------------------------------------------

    /// Watch the subscription set owned by `owner_id`.
    ///
    /// The current set is delivered immediately, then again after every
    /// mutation touching that owner, until the handle is cancelled or
    /// dropped. Delivered sets are unordered.
    pub fn watch_subscriptions(
        &self,
        owner_id: &str,
    ) -> Result<(mpsc::UnboundedReceiver<Vec<Subscription>>, WatchHandle), StoreError> {
        let current = self.subscriptions_for_owner(owner_id)?;
        Ok(self.sub_watchers.register(owner_id, current))
    }

    fn notify_subscription_watchers(&self, owner_id: &str) {
        if !self.sub_watchers.has_watchers(owner_id) {
            return;
        }
        match self.subscriptions_for_owner(owner_id) {
            Ok(subs) => self.sub_watchers.publish(owner_id, &subs),
            Err(e) => {
                // Watchers keep their last delivered state; the next
                // successful mutation re-publishes.
                tracing::warn!(owner_id, error = %e, "failed to re-query for watchers");
            }
        }
    }

    // -----------------------------------------------------------------
    // Owner records (contact + preference), raw access
    // -----------------------------------------------------------------

    /// Insert or update an owner's contact details, preserving any stored
    /// reminder preference.
    pub fn upsert_owner_contact(&self, contact: &OwnerContact) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO owners (owner_id, email, display_name) VALUES (?1, ?2, ?3) \
             ON CONFLICT(owner_id) DO UPDATE SET email = ?2, display_name = ?3",
            params![contact.owner_id, contact.email, contact.display_name],
        )?;
        Ok(())
    }

    /// Look up an owner's contact record.
    pub fn owner_contact(&self, owner_id: &str) -> Result<Option<OwnerContact>, StoreError> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                "SELECT owner_id, email, display_name FROM owners WHERE owner_id = ?1",
                params![owner_id],
                |row| {
                    Ok(OwnerContact {
                        owner_id: row.get(0)?,
                        email: row.get(1)?,
                        display_name: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    /// Raw reminder-days column for `owner_id`: `None` if the owner row is
    /// absent, the column is NULL, or the stored value is not numeric
    /// (SQLite columns are dynamically typed). Range validation is the
    /// preference store's job.
    pub(crate) fn read_reminder_days_raw(&self, owner_id: &str) -> Result<Option<i64>, StoreError> {
        use rusqlite::types::Value;

        let conn = self.lock()?;
        let row: Option<Value> = conn
            .query_row(
                "SELECT reminder_days FROM owners WHERE owner_id = ?1",
                params![owner_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(match row {
            Some(Value::Integer(days)) => Some(days),
            Some(Value::Real(days)) => Some(days as i64),
            _ => None,
        })
    }

    /// Write the reminder-days preference, creating the owner row if
    /// needed.
    pub(crate) fn write_reminder_days(&self, owner_id: &str, days: u32) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO owners (owner_id, reminder_days) VALUES (?1, ?2) \
             ON CONFLICT(owner_id) DO UPDATE SET reminder_days = ?2",
            params![owner_id, i64::from(days)],
        )?;
        Ok(())
    }

    pub(crate) fn pref_watchers(&self) -> &WatcherRegistry<u32> {
        &self.pref_watchers
    }

    /// Write a raw (possibly out-of-range) reminder-days value, bypassing
    /// the typed API. Lets tests exercise the clamping path.
    #[cfg(test)]
    pub(crate) fn write_reminder_days_raw_for_test(
        &self,
        owner_id: &str,
        days: i64,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO owners (owner_id, reminder_days) VALUES (?1, ?2) \
             ON CONFLICT(owner_id) DO UPDATE SET reminder_days = ?2",
            params![owner_id, days],
        )?;
        Ok(())
    }

    /// Write a non-numeric reminder-days value. Lets tests exercise the
    /// clamping path for dynamically-typed junk.
    #[cfg(test)]
    pub(crate) fn write_reminder_days_text_for_test(
        &self,
        owner_id: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO owners (owner_id, reminder_days) VALUES (?1, ?2) \
             ON CONFLICT(owner_id) DO UPDATE SET reminder_days = ?2",
            params![owner_id, value],
        )?;
        Ok(())
    }
}

fn validate_record(name: &str, cost: f64) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidRecord("name must not be empty".to_owned()));
    }
    if !cost.is_finite() || cost < 0.0 {
        return Err(StoreError::InvalidRecord(format!("cost must be non-negative, got {cost}")));
    }
    Ok(())
}

fn row_to_subscription(row: &rusqlite::Row<'_>) -> rusqlite::Result<Subscription> {
    let renew_ms: Option<i64> = row.get(4)?;
    let category: String = row.get(5)?;
    let created_ms: i64 = row.get(7)?;
    Ok(Subscription {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        cost: row.get(3)?,
        renew_date: renew_ms.and_then(from_epoch_millis),
        category: Category::parse(&category),
        recurrence: Recurrence::Monthly,
        created_at: from_epoch_millis(created_ms).unwrap_or_else(Utc::now),
    })
}

fn collect_rows(
    rows: impl Iterator<Item = rusqlite::Result<Subscription>>,
) -> Result<Vec<Subscription>, StoreError> {
    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}
