//! Persisted subscription records, owner records, and live watches.

pub mod schema;
pub mod sqlite;
pub mod types;
pub mod watch;

pub use sqlite::{StoreError, TrackerStore};
pub use types::{
    CATEGORY_ORDER, Category, NewSubscription, OwnerContact, Recurrence, Subscription,
    SubscriptionPatch,
};
pub use watch::WatchHandle;
