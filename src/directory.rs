//! Owner identity lookup.
//!
//! Recipient addresses are never stored on subscription records; the
//! dispatcher resolves them through this seam. The store-backed
//! implementation reads the `owners` table populated from account data.

use crate::error::Result;
use crate::store::{OwnerContact, TrackerStore};
use async_trait::async_trait;
use std::sync::Arc;

/// Resolves an owner id to contact details. New identity backends only
/// need to implement this trait.
#[async_trait]
pub trait OwnerDirectory: Send + Sync {
    /// Contact details for `owner_id`, or `None` if the owner is unknown.
    async fn contact(&self, owner_id: &str) -> Result<Option<OwnerContact>>;
}

/// Directory backed by the tracker store's `owners` table.
pub struct StoreOwnerDirectory {
    store: Arc<TrackerStore>,
}

impl StoreOwnerDirectory {
    pub fn new(store: Arc<TrackerStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl OwnerDirectory for StoreOwnerDirectory {
    async fn contact(&self, owner_id: &str) -> Result<Option<OwnerContact>> {
        Ok(self.store.owner_contact(owner_id)?)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[tokio::test]
    async fn resolves_known_owner() {
        let store = Arc::new(TrackerStore::open_in_memory().unwrap());
        store
            .upsert_owner_contact(&OwnerContact {
                owner_id: "alice".to_owned(),
                email: "alice@example.com".to_owned(),
                display_name: Some("Alice".to_owned()),
            })
            .unwrap();

        let directory = StoreOwnerDirectory::new(store);
        let contact = directory.contact("alice").await.unwrap().unwrap();
        assert_eq!(contact.email, "alice@example.com");
    }

    #[tokio::test]
    async fn unknown_owner_is_none() {
        let store = Arc::new(TrackerStore::open_in_memory().unwrap());
        let directory = StoreOwnerDirectory::new(store);
        assert!(directory.contact("nobody").await.unwrap().is_none());
    }
}
