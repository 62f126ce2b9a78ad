//! Record types for the subscription store.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Spending category of a subscription.
///
/// Unknown stored labels map to [`Category::Other`] on read rather than
/// failing the row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Music,
    Entertainment,
    Education,
    Fitness,
    Productivity,
    Gaming,
    CloudStorage,
    /// Open bucket for anything outside the fixed set.
    Other,
}

/// Display order used when grouping subscriptions by category.
pub const CATEGORY_ORDER: [Category; 8] = [
    Category::Music,
    Category::Entertainment,
    Category::Education,
    Category::Fitness,
    Category::Productivity,
    Category::Gaming,
    Category::CloudStorage,
    Category::Other,
];

impl Category {
    /// Stable snake_case label, matching the persisted column value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Music => "music",
            Self::Entertainment => "entertainment",
            Self::Education => "education",
            Self::Fitness => "fitness",
            Self::Productivity => "productivity",
            Self::Gaming => "gaming",
            Self::CloudStorage => "cloud_storage",
            Self::Other => "other",
        }
    }

    /// Parse a stored label. Unknown labels fall into the `Other` bucket.
    pub fn parse(label: &str) -> Self {
        match label {
            "music" => Self::Music,
            "entertainment" => Self::Entertainment,
            "education" => Self::Education,
            "fitness" => Self::Fitness,
            "productivity" => Self::Productivity,
            "gaming" => Self::Gaming,
            "cloud_storage" => Self::CloudStorage,
            _ => Self::Other,
        }
    }
}

/// Renewal cadence. Only monthly fixed-date renewal is modelled; the
/// renewal date is never auto-advanced — updating it is a manual edit.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    Monthly,
}

impl Recurrence {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
        }
    }
}

/// A persisted subscription record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    /// Opaque store-assigned identifier.
    pub id: String,
    /// Owning user. Immutable after creation.
    pub owner_id: String,
    /// Display label. Non-empty.
    pub name: String,
    /// Non-negative amount charged per renewal.
    pub cost: f64,
    /// Next/most recent renewal instant. Calendar-date semantics;
    /// `None` models a record whose stored date is missing or unreadable.
    pub renew_date: Option<DateTime<Utc>>,
    /// Spending category.
    pub category: Category,
    /// Renewal cadence (always monthly).
    pub recurrence: Recurrence,
    /// Creation timestamp. Immutable.
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a subscription. The store assigns the id
/// and creation timestamp.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub owner_id: String,
    pub name: String,
    pub cost: f64,
    pub renew_date: Option<DateTime<Utc>>,
    pub category: Category,
}

/// Partial update for an existing subscription. `None` leaves the field
/// unchanged. Owner and recurrence are not editable.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionPatch {
    pub name: Option<String>,
    pub cost: Option<f64>,
    pub renew_date: Option<DateTime<Utc>>,
    pub category: Option<Category>,
}

/// Contact details for a subscription owner, resolved via the owner
/// directory — never stored on the subscription itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OwnerContact {
    pub owner_id: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Convert an instant to the epoch-millisecond column value.
pub(crate) fn epoch_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// Convert a stored epoch-millisecond value back to an instant.
///
/// Returns `None` for values outside chrono's representable range, which
/// the window functions treat the same as a missing date.
pub(crate) fn from_epoch_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn category_labels_round_trip() {
        for category in CATEGORY_ORDER {
            assert_eq!(Category::parse(category.as_str()), category);
        }
    }

    #[test]
    fn unknown_category_falls_into_other() {
        assert_eq!(Category::parse("pet_insurance"), Category::Other);
        assert_eq!(Category::parse(""), Category::Other);
    }

    #[test]
    fn category_serde_is_snake_case() {
        let json = serde_json::to_string(&Category::CloudStorage).unwrap();
        assert_eq!(json, "\"cloud_storage\"");
    }

    #[test]
    fn recurrence_defaults_to_monthly() {
        assert_eq!(Recurrence::default(), Recurrence::Monthly);
        assert_eq!(Recurrence::Monthly.as_str(), "monthly");
    }

    #[test]
    fn epoch_millis_round_trip_is_exact() {
        let at = Utc.with_ymd_and_hms(2024, 3, 13, 12, 0, 0).unwrap();
        assert_eq!(from_epoch_millis(epoch_millis(at)), Some(at));
    }
}
