//! Display helpers over in-memory subscription sets.
//!
//! Pure functions the dashboard layer composes with the live watch:
//! grouping, totals, and name search.

use crate::store::{CATEGORY_ORDER, Category, Subscription};

/// Sum of monthly costs across the set.
///
/// Every record renews monthly, so this is a straight sum.
pub fn monthly_total(subs: &[Subscription]) -> f64 {
    subs.iter().map(|s| s.cost).sum()
}

/// Group subscriptions by category in the fixed display order.
///
/// Categories with no members are omitted. Order within a group follows
/// the input order.
pub fn group_by_category(subs: &[Subscription]) -> Vec<(Category, Vec<Subscription>)> {
    CATEGORY_ORDER
        .iter()
        .filter_map(|&category| {
            let members: Vec<Subscription> = subs
                .iter()
                .filter(|s| s.category == category)
                .cloned()
                .collect();
            if members.is_empty() {
                None
            } else {
                Some((category, members))
            }
        })
        .collect()
}

/// Case-insensitive substring filter on the display name.
pub fn filter_by_name(subs: &[Subscription], needle: &str) -> Vec<Subscription> {
    let needle = needle.to_lowercase();
    subs.iter()
        .filter(|s| s.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::store::Recurrence;
    use chrono::{TimeZone, Utc};

    fn sub(name: &str, cost: f64, category: Category) -> Subscription {
        Subscription {
            id: name.to_owned(),
            owner_id: "alice".to_owned(),
            name: name.to_owned(),
            cost,
            renew_date: None,
            category,
            recurrence: Recurrence::Monthly,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn monthly_total_sums_costs() {
        let subs = vec![
            sub("Spotify", 9.99, Category::Music),
            sub("Netflix", 15.49, Category::Entertainment),
        ];
        assert!((monthly_total(&subs) - 25.48).abs() < 1e-9);
    }

    #[test]
    fn empty_set_totals_zero() {
        assert_eq!(monthly_total(&[]), 0.0);
    }

    #[test]
    fn grouping_follows_display_order_and_omits_empty_categories() {
        let subs = vec![
            sub("Dropbox", 11.99, Category::CloudStorage),
            sub("Spotify", 9.99, Category::Music),
            sub("Tidal", 10.99, Category::Music),
        ];
        let groups = group_by_category(&subs);
        let order: Vec<_> = groups.iter().map(|(c, _)| *c).collect();
        assert_eq!(order, [Category::Music, Category::CloudStorage]);
        assert_eq!(groups[0].1.len(), 2);
    }

    #[test]
    fn name_filter_is_case_insensitive() {
        let subs = vec![
            sub("Spotify", 9.99, Category::Music),
            sub("Netflix", 15.49, Category::Entertainment),
        ];
        let hits = filter_by_name(&subs, "SPOT");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Spotify");
    }

    #[test]
    fn empty_needle_matches_everything() {
        let subs = vec![sub("Spotify", 9.99, Category::Music)];
        assert_eq!(filter_by_name(&subs, "").len(), 1);
    }
}
