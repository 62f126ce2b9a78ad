//! Upcoming-renewal window calculation.
//!
//! Pure functions over in-memory subscription sets: no clock access, no
//! store access. The interactive dashboard path runs [`upcoming`] on every
//! watch delivery, so it must be cheap and safe to call repeatedly.

use crate::store::Subscription;
use chrono::{DateTime, Days, Utc};

/// Subscriptions whose renewal falls within `[now, now + lookahead_days]`,
/// inclusive on both ends.
///
/// `lookahead_days` uses calendar-day arithmetic: the limit preserves the
/// time-of-day of `now` and crosses month/year boundaries correctly. A
/// negative lookahead is clamped to 0, which leaves only renewals at the
/// exact instant `now`. Records without a renewal date are excluded, not
/// errors. Result order is unspecified; see [`sort_by_renewal`].
pub fn upcoming(
    subs: &[Subscription],
    now: DateTime<Utc>,
    lookahead_days: i64,
) -> Vec<Subscription> {
    let days = lookahead_days.max(0) as u64;
    let limit = now
        .checked_add_days(Days::new(days))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    subs.iter()
        .filter(|s| match s.renew_date {
            Some(renew) => renew >= now && renew <= limit,
            None => false,
        })
        .cloned()
        .collect()
}

/// Sort ascending by renewal date for deterministic display.
///
/// Records without a renewal date sort first; ties break on the
/// store-assigned id.
pub fn sort_by_renewal(subs: &mut [Subscription]) {
    subs.sort_by(|a, b| {
        a.renew_date
            .cmp(&b.renew_date)
            .then_with(|| a.id.cmp(&b.id))
    });
}
