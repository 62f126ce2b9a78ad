//! Daily fixed-time trigger.
//!
//! The trigger is defined by a wall-clock time in one named civil
//! timezone. The next fire instant is computed explicitly from
//! (time, timezone) so tests can drive the schedule with an injected
//! "now" instead of a real clock.

use crate::config::ReminderConfig;
use crate::error::Result;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Fires once per day at a fixed local time.
#[derive(Debug, Clone, Copy)]
pub struct DailyTrigger {
    time: NaiveTime,
    tz: Tz,
}

impl DailyTrigger {
    pub fn new(time: NaiveTime, tz: Tz) -> Self {
        Self { time, tz }
    }

    /// Build from the reminder configuration.
    pub fn from_config(config: &ReminderConfig) -> Result<Self> {
        Ok(Self::new(config.trigger_time()?, config.timezone()?))
    }

    /// The trigger's civil timezone.
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// The next fire instant strictly after `now`.
    pub fn next_fire_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_now = now.with_timezone(&self.tz);
        let mut date = local_now.date_naive();
        if local_now.time() >= self.time {
            date = next_day(date);
        }

        // A DST gap can swallow the trigger time on one date; step
        // forward until the local time resolves.
        loop {
            if let Some(fire) = resolve_local(self.tz, date, self.time) {
                return fire.with_timezone(&Utc);
            }
            date = next_day(date);
        }
    }

    /// Civil midnight of `now`'s day in the trigger timezone.
    pub fn civil_day_start(&self, now: DateTime<Utc>) -> DateTime<Tz> {
        let local = now.with_timezone(&self.tz);
        resolve_local(self.tz, local.date_naive(), NaiveTime::MIN).unwrap_or(local)
    }

    /// Sleep until the next fire instant and return it.
    pub async fn wait_until_next(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let fire_at = self.next_fire_after(now);
        let wait = (fire_at - now).to_std().unwrap_or(std::time::Duration::ZERO);
        tracing::debug!(fire_at = %fire_at, "waiting for next trigger");
        tokio::time::sleep(wait).await;
        fire_at
    }
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}

/// Resolve a local (date, time) pair to an instant.
///
/// Ambiguous local times (DST fall-back) take the earlier instant; local
/// times inside a DST gap shift forward one hour, which lands past the
/// gap.
fn resolve_local(tz: Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&date.and_time(time)) {
        chrono::LocalResult::Single(at) => Some(at),
        chrono::LocalResult::Ambiguous(earlier, _) => Some(earlier),
        chrono::LocalResult::None => tz
            .from_local_datetime(&(date.and_time(time) + Duration::hours(1)))
            .earliest(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use chrono_tz::Asia::Kolkata;

    fn trigger() -> DailyTrigger {
        DailyTrigger::new(NaiveTime::from_hms_opt(9, 0, 0).unwrap(), Kolkata)
    }

    fn kolkata(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Kolkata
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn fires_later_today_when_before_trigger_time() {
        let now = kolkata(2024, 3, 10, 6, 0);
        assert_eq!(trigger().next_fire_after(now), kolkata(2024, 3, 10, 9, 0));
    }

    #[test]
    fn fires_tomorrow_when_past_trigger_time() {
        let now = kolkata(2024, 3, 10, 14, 0);
        assert_eq!(trigger().next_fire_after(now), kolkata(2024, 3, 11, 9, 0));
    }

    #[test]
    fn exactly_at_trigger_time_fires_tomorrow() {
        let now = kolkata(2024, 3, 10, 9, 0);
        assert_eq!(trigger().next_fire_after(now), kolkata(2024, 3, 11, 9, 0));
    }

    #[test]
    fn crosses_month_and_year_boundaries() {
        let now = kolkata(2024, 12, 31, 22, 0);
        assert_eq!(trigger().next_fire_after(now), kolkata(2025, 1, 1, 9, 0));
    }

    #[test]
    fn nine_am_kolkata_is_0330_utc() {
        let now = kolkata(2024, 3, 10, 6, 0);
        let fire = trigger().next_fire_after(now);
        assert_eq!(
            fire,
            Utc.with_ymd_and_hms(2024, 3, 10, 3, 30, 0).unwrap()
        );
    }

    #[test]
    fn civil_day_start_is_local_midnight() {
        let now = kolkata(2024, 3, 10, 14, 30);
        let day_start = trigger().civil_day_start(now);
        assert_eq!(day_start, Kolkata.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap());
    }

    #[test]
    fn day_start_in_utc_terms_is_previous_evening() {
        let now = kolkata(2024, 3, 10, 14, 30);
        let day_start = trigger().civil_day_start(now).with_timezone(&Utc);
        assert_eq!(day_start, Utc.with_ymd_and_hms(2024, 3, 9, 18, 30, 0).unwrap());
    }
}
