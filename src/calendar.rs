use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;

/// Whole days between the epoch and the forecast date. This is the only
/// feature the regressors consume.
pub type DayOffset = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub day_offset: DayOffset,
}

/// Resolves "tomorrow" in one fixed timezone, regardless of where the server
/// runs, and measures it against the anchored epoch.
#[derive(Debug, Clone, Copy)]
pub struct DateResolver {
    timezone: Tz,
    epoch: DateTime<FixedOffset>,
}

impl DateResolver {
    pub fn new(timezone: Tz, epoch: DateTime<FixedOffset>) -> DateResolver {
        DateResolver { timezone, epoch }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn resolve(&self, now: DateTime<Utc>) -> ForecastDay {
        let tomorrow = tomorrow(now, self.timezone);
        ForecastDay {
            date: tomorrow.date_naive(),
            day_offset: whole_days_between(self.epoch, tomorrow),
        }
    }
}

/// Midnight of the next day. The offset in effect at `now` is kept for the
/// whole computation, so a DST change overnight does not move the result.
pub fn tomorrow(now: DateTime<Utc>, timezone: Tz) -> DateTime<FixedOffset> {
    let local = now.with_timezone(&timezone).fixed_offset();
    let today = local - local.time().signed_duration_since(NaiveTime::MIN);
    today + TimeDelta::days(1)
}

/// Floored day difference, `to - from`.
pub fn whole_days_between(from: DateTime<FixedOffset>, to: DateTime<FixedOffset>) -> DayOffset {
    let delta = to.signed_duration_since(from);
    let days = delta.num_days();
    if delta < TimeDelta::days(days) {
        days - 1
    } else {
        days
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::epoch::Epoch;
    use chrono::TimeZone;
    use chrono_tz::Asia::Kolkata;

    fn utc(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec).unwrap()
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn naive_resolver(year: i32, month: u32, day: u32) -> DateResolver {
        let epoch = Epoch::Naive(date(year, month, day).and_time(NaiveTime::MIN))
            .anchor(Kolkata)
            .unwrap();
        DateResolver::new(Kolkata, epoch)
    }

    #[test]
    fn test_tomorrow_is_midnight_in_timezone() {
        let tomorrow = tomorrow(utc(2024, 3, 1, 20, 0, 0), Kolkata);
        assert_eq!(tomorrow.to_rfc3339(), "2024-03-03T00:00:00+05:30");
    }

    #[test]
    fn test_day_boundary_follows_timezone_not_utc() {
        let resolver = naive_resolver(2024, 1, 1);
        // 23:59:59 in Kolkata
        let before = resolver.resolve(utc(2024, 3, 1, 18, 29, 59));
        assert_eq!(before.date, date(2024, 3, 2));
        // 00:00:00 in Kolkata, still March 1st in UTC
        let after = resolver.resolve(utc(2024, 3, 1, 18, 30, 0));
        assert_eq!(after.date, date(2024, 3, 3));
        assert_eq!(after.day_offset, before.day_offset + 1);
    }

    #[test]
    fn test_day_offset_across_leap_february() {
        let day = naive_resolver(2024, 1, 1).resolve(utc(2024, 3, 1, 20, 0, 0));
        assert_eq!(day.date, date(2024, 3, 3));
        assert_eq!(day.day_offset, 31 + 29 + 2);
    }

    #[test]
    fn test_day_offset_across_month_boundary() {
        let day = naive_resolver(2023, 1, 1).resolve(utc(2023, 1, 31, 0, 0, 0));
        assert_eq!(day.date, date(2023, 2, 1));
        assert_eq!(day.day_offset, 31);
    }

    #[test]
    fn test_day_offset_across_year_boundary() {
        let day = naive_resolver(2023, 1, 1).resolve(utc(2023, 12, 31, 12, 0, 0));
        assert_eq!(day.date, date(2024, 1, 1));
        assert_eq!(day.day_offset, 365);
    }

    #[test]
    fn test_naive_epoch_differs_from_utc_epoch() {
        let now = utc(2024, 1, 1, 0, 0, 0);
        let naive = naive_resolver(2024, 1, 1).resolve(now);
        assert_eq!(naive.day_offset, 1);

        // Same calendar date but pinned to UTC: tomorrow's midnight in Kolkata
        // is only 18.5 hours later.
        let zoned = DateResolver::new(Kolkata, utc(2024, 1, 1, 0, 0, 0).fixed_offset())
            .resolve(now);
        assert_eq!(zoned.date, naive.date);
        assert_eq!(zoned.day_offset, 0);
    }

    #[test]
    fn test_future_epoch_gives_negative_offset() {
        let day = naive_resolver(2024, 1, 10).resolve(utc(2024, 1, 1, 0, 0, 0));
        assert_eq!(day.day_offset, -8);
    }

    #[test]
    fn test_whole_days_floor_partial_negative_days() {
        let midnight = Kolkata
            .with_ymd_and_hms(2024, 1, 2, 0, 0, 0)
            .unwrap()
            .fixed_offset();
        let noon = midnight + TimeDelta::hours(12);
        assert_eq!(whole_days_between(noon, midnight), -1);
        assert_eq!(whole_days_between(midnight, noon), 0);
        assert_eq!(whole_days_between(midnight, midnight), 0);
    }

    #[test]
    fn test_offset_kept_across_dst_change() {
        // Clocks in New York moved forward during the night after 2021-03-13.
        let tomorrow = tomorrow(utc(2021, 3, 13, 17, 0, 0), chrono_tz::America::New_York);
        assert_eq!(tomorrow.to_rfc3339(), "2021-03-14T00:00:00-05:00");
    }
}
