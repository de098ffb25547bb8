//! Local-time resolution for per-user UTC offsets.
//!
//! Every sweep computes "now" in the user's own offset before touching any
//! task, so the same trigger invocation can be morning for one user and
//! midnight for the next.

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};

/// Westernmost supported offset (UTC-12:00), in minutes.
pub const MIN_UTC_OFFSET_MIN: i32 = -720;
/// Easternmost supported offset (UTC+14:00), in minutes.
pub const MAX_UTC_OFFSET_MIN: i32 = 840;

/// Whether an offset is inside the supported range.
///
/// Enforced when the offset is written to the user record; `resolve` itself
/// has no error path.
pub fn offset_in_range(offset_min: i32) -> bool {
    (MIN_UTC_OFFSET_MIN..=MAX_UTC_OFFSET_MIN).contains(&offset_min)
}

/// A user-local point in time: calendar date plus minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalStamp {
    pub date: NaiveDate,
    /// Minutes since local midnight, in `[0, 1440)`.
    pub minutes: u32,
}

impl LocalStamp {
    /// Date key as stored in the database (`YYYY-MM-DD`).
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// The previous local calendar date, if representable.
    pub fn yesterday(&self) -> Option<NaiveDate> {
        self.date.pred_opt()
    }

    /// The next local calendar date, if representable.
    pub fn tomorrow(&self) -> Option<NaiveDate> {
        self.date.succ_opt()
    }
}

/// Resolve a UTC instant into a user-local date and minutes-of-day.
pub fn resolve(now: DateTime<Utc>, offset_min: i32) -> LocalStamp {
    // Out-of-range offsets cannot reach here (validated at write time); fall
    // back to UTC rather than panic if one ever does.
    let offset = FixedOffset::east_opt(offset_min * 60)
        .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap());
    let local = now.with_timezone(&offset);
    LocalStamp {
        date: local.date_naive(),
        minutes: local.hour() * 60 + local.minute(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn utc_offset_is_identity() {
        let stamp = resolve(utc(2026, 3, 14, 9, 26), 0);
        assert_eq!(stamp.date_key(), "2026-03-14");
        assert_eq!(stamp.minutes, 9 * 60 + 26);
    }

    #[test]
    fn positive_offset_crosses_into_next_day() {
        // 23:30 UTC + 90 minutes = 01:00 next day.
        let stamp = resolve(utc(2026, 3, 14, 23, 30), 90);
        assert_eq!(stamp.date_key(), "2026-03-15");
        assert_eq!(stamp.minutes, 60);
    }

    #[test]
    fn negative_offset_crosses_into_previous_day() {
        // 00:10 UTC - 720 minutes = 12:10 previous day.
        let stamp = resolve(utc(2026, 3, 14, 0, 10), MIN_UTC_OFFSET_MIN);
        assert_eq!(stamp.date_key(), "2026-03-13");
        assert_eq!(stamp.minutes, 12 * 60 + 10);
    }

    #[test]
    fn extreme_east_offset() {
        // 12:00 UTC + 14h = 02:00 next day.
        let stamp = resolve(utc(2026, 3, 14, 12, 0), MAX_UTC_OFFSET_MIN);
        assert_eq!(stamp.date_key(), "2026-03-15");
        assert_eq!(stamp.minutes, 120);
    }

    #[test]
    fn minutes_always_in_range_and_date_within_one_day() {
        let base = utc(2026, 6, 1, 0, 0);
        for offset in (MIN_UTC_OFFSET_MIN..=MAX_UTC_OFFSET_MIN).step_by(30) {
            for hour in 0..24 {
                let now = base + chrono::Duration::hours(hour);
                let stamp = resolve(now, offset);
                assert!(stamp.minutes < 1440, "offset {offset} hour {hour}");
                let delta = (stamp.date - now.date_naive()).num_days();
                assert!(delta.abs() <= 1, "offset {offset} hour {hour}: {delta}");
            }
        }
    }

    #[test]
    fn offset_range_bounds() {
        assert!(offset_in_range(0));
        assert!(offset_in_range(MIN_UTC_OFFSET_MIN));
        assert!(offset_in_range(MAX_UTC_OFFSET_MIN));
        assert!(!offset_in_range(MIN_UTC_OFFSET_MIN - 1));
        assert!(!offset_in_range(MAX_UTC_OFFSET_MIN + 1));
    }

    #[test]
    fn tomorrow_rolls_forward_across_year() {
        let stamp = resolve(utc(2026, 12, 31, 23, 50), 0);
        assert_eq!(
            stamp.tomorrow().unwrap().format("%Y-%m-%d").to_string(),
            "2027-01-01"
        );
    }

    #[test]
    fn yesterday_rolls_back_across_month() {
        let stamp = resolve(utc(2026, 3, 1, 8, 0), 0);
        assert_eq!(
            stamp.yesterday().unwrap().format("%Y-%m-%d").to_string(),
            "2026-02-28"
        );
    }
}
