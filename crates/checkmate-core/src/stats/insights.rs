//! Focus-time totals over calendar windows.
//!
//! Windows are anchored in the caller's time zone: today starts at local
//! midnight, the week on Sunday, the month on the 1st.

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::FocusSessionRecord;

/// Minutes of completed focus per window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusInsights {
    pub today: u64,
    pub week: u64,
    pub month: u64,
    /// Week total spread over all seven days.
    pub week_average: f64,
    /// Month total spread over the days elapsed so far.
    pub month_average: f64,
}

impl FocusInsights {
    pub fn compute<Tz: TimeZone>(records: &[FocusSessionRecord], now: &DateTime<Tz>) -> Self {
        let zone = now.timezone();
        let date = now.date_naive();
        let start_of_day = local_midnight(&zone, date);
        let start_of_week = date
            .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_sunday())))
            .map_or(start_of_day, |d| local_midnight(&zone, d));
        let start_of_month = date
            .with_day(1)
            .map_or(start_of_day, |d| local_midnight(&zone, d));

        let total_since = |start: DateTime<Utc>| -> u64 {
            records
                .iter()
                .filter(|r| r.occurred_at >= start)
                .map(|r| u64::from(r.duration_minutes))
                .sum()
        };

        let week = total_since(start_of_week);
        let month = total_since(start_of_month);
        Self {
            today: total_since(start_of_day),
            week,
            month,
            week_average: week as f64 / 7.0,
            month_average: month as f64 / f64::from(date.day()),
        }
    }
}

fn local_midnight<Tz: TimeZone>(zone: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    zone.from_local_datetime(&midnight)
        .earliest()
        .map_or_else(|| midnight.and_utc(), |local| local.with_timezone(&Utc))
}
