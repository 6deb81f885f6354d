//! Calendar bucket rules shared by period virtualization and price bucketing.
//!
//! All boundaries are computed in UTC. Weeks start on Sunday 00:00:00. Month and
//! year buckets follow the real calendar, so their length varies.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_WEEK: i64 = 7 * SECONDS_PER_DAY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown granularity {0:?}, expected hour, day, week, month or year")]
pub struct GranularityParseError(pub String);

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Year => "year",
        }
    }

    /// Start of the bucket containing `ts`.
    pub fn bucket_start(&self, ts: i64) -> i64 {
        match self {
            Granularity::Hour => ts - ts.rem_euclid(SECONDS_PER_HOUR),
            Granularity::Day => day_start(ts),
            Granularity::Week => {
                let weekday = to_datetime(ts).weekday().num_days_from_sunday();
                day_start(ts) - i64::from(weekday) * SECONDS_PER_DAY
            }
            Granularity::Month => {
                let date = to_datetime(ts);
                first_of_month(date.year(), date.month())
            }
            Granularity::Year => first_of_month(to_datetime(ts).year(), 1),
        }
    }

    /// Exclusive end of the bucket containing `ts`, i.e. the start of the next bucket.
    pub fn bucket_end(&self, ts: i64) -> i64 {
        let start = self.bucket_start(ts);
        match self {
            Granularity::Hour => start + SECONDS_PER_HOUR,
            Granularity::Day => start + SECONDS_PER_DAY,
            Granularity::Week => start + SECONDS_PER_WEEK,
            Granularity::Month => {
                let date = to_datetime(start);
                if date.month() == 12 {
                    first_of_month(date.year() + 1, 1)
                } else {
                    first_of_month(date.year(), date.month() + 1)
                }
            }
            Granularity::Year => first_of_month(to_datetime(start).year() + 1, 1),
        }
    }

    /// Last whole second inside the bucket containing `ts` (e.g. `23:59:59`).
    pub fn last_second_of_bucket(&self, ts: i64) -> i64 {
        self.bucket_end(ts) - 1
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = GranularityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" => Ok(Granularity::Hour),
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            "year" => Ok(Granularity::Year),
            _ => Err(GranularityParseError(s.to_string())),
        }
    }
}

// Out-of-range timestamps clamp to chrono's bounds; callers validate inputs
// against `MAX_UNIX_TIME` before they reach the calendar.
fn to_datetime(ts: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(ts, 0)
        .single()
        .unwrap_or(if ts < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}

fn day_start(ts: i64) -> i64 {
    ts - ts.rem_euclid(SECONDS_PER_DAY)
}

fn first_of_month(year: i32, month: u32) -> i64 {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).timestamp())
        .unwrap_or(i64::MAX)
}
