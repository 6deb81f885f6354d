//! Splits funding intervals into calendar-aligned sub-periods.

use crate::domain::{FundingInterval, Granularity, UnixTime};

/// Inclusive query bounds `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: UnixTime,
    pub end: UnixTime,
}

impl QueryWindow {
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start: UnixTime::new(start),
            end: UnixTime::new(end),
        }
    }

    pub fn contains(&self, at: UnixTime) -> bool {
        self.start <= at && at <= self.end
    }
}

/// One calendar-aligned slice `[start, end]` of an interval's overlap with the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodSpan {
    pub start: UnixTime,
    pub end: UnixTime,
}

impl PeriodSpan {
    pub fn duration(&self) -> i64 {
        self.end.as_secs() - self.start.as_secs()
    }
}

/// Split `interval` into consecutive spans that tile its overlap with `window`.
///
/// Ongoing flows are treated as running until `as_of`. Consecutive spans share
/// their boundary second, which is the start of the next calendar bucket.
/// Transfers yield a single `[T, T]` span when `T` lies inside the window.
pub fn virtualize(
    interval: &FundingInterval,
    window: QueryWindow,
    granularity: Granularity,
    as_of: UnixTime,
) -> Vec<PeriodSpan> {
    if interval.is_transfer() {
        let at = interval.started_at;
        return if window.contains(at) {
            vec![PeriodSpan { start: at, end: at }]
        } else {
            Vec::new()
        };
    }

    let stopped_at = interval.stopped_at.unwrap_or(as_of).as_secs();
    let effective_end = window.end.as_secs().min(stopped_at);
    let mut cursor = window.start.as_secs().max(interval.started_at.as_secs());

    let mut spans = Vec::new();
    while cursor < effective_end {
        let bucket_end = granularity.bucket_end(cursor);
        // Calendar math clamps at the representable range; never step backwards.
        let segment_end = if bucket_end > cursor {
            bucket_end.min(effective_end)
        } else {
            effective_end
        };

        spans.push(PeriodSpan {
            start: UnixTime::new(cursor),
            end: UnixTime::new(segment_end),
        });

        if segment_end >= effective_end {
            break;
        }
        cursor = segment_end;
    }
    spans
}
