use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A half-open time range `[start, end)`, or `[start, end]` when `inclusive_end` is set. `end ==
/// None` represents an unbounded/infinite timeframe (eg/ a live feed with no known stop time).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timeframe {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub inclusive_end: bool,
}

impl Timeframe {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: Some(end),
            inclusive_end: false,
        }
    }

    pub fn inclusive(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: Some(end),
            inclusive_end: true,
        }
    }

    pub fn infinite(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: None,
            inclusive_end: false,
        }
    }

    pub fn is_infinite(&self) -> bool {
        self.end.is_none()
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        if time < self.start {
            return false;
        }
        match self.end {
            None => true,
            Some(end) if self.inclusive_end => time <= end,
            Some(end) => time < end,
        }
    }

    /// Splits the timeframe into consecutive sub-timeframes of fixed `period`, the last of which
    /// may be shorter. Returns an empty vec for an infinite timeframe.
    pub fn split_by_period(&self, period: Duration) -> Vec<Timeframe> {
        let Some(end) = self.end else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut cursor = self.start;
        while cursor < end {
            let next = (cursor + period).min(end);
            out.push(Timeframe::new(cursor, next));
            cursor = next;
        }
        out
    }

    /// Splits the timeframe into `count` equal-duration sub-timeframes. Returns an empty vec for
    /// an infinite timeframe or `count == 0`.
    pub fn split_by_count(&self, count: usize) -> Vec<Timeframe> {
        let Some(end) = self.end else {
            return Vec::new();
        };
        if count == 0 {
            return Vec::new();
        }
        let total = end - self.start;
        let chunk = total / count as i32;
        self.split_by_period(chunk)
    }

    /// The intersection of two timeframes, or `None` if they do not overlap.
    pub fn intersect(&self, other: &Timeframe) -> Option<Timeframe> {
        let start = self.start.max(other.start);
        let end = match (self.end, other.end) {
            (None, None) => None,
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (Some(a), Some(b)) => Some(a.min(b)),
        };
        match end {
            Some(end) if end <= start => None,
            _ => Some(Timeframe {
                start,
                end,
                inclusive_end: self.inclusive_end && other.inclusive_end,
            }),
        }
    }

    pub fn overlaps(&self, other: &Timeframe) -> bool {
        self.intersect(other).is_some()
    }
}
