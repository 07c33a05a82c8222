use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::timeframe::Timeframe;

/// A strictly increasing sequence of timestamps, eg/ the distinct event times observed in a
/// historic price store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline(Vec<DateTime<Utc>>);

impl Timeline {
    /// Builds a [`Timeline`] from an iterator of timestamps, sorting and de-duplicating them.
    pub fn from_times(times: impl IntoIterator<Item = DateTime<Utc>>) -> Self {
        let mut times: Vec<_> = times.into_iter().collect();
        times.sort_unstable();
        times.dedup();
        Self(times)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DateTime<Utc>> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[DateTime<Utc>] {
        &self.0
    }

    pub fn timeframe(&self) -> Option<Timeframe> {
        match (self.0.first(), self.0.last()) {
            (Some(&first), Some(&last)) => Some(Timeframe::inclusive(first, last)),
            _ => None,
        }
    }

    /// Splits the timeline into consecutive chunks of at most `size` timestamps each.
    pub fn split(&self, size: usize) -> Vec<Timeline> {
        if size == 0 {
            return Vec::new();
        }
        self.0
            .chunks(size)
            .map(|chunk| Timeline(chunk.to_vec()))
            .collect()
    }

    /// Resamples the timeline to the coarser `period`, keeping the last observed timestamp in
    /// each bucket.
    pub fn to_timeline(&self, period: Duration) -> Timeline {
        if self.0.is_empty() || period.is_zero() {
            return self.clone();
        }
        let mut out = Vec::new();
        let mut bucket_end = self.0[0] + period;
        let mut last_in_bucket = self.0[0];
        for &time in &self.0[1..] {
            if time < bucket_end {
                last_in_bucket = time;
            } else {
                out.push(last_in_bucket);
                while time >= bucket_end {
                    bucket_end += period;
                }
                last_in_bucket = time;
            }
        }
        out.push(last_in_bucket);
        Timeline(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(hour: i64) -> DateTime<Utc> {
        DateTime::UNIX_EPOCH + Duration::hours(hour)
    }

    #[test]
    fn sorts_and_dedups() {
        let timeline = Timeline::from_times([t(3), t(1), t(1), t(2)]);
        assert_eq!(timeline.as_slice(), &[t(1), t(2), t(3)]);
    }

    #[test]
    fn timeframe_spans_first_to_last_inclusive() {
        let timeline = Timeline::from_times([t(1), t(5)]);
        let tf = timeline.timeframe().unwrap();
        assert!(tf.contains(t(5)));
    }

    #[test]
    fn split_preserves_ordering_and_count() {
        let timeline = Timeline::from_times((0..10).map(t));
        let parts = timeline.split(3);
        let total: usize = parts.iter().map(Timeline::len).sum();
        assert_eq!(total, 10);
        assert_eq!(parts.len(), 4);
    }
}
