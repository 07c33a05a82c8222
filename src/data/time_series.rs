//! Aligned `(timeline, values)` pair with elementwise arithmetic and the transforms used by
//! strategies and the metrics journal (spec §3 "TimeSeries").

use std::ops::{Add, Div, Mul, Sub};

use chrono::Duration;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::data::error::DataError;
use crate::model::timeline::Timeline;

/// A value series aligned 1:1 with a [`Timeline`]; `len(timeline) == len(values)` is an
/// invariant enforced at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    timeline: Timeline,
    values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(timeline: Timeline, values: Vec<f64>) -> Result<Self, DataError> {
        if timeline.len() != values.len() {
            return Err(DataError::BuilderAttributesInvalid);
        }
        Ok(Self { timeline, values })
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Simple period-over-period returns: `value[i] / value[i-1] - 1`. One element shorter than
    /// `self` (spec §8: `returns(ts).len == ts.len - 1`).
    pub fn returns(&self) -> TimeSeries {
        self.pairwise_ratio(|ratio| ratio - 1.0)
    }

    /// Growth rate per step: `value[i] / value[i-1]`, ie/ `1 + returns`.
    pub fn growth_rates(&self) -> TimeSeries {
        self.pairwise_ratio(|ratio| ratio)
    }

    fn pairwise_ratio(&self, transform: impl Fn(f64) -> f64) -> TimeSeries {
        if self.values.len() < 2 {
            return TimeSeries {
                timeline: Timeline::from_times([]),
                values: Vec::new(),
            };
        }
        let times: Vec<_> = self.timeline.as_slice()[1..].to_vec();
        let values = self
            .values
            .windows(2)
            .map(|pair| transform(pair[1] / pair[0]))
            .collect();
        TimeSeries {
            timeline: Timeline::from_times(times),
            values,
        }
    }

    /// Divides every value by the first one, so the series starts at `1.0`.
    pub fn normalize(&self) -> TimeSeries {
        let Some(&base) = self.values.first() else {
            return self.clone();
        };
        self.clone() / base
    }

    /// Drops entries whose value is `NaN`, keeping the timeline/values pairing intact.
    pub fn clean(&self) -> TimeSeries {
        let (times, values): (Vec<_>, Vec<_>) = self
            .timeline
            .as_slice()
            .iter()
            .zip(&self.values)
            .filter(|(_, v)| !v.is_nan())
            .map(|(t, v)| (*t, *v))
            .unzip();
        TimeSeries {
            timeline: Timeline::from_times(times),
            values,
        }
    }

    /// Resamples onto the coarser `period`, averaging values that fall in the same bucket.
    /// Preserves element count parity with [`Timeline::to_timeline`]'s bucketing.
    pub fn group_by(&self, period: Duration) -> TimeSeries {
        if self.values.is_empty() || period.is_zero() {
            return self.clone();
        }
        let mut buckets: Vec<(chrono::DateTime<chrono::Utc>, Vec<f64>)> = Vec::new();
        let mut bucket_end = self.timeline.as_slice()[0] + period;
        let mut current: Vec<f64> = Vec::new();
        let mut current_time = self.timeline.as_slice()[0];

        for (&time, &value) in self.timeline.as_slice().iter().zip(&self.values) {
            if time < bucket_end {
                current.push(value);
                current_time = time;
            } else {
                buckets.push((current_time, std::mem::take(&mut current)));
                while time >= bucket_end {
                    bucket_end += period;
                }
                current.push(value);
                current_time = time;
            }
        }
        if !current.is_empty() {
            buckets.push((current_time, current));
        }

        let (times, values): (Vec<_>, Vec<_>) = buckets
            .into_iter()
            .map(|(t, vs)| (t, vs.iter().sum::<f64>() / vs.len() as f64))
            .unzip();
        TimeSeries {
            timeline: Timeline::from_times(times),
            values,
        }
    }

    /// Returns a copy with values randomly permuted; the timeline (and therefore element count)
    /// is unchanged, only the value-to-timestamp pairing is scrambled.
    pub fn shuffle(&self, rng: &mut impl Rng) -> TimeSeries {
        let mut values = self.values.clone();
        values.shuffle(rng);
        TimeSeries {
            timeline: self.timeline.clone(),
            values,
        }
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().fold(None, |acc, v| match acc {
            None => Some(v),
            Some(acc) => Some(acc.min(v)),
        })
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().fold(None, |acc, v| match acc {
            None => Some(v),
            Some(acc) => Some(acc.max(v)),
        })
    }

    pub fn average(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> TimeSeries {
        TimeSeries {
            timeline: self.timeline.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }
}

impl Add<f64> for TimeSeries {
    type Output = TimeSeries;
    fn add(self, rhs: f64) -> TimeSeries {
        self.map(|v| v + rhs)
    }
}

impl Sub<f64> for TimeSeries {
    type Output = TimeSeries;
    fn sub(self, rhs: f64) -> TimeSeries {
        self.map(|v| v - rhs)
    }
}

impl Mul<f64> for TimeSeries {
    type Output = TimeSeries;
    fn mul(self, rhs: f64) -> TimeSeries {
        self.map(|v| v * rhs)
    }
}

impl Div<f64> for TimeSeries {
    type Output = TimeSeries;
    fn div(self, rhs: f64) -> TimeSeries {
        self.map(|v| v / rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn t(hour: i64) -> DateTime<Utc> {
        DateTime::UNIX_EPOCH + Duration::hours(hour)
    }

    fn series(values: Vec<f64>) -> TimeSeries {
        let timeline = Timeline::from_times((0..values.len() as i64).map(t));
        TimeSeries::new(timeline, values).unwrap()
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let timeline = Timeline::from_times([t(0), t(1)]);
        assert!(TimeSeries::new(timeline, vec![1.0]).is_err());
    }

    #[test]
    fn adding_zero_is_identity() {
        let ts = series(vec![1.0, 2.0, 3.0]);
        assert_eq!((ts.clone() + 0.0).values(), ts.values());
    }

    #[test]
    fn arithmetic_is_elementwise_and_order_independent_per_spec_identity() {
        let ts = series(vec![10.0, 20.0, 30.0]);
        let a = 5.0;
        let b = 2.0;
        let c = 4.0;

        let lhs = ((ts.clone() + a) * b - c) / b;
        let rhs = (ts + a - c / b).clone();
        for (l, r) in lhs.values().iter().zip(rhs.values()) {
            assert!((l - r).abs() < 1e-9);
        }
    }

    #[test]
    fn returns_is_one_shorter_than_source() {
        let ts = series(vec![100.0, 110.0, 99.0]);
        let returns = ts.returns();
        assert_eq!(returns.len(), ts.len() - 1);
        assert!((returns.values()[0] - 0.10).abs() < 1e-9);
    }

    #[test]
    fn clean_drops_nan_entries() {
        let ts = series(vec![1.0, f64::NAN, 3.0]);
        let cleaned = ts.clean();
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned.values(), &[1.0, 3.0]);
    }

    #[test]
    fn group_by_preserves_element_count_and_ordering() {
        let ts = series((0..10).map(|v| v as f64).collect());
        let grouped = ts.group_by(Duration::hours(3));
        assert_eq!(grouped.len(), ts.timeline().to_timeline(Duration::hours(3)).len());
        for window in grouped.timeline().as_slice().windows(2) {
            assert!(window[0] < window[1]);
        }
    }

    #[test]
    fn normalize_starts_at_one() {
        let ts = series(vec![50.0, 100.0, 25.0]);
        assert_eq!(ts.normalize().values()[0], 1.0);
    }

    #[test]
    fn min_max_average() {
        let ts = series(vec![3.0, 1.0, 2.0]);
        assert_eq!(ts.min(), Some(1.0));
        assert_eq!(ts.max(), Some(3.0));
        assert_eq!(ts.average(), Some(2.0));
    }
}
