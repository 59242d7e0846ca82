use anyhow::Result;
use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::timer::as_millis_f64;

/// Ordered durations of successful invocations, in invocation order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DurationSeries(Vec<Duration>);

impl DurationSeries {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, duration: Duration) {
        self.0.push(duration);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Duration] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Duration> {
        self.0.iter()
    }
}

impl From<Vec<Duration>> for DurationSeries {
    fn from(durations: Vec<Duration>) -> Self {
        Self(durations)
    }
}

impl FromIterator<Duration> for DurationSeries {
    fn from_iter<I: IntoIterator<Item = Duration>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Count, mean, min and max of a duration series
///
/// `mean`, `min` and `max` are `None` exactly when `count` is zero. Callers
/// should branch on `count` (or on the options) before reading them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Statistics {
    pub count: usize,
    pub mean: Option<Duration>,
    pub min: Option<Duration>,
    pub max: Option<Duration>,
}

impl Statistics {
    pub fn from_series(series: &DurationSeries) -> Self {
        aggregate(series.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn mean_ms(&self) -> Option<f64> {
        self.mean.map(as_millis_f64)
    }

    pub fn min_ms(&self) -> Option<f64> {
        self.min.map(as_millis_f64)
    }

    pub fn max_ms(&self) -> Option<f64> {
        self.max.map(as_millis_f64)
    }
}

/// Fold a slice of durations into [`Statistics`] in a single pass
///
/// The mean is computed over integer nanoseconds and truncated, which keeps
/// `min <= mean <= max` exact.
pub fn aggregate(durations: &[Duration]) -> Statistics {
    let mut iter = durations.iter();
    let Some(&first) = iter.next() else {
        return Statistics::default();
    };

    let (count, total_ns, min, max) = iter.fold(
        (1usize, first.as_nanos(), first, first),
        |(count, total, min, max), &d| (count + 1, total + d.as_nanos(), min.min(d), max.max(d)),
    );

    let mean_ns = total_ns / count as u128;
    let mean = Duration::new(
        (mean_ns / 1_000_000_000) as u64,
        (mean_ns % 1_000_000_000) as u32,
    );

    Statistics {
        count,
        mean: Some(mean),
        min: Some(min),
        max: Some(max),
    }
}

/// Percentile value pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PercentileValue {
    pub percentile: f64,
    pub value_ms: f64,
}

/// Latency distribution of one run, backed by an HDR histogram
pub struct LatencyHistogram {
    histogram: Histogram<u64>,
}

impl LatencyHistogram {
    pub fn new() -> Result<Self> {
        // 3 significant figures, auto-resizing
        let histogram = Histogram::<u64>::new(3)?;
        Ok(Self { histogram })
    }

    /// Build a histogram from every duration in the series
    pub fn from_series(series: &DurationSeries) -> Result<Self> {
        let mut histogram = Self::new()?;
        for &duration in series.iter() {
            histogram.record(duration)?;
        }
        Ok(histogram)
    }

    pub fn record(&mut self, latency: Duration) -> Result<()> {
        let latency_ns = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        self.histogram.record(latency_ns)?;
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.is_empty()
    }

    /// Values at the requested percentiles; empty when nothing was recorded
    pub fn percentiles(&self, percentiles: &[f64]) -> Vec<PercentileValue> {
        if self.histogram.is_empty() {
            return Vec::new();
        }

        percentiles
            .iter()
            .map(|&p| PercentileValue {
                percentile: p,
                value_ms: self.histogram.value_at_percentile(p) as f64 / 1_000_000.0,
            })
            .collect()
    }
}

/// Utility functions for metrics display
pub mod utils {
    use super::*;

    /// Format a duration as fixed-precision milliseconds, e.g. `"12.345ms"`
    pub fn format_ms(duration: Duration) -> String {
        format!("{:.3}ms", as_millis_f64(duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(values: &[u64]) -> DurationSeries {
        values.iter().map(|&v| Duration::from_millis(v)).collect()
    }

    #[test]
    fn test_aggregate_basic() {
        let stats = Statistics::from_series(&ms(&[3, 1, 2]));
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean, Some(Duration::from_millis(2)));
        assert_eq!(stats.min, Some(Duration::from_millis(1)));
        assert_eq!(stats.max, Some(Duration::from_millis(3)));
    }

    #[test]
    fn test_aggregate_empty_is_undefined() {
        let stats = aggregate(&[]);
        assert_eq!(stats.count, 0);
        assert!(stats.is_empty());
        assert!(stats.mean.is_none());
        assert!(stats.min.is_none());
        assert!(stats.max.is_none());
        assert!(stats.mean_ms().is_none());
    }

    #[test]
    fn test_aggregate_single_value() {
        let stats = aggregate(&[Duration::from_nanos(7)]);
        assert_eq!(stats.count, 1);
        assert_eq!(stats.mean, stats.min);
        assert_eq!(stats.min, stats.max);
    }

    #[test]
    fn test_aggregate_ordering_holds_for_uneven_values() {
        // Mixes tiny and large values so the mean is not a whole number of ns
        let series: DurationSeries = [1u64, 2, 2, 1_000_000_007, 13, 999]
            .iter()
            .map(|&n| Duration::from_nanos(n))
            .collect();
        let stats = Statistics::from_series(&series);
        assert_eq!(stats.count, series.len());
        let (min, mean, max) = (
            stats.min.unwrap(),
            stats.mean.unwrap(),
            stats.max.unwrap(),
        );
        assert!(min <= mean && mean <= max);
        assert_eq!(min, Duration::from_nanos(1));
        assert_eq!(max, Duration::from_nanos(1_000_000_007));
    }

    #[test]
    fn test_aggregate_ordering_many_series() {
        // Deterministic pseudo-random series of several lengths
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for len in 1..64usize {
            let series: DurationSeries = (0..len)
                .map(|_| {
                    seed ^= seed << 13;
                    seed ^= seed >> 7;
                    seed ^= seed << 17;
                    Duration::from_nanos(seed % 10_000_000_000)
                })
                .collect();
            let stats = Statistics::from_series(&series);
            assert_eq!(stats.count, len);
            assert!(stats.min.unwrap() <= stats.mean.unwrap());
            assert!(stats.mean.unwrap() <= stats.max.unwrap());
        }
    }

    #[test]
    fn test_stats_in_millis() {
        let stats = Statistics::from_series(&ms(&[1, 2]));
        assert_eq!(stats.mean_ms(), Some(1.5));
        assert_eq!(stats.min_ms(), Some(1.0));
        assert_eq!(stats.max_ms(), Some(2.0));
    }

    #[test]
    fn test_latency_histogram_percentiles() {
        let histogram = LatencyHistogram::from_series(&ms(&[1, 2, 3, 4, 5])).unwrap();
        assert_eq!(histogram.len(), 5);

        let values = histogram.percentiles(&[50.0, 99.0]);
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].percentile, 50.0);
        // 3 significant figures
        assert!((values[0].value_ms - 3.0).abs() < 0.01);
        assert!((values[1].value_ms - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_latency_histogram_empty() {
        let histogram = LatencyHistogram::new().unwrap();
        assert!(histogram.is_empty());
        assert!(histogram.percentiles(&[50.0]).is_empty());
    }

    #[test]
    fn test_format_ms() {
        assert_eq!(utils::format_ms(Duration::from_micros(1500)), "1.500ms");
        assert_eq!(utils::format_ms(Duration::from_nanos(123_456)), "0.123ms");
    }
}
