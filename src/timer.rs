//! # Timer
//!
//! Wall-clock measurement of a single invocation. All timing in the harness
//! goes through [`Instant`], so measurements are immune to adjustments of the
//! system clock.

use anyhow::Result;
use std::time::{Duration, Instant};

/// Outcome of one timed invocation
///
/// The elapsed time is captured whether or not the operation succeeded, so the
/// caller decides what to do with timings of failed invocations.
#[derive(Debug)]
pub struct Measured<T> {
    pub outcome: Result<T>,
    pub elapsed: Duration,
}

impl<T> Measured<T> {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Invoke `op` exactly once and time it
pub fn measure<T, F>(op: F) -> Measured<T>
where
    F: FnOnce() -> Result<T>,
{
    let start = Instant::now();
    let outcome = op();
    let elapsed = start.elapsed();
    Measured { outcome, elapsed }
}

/// Invoke `op` exactly once with `arg` and time it
pub fn measure_with<A, T, F>(op: F, arg: &A) -> Measured<T>
where
    A: ?Sized,
    F: FnOnce(&A) -> Result<T>,
{
    let start = Instant::now();
    let outcome = op(arg);
    let elapsed = start.elapsed();
    Measured { outcome, elapsed }
}

/// Monotonic stopwatch for spans that cover more than one call
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Convert a duration to fractional milliseconds
pub fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_returns_result_and_elapsed() {
        let measured = measure(|| {
            std::thread::sleep(Duration::from_millis(2));
            Ok(42)
        });
        assert!(measured.is_success());
        assert_eq!(measured.outcome.unwrap(), 42);
        assert!(measured.elapsed >= Duration::from_millis(2));
    }

    #[test]
    fn test_measure_keeps_elapsed_on_failure() {
        let measured: Measured<()> = measure(|| {
            std::thread::sleep(Duration::from_millis(1));
            anyhow::bail!("boom")
        });
        assert!(!measured.is_success());
        assert!(measured.elapsed >= Duration::from_millis(1));
        assert_eq!(measured.outcome.unwrap_err().to_string(), "boom");
    }

    #[test]
    fn test_measure_with_passes_argument() {
        let measured = measure_with(|s: &str| Ok(s.len()), "hello");
        assert_eq!(measured.outcome.unwrap(), 5);
    }

    #[test]
    fn test_as_millis_f64() {
        assert_eq!(as_millis_f64(Duration::from_micros(1500)), 1.5);
        assert_eq!(as_millis_f64(Duration::ZERO), 0.0);
    }
}
