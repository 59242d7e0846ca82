//! # Benchmark Engine Module
//!
//! This module contains the sequential benchmark engine: the configuration that
//! drives every suite, and the runner that times an operation over a fixed
//! number of iterations.
//!
//! ## Run Lifecycle
//!
//! 1. **Warmup**: optional invocations whose timings are discarded
//! 2. **Measurement**: `iterations` invocations, each timed individually
//! 3. **Aggregation**: successful durations folded into count/mean/min/max
//!
//! Iterations run strictly one after another on the calling thread. Later
//! iterations may depend on side effects of earlier ones (a read benchmark
//! reading the file a previous step wrote), so they are never reordered or
//! parallelised. A failed iteration is recorded and the run moves on.

use crate::{
    cli::{Args, Suite},
    error::SetupError,
    metrics::{utils::format_ms, DurationSeries, Statistics},
    stress::PhaseKind,
    timer::measure_with,
    utils,
};
use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for benchmark execution
///
/// Built from the command line by [`BenchmarkConfig::from_args`], which applies
/// defaults and validates every parameter before any suite runs.
#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    /// Suites to run, in order, with `all` already expanded
    pub suites: Vec<Suite>,

    /// Measured iterations per run
    pub iterations: usize,

    /// Measured iterations for the large-input Fibonacci runs
    pub large_iterations: usize,

    /// Untimed invocations before measurement begins
    pub warmup_iterations: usize,

    /// Inputs for the recursive and iterative Fibonacci runs
    pub fib_inputs: Vec<u32>,

    /// Inputs for the large Fibonacci runs
    pub large_fib_inputs: Vec<u32>,

    /// Line counts of the generated files for the file I/O suite
    pub file_sizes: Vec<usize>,

    /// Unit counts of the concurrent stress batches
    pub unit_counts: Vec<usize>,

    /// Phases of each concurrent stress batch
    pub phases: Vec<PhaseKind>,

    /// Scratch directory for file I/O
    pub data_dir: PathBuf,

    /// Percentiles reported alongside each run's statistics
    pub percentiles: Vec<f64>,

    /// Keep going when a suite fails
    pub continue_on_error: bool,
}

impl BenchmarkConfig {
    /// Create benchmark configuration from CLI arguments
    ///
    /// ## Validation
    /// - Iteration counts must be non-zero
    /// - Percentiles must lie in `0.0..=100.0`
    /// - Fibonacci inputs must fit the recursive run's `u64`
    /// - Unit counts must fit a single stress batch
    /// - At least one stress phase must be given
    pub fn from_args(args: &Args) -> Result<Self> {
        utils::validate_iterations(args.iterations)?;
        utils::validate_iterations(args.large_iterations)?;
        utils::validate_percentiles(&args.percentiles)?;
        for &units in &args.unit_counts {
            utils::validate_unit_count(units)?;
        }
        for &n in &args.fib_inputs {
            utils::validate_fib_input(n)?;
        }
        for &lines in &args.file_sizes {
            utils::validate_line_count(lines)?;
        }
        if args.phases.is_empty() {
            anyhow::bail!("At least one stress phase is required");
        }

        Ok(Self {
            suites: Suite::expand_all(args.suites.clone()),
            iterations: args.iterations,
            large_iterations: args.large_iterations,
            warmup_iterations: args.warmup_iterations,
            fib_inputs: args.fib_inputs.clone(),
            large_fib_inputs: args.large_fib_inputs.clone(),
            file_sizes: args.file_sizes.clone(),
            unit_counts: args.unit_counts.clone(),
            phases: args.phases.clone(),
            data_dir: args.data_dir.clone(),
            percentiles: args.percentiles.clone(),
            continue_on_error: args.continue_on_error,
        })
    }

    /// Sequential runner using the configured iteration counts
    pub fn runner(&self) -> BenchmarkRunner {
        BenchmarkRunner::new(self.iterations).with_warmup(self.warmup_iterations)
    }
}

/// A single failed invocation
#[derive(Debug, Clone)]
pub struct IterationFailure {
    /// 1-based iteration index
    pub iteration: usize,
    /// Time spent before the operation failed
    pub elapsed: Duration,
    pub error: String,
}

/// Everything a sequential run produced
#[derive(Debug)]
pub struct RunOutcome<T> {
    pub label: String,
    /// Iterations attempted (warmup excluded)
    pub attempted: usize,
    /// Durations of successful iterations, in order
    pub series: DurationSeries,
    pub statistics: Statistics,
    /// Result of the last successful iteration
    pub last_result: Option<T>,
    pub failures: Vec<IterationFailure>,
}

/// Sequential benchmark runner
///
/// ## Usage Pattern
///
/// ```rust
/// use latency_bench::BenchmarkRunner;
///
/// # fn main() -> anyhow::Result<()> {
/// let runner = BenchmarkRunner::new(5);
/// let outcome = runner.run("sum", || Ok((0..1000u64).sum::<u64>()))?;
/// assert_eq!(outcome.statistics.count, 5);
/// assert_eq!(outcome.last_result, Some(499500));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BenchmarkRunner {
    iterations: usize,
    warmup_iterations: usize,
}

impl BenchmarkRunner {
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            warmup_iterations: 0,
        }
    }

    pub fn with_warmup(mut self, warmup_iterations: usize) -> Self {
        self.warmup_iterations = warmup_iterations;
        self
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Time a zero-argument operation
    pub fn run<T, F>(&self, label: &str, mut op: F) -> Result<RunOutcome<T>, SetupError>
    where
        F: FnMut() -> Result<T>,
    {
        self.run_with(label, |_: &()| op(), &())
    }

    /// Time an operation that takes one argument
    ///
    /// The same `arg` is passed to every invocation.
    pub fn run_with<A, T, F>(
        &self,
        label: &str,
        op: F,
        arg: &A,
    ) -> Result<RunOutcome<T>, SetupError>
    where
        A: ?Sized,
        F: FnMut(&A) -> Result<T>,
    {
        self.run_with_teardown(label, op, arg, |_: &T| {})
    }

    /// Time an operation, then hand each successful result to `teardown`
    ///
    /// `teardown` runs outside the timed span, before the next invocation
    /// starts; warmup results go through it too.
    pub fn run_with_teardown<A, T, F, D>(
        &self,
        label: &str,
        mut op: F,
        arg: &A,
        mut teardown: D,
    ) -> Result<RunOutcome<T>, SetupError>
    where
        A: ?Sized,
        F: FnMut(&A) -> Result<T>,
        D: FnMut(&T),
    {
        if self.iterations == 0 {
            return Err(SetupError::InvalidIterations);
        }

        info!("=== {} ===", label);

        if self.warmup_iterations > 0 {
            debug!("Running {} warmup iterations", self.warmup_iterations);
            for i in 1..=self.warmup_iterations {
                match op(arg) {
                    Ok(result) => teardown(&result),
                    Err(e) => warn!("Warmup {} failed: {:#}", i, e),
                }
            }
        }

        let mut series = DurationSeries::with_capacity(self.iterations);
        let mut last_result = None;
        let mut failures = Vec::new();

        for i in 1..=self.iterations {
            let measured = measure_with(&mut op, arg);
            match measured.outcome {
                Ok(result) => {
                    series.push(measured.elapsed);
                    info!("Run {}: {}", i, format_ms(measured.elapsed));
                    teardown(&result);
                    last_result = Some(result);
                }
                Err(e) => {
                    warn!(
                        "Run {}: failed after {}: {:#}",
                        i,
                        format_ms(measured.elapsed),
                        e
                    );
                    failures.push(IterationFailure {
                        iteration: i,
                        elapsed: measured.elapsed,
                        error: format!("{:#}", e),
                    });
                }
            }
        }

        let statistics = Statistics::from_series(&series);
        match (statistics.mean, statistics.min, statistics.max) {
            (Some(mean), Some(min), Some(max)) => {
                info!("Average: {}", format_ms(mean));
                info!("Min: {}", format_ms(min));
                info!("Max: {}", format_ms(max));
            }
            _ => warn!("{}: no successful runs", label),
        }
        if !failures.is_empty() {
            warn!(
                "{}: {} of {} runs failed",
                label,
                failures.len(),
                self.iterations
            );
        }

        Ok(RunOutcome {
            label: label.to_string(),
            attempted: self.iterations,
            series,
            statistics,
            last_result,
            failures,
        })
    }
}
