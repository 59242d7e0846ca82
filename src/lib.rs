//! # Latency Bench Library
//!
//! A micro-benchmark harness that times CPU, file I/O and JSON workloads and
//! stress-tests concurrent file access.
//!
//! ## Harness Components
//!
//! - **Sequential runner** (`benchmark`): invokes an operation a fixed number
//!   of times, strictly in order, timing each invocation and aggregating the
//!   successful ones into count/mean/min/max
//! - **Concurrent stress runner** (`stress`): fans a batch of units out over
//!   tokio tasks, runs each phase behind a barrier and reports one wall-clock
//!   figure for the whole batch
//! - **Resource stores** (`store`): the named-resource namespace the stress
//!   runner writes to, backed by a directory or by memory
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use latency_bench::{BatchSpec, FsStore, Payload, PhaseKind, PrefixNamer, StressRunner};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runner = StressRunner::new(Arc::new(FsStore::new("data")));
//!     let spec = BatchSpec {
//!         unit_count: 10,
//!         phases: vec![PhaseKind::Write, PhaseKind::Read],
//!         namer: PrefixNamer::new("test_rust"),
//!         payload: Payload::uniform(vec![b'x'; 1000]),
//!     };
//!
//!     let result = runner.run_batch(&spec).await?;
//!     println!("{} units in {:.3}ms", result.unit_count, result.total_ms());
//!     Ok(())
//! }
//! ```

/// Sequential benchmark engine
///
/// Contains `BenchmarkConfig`, built from the command line, and the
/// `BenchmarkRunner` that times an operation over a fixed iteration count.
pub mod benchmark;

/// Command-line interface and suite selection
pub mod cli;

pub mod error;

/// Colorized console output for `tracing`
pub mod logging;

/// Duration series, aggregation and percentile histograms
pub mod metrics;

/// Result collection, summary table and JSON report
pub mod results;

/// Named-resource stores used by the stress runner
pub mod store;

/// Concurrent multi-phase batches with guaranteed cleanup
pub mod stress;

pub mod timer;

pub mod utils;

/// The CPU, file I/O and JSON suites
pub mod workloads;

pub use benchmark::{BenchmarkConfig, BenchmarkRunner, IterationFailure, RunOutcome};

pub use cli::{Args, Suite};

pub use error::SetupError;

pub use metrics::{aggregate, DurationSeries, LatencyHistogram, Statistics};

pub use results::{ResultsManager, SuiteResults};

pub use store::{FsStore, MemoryStore, ResourceStore};

pub use stress::{
    BatchResult, BatchSpec, FailureReason, Payload, PhaseKind, PrefixNamer, ResourceNamer,
    StressRunner, UnitFailure,
};

pub use timer::{measure, measure_with, Measured};

/// The current version of the benchmark harness
///
/// Recorded in the JSON report next to the system information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
///
/// These mirror the workloads of the reference benchmark programs so that
/// numbers stay comparable across runs.
pub mod defaults {
    /// Measured iterations per run
    pub const ITERATIONS: usize = 5;

    /// Measured iterations for the large-input Fibonacci runs
    ///
    /// Fewer than [`ITERATIONS`] since each of these is much slower.
    pub const LARGE_ITERATIONS: usize = 3;

    /// No warmup by default; the first measured iteration is cold
    pub const WARMUP_ITERATIONS: usize = 0;

    pub const FIB_INPUTS: [u32; 3] = [35, 40, 42];

    pub const LARGE_FIB_INPUTS: [u32; 3] = [1000, 5000, 10000];

    /// Line counts of the generated test files
    pub const FILE_SIZES: [usize; 3] = [1000, 10000, 100000];

    /// Unit counts of the concurrent stress batches
    pub const UNIT_COUNTS: [usize; 2] = [10, 50];

    /// Scratch directory for file I/O, relative to the working directory
    pub const DATA_DIR: &str = "data";

    /// Line count of the payload every stress unit writes
    pub const STRESS_PAYLOAD_LINES: usize = 1000;

    /// File name prefix for everything the file I/O suite creates
    pub const FILE_PREFIX: &str = "test_rust";
}
