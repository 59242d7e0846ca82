use crate::stress::PhaseKind;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Latency Bench - micro-benchmarks for CPU, file I/O and JSON workloads
#[derive(Parser, Debug, Clone)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// Suites to run (space-separated: cpu, fileio, json, or all)
    #[clap(short = 's', long, value_enum, default_values_t = vec![Suite::All], help_heading = "Core Options", num_args = 1..)]
    pub suites: Vec<Suite>,

    /// Measured iterations per run
    #[clap(short = 'i', long, default_value_t = crate::defaults::ITERATIONS, help_heading = "Core Options")]
    pub iterations: usize,

    /// Measured iterations for large-input Fibonacci runs
    #[clap(long, default_value_t = crate::defaults::LARGE_ITERATIONS)]
    pub large_iterations: usize,

    /// Untimed iterations before each run
    #[clap(short = 'w', long, default_value_t = crate::defaults::WARMUP_ITERATIONS)]
    pub warmup_iterations: usize,

    /// Fibonacci inputs for the recursive and iterative runs
    #[clap(long, num_args = 1.., default_values_t = crate::defaults::FIB_INPUTS.to_vec())]
    pub fib_inputs: Vec<u32>,

    /// Fibonacci inputs for the large-number runs
    #[clap(long, num_args = 1.., default_values_t = crate::defaults::LARGE_FIB_INPUTS.to_vec())]
    pub large_fib_inputs: Vec<u32>,

    /// Line counts of the files used by the file I/O suite
    #[clap(long, num_args = 1.., default_values_t = crate::defaults::FILE_SIZES.to_vec())]
    pub file_sizes: Vec<usize>,

    /// Number of concurrent units per stress batch (one batch per value)
    #[clap(short = 'u', long, num_args = 1.., default_values_t = crate::defaults::UNIT_COUNTS.to_vec())]
    pub unit_counts: Vec<usize>,

    /// Phases of each stress batch, run in order across all units
    #[clap(long, value_enum, num_args = 1.., default_values_t = vec![PhaseKind::Write, PhaseKind::Read])]
    pub phases: Vec<PhaseKind>,

    /// Scratch directory for file I/O
    #[clap(short = 'd', long, default_value = crate::defaults::DATA_DIR)]
    pub data_dir: PathBuf,

    /// Write a JSON report of this invocation to the given file
    #[clap(short = 'o', long)]
    pub output_file: Option<PathBuf>,

    /// Percentiles reported next to min/mean/max
    #[clap(long, num_args = 1.., default_values_t = vec![50.0, 95.0, 99.0])]
    pub percentiles: Vec<f64>,

    /// Continue running other suites even if one fails
    #[clap(long, default_value_t = false)]
    pub continue_on_error: bool,

    /// Verbose output
    #[clap(short = 'v', long, default_value_t = false)]
    pub verbose: bool,
}

/// Available benchmark suites
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
pub enum Suite {
    /// Recursive, iterative and large-number Fibonacci
    #[clap(name = "cpu")]
    Cpu,

    /// File writes, reads and the concurrent stress batches
    #[clap(name = "fileio")]
    FileIo,

    /// JSON serialization, deserialization and round trips
    #[clap(name = "json")]
    Json,

    /// All available suites
    #[clap(name = "all")]
    All,
}

impl std::fmt::Display for Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Suite::Cpu => write!(f, "CPU Intensive"),
            Suite::FileIo => write!(f, "File I/O"),
            Suite::Json => write!(f, "JSON Processing"),
            Suite::All => write!(f, "All Suites"),
        }
    }
}

impl Suite {
    /// Expand the "All" variant to every suite, dropping duplicates
    pub fn expand_all(suites: Vec<Suite>) -> Vec<Suite> {
        if suites.contains(&Suite::All) {
            return vec![Suite::Cpu, Suite::FileIo, Suite::Json];
        }

        let mut expanded = Vec::with_capacity(suites.len());
        for suite in suites {
            if !expanded.contains(&suite) {
                expanded.push(suite);
            }
        }
        expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_display() {
        assert_eq!(Suite::Cpu.to_string(), "CPU Intensive");
        assert_eq!(Suite::FileIo.to_string(), "File I/O");
        assert_eq!(Suite::Json.to_string(), "JSON Processing");
        assert_eq!(Suite::All.to_string(), "All Suites");
    }

    #[test]
    fn test_suite_expand_all() {
        let all_suites = vec![Suite::Cpu, Suite::FileIo, Suite::Json];
        assert_eq!(Suite::expand_all(vec![Suite::All]), all_suites);
        assert_eq!(Suite::expand_all(vec![Suite::Json]), vec![Suite::Json]);
        assert_eq!(
            Suite::expand_all(vec![Suite::Json, Suite::All]),
            all_suites
        );
        assert_eq!(
            Suite::expand_all(vec![Suite::Json, Suite::Cpu, Suite::Json]),
            vec![Suite::Json, Suite::Cpu]
        );
    }

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["latency-bench"]);
        assert_eq!(args.suites, vec![Suite::All]);
        assert_eq!(args.iterations, 5);
        assert_eq!(args.large_iterations, 3);
        assert_eq!(args.fib_inputs, vec![35, 40, 42]);
        assert_eq!(args.large_fib_inputs, vec![1000, 5000, 10000]);
        assert_eq!(args.file_sizes, vec![1000, 10000, 100000]);
        assert_eq!(args.unit_counts, vec![10, 50]);
        assert_eq!(args.phases, vec![PhaseKind::Write, PhaseKind::Read]);
        assert_eq!(args.data_dir, PathBuf::from("data"));
        assert!(args.output_file.is_none());
    }

    #[test]
    fn test_parse_suites_and_phases() {
        let args = Args::parse_from([
            "latency-bench",
            "--suites",
            "fileio",
            "json",
            "--phases",
            "write",
            "--unit-counts",
            "5",
        ]);
        assert_eq!(args.suites, vec![Suite::FileIo, Suite::Json]);
        assert_eq!(args.phases, vec![PhaseKind::Write]);
        assert_eq!(args.unit_counts, vec![5]);
    }
}
