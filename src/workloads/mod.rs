//! # Benchmark Suites
//!
//! Each suite times a family of operations with the sequential runner and,
//! for file I/O, the concurrent stress runner. CPU and JSON suites are pure
//! blocking work and run on the blocking pool so they never stall the
//! runtime's worker threads.

use crate::{benchmark::BenchmarkConfig, cli::Suite, results::SuiteResults};
use anyhow::{Context, Result};

pub mod cpu;
pub mod fileio;
pub mod json;

/// Run one suite to completion
pub async fn run(suite: Suite, config: &BenchmarkConfig) -> Result<SuiteResults> {
    let results = match suite {
        Suite::Cpu => run_blocking(config, cpu::run_suite).await?,
        Suite::Json => run_blocking(config, json::run_suite).await?,
        Suite::FileIo => fileio::run_suite(config).await?,
        Suite::All => anyhow::bail!("'all' must be expanded before running suites"),
    };
    Ok(results.finish())
}

async fn run_blocking(
    config: &BenchmarkConfig,
    suite: fn(&BenchmarkConfig) -> Result<SuiteResults>,
) -> Result<SuiteResults> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || suite(&config))
        .await
        .context("Suite worker failed")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::Parser;

    #[tokio::test]
    async fn test_cpu_suite_with_small_inputs() {
        let args = Args::parse_from([
            "latency-bench",
            "-i",
            "2",
            "--large-iterations",
            "1",
            "--fib-inputs",
            "10",
            "--large-fib-inputs",
            "200",
        ]);
        let config = BenchmarkConfig::from_args(&args).unwrap();

        let results = run(Suite::Cpu, &config).await.unwrap();
        let labels: Vec<&str> = results.runs.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Fibonacci Recursive (n=10)",
                "Fibonacci Iterative (n=10)",
                "Large Fibonacci mod 2^64 (n=200)",
            ]
        );
        assert_eq!(results.failure_count(), 0);
    }

    #[tokio::test]
    async fn test_all_is_not_runnable() {
        let args = Args::parse_from(["latency-bench"]);
        let config = BenchmarkConfig::from_args(&args).unwrap();
        assert!(run(Suite::All, &config).await.is_err());
    }
}
