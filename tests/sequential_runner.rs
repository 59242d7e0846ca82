use anyhow::Result;
use latency_bench::{cli::Args, BenchmarkConfig, BenchmarkRunner, SetupError};
use std::time::Duration;

/// Odd invocations fail; the run keeps going and only the even ones count.
#[test]
fn failures_are_recorded_and_skipped() -> Result<()> {
    let mut calls = 0usize;
    let outcome = BenchmarkRunner::new(10).run("alternating", || {
        calls += 1;
        if calls % 2 == 1 {
            anyhow::bail!("invocation {} failed", calls);
        }
        std::thread::sleep(Duration::from_millis(1));
        Ok(calls)
    })?;

    assert_eq!(outcome.attempted, 10);
    assert_eq!(outcome.statistics.count, 5);
    assert_eq!(outcome.series.len(), 5);
    assert_eq!(outcome.failures.len(), 5);
    assert_eq!(outcome.last_result, Some(10));
    assert_eq!(outcome.failures[0].error, "invocation 1 failed");

    let (min, mean, max) = (
        outcome.statistics.min.unwrap(),
        outcome.statistics.mean.unwrap(),
        outcome.statistics.max.unwrap(),
    );
    assert!(min >= Duration::from_millis(1));
    assert!(min <= mean && mean <= max);
    Ok(())
}

/// Later iterations observe the side effects of earlier ones.
#[test]
fn iterations_see_earlier_side_effects() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("log.txt");

    let outcome = BenchmarkRunner::new(4).run_with(
        "append",
        |path: &std::path::Path| {
            let mut contents = std::fs::read_to_string(path).unwrap_or_default();
            contents.push('+');
            std::fs::write(path, &contents)?;
            Ok(contents.len())
        },
        path.as_path(),
    )?;

    assert_eq!(outcome.last_result, Some(4));
    assert_eq!(std::fs::read_to_string(&path)?, "++++");
    Ok(())
}

#[test]
fn zero_iterations_is_rejected() {
    let result = BenchmarkRunner::new(0).run("empty", || Ok(()));
    assert!(matches!(result, Err(SetupError::InvalidIterations)));
}

#[test]
fn config_applies_cli_overrides() -> Result<()> {
    use clap::Parser;

    let args = Args::parse_from([
        "latency-bench",
        "--suites",
        "cpu",
        "--iterations",
        "7",
        "--warmup-iterations",
        "2",
        "--data-dir",
        "/tmp/bench",
    ]);
    let config = BenchmarkConfig::from_args(&args)?;

    assert_eq!(config.iterations, 7);
    assert_eq!(config.warmup_iterations, 2);
    assert_eq!(config.data_dir, std::path::PathBuf::from("/tmp/bench"));
    assert_eq!(config.runner().iterations(), 7);
    Ok(())
}
