//! CPU-bound workloads: Fibonacci in three flavours.

use crate::{benchmark::BenchmarkConfig, cli::Suite, results::SuiteResults};
use anyhow::{anyhow, Result};
use tracing::info;

/// Largest input whose Fibonacci number fits in a `u64`
pub const MAX_RECURSIVE_INPUT: u32 = 93;

/// Naive doubly-recursive Fibonacci
///
/// Exponential on purpose; the point is to burn CPU. Inputs above
/// [`MAX_RECURSIVE_INPUT`] overflow `u64`; the configuration rejects them.
pub fn fibonacci_recursive(n: u32) -> u64 {
    if n <= 1 {
        return u64::from(n);
    }
    fibonacci_recursive(n - 1) + fibonacci_recursive(n - 2)
}

/// Iterative Fibonacci, failing once the value no longer fits a `u128`
pub fn fibonacci_iterative(n: u32) -> Result<u128> {
    if n <= 1 {
        return Ok(u128::from(n));
    }
    let (mut a, mut b) = (0u128, 1u128);
    for _ in 2..=n {
        let next = a
            .checked_add(b)
            .ok_or_else(|| anyhow!("fibonacci({}) overflows u128", n))?;
        a = b;
        b = next;
    }
    Ok(b)
}

/// Iterative Fibonacci modulo 2^64, for inputs far beyond any native width
pub fn fibonacci_wrapping(n: u32) -> u64 {
    if n <= 1 {
        return u64::from(n);
    }
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 2..=n {
        let next = a.wrapping_add(b);
        a = b;
        b = next;
    }
    b
}

/// Run the CPU suite
pub fn run_suite(config: &BenchmarkConfig) -> Result<SuiteResults> {
    let mut results = SuiteResults::new(Suite::Cpu);
    let runner = config.runner();

    for &n in &config.fib_inputs {
        let outcome = runner.run_with(
            &format!("Fibonacci Recursive (n={})", n),
            |&n: &u32| Ok(fibonacci_recursive(n)),
            &n,
        )?;
        if let Some(result) = outcome.last_result {
            info!("Result: {}", result);
        }
        results.add_run(&outcome, &config.percentiles)?;

        let outcome = runner.run_with(
            &format!("Fibonacci Iterative (n={})", n),
            |&n: &u32| fibonacci_iterative(n),
            &n,
        )?;
        if let Some(result) = outcome.last_result {
            info!("Result: {}", result);
        }
        results.add_run(&outcome, &config.percentiles)?;
    }

    info!("=== Large Number Fibonacci (Iterative) ===");
    let large_runner = crate::BenchmarkRunner::new(config.large_iterations)
        .with_warmup(config.warmup_iterations);
    for &n in &config.large_fib_inputs {
        let outcome = large_runner.run_with(
            &format!("Large Fibonacci mod 2^64 (n={})", n),
            |&n: &u32| Ok(fibonacci_wrapping(n)),
            &n,
        )?;
        if let Some(result) = outcome.last_result {
            info!("Result: {}", result);
        }
        results.add_run(&outcome, &config.percentiles)?;
    }

    Ok(results)
}
