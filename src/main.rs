//! # Latency Bench - Main Entry Point
//!
//! Runs the selected benchmark suites in order and reports their timings.
//!
//! ## Flow
//!
//! 1. **Initialize logging**: colorized console output through `tracing`
//! 2. **Parse arguments**: clap derive, then validation into `BenchmarkConfig`
//! 3. **Run suites**: CPU, file I/O and JSON, one after another
//! 4. **Report**: summary table, plus a JSON report when `--output-file` is set
//!
//! ## Error Handling
//!
//! Failed iterations and failed batch units are part of the results and never
//! stop a suite. A suite that cannot run at all (unwritable data directory,
//! invalid batch) stops the whole invocation unless `--continue-on-error` is
//! given, in which case the remaining suites still run.

use anyhow::Result;
use clap::Parser;
use latency_bench::{
    benchmark::BenchmarkConfig, cli::Args, logging, results::ResultsManager, workloads,
};
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose)?;

    info!("Starting Latency Bench v{}", latency_bench::VERSION);
    debug!("Configuration: {:?}", args);

    let config = BenchmarkConfig::from_args(&args)?;
    let mut results_manager = ResultsManager::new(args.output_file.as_deref())?;
    debug!("Run id: {}", results_manager.run_id());

    let mut failed_suites = 0usize;
    for suite in &config.suites {
        info!("Running {} suite", suite);

        match workloads::run(*suite, &config).await {
            Ok(results) => {
                info!(
                    "{} suite completed in {}",
                    suite,
                    latency_bench::utils::format_duration(results.test_duration)
                );
                results_manager.add_results(results);
            }
            Err(e) => {
                error!("{} suite failed: {:#}", suite, e);
                if !config.continue_on_error {
                    return Err(e);
                }
                failed_suites += 1;
            }
        }
    }

    results_manager.finalize()?;

    if failed_suites > 0 {
        error!("{} of {} suites failed", failed_suites, config.suites.len());
    } else {
        info!("Latency Bench completed successfully");
    }
    Ok(())
}
