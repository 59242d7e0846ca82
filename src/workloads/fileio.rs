//! File I/O workloads: sequential writes and reads of generated files, then
//! the concurrent stress batches.

use crate::{
    benchmark::BenchmarkConfig,
    cli::Suite,
    defaults::{FILE_PREFIX, STRESS_PAYLOAD_LINES},
    metrics::utils::format_ms,
    results::SuiteResults,
    store::FsStore,
    stress::{BatchSpec, Payload, PrefixNamer, StressRunner},
    utils::format_bytes,
};
use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Test file contents: `lines` lines of `Line <i>: ` followed by 50 `x`
pub fn create_test_data(lines: usize) -> String {
    let filler = "x".repeat(50);
    let mut data = String::with_capacity(lines * 64);
    for i in 0..lines {
        data.push_str("Line ");
        data.push_str(&i.to_string());
        data.push_str(": ");
        data.push_str(&filler);
        data.push('\n');
    }
    data
}

/// Files created by a sequential run, removed when the guard goes out of scope
#[derive(Debug, Default)]
pub struct ScratchFiles {
    paths: Vec<PathBuf>,
}

impl ScratchFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` for removal and hand it back
    pub fn track(&mut self, path: PathBuf) -> PathBuf {
        self.paths.push(path.clone());
        path
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            remove_scratch(&path);
        }
    }
}

/// Remove a scratch file; a file that is already gone is fine
fn remove_scratch(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed {:?}", path),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {:?}: {}", path, e),
    }
}

fn write_file(path: &Path, data: &str) -> Result<()> {
    std::fs::write(path, data).with_context(|| format!("Failed to write {:?}", path))
}

fn read_file(path: &Path) -> Result<usize> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    Ok(bytes.len())
}

/// Sequential write and read runs for every configured file size
///
/// Blocking; call from a blocking context.
pub fn run_sequential(config: &BenchmarkConfig, results: &mut SuiteResults) -> Result<()> {
    let runner = config.runner();

    for &size in &config.file_sizes {
        info!("=== Testing with {} lines ===", size);
        let data = create_test_data(size);
        let base = config.data_dir.join(format!("{}_{}", FILE_PREFIX, size));

        let mut iteration = 0usize;
        let outcome = runner.run_with_teardown(
            &format!("File Write ({} lines, {})", size, format_bytes(data.len())),
            |data: &str| {
                iteration += 1;
                let path = PathBuf::from(format!("{}_{}.txt", base.display(), iteration));
                write_file(&path, data).map_err(|e| {
                    remove_scratch(&path);
                    e
                })?;
                Ok(path)
            },
            data.as_str(),
            |path: &PathBuf| remove_scratch(path),
        )?;
        results.add_run(&outcome, &config.percentiles)?;

        let mut scratch = ScratchFiles::new();
        let read_path = scratch.track(PathBuf::from(format!("{}.txt", base.display())));
        write_file(&read_path, &data)?;
        let outcome = runner.run_with(
            &format!("File Read ({} lines)", size),
            |path: &Path| read_file(path),
            read_path.as_path(),
        )?;
        if let Some(bytes) = outcome.last_result {
            info!("Read {} bytes per run", bytes);
        }
        results.add_run(&outcome, &config.percentiles)?;

    }

    Ok(())
}

/// One concurrent stress batch per configured unit count
pub async fn run_concurrent(config: &BenchmarkConfig, results: &mut SuiteResults) -> Result<()> {
    let runner = StressRunner::new(Arc::new(FsStore::new(config.data_dir.clone())));
    let payload = Payload::uniform(create_test_data(STRESS_PAYLOAD_LINES));

    for &unit_count in &config.unit_counts {
        info!("=== Concurrent File Operations ({} files) ===", unit_count);
        let spec = BatchSpec {
            unit_count,
            phases: config.phases.clone(),
            namer: PrefixNamer::new(FILE_PREFIX),
            payload: payload.clone(),
        };

        let result = runner.run_batch(&spec).await?;
        info!("Concurrent operations completed: {}", format_ms(result.total_duration));
        info!("Average per file: {}", format_ms(result.per_unit_average));
        if !result.is_clean() {
            warn!(
                "{} unit failures, {} resources left behind",
                result.unit_failures.len(),
                result.cleanup_failures.len()
            );
        }
        results.add_batch(&format!("Concurrent ({} files)", unit_count), &result);
    }

    Ok(())
}

/// Run the file I/O suite
pub async fn run_suite(config: &BenchmarkConfig) -> Result<SuiteResults> {
    tokio::fs::create_dir_all(&config.data_dir)
        .await
        .with_context(|| format!("Failed to create data directory {:?}", config.data_dir))?;

    let sequential_config = config.clone();
    let mut results = tokio::task::spawn_blocking(move || {
        let mut results = SuiteResults::new(Suite::FileIo);
        run_sequential(&sequential_config, &mut results).map(|_| results)
    })
    .await
    .context("Sequential file I/O worker failed")??;

    run_concurrent(config, &mut results).await?;
    Ok(results)
}
