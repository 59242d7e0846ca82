use crate::{
    benchmark::RunOutcome,
    cli::Suite,
    metrics::{LatencyHistogram, PercentileValue},
    stress::{BatchResult, CleanupFailure, PhaseKind, UnitFailure},
    utils::{format_table_row, format_table_separator, generate_run_id},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Summary of one sequential run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub label: String,
    pub attempted: usize,
    /// Number of successful iterations the statistics cover
    pub count: usize,
    pub mean_ms: Option<f64>,
    pub min_ms: Option<f64>,
    pub max_ms: Option<f64>,
    pub percentiles: Vec<PercentileValue>,
    /// Failed iterations as `(iteration, error)`
    pub failures: Vec<(usize, String)>,
    /// Free-form facts about the run, e.g. a JSON document size
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl RunSummary {
    pub fn from_outcome<T>(outcome: &RunOutcome<T>, percentiles: &[f64]) -> Result<Self> {
        let histogram = LatencyHistogram::from_series(&outcome.series)?;
        Ok(Self {
            label: outcome.label.clone(),
            attempted: outcome.attempted,
            count: outcome.statistics.count,
            mean_ms: outcome.statistics.mean_ms(),
            min_ms: outcome.statistics.min_ms(),
            max_ms: outcome.statistics.max_ms(),
            percentiles: histogram.percentiles(percentiles),
            failures: outcome
                .failures
                .iter()
                .map(|f| (f.iteration, f.error.clone()))
                .collect(),
            notes: Vec::new(),
        })
    }
}

/// Summary of one concurrent stress batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub label: String,
    pub unit_count: usize,
    pub phases: Vec<PhaseKind>,
    pub total_ms: f64,
    pub per_unit_average_ms: f64,
    pub unit_failures: Vec<UnitFailure>,
    pub cleanup_failures: Vec<CleanupFailure>,
}

impl BatchSummary {
    pub fn from_result(label: &str, result: &BatchResult) -> Self {
        Self {
            label: label.to_string(),
            unit_count: result.unit_count,
            phases: result.phases.clone(),
            total_ms: result.total_ms(),
            per_unit_average_ms: result.per_unit_average_ms(),
            unit_failures: result.unit_failures.clone(),
            cleanup_failures: result.cleanup_failures.clone(),
        }
    }
}

/// Everything one suite produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResults {
    pub suite: Suite,
    pub runs: Vec<RunSummary>,
    pub batches: Vec<BatchSummary>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub test_duration: Duration,
    #[serde(skip)]
    started: Option<Instant>,
}

impl SuiteResults {
    pub fn new(suite: Suite) -> Self {
        Self {
            suite,
            runs: Vec::new(),
            batches: Vec::new(),
            timestamp: chrono::Utc::now(),
            test_duration: Duration::ZERO,
            started: Some(Instant::now()),
        }
    }

    pub fn add_run<T>(&mut self, outcome: &RunOutcome<T>, percentiles: &[f64]) -> Result<()> {
        self.runs.push(RunSummary::from_outcome(outcome, percentiles)?);
        Ok(())
    }

    /// Attach a note to the most recently added run
    pub fn note(&mut self, note: impl Into<String>) {
        if let Some(run) = self.runs.last_mut() {
            run.notes.push(note.into());
        }
    }

    pub fn add_batch(&mut self, label: &str, result: &BatchResult) {
        self.batches.push(BatchSummary::from_result(label, result));
    }

    /// Failed iterations plus failed batch units
    pub fn failure_count(&self) -> usize {
        self.runs.iter().map(|r| r.failures.len()).sum::<usize>()
            + self
                .batches
                .iter()
                .map(|b| b.unit_failures.len() + b.cleanup_failures.len())
                .sum::<usize>()
    }

    /// Stamp the wall-clock duration of the suite
    pub fn finish(mut self) -> Self {
        if let Some(started) = self.started.take() {
            self.test_duration = started.elapsed();
        }
        self
    }
}

/// System information for reproducibility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub architecture: String,
    pub cpu_cores: usize,
    pub rust_version: String,
    pub benchmark_version: String,
}

impl Default for SystemInfo {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            architecture: std::env::consts::ARCH.to_string(),
            cpu_cores: crate::utils::get_cpu_cores(),
            rust_version: env!("CARGO_PKG_RUST_VERSION").to_string(),
            benchmark_version: crate::VERSION.to_string(),
        }
    }
}

/// Report of one invocation
#[derive(Debug, Serialize, Deserialize)]
pub struct FinalBenchmarkResults {
    pub metadata: BenchmarkMetadata,
    pub results: Vec<SuiteResults>,
    pub summary: OverallSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BenchmarkMetadata {
    pub run_id: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub total_suites: usize,
    pub system_info: SystemInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OverallSummary {
    pub total_runs: usize,
    pub total_batches: usize,
    pub total_failures: usize,
    /// Label of the run with the lowest mean
    pub fastest_run: Option<String>,
    /// Label of the run with the highest mean
    pub slowest_run: Option<String>,
}

/// Collects suite results, prints the summary and writes the JSON report
pub struct ResultsManager {
    output_file: Option<PathBuf>,
    run_id: String,
    results: Vec<SuiteResults>,
}

impl ResultsManager {
    pub fn new(output_file: Option<&Path>) -> Result<Self> {
        if let Some(parent) = output_file.and_then(Path::parent) {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                anyhow::bail!("Output directory {:?} does not exist", parent);
            }
        }

        Ok(Self {
            output_file: output_file.map(Path::to_path_buf),
            run_id: generate_run_id(),
            results: Vec::new(),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn results(&self) -> &[SuiteResults] {
        &self.results
    }

    pub fn add_results(&mut self, results: SuiteResults) {
        info!(
            "Adding results for {} suite ({} runs, {} batches)",
            results.suite,
            results.runs.len(),
            results.batches.len()
        );
        self.results.push(results);
    }

    /// Print the summary table and write the report, if one was requested
    pub fn finalize(&self) -> Result<()> {
        info!("Finalizing benchmark results");
        for line in self.summary_lines() {
            info!("{}", line);
        }

        let total_failures = self.results.iter().map(SuiteResults::failure_count).sum::<usize>();
        if total_failures > 0 {
            warn!("{} failures recorded across all suites", total_failures);
        }

        if let Some(ref output_file) = self.output_file {
            self.write_final_results(output_file)?;
            info!("Results written to: {:?}", output_file);
        }
        Ok(())
    }

    fn write_final_results(&self, output_file: &Path) -> Result<()> {
        let final_results = FinalBenchmarkResults {
            metadata: BenchmarkMetadata {
                run_id: self.run_id.clone(),
                version: crate::VERSION.to_string(),
                timestamp: chrono::Utc::now(),
                total_suites: self.results.len(),
                system_info: SystemInfo::default(),
            },
            results: self.results.clone(),
            summary: self.calculate_overall_summary(),
        };

        let json = serde_json::to_string_pretty(&final_results)?;
        std::fs::write(output_file, json)
            .with_context(|| format!("Failed to write results to {:?}", output_file))?;
        Ok(())
    }

    fn calculate_overall_summary(&self) -> OverallSummary {
        let runs_with_mean = || {
            self.results
                .iter()
                .flat_map(|s| s.runs.iter())
                .filter_map(|r| r.mean_ms.map(|mean| (mean, r)))
        };

        OverallSummary {
            total_runs: self.results.iter().map(|s| s.runs.len()).sum(),
            total_batches: self.results.iter().map(|s| s.batches.len()).sum(),
            total_failures: self.results.iter().map(SuiteResults::failure_count).sum(),
            fastest_run: runs_with_mean()
                .min_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(_, r)| r.label.clone()),
            slowest_run: runs_with_mean()
                .max_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(_, r)| r.label.clone()),
        }
    }

    /// Rendered summary table, one string per line
    ///
    /// Sequential runs and concurrent batches report different figures, so
    /// batches get their own section with its own header.
    pub fn summary_lines(&self) -> Vec<String> {
        const RUN_WIDTHS: [usize; 6] = [16, 44, 5, 11, 11, 11];
        const BATCH_WIDTHS: [usize; 5] = [16, 44, 5, 11, 11];

        let mut lines = vec![
            format_table_separator(&RUN_WIDTHS),
            format_table_row(&["Suite", "Benchmark", "Runs", "Mean", "Min", "Max"], &RUN_WIDTHS),
            format_table_separator(&RUN_WIDTHS),
        ];
        for suite in &self.results {
            let suite_name = suite.suite.to_string();
            for run in &suite.runs {
                let runs = format!("{}/{}", run.count, run.attempted);
                let mean = optional_ms(run.mean_ms);
                let min = optional_ms(run.min_ms);
                let max = optional_ms(run.max_ms);
                lines.push(format_table_row(
                    &[&suite_name, &run.label, &runs, &mean, &min, &max],
                    &RUN_WIDTHS,
                ));
            }
        }
        lines.push(format_table_separator(&RUN_WIDTHS));

        let batches: Vec<(String, &BatchSummary)> = self
            .results
            .iter()
            .flat_map(|s| s.batches.iter().map(move |b| (s.suite.to_string(), b)))
            .collect();
        if batches.is_empty() {
            return lines;
        }

        lines.push(format_table_row(
            &["Suite", "Batch", "Units", "Total", "Per unit"],
            &BATCH_WIDTHS,
        ));
        lines.push(format_table_separator(&BATCH_WIDTHS));
        for (suite_name, batch) in batches {
            let units = batch.unit_count.to_string();
            let total = format!("{:.3}ms", batch.total_ms);
            let per_unit = format!("{:.3}ms", batch.per_unit_average_ms);
            lines.push(format_table_row(
                &[&suite_name, &batch.label, &units, &total, &per_unit],
                &BATCH_WIDTHS,
            ));
        }
        lines.push(format_table_separator(&BATCH_WIDTHS));
        lines
    }
}

fn optional_ms(ms: Option<f64>) -> String {
    ms.map_or_else(|| "n/a".to_string(), |ms| format!("{:.3}ms", ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::BenchmarkRunner;
    use tempfile::TempDir;

    fn cpu_results() -> SuiteResults {
        let mut results = SuiteResults::new(Suite::Cpu);
        let outcome = BenchmarkRunner::new(3).run("fast", || Ok(())).unwrap();
        results.add_run(&outcome, &[50.0, 99.0]).unwrap();

        let calls = std::cell::Cell::new(0);
        let outcome = BenchmarkRunner::new(2)
            .run("flaky", || {
                calls.set(calls.get() + 1);
                if calls.get() == 1 {
                    anyhow::bail!("first call fails");
                }
                std::thread::sleep(Duration::from_millis(2));
                Ok(())
            })
            .unwrap();
        results.add_run(&outcome, &[50.0]).unwrap();
        results.finish()
    }

    #[test]
    fn test_run_summary_from_outcome() {
        let results = cpu_results();
        let fast = &results.runs[0];
        assert_eq!(fast.label, "fast");
        assert_eq!((fast.count, fast.attempted), (3, 3));
        assert_eq!(fast.percentiles.len(), 2);
        assert!(fast.failures.is_empty());

        let flaky = &results.runs[1];
        assert_eq!((flaky.count, flaky.attempted), (1, 2));
        assert_eq!(flaky.failures, vec![(1, "first call fails".to_string())]);
        assert_eq!(results.failure_count(), 1);
    }

    #[test]
    fn test_run_summary_without_successes() {
        let outcome = BenchmarkRunner::new(2)
            .run("broken", || -> Result<()> { anyhow::bail!("nope") })
            .unwrap();
        let summary = RunSummary::from_outcome(&outcome, &[50.0]).unwrap();
        assert_eq!(summary.count, 0);
        assert!(summary.mean_ms.is_none());
        assert!(summary.percentiles.is_empty());
    }

    #[test]
    fn test_note_attaches_to_last_run() {
        let mut results = cpu_results();
        results.note("JSON size: 12 characters");
        assert!(results.runs[0].notes.is_empty());
        assert_eq!(results.runs[1].notes, vec!["JSON size: 12 characters"]);
    }

    #[test]
    fn test_results_manager_without_output_file() {
        let mut manager = ResultsManager::new(None).unwrap();
        manager.add_results(cpu_results());
        assert_eq!(manager.results().len(), 1);
        assert!(manager.finalize().is_ok());

        let lines = manager.summary_lines();
        assert!(lines.iter().any(|l| l.contains("fast")));
        assert!(lines.iter().any(|l| l.contains("CPU Intensive")));
    }

    #[test]
    fn test_batches_have_their_own_columns() {
        let mut results = SuiteResults::new(Suite::FileIo);
        results.add_batch(
            "Concurrent (10 files)",
            &BatchResult {
                unit_count: 10,
                phases: vec![PhaseKind::Write, PhaseKind::Read],
                total_duration: Duration::from_millis(20),
                per_unit_average: Duration::from_millis(2),
                unit_failures: Vec::new(),
                cleanup_failures: Vec::new(),
            },
        );
        let mut manager = ResultsManager::new(None).unwrap();
        manager.add_results(results);

        let lines = manager.summary_lines();
        let header = lines.iter().position(|l| l.contains("Per unit")).unwrap();
        assert!(lines[header].contains("Total"));
        let row = lines
            .iter()
            .find(|l| l.contains("Concurrent (10 files)"))
            .unwrap();
        let total_at = row.find("20.000ms").unwrap();
        let per_unit_at = row.find("2.000ms").unwrap();
        assert_eq!(total_at, lines[header].find("Total").unwrap());
        assert!(per_unit_at > total_at);
    }

    #[test]
    fn test_no_batch_section_without_batches() {
        let mut manager = ResultsManager::new(None).unwrap();
        manager.add_results(cpu_results());
        assert!(!manager.summary_lines().iter().any(|l| l.contains("Per unit")));
    }

    #[test]
    fn test_results_manager_writes_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");

        let mut manager = ResultsManager::new(Some(&path)).unwrap();
        manager.add_results(cpu_results());
        manager.finalize().unwrap();

        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(report["metadata"]["run_id"], manager.run_id());
        assert_eq!(report["metadata"]["total_suites"], 1);
        assert_eq!(report["summary"]["total_runs"], 2);
        assert_eq!(report["summary"]["total_failures"], 1);
        assert_eq!(report["results"][0]["runs"][0]["label"], "fast");
    }

    #[test]
    fn test_results_manager_rejects_missing_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("report.json");
        assert!(ResultsManager::new(Some(&path)).is_err());
    }

    #[test]
    fn test_system_info_default() {
        let info = SystemInfo::default();
        assert!(!info.os.is_empty());
        assert!(!info.architecture.is_empty());
        assert!(info.cpu_cores > 0);
        assert_eq!(info.benchmark_version, crate::VERSION);
    }
}
