//! # Utility Functions and Helper Module
//!
//! Helpers shared across the suite: human-readable formatting, validation of
//! user-supplied parameters, system information and table rendering for the
//! final summary.
//!
//! ## Usage Examples
//!
//! ```rust
//! use latency_bench::utils::*;
//! use std::time::Duration;
//!
//! // Format durations for display
//! let duration_str = format_duration(Duration::from_micros(1500));
//! assert_eq!(duration_str, "1.50ms");
//!
//! // Validate configuration parameters
//! # fn main() -> anyhow::Result<()> {
//! validate_iterations(5)?; // OK
//! validate_unit_count(50)?; // OK
//! # Ok(())
//! # }
//! ```

use crate::stress::MAX_UNITS;
use crate::workloads::cpu::MAX_RECURSIVE_INPUT;
use anyhow::Result;
use std::time::Duration;
use uuid::Uuid;

/// Generate a unique identifier for a benchmark invocation
///
/// Included in the JSON report so that reports from different invocations can
/// be told apart.
pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}

/// Format a duration in a human-readable way
///
/// ## Unit Selection Logic
///
/// - **Nanoseconds**: < 1,000 ns (e.g., "500ns")
/// - **Microseconds**: < 1,000,000 ns (e.g., "1.50μs")
/// - **Milliseconds**: < 1,000,000,000 ns (e.g., "25.75ms")
/// - **Seconds**: < 60 seconds (e.g., "5.25s")
/// - **Minutes and Hours**: For longer durations (e.g., "5m 30s", "2h 15m 30s")
///
/// ## Examples
///
/// ```rust
/// # use latency_bench::utils::format_duration;
/// # use std::time::Duration;
/// assert_eq!(format_duration(Duration::from_nanos(750)), "750ns");
/// assert_eq!(format_duration(Duration::from_nanos(1250)), "1.25μs");
/// assert_eq!(format_duration(Duration::from_micros(2500)), "2.50ms");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ns = duration.as_nanos();

    if total_ns < 1_000 {
        format!("{}ns", total_ns)
    } else if total_ns < 1_000_000 {
        format!("{:.2}μs", total_ns as f64 / 1_000.0)
    } else if total_ns < 1_000_000_000 {
        format!("{:.2}ms", total_ns as f64 / 1_000_000.0)
    } else if total_ns < 60_000_000_000 {
        format!("{:.2}s", total_ns as f64 / 1_000_000_000.0)
    } else {
        let seconds = duration.as_secs();
        let minutes = seconds / 60;
        let remaining_seconds = seconds % 60;

        if minutes < 60 {
            format!("{}m {}s", minutes, remaining_seconds)
        } else {
            let hours = minutes / 60;
            let remaining_minutes = minutes % 60;
            format!("{}h {}m {}s", hours, remaining_minutes, remaining_seconds)
        }
    }
}

/// Format bytes in a human-readable way (binary units)
///
/// ```rust
/// # use latency_bench::utils::format_bytes;
/// assert_eq!(format_bytes(512), "512 B");
/// assert_eq!(format_bytes(1536), "1.50 KB");
/// assert_eq!(format_bytes(2621440), "2.50 MB");
/// ```
pub fn format_bytes(bytes: usize) -> String {
    let bytes = bytes as f64;
    if bytes < 1024.0 {
        format!("{:.0} B", bytes)
    } else if bytes < 1024.0 * 1024.0 {
        format!("{:.2} KB", bytes / 1024.0)
    } else if bytes < 1024.0 * 1024.0 * 1024.0 {
        format!("{:.2} MB", bytes / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Validate a measured iteration count
pub fn validate_iterations(iterations: usize) -> Result<()> {
    if iterations == 0 {
        anyhow::bail!("Iteration count cannot be zero");
    }
    Ok(())
}

/// Validate the unit count of a concurrent stress batch
///
/// Each unit is a task and a file open at the same time, so the count is
/// capped at [`MAX_UNITS`].
pub fn validate_unit_count(units: usize) -> Result<()> {
    if units == 0 {
        anyhow::bail!("Unit count cannot be zero");
    }
    if units > MAX_UNITS {
        anyhow::bail!("Unit count {} is too high (maximum {})", units, MAX_UNITS);
    }
    Ok(())
}

/// Validate the line count of a generated test file
///
/// Each line is roughly 60 bytes; 10 million lines is about 600 MB.
pub fn validate_line_count(lines: usize) -> Result<()> {
    const MAX_LINES: usize = 10_000_000;

    if lines == 0 {
        anyhow::bail!("File size cannot be zero lines");
    }
    if lines > MAX_LINES {
        anyhow::bail!("File size {} lines is too large (maximum {})", lines, MAX_LINES);
    }
    Ok(())
}

/// Validate an input for the recursive and iterative Fibonacci runs
pub fn validate_fib_input(n: u32) -> Result<()> {
    if n > MAX_RECURSIVE_INPUT {
        anyhow::bail!(
            "Fibonacci input {} is too large (maximum {}, use --large-fib-inputs for bigger values)",
            n,
            MAX_RECURSIVE_INPUT
        );
    }
    Ok(())
}

/// Validate requested percentiles
pub fn validate_percentiles(percentiles: &[f64]) -> Result<()> {
    for &p in percentiles {
        if !(0.0..=100.0).contains(&p) {
            anyhow::bail!("Percentile {} is outside 0-100", p);
        }
    }
    Ok(())
}

/// Get the number of logical CPU cores available
pub fn get_cpu_cores() -> usize {
    num_cpus::get()
}

/// Render a table row with left-aligned, fixed-width columns
///
/// ```rust
/// # use latency_bench::utils::{format_table_row, format_table_separator};
/// let widths = [6, 4];
/// assert_eq!(format_table_separator(&widths), "+--------+------+");
/// assert_eq!(format_table_row(&["Suite", "Runs"], &widths), "| Suite  | Runs |");
/// ```
pub fn format_table_row(columns: &[&str], widths: &[usize]) -> String {
    let mut row = String::from("|");
    for (i, column) in columns.iter().enumerate() {
        let width = widths.get(i).copied().unwrap_or(10);
        row.push_str(&format!(" {:width$} |", column, width = width));
    }
    row
}

/// Render a table border matching [`format_table_row`]
pub fn format_table_separator(widths: &[usize]) -> String {
    let mut line = String::from("+");
    for &width in widths {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
    }
    line
}
