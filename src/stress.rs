//! # Concurrent Stress Runner
//!
//! Drives a batch of identical file operations in parallel, one unit per named
//! resource, and reports a single wall-clock figure for the whole batch.
//!
//! ## Execution Model
//!
//! A batch is an ordered list of phases (`write`, `read`). Each phase fans out
//! one tokio task per unit into a [`PhaseBarrier`] and joins every one of them
//! before the next phase starts, so all writes of the batch complete before
//! any read begins. A unit that fails (I/O error, unexpected content, panic)
//! is recorded and never cancels its siblings.
//!
//! ## Resource Lifetime
//!
//! Before the first worker starts, a cleanup guard takes ownership of every
//! unit's resource name. The guard is released on every exit path of
//! [`StressRunner::run_batch`]; if the batch future is dropped mid-flight the
//! guard's `Drop` schedules the removal on the runtime instead. Removing a name
//! that was never written is a no-op.

use crate::{
    error::SetupError,
    metrics::utils::format_ms,
    store::ResourceStore,
    timer::{as_millis_f64, Stopwatch},
};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Upper bound on the number of units in one batch
pub const MAX_UNITS: usize = 4096;

/// One global step of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    /// Create or overwrite the unit's resource with its payload
    Write,
    /// Read the unit's resource back and compare it with its payload
    Read,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseKind::Write => write!(f, "write"),
            PhaseKind::Read => write!(f, "read"),
        }
    }
}

/// Maps a unit index onto the name of its resource
///
/// Implementations must be deterministic and injective; the runner rejects a
/// batch whose namer hands two units names that the store maps onto the same
/// slot (see [`ResourceStore::slot_key`]).
pub trait ResourceNamer: Send + Sync {
    fn name(&self, index: usize) -> String;
}

impl<F> ResourceNamer for F
where
    F: Fn(usize) -> String + Send + Sync,
{
    fn name(&self, index: usize) -> String {
        self(index)
    }
}

/// Names units `<prefix>_concurrent_<index>.txt`
#[derive(Debug, Clone)]
pub struct PrefixNamer {
    prefix: String,
}

impl PrefixNamer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl ResourceNamer for PrefixNamer {
    fn name(&self, index: usize) -> String {
        format!("{}_concurrent_{}.txt", self.prefix, index)
    }
}

type PayloadFn = dyn Fn(usize) -> Vec<u8> + Send + Sync;

/// Bytes each unit writes, and expects to read back
#[derive(Clone)]
pub enum Payload {
    /// Every unit uses the same bytes
    Uniform(Arc<[u8]>),
    /// Bytes derived from the unit index; must be deterministic
    PerUnit(Arc<PayloadFn>),
}

impl Payload {
    pub fn uniform(bytes: impl Into<Vec<u8>>) -> Self {
        Payload::Uniform(bytes.into().into())
    }

    pub fn per_unit<F>(f: F) -> Self
    where
        F: Fn(usize) -> Vec<u8> + Send + Sync + 'static,
    {
        Payload::PerUnit(Arc::new(f))
    }

    fn for_unit(&self, index: usize) -> Arc<[u8]> {
        match self {
            Payload::Uniform(bytes) => Arc::clone(bytes),
            Payload::PerUnit(f) => f(index).into(),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Uniform(bytes) => write!(f, "Uniform({} bytes)", bytes.len()),
            Payload::PerUnit(_) => write!(f, "PerUnit(..)"),
        }
    }
}

/// Description of one batch
#[derive(Debug, Clone)]
pub struct BatchSpec<N> {
    pub unit_count: usize,
    pub phases: Vec<PhaseKind>,
    pub namer: N,
    pub payload: Payload,
}

/// Why a unit failed within a phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The store reported an error
    Io { message: String },
    /// The unit read back something other than what it wrote
    Mismatch {
        expected_len: usize,
        actual_len: usize,
    },
    /// The worker panicked before reporting
    Panicked,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Io { message } => write!(f, "{}", message),
            FailureReason::Mismatch {
                expected_len,
                actual_len,
            } => write!(
                f,
                "content mismatch (expected {} bytes, read {} bytes)",
                expected_len, actual_len
            ),
            FailureReason::Panicked => write!(f, "worker panicked"),
        }
    }
}

/// A unit that failed one phase of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFailure {
    pub unit: usize,
    pub phase: PhaseKind,
    pub reason: FailureReason,
}

/// A resource that could not be removed after the batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupFailure {
    pub unit: usize,
    pub name: String,
    pub error: String,
}

/// Timing outcome of a batch
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub unit_count: usize,
    pub phases: Vec<PhaseKind>,
    /// Wall-clock time across all phases, barrier waits included
    pub total_duration: Duration,
    /// `total_duration / unit_count`
    pub per_unit_average: Duration,
    pub unit_failures: Vec<UnitFailure>,
    pub cleanup_failures: Vec<CleanupFailure>,
}

impl BatchResult {
    pub fn total_ms(&self) -> f64 {
        as_millis_f64(self.total_duration)
    }

    pub fn per_unit_average_ms(&self) -> f64 {
        as_millis_f64(self.per_unit_average)
    }

    /// No unit failed and every resource was removed
    pub fn is_clean(&self) -> bool {
        self.unit_failures.is_empty() && self.cleanup_failures.is_empty()
    }
}

/// Task group for one phase; joins every worker it spawned
struct PhaseBarrier {
    phase: PhaseKind,
    expected: usize,
    workers: JoinSet<(usize, Result<(), FailureReason>)>,
}

impl PhaseBarrier {
    fn new(phase: PhaseKind, expected: usize) -> Self {
        Self {
            phase,
            expected,
            workers: JoinSet::new(),
        }
    }

    fn spawn<F>(&mut self, unit: usize, work: F)
    where
        F: Future<Output = Result<(), FailureReason>> + Send + 'static,
    {
        self.workers.spawn(async move { (unit, work.await) });
    }

    /// Block until every spawned worker has returned, then report failures
    ///
    /// Workers that panicked never report their unit; they are attributed
    /// afterwards to whichever units did not report.
    async fn wait(mut self) -> Result<Vec<UnitFailure>, SetupError> {
        let mut reported = vec![false; self.expected];
        let mut failures = Vec::new();
        let mut completed = 0usize;
        let mut lost = 0usize;

        while let Some(joined) = self.workers.join_next().await {
            match joined {
                Ok((unit, outcome)) => {
                    completed += 1;
                    reported[unit] = true;
                    if let Err(reason) = outcome {
                        warn!("Unit {} failed {} phase: {}", unit, self.phase, reason);
                        failures.push(UnitFailure {
                            unit,
                            phase: self.phase,
                            reason,
                        });
                    }
                }
                Err(e) if e.is_panic() => {
                    completed += 1;
                    warn!("A {} worker panicked", self.phase);
                }
                Err(e) => {
                    lost += 1;
                    error!("A {} worker was cancelled: {}", self.phase, e);
                }
            }
        }

        if lost > 0 {
            return Err(SetupError::WorkersUnavailable {
                phase: self.phase,
                missing: lost,
            });
        }
        debug_assert_eq!(completed, self.expected);

        for (unit, _) in reported.iter().enumerate().filter(|(_, done)| !**done) {
            failures.push(UnitFailure {
                unit,
                phase: self.phase,
                reason: FailureReason::Panicked,
            });
        }
        failures.sort_by_key(|f| f.unit);
        Ok(failures)
    }
}

/// Removes every resource of a batch, on release or on drop
struct CleanupGuard {
    store: Arc<dyn ResourceStore>,
    names: Arc<[String]>,
    armed: bool,
}

impl CleanupGuard {
    fn arm(store: Arc<dyn ResourceStore>, names: Arc<[String]>) -> Self {
        Self {
            store,
            names,
            armed: true,
        }
    }

    async fn release(mut self) -> Vec<CleanupFailure> {
        self.armed = false;
        remove_all(self.store.as_ref(), &self.names).await
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let store = Arc::clone(&self.store);
        let names = Arc::clone(&self.names);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(
                    "Batch interrupted, removing {} resources in the background",
                    names.len()
                );
                handle.spawn(async move {
                    remove_all(store.as_ref(), &names).await;
                });
            }
            Err(_) => error!(
                "Batch interrupted outside a runtime, {} resources left in {}",
                names.len(),
                store.describe()
            ),
        }
    }
}

async fn remove_all(store: &dyn ResourceStore, names: &[String]) -> Vec<CleanupFailure> {
    let mut failures = Vec::new();
    let mut removed = 0usize;

    for (unit, name) in names.iter().enumerate() {
        match store.remove(name).await {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(e) => {
                warn!("Failed to remove resource {:?}: {:#}", name, e);
                failures.push(CleanupFailure {
                    unit,
                    name: name.clone(),
                    error: format!("{:#}", e),
                });
            }
        }
    }

    debug!("Cleanup removed {} of {} resources", removed, names.len());
    failures
}

async fn run_unit(
    store: Arc<dyn ResourceStore>,
    phase: PhaseKind,
    name: String,
    payload: Arc<[u8]>,
) -> Result<(), FailureReason> {
    let io = |e: anyhow::Error| FailureReason::Io {
        message: format!("{:#}", e),
    };

    match phase {
        PhaseKind::Write => store.write(&name, &payload).await.map_err(io),
        PhaseKind::Read => {
            let actual = store.read(&name).await.map_err(io)?;
            if actual[..] == payload[..] {
                Ok(())
            } else {
                Err(FailureReason::Mismatch {
                    expected_len: payload.len(),
                    actual_len: actual.len(),
                })
            }
        }
    }
}

/// Runs concurrent batches against a resource store
pub struct StressRunner {
    store: Arc<dyn ResourceStore>,
}

impl StressRunner {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ResourceStore> {
        &self.store
    }

    /// Run one batch to completion
    ///
    /// Unit failures are recorded in the returned [`BatchResult`]. An `Err` is
    /// returned only when the batch could not be set up or its workers were
    /// lost; in that case every resource the batch may have created has been
    /// removed already.
    pub async fn run_batch<N: ResourceNamer>(
        &self,
        spec: &BatchSpec<N>,
    ) -> Result<BatchResult, SetupError> {
        let names = self.plan(spec)?;
        let unit_count = names.len();

        self.store
            .prepare()
            .await
            .map_err(|source| SetupError::StorePreparation {
                store: self.store.describe(),
                source,
            })?;

        debug!(
            "Starting batch: {} units, phases {:?}, payload {:?}, store {}",
            unit_count,
            spec.phases,
            spec.payload,
            self.store.describe()
        );

        let guard = CleanupGuard::arm(Arc::clone(&self.store), Arc::clone(&names));
        let stopwatch = Stopwatch::start();
        let mut unit_failures = Vec::new();

        for &phase in &spec.phases {
            let mut barrier = PhaseBarrier::new(phase, unit_count);
            for (unit, name) in names.iter().enumerate() {
                barrier.spawn(
                    unit,
                    run_unit(
                        Arc::clone(&self.store),
                        phase,
                        name.clone(),
                        spec.payload.for_unit(unit),
                    ),
                );
            }

            match barrier.wait().await {
                Ok(failures) => {
                    debug!(
                        "{} phase joined {} workers ({} failed)",
                        phase,
                        unit_count,
                        failures.len()
                    );
                    unit_failures.extend(failures);
                }
                Err(e) => {
                    let cleanup_failures = guard.release().await;
                    error!(
                        "Batch aborted: {} ({} resources could not be removed)",
                        e,
                        cleanup_failures.len()
                    );
                    return Err(e);
                }
            }
        }

        let total_duration = stopwatch.elapsed();
        // unit_count <= MAX_UNITS, well inside u32
        let per_unit_average = total_duration / unit_count as u32;
        let cleanup_failures = guard.release().await;

        info!(
            "Batch of {} units completed in {} ({} per unit, {} unit failures)",
            unit_count,
            format_ms(total_duration),
            format_ms(per_unit_average),
            unit_failures.len()
        );

        Ok(BatchResult {
            unit_count,
            phases: spec.phases.clone(),
            total_duration,
            per_unit_average,
            unit_failures,
            cleanup_failures,
        })
    }

    /// Validate the batch and resolve every unit's resource name
    fn plan<N: ResourceNamer>(&self, spec: &BatchSpec<N>) -> Result<Arc<[String]>, SetupError> {
        if spec.unit_count == 0 || spec.unit_count > MAX_UNITS {
            return Err(SetupError::InvalidUnitCount {
                count: spec.unit_count,
                max: MAX_UNITS,
            });
        }
        if spec.phases.is_empty() {
            return Err(SetupError::NoPhases);
        }

        let mut owners: HashMap<String, usize> = HashMap::with_capacity(spec.unit_count);
        let mut names = Vec::with_capacity(spec.unit_count);

        for unit in 0..spec.unit_count {
            let name = spec.namer.name(unit);
            self.store
                .validate_name(&name)
                .map_err(|reason| SetupError::InvalidResourceName {
                    name: name.clone(),
                    store: self.store.describe(),
                    reason,
                })?;
            let key = self.store.slot_key(&name);
            if let Some(&first) = owners.get(&key) {
                return Err(SetupError::DuplicateResource {
                    first,
                    second: unit,
                    name,
                });
            }
            owners.insert(key, unit);
            names.push(name);
        }

        Ok(names.into())
    }
}
