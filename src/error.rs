//! # Harness Setup Errors
//!
//! Failures of individual timed operations never leave the runners: they are
//! recorded next to the run or batch they belong to. The errors in this module
//! are the other kind, raised when the harness itself cannot start a run or a
//! batch. No statistics or batch result is produced when one of them is
//! returned.

use crate::stress::PhaseKind;
use thiserror::Error;

/// Errors that prevent a run or a batch from producing a result
#[derive(Debug, Error)]
pub enum SetupError {
    /// A sequential run was asked to perform zero iterations
    #[error("iteration count must be greater than zero")]
    InvalidIterations,

    /// A batch unit count outside `1..=max`
    #[error("unit count {count} is out of range (1..={max})")]
    InvalidUnitCount { count: usize, max: usize },

    /// A batch without any phase to run
    #[error("a batch needs at least one phase")]
    NoPhases,

    /// The namer mapped two unit indices onto the same resource
    #[error("units {first} and {second} were both assigned resource {name:?}")]
    DuplicateResource {
        first: usize,
        second: usize,
        name: String,
    },

    /// The store refused a resource name produced by the namer
    #[error("resource name {name:?} rejected by {store}: {reason}")]
    InvalidResourceName {
        name: String,
        store: String,
        reason: String,
    },

    /// The resource store could not be made ready for the batch
    #[error("failed to prepare {store}")]
    StorePreparation {
        store: String,
        #[source]
        source: anyhow::Error,
    },

    /// The runtime refused or cancelled the workers of a phase
    #[error("{phase} phase lost {missing} of its workers before they completed")]
    WorkersUnavailable { phase: PhaseKind, missing: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_error_messages() {
        assert_eq!(
            SetupError::InvalidIterations.to_string(),
            "iteration count must be greater than zero"
        );
        assert_eq!(
            SetupError::InvalidUnitCount { count: 0, max: 4096 }.to_string(),
            "unit count 0 is out of range (1..=4096)"
        );
        assert_eq!(
            SetupError::DuplicateResource {
                first: 1,
                second: 4,
                name: "same.txt".to_string(),
            }
            .to_string(),
            "units 1 and 4 were both assigned resource \"same.txt\""
        );
        assert_eq!(
            SetupError::WorkersUnavailable {
                phase: PhaseKind::Read,
                missing: 3,
            }
            .to_string(),
            "read phase lost 3 of its workers before they completed"
        );
    }

    #[test]
    fn test_store_preparation_keeps_source() {
        let err = SetupError::StorePreparation {
            store: "memory store".to_string(),
            source: anyhow::anyhow!("disk full"),
        };
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("disk full"));
    }
}
