//! Error types for field sampling, kernel execution, and simulation runs.
//!
//! The taxonomy separates three severities:
//! - [`SampleError::OutOfBounds`] is recoverable inside a
//!   [`crate::field::NestedField`] fallback scan, and demotes the affected
//!   particle to out-of-bounds status when it reaches the kernel evaluator.
//! - [`SampleError::AllFieldsOutOfBounds`] is terminal for the affected
//!   particle only.
//! - Everything else (time extrapolation, unknown fields, user kernel
//!   failures) is fatal and aborts the run.

use thiserror::Error;

use crate::types::ParticleId;

/// Errors raised while sampling a field at a space-time point.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    /// The query point lies outside the field's horizontal extent.
    ///
    /// A nested field treats this as "try the next member"; a kernel
    /// evaluator treats it as terminal for the querying particle.
    #[error("point (lat {lat}, lon {lon}) outside the domain of field '{field}'")]
    OutOfBounds {
        /// Name of the field that rejected the point.
        field: String,
        /// Query latitude.
        lat: f64,
        /// Query longitude.
        lon: f64,
    },

    /// The query time lies outside the field's time axis.
    ///
    /// Unlike [`SampleError::OutOfBounds`] this does not trigger nested
    /// fallback: a point cannot recover its timestamp by switching to a
    /// coarser field, so the error propagates immediately.
    #[error("time {time} outside the time range of field '{field}'")]
    TimeExtrapolation {
        /// Name of the field that rejected the time.
        field: String,
        /// Query time.
        time: f64,
    },

    /// Every member of a nested field rejected the point as out of bounds.
    #[error("point outside every member of nested field '{field}'")]
    AllFieldsOutOfBounds {
        /// Name of the nested field.
        field: String,
    },
}

impl SampleError {
    /// Whether a nested-field scan may continue past this error.
    ///
    /// Only plain [`SampleError::OutOfBounds`] allows fallback to the
    /// next member; any other kind short-circuits the scan.
    pub fn allows_fallback(&self) -> bool {
        matches!(self, SampleError::OutOfBounds { .. })
    }

    /// Whether the error is terminal for the querying particle rather
    /// than fatal for the whole run.
    pub fn is_particle_local(&self) -> bool {
        matches!(
            self,
            SampleError::OutOfBounds { .. } | SampleError::AllFieldsOutOfBounds { .. }
        )
    }
}

/// Errors raised during kernel preparation or execution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// A field sample failed fatally inside the kernel.
    #[error("field sample failed: {0}")]
    Sample(#[from] SampleError),

    /// The kernel requested a field the field set does not contain.
    ///
    /// Raised at translation time by the compiled backend, or at first
    /// use by the interpreted backend.
    #[error("kernel references unknown field '{name}'")]
    UnknownField {
        /// The missing field name.
        name: String,
    },

    /// The kernel sampled a field slot beyond its own declaration.
    #[error("kernel sampled undeclared field slot {slot}")]
    UnknownSlot {
        /// The out-of-range slot.
        slot: usize,
    },

    /// The user kernel failed for a domain-specific reason.
    #[error("kernel '{kernel}' failed: {reason}")]
    Custom {
        /// Name of the failing kernel.
        kernel: String,
        /// Human-readable description of the failure.
        reason: String,
    },
}

/// Errors raised by the simulation layer.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// A kernel failed fatally for one particle. The run stops after
    /// the last whole step and reports this on the aborted result.
    #[error("kernel failed for particle {particle}: {source}")]
    Kernel {
        /// Particle being advanced when the kernel failed.
        particle: ParticleId,
        /// The underlying kernel error.
        #[source]
        source: KernelError,
    },

    /// Binding the kernel to the field set failed before the loop
    /// started (e.g. a required field is missing).
    #[error("kernel binding failed: {0}")]
    Prepare(#[from] KernelError),

    /// Writing trajectory output failed.
    #[error("trajectory output failed: {0}")]
    Output(#[from] crate::io::TrajectoryError),

    /// The run configuration is unusable.
    #[error("invalid simulation configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: String,
    },
}
