//! # drift-rs
//!
//! A Lagrangian particle tracking library for ocean flow fields.
//!
//! This crate provides the core building blocks for drift simulations:
//! - Rectilinear and curvilinear horizontal grids with cell search
//! - Gridded fields with bilinear space / linear time interpolation
//! - Nested fields that fall back from fine to coarse resolution
//! - Particle sets with user variables and lifecycle status
//! - Kernels (built-in advection schemes and user-defined steps)
//! - Interpreted and compiled kernel execution backends
//! - A step-synchronous time loop with periodic trajectory output

pub mod error;
pub mod field;
pub mod grid;
pub mod io;
pub mod kernel;
pub mod particle;
pub mod simulation;
pub mod types;

// Re-export main types for convenience
pub use error::{KernelError, SampleError, SimulationError};
pub use field::{
    Field, FieldSample, FieldSet, InterpMethod, NestedField, NestedSample, Sample, SetMember,
};
pub use grid::{Axis, CellLocation, CurvilinearGrid, Grid, GridIndex, RectilinearGrid, TimeAxis};
pub use io::{ParticleRecord, TrajectoryError, TrajectoryRecorder, TrajectorySnapshot};
pub use kernel::{
    AdvectionEE, AdvectionRK4, Evaluator, ExecutionMode, FnKernel, Kernel, KernelContext,
    Sequence, StepOutcome,
};
pub use particle::{Particle, ParticleSet, ParticleStatus, VariableDef};
pub use simulation::{run, RunState, SimulationConfig, SimulationResult};
pub use types::{Bounds2D, ParticleId};
