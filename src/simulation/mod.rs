//! The step-synchronous simulation loop.

mod runner;

pub use runner::{run, RunState, SimulationConfig, SimulationResult};
