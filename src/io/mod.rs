//! Trajectory output.

mod trajectory;

pub use trajectory::{ParticleRecord, TrajectoryError, TrajectoryRecorder, TrajectorySnapshot};
