//! Simulation runner implementation.
//!
//! Drives a [`ParticleSet`] through a kernel for a configured runtime:
//! step-synchronous (every active particle finishes step N before any
//! particle starts step N+1), with buffered trajectory output at the
//! end of a step only, so cancelling or aborting a run never leaves a
//! partial-step snapshot behind.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::{KernelError, SimulationError};
use crate::io::TrajectoryRecorder;
use crate::kernel::{Evaluator, ExecutionMode, Kernel, StepOutcome};
use crate::particle::{Particle, ParticleSet, ParticleStatus};
use crate::types::ParticleId;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Clock comparison tolerance, relative to a step.
const TIME_EPS: f64 = 1e-9;

// =============================================================================
// Simulation Configuration
// =============================================================================

/// Configuration for a simulation run.
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// Total simulated duration, always a positive quantity (the sign
    /// of `dt` decides the direction).
    pub runtime: f64,
    /// Timestep; negative advects backwards in time, zero makes the
    /// run a no-op.
    pub dt: f64,
    /// Kernel execution backend.
    pub mode: ExecutionMode,
    /// Snapshot interval for trajectory output; `None` records only
    /// when the caller asks.
    pub output_interval: Option<f64>,
    /// Hard cap on the number of steps.
    pub max_steps: Option<usize>,
    /// Interpreted mode only: seed grid searches from the particle's
    /// cached cell.
    pub reuse_search_hints: bool,
    /// Whether to print per-step progress to stdout.
    pub verbose: bool,
}

impl SimulationConfig {
    /// Create a configuration with the given runtime and timestep.
    pub fn new(runtime: f64, dt: f64) -> Self {
        Self {
            runtime,
            dt,
            mode: ExecutionMode::default(),
            output_interval: None,
            max_steps: None,
            reuse_search_hints: false,
            verbose: false,
        }
    }

    /// Select the kernel execution backend.
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Record a trajectory snapshot every `interval` time units.
    pub fn with_output_interval(mut self, interval: f64) -> Self {
        self.output_interval = Some(interval);
        self
    }

    /// Cap the number of steps.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Interpreted mode: pass cached cell indices into the grid search.
    pub fn with_hint_reuse(mut self, reuse: bool) -> Self {
        self.reuse_search_hints = reuse;
        self
    }

    /// Enable verbose progress output.
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    fn validate(&self) -> Result<(), SimulationError> {
        if !self.dt.is_finite() {
            return Err(SimulationError::InvalidConfig {
                reason: format!("dt must be finite, got {}", self.dt),
            });
        }
        if !self.runtime.is_finite() || self.runtime < 0.0 {
            return Err(SimulationError::InvalidConfig {
                reason: format!("runtime must be finite and non-negative, got {}", self.runtime),
            });
        }
        if let Some(interval) = self.output_interval {
            if !(interval > 0.0) {
                return Err(SimulationError::InvalidConfig {
                    reason: format!("output interval must be positive, got {interval}"),
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// Simulation Result
// =============================================================================

/// Terminal state of a simulation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Reached the configured runtime, the step cap, or ran out of
    /// active particles.
    Completed,
    /// A kernel failed fatally mid-run. Recorded output holds only the
    /// whole steps taken before the failure, and
    /// [`SimulationResult::error`] carries the cause.
    Aborted,
}

/// Result of a simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// How the run ended.
    pub state: RunState,
    /// Simulation time reached by the clock.
    pub final_time: f64,
    /// Steps taken.
    pub n_steps: usize,
    /// Particles still active at the end.
    pub n_active: usize,
    /// Particles flagged out of bounds during the run.
    pub n_out_of_bounds: usize,
    /// Particles deleted by kernels during the run.
    pub n_deleted: usize,
    /// Wall-clock seconds spent in the loop.
    pub wall_time: f64,
    /// The fatal kernel failure that aborted the run; `None` when the
    /// run completed.
    pub error: Option<SimulationError>,
}

// =============================================================================
// Runner
// =============================================================================

/// Advance `pset` through `kernel` according to `config`.
///
/// With a recorder, a snapshot is taken at the start time and then at
/// every output-interval boundary the clock crosses, always after the
/// step completes for every particle.
///
/// # Errors
///
/// [`SimulationError::InvalidConfig`] for unusable configurations and
/// [`SimulationError::Prepare`] when the kernel binds to a missing
/// field. A kernel failing fatally mid-run is not an `Err`: the loop
/// stops after the last whole step and the result reports
/// [`RunState::Aborted`] with the failure in
/// [`SimulationResult::error`] (out-of-bounds particles are not fatal;
/// they are flagged and excluded instead).
pub fn run(
    pset: &mut ParticleSet,
    kernel: &dyn Kernel,
    config: &SimulationConfig,
    mut recorder: Option<&mut TrajectoryRecorder>,
) -> Result<SimulationResult, SimulationError> {
    config.validate()?;
    let start_wall = Instant::now();

    let oob_before = pset.n_with_status(ParticleStatus::OutOfBounds);
    let deleted_before = pset.n_with_status(ParticleStatus::Deleted);

    let fieldset = pset.fieldset().clone();
    let evaluator = Evaluator::new(config.mode, kernel, &fieldset)?
        .with_hint_reuse(config.reuse_search_hints);

    // The clock starts at the earliest active particle (latest when
    // advecting backwards).
    let sign = if config.dt < 0.0 { -1.0 } else { 1.0 };
    let start = pset
        .particles()
        .iter()
        .filter(|p| p.is_active())
        .map(|p| p.time)
        .reduce(|a, b| if (b - a) * sign < 0.0 { b } else { a });

    let Some(start) = start else {
        // Nothing to advance.
        return Ok(finish(pset, RunState::Completed, None, 0.0, 0, oob_before, deleted_before, start_wall));
    };

    if config.dt == 0.0 || config.runtime == 0.0 {
        if config.output_interval.is_some() {
            if let Some(rec) = recorder.as_deref_mut() {
                rec.record(pset, start);
            }
        }
        return Ok(finish(pset, RunState::Completed, None, start, 0, oob_before, deleted_before, start_wall));
    }

    let end = start + sign * config.runtime;
    let mut t = start;
    let mut n_steps = 0usize;
    // (next snapshot time, interval) when periodic output is on.
    let mut next_output = config.output_interval.map(|interval| (start, interval));

    info!(
        kernel = kernel.name(),
        mode = ?config.mode,
        particles = pset.len(),
        runtime = config.runtime,
        dt = config.dt,
        "starting simulation"
    );

    // Initial snapshot before any particle moves.
    if let Some((next, interval)) = next_output.as_mut() {
        if let Some(rec) = recorder.as_deref_mut() {
            rec.record(pset, t);
        }
        *next += sign * *interval;
    }

    let mut error = None;
    let state = loop {
        let remaining = (end - t) * sign;
        let tol = TIME_EPS * config.dt.abs();
        if remaining <= tol {
            break RunState::Completed;
        }
        if pset.n_active() == 0 {
            debug!("no active particles left");
            break RunState::Completed;
        }
        if let Some(max) = config.max_steps {
            if n_steps >= max {
                debug!(max, "step cap reached");
                break RunState::Completed;
            }
        }

        let dt_step = sign * remaining.min(config.dt.abs());
        let step_end = t + dt_step;

        if let Err((id, source)) = step_all(&evaluator, pset.particles_mut(), step_end, sign) {
            // Whole-step output only: nothing recorded for this step.
            warn!(particle = %id, error = %source, "aborting run");
            error = Some(SimulationError::Kernel {
                particle: id,
                source,
            });
            break RunState::Aborted;
        }

        t = step_end;
        n_steps += 1;

        if let Some((next, interval)) = next_output.as_mut() {
            if (t - *next) * sign >= -tol {
                if let Some(rec) = recorder.as_deref_mut() {
                    rec.record(pset, t);
                }
                *next += sign * *interval;
            }
        }

        if config.verbose {
            println!(
                "step {:6}: t = {:12.2}, active = {}",
                n_steps,
                t,
                pset.n_active()
            );
        }
    };

    let result = finish(pset, state, error, t, n_steps, oob_before, deleted_before, start_wall);
    info!(
        state = ?result.state,
        n_steps = result.n_steps,
        final_time = result.final_time,
        n_active = result.n_active,
        n_out_of_bounds = result.n_out_of_bounds,
        wall_time = result.wall_time,
        "simulation finished"
    );
    Ok(result)
}

#[allow(clippy::too_many_arguments)]
fn finish(
    pset: &ParticleSet,
    state: RunState,
    error: Option<SimulationError>,
    final_time: f64,
    n_steps: usize,
    oob_before: usize,
    deleted_before: usize,
    start_wall: Instant,
) -> SimulationResult {
    SimulationResult {
        state,
        final_time,
        n_steps,
        n_active: pset.n_active(),
        n_out_of_bounds: pset.n_with_status(ParticleStatus::OutOfBounds) - oob_before,
        n_deleted: pset.n_with_status(ParticleStatus::Deleted) - deleted_before,
        wall_time: start_wall.elapsed().as_secs_f64(),
        error,
    }
}

/// Advance every due particle to `step_end`.
///
/// A particle is due when it is active and its own clock lags the step
/// boundary; particles released with a later start time simply wait.
/// Per-step updates are independent, so the parallel build fans them
/// out across rayon workers without changing results.
#[cfg(not(feature = "parallel"))]
fn step_all(
    evaluator: &Evaluator<'_>,
    particles: &mut [Particle],
    step_end: f64,
    sign: f64,
) -> Result<(), (ParticleId, KernelError)> {
    for p in particles.iter_mut() {
        step_one(evaluator, p, step_end, sign)?;
    }
    Ok(())
}

#[cfg(feature = "parallel")]
fn step_all(
    evaluator: &Evaluator<'_>,
    particles: &mut [Particle],
    step_end: f64,
    sign: f64,
) -> Result<(), (ParticleId, KernelError)> {
    particles
        .par_iter_mut()
        .try_for_each(|p| step_one(evaluator, p, step_end, sign))
}

fn step_one(
    evaluator: &Evaluator<'_>,
    p: &mut Particle,
    step_end: f64,
    sign: f64,
) -> Result<(), (ParticleId, KernelError)> {
    if !p.is_active() {
        return Ok(());
    }
    let dt_p = step_end - p.time;
    if dt_p * sign <= 0.0 {
        return Ok(());
    }
    match evaluator.step_particle(p, p.time, dt_p) {
        Ok(StepOutcome::Advanced) => {
            p.time = step_end;
            Ok(())
        }
        Ok(StepOutcome::OutOfBounds) => {
            warn!(particle = %p.id, lat = p.lat, lon = p.lon, "particle left the domain");
            Ok(())
        }
        Ok(StepOutcome::Deleted) => {
            debug!(particle = %p.id, "particle deleted by kernel");
            Ok(())
        }
        Err(e) => Err((p.id, e)),
    }
}
