//! Particle collections and their lifecycle.

use std::sync::Arc;

use crate::error::SimulationError;
use crate::field::FieldSet;
use crate::io::TrajectoryRecorder;
use crate::kernel::Kernel;
use crate::simulation::{run, SimulationConfig, SimulationResult};
use crate::types::ParticleId;

use super::{Particle, ParticleStatus};

/// Declaration of a user particle variable: a named scalar initialized
/// to the same value on every released particle.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableDef {
    /// Variable name, used for output column headers and slot lookup.
    pub name: String,
    /// Initial value assigned at release.
    pub initial: f64,
}

impl VariableDef {
    /// Declare a variable.
    pub fn new(name: impl Into<String>, initial: f64) -> Self {
        Self {
            name: name.into(),
            initial,
        }
    }
}

/// An unordered collection of particles sharing one [`FieldSet`].
///
/// The set owns particle lifecycle (release, removal, status flags) and
/// drives time stepping through [`ParticleSet::execute`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use drift_rs::field::{Field, FieldSet};
/// use drift_rs::grid::{Grid, RectilinearGrid};
/// use drift_rs::kernel::AdvectionEE;
/// use drift_rs::particle::ParticleSet;
/// use drift_rs::simulation::SimulationConfig;
///
/// let grid = Arc::new(Grid::Rectilinear(
///     RectilinearGrid::uniform(0.0, 100.0, 0.0, 100.0, 11, 11),
/// ));
/// let fieldset = Arc::new(FieldSet::from_velocities(
///     Field::from_fn("U", Arc::clone(&grid), |_, _, _| 1.0),
///     Field::from_fn("V", grid, |_, _, _| 0.0),
/// ));
///
/// let mut pset = ParticleSet::from_list(fieldset, &[10.0], &[50.0]);
/// let result = pset.execute(&AdvectionEE, &SimulationConfig::new(10.0, 1.0));
/// assert!(result.is_ok());
/// assert!((pset.particles()[0].lon - 20.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug)]
pub struct ParticleSet {
    fieldset: Arc<FieldSet>,
    variables: Vec<VariableDef>,
    particles: Vec<Particle>,
    next_id: ParticleId,
}

impl ParticleSet {
    /// Create an empty set over a field set.
    pub fn new(fieldset: Arc<FieldSet>) -> Self {
        Self {
            fieldset,
            variables: Vec::new(),
            particles: Vec::new(),
            next_id: ParticleId::ZERO,
        }
    }

    /// Declare user variables. Must happen before any release.
    ///
    /// # Panics
    ///
    /// Panics if particles were already released.
    pub fn with_variables(mut self, variables: Vec<VariableDef>) -> Self {
        assert!(
            self.particles.is_empty(),
            "variables must be declared before releasing particles"
        );
        self.variables = variables;
        self
    }

    /// Create a set with one particle per `(lon, lat)` pair, released
    /// at time 0 and the surface.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate slices differ in length.
    pub fn from_list(fieldset: Arc<FieldSet>, lons: &[f64], lats: &[f64]) -> Self {
        assert_eq!(lons.len(), lats.len(), "lon/lat lists must match");
        let mut set = Self::new(fieldset);
        for (&lon, &lat) in lons.iter().zip(lats.iter()) {
            set.release(lon, lat);
        }
        set
    }

    /// Release a particle at the surface at time 0.
    pub fn release(&mut self, lon: f64, lat: f64) -> ParticleId {
        self.release_at(lon, lat, 0.0, 0.0)
    }

    /// Release a particle at an explicit depth and start time.
    ///
    /// Particles released with a later start time wait until the
    /// simulation clock reaches them.
    pub fn release_at(&mut self, lon: f64, lat: f64, depth: f64, time: f64) -> ParticleId {
        let id = self.next_id;
        self.next_id = id.next();
        let vars = self.variables.iter().map(|v| v.initial).collect();
        self.particles.push(Particle::new(
            id,
            lon,
            lat,
            depth,
            time,
            vars,
            self.fieldset.n_grids(),
        ));
        id
    }

    /// The shared field set.
    pub fn fieldset(&self) -> &Arc<FieldSet> {
        &self.fieldset
    }

    /// Declared user variables.
    pub fn variables(&self) -> &[VariableDef] {
        &self.variables
    }

    /// Slot of a declared variable by name.
    pub fn var_slot(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name == name)
    }

    /// Number of particles, regardless of status.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether the set holds no particles.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Number of particles still advancing.
    pub fn n_active(&self) -> usize {
        self.particles.iter().filter(|p| p.is_active()).count()
    }

    /// Number of particles with a given status.
    pub fn n_with_status(&self, status: ParticleStatus) -> usize {
        self.particles
            .iter()
            .filter(|p| p.status == status)
            .count()
    }

    /// All particles, including out-of-bounds and deleted ones.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub(crate) fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Particle by id.
    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.iter().find(|p| p.id == id)
    }

    /// Remove a particle from the set entirely.
    pub fn remove(&mut self, id: ParticleId) -> Option<Particle> {
        let idx = self.particles.iter().position(|p| p.id == id)?;
        Some(self.particles.remove(idx))
    }

    /// Advance the set through the kernel for the configured runtime.
    ///
    /// Equivalent to [`crate::simulation::run`] without trajectory
    /// output.
    pub fn execute(
        &mut self,
        kernel: &dyn Kernel,
        config: &SimulationConfig,
    ) -> Result<SimulationResult, SimulationError> {
        run(self, kernel, config, None)
    }

    /// Advance the set, recording trajectory snapshots at the
    /// configured output interval.
    pub fn execute_with_output(
        &mut self,
        kernel: &dyn Kernel,
        config: &SimulationConfig,
        recorder: &mut TrajectoryRecorder,
    ) -> Result<SimulationResult, SimulationError> {
        run(self, kernel, config, Some(recorder))
    }
}
