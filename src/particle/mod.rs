//! Particles and particle sets.
//!
//! A [`Particle`] is position, user-declared scalar state, a status
//! flag, and the per-grid search hints the compiled kernel backend
//! maintains across timesteps. The [`ParticleSet`] owns the particles'
//! lifecycle and drives the simulation loop.

mod particle_set;

pub use particle_set::{ParticleSet, VariableDef};

use crate::grid::GridIndex;
use crate::types::ParticleId;

/// Lifecycle status of a particle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParticleStatus {
    /// Advanced every step.
    #[default]
    Active,
    /// Left the domain of every field it sampled; excluded from further
    /// stepping but retained in the set for inspection.
    OutOfBounds,
    /// Deleted by a kernel; excluded from stepping and from output.
    Deleted,
}

/// One Lagrangian particle.
#[derive(Clone, Debug)]
pub struct Particle {
    /// Stable identifier within the owning set.
    pub id: ParticleId,
    /// Current simulation time of the particle.
    pub time: f64,
    /// Depth coordinate (single-level fields ignore it).
    pub depth: f64,
    /// Latitude coordinate.
    pub lat: f64,
    /// Longitude coordinate.
    pub lon: f64,
    /// Lifecycle status.
    pub status: ParticleStatus,
    vars: Vec<f64>,
    /// Last known cell per field-set grid slot, the seed for the next
    /// grid search. Owned by the particle so the caching is per
    /// particle, not shared state.
    pub(crate) hints: Vec<Option<GridIndex>>,
}

impl Particle {
    pub(crate) fn new(
        id: ParticleId,
        lon: f64,
        lat: f64,
        depth: f64,
        time: f64,
        vars: Vec<f64>,
        n_grids: usize,
    ) -> Self {
        Self {
            id,
            time,
            depth,
            lat,
            lon,
            status: ParticleStatus::Active,
            vars,
            hints: vec![None; n_grids],
        }
    }

    /// Value of the user variable in `slot`, if declared.
    pub fn var(&self, slot: usize) -> Option<f64> {
        self.vars.get(slot).copied()
    }

    /// All user variable values, in declaration order.
    pub fn vars(&self) -> &[f64] {
        &self.vars
    }

    /// Set the user variable in `slot`; returns false for an
    /// undeclared slot.
    pub fn set_var(&mut self, slot: usize, value: f64) -> bool {
        match self.vars.get_mut(slot) {
            Some(v) => {
                *v = value;
                true
            }
            None => false,
        }
    }

    /// Flag the particle for deletion. Takes effect immediately: the
    /// particle is skipped from the current step onward.
    pub fn delete(&mut self) {
        self.status = ParticleStatus::Deleted;
    }

    /// Whether the particle still advances.
    pub fn is_active(&self) -> bool {
        self.status == ParticleStatus::Active
    }

    /// The particle's cached cell on the given field-set grid slot.
    pub fn search_hint(&self, grid_slot: usize) -> Option<GridIndex> {
        self.hints.get(grid_slot).copied().flatten()
    }
}
