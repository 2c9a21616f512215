//! Periodic snapshots of particle state.
//!
//! The recorder buffers whole-step snapshots in memory during the run
//! (the loop never blocks on file I/O mid-step) and can flush them to a
//! columnar text file afterwards. Snapshots are appended atomically:
//! either a step's snapshot is fully present or absent, so aborted and
//! cancelled runs leave readable output.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::particle::{ParticleSet, ParticleStatus};
use crate::types::ParticleId;

/// Error type for trajectory output.
#[derive(Debug, Error)]
pub enum TrajectoryError {
    /// I/O error during file operations.
    #[error("trajectory I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// State of one particle at one snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleRecord {
    /// Particle id.
    pub id: ParticleId,
    /// The particle's own clock (lags the snapshot time once the
    /// particle goes out of bounds).
    pub time: f64,
    /// Depth coordinate.
    pub depth: f64,
    /// Latitude coordinate.
    pub lat: f64,
    /// Longitude coordinate.
    pub lon: f64,
    /// Lifecycle status at snapshot time.
    pub status: ParticleStatus,
    /// User variable values, in declaration order.
    pub vars: Vec<f64>,
}

/// All particle records taken at one output boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct TrajectorySnapshot {
    /// Simulation clock at the snapshot.
    pub time: f64,
    /// One record per non-deleted particle.
    pub records: Vec<ParticleRecord>,
}

/// In-memory trajectory store with optional file flush.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use drift_rs::field::{Field, FieldSet};
/// use drift_rs::grid::{Grid, RectilinearGrid};
/// use drift_rs::io::TrajectoryRecorder;
/// use drift_rs::kernel::AdvectionEE;
/// use drift_rs::particle::ParticleSet;
/// use drift_rs::simulation::SimulationConfig;
///
/// let grid = Arc::new(Grid::Rectilinear(
///     RectilinearGrid::uniform(0.0, 1000.0, 0.0, 1000.0, 11, 11),
/// ));
/// let fieldset = Arc::new(FieldSet::from_velocities(
///     Field::from_fn("U", Arc::clone(&grid), |_, _, _| 1.0),
///     Field::from_fn("V", grid, |_, _, _| 0.0),
/// ));
/// let mut pset = ParticleSet::from_list(fieldset, &[100.0], &[500.0]);
///
/// let mut recorder = TrajectoryRecorder::new();
/// let config = SimulationConfig::new(100.0, 10.0).with_output_interval(20.0);
/// pset.execute_with_output(&AdvectionEE, &config, &mut recorder).unwrap();
///
/// // Start snapshot plus one per 20 time units.
/// assert_eq!(recorder.snapshots().len(), 6);
/// let track = recorder.trajectory(pset.particles()[0].id);
/// assert_eq!(track.first().unwrap().lon, 100.0);
/// assert_eq!(track.last().unwrap().lon, 200.0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct TrajectoryRecorder {
    var_names: Vec<String>,
    snapshots: Vec<TrajectorySnapshot>,
}

impl TrajectoryRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot of every non-deleted particle.
    ///
    /// Out-of-bounds particles stay in the output (frozen at the
    /// position where they were flagged) so they remain inspectable.
    pub fn record(&mut self, pset: &ParticleSet, time: f64) {
        if self.var_names.is_empty() {
            self.var_names = pset.variables().iter().map(|v| v.name.clone()).collect();
        }
        let records = pset
            .particles()
            .iter()
            .filter(|p| p.status != ParticleStatus::Deleted)
            .map(|p| ParticleRecord {
                id: p.id,
                time: p.time,
                depth: p.depth,
                lat: p.lat,
                lon: p.lon,
                status: p.status,
                vars: p.vars().to_vec(),
            })
            .collect();
        self.snapshots.push(TrajectorySnapshot { time, records });
    }

    /// Recorded snapshots in time order.
    pub fn snapshots(&self) -> &[TrajectorySnapshot] {
        &self.snapshots
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// One particle's records across all snapshots, in time order.
    pub fn trajectory(&self, id: ParticleId) -> Vec<&ParticleRecord> {
        self.snapshots
            .iter()
            .filter_map(|s| s.records.iter().find(|r| r.id == id))
            .collect()
    }

    /// Drop all recorded snapshots, keeping the variable names.
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    /// Write all snapshots as a columnar text file.
    ///
    /// One row per particle per snapshot:
    /// `snapshot_time,id,time,depth,lat,lon,<vars...>,status`.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), TrajectoryError> {
        let file = File::create(path.as_ref())?;
        let mut w = BufWriter::new(file);

        write!(w, "snapshot_time,id,time,depth,lat,lon")?;
        for name in &self.var_names {
            write!(w, ",{name}")?;
        }
        writeln!(w, ",status")?;

        for snapshot in &self.snapshots {
            for r in &snapshot.records {
                write!(
                    w,
                    "{},{},{},{},{},{}",
                    snapshot.time,
                    r.id.get(),
                    r.time,
                    r.depth,
                    r.lat,
                    r.lon
                )?;
                for v in &r.vars {
                    write!(w, ",{v}")?;
                }
                let status = match r.status {
                    ParticleStatus::Active => "active",
                    ParticleStatus::OutOfBounds => "out_of_bounds",
                    ParticleStatus::Deleted => "deleted",
                };
                writeln!(w, ",{status}")?;
            }
        }
        w.flush()?;
        debug!(
            path = %path.as_ref().display(),
            snapshots = self.snapshots.len(),
            "trajectory file written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Field, FieldSet};
    use crate::grid::{Grid, RectilinearGrid};
    use crate::particle::VariableDef;
    use std::sync::Arc;

    fn pset() -> ParticleSet {
        let grid = Arc::new(Grid::Rectilinear(RectilinearGrid::uniform(
            0.0, 1000.0, 0.0, 1000.0, 11, 11,
        )));
        let fs = Arc::new(FieldSet::from_velocities(
            Field::from_fn("U", Arc::clone(&grid), |_, _, _| 1.0),
            Field::from_fn("V", grid, |_, _, _| 0.0),
        ));
        let mut pset =
            ParticleSet::new(fs).with_variables(vec![VariableDef::new("sample_var", 1.5)]);
        pset.release(100.0, 500.0);
        pset.release(200.0, 500.0);
        pset
    }

    #[test]
    fn test_record_captures_vars_and_status() {
        let pset = pset();
        let mut rec = TrajectoryRecorder::new();
        rec.record(&pset, 0.0);
        let snap = &rec.snapshots()[0];
        assert_eq!(snap.records.len(), 2);
        assert_eq!(snap.records[0].vars, vec![1.5]);
        assert_eq!(snap.records[0].status, ParticleStatus::Active);
    }

    #[test]
    fn test_deleted_particles_not_recorded() {
        let mut pset = pset();
        pset.particles_mut()[1].delete();
        let mut rec = TrajectoryRecorder::new();
        rec.record(&pset, 0.0);
        assert_eq!(rec.snapshots()[0].records.len(), 1);
    }

    #[test]
    fn test_trajectory_readback() {
        let mut pset = pset();
        let id = pset.particles()[0].id;
        let mut rec = TrajectoryRecorder::new();
        rec.record(&pset, 0.0);
        pset.particles_mut()[0].lon = 150.0;
        rec.record(&pset, 50.0);
        let track = rec.trajectory(id);
        assert_eq!(track.len(), 2);
        assert_eq!(track[0].lon, 100.0);
        assert_eq!(track[1].lon, 150.0);
    }

    #[test]
    fn test_write_csv_roundtrip() {
        let pset = pset();
        let mut rec = TrajectoryRecorder::new();
        rec.record(&pset, 0.0);

        let dir = std::env::temp_dir().join("drift_rs_trajectory_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("out.csv");
        rec.write_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "snapshot_time,id,time,depth,lat,lon,sample_var,status"
        );
        assert_eq!(lines.next().unwrap(), "0,0,0,0,500,100,1.5,active");
        std::fs::remove_dir_all(&dir).ok();
    }
}
