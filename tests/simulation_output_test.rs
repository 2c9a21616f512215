//! Trajectory output semantics: snapshot cadence, whole-step
//! consistency, and particle lifecycle as seen through the recorder.

use std::sync::Arc;

use approx::assert_relative_eq;
use drift_rs::error::{KernelError, SimulationError};
use drift_rs::field::{Field, FieldSet};
use drift_rs::grid::{Grid, RectilinearGrid};
use drift_rs::io::TrajectoryRecorder;
use drift_rs::kernel::{AdvectionEE, FnKernel, KernelContext, Sequence};
use drift_rs::particle::{Particle, ParticleSet, ParticleStatus, VariableDef};
use drift_rs::simulation::{RunState, SimulationConfig};

fn uniform_fieldset() -> Arc<FieldSet> {
    let grid = Arc::new(Grid::Rectilinear(RectilinearGrid::uniform(
        0.0, 1000.0, 0.0, 1000.0, 11, 11,
    )));
    Arc::new(FieldSet::from_velocities(
        Field::from_fn("U", Arc::clone(&grid), |_, _, _| 1.0),
        Field::from_fn("V", grid, |_, _, _| 0.0),
    ))
}

fn snapshot_times(rec: &TrajectoryRecorder) -> Vec<f64> {
    rec.snapshots().iter().map(|s| s.time).collect()
}

#[test]
fn test_snapshot_cadence_aligned_with_dt() {
    let mut pset = ParticleSet::from_list(uniform_fieldset(), &[100.0], &[500.0]);
    let mut rec = TrajectoryRecorder::new();
    let config = SimulationConfig::new(100.0, 10.0).with_output_interval(20.0);
    pset.execute_with_output(&AdvectionEE, &config, &mut rec)
        .unwrap();

    assert_eq!(
        snapshot_times(&rec),
        vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]
    );
}

#[test]
fn test_snapshots_fall_on_step_boundaries_only() {
    // Interval 25 does not divide dt 10: snapshots land on the first
    // step boundary past each output time, never mid-step.
    let mut pset = ParticleSet::from_list(uniform_fieldset(), &[100.0], &[500.0]);
    let mut rec = TrajectoryRecorder::new();
    let config = SimulationConfig::new(100.0, 10.0).with_output_interval(25.0);
    pset.execute_with_output(&AdvectionEE, &config, &mut rec)
        .unwrap();

    assert_eq!(snapshot_times(&rec), vec![0.0, 30.0, 50.0, 80.0, 100.0]);
    for s in rec.snapshots() {
        for r in &s.records {
            assert_relative_eq!(r.lon, 100.0 + s.time, epsilon = 1e-9);
        }
    }
}

#[test]
fn test_zero_runtime_records_single_snapshot() {
    let mut pset = ParticleSet::from_list(uniform_fieldset(), &[100.0], &[500.0]);
    let mut rec = TrajectoryRecorder::new();
    let config = SimulationConfig::new(0.0, 10.0).with_output_interval(20.0);
    pset.execute_with_output(&AdvectionEE, &config, &mut rec)
        .unwrap();

    assert_eq!(snapshot_times(&rec), vec![0.0]);
    assert_relative_eq!(pset.particles()[0].lon, 100.0, epsilon = 1e-12);
}

#[test]
fn test_backwards_run_records_decreasing_times() {
    let mut pset = ParticleSet::from_list(uniform_fieldset(), &[500.0], &[500.0]);
    let mut rec = TrajectoryRecorder::new();
    let config = SimulationConfig::new(50.0, -10.0).with_output_interval(10.0);
    pset.execute_with_output(&AdvectionEE, &config, &mut rec)
        .unwrap();

    assert_eq!(
        snapshot_times(&rec),
        vec![0.0, -10.0, -20.0, -30.0, -40.0, -50.0]
    );
    let last = rec.snapshots().last().unwrap();
    assert_relative_eq!(last.records[0].lon, 450.0, epsilon = 1e-9);
}

#[test]
fn test_sampled_variable_appears_in_output() {
    // GlobCurrent-style composition: advect, then record the local
    // pressure-like field into a particle variable every step.
    let grid = Arc::new(Grid::Rectilinear(RectilinearGrid::uniform(
        0.0, 1000.0, 0.0, 1000.0, 11, 11,
    )));
    let mut fieldset = FieldSet::from_velocities(
        Field::from_fn("U", Arc::clone(&grid), |_, _, _| 1.0),
        Field::from_fn("V", Arc::clone(&grid), |_, _, _| 0.0),
    );
    fieldset.add_field(Field::from_fn("P", grid, |_, _, lon| 3.0 * lon));
    let fieldset = Arc::new(fieldset);

    let mut pset = ParticleSet::new(fieldset)
        .with_variables(vec![VariableDef::new("p", 0.0)]);
    pset.release(100.0, 500.0);

    let sample_p = FnKernel::new(
        "SampleP",
        vec!["P".to_string()],
        |p: &mut Particle, ctx: &mut dyn KernelContext, time: f64, _dt: f64| {
            let value = ctx.sample(0, time, p.depth, p.lat, p.lon)?;
            p.set_var(0, value);
            Ok(())
        },
    );
    let kernel = Sequence::new(vec![Box::new(AdvectionEE), Box::new(sample_p)]);

    let mut rec = TrajectoryRecorder::new();
    let config = SimulationConfig::new(100.0, 10.0).with_output_interval(50.0);
    pset.execute_with_output(&kernel, &config, &mut rec).unwrap();

    // Sampled after each advection step, so every snapshot past the
    // first carries P at the particle's current position.
    let track = rec.trajectory(pset.particles()[0].id);
    assert_eq!(track.len(), 3);
    assert_eq!(track[0].vars[0], 0.0);
    assert_relative_eq!(track[1].vars[0], 3.0 * 150.0, epsilon = 1e-9);
    assert_relative_eq!(track[2].vars[0], 3.0 * 200.0, epsilon = 1e-9);
}

#[test]
fn test_deleted_particle_drops_out_of_snapshots() {
    let mut pset = ParticleSet::from_list(
        uniform_fieldset(),
        &[100.0, 200.0],
        &[500.0, 500.0],
    );
    let victim = pset.particles()[1].id;

    let reaper = FnKernel::new(
        "Reaper",
        vec![],
        move |p: &mut Particle, _: &mut dyn KernelContext, time: f64, _: f64| {
            if p.id == victim && time >= 40.0 {
                p.delete();
            }
            Ok(())
        },
    );
    let kernel = Sequence::new(vec![Box::new(AdvectionEE), Box::new(reaper)]);

    let mut rec = TrajectoryRecorder::new();
    let config = SimulationConfig::new(100.0, 10.0).with_output_interval(10.0);
    let result = pset.execute_with_output(&kernel, &config, &mut rec).unwrap();

    assert_eq!(result.n_deleted, 1);
    let counts: Vec<usize> = rec.snapshots().iter().map(|s| s.records.len()).collect();
    assert_eq!(counts[..5], [2, 2, 2, 2, 2]);
    assert!(counts[5..].iter().all(|&c| c == 1));
    assert!(rec.trajectory(victim).len() < rec.snapshots().len());
}

#[test]
fn test_out_of_bounds_particle_frozen_in_output() {
    let mut pset = ParticleSet::from_list(
        uniform_fieldset(),
        &[975.0, 100.0],
        &[500.0, 500.0],
    );
    let edge_runner = pset.particles()[0].id;

    let mut rec = TrajectoryRecorder::new();
    let config = SimulationConfig::new(100.0, 10.0).with_output_interval(10.0);
    let result = pset
        .execute_with_output(&AdvectionEE, &config, &mut rec)
        .unwrap();

    assert_eq!(result.n_out_of_bounds, 1);
    // The flagged particle appears in every snapshot, frozen where it
    // was flagged, with its own clock stopped.
    let track = rec.trajectory(edge_runner);
    assert_eq!(track.len(), rec.snapshots().len());
    let frozen = track.last().unwrap();
    assert_eq!(frozen.status, ParticleStatus::OutOfBounds);
    assert_relative_eq!(frozen.lon, track[3].lon, epsilon = 1e-9);
    assert!(frozen.time < 100.0);
}

#[test]
fn test_aborted_run_keeps_only_whole_step_snapshots() {
    let mut pset = ParticleSet::from_list(uniform_fieldset(), &[100.0], &[500.0]);
    let tripwire = FnKernel::new(
        "Tripwire",
        vec![],
        |_: &mut Particle, _: &mut dyn KernelContext, time: f64, _: f64| {
            if time >= 50.0 {
                return Err(KernelError::Custom {
                    kernel: "Tripwire".to_string(),
                    reason: "instrument dropout".to_string(),
                });
            }
            Ok(())
        },
    );
    let kernel = Sequence::new(vec![Box::new(AdvectionEE), Box::new(tripwire)]);

    let mut rec = TrajectoryRecorder::new();
    let config = SimulationConfig::new(100.0, 10.0).with_output_interval(20.0);
    let result = pset.execute_with_output(&kernel, &config, &mut rec).unwrap();

    assert_eq!(result.state, RunState::Aborted);
    assert!(matches!(result.error, Some(SimulationError::Kernel { .. })));
    // The kernel fails in the step starting at t = 50: the recorder
    // stops at the last whole-step output boundary before the failure
    // and nothing from the failed step leaks out.
    assert_eq!(snapshot_times(&rec), vec![0.0, 20.0, 40.0]);
    for s in rec.snapshots() {
        for r in &s.records {
            assert_relative_eq!(r.lon, 100.0 + s.time, epsilon = 1e-9);
        }
    }
}

#[test]
fn test_csv_export_row_counts() {
    let mut pset = ParticleSet::from_list(
        uniform_fieldset(),
        &[100.0, 200.0],
        &[400.0, 600.0],
    );
    let mut rec = TrajectoryRecorder::new();
    let config = SimulationConfig::new(100.0, 10.0).with_output_interval(20.0);
    pset.execute_with_output(&AdvectionEE, &config, &mut rec)
        .unwrap();

    let dir = std::env::temp_dir().join("drift_rs_output_test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("trajectories.csv");
    rec.write_csv(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let n_rows = text.lines().count();
    // Header plus 2 particles x 6 snapshots.
    assert_eq!(n_rows, 1 + 2 * 6);
    assert!(text.lines().next().unwrap().starts_with("snapshot_time,id"));
    std::fs::remove_dir_all(&dir).ok();
}
