//! Sampled physical quantities on grids.
//!
//! A [`Field`] couples one shared [`Grid`] with a data array sampled at
//! the grid nodes, and answers point queries by bilinear interpolation
//! in space and linear interpolation in time. Fields are immutable
//! during a run; a grid is typically shared by several fields (e.g.
//! both velocity components).

mod fieldset;
mod nested;

pub use fieldset::{FieldSample, FieldSet, SetMember};
pub use nested::{NestedField, NestedSample};

use std::sync::Arc;

use crate::error::SampleError;
use crate::grid::{CellLocation, Grid, GridIndex};

/// Spatial interpolation scheme of a field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InterpMethod {
    /// Bilinear interpolation over the cell's four corner nodes.
    #[default]
    Bilinear,
    /// Value of the nearest corner node (e.g. for categorical masks).
    Nearest,
}

/// Result of a successful field sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Interpolated field value.
    pub value: f64,
    /// The cell the query point fell into; feed this back as the hint
    /// for the next query to seed the grid search.
    pub cell: GridIndex,
}

/// A scalar quantity sampled on a grid.
///
/// The data array is flat with shape `(n_time, n_lat, n_lon)` in
/// row-major order, matching the grid's node layout.
#[derive(Clone, Debug)]
pub struct Field {
    /// Field name, unique within a [`FieldSet`].
    pub name: String,
    grid: Arc<Grid>,
    data: Vec<f64>,
    method: InterpMethod,
}

impl Field {
    /// Create a field from node data.
    ///
    /// # Panics
    ///
    /// Panics if the data length does not match
    /// `n_time * n_lat * n_lon` of the grid.
    pub fn new(name: impl Into<String>, grid: Arc<Grid>, data: Vec<f64>) -> Self {
        let (nj, ni) = grid.n_nodes();
        let expect = grid.time().n_slices() * nj * ni;
        assert_eq!(
            data.len(),
            expect,
            "field data must hold n_time * n_lat * n_lon values"
        );
        Self {
            name: name.into(),
            grid,
            data,
            method: InterpMethod::default(),
        }
    }

    /// Create a field by evaluating `f(time, lat, lon)` at every node
    /// of every time slice.
    pub fn from_fn<F>(name: impl Into<String>, grid: Arc<Grid>, f: F) -> Self
    where
        F: Fn(f64, f64, f64) -> f64,
    {
        let (nj, ni) = grid.n_nodes();
        let times = grid.time().values().to_vec();
        let mut data = Vec::with_capacity(times.len() * nj * ni);
        for &t in &times {
            for j in 0..nj {
                for i in 0..ni {
                    let (lat, lon) = grid.node(j, i);
                    data.push(f(t, lat, lon));
                }
            }
        }
        Self::new(name, grid, data)
    }

    /// Use a different interpolation method.
    pub fn with_method(mut self, method: InterpMethod) -> Self {
        self.method = method;
        self
    }

    /// The grid this field is sampled on.
    pub fn grid(&self) -> &Arc<Grid> {
        &self.grid
    }

    /// The field's interpolation method.
    pub fn method(&self) -> InterpMethod {
        self.method
    }

    #[inline]
    fn node_value(&self, t: usize, j: usize, i: usize) -> f64 {
        let (nj, ni) = self.grid.n_nodes();
        debug_assert!(j < nj && i < ni);
        self.data[(t * nj + j) * ni + i]
    }

    /// Interpolate one time slice at a located cell.
    fn interp_slice(&self, t: usize, loc: &CellLocation) -> f64 {
        let GridIndex { i, j } = loc.cell;
        match self.method {
            InterpMethod::Bilinear => {
                let v00 = self.node_value(t, j, i);
                let v10 = self.node_value(t, j, i + 1);
                let v11 = self.node_value(t, j + 1, i + 1);
                let v01 = self.node_value(t, j + 1, i);
                (1.0 - loc.xsi) * (1.0 - loc.eta) * v00
                    + loc.xsi * (1.0 - loc.eta) * v10
                    + loc.xsi * loc.eta * v11
                    + (1.0 - loc.xsi) * loc.eta * v01
            }
            InterpMethod::Nearest => {
                let i = if loc.xsi < 0.5 { i } else { i + 1 };
                let j = if loc.eta < 0.5 { j } else { j + 1 };
                self.node_value(t, j, i)
            }
        }
    }

    /// Sample the field at a space-time point.
    ///
    /// `depth` is accepted for contract compatibility; fields in this
    /// crate are single-level (surface) fields and ignore it. `hint` is
    /// the particle's last known cell on this field's grid and seeds
    /// the search on curvilinear grids.
    ///
    /// # Errors
    ///
    /// [`SampleError::TimeExtrapolation`] when `time` falls outside the
    /// grid's time axis (checked first), [`SampleError::OutOfBounds`]
    /// when the point lies outside the horizontal extent.
    pub fn sample(
        &self,
        time: f64,
        _depth: f64,
        lat: f64,
        lon: f64,
        hint: Option<GridIndex>,
    ) -> Result<Sample, SampleError> {
        let (t, tfrac) =
            self.grid
                .time()
                .locate(time)
                .ok_or_else(|| SampleError::TimeExtrapolation {
                    field: self.name.clone(),
                    time,
                })?;

        let loc = self
            .grid
            .locate(lat, lon, hint)
            .ok_or_else(|| SampleError::OutOfBounds {
                field: self.name.clone(),
                lat,
                lon,
            })?;

        let value = if tfrac == 0.0 {
            self.interp_slice(t, &loc)
        } else {
            let v0 = self.interp_slice(t, &loc);
            let v1 = self.interp_slice(t + 1, &loc);
            (1.0 - tfrac) * v0 + tfrac * v1
        };

        Ok(Sample {
            value,
            cell: loc.cell,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Axis, RectilinearGrid, TimeAxis};
    use approx::assert_relative_eq;

    fn steady_grid() -> Arc<Grid> {
        Arc::new(Grid::Rectilinear(RectilinearGrid::uniform(
            0.0, 10.0, 0.0, 5.0, 11, 6,
        )))
    }

    #[test]
    fn test_bilinear_reproduces_linear_function() {
        // Bilinear interpolation is exact for functions linear in each
        // coordinate.
        let grid = steady_grid();
        let f = Field::from_fn("F", grid, |_, lat, lon| 2.0 * lon - 3.0 * lat + 1.0);
        let s = f.sample(0.0, 0.0, 2.3, 7.7, None).unwrap();
        assert_relative_eq!(s.value, 2.0 * 7.7 - 3.0 * 2.3 + 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sample_returns_cell_for_hint_reuse() {
        let grid = steady_grid();
        let f = Field::from_fn("F", grid, |_, _, _| 1.0);
        let s = f.sample(0.0, 0.0, 2.5, 7.5, None).unwrap();
        assert_eq!(s.cell, GridIndex::new(7, 2));
        let s2 = f.sample(0.0, 0.0, 2.5, 7.5, Some(s.cell)).unwrap();
        assert_eq!(s, s2);
    }

    #[test]
    fn test_out_of_bounds() {
        let grid = steady_grid();
        let f = Field::from_fn("F", grid, |_, _, _| 1.0);
        let err = f.sample(0.0, 0.0, 2.5, 10.5, None).unwrap_err();
        assert!(matches!(err, SampleError::OutOfBounds { .. }));
    }

    #[test]
    fn test_nan_position_is_out_of_bounds() {
        // A land-masked field can hand a kernel NaN velocities, which
        // puts NaN into the next query position. That must surface as a
        // sampling error, not tear down the search.
        let grid = steady_grid();
        let f = Field::from_fn("F", grid, |_, _, _| 1.0);
        let err = f.sample(0.0, 0.0, 2.5, f64::NAN, None).unwrap_err();
        assert!(matches!(err, SampleError::OutOfBounds { .. }));
        let err = f.sample(0.0, 0.0, f64::NAN, 7.5, None).unwrap_err();
        assert!(matches!(err, SampleError::OutOfBounds { .. }));
    }

    #[test]
    fn test_time_interpolation() {
        let grid = Arc::new(Grid::Rectilinear(
            RectilinearGrid::new(
                Axis::uniform(0.0, 10.0, 11),
                Axis::uniform(0.0, 5.0, 6),
                TimeAxis::new(vec![0.0, 100.0]),
            ),
        ));
        let f = Field::from_fn("F", grid, |t, _, _| t);
        let s = f.sample(25.0, 0.0, 2.5, 5.0, None).unwrap();
        assert_relative_eq!(s.value, 25.0, epsilon = 1e-12);
        // Inclusive time edges.
        assert_relative_eq!(
            f.sample(100.0, 0.0, 2.5, 5.0, None).unwrap().value,
            100.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_time_extrapolation_is_not_out_of_bounds() {
        let grid = Arc::new(Grid::Rectilinear(
            RectilinearGrid::new(
                Axis::uniform(0.0, 10.0, 11),
                Axis::uniform(0.0, 5.0, 6),
                TimeAxis::new(vec![0.0, 100.0]),
            ),
        ));
        let f = Field::from_fn("F", grid, |t, _, _| t);
        let err = f.sample(-1.0, 0.0, 2.5, 5.0, None).unwrap_err();
        assert!(matches!(err, SampleError::TimeExtrapolation { .. }));
        // Time is checked before space: a doubly-invalid query reports
        // extrapolation.
        let err = f.sample(-1.0, 0.0, 2.5, 50.0, None).unwrap_err();
        assert!(matches!(err, SampleError::TimeExtrapolation { .. }));
    }

    #[test]
    fn test_nearest_method() {
        let grid = steady_grid();
        let f = Field::from_fn("mask", grid, |_, lat, lon| {
            if lon >= 5.0 && lat >= 2.0 {
                1.0
            } else {
                0.0
            }
        })
        .with_method(InterpMethod::Nearest);
        assert_eq!(f.sample(0.0, 0.0, 2.4, 5.4, None).unwrap().value, 1.0);
        assert_eq!(f.sample(0.0, 0.0, 1.4, 5.4, None).unwrap().value, 0.0);
    }
}
