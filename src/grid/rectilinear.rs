//! Tensor-product grids on monotonic axes.

use super::axis::{Axis, TimeAxis};
use super::{CellLocation, GridIndex};
use crate::types::Bounds2D;

/// A rectilinear grid: independent longitude and latitude axes plus a
/// time axis shared by all fields on the grid.
///
/// Cell location is two binary searches, one per axis, so no search
/// hint is needed.
#[derive(Clone, Debug)]
pub struct RectilinearGrid {
    /// Longitude node coordinates.
    pub lon: Axis,
    /// Latitude node coordinates.
    pub lat: Axis,
    /// Time slices of the data sampled on this grid.
    pub time: TimeAxis,
}

impl RectilinearGrid {
    /// Create a grid from explicit axes.
    pub fn new(lon: Axis, lat: Axis, time: TimeAxis) -> Self {
        Self { lon, lat, time }
    }

    /// Create a steady grid with uniform node spacing.
    ///
    /// # Panics
    ///
    /// Panics if either node count is below 2 or an extent is empty.
    pub fn uniform(
        lon_min: f64,
        lon_max: f64,
        lat_min: f64,
        lat_max: f64,
        n_lon: usize,
        n_lat: usize,
    ) -> Self {
        Self {
            lon: Axis::uniform(lon_min, lon_max, n_lon),
            lat: Axis::uniform(lat_min, lat_max, n_lat),
            time: TimeAxis::steady(),
        }
    }

    /// Replace the time axis.
    pub fn with_time(mut self, time: TimeAxis) -> Self {
        self.time = time;
        self
    }

    /// Locate the cell enclosing `(lat, lon)`, or `None` if the point
    /// lies outside the grid extent (edges inclusive).
    pub fn locate(&self, lat: f64, lon: f64) -> Option<CellLocation> {
        let (i, xsi) = self.lon.locate(lon)?;
        let (j, eta) = self.lat.locate(lat)?;
        Some(CellLocation {
            cell: GridIndex::new(i, j),
            xsi,
            eta,
        })
    }

    /// Horizontal extent of the grid.
    pub fn bounds(&self) -> Bounds2D {
        Bounds2D::new(
            self.lon.first(),
            self.lon.last(),
            self.lat.first(),
            self.lat.last(),
        )
    }
}
