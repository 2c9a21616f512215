//! Coordinate meshes and cell-location search.
//!
//! Two grid kinds back the fields in this crate:
//! - [`RectilinearGrid`]: tensor product of two monotonic axes, located
//!   by independent binary searches.
//! - [`CurvilinearGrid`]: 2D arrays of node coordinates, located by a
//!   local walk seeded from a particle's last known cell, with a full
//!   scan as fallback.
//!
//! Both expose the same [`Grid::locate`] contract, so fields never
//! inspect the grid kind.

mod axis;
mod curvilinear;
mod rectilinear;

pub use axis::{Axis, TimeAxis};
pub use curvilinear::CurvilinearGrid;
pub use rectilinear::RectilinearGrid;

use crate::types::Bounds2D;

/// Index of a grid cell: `i` along the longitude direction, `j` along
/// the latitude direction.
///
/// Doubles as the per-particle search hint ("last known cell"): passing
/// a previous [`GridIndex`] to [`Grid::locate`] seeds the curvilinear
/// walk search instead of a full scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridIndex {
    /// Cell index along the first horizontal dimension (longitude).
    pub i: usize,
    /// Cell index along the second horizontal dimension (latitude).
    pub j: usize,
}

impl GridIndex {
    /// Create a cell index.
    pub const fn new(i: usize, j: usize) -> Self {
        Self { i, j }
    }
}

/// Result of locating a point on a grid: the enclosing cell plus the
/// normalized coordinates of the point within it.
///
/// `xsi` runs 0→1 west→east across the cell, `eta` 0→1 south→north.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellLocation {
    /// The enclosing cell.
    pub cell: GridIndex,
    /// Normalized position along the cell's first dimension, in `[0, 1]`.
    pub xsi: f64,
    /// Normalized position along the cell's second dimension, in `[0, 1]`.
    pub eta: f64,
}

/// A coordinate mesh, rectilinear or curvilinear.
///
/// Grids own no field data; one grid is typically shared (via `Arc`)
/// by several fields, e.g. both velocity components of one model.
#[derive(Clone, Debug)]
pub enum Grid {
    /// Tensor-product grid of two monotonic axes.
    Rectilinear(RectilinearGrid),
    /// Grid with per-node 2D coordinate arrays.
    Curvilinear(CurvilinearGrid),
}

impl Grid {
    /// Locate the cell enclosing `(lat, lon)`.
    ///
    /// `hint` is the particle's last known cell on this grid. Rectilinear
    /// grids ignore it (binary search is already logarithmic); curvilinear
    /// grids use it to seed a local walk, which is the fast path on large
    /// meshes. With or without a hint the result is identical.
    ///
    /// Returns `None` when the point lies outside the grid extent.
    pub fn locate(&self, lat: f64, lon: f64, hint: Option<GridIndex>) -> Option<CellLocation> {
        match self {
            Grid::Rectilinear(g) => g.locate(lat, lon),
            Grid::Curvilinear(g) => g.locate(lat, lon, hint),
        }
    }

    /// The grid's time axis.
    pub fn time(&self) -> &TimeAxis {
        match self {
            Grid::Rectilinear(g) => &g.time,
            Grid::Curvilinear(g) => &g.time,
        }
    }

    /// Horizontal bounding box of the grid nodes.
    ///
    /// For curvilinear grids this is an over-approximation used for
    /// quick rejection; containment is decided by the cell search.
    pub fn bounds(&self) -> Bounds2D {
        match self {
            Grid::Rectilinear(g) => g.bounds(),
            Grid::Curvilinear(g) => g.bounds(),
        }
    }

    /// Node counts `(n_lat, n_lon)`; field data arrays must match
    /// `time().n_slices() * n_lat * n_lon`.
    pub fn n_nodes(&self) -> (usize, usize) {
        match self {
            Grid::Rectilinear(g) => (g.lat.len(), g.lon.len()),
            Grid::Curvilinear(g) => (g.nj(), g.ni()),
        }
    }

    /// Coordinates `(lat, lon)` of node `(j, i)`.
    pub fn node(&self, j: usize, i: usize) -> (f64, f64) {
        match self {
            Grid::Rectilinear(g) => (g.lat.values()[j], g.lon.values()[i]),
            Grid::Curvilinear(g) => {
                let (lon, lat) = g.node(j, i);
                (lat, lon)
            }
        }
    }
}
