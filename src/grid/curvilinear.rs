//! Curvilinear grids with seeded local search.
//!
//! A curvilinear grid stores the full 2D arrays of node coordinates, so
//! locating a point means finding which quadrilateral cell contains it.
//! The naive approach scans every cell, O(ni * nj) per query. The walk
//! search instead starts from a seed cell (the particle's last known
//! location) and moves one cell at a time toward the query point, using
//! the signs of the cross products against the four cell edges as a
//! compass. Between consecutive timesteps a particle rarely moves more
//! than a cell or two, so the walk terminates in a handful of steps.

use super::axis::TimeAxis;
use super::{CellLocation, GridIndex};
use crate::types::Bounds2D;

/// Sign tolerance for the point-in-quad edge tests. Keeps points that
/// sit exactly on a cell edge (up to rounding) inside the cell.
const EDGE_TOL: f64 = 1e-12;

/// A structured curvilinear grid: `nj x ni` nodes with explicit
/// per-node coordinates.
///
/// Cells must be convex, non-degenerate quadrilaterals with
/// counter-clockwise orientation (south-west node first). The node at
/// `(j, i)` is stored at flat index `j * ni + i`.
#[derive(Clone, Debug)]
pub struct CurvilinearGrid {
    ni: usize,
    nj: usize,
    lon: Vec<f64>,
    lat: Vec<f64>,
    /// Time slices of the data sampled on this grid.
    pub time: TimeAxis,
    bounds: Bounds2D,
}

impl CurvilinearGrid {
    /// Create a grid from flat node coordinate arrays.
    ///
    /// # Panics
    ///
    /// Panics if `ni` or `nj` is below 2 or the arrays do not hold
    /// `nj * ni` values.
    pub fn new(ni: usize, nj: usize, lon: Vec<f64>, lat: Vec<f64>, time: TimeAxis) -> Self {
        assert!(ni >= 2 && nj >= 2, "grid needs at least 2x2 nodes");
        assert_eq!(lon.len(), ni * nj, "lon array must hold nj * ni nodes");
        assert_eq!(lat.len(), ni * nj, "lat array must hold nj * ni nodes");

        let mut bounds = Bounds2D {
            lon_min: f64::INFINITY,
            lon_max: f64::NEG_INFINITY,
            lat_min: f64::INFINITY,
            lat_max: f64::NEG_INFINITY,
        };
        for (&x, &y) in lon.iter().zip(lat.iter()) {
            bounds.lon_min = bounds.lon_min.min(x);
            bounds.lon_max = bounds.lon_max.max(x);
            bounds.lat_min = bounds.lat_min.min(y);
            bounds.lat_max = bounds.lat_max.max(y);
        }

        Self {
            ni,
            nj,
            lon,
            lat,
            time,
            bounds,
        }
    }

    /// Create a steady grid by evaluating `node(j, i) -> (lon, lat)`.
    ///
    /// Convenient for analytic meshes (rotated, stretched) in tests and
    /// benchmarks.
    pub fn from_fn<F>(ni: usize, nj: usize, node: F) -> Self
    where
        F: Fn(usize, usize) -> (f64, f64),
    {
        let mut lon = Vec::with_capacity(ni * nj);
        let mut lat = Vec::with_capacity(ni * nj);
        for j in 0..nj {
            for i in 0..ni {
                let (x, y) = node(j, i);
                lon.push(x);
                lat.push(y);
            }
        }
        Self::new(ni, nj, lon, lat, TimeAxis::steady())
    }

    /// Replace the time axis.
    pub fn with_time(mut self, time: TimeAxis) -> Self {
        self.time = time;
        self
    }

    /// Nodes along the first (longitude) dimension.
    pub fn ni(&self) -> usize {
        self.ni
    }

    /// Nodes along the second (latitude) dimension.
    pub fn nj(&self) -> usize {
        self.nj
    }

    /// Bounding box of all nodes.
    pub fn bounds(&self) -> Bounds2D {
        self.bounds
    }

    /// Coordinates `(lon, lat)` of node `(j, i)`.
    #[inline]
    pub fn node(&self, j: usize, i: usize) -> (f64, f64) {
        let k = j * self.ni + i;
        (self.lon[k], self.lat[k])
    }

    /// Corner coordinates of cell `(j, i)` in counter-clockwise order:
    /// south-west, south-east, north-east, north-west.
    #[inline]
    fn corners(&self, cell: GridIndex) -> [(f64, f64); 4] {
        [
            self.node(cell.j, cell.i),
            self.node(cell.j, cell.i + 1),
            self.node(cell.j + 1, cell.i + 1),
            self.node(cell.j + 1, cell.i),
        ]
    }

    /// Cross product of `(b - a) x (p - a)`; positive when `p` lies to
    /// the left of the directed edge `a -> b`.
    #[inline]
    fn edge_sign(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> f64 {
        (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
    }

    /// Edge-test signs for a point against a cell, in the order
    /// south, east, north, west.
    #[inline]
    fn cell_signs(&self, cell: GridIndex, p: (f64, f64)) -> [f64; 4] {
        let c = self.corners(cell);
        [
            Self::edge_sign(c[0], c[1], p),
            Self::edge_sign(c[1], c[2], p),
            Self::edge_sign(c[2], c[3], p),
            Self::edge_sign(c[3], c[0], p),
        ]
    }

    fn valid_cell(&self, cell: GridIndex) -> bool {
        cell.i < self.ni - 1 && cell.j < self.nj - 1
    }

    /// Locate the cell enclosing `(lat, lon)`.
    ///
    /// With a valid `hint` the search walks from the hinted cell toward
    /// the point; without one (or when the walk stalls) it scans the
    /// whole mesh. Both paths agree on the result.
    pub fn locate(&self, lat: f64, lon: f64, hint: Option<GridIndex>) -> Option<CellLocation> {
        if !self.bounds.contains(lat, lon) {
            return None;
        }
        let p = (lon, lat);

        if let Some(seed) = hint.filter(|c| self.valid_cell(*c)) {
            if let Some(loc) = self.walk(seed, p) {
                return Some(loc);
            }
        }
        self.scan(p)
    }

    /// Walk from `seed` toward `p`, one cell per step.
    ///
    /// Each violated edge points at the neighbor to try next; the walk
    /// gives up (returns `None`) when it would leave the mesh or stops
    /// making progress, and the caller falls back to the full scan.
    fn walk(&self, seed: GridIndex, p: (f64, f64)) -> Option<CellLocation> {
        let mut cell = seed;
        let max_steps = self.ni + self.nj;

        for _ in 0..max_steps {
            let signs = self.cell_signs(cell, p);
            if signs.iter().all(|&s| s >= -EDGE_TOL) {
                return Some(self.location_in(cell, p));
            }

            let mut next = cell;
            // south, east, north, west
            if signs[0] < -EDGE_TOL {
                if next.j == 0 {
                    return None;
                }
                next.j -= 1;
            } else if signs[2] < -EDGE_TOL {
                if next.j + 2 >= self.nj {
                    return None;
                }
                next.j += 1;
            }
            if signs[1] < -EDGE_TOL {
                if next.i + 2 >= self.ni {
                    return None;
                }
                next.i += 1;
            } else if signs[3] < -EDGE_TOL {
                if next.i == 0 {
                    return None;
                }
                next.i -= 1;
            }
            if next == cell {
                return None;
            }
            cell = next;
        }
        None
    }

    /// Exhaustive scan over all cells.
    fn scan(&self, p: (f64, f64)) -> Option<CellLocation> {
        for j in 0..self.nj - 1 {
            for i in 0..self.ni - 1 {
                let cell = GridIndex::new(i, j);
                if self.cell_signs(cell, p).iter().all(|&s| s >= -EDGE_TOL) {
                    return Some(self.location_in(cell, p));
                }
            }
        }
        None
    }

    /// Invert the bilinear map of a cell to get unit coordinates of a
    /// point already known to lie inside it.
    fn location_in(&self, cell: GridIndex, p: (f64, f64)) -> CellLocation {
        let [(x00, y00), (x10, y10), (x11, y11), (x01, y01)] = self.corners(cell);

        let mut xsi = 0.5;
        let mut eta = 0.5;
        for _ in 0..20 {
            let fx = (1.0 - xsi) * (1.0 - eta) * x00
                + xsi * (1.0 - eta) * x10
                + xsi * eta * x11
                + (1.0 - xsi) * eta * x01
                - p.0;
            let fy = (1.0 - xsi) * (1.0 - eta) * y00
                + xsi * (1.0 - eta) * y10
                + xsi * eta * y11
                + (1.0 - xsi) * eta * y01
                - p.1;

            let dx_dxsi = (1.0 - eta) * (x10 - x00) + eta * (x11 - x01);
            let dx_deta = (1.0 - xsi) * (x01 - x00) + xsi * (x11 - x10);
            let dy_dxsi = (1.0 - eta) * (y10 - y00) + eta * (y11 - y01);
            let dy_deta = (1.0 - xsi) * (y01 - y00) + xsi * (y11 - y10);

            let det = dx_dxsi * dy_deta - dx_deta * dy_dxsi;
            if det.abs() < f64::EPSILON {
                break;
            }
            let dxsi = (fx * dy_deta - fy * dx_deta) / det;
            let deta = (fy * dx_dxsi - fx * dy_dxsi) / det;
            xsi -= dxsi;
            eta -= deta;
            if dxsi.abs() < 1e-13 && deta.abs() < 1e-13 {
                break;
            }
        }

        CellLocation {
            cell,
            xsi: xsi.clamp(0.0, 1.0),
            eta: eta.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Rotated uniform mesh: a rectilinear grid turned by `angle`.
    fn rotated(ni: usize, nj: usize, angle: f64) -> CurvilinearGrid {
        let (s, c) = angle.sin_cos();
        CurvilinearGrid::from_fn(ni, nj, |j, i| {
            let x = i as f64;
            let y = j as f64;
            (c * x - s * y, s * x + c * y)
        })
    }

    #[test]
    fn test_scan_finds_interior_point() {
        let g = rotated(10, 8, 0.0);
        let loc = g.locate(3.25, 4.5, None).unwrap();
        assert_eq!(loc.cell, GridIndex::new(4, 3));
        assert_relative_eq!(loc.xsi, 0.5, epsilon = 1e-10);
        assert_relative_eq!(loc.eta, 0.25, epsilon = 1e-10);
    }

    #[test]
    fn test_outside_bbox_rejected() {
        let g = rotated(10, 8, 0.0);
        assert!(g.locate(-0.5, 4.5, None).is_none());
        assert!(g.locate(3.0, 9.5, None).is_none());
    }

    #[test]
    fn test_walk_matches_scan_on_rotated_mesh() {
        let g = rotated(24, 24, 0.3);
        // March a diagonal of query points through the mesh, carrying
        // the previous cell as hint the way the kernel evaluator does.
        let mut hint = None;
        for k in 1..40 {
            let t = k as f64 * 0.5;
            let (s, c) = 0.3_f64.sin_cos();
            let (lon, lat) = (c * t - s * t, s * t + c * t);
            let unseeded = g.locate(lat, lon, None);
            let seeded = g.locate(lat, lon, hint);
            assert_eq!(unseeded, seeded, "query {k} diverged");
            hint = seeded.map(|loc| loc.cell);
        }
    }

    #[test]
    fn test_walk_from_far_seed() {
        let g = rotated(16, 16, 0.1);
        let far = Some(GridIndex::new(14, 14));
        let a = g.locate(1.2, 1.3, None).unwrap();
        let b = g.locate(1.2, 1.3, far).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_stale_hint_outside_mesh_falls_back() {
        let g = rotated(8, 8, 0.0);
        // Hint is out of the cell range entirely.
        let loc = g.locate(2.5, 2.5, Some(GridIndex::new(100, 100))).unwrap();
        assert_eq!(loc.cell, GridIndex::new(2, 2));
    }

    #[test]
    fn test_unit_coords_on_stretched_mesh() {
        // Nonlinear stretching in both directions.
        let g = CurvilinearGrid::from_fn(12, 12, |j, i| {
            let x = (i as f64).powf(1.3);
            let y = (j as f64).powf(1.1);
            (x, y)
        });
        let loc = g.locate(5.0, 7.0, None).unwrap();
        // Reconstruct the point from the unit coordinates.
        let c = g.corners(loc.cell);
        let x = (1.0 - loc.xsi) * (1.0 - loc.eta) * c[0].0
            + loc.xsi * (1.0 - loc.eta) * c[1].0
            + loc.xsi * loc.eta * c[2].0
            + (1.0 - loc.xsi) * loc.eta * c[3].0;
        let y = (1.0 - loc.xsi) * (1.0 - loc.eta) * c[0].1
            + loc.xsi * (1.0 - loc.eta) * c[1].1
            + loc.xsi * loc.eta * c[2].1
            + (1.0 - loc.xsi) * loc.eta * c[3].1;
        assert_relative_eq!(x, 7.0, epsilon = 1e-9);
        assert_relative_eq!(y, 5.0, epsilon = 1e-9);
    }
}
