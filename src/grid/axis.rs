//! Monotonic coordinate axes with binary-search bracketing.

/// A strictly increasing 1D coordinate axis.
///
/// Backs one horizontal dimension of a rectilinear grid. Bracketing is
/// boundary-inclusive: the exact upper domain edge maps into the last
/// interval with fraction 1.0, so fields built on the axis accept
/// queries on their boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct Axis {
    values: Vec<f64>,
}

impl Axis {
    /// Create an axis from node coordinates.
    ///
    /// # Panics
    ///
    /// Panics if fewer than two nodes are given or the values are not
    /// strictly increasing.
    pub fn new(values: Vec<f64>) -> Self {
        assert!(values.len() >= 2, "axis needs at least two nodes");
        assert!(
            values.windows(2).all(|w| w[1] > w[0]),
            "axis nodes must be strictly increasing"
        );
        Self { values }
    }

    /// Create a uniform axis of `n` nodes spanning `[min, max]`.
    ///
    /// # Panics
    ///
    /// Panics if `n < 2` or `max <= min`.
    pub fn uniform(min: f64, max: f64, n: usize) -> Self {
        assert!(n >= 2, "axis needs at least two nodes");
        assert!(max > min, "max must be greater than min");
        let h = (max - min) / (n - 1) as f64;
        Self::new((0..n).map(|i| min + i as f64 * h).collect())
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the axis has no intervals. Always false by construction.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Node coordinates.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// First node coordinate.
    pub fn first(&self) -> f64 {
        self.values[0]
    }

    /// Last node coordinate.
    pub fn last(&self) -> f64 {
        *self.values.last().unwrap()
    }

    /// Bracket `x` into an interval.
    ///
    /// Returns `(i, frac)` with `values[i] <= x <= values[i + 1]` and
    /// `frac` the normalized offset within the interval, or `None` when
    /// `x` lies outside `[first, last]`. NaN never satisfies the range
    /// check, so a NaN coordinate reads as out of bounds.
    pub fn locate(&self, x: f64) -> Option<(usize, f64)> {
        if !(x >= self.first() && x <= self.last()) {
            return None;
        }
        // Exact upper edge collapses into the last interval.
        if x == self.last() {
            return Some((self.values.len() - 2, 1.0));
        }
        let i = match self
            .values
            .binary_search_by(|v| v.partial_cmp(&x).unwrap())
        {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let frac = (x - self.values[i]) / (self.values[i + 1] - self.values[i]);
        Some((i, frac))
    }
}

/// Time axis of a grid.
///
/// A single-entry axis marks a steady field: every query time is valid
/// and no temporal interpolation happens. Multi-entry axes bracket the
/// query time the same way [`Axis`] brackets space, but rejection means
/// time extrapolation, which callers treat as fatal rather than as an
/// out-of-bounds condition.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeAxis {
    values: Vec<f64>,
}

impl TimeAxis {
    /// Create a time axis from slice timestamps.
    ///
    /// # Panics
    ///
    /// Panics if no timestamps are given or they are not strictly
    /// increasing.
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "time axis needs at least one slice");
        assert!(
            values.windows(2).all(|w| w[1] > w[0]),
            "time slices must be strictly increasing"
        );
        Self { values }
    }

    /// A steady (time-independent) axis.
    pub fn steady() -> Self {
        Self { values: vec![0.0] }
    }

    /// Number of time slices.
    pub fn n_slices(&self) -> usize {
        self.values.len()
    }

    /// Slice timestamps.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Whether the axis represents a steady field.
    pub fn is_steady(&self) -> bool {
        self.values.len() == 1
    }

    /// Bracket a query time into `(slice, frac)`.
    ///
    /// Steady axes accept any time with `(0, 0.0)`. Returns `None` when
    /// the time falls outside `[first, last]` of a multi-slice axis.
    pub fn locate(&self, time: f64) -> Option<(usize, f64)> {
        if self.is_steady() {
            return Some((0, 0.0));
        }
        let last = *self.values.last().unwrap();
        if !(time >= self.values[0] && time <= last) {
            return None;
        }
        if time == last {
            return Some((self.values.len() - 2, 1.0));
        }
        let i = match self
            .values
            .binary_search_by(|v| v.partial_cmp(&time).unwrap())
        {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let frac = (time - self.values[i]) / (self.values[i + 1] - self.values[i]);
        Some((i, frac))
    }
}
