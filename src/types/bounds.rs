//! 2D domain bounds.

use std::fmt;

/// 2D rectangular domain bounds in grid coordinates.
///
/// Stores the horizontal extent of a field's domain with clear
/// semantics for each boundary. All containment checks are
/// boundary-inclusive: a point exactly on an edge is inside.
///
/// # Example
///
/// ```
/// use drift_rs::types::Bounds2D;
///
/// // Fine-resolution patch of a nested configuration
/// let bounds = Bounds2D::new(
///     0.0,    // lon_min (west)
///     2000.0, // lon_max (east)
///     0.0,    // lat_min (south)
///     2000.0, // lat_max (north)
/// );
///
/// assert_eq!(bounds.width(), 2000.0);
/// assert!(bounds.contains(1000.0, 2000.0));
/// assert!(!bounds.contains(1000.0, 2000.1));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds2D {
    /// Minimum longitude (western boundary)
    pub lon_min: f64,
    /// Maximum longitude (eastern boundary)
    pub lon_max: f64,
    /// Minimum latitude (southern boundary)
    pub lat_min: f64,
    /// Maximum latitude (northern boundary)
    pub lat_max: f64,
}

impl Bounds2D {
    /// Create new domain bounds.
    ///
    /// # Panics
    ///
    /// Panics if `lon_max <= lon_min` or `lat_max <= lat_min`.
    pub fn new(lon_min: f64, lon_max: f64, lat_min: f64, lat_max: f64) -> Self {
        assert!(lon_max > lon_min, "lon_max must be greater than lon_min");
        assert!(lat_max > lat_min, "lat_max must be greater than lat_min");
        Self {
            lon_min,
            lon_max,
            lat_min,
            lat_max,
        }
    }

    /// East-west extent.
    pub fn width(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    /// North-south extent.
    pub fn height(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Center point `(lon, lat)`.
    pub fn center(&self) -> (f64, f64) {
        (
            0.5 * (self.lon_min + self.lon_max),
            0.5 * (self.lat_min + self.lat_max),
        )
    }

    /// Whether a point lies inside the bounds (edges inclusive).
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lon >= self.lon_min && lon <= self.lon_max && lat >= self.lat_min && lat <= self.lat_max
    }

    /// Smallest bounds enclosing both `self` and `other`.
    pub fn union(&self, other: &Bounds2D) -> Bounds2D {
        Bounds2D {
            lon_min: self.lon_min.min(other.lon_min),
            lon_max: self.lon_max.max(other.lon_max),
            lat_min: self.lat_min.min(other.lat_min),
            lat_max: self.lat_max.max(other.lat_max),
        }
    }
}

impl fmt::Display for Bounds2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}] x [{}, {}]",
            self.lon_min, self.lon_max, self.lat_min, self.lat_max
        )
    }
}
