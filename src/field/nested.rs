//! Ordered fallback collections of fields.

use crate::error::SampleError;
use crate::grid::GridIndex;
use crate::types::Bounds2D;

use super::Field;

/// Result of a successful nested-field sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NestedSample {
    /// Interpolated value from the winning member.
    pub value: f64,
    /// Index of the member field that answered the query.
    pub field_index: usize,
    /// Cell of the winning member's grid, for hint reuse.
    pub cell: GridIndex,
}

/// An ordered sequence of fields queried with fallback-on-out-of-bounds
/// semantics.
///
/// Order encodes resolution priority: put the finest-resolution field
/// first so it wins wherever the query point falls inside it, with
/// coarser fields as fallback coverage. The order is fixed at
/// construction and must not change during a run.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use drift_rs::field::{Field, NestedField};
/// use drift_rs::grid::{Grid, RectilinearGrid};
///
/// let fine = Arc::new(Grid::Rectilinear(
///     RectilinearGrid::uniform(0.0, 2000.0, 0.0, 2000.0, 21, 21),
/// ));
/// let coarse = Arc::new(Grid::Rectilinear(
///     RectilinearGrid::uniform(-2000.0, 18000.0, -1000.0, 3000.0, 21, 5),
/// ));
///
/// let nested = NestedField::new(
///     "U",
///     vec![
///         Field::from_fn("U_fine", fine, |_, _, _| 1.0),
///         Field::from_fn("U_coarse", coarse, |_, _, _| 2.0),
///     ],
/// );
///
/// // Inside the fine patch the fine field wins...
/// let s = nested.sample(0.0, 0.0, 1000.0, 1000.0).unwrap();
/// assert_eq!((s.value, s.field_index), (1.0, 0));
/// // ...outside it the query falls through to the coarse field.
/// let s = nested.sample(0.0, 0.0, 1000.0, 5000.0).unwrap();
/// assert_eq!((s.value, s.field_index), (2.0, 1));
/// ```
#[derive(Clone, Debug)]
pub struct NestedField {
    /// Name of the nested field as a whole.
    pub name: String,
    fields: Vec<Field>,
}

impl NestedField {
    /// Create a nested field from members in priority order.
    ///
    /// # Panics
    ///
    /// Panics if `fields` is empty.
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        assert!(!fields.is_empty(), "nested field needs at least one member");
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Member fields in priority order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Number of member fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false: nested fields hold at least one member.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Union of all member extents.
    pub fn bounds(&self) -> Bounds2D {
        let mut b = self.fields[0].grid().bounds();
        for f in &self.fields[1..] {
            b = b.union(&f.grid().bounds());
        }
        b
    }

    /// Sample the nested field without search hints.
    ///
    /// See [`NestedField::sample_with_hints`] for semantics.
    pub fn sample(
        &self,
        time: f64,
        depth: f64,
        lat: f64,
        lon: f64,
    ) -> Result<NestedSample, SampleError> {
        self.sample_with_hints(time, depth, lat, lon, |_| None)
    }

    /// Sample the nested field, trying members in order.
    ///
    /// The first member containing the point answers the query and the
    /// scan short-circuits. Members rejecting the point as out of
    /// bounds pass it along; any other failure (e.g. time
    /// extrapolation) propagates immediately without trying further
    /// members. When every member rejects the point the call fails with
    /// [`SampleError::AllFieldsOutOfBounds`].
    ///
    /// `hint_for(k)` supplies the last known cell on member `k`'s grid;
    /// the winning member's cell comes back in the sample for reuse.
    pub fn sample_with_hints<H>(
        &self,
        time: f64,
        depth: f64,
        lat: f64,
        lon: f64,
        hint_for: H,
    ) -> Result<NestedSample, SampleError>
    where
        H: Fn(usize) -> Option<GridIndex>,
    {
        for (k, field) in self.fields.iter().enumerate() {
            match field.sample(time, depth, lat, lon, hint_for(k)) {
                Ok(s) => {
                    return Ok(NestedSample {
                        value: s.value,
                        field_index: k,
                        cell: s.cell,
                    });
                }
                Err(e) if e.allows_fallback() => continue,
                Err(e) => return Err(e),
            }
        }
        Err(SampleError::AllFieldsOutOfBounds {
            field: self.name.clone(),
        })
    }
}
