//! Named collections of fields sharing a grid registry.

use std::sync::Arc;

use crate::error::SampleError;
use crate::grid::{Grid, GridIndex};

use super::{Field, NestedField};

/// A member of a [`FieldSet`]: either a plain field or a nested
/// fallback collection, behind one sampling contract.
#[derive(Clone, Debug)]
pub enum SetMember {
    /// A single field.
    Scalar(Field),
    /// An ordered fallback collection.
    Nested(NestedField),
}

impl SetMember {
    /// The member's name within the set.
    pub fn name(&self) -> &str {
        match self {
            SetMember::Scalar(f) => &f.name,
            SetMember::Nested(f) => &f.name,
        }
    }

    fn grids(&self) -> Vec<&Arc<Grid>> {
        match self {
            SetMember::Scalar(f) => vec![f.grid()],
            SetMember::Nested(f) => f.fields().iter().map(|f| f.grid()).collect(),
        }
    }
}

/// Result of sampling a field-set member.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldSample {
    /// Interpolated value.
    pub value: f64,
    /// For nested members, the index of the winning member field;
    /// always 0 for scalar members.
    pub field_index: usize,
    /// The cell the point fell into on the answering field's grid.
    pub cell: GridIndex,
    /// Registry slot of that grid, for writing the hint back into the
    /// particle's per-grid hint table.
    pub grid_slot: usize,
}

/// A named collection of fields queried by kernels.
///
/// The set also maintains a registry of the distinct grids behind its
/// fields, deduplicated by identity. Particles carry one cached cell
/// index per registry slot, so two fields on the same grid share one
/// hint (both velocity components of a model, typically).
///
/// Member names are unique; adding a duplicate name panics.
#[derive(Clone, Debug, Default)]
pub struct FieldSet {
    members: Vec<SetMember>,
    grids: Vec<Arc<Grid>>,
    member_grid_slots: Vec<Vec<usize>>,
}

impl FieldSet {
    /// Create an empty field set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set holding the two velocity components of a model.
    pub fn from_velocities(u: Field, v: Field) -> Self {
        let mut set = Self::new();
        set.add_field(u);
        set.add_field(v);
        set
    }

    /// Create a set holding two nested velocity components.
    pub fn from_nested_velocities(u: NestedField, v: NestedField) -> Self {
        let mut set = Self::new();
        set.add_nested(u);
        set.add_nested(v);
        set
    }

    /// Add a plain field; returns its member index.
    ///
    /// # Panics
    ///
    /// Panics if a member with the same name already exists.
    pub fn add_field(&mut self, field: Field) -> usize {
        self.push_member(SetMember::Scalar(field))
    }

    /// Add a nested field; returns its member index.
    ///
    /// # Panics
    ///
    /// Panics if a member with the same name already exists.
    pub fn add_nested(&mut self, field: NestedField) -> usize {
        self.push_member(SetMember::Nested(field))
    }

    fn push_member(&mut self, member: SetMember) -> usize {
        assert!(
            self.index_of(member.name()).is_none(),
            "field set already contains a member named '{}'",
            member.name()
        );
        let slots = member
            .grids()
            .into_iter()
            .map(|g| {
                let g = Arc::clone(g);
                self.register_grid(g)
            })
            .collect();
        self.members.push(member);
        self.member_grid_slots.push(slots);
        self.members.len() - 1
    }

    fn register_grid(&mut self, grid: Arc<Grid>) -> usize {
        if let Some(slot) = self.grids.iter().position(|g| Arc::ptr_eq(g, &grid)) {
            return slot;
        }
        self.grids.push(grid);
        self.grids.len() - 1
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the set has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of distinct grids behind the members.
    ///
    /// Particles size their hint tables to this.
    pub fn n_grids(&self) -> usize {
        self.grids.len()
    }

    /// Member by index.
    pub fn member(&self, index: usize) -> &SetMember {
        &self.members[index]
    }

    /// Index of a member by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name() == name)
    }

    /// Member by name.
    pub fn get(&self, name: &str) -> Option<&SetMember> {
        self.members.iter().find(|m| m.name() == name)
    }

    /// Sample member `index` at a space-time point.
    ///
    /// `hints` is the querying particle's per-grid hint table (length
    /// [`FieldSet::n_grids`]); pass `None` for a fresh search. The
    /// returned [`FieldSample::grid_slot`] says which table entry to
    /// update with [`FieldSample::cell`].
    pub fn sample_member(
        &self,
        index: usize,
        time: f64,
        depth: f64,
        lat: f64,
        lon: f64,
        hints: Option<&[Option<GridIndex>]>,
    ) -> Result<FieldSample, SampleError> {
        let slots = &self.member_grid_slots[index];
        match &self.members[index] {
            SetMember::Scalar(f) => {
                let hint = hints.and_then(|h| h[slots[0]]);
                let s = f.sample(time, depth, lat, lon, hint)?;
                Ok(FieldSample {
                    value: s.value,
                    field_index: 0,
                    cell: s.cell,
                    grid_slot: slots[0],
                })
            }
            SetMember::Nested(f) => {
                let s = f.sample_with_hints(time, depth, lat, lon, |k| {
                    hints.and_then(|h| h[slots[k]])
                })?;
                Ok(FieldSample {
                    value: s.value,
                    field_index: s.field_index,
                    cell: s.cell,
                    grid_slot: slots[s.field_index],
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::RectilinearGrid;

    fn grid() -> Arc<Grid> {
        Arc::new(Grid::Rectilinear(RectilinearGrid::uniform(
            0.0, 100.0, 0.0, 100.0, 11, 11,
        )))
    }

    #[test]
    fn test_shared_grid_registered_once() {
        let g = grid();
        let set = FieldSet::from_velocities(
            Field::from_fn("U", Arc::clone(&g), |_, _, _| 1.0),
            Field::from_fn("V", Arc::clone(&g), |_, _, _| 2.0),
        );
        assert_eq!(set.len(), 2);
        assert_eq!(set.n_grids(), 1);
    }

    #[test]
    fn test_distinct_grids_get_distinct_slots() {
        let mut set = FieldSet::new();
        set.add_field(Field::from_fn("U", grid(), |_, _, _| 1.0));
        set.add_field(Field::from_fn("P", grid(), |_, _, _| 3.0));
        assert_eq!(set.n_grids(), 2);
    }

    #[test]
    fn test_lookup_by_name() {
        let g = grid();
        let mut set = FieldSet::new();
        set.add_field(Field::from_fn("U", Arc::clone(&g), |_, _, _| 1.0));
        set.add_field(Field::from_fn("V", g, |_, _, _| 2.0));
        assert_eq!(set.index_of("V"), Some(1));
        assert_eq!(set.get("V").map(|m| m.name()), Some("V"));
        assert_eq!(set.index_of("W"), None);
    }

    #[test]
    #[should_panic(expected = "already contains a member named")]
    fn test_duplicate_name_panics() {
        let g = grid();
        let mut set = FieldSet::new();
        set.add_field(Field::from_fn("U", Arc::clone(&g), |_, _, _| 1.0));
        set.add_field(Field::from_fn("U", g, |_, _, _| 2.0));
    }

    #[test]
    fn test_sample_member_scalar() {
        let set = FieldSet::from_velocities(
            Field::from_fn("U", grid(), |_, _, _| 1.5),
            Field::from_fn("V", grid(), |_, _, _| -0.5),
        );
        let s = set.sample_member(0, 0.0, 0.0, 50.0, 50.0, None).unwrap();
        assert_eq!(s.value, 1.5);
        assert_eq!(s.field_index, 0);
        let s = set.sample_member(1, 0.0, 0.0, 50.0, 50.0, None).unwrap();
        assert_eq!(s.value, -0.5);
    }

    #[test]
    fn test_sample_member_nested_reports_grid_slot() {
        let fine = grid();
        let coarse = Arc::new(Grid::Rectilinear(RectilinearGrid::uniform(
            -1000.0, 1000.0, -1000.0, 1000.0, 21, 21,
        )));
        let nested = NestedField::new(
            "U",
            vec![
                Field::from_fn("U_fine", fine, |_, _, _| 1.0),
                Field::from_fn("U_coarse", coarse, |_, _, _| 2.0),
            ],
        );
        let mut set = FieldSet::new();
        set.add_nested(nested);
        assert_eq!(set.n_grids(), 2);

        // Falls through to the coarse member -> its grid slot comes back.
        let s = set
            .sample_member(0, 0.0, 0.0, -500.0, -500.0, None)
            .unwrap();
        assert_eq!(s.field_index, 1);
        assert_eq!(s.grid_slot, 1);
        assert_eq!(s.value, 2.0);

        // Hints table is consulted per member grid.
        let mut hints = vec![None; set.n_grids()];
        hints[s.grid_slot] = Some(s.cell);
        let s2 = set
            .sample_member(0, 0.0, 0.0, -500.0, -500.0, Some(&hints))
            .unwrap();
        assert_eq!(s, s2);
    }
}
