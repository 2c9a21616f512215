//! Interpreted kernel execution.

use crate::error::KernelError;
use crate::field::FieldSet;
use crate::grid::GridIndex;

use super::KernelContext;

/// Per-call dispatching context: the interpreted backend.
///
/// Every sample resolves the slot's field *name* against the field set
/// again, and by default starts the grid search from scratch. That is
/// the cost profile of running the kernel through a generic evaluator. With
/// hint reuse enabled the search is seeded from the particle's cached
/// cell, which is the caller-managed variant of the optimization the
/// compiled backend applies automatically.
pub struct InterpretedContext<'a> {
    fieldset: &'a FieldSet,
    field_names: &'a [String],
    hints: Option<&'a mut Vec<Option<GridIndex>>>,
}

impl<'a> InterpretedContext<'a> {
    /// Create a context for one particle step.
    ///
    /// `hints` is the particle's per-grid hint table; `None` disables
    /// hint use entirely (the default interpreted behavior).
    pub fn new(
        fieldset: &'a FieldSet,
        field_names: &'a [String],
        hints: Option<&'a mut Vec<Option<GridIndex>>>,
    ) -> Self {
        Self {
            fieldset,
            field_names,
            hints,
        }
    }
}

impl KernelContext for InterpretedContext<'_> {
    fn sample(
        &mut self,
        slot: usize,
        time: f64,
        depth: f64,
        lat: f64,
        lon: f64,
    ) -> Result<f64, KernelError> {
        let name = self
            .field_names
            .get(slot)
            .ok_or(KernelError::UnknownSlot { slot })?;
        // Name resolution happens on every call by design.
        let member = self
            .fieldset
            .index_of(name)
            .ok_or_else(|| KernelError::UnknownField { name: name.clone() })?;

        let sample = self.fieldset.sample_member(
            member,
            time,
            depth,
            lat,
            lon,
            self.hints.as_deref().map(|h| h.as_slice()),
        )?;
        if let Some(hints) = self.hints.as_deref_mut() {
            hints[sample.grid_slot] = Some(sample.cell);
        }
        Ok(sample.value)
    }
}
