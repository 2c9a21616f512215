//! Compiled kernel execution.

use crate::error::KernelError;
use crate::field::FieldSet;
use crate::grid::GridIndex;

use super::KernelContext;

/// Pre-bound context: the compiled backend.
///
/// Field bindings were resolved to member indices once, ahead of the
/// time loop (see [`super::Evaluator::new`]); a sample call is an array
/// index away from the field. The particle's cell-index cache is always
/// consulted to seed the grid search and always updated afterwards.
pub struct CompiledContext<'a> {
    fieldset: &'a FieldSet,
    /// Slot -> field-set member index.
    bindings: &'a [usize],
    hints: &'a mut Vec<Option<GridIndex>>,
}

impl<'a> CompiledContext<'a> {
    /// Create a context for one particle step.
    pub fn new(
        fieldset: &'a FieldSet,
        bindings: &'a [usize],
        hints: &'a mut Vec<Option<GridIndex>>,
    ) -> Self {
        Self {
            fieldset,
            bindings,
            hints,
        }
    }
}

impl KernelContext for CompiledContext<'_> {
    fn sample(
        &mut self,
        slot: usize,
        time: f64,
        depth: f64,
        lat: f64,
        lon: f64,
    ) -> Result<f64, KernelError> {
        let member = *self
            .bindings
            .get(slot)
            .ok_or(KernelError::UnknownSlot { slot })?;
        let sample =
            self.fieldset
                .sample_member(member, time, depth, lat, lon, Some(self.hints.as_slice()))?;
        self.hints[sample.grid_slot] = Some(sample.cell);
        Ok(sample.value)
    }
}
