//! Kernel specification and the two execution backends.
//!
//! A [`Kernel`] is a stateless per-particle, per-step update function.
//! It declares the field names it needs and addresses them by slot
//! (position in that declaration) through a [`KernelContext`]. The same
//! kernel runs unchanged against either backend:
//!
//! - [`ExecutionMode::Interpreted`]: every sample call resolves the
//!   field name in the field set again and starts the grid search from
//!   scratch (unless hint reuse is explicitly enabled).
//! - [`ExecutionMode::Compiled`]: the kernel is translated once ahead
//!   of the time loop (all field bindings resolved to indices) and
//!   per-particle cell-index caching is automatic.
//!
//! Correctness is backend-independent; only the per-call overhead
//! differs.

mod advection;
mod compiled;
mod interpreter;

pub use advection::{AdvectionEE, AdvectionRK4};
pub use compiled::CompiledContext;
pub use interpreter::InterpretedContext;

use crate::error::KernelError;
use crate::field::FieldSet;
use crate::particle::{Particle, ParticleStatus};

/// Sampling interface a kernel sees during one step.
///
/// `slot` indexes the kernel's [`Kernel::required_fields`] declaration.
/// Implementations differ only in how they resolve the slot and whether
/// they maintain the particle's search hints.
pub trait KernelContext {
    /// Sample the field bound to `slot` at a space-time point.
    fn sample(
        &mut self,
        slot: usize,
        time: f64,
        depth: f64,
        lat: f64,
        lon: f64,
    ) -> Result<f64, KernelError>;
}

/// A user-supplied per-particle update function.
///
/// Kernels must be stateless: all mutable state lives on the particle.
/// Positions and velocities share the grid's coordinate units (flat
/// coordinates), so `lon += u * dt` needs no unit conversion.
pub trait Kernel: Send + Sync {
    /// Kernel name for diagnostics.
    fn name(&self) -> &str;

    /// Names of the fields the kernel samples, in slot order.
    fn required_fields(&self) -> Vec<String>;

    /// Advance one particle by `dt` from `time`.
    ///
    /// The kernel may move the particle, mutate its variables, or
    /// delete it; it must not touch `particle.time` (the loop owns the
    /// clock).
    fn step(
        &self,
        particle: &mut Particle,
        ctx: &mut dyn KernelContext,
        time: f64,
        dt: f64,
    ) -> Result<(), KernelError>;
}

/// Which backend executes the kernel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Per-call field dispatch, fresh grid search each sample.
    Interpreted,
    /// Ahead-of-loop translation, automatic cell-index caching.
    #[default]
    Compiled,
}

/// Result of advancing one particle through a kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The particle advanced normally.
    Advanced,
    /// Every sampled field rejected the particle's position; the
    /// particle was flagged out of bounds and stops advancing.
    OutOfBounds,
    /// The kernel deleted the particle.
    Deleted,
}

/// A kernel bound to a field set and an execution mode.
///
/// Constructed once per run; in compiled mode this is where the
/// ahead-of-loop translation happens, so an unknown field name fails
/// here rather than mid-simulation.
pub struct Evaluator<'a> {
    kernel: &'a dyn Kernel,
    fieldset: &'a FieldSet,
    mode: ExecutionMode,
    /// Slot -> field name, used by the interpreted backend.
    field_names: Vec<String>,
    /// Slot -> member index, resolved up front by the compiled backend.
    bindings: Vec<usize>,
    /// Interpreted mode only: pass the particle's cached cell into the
    /// search instead of starting from scratch.
    reuse_hints: bool,
}

impl std::fmt::Debug for Evaluator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("mode", &self.mode)
            .field("field_names", &self.field_names)
            .field("bindings", &self.bindings)
            .field("reuse_hints", &self.reuse_hints)
            .finish_non_exhaustive()
    }
}

impl<'a> Evaluator<'a> {
    /// Bind a kernel to a field set.
    ///
    /// # Errors
    ///
    /// In compiled mode, [`KernelError::UnknownField`] when the kernel
    /// requires a field the set does not contain.
    pub fn new(
        mode: ExecutionMode,
        kernel: &'a dyn Kernel,
        fieldset: &'a FieldSet,
    ) -> Result<Self, KernelError> {
        let field_names = kernel.required_fields();
        let bindings = match mode {
            ExecutionMode::Interpreted => Vec::new(),
            ExecutionMode::Compiled => field_names
                .iter()
                .map(|name| {
                    fieldset
                        .index_of(name)
                        .ok_or_else(|| KernelError::UnknownField { name: name.clone() })
                })
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(Self {
            kernel,
            fieldset,
            mode,
            field_names,
            bindings,
            reuse_hints: false,
        })
    }

    /// Interpreted mode: explicitly pass the particle's last known cell
    /// into the grid search. No effect in compiled mode, where hint
    /// caching is always on.
    pub fn with_hint_reuse(mut self, reuse: bool) -> Self {
        self.reuse_hints = reuse;
        self
    }

    /// The execution mode this evaluator was built with.
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Advance one particle by `dt` from `time`.
    ///
    /// Particle-local sampling failures (out of bounds everywhere) flip
    /// the particle's status and report [`StepOutcome::OutOfBounds`];
    /// any other kernel failure is returned as a fatal error.
    pub fn step_particle(
        &self,
        particle: &mut Particle,
        time: f64,
        dt: f64,
    ) -> Result<StepOutcome, KernelError> {
        debug_assert!(particle.is_active());

        // The hint table moves out of the particle for the duration of
        // the step so the context can update it while the kernel holds
        // the particle mutably.
        let mut hints = std::mem::take(&mut particle.hints);
        let result = match self.mode {
            ExecutionMode::Interpreted => {
                let mut ctx = InterpretedContext::new(
                    self.fieldset,
                    &self.field_names,
                    self.reuse_hints.then_some(&mut hints),
                );
                self.kernel.step(particle, &mut ctx, time, dt)
            }
            ExecutionMode::Compiled => {
                let mut ctx = CompiledContext::new(self.fieldset, &self.bindings, &mut hints);
                self.kernel.step(particle, &mut ctx, time, dt)
            }
        };
        particle.hints = hints;

        match result {
            Ok(()) => {
                if particle.status == ParticleStatus::Deleted {
                    Ok(StepOutcome::Deleted)
                } else {
                    Ok(StepOutcome::Advanced)
                }
            }
            Err(KernelError::Sample(e)) if e.is_particle_local() => {
                particle.status = ParticleStatus::OutOfBounds;
                Ok(StepOutcome::OutOfBounds)
            }
            Err(e) => Err(e),
        }
    }
}

/// A kernel defined by a closure, for one-off sampling or test kernels.
///
/// # Example
///
/// ```
/// use drift_rs::kernel::{FnKernel, KernelContext};
///
/// // Accumulate the sampled U velocity into particle variable 0.
/// let sample_u = FnKernel::new("SampleU", vec!["U".to_string()], |p: &mut drift_rs::particle::Particle, ctx: &mut dyn KernelContext, time: f64, _dt: f64| {
///     let u = ctx.sample(0, time, p.depth, p.lat, p.lon)?;
///     let acc = p.var(0).unwrap_or(0.0);
///     p.set_var(0, acc + u);
///     Ok(())
/// });
/// # let _ = sample_u;
/// ```
pub struct FnKernel<F> {
    name: String,
    fields: Vec<String>,
    func: F,
}

impl<F> FnKernel<F>
where
    F: Fn(&mut Particle, &mut dyn KernelContext, f64, f64) -> Result<(), KernelError>
        + Send
        + Sync,
{
    /// Wrap a closure as a kernel.
    pub fn new(name: impl Into<String>, fields: Vec<String>, func: F) -> Self {
        Self {
            name: name.into(),
            fields,
            func,
        }
    }
}

impl<F> Kernel for FnKernel<F>
where
    F: Fn(&mut Particle, &mut dyn KernelContext, f64, f64) -> Result<(), KernelError>
        + Send
        + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn required_fields(&self) -> Vec<String> {
        self.fields.clone()
    }

    fn step(
        &self,
        particle: &mut Particle,
        ctx: &mut dyn KernelContext,
        time: f64,
        dt: f64,
    ) -> Result<(), KernelError> {
        (self.func)(particle, ctx, time, dt)
    }
}

/// Kernels chained in order, sharing one field declaration.
///
/// The combined declaration is the union of the parts' declarations in
/// first-appearance order; each part's slots are remapped onto it, so
/// parts stay oblivious to the chaining.
pub struct Sequence {
    name: String,
    parts: Vec<Box<dyn Kernel>>,
    combined: Vec<String>,
    maps: Vec<Vec<usize>>,
}

impl Sequence {
    /// Chain kernels in execution order.
    ///
    /// # Panics
    ///
    /// Panics if `parts` is empty.
    pub fn new(parts: Vec<Box<dyn Kernel>>) -> Self {
        assert!(!parts.is_empty(), "sequence needs at least one kernel");
        let name = parts
            .iter()
            .map(|k| k.name().to_string())
            .collect::<Vec<_>>()
            .join("+");

        let mut combined: Vec<String> = Vec::new();
        let mut maps = Vec::with_capacity(parts.len());
        for part in &parts {
            let mut map = Vec::new();
            for field in part.required_fields() {
                let slot = match combined.iter().position(|f| *f == field) {
                    Some(s) => s,
                    None => {
                        combined.push(field);
                        combined.len() - 1
                    }
                };
                map.push(slot);
            }
            maps.push(map);
        }

        Self {
            name,
            parts,
            combined,
            maps,
        }
    }
}

impl Kernel for Sequence {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_fields(&self) -> Vec<String> {
        self.combined.clone()
    }

    fn step(
        &self,
        particle: &mut Particle,
        ctx: &mut dyn KernelContext,
        time: f64,
        dt: f64,
    ) -> Result<(), KernelError> {
        for (part, map) in self.parts.iter().zip(self.maps.iter()) {
            let mut remapped = RemappedContext { inner: ctx, map };
            part.step(particle, &mut remapped, time, dt)?;
            if !particle.is_active() {
                break;
            }
        }
        Ok(())
    }
}

/// Context adapter translating a part's slots to the sequence's slots.
struct RemappedContext<'a, 'b> {
    inner: &'a mut dyn KernelContext,
    map: &'b [usize],
}

impl KernelContext for RemappedContext<'_, '_> {
    fn sample(
        &mut self,
        slot: usize,
        time: f64,
        depth: f64,
        lat: f64,
        lon: f64,
    ) -> Result<f64, KernelError> {
        let mapped = *self
            .map
            .get(slot)
            .ok_or(KernelError::UnknownSlot { slot })?;
        self.inner.sample(mapped, time, depth, lat, lon)
    }
}
