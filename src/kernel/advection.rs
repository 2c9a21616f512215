//! Built-in advection kernels.
//!
//! Both kernels sample the velocity members `"U"` (slot 0) and `"V"`
//! (slot 1) and work in flat coordinates: velocities are expressed in
//! grid units per time unit, so no metric conversion happens. Negative
//! `dt` advects backwards in time.

use crate::error::KernelError;
use crate::particle::Particle;

use super::{Kernel, KernelContext};

/// Explicit (forward) Euler advection, first order in `dt`.
pub struct AdvectionEE;

impl Kernel for AdvectionEE {
    fn name(&self) -> &str {
        "AdvectionEE"
    }

    fn required_fields(&self) -> Vec<String> {
        vec!["U".to_string(), "V".to_string()]
    }

    fn step(
        &self,
        p: &mut Particle,
        ctx: &mut dyn KernelContext,
        time: f64,
        dt: f64,
    ) -> Result<(), KernelError> {
        let u = ctx.sample(0, time, p.depth, p.lat, p.lon)?;
        let v = ctx.sample(1, time, p.depth, p.lat, p.lon)?;
        p.lon += u * dt;
        p.lat += v * dt;
        Ok(())
    }
}

/// Classic fourth-order Runge-Kutta advection.
pub struct AdvectionRK4;

impl Kernel for AdvectionRK4 {
    fn name(&self) -> &str {
        "AdvectionRK4"
    }

    fn required_fields(&self) -> Vec<String> {
        vec!["U".to_string(), "V".to_string()]
    }

    fn step(
        &self,
        p: &mut Particle,
        ctx: &mut dyn KernelContext,
        time: f64,
        dt: f64,
    ) -> Result<(), KernelError> {
        let (t_half, t_full) = (time + 0.5 * dt, time + dt);

        let u1 = ctx.sample(0, time, p.depth, p.lat, p.lon)?;
        let v1 = ctx.sample(1, time, p.depth, p.lat, p.lon)?;

        let (lon1, lat1) = (p.lon + 0.5 * u1 * dt, p.lat + 0.5 * v1 * dt);
        let u2 = ctx.sample(0, t_half, p.depth, lat1, lon1)?;
        let v2 = ctx.sample(1, t_half, p.depth, lat1, lon1)?;

        let (lon2, lat2) = (p.lon + 0.5 * u2 * dt, p.lat + 0.5 * v2 * dt);
        let u3 = ctx.sample(0, t_half, p.depth, lat2, lon2)?;
        let v3 = ctx.sample(1, t_half, p.depth, lat2, lon2)?;

        let (lon3, lat3) = (p.lon + u3 * dt, p.lat + v3 * dt);
        let u4 = ctx.sample(0, t_full, p.depth, lat3, lon3)?;
        let v4 = ctx.sample(1, t_full, p.depth, lat3, lon3)?;

        p.lon += (u1 + 2.0 * u2 + 2.0 * u3 + u4) * dt / 6.0;
        p.lat += (v1 + 2.0 * v2 + 2.0 * v3 + v4) * dt / 6.0;
        Ok(())
    }
}
