//! Shared value types.
//!
//! Small copyable types used across the crate: spatial domain bounds
//! and strongly-typed identifiers.

mod bounds;
mod indices;

pub use bounds::Bounds2D;
pub use indices::ParticleId;
