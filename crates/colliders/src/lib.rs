//! # Colliders
//!
//! Collision shapes for a voxel-style world simulation: exact pairwise
//! intersection and containment between boxes, spheres, oriented boxes,
//! thick rays and logical composites, plus broad/narrow-phase enumeration of
//! the agents, grid cells and lattice points a shape overlaps.
//!
//! ## Features
//!
//! - **Closed shape family**: every pair of kinds has an explicit intersection rule
//! - **World boundary**: all world access goes through the [`world::WorldQuery`] trait
//! - **Parallel enumeration**: narrow-phase filtering on a rayon worker pool
//! - **Single-owner hand-off**: results delivered to the thread that owns the world
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use colliders::prelude::*;
//!
//! fn main() -> Result<(), CollidersError> {
//!     let world = MemoryWorld::new(WorldId::new(1), -64.0, 320.0, 1024.0);
//!     world.fill(CellPos::new(-4, 0, -4), CellPos::new(4, 0, 4), CellFlags::SOLID)?;
//!
//!     let blast: Shape = Sphere::new(world.world_id(), Vec3::new(0.0, 1.0, 0.0), 2.5)?.into();
//!     let pool = EnumerationPool::new(&EnumerationConfig::default())?;
//!     let cells = blast.blocks().par_collect(&pool);
//!     println!("{} cells in range", cells.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod enumeration;
pub mod error;
pub mod foundation;
pub mod shapes;
pub mod spatial;
pub mod world;

#[cfg(test)]
mod tests;

pub use error::CollidersError;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        config::{CollidersConfig, Config, EnumerationConfig, RayConfig},
        enumeration::{handoff, Candidates, EnumerationPool, HandoffReceiver, HandoffSender},
        error::CollidersError,
        foundation::math::{EulerAngle, Vec3, Vec3Ext},
        shapes::{
            AxisAlignedBox, Composite, CompositeMode, OrientedBox, RayResolveOptions, RayShape,
            Shape, Sphere,
        },
        spatial::MemoryWorld,
        world::{Agent, AgentId, Cell, CellFlags, CellPos, QueryError, WorldId, WorldQuery},
    };
}
