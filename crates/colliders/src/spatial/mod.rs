//! Spatial partitioning data structures
//!
//! Provides the grid walk used by ray casts, the octree that indexes agents,
//! and an in-memory world that answers [`crate::world::WorldQuery`] from both.

mod cell_walk;
mod memory_world;
mod octree;

pub use cell_walk::{CellWalk, WalkStep};
pub use memory_world::MemoryWorld;
pub use octree::{Bounds, Octree, OctreeConfig, OctreeEntry, OctreeNode};
