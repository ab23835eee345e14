//! World-facing types and the query service boundary
//!
//! Shapes never own world state. Everything they need from the simulation
//! (nearby agents, per-cell ray traces, cell properties) comes through the
//! [`WorldQuery`] trait, which callers pass explicitly to every enumeration
//! and ray-cast operation.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::foundation::math::Vec3;

/// Opaque world identity. Shapes tagged with different worlds never intersect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldId(u64);

impl WorldId {
    /// Create a world tag from a raw id
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "world#{}", self.0)
    }
}

/// Agent identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u64);

impl AgentId {
    /// Create a new agent id
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// A movable world object as reported by the world query service
///
/// The agent's footprint is a `width × width` square centered on `position`,
/// extending `height` upward from the position's y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Agent {
    /// Stable identity
    pub id: AgentId,
    /// World the agent lives in
    pub world: WorldId,
    /// Feet position
    pub position: Vec3,
    /// Horizontal size
    pub width: f64,
    /// Vertical size
    pub height: f64,
}

impl Agent {
    /// Create a new agent record
    pub const fn new(id: AgentId, world: WorldId, position: Vec3, width: f64, height: f64) -> Self {
        Self {
            id,
            world,
            position,
            width,
            height,
        }
    }

    /// Mid-height point of the agent, used as its hit position in ray casts
    pub fn body_center(&self) -> Vec3 {
        self.position + Vec3::new(0.0, self.height * 0.5, 0.0)
    }
}

/// Integer lattice coordinate of a grid cell.
///
/// Cell `p` is the unit volume centered on the lattice point `p` (spanning `p ± 0.5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellPos {
    /// X coordinate
    pub x: i64,
    /// Y coordinate
    pub y: i64,
    /// Z coordinate
    pub z: i64,
}

impl CellPos {
    /// Create a new cell position
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Center of the cell in world space
    #[allow(clippy::cast_precision_loss)]
    pub fn center(self) -> Vec3 {
        Vec3::new(self.x as f64, self.y as f64, self.z as f64)
    }

    /// Neighbouring cell across the given face
    pub const fn offset(self, face: Face) -> Self {
        let (dx, dy, dz) = face.direction();
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

bitflags! {
    /// Physical properties of a cell
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CellFlags: u8 {
        /// Agents can move through the cell
        const PASSABLE = 1 << 0;
        /// The cell holds a liquid
        const LIQUID = 1 << 1;
        /// The cell has a collision volume
        const COLLIDABLE = 1 << 2;
        /// The cell holds something other than air
        const OCCUPIED = 1 << 3;
    }
}

impl CellFlags {
    /// Empty air
    pub const AIR: Self = Self::PASSABLE;
    /// Full solid cell
    pub const SOLID: Self = Self::OCCUPIED.union(Self::COLLIDABLE);
    /// Liquid cell (passable, not collidable)
    pub const WATER: Self = Self::OCCUPIED.union(Self::PASSABLE).union(Self::LIQUID);
    /// Passable non-liquid filler such as foliage
    pub const FOLIAGE: Self = Self::OCCUPIED.union(Self::PASSABLE);
}

/// A grid cell together with its properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// World the cell belongs to
    pub world: WorldId,
    /// Lattice position
    pub pos: CellPos,
    /// Physical properties
    pub flags: CellFlags,
}

impl Cell {
    /// Create a new cell record
    pub const fn new(world: WorldId, pos: CellPos, flags: CellFlags) -> Self {
        Self { world, pos, flags }
    }

    /// Whether agents can move through the cell
    pub const fn is_passable(&self) -> bool {
        self.flags.contains(CellFlags::PASSABLE)
    }

    /// Whether the cell holds a liquid
    pub const fn is_liquid(&self) -> bool {
        self.flags.contains(CellFlags::LIQUID)
    }

    /// Whether the cell has a collision volume
    pub const fn is_collidable(&self) -> bool {
        self.flags.contains(CellFlags::COLLIDABLE)
    }

    /// Whether the cell holds nothing but air
    pub const fn is_empty(&self) -> bool {
        !self.flags.contains(CellFlags::OCCUPIED)
    }
}

/// Face of a cell struck by a ray
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    /// -Z
    North,
    /// +Z
    South,
    /// +X
    East,
    /// -X
    West,
    /// +Y
    Up,
    /// -Y
    Down,
}

impl Face {
    /// Outward unit step of the face
    pub const fn direction(self) -> (i64, i64, i64) {
        match self {
            Self::North => (0, 0, -1),
            Self::South => (0, 0, 1),
            Self::East => (1, 0, 0),
            Self::West => (-1, 0, 0),
            Self::Up => (0, 1, 0),
            Self::Down => (0, -1, 0),
        }
    }

    /// Face a ray enters through when stepping along `axis` with the given sign
    pub const fn entered_from(axis: usize, step: i64) -> Self {
        match (axis, step > 0) {
            (0, true) => Self::West,
            (0, false) => Self::East,
            (1, true) => Self::Down,
            (1, false) => Self::Up,
            (_, true) => Self::North,
            (_, false) => Self::South,
        }
    }
}

/// How liquids are treated by cell ray traces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FluidMode {
    /// Liquids never stop the ray
    Never,
    /// Liquids always stop the ray
    Always,
}

/// Result of a cell ray trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellHit {
    /// Cell that was hit
    pub pos: CellPos,
    /// Face the ray entered through
    pub face: Face,
}

/// Failures reported by the world query service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Spatial index cannot answer right now
    #[error("Spatial index unavailable: {0}")]
    IndexUnavailable(String),

    /// Cell is outside the loaded or permitted region
    #[error("Cell access denied at {0}")]
    CellAccessDenied(CellPos),

    /// Query issued against a world the service does not own
    #[error("World mismatch: expected {expected}, got {actual}")]
    WorldMismatch {
        /// World owned by the service
        expected: WorldId,
        /// World named by the query
        actual: WorldId,
    },
}

/// Agent predicate accepted by [`WorldQuery::ray_trace_agents`]
pub type AgentFilter<'a> = &'a (dyn Fn(&Agent) -> bool + Sync);

/// World query service consumed by enumeration and ray casts
///
/// Implementations may block while they consult their spatial index.
pub trait WorldQuery: Send + Sync {
    /// World this service answers for
    fn world_id(&self) -> WorldId;

    /// All agents whose bounds overlap the box `center ± extents`
    fn nearby_agents(&self, center: Vec3, extents: Vec3) -> Result<Vec<Agent>, QueryError>;

    /// First cell along the ray that stops it, up to `length`
    fn ray_trace_cells(
        &self,
        origin: Vec3,
        direction: Vec3,
        length: f64,
        fluid_mode: FluidMode,
        ignore_passable: bool,
    ) -> Result<Option<CellHit>, QueryError>;

    /// Closest agent accepted by `filter` whose bounds, grown by `thickness`,
    /// are crossed by the ray within `length`
    fn ray_trace_agents(
        &self,
        origin: Vec3,
        direction: Vec3,
        length: f64,
        thickness: f64,
        filter: AgentFilter<'_>,
    ) -> Result<Option<Agent>, QueryError>;

    /// Properties of the cell at `pos`
    fn cell(&self, pos: CellPos) -> Result<Cell, QueryError>;

    /// Highest y coordinate of the world
    fn max_height(&self) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_flags() {
        let water = Cell::new(WorldId::new(1), CellPos::new(0, 0, 0), CellFlags::WATER);
        assert!(water.is_passable());
        assert!(water.is_liquid());
        assert!(!water.is_collidable());

        let stone = Cell::new(WorldId::new(1), CellPos::new(0, 0, 0), CellFlags::SOLID);
        assert!(!stone.is_passable());
        assert!(stone.is_collidable());
        assert!(!stone.is_empty());

        let air = Cell::new(WorldId::new(1), CellPos::new(0, 0, 0), CellFlags::AIR);
        assert!(air.is_empty());
        assert!(air.is_passable());
    }

    #[test]
    fn test_face_offsets() {
        let origin = CellPos::new(0, 0, 0);
        assert_eq!(origin.offset(Face::Up), CellPos::new(0, 1, 0));
        assert_eq!(origin.offset(Face::North), CellPos::new(0, 0, -1));
        assert_eq!(Face::entered_from(1, -1), Face::Up);
        assert_eq!(Face::entered_from(0, 1), Face::West);
    }

    #[test]
    fn test_agent_body_center() {
        let agent = Agent::new(
            AgentId::new(7),
            WorldId::new(1),
            Vec3::new(1.0, 2.0, 3.0),
            0.6,
            1.8,
        );
        approx::assert_relative_eq!(agent.body_center(), Vec3::new(1.0, 2.9, 3.0), epsilon = 1e-12);
    }
}
