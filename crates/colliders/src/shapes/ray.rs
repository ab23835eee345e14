//! Thick ray
//!
//! Geometrically a ray is an oriented box stretched along its direction, and
//! every geometric query delegates to that box. On top of the geometry a ray
//! can walk the cell grid and ask the world for the first cell or agent it
//! strikes.

use log::trace;
use serde::{Deserialize, Serialize};

use super::{AxisAlignedBox, OrientedBox, ShapeError};
use crate::config::RayConfig;
use crate::enumeration::Candidates;
use crate::foundation::math::{constants, EulerAngle, Vec3};
use crate::spatial::CellWalk;
use crate::world::{
    Agent, AgentFilter, Cell, CellHit, CellPos, FluidMode, QueryError, WorldId, WorldQuery,
};

/// Which cells a grid walk skips and whether obstacles end it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellScan {
    /// Skip passable liquid cells
    pub ignore_liquids: bool,
    /// Skip passable non-liquid cells
    pub ignore_passable: bool,
    /// Keep walking past non-passable cells the filter rejected
    pub ignore_obstacles: bool,
}

/// Options for [`RayShape::resolve_position`]
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RayResolveOptions {
    /// Do not look for agents
    pub ignore_entities: bool,
    /// Do not look for cells
    pub ignore_blocks: bool,
    /// Skip liquid cells during the walk
    pub ignore_liquids: bool,
    /// Skip passable cells during the walk
    pub ignore_passable: bool,
}

/// Ray with a thickness, backed by an oriented box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayShape {
    world: WorldId,
    origin: Vec3,
    direction: Vec3,
    length: f64,
    thickness: f64,
    obb: OrientedBox,
}

impl RayShape {
    /// Create a ray. `direction` is normalized.
    pub fn new(
        world: WorldId,
        origin: Vec3,
        direction: Vec3,
        length: f64,
        thickness: f64,
    ) -> Result<Self, ShapeError> {
        if length < 0.0 {
            return Err(ShapeError::NegativeExtent(length));
        }
        if thickness < 0.0 {
            return Err(ShapeError::NegativeExtent(thickness));
        }
        let norm = direction.norm();
        if norm == 0.0 || !norm.is_finite() {
            return Err(ShapeError::ZeroDirection);
        }
        let direction = direction / norm;

        // box centered one length ahead, reaching back to the origin
        let obb = OrientedBox::new(
            world,
            origin + direction * length,
            Vec3::new(thickness, thickness, length),
            EulerAngle::from_direction(direction),
        );

        Ok(Self {
            world,
            origin,
            direction,
            length,
            thickness,
            obb,
        })
    }

    /// World tag
    pub fn world(&self) -> WorldId {
        self.world
    }

    /// Start point
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Unit direction
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Reach along the direction
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Sideways half-size
    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    /// Pitch and yaw of the backing box
    pub fn rotation(&self) -> EulerAngle {
        self.obb.rotation()
    }

    /// Box used for every geometric query
    pub fn oriented_box(&self) -> &OrientedBox {
        &self.obb
    }

    /// Point one length ahead of the origin
    pub fn end(&self) -> Vec3 {
        self.origin + self.direction * self.length
    }

    /// The ray's center is its origin
    pub fn center(&self) -> Vec3 {
        self.origin
    }

    /// Half-extents of the backing box
    pub fn half_extents(&self) -> Vec3 {
        self.obb.half_extents()
    }

    /// Same ray starting at `origin`
    #[must_use]
    pub fn at(&self, origin: Vec3) -> Self {
        self.rebuilt(origin, self.length, self.thickness)
    }

    /// Same ray with length and thickness multiplied by `|factor|`
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        let factor = factor.abs();
        self.rebuilt(self.origin, self.length * factor, self.thickness * factor)
    }

    fn rebuilt(&self, origin: Vec3, length: f64, thickness: f64) -> Self {
        let obb = OrientedBox::new(
            self.world,
            origin + self.direction * length,
            Vec3::new(thickness, thickness, length),
            self.obb.rotation(),
        );
        Self {
            world: self.world,
            origin,
            direction: self.direction,
            length,
            thickness,
            obb,
        }
    }

    /// Point containment within the backing box
    pub fn contains(&self, point: &Vec3) -> bool {
        self.obb.contains(point)
    }

    /// Agents overlapping the backing box
    pub fn entities(&self, world: &dyn WorldQuery) -> Result<Candidates<Agent>, QueryError> {
        self.obb.entities(world)
    }

    /// Cells covered by the backing box
    pub fn blocks(&self) -> Candidates<CellPos> {
        self.obb.blocks()
    }

    /// Lattice points covered by the backing box
    pub fn positions(&self) -> Candidates<Vec3> {
        self.obb.positions()
    }

    /// First cell that stops the ray according to the world's own trace
    pub fn first_block_hit(
        &self,
        world: &dyn WorldQuery,
        ignore_liquids: bool,
        ignore_passable: bool,
    ) -> Result<Option<CellHit>, QueryError> {
        world.ray_trace_cells(
            self.origin,
            self.direction,
            self.length,
            fluid_mode(ignore_liquids),
            ignore_passable,
        )
    }

    /// First cell along the ray accepted by `filter`, walking past obstacles
    pub fn first_block_matching<F>(
        &self,
        world: &dyn WorldQuery,
        ignore_liquids: bool,
        ignore_passable: bool,
        filter: F,
    ) -> Result<Option<Cell>, QueryError>
    where
        F: Fn(&Cell) -> bool,
    {
        let scan = CellScan {
            ignore_liquids,
            ignore_passable,
            ignore_obstacles: true,
        };
        self.first_block_matching_with(world, &RayConfig::default(), scan, filter)
    }

    /// First cell along the ray accepted by `filter`.
    ///
    /// The walk covers at most `min(config.max_walk_steps, ceil(length))` units
    /// and ends early when it leaves the region the world lets it read.
    pub fn first_block_matching_with<F>(
        &self,
        world: &dyn WorldQuery,
        config: &RayConfig,
        scan: CellScan,
        filter: F,
    ) -> Result<Option<Cell>, QueryError>
    where
        F: Fn(&Cell) -> bool,
    {
        let reach = f64::from(config.max_walk_steps).min(self.length.ceil());
        for step in CellWalk::new(self.origin, self.direction, reach) {
            let cell = match world.cell(step.pos) {
                Ok(cell) => cell,
                Err(QueryError::CellAccessDenied(pos)) => {
                    trace!("Ray walk stopped at inaccessible cell {pos}");
                    break;
                }
                Err(err) => return Err(err),
            };

            let passable = cell.is_passable();
            if passable {
                if cell.is_liquid() {
                    if scan.ignore_liquids {
                        continue;
                    }
                } else if scan.ignore_passable {
                    continue;
                }
            }
            if filter(&cell) {
                return Ok(Some(cell));
            }
            if !scan.ignore_obstacles && !passable {
                break;
            }
        }
        Ok(None)
    }

    /// Closest agent accepted by `filter` within `distance` of the origin
    pub fn first_entity_hit(
        &self,
        world: &dyn WorldQuery,
        filter: AgentFilter<'_>,
        distance: f64,
    ) -> Result<Option<Agent>, QueryError> {
        world.ray_trace_agents(
            self.origin,
            self.direction,
            distance,
            self.thickness,
            filter,
        )
    }

    /// Point the ray effectively reaches, using the default [`RayConfig`]
    pub fn resolve_position(
        &self,
        world: &dyn WorldQuery,
        options: &RayResolveOptions,
        entity_filter: AgentFilter<'_>,
        block_filter: &dyn Fn(&Cell) -> bool,
    ) -> Result<Vec3, QueryError> {
        self.resolve_position_with(
            world,
            &RayConfig::default(),
            options,
            entity_filter,
            block_filter,
        )
    }

    /// Point the ray effectively reaches.
    ///
    /// A matching cell shortens the ray to just before that cell's center,
    /// and an agent found within the shortened ray wins over the cell. With
    /// neither, the result is the ray's end point.
    pub fn resolve_position_with(
        &self,
        world: &dyn WorldQuery,
        config: &RayConfig,
        options: &RayResolveOptions,
        entity_filter: AgentFilter<'_>,
        block_filter: &dyn Fn(&Cell) -> bool,
    ) -> Result<Vec3, QueryError> {
        let mut distance = self.length;
        let mut block_position = None;

        if !options.ignore_blocks {
            let scan = CellScan {
                ignore_liquids: options.ignore_liquids,
                ignore_passable: options.ignore_passable,
                ignore_obstacles: true,
            };
            if let Some(cell) = self.first_block_matching_with(world, config, scan, block_filter)? {
                let reach = ((cell.pos.center() - self.origin).norm() - config.surface_offset).max(0.0);
                let surface = self.origin + self.direction * reach;
                distance = (surface - self.origin).norm();
                block_position = Some(surface);
            }
        }

        let entity_position = if options.ignore_entities {
            None
        } else {
            self.first_entity_hit(world, entity_filter, distance)?
                .map(|agent| agent.body_center())
        };

        Ok(entity_position
            .or(block_position)
            .unwrap_or_else(|| self.end()))
    }

    /// Height of `point` above the top of the first cell straight below it.
    ///
    /// The search reaches down at most `min(max_height, point.y)`. With no cell
    /// found the ground is taken to be `y = 0`.
    pub fn distance_above_ground(
        world: &dyn WorldQuery,
        point: Vec3,
        ignore_liquids: bool,
    ) -> Result<f64, QueryError> {
        let reach = world.max_height().min(point.y).max(0.0);
        let hit = world.ray_trace_cells(
            point,
            constants::MINUS_J,
            reach,
            fluid_mode(ignore_liquids),
            true,
        )?;

        let ground = match hit {
            Some(hit) => AxisAlignedBox::of_cell(&world.cell(hit.pos)?).max().y,
            None => 0.0,
        };
        Ok(point.y - ground)
    }
}

const fn fluid_mode(ignore_liquids: bool) -> FluidMode {
    if ignore_liquids {
        FluidMode::Never
    } else {
        FluidMode::Always
    }
}
