//! Axis-aligned bounding box

use log::trace;

use crate::enumeration::{Candidates, LatticeScan};
use crate::foundation::math::{constants, Vec3, Vec3Ext};
use crate::world::{Agent, Cell, CellPos, QueryError, WorldId, WorldQuery};

/// Box whose faces are parallel to the world axes
///
/// `min <= max` holds on every axis; the constructor sorts the corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisAlignedBox {
    world: WorldId,
    min: Vec3,
    max: Vec3,
}

impl AxisAlignedBox {
    /// Create a box from two opposite corners, given in any order
    pub fn new(world: WorldId, a: Vec3, b: Vec3) -> Self {
        Self {
            world,
            min: a.component_min(&b),
            max: a.component_max(&b),
        }
    }

    /// Box spanning `-half..half` around the origin
    pub fn centered(world: WorldId, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self::new(world, -half, half)
    }

    /// Unit cube occupying the cell at `pos`
    pub fn unit_cell(world: WorldId, pos: CellPos) -> Self {
        Self::cube_at(world, pos.center())
    }

    /// Unit cube centered on an arbitrary point
    pub fn cube_at(world: WorldId, center: Vec3) -> Self {
        let half = constants::ONE * 0.5;
        Self::new(world, center - half, center + half)
    }

    /// Bounds of an agent: its width centered on the feet, its height upward
    pub fn of_agent(agent: &Agent) -> Self {
        let half_width = agent.width * 0.5;
        let feet = agent.position;
        Self::new(
            agent.world,
            Vec3::new(feet.x - half_width, feet.y, feet.z - half_width),
            Vec3::new(feet.x + half_width, feet.y + agent.height, feet.z + half_width),
        )
    }

    /// Bounds of a cell. Cells without a collision volume collapse to a point.
    pub fn of_cell(cell: &Cell) -> Self {
        if cell.is_collidable() {
            Self::unit_cell(cell.world, cell.pos)
        } else {
            let center = cell.pos.center();
            Self::new(cell.world, center, center)
        }
    }

    /// World tag
    pub fn world(&self) -> WorldId {
        self.world
    }

    /// Minimum corner
    pub fn min(&self) -> Vec3 {
        self.min
    }

    /// Maximum corner
    pub fn max(&self) -> Vec3 {
        self.max
    }

    /// Center point
    pub fn center(&self) -> Vec3 {
        self.min.midpoint(&self.max)
    }

    /// Half of the size along each axis
    pub fn half_extents(&self) -> Vec3 {
        ((self.max - self.min) * 0.5).abs()
    }

    /// Same box moved so that its center is `center`
    #[must_use]
    pub fn at(&self, center: Vec3) -> Self {
        let half = self.half_extents();
        Self::new(self.world, center - half, center + half)
    }

    /// Grow the half-extents by `factor`, keeping the center
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        self.scale_xyz(factor, factor, factor)
    }

    /// Grow each half-extent by its own factor, keeping the center
    #[must_use]
    pub fn scale_xyz(&self, x: f64, y: f64, z: f64) -> Self {
        let half = self.half_extents();
        let grown = Vec3::new(half.x * x, half.y * y, half.z * z);
        let center = self.center();
        Self::new(self.world, center - grown, center + grown)
    }

    /// Closed-interval containment
    pub fn contains(&self, point: &Vec3) -> bool {
        (0..3).all(|axis| self.min[axis] <= point[axis] && point[axis] <= self.max[axis])
    }

    /// Strict slab overlap; boxes that only touch do not intersect
    pub fn intersects_aabb(&self, other: &AxisAlignedBox) -> bool {
        self.world == other.world
            && (0..3).all(|axis| self.min[axis] < other.max[axis] && self.max[axis] > other.min[axis])
    }

    /// Point of the box nearest to `target`
    pub fn closest_point(&self, target: &Vec3) -> Vec3 {
        target.component_max(&self.min).component_min(&self.max)
    }

    /// Agents whose bounds overlap the box
    pub fn entities(&self, world: &dyn WorldQuery) -> Result<Candidates<Agent>, QueryError> {
        let nearby = world.nearby_agents(self.center(), self.half_extents())?;
        trace!("AABB broad phase returned {} agents", nearby.len());
        let this = *self;
        Ok(Candidates::new(nearby, move |agent: &Agent| {
            this.intersects_aabb(&Self::of_agent(agent))
        }))
    }

    /// Cells whose unit cube overlaps the box
    pub fn blocks(&self) -> Candidates<CellPos> {
        let this = *self;
        Candidates::new(self.lattice(), move |pos: &CellPos| {
            this.intersects_aabb(&Self::unit_cell(this.world, *pos))
        })
    }

    /// Lattice points whose unit cube overlaps the box
    pub fn positions(&self) -> Candidates<Vec3> {
        let this = *self;
        Candidates::new(self.lattice().map(CellPos::center), move |point: &Vec3| {
            this.intersects_aabb(&Self::cube_at(this.world, *point))
        })
    }

    pub(crate) fn lattice(&self) -> LatticeScan {
        LatticeScan::around(self.center(), self.half_extents())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{AgentId, CellFlags};
    use approx::assert_relative_eq;

    const WORLD: WorldId = WorldId::new(1);

    #[test]
    fn test_corners_are_canonicalized() {
        let aabb = AxisAlignedBox::new(WORLD, Vec3::new(3.0, -1.0, 2.0), Vec3::new(-1.0, 4.0, 0.0));
        assert_eq!(aabb.min(), Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(aabb.max(), Vec3::new(3.0, 4.0, 2.0));
        assert_eq!(aabb.center(), Vec3::new(1.0, 1.5, 1.0));
        assert_eq!(aabb.half_extents(), Vec3::new(2.0, 2.5, 1.0));
    }

    #[test]
    fn test_touching_boxes_do_not_intersect() {
        let a = AxisAlignedBox::new(WORLD, Vec3::zeros(), constants::ONE);
        let b = AxisAlignedBox::new(WORLD, Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        assert!(!a.intersects_aabb(&b));
        assert!(a.intersects_aabb(&b.at(Vec3::new(1.4, 0.5, 0.5))));
    }

    #[test]
    fn test_contains_is_closed() {
        let aabb = AxisAlignedBox::new(WORLD, Vec3::zeros(), constants::ONE);
        assert!(aabb.contains(&Vec3::zeros()));
        assert!(aabb.contains(&constants::ONE));
        assert!(!aabb.contains(&Vec3::new(1.0, 1.0, 1.0001)));
    }

    #[test]
    fn test_at_and_scale_keep_shape() {
        let aabb = AxisAlignedBox::new(WORLD, Vec3::zeros(), Vec3::new(2.0, 4.0, 6.0));
        let moved = aabb.at(Vec3::new(10.0, 10.0, 10.0));
        assert_eq!(moved.center(), Vec3::new(10.0, 10.0, 10.0));
        assert_eq!(moved.half_extents(), aabb.half_extents());

        let scaled = aabb.scale(2.0);
        assert_eq!(scaled.center(), aabb.center());
        assert_eq!(scaled.half_extents(), Vec3::new(2.0, 4.0, 6.0));

        let stretched = aabb.scale_xyz(1.0, 0.5, 0.0);
        assert_eq!(stretched.half_extents(), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_agent_bounds() {
        let agent = Agent::new(AgentId::new(1), WORLD, Vec3::new(1.0, 64.0, -2.0), 0.6, 1.8);
        let bounds = AxisAlignedBox::of_agent(&agent);
        assert_relative_eq!(bounds.min(), Vec3::new(0.7, 64.0, -2.3), epsilon = 1e-12);
        assert_relative_eq!(bounds.max(), Vec3::new(1.3, 65.8, -1.7), epsilon = 1e-12);
    }

    #[test]
    fn test_cell_bounds() {
        let stone = Cell::new(WORLD, CellPos::new(2, 3, 4), CellFlags::SOLID);
        let bounds = AxisAlignedBox::of_cell(&stone);
        assert_eq!(bounds.min(), Vec3::new(1.5, 2.5, 3.5));
        assert_eq!(bounds.max(), Vec3::new(2.5, 3.5, 4.5));

        let air = Cell::new(WORLD, CellPos::new(2, 3, 4), CellFlags::AIR);
        assert_eq!(AxisAlignedBox::of_cell(&air).half_extents(), Vec3::zeros());
    }

    #[test]
    fn test_blocks_of_single_cell_box() {
        let aabb = AxisAlignedBox::new(WORLD, Vec3::new(-0.5, -0.5, -0.5), Vec3::new(0.5, 0.5, 0.5));
        let cells: Vec<_> = aabb.blocks().collect();
        assert_eq!(cells, vec![CellPos::new(0, 0, 0)]);
    }

    #[test]
    fn test_closest_point() {
        let aabb = AxisAlignedBox::new(WORLD, Vec3::zeros(), constants::ONE);
        assert_eq!(aabb.closest_point(&Vec3::new(2.0, 0.5, -3.0)), Vec3::new(1.0, 0.5, 0.0));
    }

    #[test]
    fn test_point_box() {
        let point = AxisAlignedBox::new(WORLD, Vec3::new(0.2, 0.3, -0.1), Vec3::new(0.2, 0.3, -0.1));
        assert_eq!(point.half_extents(), Vec3::zeros());
        assert!(point.intersects_aabb(&AxisAlignedBox::unit_cell(WORLD, CellPos::new(0, 0, 0))));
        assert!(!point.intersects_aabb(&point));
        assert_eq!(point.blocks().collect::<Vec<_>>(), vec![CellPos::new(0, 0, 0)]);
        assert_eq!(point.positions().collect::<Vec<_>>(), vec![Vec3::zeros()]);

        let on_edge = point.at(Vec3::new(0.5, 0.5, 0.0));
        assert_eq!(on_edge.blocks().count(), 0);
    }
}
