//! Sphere shape

use log::trace;

use super::{AxisAlignedBox, ShapeError};
use crate::enumeration::Candidates;
use crate::foundation::math::Vec3;
use crate::world::{Agent, CellPos, QueryError, WorldId, WorldQuery};

/// Sphere given by center and radius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    world: WorldId,
    center: Vec3,
    radius: f64,
}

impl Sphere {
    /// Create a sphere. A zero radius is a valid point-like sphere.
    pub fn new(world: WorldId, center: Vec3, radius: f64) -> Result<Self, ShapeError> {
        if radius < 0.0 {
            return Err(ShapeError::NegativeRadius(radius));
        }
        Ok(Self {
            world,
            center,
            radius,
        })
    }

    /// World tag
    pub fn world(&self) -> WorldId {
        self.world
    }

    /// Center point
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Radius
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// `(radius, radius, radius)`
    pub fn half_extents(&self) -> Vec3 {
        Vec3::repeat(self.radius)
    }

    /// Same sphere moved to `center`
    #[must_use]
    pub fn at(&self, center: Vec3) -> Self {
        Self { center, ..*self }
    }

    /// Sphere with its radius multiplied by `factor`
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            radius: self.radius * factor.abs(),
            ..*self
        }
    }

    /// Distance to the center is at most the radius
    pub fn contains(&self, point: &Vec3) -> bool {
        (point - self.center).norm_squared() <= self.radius * self.radius
    }

    /// Distance between centers is at most the sum of radii
    pub fn intersects_sphere(&self, other: &Sphere) -> bool {
        let reach = self.radius + other.radius;
        self.world == other.world && (other.center - self.center).norm_squared() <= reach * reach
    }

    /// The box point nearest to the center lies inside the sphere
    pub fn intersects_aabb(&self, aabb: &AxisAlignedBox) -> bool {
        self.world == aabb.world() && self.contains(&aabb.closest_point(&self.center))
    }

    /// Agents whose bounds overlap the sphere
    pub fn entities(&self, world: &dyn WorldQuery) -> Result<Candidates<Agent>, QueryError> {
        let nearby = world.nearby_agents(self.center, self.half_extents())?;
        trace!("Sphere broad phase returned {} agents", nearby.len());
        let this = *self;
        Ok(Candidates::new(nearby, move |agent: &Agent| {
            this.intersects_aabb(&AxisAlignedBox::of_agent(agent))
        }))
    }

    /// Cells whose unit cube meets the sphere, tangent cells included
    pub fn blocks(&self) -> Candidates<CellPos> {
        let this = *self;
        Candidates::new(self.bounds().lattice(), move |pos: &CellPos| {
            this.intersects_aabb(&AxisAlignedBox::unit_cell(this.world, *pos))
        })
    }

    /// Lattice points whose unit cube overlaps the sphere
    pub fn positions(&self) -> Candidates<Vec3> {
        let this = *self;
        Candidates::new(self.bounds().lattice().map(CellPos::center), move |point: &Vec3| {
            this.intersects_aabb(&AxisAlignedBox::cube_at(this.world, *point))
        })
    }

    fn bounds(&self) -> AxisAlignedBox {
        AxisAlignedBox::centered(self.world, self.half_extents()).at(self.center)
    }
}
