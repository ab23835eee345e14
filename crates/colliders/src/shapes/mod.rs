//! Collision shapes
//!
//! A closed family of immutable shapes with exact pairwise intersection,
//! point containment and world enumeration. Pair dispatch is an explicit
//! match over every combination in [`Shape::intersects`], so a new kind
//! cannot be added without deciding how it meets each existing one.

pub mod aabb;
pub mod composite;
pub mod obb;
pub mod ray;
pub mod sphere;

pub use aabb::AxisAlignedBox;
pub use composite::{Composite, CompositeMode};
pub use obb::OrientedBox;
pub use ray::{CellScan, RayResolveOptions, RayShape};
pub use sphere::Sphere;

use thiserror::Error;

use crate::enumeration::Candidates;
use crate::foundation::math::Vec3;
use crate::world::{Agent, CellPos, QueryError, WorldId, WorldQuery};

/// Errors raised when constructing shapes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    /// A ray needs a direction to derive its orientation from
    #[error("Ray direction has zero length")]
    ZeroDirection,

    /// Radii must not be negative
    #[error("Negative radius: {0}")]
    NegativeRadius(f64),

    /// Lengths and thicknesses must not be negative
    #[error("Negative extent: {0}")]
    NegativeExtent(f64),
}

/// Any collision shape
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Axis-aligned box
    Aabb(AxisAlignedBox),
    /// Sphere
    Sphere(Sphere),
    /// Oriented box
    Obb(OrientedBox),
    /// Thick ray
    Ray(RayShape),
    /// Logical combination of shapes
    Composite(Composite),
}

impl Shape {
    /// World the shape is tagged with
    pub fn world(&self) -> WorldId {
        match self {
            Self::Aabb(aabb) => aabb.world(),
            Self::Sphere(sphere) => sphere.world(),
            Self::Obb(obb) => obb.world(),
            Self::Ray(ray) => ray.world(),
            Self::Composite(composite) => composite.world(),
        }
    }

    /// Whether two shapes overlap. Shapes from different worlds never do.
    pub fn intersects(&self, other: &Shape) -> bool {
        if self.world() != other.world() {
            return false;
        }
        match (self, other) {
            (Self::Composite(composite), _) => composite.intersects(other),
            (_, Self::Composite(composite)) => composite.intersects(self),

            (Self::Aabb(a), Self::Aabb(b)) => a.intersects_aabb(b),
            (Self::Aabb(aabb), Self::Sphere(sphere)) | (Self::Sphere(sphere), Self::Aabb(aabb)) => {
                sphere.intersects_aabb(aabb)
            }
            (Self::Aabb(aabb), Self::Obb(obb)) | (Self::Obb(obb), Self::Aabb(aabb)) => {
                obb.intersects_aabb(aabb)
            }
            (Self::Aabb(aabb), Self::Ray(ray)) | (Self::Ray(ray), Self::Aabb(aabb)) => {
                ray.oriented_box().intersects_aabb(aabb)
            }

            (Self::Sphere(a), Self::Sphere(b)) => a.intersects_sphere(b),
            (Self::Sphere(sphere), Self::Obb(obb)) | (Self::Obb(obb), Self::Sphere(sphere)) => {
                obb.intersects_sphere(sphere)
            }
            (Self::Sphere(sphere), Self::Ray(ray)) | (Self::Ray(ray), Self::Sphere(sphere)) => {
                ray.oriented_box().intersects_sphere(sphere)
            }

            (Self::Obb(a), Self::Obb(b)) => a.intersects_obb(b),
            (Self::Obb(obb), Self::Ray(ray)) | (Self::Ray(ray), Self::Obb(obb)) => {
                obb.intersects_obb(ray.oriented_box())
            }

            (Self::Ray(a), Self::Ray(b)) => a.oriented_box().intersects_obb(b.oriented_box()),
        }
    }

    /// Whether a point lies inside the shape
    pub fn contains(&self, point: &Vec3) -> bool {
        match self {
            Self::Aabb(aabb) => aabb.contains(point),
            Self::Sphere(sphere) => sphere.contains(point),
            Self::Obb(obb) => obb.contains(point),
            Self::Ray(ray) => ray.contains(point),
            Self::Composite(composite) => composite.contains(point),
        }
    }

    /// Same shape moved so that its center is `center`
    #[must_use]
    pub fn at(&self, center: Vec3) -> Shape {
        match self {
            Self::Aabb(aabb) => aabb.at(center).into(),
            Self::Sphere(sphere) => sphere.at(center).into(),
            Self::Obb(obb) => obb.at(center).into(),
            Self::Ray(ray) => ray.at(center).into(),
            Self::Composite(composite) => composite.at(center).into(),
        }
    }

    /// Same shape grown by `factor` about its center
    #[must_use]
    pub fn scale(&self, factor: f64) -> Shape {
        match self {
            Self::Aabb(aabb) => aabb.scale(factor).into(),
            Self::Sphere(sphere) => sphere.scale(factor).into(),
            Self::Obb(obb) => obb.scale(factor).into(),
            Self::Ray(ray) => ray.scale(factor).into(),
            Self::Composite(composite) => composite.scale(factor).into(),
        }
    }

    /// Center point
    pub fn center(&self) -> Vec3 {
        match self {
            Self::Aabb(aabb) => aabb.center(),
            Self::Sphere(sphere) => sphere.center(),
            Self::Obb(obb) => obb.center(),
            Self::Ray(ray) => ray.center(),
            Self::Composite(composite) => composite.center(),
        }
    }

    /// Half-extents along the shape's own axes
    pub fn half_extents(&self) -> Vec3 {
        match self {
            Self::Aabb(aabb) => aabb.half_extents(),
            Self::Sphere(sphere) => sphere.half_extents(),
            Self::Obb(obb) => obb.half_extents(),
            Self::Ray(ray) => ray.half_extents(),
            Self::Composite(composite) => composite.half_extents(),
        }
    }

    /// Agents overlapping the shape
    pub fn entities(&self, world: &dyn WorldQuery) -> Result<Candidates<Agent>, QueryError> {
        match self {
            Self::Aabb(aabb) => aabb.entities(world),
            Self::Sphere(sphere) => sphere.entities(world),
            Self::Obb(obb) => obb.entities(world),
            Self::Ray(ray) => ray.entities(world),
            Self::Composite(composite) => composite.entities(world),
        }
    }

    /// Grid cells overlapping the shape
    pub fn blocks(&self) -> Candidates<CellPos> {
        match self {
            Self::Aabb(aabb) => aabb.blocks(),
            Self::Sphere(sphere) => sphere.blocks(),
            Self::Obb(obb) => obb.blocks(),
            Self::Ray(ray) => ray.blocks(),
            Self::Composite(composite) => composite.blocks(),
        }
    }

    /// Lattice points whose unit cell overlaps the shape
    pub fn positions(&self) -> Candidates<Vec3> {
        match self {
            Self::Aabb(aabb) => aabb.positions(),
            Self::Sphere(sphere) => sphere.positions(),
            Self::Obb(obb) => obb.positions(),
            Self::Ray(ray) => ray.positions(),
            Self::Composite(composite) => composite.positions(),
        }
    }
}

impl From<AxisAlignedBox> for Shape {
    fn from(aabb: AxisAlignedBox) -> Self {
        Self::Aabb(aabb)
    }
}

impl From<Sphere> for Shape {
    fn from(sphere: Sphere) -> Self {
        Self::Sphere(sphere)
    }
}

impl From<OrientedBox> for Shape {
    fn from(obb: OrientedBox) -> Self {
        Self::Obb(obb)
    }
}

impl From<RayShape> for Shape {
    fn from(ray: RayShape) -> Self {
        Self::Ray(ray)
    }
}

impl From<Composite> for Shape {
    fn from(composite: Composite) -> Self {
        Self::Composite(composite)
    }
}
