//! Oriented bounding box
//!
//! The box basis is derived from a pitch/yaw rotation of the world axes and is
//! never set directly, so it stays orthonormal. Box/box overlap uses the
//! separating axis theorem over the 15 candidate axes of two boxes.

use log::trace;

use super::{AxisAlignedBox, Sphere};
use crate::enumeration::Candidates;
use crate::foundation::math::{constants, utils, EulerAngle, Vec3, Vec3Ext};
use crate::world::{Agent, CellPos, QueryError, WorldId, WorldQuery};

/// Cross products shorter than this (squared) come from parallel edges and
/// cannot separate anything
const DEGENERATE_AXIS_EPSILON: f64 = 1e-12;

/// Box with its own orthonormal basis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    world: WorldId,
    center: Vec3,
    rotation: EulerAngle,
    axes: [Vec3; 3],
    half_extents: Vec3,
}

impl OrientedBox {
    /// Default squared distance tolerance used by [`OrientedBox::contains`]
    pub const CONTAINS_TOLERANCE_SQ: f64 = 0.01;

    /// Create a box. Roll is not supported and is dropped from `rotation`.
    pub fn new(world: WorldId, center: Vec3, half_extents: Vec3, rotation: EulerAngle) -> Self {
        let rotation = rotation.without_roll();
        Self {
            world,
            center,
            rotation,
            axes: [
                constants::PLUS_I.rotate(rotation),
                constants::PLUS_J.rotate(rotation),
                constants::PLUS_K.rotate(rotation),
            ],
            half_extents: half_extents.abs(),
        }
    }

    /// Rotate an axis-aligned box about its own center
    pub fn from_aabb(aabb: &AxisAlignedBox, rotation: EulerAngle) -> Self {
        Self::new(aabb.world(), aabb.center(), aabb.half_extents(), rotation)
    }

    /// World tag
    pub fn world(&self) -> WorldId {
        self.world
    }

    /// Center point
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Half-extents along the box axes
    pub fn half_extents(&self) -> Vec3 {
        self.half_extents
    }

    /// Rotation the basis was derived from
    pub fn rotation(&self) -> EulerAngle {
        self.rotation
    }

    /// Basis as `[right, up, forward]`
    pub fn axes(&self) -> [Vec3; 3] {
        self.axes
    }

    /// Local X axis
    pub fn right(&self) -> Vec3 {
        self.axes[0]
    }

    /// Local Y axis
    pub fn up(&self) -> Vec3 {
        self.axes[1]
    }

    /// Local Z axis
    pub fn forward(&self) -> Vec3 {
        self.axes[2]
    }

    /// Same box moved to `center`
    #[must_use]
    pub fn at(&self, center: Vec3) -> Self {
        Self { center, ..*self }
    }

    /// Same box with half-extents multiplied by `factor`
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            half_extents: (self.half_extents * factor).abs(),
            ..*self
        }
    }

    /// Point of the box nearest to `target`
    pub fn closest_position(&self, target: &Vec3) -> Vec3 {
        let offset = target - self.center;
        self.axes
            .iter()
            .enumerate()
            .fold(self.center, |closest, (index, axis)| {
                let half = self.half_extents[index];
                closest + axis * utils::clamp(offset.dot(axis), -half, half)
            })
    }

    /// Whether `point` is within the default tolerance of the box
    pub fn contains(&self, point: &Vec3) -> bool {
        self.contains_within(point, Self::CONTAINS_TOLERANCE_SQ)
    }

    /// Whether the squared distance from `point` to the box is at most `tolerance_sq`
    pub fn contains_within(&self, point: &Vec3, tolerance_sq: f64) -> bool {
        (self.closest_position(point) - point).norm_squared() <= tolerance_sq
    }

    /// Separating axis test against another oriented box.
    ///
    /// Projections must overlap strictly, so boxes that only touch do not
    /// intersect. This matches [`AxisAlignedBox::intersects_aabb`].
    pub fn intersects_obb(&self, other: &OrientedBox) -> bool {
        if self.world != other.world {
            return false;
        }
        let offset = other.center - self.center;
        let reach = self.scaled_axes();
        let other_reach = other.scaled_axes();

        self.candidate_axes(other)
            .iter()
            .filter(|axis| axis.norm_squared() > DEGENERATE_AXIS_EPSILON)
            .all(|axis| {
                let projected_radius: f64 = reach
                    .iter()
                    .chain(other_reach.iter())
                    .map(|edge| edge.dot(axis).abs())
                    .sum();
                offset.dot(axis).abs() < projected_radius
            })
    }

    /// Treat the axis-aligned box as an unrotated oriented box
    pub fn intersects_aabb(&self, aabb: &AxisAlignedBox) -> bool {
        self.intersects_obb(&Self::from_aabb(aabb, EulerAngle::ZERO))
    }

    /// Sphere reaches the closest point of the box
    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        let center = sphere.center();
        self.world == sphere.world()
            && (center - self.closest_position(&center)).norm_squared()
                <= sphere.radius() * sphere.radius()
    }

    /// Half-extents of the axis-aligned box enclosing this box
    pub fn world_extents(&self) -> Vec3 {
        self.scaled_axes()
            .iter()
            .fold(Vec3::zeros(), |extents, edge| extents + edge.abs())
    }

    /// Agents whose bounds overlap the box
    pub fn entities(&self, world: &dyn WorldQuery) -> Result<Candidates<Agent>, QueryError> {
        let cube = self.bounding_cube();
        let nearby = world.nearby_agents(cube.center(), cube.half_extents())?;
        trace!("OBB broad phase returned {} agents", nearby.len());
        let this = *self;
        Ok(Candidates::new(nearby, move |agent: &Agent| {
            this.intersects_aabb(&AxisAlignedBox::of_agent(agent))
        }))
    }

    /// Cells overlapping the box whose centers also lie within it
    pub fn blocks(&self) -> Candidates<CellPos> {
        let this = *self;
        Candidates::new(self.bounding_cube().lattice(), move |pos: &CellPos| {
            this.covers_cell(pos.center())
        })
    }

    /// Lattice points overlapping the box that also lie within it
    pub fn positions(&self) -> Candidates<Vec3> {
        let this = *self;
        Candidates::new(
            self.bounding_cube().lattice().map(CellPos::center),
            move |point: &Vec3| this.covers_cell(*point),
        )
    }

    fn covers_cell(&self, center: Vec3) -> bool {
        self.intersects_aabb(&AxisAlignedBox::cube_at(self.world, center)) && self.contains(&center)
    }

    /// Axis-aligned cube enclosing the box, used as the enumeration broad phase
    fn bounding_cube(&self) -> AxisAlignedBox {
        let half = self.world_extents().max_component();
        AxisAlignedBox::centered(self.world, Vec3::repeat(half)).at(self.center)
    }

    fn scaled_axes(&self) -> [Vec3; 3] {
        [
            self.axes[0] * self.half_extents.x,
            self.axes[1] * self.half_extents.y,
            self.axes[2] * self.half_extents.z,
        ]
    }

    fn candidate_axes(&self, other: &OrientedBox) -> [Vec3; 15] {
        let [right, up, forward] = self.axes;
        let [other_right, other_up, other_forward] = other.axes;
        [
            right,
            up,
            forward,
            other_right,
            other_up,
            other_forward,
            right.cross(&other_right),
            right.cross(&other_up),
            right.cross(&other_forward),
            up.cross(&other_right),
            up.cross(&other_up),
            up.cross(&other_forward),
            forward.cross(&other_right),
            forward.cross(&other_up),
            forward.cross(&other_forward),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_4;

    const WORLD: WorldId = WorldId::new(1);

    fn unit_box(center: Vec3, rotation: EulerAngle) -> OrientedBox {
        OrientedBox::new(WORLD, center, Vec3::new(0.5, 0.5, 0.5), rotation)
    }

    #[test]
    fn test_basis_is_orthonormal() {
        let obb = unit_box(Vec3::zeros(), EulerAngle::new(0.9, -2.3, 1.0));
        let [right, up, forward] = obb.axes();
        assert_relative_eq!(right.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(up.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(forward.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(right.dot(&up), 0.0, epsilon = 1e-12);
        assert_relative_eq!(right.dot(&forward), 0.0, epsilon = 1e-12);
        assert_eq!(obb.rotation().roll, 0.0);
    }

    #[test]
    fn test_rotated_box_reaches_diagonal() {
        // a unit cube turned 45° about Y reaches sqrt(0.5) along X
        let turned = unit_box(Vec3::zeros(), EulerAngle::new(0.0, FRAC_PI_4, 0.0));
        let probe = unit_box(Vec3::new(1.15, 0.0, 0.0), EulerAngle::ZERO);
        assert!(turned.intersects_obb(&probe));
        assert!(!unit_box(Vec3::zeros(), EulerAngle::ZERO).intersects_obb(&probe));
        assert!(!turned.intersects_obb(&probe.at(Vec3::new(1.25, 0.0, 0.0))));
    }

    #[test]
    fn test_parallel_boxes_skip_degenerate_axes() {
        let a = unit_box(Vec3::zeros(), EulerAngle::new(0.3, 0.2, 0.0));
        let b = a.at(Vec3::new(0.2, 0.1, 0.0));
        assert!(a.intersects_obb(&b));
        assert!(!a.intersects_obb(&a.at(Vec3::new(5.0, 0.0, 0.0))));
    }

    #[test]
    fn test_closest_position_clamps_each_axis() {
        let obb = OrientedBox::new(WORLD, Vec3::zeros(), Vec3::new(1.0, 2.0, 3.0), EulerAngle::ZERO);
        assert_relative_eq!(
            obb.closest_position(&Vec3::new(5.0, -1.0, -10.0)),
            Vec3::new(1.0, -1.0, -3.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_contains_tolerance() {
        let obb = unit_box(Vec3::zeros(), EulerAngle::ZERO);
        assert!(obb.contains(&Vec3::new(0.5, 0.0, 0.0)));
        assert!(obb.contains(&Vec3::new(0.59, 0.0, 0.0)));
        assert!(!obb.contains(&Vec3::new(0.61, 0.0, 0.0)));
        assert!(!obb.contains_within(&Vec3::new(0.59, 0.0, 0.0), 0.0));
    }

    #[test]
    fn test_sphere_against_rotated_box() {
        let turned = unit_box(Vec3::zeros(), EulerAngle::new(0.0, FRAC_PI_4, 0.0));
        let sphere = Sphere::new(WORLD, Vec3::new(1.0, 0.0, 0.0), 0.3).unwrap();
        assert!(turned.intersects_sphere(&sphere));
        assert!(!unit_box(Vec3::zeros(), EulerAngle::ZERO).intersects_sphere(&sphere));
    }

    #[test]
    fn test_from_aabb_uses_half_extents() {
        let aabb = AxisAlignedBox::new(WORLD, Vec3::new(2.0, 2.0, 2.0), Vec3::new(4.0, 6.0, 8.0));
        let obb = OrientedBox::from_aabb(&aabb, EulerAngle::ZERO);
        assert_eq!(obb.center(), aabb.center());
        assert_eq!(obb.half_extents(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_world_extents_of_turned_box() {
        let turned = unit_box(Vec3::zeros(), EulerAngle::new(0.0, FRAC_PI_4, 0.0));
        let extents = turned.world_extents();
        assert_relative_eq!(extents.x, 0.5_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(extents.y, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_blocks_along_axis_aligned_rod() {
        let rod = OrientedBox::new(WORLD, Vec3::zeros(), Vec3::new(2.0, 0.1, 0.1), EulerAngle::ZERO);
        let mut cells: Vec<_> = rod.blocks().collect();
        cells.sort();
        let expected: Vec<_> = (-2..=2).map(|x| CellPos::new(x, 0, 0)).collect();
        assert_eq!(cells, expected);
    }

    #[test]
    fn test_touching_boxes_do_not_intersect() {
        let a = AxisAlignedBox::new(WORLD, Vec3::zeros(), constants::ONE);
        let b = AxisAlignedBox::new(WORLD, Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let oriented = OrientedBox::from_aabb(&a, EulerAngle::ZERO);
        assert!(!a.intersects_aabb(&b));
        assert!(!oriented.intersects_aabb(&b));
        assert!(!oriented.intersects_obb(&OrientedBox::from_aabb(&b, EulerAngle::ZERO)));
        assert!(oriented.intersects_aabb(&b.at(Vec3::new(1.25, 0.5, 0.5))));
    }

    #[test]
    fn test_point_box() {
        let point = OrientedBox::new(WORLD, Vec3::new(0.05, -0.05, 0.0), Vec3::zeros(), EulerAngle::ZERO);
        assert!(point.intersects_aabb(&AxisAlignedBox::unit_cell(WORLD, CellPos::new(0, 0, 0))));
        assert!(!point.intersects_aabb(&AxisAlignedBox::unit_cell(WORLD, CellPos::new(1, 0, 0))));
        assert_eq!(point.blocks().collect::<Vec<_>>(), vec![CellPos::new(0, 0, 0)]);
        assert_eq!(point.positions().collect::<Vec<_>>(), vec![Vec3::zeros()]);

        // on a cell face the point touches both cells and overlaps neither
        let on_face = point.at(Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(on_face.blocks().count(), 0);
    }
}
