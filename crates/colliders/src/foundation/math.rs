//! Math utilities and types
//!
//! Provides the vector primitive shared by every shape. Vectors are plain
//! `nalgebra` values, so every operation returns a new value and nothing is
//! ever mutated in place.

pub use nalgebra::{Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::world::CellPos;

/// 3D vector type (world units)
pub type Vec3 = Vector3<f64>;

/// Rotation described by pitch (about X), yaw (about Y) and roll (about Z), in radians.
///
/// Applied in pitch, yaw, roll order by [`Vec3Ext::rotate`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EulerAngle {
    /// Rotation about the X axis
    pub pitch: f64,
    /// Rotation about the Y axis
    pub yaw: f64,
    /// Rotation about the Z axis
    pub roll: f64,
}

impl EulerAngle {
    /// No rotation
    pub const ZERO: Self = Self { pitch: 0.0, yaw: 0.0, roll: 0.0 };

    /// Create a new rotation from radians
    pub const fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    /// Create a rotation from angles given in degrees
    pub fn from_degrees(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self::new(pitch.to_radians(), yaw.to_radians(), roll.to_radians())
    }

    /// Angles in degrees as `(pitch, yaw, roll)`
    pub fn to_degrees(self) -> (f64, f64, f64) {
        (self.pitch.to_degrees(), self.yaw.to_degrees(), self.roll.to_degrees())
    }

    /// Same rotation with roll cleared
    pub const fn without_roll(self) -> Self {
        Self::new(self.pitch, self.yaw, 0.0)
    }

    /// Pitch and yaw that turn `+Z` onto `direction` (roll is always zero).
    ///
    /// A purely vertical direction has no defined yaw; it gets yaw 0 and a pitch
    /// of -90° looking up or +90° looking down. Otherwise
    /// `yaw = atan2(-x, z)` and `pitch = atan(-y / sqrt(x² + z²))`.
    pub fn from_direction(direction: Vec3) -> Self {
        let (x, y, z) = (direction.x, direction.y, direction.z);
        if x == 0.0 && z == 0.0 {
            let pitch = if y > 0.0 { -90.0_f64 } else { 90.0_f64 };
            return Self::new(pitch.to_radians(), 0.0, 0.0);
        }
        let yaw = (-x).atan2(z);
        let horizontal = x.hypot(z);
        let pitch = (-y / horizontal).atan();
        Self::new(pitch, yaw, 0.0)
    }
}

/// Vector operations the collision math needs on top of `nalgebra`.
///
/// Rotation conventions here define the oriented box basis, so the individual
/// pitch/yaw/roll formulas must not be swapped for nalgebra's rotation types.
pub trait Vec3Ext: Sized {
    /// Rotate about the X axis
    fn rotate_pitch(&self, angle: f64) -> Self;

    /// Rotate about the Y axis
    fn rotate_yaw(&self, angle: f64) -> Self;

    /// Rotate about the Z axis
    fn rotate_roll(&self, angle: f64) -> Self;

    /// Rotate by pitch, then yaw, then roll
    fn rotate(&self, angle: EulerAngle) -> Self;

    /// Rotate around an arbitrary axis (Rodrigues). The axis need not be unit length
    /// but must not be zero.
    fn rotate_around_axis(&self, axis: &Self, angle: f64) -> Self;

    /// Normalized copy, or `default` when this vector has zero length
    fn normalize_or(&self, default: Self) -> Self;

    /// Largest of the three components
    fn max_component(&self) -> f64;

    /// Smallest of the three components
    fn min_component(&self) -> f64;

    /// Component by index (0 = x, 1 = y, 2 = z)
    fn component(&self, index: usize) -> f64;

    /// Componentwise minimum
    fn component_min(&self, other: &Self) -> Self;

    /// Componentwise maximum
    fn component_max(&self, other: &Self) -> Self;

    /// Angle between two vectors in radians
    fn angle_to(&self, other: &Self) -> f64;

    /// Point halfway between two points
    fn midpoint(&self, other: &Self) -> Self;

    /// Lattice point obtained by rounding each component
    fn cell(&self) -> CellPos;
}

impl Vec3Ext for Vec3 {
    fn rotate_pitch(&self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Vec3::new(self.x, cos * self.y - sin * self.z, sin * self.y + cos * self.z)
    }

    fn rotate_yaw(&self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Vec3::new(cos * self.x - sin * self.z, self.y, sin * self.x + cos * self.z)
    }

    fn rotate_roll(&self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Vec3::new(cos * self.x + sin * self.y, -sin * self.x + cos * self.y, self.z)
    }

    fn rotate(&self, angle: EulerAngle) -> Self {
        self.rotate_pitch(angle.pitch)
            .rotate_yaw(angle.yaw)
            .rotate_roll(angle.roll)
    }

    fn rotate_around_axis(&self, axis: &Self, angle: f64) -> Self {
        let rotation = UnitQuaternion::from_axis_angle(&Unit::new_normalize(*axis), angle);
        rotation * *self
    }

    fn normalize_or(&self, default: Self) -> Self {
        if self.norm_squared() == 0.0 {
            default
        } else {
            self.normalize()
        }
    }

    fn max_component(&self) -> f64 {
        self.x.max(self.y).max(self.z)
    }

    fn min_component(&self) -> f64 {
        self.x.min(self.y).min(self.z)
    }

    fn component(&self, index: usize) -> f64 {
        self[index]
    }

    fn component_min(&self, other: &Self) -> Self {
        self.inf(other)
    }

    fn component_max(&self, other: &Self) -> Self {
        self.sup(other)
    }

    fn angle_to(&self, other: &Self) -> f64 {
        let cos = self.dot(other) / (self.norm() * other.norm());
        cos.clamp(-1.0, 1.0).acos()
    }

    fn midpoint(&self, other: &Self) -> Self {
        (self + other) * 0.5
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell(&self) -> CellPos {
        CellPos::new(
            self.x.round() as i64,
            self.y.round() as i64,
            self.z.round() as i64,
        )
    }
}

/// Math constants
pub mod constants {
    use super::Vec3;

    /// All components zero
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    /// All components one
    pub const ONE: Vec3 = Vec3::new(1.0, 1.0, 1.0);

    /// Unit X
    pub const PLUS_I: Vec3 = Vec3::new(1.0, 0.0, 0.0);

    /// Unit Y
    pub const PLUS_J: Vec3 = Vec3::new(0.0, 1.0, 0.0);

    /// Unit Z
    pub const PLUS_K: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    /// Negative unit Y (straight down)
    pub const MINUS_J: Vec3 = Vec3::new(0.0, -1.0, 0.0);
}

/// Math utility functions
pub mod utils {
    use super::Vec3;

    /// Clamp a value between min and max
    pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
        max.min(min.max(value))
    }

    /// Linear interpolation
    pub fn lerp(from: f64, to: f64, step: f64) -> f64 {
        (1.0 - step) * from + step * to
    }

    /// Componentwise linear interpolation
    pub fn lerp_vec3(from: Vec3, to: Vec3, step: f64) -> Vec3 {
        Vec3::new(
            lerp(from.x, to.x, step),
            lerp(from.y, to.y, step),
            lerp(from.z, to.z, step),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_rotation_order_builds_orthonormal_basis() {
        let angle = EulerAngle::new(0.3, -1.1, 0.0);
        let right = constants::PLUS_I.rotate(angle);
        let up = constants::PLUS_J.rotate(angle);
        let forward = constants::PLUS_K.rotate(angle);

        assert_relative_eq!(right.norm(), 1.0, epsilon = EPSILON);
        assert_relative_eq!(up.norm(), 1.0, epsilon = EPSILON);
        assert_relative_eq!(forward.norm(), 1.0, epsilon = EPSILON);
        assert_relative_eq!(right.dot(&up), 0.0, epsilon = EPSILON);
        assert_relative_eq!(up.dot(&forward), 0.0, epsilon = EPSILON);
        assert_relative_eq!(right.dot(&forward), 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_pitch_then_yaw_is_not_yaw_then_pitch() {
        let v = Vec3::new(0.2, 0.5, 0.9);
        let ordered = v.rotate(EulerAngle::new(0.7, 0.4, 0.0));
        let reversed = v.rotate_yaw(0.4).rotate_pitch(0.7);
        assert!((ordered - reversed).norm() > 1e-3);
    }

    #[test]
    fn test_rotate_around_axis_quarter_turn() {
        let rotated = constants::PLUS_I.rotate_around_axis(&Vec3::new(0.0, 0.0, 5.0), FRAC_PI_2);
        assert_relative_eq!(rotated, constants::PLUS_J, epsilon = EPSILON);

        let half = Vec3::new(1.0, 2.0, 3.0).rotate_around_axis(&constants::PLUS_J, PI);
        assert_relative_eq!(half, Vec3::new(-1.0, 2.0, -3.0), epsilon = 1e-9);
    }

    #[test]
    fn test_normalize_or_guards_zero() {
        assert_eq!(constants::ZERO.normalize_or(constants::PLUS_K), constants::PLUS_K);
        assert_relative_eq!(
            Vec3::new(3.0, 0.0, 4.0).normalize_or(constants::PLUS_K),
            Vec3::new(0.6, 0.0, 0.8),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_component_helpers() {
        let a = Vec3::new(1.0, -4.0, 2.5);
        let b = Vec3::new(-2.0, 3.0, 2.0);
        assert_eq!(a.max_component(), 2.5);
        assert_eq!(a.min_component(), -4.0);
        assert_eq!(a.component(1), -4.0);
        assert_eq!(a.component_min(&b), Vec3::new(-2.0, -4.0, 2.0));
        assert_eq!(a.component_max(&b), Vec3::new(1.0, 3.0, 2.5));
        assert_eq!(a.abs(), Vec3::new(1.0, 4.0, 2.5));
        assert_eq!(a.midpoint(&b), Vec3::new(-0.5, -0.5, 2.25));
    }

    #[test]
    fn test_angle_to() {
        assert_relative_eq!(
            constants::PLUS_I.angle_to(&constants::PLUS_J),
            FRAC_PI_2,
            epsilon = EPSILON
        );
        assert_relative_eq!(constants::PLUS_I.angle_to(&constants::PLUS_I), 0.0, epsilon = 1e-7);
    }

    #[test]
    fn test_direction_to_euler_straight_down() {
        let angle = EulerAngle::from_direction(constants::MINUS_J);
        assert_relative_eq!(angle.pitch, FRAC_PI_2, epsilon = EPSILON);
        assert_eq!(angle.yaw, 0.0);
        assert_eq!(angle.roll, 0.0);

        let up = EulerAngle::from_direction(constants::PLUS_J);
        assert_relative_eq!(up.pitch, -FRAC_PI_2, epsilon = EPSILON);
    }

    #[test]
    fn test_direction_to_euler_maps_forward_onto_direction() {
        let direction = Vec3::new(0.3, -0.4, -0.8).normalize();
        let forward = constants::PLUS_K.rotate(EulerAngle::from_direction(direction));
        assert_relative_eq!(forward, direction, epsilon = 1e-9);
    }

    #[test]
    fn test_degrees_round_trip() {
        let angle = EulerAngle::from_degrees(90.0, 45.0, 0.0);
        assert_relative_eq!(angle.pitch, FRAC_PI_2, epsilon = EPSILON);
        let (pitch, yaw, roll) = angle.to_degrees();
        assert_relative_eq!(pitch, 90.0, epsilon = 1e-9);
        assert_relative_eq!(yaw, 45.0, epsilon = 1e-9);
        assert_eq!(roll, 0.0);
    }

    #[test]
    fn test_lerp_and_clamp() {
        assert_eq!(utils::lerp(2.0, 4.0, 0.5), 3.0);
        assert_eq!(utils::clamp(5.0, -1.0, 1.0), 1.0);
        assert_eq!(utils::clamp(-5.0, -1.0, 1.0), -1.0);
        assert_eq!(
            utils::lerp_vec3(constants::ZERO, Vec3::new(2.0, 4.0, 6.0), 0.25),
            Vec3::new(0.5, 1.0, 1.5)
        );
    }

    #[test]
    fn test_cell_rounds_to_lattice() {
        assert_eq!(Vec3::new(0.4, -0.6, 2.5).cell(), CellPos::new(0, -1, 3));
    }
}
