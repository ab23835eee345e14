//! Logical combination of shapes

use log::warn;
use serde::{Deserialize, Serialize};

use super::{AxisAlignedBox, OrientedBox, Shape, Sphere};
use crate::enumeration::Candidates;
use crate::foundation::math::Vec3;
use crate::world::{Agent, CellPos, QueryError, WorldId, WorldQuery};

/// How a composite combines its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompositeMode {
    /// Logical OR: one child is enough
    Any,
    /// Logical AND: every child must agree
    All,
}

/// Ordered set of shapes tested together under a [`CompositeMode`]
///
/// An empty `All` composite is vacuously true for every test and an empty
/// `Any` composite is false. Child order only affects the order in which
/// deduplicated enumeration results are produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    world: WorldId,
    mode: CompositeMode,
    children: Vec<Shape>,
}

impl Composite {
    /// Combine `children` under `mode`
    pub fn new(world: WorldId, mode: CompositeMode, children: Vec<Shape>) -> Self {
        Self {
            world,
            mode,
            children,
        }
    }

    /// Disk-like volume: the part of a sphere that is also inside a flat box
    pub fn disk(sphere: Sphere, obb: OrientedBox) -> Self {
        Self::new(sphere.world(), CompositeMode::All, vec![sphere.into(), obb.into()])
    }

    /// World tag
    pub fn world(&self) -> WorldId {
        self.world
    }

    /// Combination mode
    pub fn mode(&self) -> CompositeMode {
        self.mode
    }

    /// Child shapes in insertion order
    pub fn children(&self) -> &[Shape] {
        &self.children
    }

    /// Center of the first child, or the origin when empty
    pub fn center(&self) -> Vec3 {
        self.children.first().map_or_else(Vec3::zeros, Shape::center)
    }

    /// Half-extents of the first child, or zero when empty
    pub fn half_extents(&self) -> Vec3 {
        self.children.first().map_or_else(Vec3::zeros, Shape::half_extents)
    }

    /// Every child moved to `center`
    #[must_use]
    pub fn at(&self, center: Vec3) -> Self {
        self.map_children(|child| child.at(center))
    }

    /// Every child scaled by `factor`
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        self.map_children(|child| child.scale(factor))
    }

    fn map_children(&self, f: impl Fn(&Shape) -> Shape) -> Self {
        Self::new(self.world, self.mode, self.children.iter().map(f).collect())
    }

    /// Apply `predicate` to the children under this composite's mode
    fn test(&self, predicate: impl Fn(&Shape) -> bool) -> bool {
        match self.mode {
            CompositeMode::Any => self.children.iter().any(predicate),
            CompositeMode::All => self.children.iter().all(predicate),
        }
    }

    /// Whether the composite overlaps `other`.
    ///
    /// Against another composite the `All` side is quantified outermost, so
    /// the result is the same whichever side asks.
    pub fn intersects(&self, other: &Shape) -> bool {
        if let Shape::Composite(other) = other {
            return self.intersects_composite(other);
        }
        self.test(|child| child.intersects(other))
    }

    fn intersects_composite(&self, other: &Composite) -> bool {
        if self.mode == CompositeMode::Any && other.mode == CompositeMode::All {
            return other.test(|theirs| self.test(|mine| mine.intersects(theirs)));
        }
        self.test(|mine| other.test(|theirs| mine.intersects(theirs)))
    }

    /// Whether `point` is inside the children under this composite's mode
    pub fn contains(&self, point: &Vec3) -> bool {
        self.test(|child| child.contains(point))
    }

    /// Agents found by the children, each reported once.
    ///
    /// A child whose world query fails is logged and skipped. The call only
    /// fails when every child failed.
    pub fn entities(&self, world: &dyn WorldQuery) -> Result<Candidates<Agent>, QueryError> {
        let mut parts = Vec::with_capacity(self.children.len());
        let mut first_error = None;
        for child in self.local_children() {
            match child.entities(world) {
                Ok(candidates) => parts.push(candidates),
                Err(err) => {
                    warn!("Composite child enumeration failed in {}: {err}", self.world);
                    first_error.get_or_insert(err);
                }
            }
        }
        if parts.is_empty() {
            if let Some(err) = first_error {
                return Err(err);
            }
        }
        Ok(self.keep_if_all(Candidates::union(parts), AxisAlignedBox::of_agent))
    }

    /// Cells found by the children, each reported once
    pub fn blocks(&self) -> Candidates<CellPos> {
        let parts = self.local_children().map(Shape::blocks).collect();
        let world = self.world;
        self.keep_if_all(Candidates::union(parts), move |pos: &CellPos| {
            AxisAlignedBox::unit_cell(world, *pos)
        })
    }

    /// Lattice points found by the children, each reported once
    pub fn positions(&self) -> Candidates<Vec3> {
        let parts = self.local_children().map(Shape::positions).collect();
        let world = self.world;
        self.keep_if_all(Candidates::union(parts), move |point: &Vec3| {
            AxisAlignedBox::cube_at(world, *point)
        })
    }

    /// Children tagged with the composite's own world; others never match
    fn local_children(&self) -> impl Iterator<Item = &Shape> {
        let world = self.world;
        self.children.iter().filter(move |child| child.world() == world)
    }

    /// Under `All`, keep only candidates whose unit volume meets every child
    fn keep_if_all<T, F>(&self, merged: Candidates<T>, volume: F) -> Candidates<T>
    where
        T: Send + 'static,
        F: Fn(&T) -> AxisAlignedBox + Send + Sync + 'static,
    {
        match self.mode {
            CompositeMode::Any => merged,
            CompositeMode::All => {
                let children = self.children.clone();
                merged.refine(move |item: &T| {
                    let probe = Shape::Aabb(volume(item));
                    children.iter().all(|child| child.intersects(&probe))
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::EulerAngle;
    use crate::spatial::MemoryWorld;
    use crate::world::AgentId;

    const WORLD: WorldId = WorldId::new(3);

    fn cube(center: Vec3, half: f64) -> Shape {
        AxisAlignedBox::centered(WORLD, Vec3::repeat(half)).at(center).into()
    }

    fn pair(mode: CompositeMode) -> Composite {
        Composite::new(
            WORLD,
            mode,
            vec![cube(Vec3::new(-3.0, 0.0, 0.0), 1.0), cube(Vec3::new(3.0, 0.0, 0.0), 1.0)],
        )
    }

    #[test]
    fn test_all_vs_any() {
        let probe = cube(Vec3::new(3.0, 0.0, 0.0), 0.5);
        assert!(pair(CompositeMode::Any).intersects(&probe));
        assert!(!pair(CompositeMode::All).intersects(&probe));

        let bridge = cube(Vec3::zeros(), 3.0);
        assert!(pair(CompositeMode::All).intersects(&bridge));
    }

    #[test]
    fn test_empty_composites() {
        let probe = cube(Vec3::zeros(), 1.0);
        let all = Composite::new(WORLD, CompositeMode::All, Vec::new());
        let any = Composite::new(WORLD, CompositeMode::Any, Vec::new());
        assert!(all.intersects(&probe));
        assert!(all.contains(&Vec3::new(100.0, 0.0, 0.0)));
        assert!(!any.intersects(&probe));
        assert!(!any.contains(&Vec3::zeros()));
        assert_eq!(any.blocks().count(), 0);
        assert_eq!(all.positions().count(), 0);
        assert_eq!(all.center(), Vec3::zeros());
    }

    #[test]
    fn test_mixed_modes_are_symmetric() {
        let any: Shape = pair(CompositeMode::Any).into();
        let all: Shape = Composite::new(
            WORLD,
            CompositeMode::All,
            vec![cube(Vec3::new(3.0, 0.0, 0.0), 0.5), cube(Vec3::new(-3.0, 0.0, 0.0), 0.5)],
        )
        .into();
        assert_eq!(any.intersects(&all), all.intersects(&any));
        assert!(any.intersects(&all));
    }

    #[test]
    fn test_contains_modes() {
        let point = Vec3::new(3.5, 0.0, 0.0);
        assert!(pair(CompositeMode::Any).contains(&point));
        assert!(!pair(CompositeMode::All).contains(&point));
    }

    #[test]
    fn test_at_and_scale_apply_to_children() {
        let moved = pair(CompositeMode::Any).at(Vec3::new(10.0, 0.0, 0.0));
        for child in moved.children() {
            assert_eq!(child.center(), Vec3::new(10.0, 0.0, 0.0));
        }
        let scaled = pair(CompositeMode::Any).scale(2.0);
        assert_eq!(scaled.half_extents(), Vec3::repeat(2.0));
        assert_eq!(scaled.center(), Vec3::new(-3.0, 0.0, 0.0));
    }

    #[test]
    fn test_blocks_are_deduplicated() {
        let overlapping = Composite::new(
            WORLD,
            CompositeMode::Any,
            vec![cube(Vec3::zeros(), 0.4), cube(Vec3::zeros(), 0.3)],
        );
        assert_eq!(overlapping.blocks().collect::<Vec<_>>(), vec![CellPos::new(0, 0, 0)]);
    }

    #[test]
    fn test_all_blocks_meet_every_child() {
        let lens = Composite::new(
            WORLD,
            CompositeMode::All,
            vec![cube(Vec3::new(-1.0, 0.0, 0.0), 1.2), cube(Vec3::new(1.0, 0.0, 0.0), 1.2)],
        );
        let mut xs: Vec<_> = lens
            .blocks()
            .filter(|pos| pos.y == 0 && pos.z == 0)
            .map(|pos| pos.x)
            .collect();
        xs.sort_unstable();
        // cells -1 and 1 each reach only one of the two boxes
        assert_eq!(xs, vec![0]);
    }

    #[test]
    fn test_disk_is_flat() {
        let sphere = Sphere::new(WORLD, Vec3::zeros(), 3.0).unwrap();
        let slab = OrientedBox::new(WORLD, Vec3::zeros(), Vec3::new(3.0, 0.1, 3.0), EulerAngle::ZERO);
        let disk = Composite::disk(sphere, slab);
        assert_eq!(disk.mode(), CompositeMode::All);
        assert!(disk.contains(&Vec3::new(2.0, 0.0, 0.0)));
        assert!(!disk.contains(&Vec3::new(0.0, 2.0, 0.0)));
        assert!(disk.blocks().all(|pos| pos.y == 0));
    }

    #[test]
    fn test_entities_once_per_agent() {
        let world = MemoryWorld::new(WORLD, -64.0, 320.0, 128.0);
        world
            .spawn_agent(Agent::new(AgentId::new(1), WORLD, Vec3::zeros(), 0.6, 1.8))
            .unwrap();
        world
            .spawn_agent(Agent::new(AgentId::new(2), WORLD, Vec3::new(3.0, 0.0, 0.0), 0.6, 1.8))
            .unwrap();

        let both = Composite::new(
            WORLD,
            CompositeMode::Any,
            vec![cube(Vec3::zeros(), 1.0), cube(Vec3::new(0.5, 0.0, 0.0), 1.0)],
        );
        let found: Vec<_> = both.entities(&world).unwrap().map(|a| a.id).collect();
        assert_eq!(found, vec![AgentId::new(1)]);
    }

    #[test]
    fn test_entities_fail_only_when_every_child_fails() {
        let world = MemoryWorld::new(WORLD, -64.0, 320.0, 128.0);
        world.set_index_available(false);
        let both = pair(CompositeMode::Any);
        assert!(matches!(
            both.entities(&world),
            Err(QueryError::IndexUnavailable(_))
        ));

        // blocks never touch the world and still work
        assert!(both.blocks().count() > 0);
    }

    #[test]
    fn test_enumeration_is_lazy() {
        let huge = Composite::new(WORLD, CompositeMode::Any, vec![cube(Vec3::zeros(), 500.0)]);
        assert_eq!(huge.blocks().take(3).count(), 3);
        assert_eq!(huge.positions().take(3).count(), 3);
    }

    #[test]
    fn test_foreign_children_never_match() {
        let elsewhere: Shape = AxisAlignedBox::centered(WorldId::new(99), Vec3::repeat(1.0)).into();
        let probe = cube(Vec3::zeros(), 0.5);

        let all = Composite::new(WORLD, CompositeMode::All, vec![cube(Vec3::zeros(), 1.0), elsewhere.clone()]);
        assert!(!all.intersects(&probe));
        assert_eq!(all.blocks().count(), 0);
        assert_eq!(all.positions().count(), 0);

        let any = Composite::new(WORLD, CompositeMode::Any, vec![elsewhere.clone()]);
        assert!(!any.intersects(&probe));
        assert_eq!(any.blocks().count(), 0);

        let mixed = Composite::new(
            WORLD,
            CompositeMode::Any,
            vec![elsewhere.at(Vec3::new(10.0, 0.0, 0.0)), cube(Vec3::zeros(), 0.4)],
        );
        assert_eq!(mixed.blocks().collect::<Vec<_>>(), vec![CellPos::new(0, 0, 0)]);

        let world = MemoryWorld::new(WORLD, -64.0, 320.0, 128.0);
        world
            .spawn_agent(Agent::new(AgentId::new(7), WORLD, Vec3::new(10.0, 0.0, 0.0), 0.6, 1.8))
            .unwrap();
        assert_eq!(mixed.entities(&world).unwrap().count(), 0);
    }
}
