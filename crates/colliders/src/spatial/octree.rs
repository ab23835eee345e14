//! Octree spatial partitioning structure
//!
//! Divides 3D space into hierarchical regions for fast agent lookups.
//! Each node subdivides into 8 octants when agent density exceeds a threshold.
//! Entries are stored by position with a bounding radius, so region queries
//! return every agent whose bounding sphere may reach into the region.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Vec3, Vec3Ext};
use crate::world::AgentId;

/// Configuration for octree behavior
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Maximum entries per node before subdivision
    pub max_entries_per_node: usize,

    /// Maximum subdivision depth
    pub max_depth: u32,

    /// Minimum node half-size (prevents excessive subdivision)
    pub min_node_size: f64,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_entries_per_node: 8,
            max_depth: 8,
            min_node_size: 1.0,
        }
    }
}

/// Closed axis-aligned region used for node bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Bounds {
    /// Create bounds from two corners, given in any order
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.component_min(&b),
            max: a.component_max(&b),
        }
    }

    /// Create bounds from center and half-extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        let extents = extents.abs();
        Self::new(center - extents, center + extents)
    }

    /// Center point
    pub fn center(&self) -> Vec3 {
        self.min.midpoint(&self.max)
    }

    /// Half-extents
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Closed containment test
    pub fn contains_point(&self, point: Vec3) -> bool {
        (0..3).all(|axis| self.min[axis] <= point[axis] && point[axis] <= self.max[axis])
    }

    /// Closed overlap test
    pub fn overlaps(&self, other: &Bounds) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.max[axis] && self.max[axis] >= other.min[axis])
    }

    /// Same bounds grown by `amount` on every side
    pub fn expanded(&self, amount: f64) -> Self {
        let grow = Vec3::repeat(amount);
        Self::new(self.min - grow, self.max + grow)
    }

    /// Distance along the ray to the entry point, 0 when the origin is inside
    pub fn intersect_ray(&self, origin: Vec3, direction: Vec3) -> Option<f64> {
        let inverse = direction.map(|d| if d != 0.0 { 1.0 / d } else { f64::INFINITY });

        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;
        for axis in 0..3 {
            if direction[axis] == 0.0 {
                // parallel to this slab: must already be inside it
                if origin[axis] < self.min[axis] || origin[axis] > self.max[axis] {
                    return None;
                }
                continue;
            }
            let t1 = (self.min[axis] - origin[axis]) * inverse[axis];
            let t2 = (self.max[axis] - origin[axis]) * inverse[axis];
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
        }

        if t_max >= t_min && t_max >= 0.0 {
            Some(t_min.max(0.0))
        } else {
            None
        }
    }
}

/// Agent stored in the octree with position and bounding radius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeEntry {
    /// Agent identity
    pub id: AgentId,
    /// Agent position
    pub position: Vec3,
    /// Radius of a sphere around `position` enclosing the agent
    pub radius: f64,
}

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
pub struct OctreeNode {
    /// World-space bounds of this node
    pub bounds: Bounds,

    /// Entries contained in this node (if leaf)
    pub entries: Vec<OctreeEntry>,

    /// Child nodes (8 octants), None if this is a leaf
    pub children: Option<Box<[OctreeNode; 8]>>,

    /// Depth in the tree (0 = root)
    pub depth: u32,
}

impl OctreeNode {
    /// Create a new leaf node
    pub fn new(bounds: Bounds, depth: u32) -> Self {
        Self {
            bounds,
            entries: Vec::new(),
            children: None,
            depth,
        }
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    // Octant layout: bit 0 = +X, bit 1 = +Y, bit 2 = +Z
    fn octant_of(center: Vec3, position: Vec3) -> usize {
        let x_bit = usize::from(position.x >= center.x);
        let y_bit = usize::from(position.y >= center.y);
        let z_bit = usize::from(position.z >= center.z);
        (z_bit << 2) | (y_bit << 1) | x_bit
    }

    fn subdivide(&mut self) {
        if self.children.is_some() {
            return;
        }

        let center = self.bounds.center();
        let quarter_extents = self.bounds.extents() * 0.5;
        let depth = self.depth + 1;

        let children: [OctreeNode; 8] = std::array::from_fn(|octant| {
            let sign = |bit: usize| if octant & bit != 0 { 1.0 } else { -1.0 };
            let child_center = Vec3::new(
                center.x + quarter_extents.x * sign(1),
                center.y + quarter_extents.y * sign(2),
                center.z + quarter_extents.z * sign(4),
            );
            OctreeNode::new(Bounds::from_center_extents(child_center, quarter_extents), depth)
        });
        let mut children = Box::new(children);

        for entry in std::mem::take(&mut self.entries) {
            children[Self::octant_of(center, entry.position)].entries.push(entry);
        }
        self.children = Some(children);
    }

    /// Insert an entry into this node
    pub fn insert(&mut self, entry: OctreeEntry, config: &OctreeConfig) -> bool {
        if !self.bounds.contains_point(entry.position) {
            return false;
        }

        if self.is_leaf() {
            let should_subdivide = self.entries.len() >= config.max_entries_per_node
                && self.depth < config.max_depth
                && self.bounds.extents().x > config.min_node_size;

            if !should_subdivide {
                self.entries.push(entry);
                return true;
            }
            self.subdivide();
        }

        let octant = Self::octant_of(self.bounds.center(), entry.position);
        match self.children {
            Some(ref mut children) => children[octant].insert(entry, config),
            None => false,
        }
    }

    /// Remove an entry from this node or its children
    pub fn remove(&mut self, id: AgentId) -> Option<OctreeEntry> {
        if let Some(index) = self.entries.iter().position(|e| e.id == id) {
            return Some(self.entries.swap_remove(index));
        }

        self.children
            .as_mut()
            .and_then(|children| children.iter_mut().find_map(|child| child.remove(id)))
    }

    /// Collect entries whose bounding sphere overlaps `region`
    pub fn query_region(&self, region: &Bounds, max_radius: f64, results: &mut Vec<OctreeEntry>) {
        // entries may poke out of the node they are stored in by up to max_radius
        if !self.bounds.expanded(max_radius).overlaps(region) {
            return;
        }

        for entry in &self.entries {
            let closest = entry.position.component_max(&region.min).component_min(&region.max);
            if (closest - entry.position).norm_squared() <= entry.radius * entry.radius {
                results.push(*entry);
            }
        }

        if let Some(ref children) = self.children {
            for child in children.iter() {
                child.query_region(region, max_radius, results);
            }
        }
    }

    /// Collect entries stored in nodes the ray passes through
    pub fn query_ray(&self, origin: Vec3, direction: Vec3, max_radius: f64, results: &mut Vec<OctreeEntry>) {
        if self.bounds.expanded(max_radius).intersect_ray(origin, direction).is_none() {
            return;
        }

        results.extend_from_slice(&self.entries);

        if let Some(ref children) = self.children {
            for child in children.iter() {
                child.query_ray(origin, direction, max_radius, results);
            }
        }
    }

    /// Count entries in this node and all children
    pub fn count_entries(&self) -> usize {
        let nested = self
            .children
            .as_ref()
            .map_or(0, |children| children.iter().map(OctreeNode::count_entries).sum());
        self.entries.len() + nested
    }
}

/// Octree over agent positions
#[derive(Debug, Clone)]
pub struct Octree {
    /// Root node containing the entire world space
    pub root: OctreeNode,

    config: OctreeConfig,

    /// Largest radius inserted since the last clear
    max_radius: f64,
}

impl Octree {
    /// Create a new octree with given world bounds
    pub fn new(world_bounds: Bounds, config: OctreeConfig) -> Self {
        Self {
            root: OctreeNode::new(world_bounds, 0),
            config,
            max_radius: 0.0,
        }
    }

    /// Insert an agent; returns false when the position lies outside the tree
    pub fn insert(&mut self, id: AgentId, position: Vec3, radius: f64) -> bool {
        self.max_radius = self.max_radius.max(radius);
        self.root.insert(OctreeEntry { id, position, radius }, &self.config)
    }

    /// Remove an agent, returning its entry
    pub fn remove(&mut self, id: AgentId) -> Option<OctreeEntry> {
        self.root.remove(id)
    }

    /// Entries whose bounding sphere overlaps the box `center ± extents`
    pub fn query_box(&self, center: Vec3, extents: Vec3) -> Vec<OctreeEntry> {
        let mut results = Vec::new();
        let region = Bounds::from_center_extents(center, extents);
        self.root.query_region(&region, self.max_radius, &mut results);
        results
    }

    /// Entries that may be crossed by a ray grown sideways by `padding`.
    /// Callers still test each one exactly.
    pub fn query_ray(&self, origin: Vec3, direction: Vec3, padding: f64) -> Vec<OctreeEntry> {
        let mut results = Vec::new();
        self.root
            .query_ray(origin, direction, self.max_radius + padding.max(0.0), &mut results);
        results
    }

    /// Total entry count
    pub fn len(&self) -> usize {
        self.root.count_entries()
    }

    /// Whether the tree holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear the octree
    pub fn clear(&mut self) {
        self.root = OctreeNode::new(self.root.bounds, 0);
        self.max_radius = 0.0;
    }
}
