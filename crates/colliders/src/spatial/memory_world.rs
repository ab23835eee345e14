//! In-process world backed by a cell map and an agent octree
//!
//! Implements [`WorldQuery`] for tests and headless tools. Reads take shared
//! locks and may run from any number of enumeration workers; mutation
//! (`set_cell`, `spawn_agent`, ...) is meant to happen on the world's single
//! owner thread.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace};
use parking_lot::RwLock;

use super::cell_walk::CellWalk;
use super::octree::{Bounds, Octree, OctreeConfig};
use crate::foundation::math::{Vec3, Vec3Ext};
use crate::world::{
    Agent, AgentFilter, AgentId, Cell, CellFlags, CellHit, CellPos, Face, FluidMode, QueryError,
    WorldId, WorldQuery,
};

/// Agents plus their broad-phase index, guarded together
#[derive(Debug)]
struct AgentStore {
    agents: HashMap<AgentId, Agent>,
    index: Octree,
}

impl AgentStore {
    /// Radius of a sphere around the feet that encloses the agent's bounds
    fn reach(agent: &Agent) -> f64 {
        let half_width = agent.width * 0.5;
        (2.0 * half_width * half_width + agent.height * agent.height).sqrt()
    }
}

/// Simple thread-safe world for exercising shapes without a simulation
#[derive(Debug)]
pub struct MemoryWorld {
    id: WorldId,
    min_height: f64,
    max_height: f64,
    cells: RwLock<HashMap<CellPos, CellFlags>>,
    agents: RwLock<AgentStore>,
    index_available: AtomicBool,
}

impl MemoryWorld {
    /// Create an empty world spanning `min_height..max_height` vertically and
    /// `horizontal_extent` around the origin horizontally
    pub fn new(id: WorldId, min_height: f64, max_height: f64, horizontal_extent: f64) -> Self {
        Self::with_octree(id, min_height, max_height, horizontal_extent, OctreeConfig::default())
    }

    /// Create an empty world with a custom agent index layout
    pub fn with_octree(
        id: WorldId,
        min_height: f64,
        max_height: f64,
        horizontal_extent: f64,
        octree: OctreeConfig,
    ) -> Self {
        let bounds = Bounds::new(
            Vec3::new(-horizontal_extent, min_height, -horizontal_extent),
            Vec3::new(horizontal_extent, max_height, horizontal_extent),
        );
        debug!("Created memory world {id} with bounds {:?}..{:?}", bounds.min, bounds.max);
        Self {
            id,
            min_height: min_height.min(max_height),
            max_height: max_height.max(min_height),
            cells: RwLock::new(HashMap::new()),
            agents: RwLock::new(AgentStore {
                agents: HashMap::new(),
                index: Octree::new(bounds, octree),
            }),
            index_available: AtomicBool::new(true),
        }
    }

    /// Replace the properties of a cell. Setting air removes the entry.
    pub fn set_cell(&self, pos: CellPos, flags: CellFlags) -> Result<(), QueryError> {
        self.check_height(pos)?;
        let mut cells = self.cells.write();
        if flags == CellFlags::AIR {
            cells.remove(&pos);
        } else {
            cells.insert(pos, flags);
        }
        Ok(())
    }

    /// Fill an inclusive range of cells
    pub fn fill(&self, min: CellPos, max: CellPos, flags: CellFlags) -> Result<usize, QueryError> {
        let mut filled = 0;
        for pos in crate::enumeration::LatticeScan::between(min, max) {
            self.set_cell(pos, flags)?;
            filled += 1;
        }
        Ok(filled)
    }

    /// Number of non-air cells
    pub fn occupied_cells(&self) -> usize {
        self.cells.read().len()
    }

    /// Add or move an agent
    pub fn spawn_agent(&self, agent: Agent) -> Result<(), QueryError> {
        self.check_world(agent.world)?;
        let mut store = self.agents.write();
        store.index.remove(agent.id);
        if !store.index.insert(agent.id, agent.position, AgentStore::reach(&agent)) {
            return Err(QueryError::IndexUnavailable(format!(
                "agent {:?} at {:?} is outside the indexed region",
                agent.id, agent.position
            )));
        }
        store.agents.insert(agent.id, agent);
        Ok(())
    }

    /// Remove an agent, returning its last state
    pub fn despawn_agent(&self, id: AgentId) -> Option<Agent> {
        let mut store = self.agents.write();
        store.index.remove(id);
        store.agents.remove(&id)
    }

    /// Number of agents
    pub fn agent_count(&self) -> usize {
        self.agents.read().agents.len()
    }

    /// Simulate the spatial index going offline (or coming back)
    pub fn set_index_available(&self, available: bool) {
        self.index_available.store(available, Ordering::Release);
    }

    fn check_index(&self) -> Result<(), QueryError> {
        if self.index_available.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(QueryError::IndexUnavailable(format!("{} index offline", self.id)))
        }
    }

    fn check_world(&self, world: WorldId) -> Result<(), QueryError> {
        if world == self.id {
            Ok(())
        } else {
            Err(QueryError::WorldMismatch {
                expected: self.id,
                actual: world,
            })
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn check_height(&self, pos: CellPos) -> Result<(), QueryError> {
        let y = pos.y as f64;
        if y < self.min_height || y >= self.max_height {
            Err(QueryError::CellAccessDenied(pos))
        } else {
            Ok(())
        }
    }

    fn flags(&self, pos: CellPos) -> CellFlags {
        self.cells.read().get(&pos).copied().unwrap_or(CellFlags::AIR)
    }

    /// Face a ray starting inside a cell is reported to have struck
    fn facing(direction: Vec3) -> Face {
        let axis = (0..3)
            .max_by(|&a, &b| direction[a].abs().total_cmp(&direction[b].abs()))
            .unwrap_or(0);
        Face::entered_from(axis, if direction[axis] > 0.0 { 1 } else { -1 })
    }

    fn agent_bounds(agent: &Agent) -> Bounds {
        let half_width = agent.width * 0.5;
        let feet = agent.position;
        Bounds::new(
            Vec3::new(feet.x - half_width, feet.y, feet.z - half_width),
            Vec3::new(feet.x + half_width, feet.y + agent.height, feet.z + half_width),
        )
    }
}

impl WorldQuery for MemoryWorld {
    fn world_id(&self) -> WorldId {
        self.id
    }

    fn nearby_agents(&self, center: Vec3, extents: Vec3) -> Result<Vec<Agent>, QueryError> {
        self.check_index()?;
        let region = Bounds::from_center_extents(center, extents);
        let store = self.agents.read();
        let candidates = store.index.query_box(center, extents);
        trace!("Octree returned {} candidates for region query", candidates.len());

        Ok(candidates
            .iter()
            .filter_map(|entry| store.agents.get(&entry.id))
            .filter(|agent| Self::agent_bounds(agent).overlaps(&region))
            .copied()
            .collect())
    }

    fn ray_trace_cells(
        &self,
        origin: Vec3,
        direction: Vec3,
        length: f64,
        fluid_mode: FluidMode,
        ignore_passable: bool,
    ) -> Result<Option<CellHit>, QueryError> {
        let cells = self.cells.read();
        for step in CellWalk::new(origin, direction, length) {
            let flags = cells.get(&step.pos).copied().unwrap_or(CellFlags::AIR);
            let cell = Cell::new(self.id, step.pos, flags);
            let stops = if cell.is_empty() {
                false
            } else if cell.is_liquid() {
                fluid_mode == FluidMode::Always
            } else if cell.is_passable() {
                !ignore_passable
            } else {
                true
            };
            if stops {
                let face = step.face.unwrap_or_else(|| Self::facing(direction));
                return Ok(Some(CellHit { pos: step.pos, face }));
            }
        }
        Ok(None)
    }

    fn ray_trace_agents(
        &self,
        origin: Vec3,
        direction: Vec3,
        length: f64,
        thickness: f64,
        filter: AgentFilter<'_>,
    ) -> Result<Option<Agent>, QueryError> {
        self.check_index()?;
        let direction = direction.normalize_or(Vec3::zeros());
        let store = self.agents.read();

        let hit = store
            .index
            .query_ray(origin, direction, thickness)
            .iter()
            .filter_map(|entry| store.agents.get(&entry.id))
            .filter(|agent| filter(agent))
            .filter_map(|agent| {
                Self::agent_bounds(agent)
                    .expanded(thickness)
                    .intersect_ray(origin, direction)
                    .filter(|&distance| distance <= length)
                    .map(|distance| (distance, *agent))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0));

        Ok(hit.map(|(_, agent)| agent))
    }

    fn cell(&self, pos: CellPos) -> Result<Cell, QueryError> {
        self.check_height(pos)?;
        Ok(Cell::new(self.id, pos, self.flags(pos)))
    }

    fn max_height(&self) -> f64 {
        self.max_height
    }
}
