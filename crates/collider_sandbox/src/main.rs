//! Collider sandbox
//!
//! Builds a small in-memory world, scatters agents over a stone floor and runs
//! every kind of shape query against it. Cell edits computed on the worker
//! pool are applied on the main thread, which owns the world.
//!
//! Usage: `collider_sandbox [config.toml|config.ron]`

use colliders::foundation::logging;
use colliders::prelude::*;
use colliders::shapes::CellScan;
use log::{info, warn, LevelFilter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// World layout
const WORLD_ID: WorldId = WorldId::new(1);
const FLOOR_RADIUS: i64 = 24;
const MIN_HEIGHT: f64 = -64.0;
const MAX_HEIGHT: f64 = 320.0;
const HORIZONTAL_EXTENT: f64 = 256.0;

// Agents
const NUM_AGENTS: u64 = 40;
const AGENT_WIDTH: f64 = 0.6;
const AGENT_HEIGHT: f64 = 1.8;
const SEED: u64 = 0x00c0_111d;

fn load_config() -> Result<CollidersConfig, CollidersError> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from {path}");
            CollidersConfig::load_from_file(&path)?
        }
        None => CollidersConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn build_world(rng: &mut StdRng) -> Result<MemoryWorld, CollidersError> {
    let world = MemoryWorld::new(WORLD_ID, MIN_HEIGHT, MAX_HEIGHT, HORIZONTAL_EXTENT);
    let floor = world.fill(
        CellPos::new(-FLOOR_RADIUS, 0, -FLOOR_RADIUS),
        CellPos::new(FLOOR_RADIUS, 0, FLOOR_RADIUS),
        CellFlags::SOLID,
    )?;
    let pond = world.fill(CellPos::new(4, 1, 4), CellPos::new(8, 1, 8), CellFlags::WATER)?;
    info!("Placed {floor} floor cells and {pond} water cells");

    #[allow(clippy::cast_precision_loss)]
    let spread = FLOOR_RADIUS as f64 - 1.0;
    for id in 0..NUM_AGENTS {
        let feet = Vec3::new(rng.gen_range(-spread..spread), 0.5, rng.gen_range(-spread..spread));
        world.spawn_agent(Agent::new(AgentId::new(id), WORLD_ID, feet, AGENT_WIDTH, AGENT_HEIGHT))?;
    }
    info!("Spawned {} agents", world.agent_count());
    Ok(world)
}

fn report_queries(world: &MemoryWorld, pool: &EnumerationPool) -> Result<(), CollidersError> {
    let blast: Shape = Sphere::new(WORLD_ID, Vec3::new(0.0, 1.0, 0.0), 6.0)?.into();
    let beam: Shape = OrientedBox::new(
        WORLD_ID,
        Vec3::new(0.0, 1.5, 0.0),
        Vec3::new(1.0, 1.0, 12.0),
        EulerAngle::from_degrees(0.0, 30.0, 0.0),
    )
    .into();
    let sweep: Shape = RayShape::new(WORLD_ID, Vec3::new(-20.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.2), 20.0, 0.5)?.into();
    let either: Shape = Composite::new(WORLD_ID, CompositeMode::Any, vec![blast.clone(), beam.clone()]).into();
    let ring: Shape = Composite::disk(
        Sphere::new(WORLD_ID, Vec3::new(0.0, 1.0, 0.0), 10.0)?,
        OrientedBox::new(WORLD_ID, Vec3::new(0.0, 1.0, 0.0), Vec3::new(10.0, 0.5, 10.0), EulerAngle::ZERO),
    )
    .into();

    for (name, shape) in [
        ("blast", &blast),
        ("beam", &beam),
        ("sweep", &sweep),
        ("blast or beam", &either),
        ("ring", &ring),
    ] {
        let agents = match shape.entities(world) {
            Ok(candidates) => candidates.par_collect(pool).len(),
            Err(err) => {
                warn!("Agent query for {name} failed: {err}");
                0
            }
        };
        let cells = shape.blocks().par_collect(pool).len();
        let points = shape.positions().par_collect(pool).len();
        info!("{name}: {agents} agents, {cells} cells, {points} lattice points");
    }
    Ok(())
}

fn report_ray_casts(world: &MemoryWorld, config: &CollidersConfig) -> Result<(), CollidersError> {
    let look = RayShape::new(WORLD_ID, Vec3::new(-12.0, 6.0, 6.0), Vec3::new(1.0, -0.4, 0.0), 40.0, 0.3)?;

    match look.first_block_hit(world, false, true)? {
        Some(hit) => info!("Ray stops at cell {} on its {:?} face", hit.pos, hit.face),
        None => info!("Ray reaches its end unobstructed"),
    }

    let scan = CellScan {
        ignore_liquids: false,
        ignore_passable: true,
        ignore_obstacles: true,
    };
    if let Some(cell) = look.first_block_matching_with(world, &config.ray, scan, Cell::is_liquid)? {
        info!("First liquid along the ray is at {}", cell.pos);
    }

    let anyone = |_: &Agent| true;
    let target = look.resolve_position_with(
        world,
        &config.ray,
        &RayResolveOptions::default(),
        &anyone,
        &Cell::is_collidable,
    )?;
    info!("Ray resolves to ({:.2}, {:.2}, {:.2})", target.x, target.y, target.z);

    let hover = Vec3::new(6.0, 9.0, 6.0);
    info!(
        "Point {:?} floats {:.2} above ground ({:.2} above the pond)",
        hover.as_slice(),
        RayShape::distance_above_ground(world, hover, true)?,
        RayShape::distance_above_ground(world, hover, false)?,
    );
    Ok(())
}

fn report_containment(config: &CollidersConfig) {
    let crate_box = OrientedBox::new(
        WORLD_ID,
        Vec3::new(2.0, 1.5, -3.0),
        Vec3::new(1.0, 1.0, 2.0),
        EulerAngle::from_degrees(0.0, 45.0, 0.0),
    );
    let probe = crate_box.center() + crate_box.forward() * 2.05;
    info!(
        "Probe on the crate's face: strict {}, configured tolerance {}",
        crate_box.contains_within(&probe, 0.0),
        crate_box.contains_within(&probe, config.oriented_box.contains_tolerance_sq),
    );
}

/// Dig a crater: workers find the cells, this thread removes them
fn dig_crater(world: &MemoryWorld, pool: &EnumerationPool) -> Result<usize, CollidersError> {
    let crater: Shape = Sphere::new(WORLD_ID, Vec3::new(-8.0, 0.0, -8.0), 3.5)?.into();
    let (sender, receiver) = handoff(pool.handoff_capacity());
    pool.spawn_delivery(crater.blocks(), sender);

    let mut removed = 0;
    let mut failure = None;
    receiver.drain_blocking(|batch| {
        for pos in batch {
            let solid = world.cell(pos).map_or(false, |cell| !cell.is_empty());
            if !solid {
                continue;
            }
            match world.set_cell(pos, CellFlags::AIR) {
                Ok(()) => removed += 1,
                Err(err) => {
                    failure.get_or_insert(err);
                }
            }
        }
    });
    match failure {
        Some(err) => Err(err.into()),
        None => Ok(removed),
    }
}

fn main() -> Result<(), CollidersError> {
    logging::init(LevelFilter::Info);

    let config = load_config()?;
    let pool = EnumerationPool::new(&config.enumeration)?;
    info!("Enumeration pool running {} workers", pool.threads());

    let mut rng = StdRng::seed_from_u64(SEED);
    let world = build_world(&mut rng)?;

    report_queries(&world, &pool)?;
    report_ray_casts(&world, &config)?;
    report_containment(&config);

    let removed = dig_crater(&world, &pool)?;
    info!("Crater removed {removed} cells, {} remain", world.occupied_cells());

    world.set_index_available(false);
    let blind: Shape = Sphere::new(WORLD_ID, Vec3::zeros(), 4.0)?.into();
    if let Err(err) = blind.entities(&world) {
        warn!("Agent queries fail while the index is offline: {err}");
    }
    Ok(())
}
