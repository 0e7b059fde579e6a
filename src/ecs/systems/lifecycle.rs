use glam::Vec3;

use crate::config::SimConfig;
use crate::ecs::components::{
    FallingLeaves, GroundPos, Leaf, LeafPhase, Lifecycle, PourState, TreeSize,
};

/// Fall speed of a leaf in units/second.
const LEAF_FALL_SPEED: f32 = 120.0;
/// Sideways sway speed at full swing, units/second.
const LEAF_SWAY_SPEED: f32 = 60.0;
/// Vertical distance over which a leaf completes one sway period (radians).
const LEAF_SWAY_PERIOD: f32 = 20.0;
/// Canopy block edge in world units at size 1.0.
pub const BLOCK_SIZE: f32 = 32.0;
/// Trunk height in blocks.
pub const TRUNK_BLOCKS: f32 = 6.0;
/// Half-width of the widest canopy layer in blocks.
pub const CANOPY_HALF_BLOCKS: f32 = 5.0;

/// Lifecycle change worth reporting to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    /// Shedding finished; the tree is bare.
    WentBare(hecs::Entity),
    /// A bare tree started regrowing.
    Revived(hecs::Entity),
    /// Regrowth completed; full canopy again.
    Regrown(hecs::Entity),
}

/// Transition produced by one step of the phase machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    WentBare,
    Revived,
    Regrown,
}

/// Advance one tree's phase by `dt`. Pure; the caller applies side effects.
pub fn step_phase(
    phase: LeafPhase,
    pour: PourState,
    dt: f32,
    config: &SimConfig,
) -> (LeafPhase, Option<Transition>) {
    match phase {
        LeafPhase::Healthy => (phase, None),
        LeafPhase::Shedding { elapsed } => {
            let elapsed = elapsed + dt;
            if elapsed >= config.shed_duration {
                (LeafPhase::Bare, Some(Transition::WentBare))
            } else {
                (LeafPhase::Shedding { elapsed }, None)
            }
        }
        LeafPhase::Bare => match pour {
            PourState::Watering { accumulated } if accumulated >= config.pour_threshold => {
                (LeafPhase::Regrowing { elapsed: 0.0 }, Some(Transition::Revived))
            }
            _ => (phase, None),
        },
        LeafPhase::Regrowing { elapsed } => {
            let elapsed = elapsed + dt;
            if elapsed >= config.regrow_duration {
                (LeafPhase::Healthy, Some(Transition::Regrown))
            } else {
                (LeafPhase::Regrowing { elapsed }, None)
            }
        }
    }
}

/// Update every tree's lifecycle and falling leaves for one tick.
pub fn update(
    world: &mut hecs::World,
    dt: f32,
    config: &SimConfig,
    rng: &mut fastrand::Rng,
    events: &mut Vec<TreeEvent>,
) {
    for (entity, (life, pour, leaves, pos, size)) in world.query_mut::<(
        &mut Lifecycle,
        &PourState,
        &mut FallingLeaves,
        &GroundPos,
        &TreeSize,
    )>() {
        let (next, transition) = step_phase(life.phase, *pour, dt, config);
        life.phase = next;

        match transition {
            Some(Transition::WentBare) => events.push(TreeEvent::WentBare(entity)),
            Some(Transition::Revived) => {
                log::debug!("tree {entity:?} regrowing after {:.1}s of water", pour.accumulated());
                events.push(TreeEvent::Revived(entity));
            }
            Some(Transition::Regrown) => events.push(TreeEvent::Regrown(entity)),
            None => {}
        }

        if life.phase.is_shedding() {
            if leaves.0.len() < config.max_falling_leaves {
                leaves.0.push(spawn_leaf(pos, size, rng));
            }
            fall_leaves(&mut leaves.0, dt);
        } else {
            // Nothing outlives the shedding phase.
            leaves.0.clear();
        }
    }
}

/// Move a healthy tree into shedding. Returns false if it is not healthy.
pub fn start_shedding(world: &mut hecs::World, tree: hecs::Entity) -> bool {
    begin_shedding(world, tree, 0.0)
}

/// Like `start_shedding`, but called by a system earlier in the same tick.
/// `update` still adds this tick's whole `dt`, none of which was spent
/// shedding, so the timer starts that far behind.
pub fn start_shedding_mid_tick(world: &mut hecs::World, tree: hecs::Entity, dt: f32) -> bool {
    begin_shedding(world, tree, -dt)
}

fn begin_shedding(world: &mut hecs::World, tree: hecs::Entity, elapsed: f32) -> bool {
    let Ok(mut life) = world.get::<&mut Lifecycle>(tree) else {
        return false;
    };
    if life.phase != LeafPhase::Healthy {
        return false;
    }
    life.phase = LeafPhase::Shedding { elapsed };
    true
}

/// A new leaf somewhere under the widest canopy layer, at trunk-top height.
fn spawn_leaf(pos: &GroundPos, size: &TreeSize, rng: &mut fastrand::Rng) -> Leaf {
    let block = BLOCK_SIZE * size.0;
    let half = CANOPY_HALF_BLOCKS * block;
    let x = pos.0.x + (rng.f32() * 2.0 - 1.0) * half;
    let z = pos.0.y + (rng.f32() * 2.0 - 1.0) * half;
    Leaf {
        pos: Vec3::new(x, TRUNK_BLOCKS * block, z),
        swing: rng.f32() * 2.0 - 1.0,
    }
}

/// Integrate leaf motion and drop leaves that reached the ground.
fn fall_leaves(leaves: &mut Vec<Leaf>, dt: f32) {
    let mut i = 0;
    while i < leaves.len() {
        let leaf = &mut leaves[i];
        leaf.pos.y -= LEAF_FALL_SPEED * dt;
        leaf.pos.x += (leaf.pos.y / LEAF_SWAY_PERIOD).sin() * leaf.swing * LEAF_SWAY_SPEED * dt;

        if leaf.pos.y <= 0.0 {
            leaves.swap_remove(i);
        } else {
            i += 1;
        }
    }
}
