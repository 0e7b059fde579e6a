pub mod canopy;

use crate::config::Layout;
use crate::ecs::components::*;

/// Trunk half-width at size 1.0.
const TRUNK_HALF_WIDTH: f32 = 12.0;
/// Gap the player keeps from a trunk.
const TRUNK_CLEARANCE: f32 = 4.0;

/// Spawn the central tree plus one tree per outer position, with rolled sizes.
pub fn spawn_grove(world: &mut hecs::World, layout: &Layout, rng: &mut fastrand::Rng) -> usize {
    spawn_tree(world, glam::Vec2::ZERO, layout.center_tree_size);

    for &pos in &layout.outer_trees {
        let span = layout.outer_size_max - layout.outer_size_min;
        let size = layout.outer_size_min + rng.f32() * span;
        spawn_tree(world, pos, size);
    }

    1 + layout.outer_trees.len()
}

/// Spawn one healthy, dry tree.
pub fn spawn_tree(world: &mut hecs::World, pos: glam::Vec2, size: f32) -> hecs::Entity {
    world.spawn((
        GroundPos(pos),
        TreeSize(size),
        Lifecycle::healthy(),
        PourState::Dry,
        FallingLeaves::default(),
    ))
}

/// Whether a player standing at `p` would be inside some tree's trunk.
pub fn trunk_at(world: &hecs::World, p: glam::Vec2) -> bool {
    world
        .query::<(&GroundPos, &TreeSize)>()
        .iter()
        .any(|(_, (pos, size))| {
            let reach = TRUNK_HALF_WIDTH * size.0 + TRUNK_CLEARANCE;
            (p - pos.0).abs().max_element() < reach
        })
}
