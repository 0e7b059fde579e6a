pub mod chain;
pub mod lifecycle;
pub mod pour;

use glam::Vec2;

use crate::config::SimConfig;
use chain::FallingChain;
use lifecycle::TreeEvent;
use pour::{Pot, PourController};

/// Run all simulation systems for one frame of `dt` seconds.
pub fn tick(
    world: &mut hecs::World,
    dt: f32,
    player: Vec2,
    config: &SimConfig,
    rng: &mut fastrand::Rng,
    chain: &mut FallingChain,
    pour: &mut PourController,
    pot: &mut Pot,
    events: &mut Vec<TreeEvent>,
) {
    // 1. Shed chain picks the next tree if its cool-down ran out
    chain.advance(world, dt, config, rng);

    // 2. Water flows from the pot into the targeted tree
    pour.update(world, pot, player, dt, config);

    // 3. Tree lifecycles and falling leaves
    lifecycle::update(world, dt, config, rng, events);
}
