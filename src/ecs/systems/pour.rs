use glam::Vec2;

use crate::config::SimConfig;
use crate::ecs::components::{GroundPos, PourState, TreeSize};
use crate::ecs::systems::lifecycle::BLOCK_SIZE;

/// Pot fullness when freshly filled.
pub const POT_FULL: u8 = 100;

/// The single watering pot shared by the whole session.
#[derive(Debug, Clone)]
pub struct Pot {
    /// Either 0 (empty) or `POT_FULL`.
    pub fullness: u8,
    /// Seconds poured this session. Never decreases except on reset.
    pub total_pour_time: f32,
    /// Whether the player is carrying the pot.
    pub held: bool,
}

impl Pot {
    pub fn new() -> Self {
        Self {
            fullness: 0,
            total_pour_time: 0.0,
            held: false,
        }
    }

    /// Whether the session budget has been poured out.
    pub fn is_spent(&self, config: &SimConfig) -> bool {
        self.total_pour_time >= config.pot_budget
    }

    /// Remaining budget as a whole percentage, for the status display.
    pub fn water_percent(&self, config: &SimConfig) -> u8 {
        let left = (1.0 - self.total_pour_time / config.pot_budget).max(0.0);
        (left * 100.0) as u8
    }

    /// Fill the pot at the pond. Returns false if out of reach or not held.
    pub fn refill(&mut self, player: Vec2, config: &SimConfig) -> bool {
        let layout = &config.layout;
        if !self.held || player.distance(layout.pond_center) >= layout.pond_radius + config.refill_reach {
            return false;
        }
        self.fullness = POT_FULL;
        if config.refill_resets_budget {
            self.total_pour_time = 0.0;
        }
        log::info!("pot refilled ({:.1}s of budget used)", self.total_pour_time);
        true
    }
}

/// How far from a tree's centre the player may stand and still water it.
pub fn pour_radius(size: f32, config: &SimConfig) -> f32 {
    BLOCK_SIZE * size + config.pour_reach
}

/// Nearest tree to `player`: (entity, centre, size).
pub fn nearest_tree(world: &hecs::World, player: Vec2) -> Option<(hecs::Entity, Vec2, f32)> {
    world
        .query::<(&GroundPos, &TreeSize)>()
        .iter()
        .map(|(entity, (pos, size))| (entity, pos.0, size.0))
        .min_by(|a, b| {
            player
                .distance_squared(a.1)
                .total_cmp(&player.distance_squared(b.1))
        })
}

/// Routes water from the pot into at most one tree.
pub struct PourController {
    /// Tree chosen when the pour began. Not re-evaluated while pouring.
    target: Option<hecs::Entity>,
}

impl PourController {
    pub fn new() -> Self {
        Self { target: None }
    }

    pub fn target(&self) -> Option<hecs::Entity> {
        self.target
    }

    pub fn is_pouring(&self) -> bool {
        self.target.is_some()
    }

    /// Start watering the tree nearest to `player`. No-op unless the pot is
    /// held and has water, budget remains, and that tree is within reach.
    pub fn begin(
        &mut self,
        world: &mut hecs::World,
        pot: &Pot,
        player: Vec2,
        config: &SimConfig,
    ) -> bool {
        if self.target.is_some() || !pot.held || pot.fullness == 0 || pot.is_spent(config) {
            return false;
        }
        let Some((tree, centre, size)) = nearest_tree(world, player) else {
            return false;
        };
        if player.distance(centre) >= pour_radius(size, config) {
            return false;
        }
        let Ok(mut pour) = world.get::<&mut PourState>(tree) else {
            return false;
        };
        *pour = PourState::Watering { accumulated: 0.0 };
        self.target = Some(tree);
        log::info!("pouring on tree {tree:?}");
        true
    }

    /// Stop pouring. Any accumulation toward regrowth is lost.
    pub fn end(&mut self, world: &mut hecs::World) -> bool {
        let Some(tree) = self.target.take() else {
            return false;
        };
        if let Ok(mut pour) = world.get::<&mut PourState>(tree) {
            if let PourState::Watering { accumulated } = *pour {
                log::debug!("pour on tree {tree:?} stopped after {accumulated:.1}s");
            }
            *pour = PourState::Dry;
        }
        true
    }

    /// Move `dt` seconds of water from the pot into the target tree.
    pub fn update(
        &mut self,
        world: &mut hecs::World,
        pot: &mut Pot,
        player: Vec2,
        dt: f32,
        config: &SimConfig,
    ) {
        let Some(tree) = self.target else {
            return;
        };

        let in_reach = match world.query_one_mut::<(&GroundPos, &TreeSize)>(tree) {
            Ok((pos, size)) => player.distance(pos.0) <= pour_radius(size.0, config),
            Err(_) => false,
        };
        if !in_reach {
            log::info!("walked away from tree {tree:?}, pour cancelled");
            self.end(world);
            return;
        }

        pot.total_pour_time += dt;
        if let Ok(mut pour) = world.get::<&mut PourState>(tree) {
            let accumulated = pour.accumulated() + dt;
            *pour = PourState::Watering { accumulated };
        }

        if pot.is_spent(config) {
            pot.total_pour_time = config.pot_budget;
            pot.fullness = 0;
            log::info!("pot budget of {:.0}s used up", config.pot_budget);
            self.end(world);
        }
    }

    /// Forget the target without touching the world (used on reset).
    pub fn clear(&mut self) {
        self.target = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{FallingLeaves, Lifecycle};

    fn world_with_tree(at: Vec2) -> (hecs::World, hecs::Entity) {
        let mut world = hecs::World::new();
        let tree = world.spawn((
            GroundPos(at),
            TreeSize(1.0),
            Lifecycle::healthy(),
            PourState::Dry,
            FallingLeaves::default(),
        ));
        (world, tree)
    }

    fn full_pot() -> Pot {
        Pot {
            fullness: POT_FULL,
            total_pour_time: 0.0,
            held: true,
        }
    }

    fn pour_of(world: &hecs::World, tree: hecs::Entity) -> PourState {
        *world.get::<&PourState>(tree).unwrap()
    }

    #[test]
    fn begin_requires_held_full_pot_in_reach() {
        let config = SimConfig::default();
        let (mut world, tree) = world_with_tree(Vec2::ZERO);
        let near = Vec2::new(50.0, 0.0);
        let mut ctl = PourController::new();

        let mut pot = full_pot();
        pot.held = false;
        assert!(!ctl.begin(&mut world, &pot, near, &config));

        let mut pot = full_pot();
        pot.fullness = 0;
        assert!(!ctl.begin(&mut world, &pot, near, &config));

        let pot = full_pot();
        assert!(!ctl.begin(&mut world, &pot, Vec2::new(200.0, 0.0), &config));
        assert_eq!(pour_of(&world, tree), PourState::Dry);

        assert!(ctl.begin(&mut world, &pot, near, &config));
        assert_eq!(ctl.target(), Some(tree));
        assert!(!ctl.begin(&mut world, &pot, near, &config));
    }

    #[test]
    fn accumulates_into_pot_and_tree() {
        let config = SimConfig::default();
        let (mut world, tree) = world_with_tree(Vec2::ZERO);
        let mut pot = full_pot();
        let mut ctl = PourController::new();
        let player = Vec2::new(10.0, 0.0);
        ctl.begin(&mut world, &pot, player, &config);

        for _ in 0..6 {
            ctl.update(&mut world, &mut pot, player, 0.5, &config);
        }
        assert_eq!(pot.total_pour_time, 3.0);
        assert_eq!(pour_of(&world, tree).accumulated(), 3.0);
    }

    #[test]
    fn end_discards_accumulation() {
        let config = SimConfig::default();
        let (mut world, tree) = world_with_tree(Vec2::ZERO);
        let mut pot = full_pot();
        let mut ctl = PourController::new();
        let player = Vec2::new(10.0, 0.0);
        ctl.begin(&mut world, &pot, player, &config);
        ctl.update(&mut world, &mut pot, player, 2.0, &config);

        assert!(ctl.end(&mut world));
        assert!(!ctl.end(&mut world));
        assert_eq!(pour_of(&world, tree), PourState::Dry);
        // The session budget keeps what was poured.
        assert_eq!(pot.total_pour_time, 2.0);
    }

    #[test]
    fn walking_away_cancels() {
        let config = SimConfig::default();
        let (mut world, tree) = world_with_tree(Vec2::ZERO);
        let mut pot = full_pot();
        let mut ctl = PourController::new();
        ctl.begin(&mut world, &pot, Vec2::new(10.0, 0.0), &config);

        ctl.update(&mut world, &mut pot, Vec2::new(300.0, 0.0), 0.5, &config);
        assert!(!ctl.is_pouring());
        assert_eq!(pour_of(&world, tree), PourState::Dry);
        assert_eq!(pot.total_pour_time, 0.0);
    }

    #[test]
    fn budget_empties_pot_and_stops() {
        let config = SimConfig::default();
        let (mut world, tree) = world_with_tree(Vec2::ZERO);
        let mut pot = full_pot();
        pot.total_pour_time = 39.5;
        let mut ctl = PourController::new();
        let player = Vec2::new(10.0, 0.0);
        assert!(ctl.begin(&mut world, &pot, player, &config));

        ctl.update(&mut world, &mut pot, player, 1.0, &config);
        assert_eq!(pot.total_pour_time, config.pot_budget);
        assert_eq!(pot.fullness, 0);
        assert!(!ctl.is_pouring());
        assert_eq!(pour_of(&world, tree), PourState::Dry);
        assert_eq!(pot.water_percent(&config), 0);
    }

    #[test]
    fn refill_needs_pond_and_keeps_budget() {
        let config = SimConfig::default();
        let mut pot = Pot::new();
        pot.total_pour_time = 10.0;
        let pond = config.layout.pond_center;

        assert!(!pot.refill(pond, &config));
        pot.held = true;
        assert!(!pot.refill(Vec2::ZERO, &config));
        assert!(pot.refill(pond + Vec2::new(80.0, 0.0), &config));
        assert_eq!(pot.fullness, POT_FULL);
        assert_eq!(pot.total_pour_time, 10.0);
        assert_eq!(pot.water_percent(&config), 75);
    }

    #[test]
    fn refill_can_restore_budget_when_configured() {
        let config = SimConfig {
            refill_resets_budget: true,
            ..SimConfig::default()
        };
        let mut pot = Pot::new();
        pot.held = true;
        pot.total_pour_time = config.pot_budget;
        assert!(pot.refill(config.layout.pond_center, &config));
        assert_eq!(pot.total_pour_time, 0.0);
    }

    #[test]
    fn target_stays_fixed_while_player_moves() {
        let config = SimConfig::default();
        let (mut world, first) = world_with_tree(Vec2::ZERO);
        let second = world.spawn((
            GroundPos(Vec2::new(60.0, 0.0)),
            TreeSize(1.0),
            Lifecycle::healthy(),
            PourState::Dry,
            FallingLeaves::default(),
        ));
        let mut pot = full_pot();
        let mut ctl = PourController::new();
        assert!(ctl.begin(&mut world, &pot, Vec2::new(-10.0, 0.0), &config));
        assert_eq!(ctl.target(), Some(first));

        // Now nearer the second tree, but still within reach of the first.
        let moved = Vec2::new(40.0, 0.0);
        assert_eq!(nearest_tree(&world, moved).map(|t| t.0), Some(second));
        for _ in 0..4 {
            ctl.update(&mut world, &mut pot, moved, 0.5, &config);
        }
        assert_eq!(ctl.target(), Some(first));
        assert_eq!(pour_of(&world, first).accumulated(), 2.0);
        assert_eq!(pour_of(&world, second), PourState::Dry);
    }

    #[test]
    fn nearest_picks_closest_centre() {
        let mut world = hecs::World::new();
        let a = world.spawn((GroundPos(Vec2::new(-100.0, 0.0)), TreeSize(1.0)));
        let b = world.spawn((GroundPos(Vec2::new(100.0, 0.0)), TreeSize(0.5)));
        assert_eq!(nearest_tree(&world, Vec2::new(-20.0, 0.0)).map(|t| t.0), Some(a));
        assert_eq!(nearest_tree(&world, Vec2::new(20.0, 5.0)).map(|t| t.0), Some(b));
    }
}
