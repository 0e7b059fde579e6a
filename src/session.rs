use glam::Vec2;

use crate::config::{clamp_to_ground, SimConfig};
use crate::ecs::components::{FallingLeaves, GroundPos, Leaf, Lifecycle, PourState, TreeSize};
use crate::ecs::systems;
use crate::ecs::systems::chain::FallingChain;
use crate::ecs::systems::lifecycle::{self, TreeEvent};
use crate::ecs::systems::pour::{Pot, PourController};
use crate::tree;

/// How a session ends. Set once, cleared only by a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Playing,
    GameOver,
    Victory,
}

/// Per-tree data handed to the renderer.
#[derive(Debug, Clone)]
pub struct TreeView {
    pub id: hecs::Entity,
    pub position: Vec2,
    pub size: f32,
    pub has_leaves: bool,
    pub regrow_progress: f32,
    pub is_shedding: bool,
    pub is_regrowing: bool,
    pub is_being_watered: bool,
    pub pour_accumulated: f32,
    pub leaves: Vec<Leaf>,
}

/// Aggregate numbers for the status display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Status {
    pub dead_count: usize,
    pub trees_saved: u32,
    pub total_pour_time: f32,
    pub water_percent: u8,
    pub pot_fullness: u8,
    pub pot_held: bool,
    pub pouring: bool,
    pub chain_active: bool,
    pub chain_paused: bool,
    pub game_over: bool,
    pub victory: bool,
}

/// One play session: the grove, the pot, the shed chain, and the score.
///
/// Everything the simulation mutates lives here. Commands that do not apply
/// in the current state are ignored and return `false`.
pub struct Session {
    config: SimConfig,
    world: hecs::World,
    rng: fastrand::Rng,
    pot: Pot,
    pour: PourController,
    chain: FallingChain,
    player: Vec2,
    population: usize,
    trees_saved: u32,
    outcome: Outcome,
    /// Simulated seconds since start or last reset.
    elapsed: f64,
    /// Lifecycle events from the current tick (reused buffer).
    events: Vec<TreeEvent>,
}

impl Session {
    pub fn new(config: SimConfig, seed: u64) -> Self {
        let mut s = Self {
            player: config.layout.player_start,
            config,
            world: hecs::World::new(),
            rng: fastrand::Rng::with_seed(seed),
            pot: Pot::new(),
            pour: PourController::new(),
            chain: FallingChain::new(),
            population: 0,
            trees_saved: 0,
            outcome: Outcome::Playing,
            elapsed: 0.0,
            events: Vec::new(),
        };
        s.population = tree::spawn_grove(&mut s.world, &s.config.layout, &mut s.rng);
        s
    }

    /// Advance the simulation by `dt` seconds of real time.
    pub fn tick(&mut self, dt: f32) {
        if self.outcome != Outcome::Playing {
            return;
        }
        self.elapsed += dt as f64;

        self.events.clear();
        systems::tick(
            &mut self.world,
            dt,
            self.player,
            &self.config,
            &mut self.rng,
            &mut self.chain,
            &mut self.pour,
            &mut self.pot,
            &mut self.events,
        );

        for event in &self.events {
            match event {
                TreeEvent::WentBare(tree) => log::info!("tree {tree:?} lost its leaves"),
                TreeEvent::Revived(tree) => {
                    self.trees_saved += 1;
                    log::info!("tree {tree:?} saved ({} so far)", self.trees_saved);
                }
                TreeEvent::Regrown(tree) => log::info!("tree {tree:?} is green again"),
            }
        }

        self.update_outcome();
    }

    fn update_outcome(&mut self) {
        let dead = self.dead_count();
        if dead >= self.config.max_dead_trees || dead == self.population {
            self.outcome = Outcome::GameOver;
        }
        if self.trees_saved >= self.config.trees_to_save {
            self.outcome = Outcome::Victory;
        }
        match self.outcome {
            Outcome::Playing => {}
            Outcome::GameOver => log::info!(
                "game over after {:.1}s: {dead} dead, {} saved",
                self.elapsed,
                self.trees_saved
            ),
            Outcome::Victory => log::info!(
                "victory after {:.1}s: {} trees saved",
                self.elapsed,
                self.trees_saved
            ),
        }
    }

    fn accepts_commands(&self) -> bool {
        self.outcome == Outcome::Playing
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    pub fn start_shed_chain(&mut self) -> bool {
        self.accepts_commands() && self.chain.start(&mut self.world, &mut self.rng).is_some()
    }

    pub fn toggle_chain_pause(&mut self) -> bool {
        self.accepts_commands() && self.chain.toggle_pause()
    }

    /// Make one tree shed right now, outside the chain.
    pub fn shed_tree(&mut self, tree: hecs::Entity) -> bool {
        if !self.accepts_commands() || !lifecycle::start_shedding(&mut self.world, tree) {
            return false;
        }
        log::info!("tree {tree:?} told to shed");
        true
    }

    /// Take the pot out or put it away. Putting it away stops a pour.
    pub fn toggle_pot(&mut self) -> bool {
        if !self.accepts_commands() {
            return false;
        }
        self.pot.held = !self.pot.held;
        if !self.pot.held {
            self.pour.end(&mut self.world);
        }
        true
    }

    /// Start watering the tree nearest to `player`.
    pub fn begin_pour(&mut self, player: Vec2) -> bool {
        if !self.accepts_commands() {
            return false;
        }
        self.set_player_position(player);
        self.pour
            .begin(&mut self.world, &self.pot, self.player, &self.config)
    }

    pub fn end_pour(&mut self) -> bool {
        self.accepts_commands() && self.pour.end(&mut self.world)
    }

    pub fn refill_pot(&mut self, player: Vec2) -> bool {
        if !self.accepts_commands() {
            return false;
        }
        self.set_player_position(player);
        self.pot.refill(self.player, &self.config)
    }

    /// Move the player, clamped to the ground. Refused if the spot is inside
    /// a trunk or the pond. Pour range is checked against this every tick.
    pub fn set_player_position(&mut self, pos: Vec2) -> bool {
        if !self.accepts_commands() {
            return false;
        }
        let pos = clamp_to_ground(pos);
        if tree::trunk_at(&self.world, pos) || self.config.layout.in_pond(pos) {
            return false;
        }
        self.player = pos;
        true
    }

    /// Throw the grove away and start over.
    pub fn reset_session(&mut self) {
        self.world.clear();
        self.population = tree::spawn_grove(&mut self.world, &self.config.layout, &mut self.rng);
        self.pot = Pot::new();
        self.pour.clear();
        self.chain = FallingChain::new();
        self.player = self.config.layout.player_start;
        self.trees_saved = 0;
        self.outcome = Outcome::Playing;
        self.elapsed = 0.0;
        self.events.clear();
        log::info!("session reset");
    }

    // -----------------------------------------------------------------------
    // Read path
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn player(&self) -> Vec2 {
        self.player
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn population(&self) -> usize {
        self.population
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn game_over(&self) -> bool {
        self.outcome != Outcome::Playing
    }

    pub fn victory(&self) -> bool {
        self.outcome == Outcome::Victory
    }

    pub fn trees_saved(&self) -> u32 {
        self.trees_saved
    }

    pub fn pot(&self) -> &Pot {
        &self.pot
    }

    pub fn is_pouring(&self) -> bool {
        self.pour.is_pouring()
    }

    /// Tree the pot is emptying into, if any.
    pub fn pour_target(&self) -> Option<hecs::Entity> {
        self.pour.target()
    }

    /// Tree the shed chain is working on, if any.
    pub fn chain_tree(&self) -> Option<hecs::Entity> {
        self.chain.current_tree()
    }

    pub fn chain_active(&self) -> bool {
        self.chain.is_active()
    }

    pub fn chain_paused(&self) -> bool {
        self.chain.is_paused()
    }

    /// Trees with no leaves and nothing growing back.
    pub fn dead_count(&self) -> usize {
        self.world
            .query::<&Lifecycle>()
            .iter()
            .filter(|(_, life)| life.is_dead())
            .count()
    }

    /// Short label for the HUD.
    pub fn game_state(&self) -> &'static str {
        match self.outcome {
            Outcome::Victory => "Victory",
            Outcome::GameOver => "Game Over",
            Outcome::Playing if self.chain.is_paused() => "Paused",
            Outcome::Playing => "Playing",
        }
    }

    pub fn status(&self) -> Status {
        Status {
            dead_count: self.dead_count(),
            trees_saved: self.trees_saved,
            total_pour_time: self.pot.total_pour_time,
            water_percent: self.pot.water_percent(&self.config),
            pot_fullness: self.pot.fullness,
            pot_held: self.pot.held,
            pouring: self.pour.is_pouring(),
            chain_active: self.chain.is_active(),
            chain_paused: self.chain.is_paused(),
            game_over: self.game_over(),
            victory: self.victory(),
        }
    }

    /// Snapshot of every tree, in spawn order.
    pub fn trees(&self) -> Vec<TreeView> {
        let regrow_duration = self.config.regrow_duration;
        let mut views: Vec<TreeView> = self
            .world
            .query::<(&GroundPos, &TreeSize, &Lifecycle, &PourState, &FallingLeaves)>()
            .iter()
            .map(|(id, parts)| tree_view(id, parts, regrow_duration))
            .collect();
        views.sort_by_key(|v| v.id.id());
        views
    }

    pub fn tree(&self, id: hecs::Entity) -> Option<TreeView> {
        let mut query = self
            .world
            .query_one::<(&GroundPos, &TreeSize, &Lifecycle, &PourState, &FallingLeaves)>(id)
            .ok()?;
        let parts = query.get()?;
        Some(tree_view(id, parts, self.config.regrow_duration))
    }
}

fn tree_view(
    id: hecs::Entity,
    (pos, size, life, pour, leaves): (&GroundPos, &TreeSize, &Lifecycle, &PourState, &FallingLeaves),
    regrow_duration: f32,
) -> TreeView {
    TreeView {
        id,
        position: pos.0,
        size: size.0,
        has_leaves: life.phase.has_leaves(),
        regrow_progress: life.regrow_progress(regrow_duration),
        is_shedding: life.phase.is_shedding(),
        is_regrowing: life.phase.is_regrowing(),
        is_being_watered: pour.is_watering(),
        pour_accumulated: pour.accumulated(),
        leaves: leaves.0.clone(),
    }
}
