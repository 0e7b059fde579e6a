use crate::config::SimConfig;
use crate::ecs::components::{LeafPhase, Lifecycle};
use crate::ecs::systems::lifecycle;

/// Where the shed chain is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChainPhase {
    /// No chain running.
    Idle,
    /// `current` is losing its leaves.
    Shedding { current: hecs::Entity },
    /// `current` finished shedding; the next pick happens when `remaining`
    /// reaches zero.
    Cooldown {
        current: hecs::Entity,
        remaining: f32,
    },
}

/// Forces healthy trees to shed one after another, with a cool-down between.
pub struct FallingChain {
    phase: ChainPhase,
    /// Holds the next pick. Timers on trees and the cool-down keep running.
    paused: bool,
    /// Reused candidate buffer.
    candidates: Vec<hecs::Entity>,
}

impl FallingChain {
    pub fn new() -> Self {
        Self {
            phase: ChainPhase::Idle,
            paused: true,
            candidates: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase != ChainPhase::Idle
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn current_tree(&self) -> Option<hecs::Entity> {
        match self.phase {
            ChainPhase::Idle => None,
            ChainPhase::Shedding { current } | ChainPhase::Cooldown { current, .. } => Some(current),
        }
    }

    /// Start a new chain by shedding a random healthy tree. No-op if a chain
    /// is already running or nothing is healthy.
    pub fn start(&mut self, world: &mut hecs::World, rng: &mut fastrand::Rng) -> Option<hecs::Entity> {
        if self.is_active() {
            return None;
        }
        let tree = self.shed_random(world, rng, None)?;
        self.phase = ChainPhase::Shedding { current: tree };
        self.paused = false;
        log::info!("shed chain started on tree {tree:?}");
        Some(tree)
    }

    /// Pause or resume a running chain. No-op when idle.
    pub fn toggle_pause(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.paused = !self.paused;
        log::info!("shed chain {}", if self.paused { "paused" } else { "resumed" });
        true
    }

    /// Advance the chain by one tick.
    pub fn advance(
        &mut self,
        world: &mut hecs::World,
        dt: f32,
        config: &SimConfig,
        rng: &mut fastrand::Rng,
    ) {
        match self.phase {
            ChainPhase::Idle => {}
            ChainPhase::Shedding { current } => {
                if self.paused {
                    return;
                }
                let still_shedding = world
                    .get::<&Lifecycle>(current)
                    .map(|life| life.phase.is_shedding())
                    .unwrap_or(false);
                if !still_shedding {
                    self.phase = ChainPhase::Cooldown {
                        current,
                        remaining: config.chain_delay,
                    };
                }
            }
            ChainPhase::Cooldown { current, remaining } => {
                // The cool-down is a deadline, so it runs through a pause.
                let remaining = remaining - dt;
                self.phase = ChainPhase::Cooldown { current, remaining };
                if self.paused || remaining > 0.0 {
                    return;
                }
                match self.shed_random(world, rng, Some(dt)) {
                    Some(tree) => {
                        log::info!("shed chain moves on to tree {tree:?}");
                        self.phase = ChainPhase::Shedding { current: tree };
                    }
                    None => {
                        log::info!("shed chain ended, no healthy trees left");
                        self.phase = ChainPhase::Idle;
                    }
                }
            }
        }
    }

    /// Pick uniformly among healthy trees and start it shedding. `tick_dt` is
    /// set when called from inside a tick, before the lifecycle step.
    fn shed_random(
        &mut self,
        world: &mut hecs::World,
        rng: &mut fastrand::Rng,
        tick_dt: Option<f32>,
    ) -> Option<hecs::Entity> {
        self.candidates.clear();
        self.candidates.extend(
            world
                .query::<&Lifecycle>()
                .iter()
                .filter(|(_, life)| life.phase == LeafPhase::Healthy)
                .map(|(entity, _)| entity),
        );
        if self.candidates.is_empty() {
            return None;
        }
        let tree = self.candidates[rng.usize(0..self.candidates.len())];
        match tick_dt {
            Some(dt) => lifecycle::start_shedding_mid_tick(world, tree, dt),
            None => lifecycle::start_shedding(world, tree),
        };
        Some(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grove(count: usize) -> (hecs::World, Vec<hecs::Entity>) {
        let mut world = hecs::World::new();
        let trees = (0..count).map(|_| world.spawn((Lifecycle::healthy(),))).collect();
        (world, trees)
    }

    fn set_phase(world: &mut hecs::World, tree: hecs::Entity, phase: LeafPhase) {
        world.get::<&mut Lifecycle>(tree).unwrap().phase = phase;
    }

    fn shedding_count(world: &hecs::World) -> usize {
        world
            .query::<&Lifecycle>()
            .iter()
            .filter(|(_, life)| life.phase.is_shedding())
            .count()
    }

    #[test]
    fn starts_paused_and_idle() {
        let chain = FallingChain::new();
        assert!(!chain.is_active());
        assert!(chain.is_paused());
        assert_eq!(chain.current_tree(), None);
    }

    #[test]
    fn start_sheds_one_healthy_tree() {
        let (mut world, trees) = grove(5);
        let mut rng = fastrand::Rng::with_seed(1);
        let mut chain = FallingChain::new();

        let first = chain.start(&mut world, &mut rng).unwrap();
        assert!(trees.contains(&first));
        assert!(chain.is_active());
        assert!(!chain.is_paused());
        assert_eq!(shedding_count(&world), 1);

        // Second start is ignored while the chain runs.
        assert_eq!(chain.start(&mut world, &mut rng), None);
        assert_eq!(shedding_count(&world), 1);
    }

    #[test]
    fn start_without_healthy_trees_is_noop() {
        let (mut world, trees) = grove(2);
        for &t in &trees {
            set_phase(&mut world, t, LeafPhase::Bare);
        }
        let mut rng = fastrand::Rng::with_seed(1);
        let mut chain = FallingChain::new();
        assert_eq!(chain.start(&mut world, &mut rng), None);
        assert!(!chain.is_active());
        assert!(chain.is_paused());
    }

    #[test]
    fn next_tree_after_delay() {
        let config = SimConfig::default();
        let (mut world, _) = grove(3);
        let mut rng = fastrand::Rng::with_seed(9);
        let mut chain = FallingChain::new();
        let first = chain.start(&mut world, &mut rng).unwrap();

        chain.advance(&mut world, 1.0, &config, &mut rng);
        assert_eq!(chain.phase, ChainPhase::Shedding { current: first });

        set_phase(&mut world, first, LeafPhase::Bare);
        chain.advance(&mut world, 1.0, &config, &mut rng);
        assert!(matches!(chain.phase, ChainPhase::Cooldown { .. }));

        for _ in 0..4 {
            chain.advance(&mut world, 1.0, &config, &mut rng);
            assert!(matches!(chain.phase, ChainPhase::Cooldown { .. }));
        }
        chain.advance(&mut world, 1.0, &config, &mut rng);
        let next = chain.current_tree().unwrap();
        assert_ne!(next, first);
        assert_eq!(chain.phase, ChainPhase::Shedding { current: next });
        assert_eq!(shedding_count(&world), 1);
        // The lifecycle step of this same tick brings the timer to zero.
        assert_eq!(
            world.get::<&Lifecycle>(next).unwrap().phase,
            LeafPhase::Shedding { elapsed: -1.0 }
        );
    }

    #[test]
    fn pause_holds_selection_but_not_the_deadline() {
        let config = SimConfig::default();
        let (mut world, _) = grove(3);
        let mut rng = fastrand::Rng::with_seed(3);
        let mut chain = FallingChain::new();
        let first = chain.start(&mut world, &mut rng).unwrap();
        set_phase(&mut world, first, LeafPhase::Bare);
        chain.advance(&mut world, 0.5, &config, &mut rng);

        assert!(chain.toggle_pause());
        for _ in 0..10 {
            chain.advance(&mut world, 1.0, &config, &mut rng);
        }
        assert_eq!(chain.current_tree(), Some(first));
        assert_eq!(shedding_count(&world), 0);

        // Deadline already passed, so resuming picks on the next tick.
        assert!(chain.toggle_pause());
        chain.advance(&mut world, 0.01, &config, &mut rng);
        assert_ne!(chain.current_tree(), Some(first));
        assert_eq!(shedding_count(&world), 1);
    }

    #[test]
    fn paused_chain_does_not_notice_finished_tree() {
        let config = SimConfig::default();
        let (mut world, _) = grove(2);
        let mut rng = fastrand::Rng::with_seed(3);
        let mut chain = FallingChain::new();
        let first = chain.start(&mut world, &mut rng).unwrap();
        chain.toggle_pause();
        set_phase(&mut world, first, LeafPhase::Bare);
        chain.advance(&mut world, 1.0, &config, &mut rng);
        assert_eq!(chain.phase, ChainPhase::Shedding { current: first });
    }

    #[test]
    fn deactivates_when_nothing_healthy() {
        let config = SimConfig::default();
        let (mut world, trees) = grove(2);
        let mut rng = fastrand::Rng::with_seed(5);
        let mut chain = FallingChain::new();
        chain.start(&mut world, &mut rng).unwrap();
        for &t in &trees {
            set_phase(&mut world, t, LeafPhase::Bare);
        }
        chain.advance(&mut world, 1.0, &config, &mut rng);
        chain.advance(&mut world, config.chain_delay, &config, &mut rng);
        assert!(!chain.is_active());
        assert_eq!(chain.current_tree(), None);
        assert!(!chain.toggle_pause());
    }

    #[test]
    fn toggle_pause_idle_is_noop() {
        let mut chain = FallingChain::new();
        assert!(!chain.toggle_pause());
        assert!(chain.is_paused());
    }

    #[test]
    fn same_seed_same_picks() {
        let picks = |seed| {
            let (mut world, trees) = grove(5);
            let mut rng = fastrand::Rng::with_seed(seed);
            let mut chain = FallingChain::new();
            let tree = chain.start(&mut world, &mut rng).unwrap();
            trees.iter().position(|&t| t == tree)
        };
        assert_eq!(picks(42), picks(42));
    }
}
