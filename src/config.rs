use glam::Vec2;

/// Half-size of the square ground plane. Land spans -600..600 on both axes.
pub const GROUND_SIZE: f32 = 600.0;
/// Distance of the outer trees from the ground edge.
const EDGE_INSET: f32 = 80.0;
/// Gap the player keeps from the water's edge.
const POND_CLEARANCE: f32 = 6.0;

/// Tunables for one simulation session.
///
/// `Default` gives the classic balance. Tests shrink or stretch individual
/// values; the binary always runs the defaults.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Seconds a tree spends shedding before it is bare.
    pub shed_duration: f32,
    /// Seconds from the start of regrowth to a full canopy.
    pub regrow_duration: f32,
    /// Continuous watering (seconds) a bare tree needs before it regrows.
    pub pour_threshold: f32,
    /// Cumulative pouring (seconds) the pot allows per session.
    pub pot_budget: f32,
    /// Cool-down between one chain tree going bare and the next one shedding.
    pub chain_delay: f32,
    /// Extra reach beyond a tree's trunk radius for pouring.
    pub pour_reach: f32,
    /// Extra reach beyond the pond radius for refilling.
    pub refill_reach: f32,
    /// Falling leaves alive per shedding tree.
    pub max_falling_leaves: usize,
    /// Dead trees that end the session.
    pub max_dead_trees: usize,
    /// Revivals that win the session.
    pub trees_to_save: u32,
    /// Whether refilling the pot also restores the session pour budget.
    pub refill_resets_budget: bool,
    pub layout: Layout,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            shed_duration: 10.0,
            regrow_duration: 10.0,
            pour_threshold: 5.0,
            pot_budget: 40.0,
            chain_delay: 5.0,
            pour_reach: 40.0,
            refill_reach: 30.0,
            max_falling_leaves: 30,
            max_dead_trees: 5,
            trees_to_save: 5,
            refill_resets_budget: false,
            layout: Layout::default(),
        }
    }
}

/// Where things stand on the ground plane.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Size factor of the central tree.
    pub center_tree_size: f32,
    /// Outer tree positions. Sizes are rolled per session.
    pub outer_trees: Vec<Vec2>,
    /// Outer tree size range, `min..max`.
    pub outer_size_min: f32,
    pub outer_size_max: f32,
    pub pond_center: Vec2,
    pub pond_radius: f32,
    pub player_start: Vec2,
}

impl Default for Layout {
    fn default() -> Self {
        let side = GROUND_SIZE - EDGE_INSET;
        Self {
            center_tree_size: 1.0,
            outer_trees: vec![
                Vec2::new(-side, 0.0),
                Vec2::new(side, 0.0),
                Vec2::new(0.0, side),
                Vec2::new(0.0, -side),
            ],
            outer_size_min: 0.5,
            outer_size_max: 0.95,
            pond_center: Vec2::new(-200.0, 0.0),
            pond_radius: 60.0,
            player_start: Vec2::new(0.0, 200.0),
        }
    }
}

impl Layout {
    /// Whether a player standing at `p` would be in the pond.
    pub fn in_pond(&self, p: Vec2) -> bool {
        p.distance(self.pond_center) < self.pond_radius + POND_CLEARANCE
    }
}

/// Clamp a point to the walkable ground.
pub fn clamp_to_ground(p: Vec2) -> Vec2 {
    // Keep a player-width margin from the edge.
    let limit = GROUND_SIZE - 6.0;
    p.clamp(Vec2::splat(-limit), Vec2::splat(limit))
}
