use glam::{Vec2, Vec3};

/// Tree centre on the ground plane (x, z).
#[derive(Debug, Clone, Copy)]
pub struct GroundPos(pub Vec2);

/// Size multiplier (1.0 = the central tree). Scales visuals and reach only.
#[derive(Debug, Clone, Copy)]
pub struct TreeSize(pub f32);

/// Where a tree is in its leaf lifecycle.
///
/// Each phase carries only its own timer, so a tree can never be shedding and
/// regrowing at once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeafPhase {
    Healthy,
    /// Losing leaves. `elapsed` counts seconds since shedding began.
    Shedding { elapsed: f32 },
    /// No leaves and no regrowth under way.
    Bare,
    /// Canopy coming back. `elapsed` counts seconds since regrowth began.
    Regrowing { elapsed: f32 },
}

impl LeafPhase {
    pub fn has_leaves(self) -> bool {
        matches!(self, LeafPhase::Healthy | LeafPhase::Shedding { .. })
    }

    pub fn is_shedding(self) -> bool {
        matches!(self, LeafPhase::Shedding { .. })
    }

    pub fn is_regrowing(self) -> bool {
        matches!(self, LeafPhase::Regrowing { .. })
    }
}

/// Lifecycle state of one tree.
#[derive(Debug, Clone, Copy)]
pub struct Lifecycle {
    pub phase: LeafPhase,
}

impl Lifecycle {
    pub fn healthy() -> Self {
        Self {
            phase: LeafPhase::Healthy,
        }
    }

    /// Canopy fraction in [0, 1]. Leafy phases report a full canopy.
    pub fn regrow_progress(&self, regrow_duration: f32) -> f32 {
        match self.phase {
            LeafPhase::Healthy | LeafPhase::Shedding { .. } => 1.0,
            LeafPhase::Bare => 0.0,
            LeafPhase::Regrowing { elapsed } => (elapsed / regrow_duration).min(1.0),
        }
    }

    /// Bare with nothing growing back.
    pub fn is_dead(&self) -> bool {
        self.phase == LeafPhase::Bare
    }
}

/// Watering received by a tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PourState {
    Dry,
    /// Being watered. `accumulated` is continuous seconds since the pour began.
    Watering { accumulated: f32 },
}

impl PourState {
    pub fn is_watering(self) -> bool {
        matches!(self, PourState::Watering { .. })
    }

    pub fn accumulated(self) -> f32 {
        match self {
            PourState::Dry => 0.0,
            PourState::Watering { accumulated } => accumulated,
        }
    }
}

/// A single falling leaf particle.
#[derive(Debug, Clone, Copy)]
pub struct Leaf {
    /// World position; `y` is height above ground.
    pub pos: Vec3,
    /// Sideways sway factor in [-1, 1).
    pub swing: f32,
}

/// Leaves currently falling from a tree. Empty unless the tree is shedding.
#[derive(Debug, Clone, Default)]
pub struct FallingLeaves(pub Vec<Leaf>);
