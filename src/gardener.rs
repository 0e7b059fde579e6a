use glam::Vec2;

use crate::ecs::systems::pour::pour_radius;
use crate::session::{Session, TreeView};

/// Walking speed in units/second (the sprint speed of a real player).
const WALK_SPEED: f32 = 72.0;
/// How deep into pour range the gardener walks before pouring.
const REACH_FRACTION: f32 = 0.6;
/// Arrival tolerance so float noise never leaves the gardener shuffling.
const ARRIVE_SLACK: f32 = 1.0;

/// What the gardener is busy with.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Errand {
    Resting,
    FetchingWater,
    Watering(hecs::Entity),
}

/// Scripted player for the headless binary: carries the pot, keeps it full,
/// and waters the nearest dead tree until it starts regrowing.
pub struct Gardener {
    errand: Errand,
}

impl Gardener {
    pub fn new() -> Self {
        Self {
            errand: Errand::Resting,
        }
    }

    /// Issue this frame's commands. Call after `Session::tick`.
    pub fn update(&mut self, session: &mut Session, dt: f32) {
        if session.game_over() {
            return;
        }
        if !session.pot().held {
            session.toggle_pot();
        }

        match self.errand {
            Errand::Resting => {
                let pot = session.pot();
                if pot.is_spent(session.config()) {
                    return;
                }
                if pot.fullness == 0 {
                    log::debug!("gardener heads to the pond");
                    self.errand = Errand::FetchingWater;
                } else if let Some(tree) = nearest_dead(session) {
                    log::debug!("gardener heads to tree {:?}", tree.id);
                    self.errand = Errand::Watering(tree.id);
                }
            }
            Errand::FetchingWater => {
                let layout = &session.config().layout;
                let pond = layout.pond_center;
                let stop = layout.pond_radius + session.config().refill_reach * REACH_FRACTION;
                if walk_toward(session, pond, stop, dt) {
                    session.refill_pot(session.player());
                    self.errand = Errand::Resting;
                }
            }
            Errand::Watering(id) => {
                let Some(tree) = session.tree(id) else {
                    self.errand = Errand::Resting;
                    return;
                };
                if tree.has_leaves || tree.is_regrowing {
                    session.end_pour();
                    self.errand = Errand::Resting;
                    return;
                }
                if session.is_pouring() {
                    return;
                }
                if session.pot().fullness == 0 {
                    self.errand = Errand::Resting;
                    return;
                }
                let stop = pour_radius(tree.size, session.config()) * REACH_FRACTION;
                if walk_toward(session, tree.position, stop, dt) {
                    session.begin_pour(session.player());
                }
            }
        }
    }
}

/// Bare tree closest to the player.
fn nearest_dead(session: &Session) -> Option<TreeView> {
    let player = session.player();
    session
        .trees()
        .into_iter()
        .filter(|t| !t.has_leaves && !t.is_regrowing)
        .min_by(|a, b| {
            player
                .distance_squared(a.position)
                .total_cmp(&player.distance_squared(b.position))
        })
}

/// Step the player toward `target`. Returns true once within `stop` of it.
fn walk_toward(session: &mut Session, target: Vec2, stop: f32, dt: f32) -> bool {
    let pos = session.player();
    let to_target = target - pos;
    let dist = to_target.length();
    if dist <= stop + ARRIVE_SLACK {
        return true;
    }
    let step = (WALK_SPEED * dt).min(dist - stop);
    let heading = to_target / dist * step;
    if !session.set_player_position(pos + heading) {
        // Blocked by a trunk or the pond: slide sideways around it.
        if !session.set_player_position(pos + heading.perp()) {
            session.set_player_position(pos - heading.perp());
        }
    }
    false
}
