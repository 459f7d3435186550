//! Computer-controlled tank behaviour
//!
//! A three-state machine (patrol / pursue / attack) re-evaluated from
//! scratch every tick. Each tick produces an `Intent`, the same structure
//! human input resolves to, so physics treats both kinds of tank alike.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::Rect;
use super::map::Arena;
use super::pathfind::find_path;
use super::state::{Intent, TankId};
use crate::consts::*;
use crate::{angle_delta, bearing};

/// Behaviour state of an AI tank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiState {
    /// Wander between random points
    #[default]
    Patrol,
    /// Follow a grid path toward the opponent
    Pursue,
    /// Turn in place and shoot
    Attack,
}

/// What the AI can see of its opponent this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Opponent {
    pub id: TankId,
    pub pos: Vec2,
}

/// Persistent per-tank AI memory
#[derive(Debug, Clone, Default)]
pub struct AiBrain {
    pub state: AiState,
    /// Opponent seen last tick
    pub target: Option<TankId>,
    /// Remaining waypoints, nearest first
    pub path: Vec<Vec2>,
    pub patrol_point: Option<Vec2>,
    /// Ticks spent on target in attack
    pub aim_timer: u32,
}

/// Pure state selection from perception inputs
pub fn select_state(opponent_distance: Option<f32>, line_of_sight: bool) -> AiState {
    match opponent_distance {
        None => AiState::Patrol,
        Some(d) if d < AI_ATTACK_RANGE && line_of_sight => AiState::Attack,
        Some(d) if d < AI_PURSUE_RANGE => AiState::Pursue,
        Some(_) => AiState::Patrol,
    }
}

/// Sample the segment between two points; blocked if a small probe at any
/// sample touches an obstacle. Tanks and the border are ignored.
pub fn line_of_sight(arena: &Arena, from: Vec2, to: Vec2) -> bool {
    let step = (to - from) / LOS_SAMPLES as f32;
    (0..LOS_SAMPLES).all(|i| {
        let probe = Rect::centered(from + step * i as f32, LOS_PROBE_SIZE);
        !arena.obstacle_rects.iter().any(|r| probe.intersects(r))
    })
}

/// Rotate toward `target` until within the deadband, then drive forward
pub fn steer_toward(pos: Vec2, heading: f32, target: Vec2) -> Intent {
    let diff = angle_delta(heading, bearing(pos, target));
    if diff.abs() > AI_TURN_DEADBAND {
        Intent {
            rotate_left: diff > 0.0,
            rotate_right: diff <= 0.0,
            ..Default::default()
        }
    } else {
        Intent {
            forward: true,
            ..Default::default()
        }
    }
}

fn random_patrol_point<R: Rng>(arena: &Arena, rng: &mut R) -> Vec2 {
    let world = &arena.world;
    let axis = |rng: &mut R, extent: f32| {
        let lo = AI_PATROL_INSET;
        let hi = extent - AI_PATROL_INSET;
        if hi > lo {
            rng.random_range(lo..=hi)
        } else {
            extent / 2.0
        }
    };
    let x = axis(rng, world.width);
    let y = axis(rng, world.height);
    Vec2::new(x, y)
}

impl AiBrain {
    /// Decide this tick's intent for a tank at `pos` facing `heading`
    pub fn decide<R: Rng>(
        &mut self,
        pos: Vec2,
        heading: f32,
        opponent: Option<Opponent>,
        arena: &Arena,
        rng: &mut R,
    ) -> Intent {
        let distance = opponent.map(|o| pos.distance(o.pos));
        // Sight only matters inside attack range
        let sight = match (opponent, distance) {
            (Some(o), Some(d)) if d < AI_ATTACK_RANGE => line_of_sight(arena, pos, o.pos),
            _ => false,
        };

        let next = select_state(distance, sight);
        if next != self.state {
            log::debug!("AI {:?} -> {:?} (distance {:?})", self.state, next, distance);
        }
        self.state = next;
        self.target = opponent.map(|o| o.id);

        match (self.state, opponent) {
            (AiState::Attack, Some(o)) => self.attack(pos, heading, o.pos),
            (AiState::Pursue, Some(o)) => self.pursue(pos, heading, o.pos, arena, rng),
            _ => self.patrol(pos, heading, arena, rng),
        }
    }

    fn attack(&mut self, pos: Vec2, heading: f32, target: Vec2) -> Intent {
        let diff = angle_delta(heading, bearing(pos, target));
        let mut intent = Intent::default();

        if diff.abs() > AI_TURN_DEADBAND {
            intent.rotate_left = diff > 0.0;
            intent.rotate_right = diff <= 0.0;
        }

        if diff.abs() < AI_FIRE_CONE {
            self.aim_timer += 1;
            if self.aim_timer > AI_AIM_TICKS {
                intent.fire = true;
                self.aim_timer = 0;
            }
        }

        intent
    }

    fn pursue<R: Rng>(
        &mut self,
        pos: Vec2,
        heading: f32,
        target: Vec2,
        arena: &Arena,
        rng: &mut R,
    ) -> Intent {
        if rng.random_bool(AI_REPATH_CHANCE) {
            self.path = find_path(&arena.grid, pos, target).unwrap_or_default();
            log::debug!("AI repath: {} waypoints", self.path.len());
        }

        self.drop_reached(pos);

        match self.path.first() {
            Some(&waypoint) => steer_toward(pos, heading, waypoint),
            None => Intent::default(),
        }
    }

    /// Discard leading waypoints the tank is already standing on
    fn drop_reached(&mut self, pos: Vec2) {
        let reached = self
            .path
            .iter()
            .take_while(|wp| pos.distance(**wp) < AI_WAYPOINT_REACHED)
            .count();
        self.path.drain(..reached);
    }

    fn patrol<R: Rng>(&mut self, pos: Vec2, heading: f32, arena: &Arena, rng: &mut R) -> Intent {
        let repick = rng.random_bool(AI_PATROL_REPICK_CHANCE);
        let point = match self.patrol_point {
            Some(point) if !repick => point,
            _ => {
                let point = random_patrol_point(arena, rng);
                self.patrol_point = Some(point);
                point
            }
        };
        steer_toward(pos, heading, point)
    }
}
