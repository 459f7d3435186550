//! Tank Arena - a two-combatant top-down tank arena
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid, physics, AI, pathfinding, match session)
//! - `settings`: World geometry and match configuration

pub mod settings;
pub mod sim;

pub use settings::{ConfigError, MatchConfig, Settings, WorldConfig};

use glam::Vec2;

/// Game configuration constants
///
/// Speeds and steps are per simulation tick, distances in world units,
/// angles in degrees.
pub mod consts {
    /// Default simulation tick rate (Hz)
    pub const TICK_RATE: u32 = 60;
    /// Default match length in seconds
    pub const MATCH_SECONDS: f32 = 90.0;

    /// Default world dimensions
    pub const WORLD_WIDTH: f32 = 1920.0;
    pub const WORLD_HEIGHT: f32 = 1020.0;
    pub const CELL_WIDTH: f32 = 70.0;
    pub const CELL_HEIGHT: f32 = 45.0;
    /// Inset of the projectile bounce border from the world edge
    pub const BORDER_THICKNESS: f32 = 0.0;
    /// Smallest world edge accepted on resize
    pub const MIN_WORLD_EDGE: f32 = 100.0;
    /// Largest occupancy grid accepted by validation
    pub const MAX_GRID_CELLS: usize = 1_000_000;

    /// Tank footprint (square side length)
    pub const TANK_SIZE: f32 = 30.0;
    pub const TANK_SPEED: f32 = 5.0;
    pub const ROTATION_STEP: f32 = 2.0;
    /// Projectiles spawn this far ahead of the tank centre
    pub const BARREL_LENGTH: f32 = TANK_SIZE;
    pub const FIRE_COOLDOWN_TICKS: u32 = 30;
    pub const MAX_PROJECTILES_PER_TANK: usize = 3;

    /// Projectile defaults
    pub const PROJECTILE_SPEED: f32 = 10.0;
    pub const PROJECTILE_SIZE: f32 = 6.0;
    pub const MAX_BOUNCES: u32 = 4;

    /// AI perception ranges
    pub const AI_ATTACK_RANGE: f32 = 200.0;
    pub const AI_PURSUE_RANGE: f32 = 400.0;
    /// Heading error below which the AI stops turning
    pub const AI_TURN_DEADBAND: f32 = 5.0;
    /// Heading error below which the AI is allowed to shoot
    pub const AI_FIRE_CONE: f32 = 15.0;
    /// Ticks on target before the AI pulls the trigger
    pub const AI_AIM_TICKS: u32 = 30;
    pub const AI_REPATH_CHANCE: f64 = 0.1;
    pub const AI_PATROL_REPICK_CHANCE: f64 = 0.01;
    pub const AI_PATROL_INSET: f32 = 100.0;
    pub const AI_WAYPOINT_REACHED: f32 = 30.0;
    pub const LOS_SAMPLES: u32 = 20;
    pub const LOS_PROBE_SIZE: f32 = 10.0;

    /// Pathfinder bounds
    pub const PATH_VISIT_CAP: usize = 200;
    pub const PATH_MAX_WAYPOINTS: usize = 10;
    pub const DIAGONAL_COST: f32 = 1.4;
}

/// Wrap an angle in degrees to [0, 360)
#[inline]
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Signed shortest rotation from `from` to `to`, in [-180, 180)
#[inline]
pub fn angle_delta(from: f32, to: f32) -> f32 {
    (to - from + 180.0).rem_euclid(360.0) - 180.0
}

/// Unit vector for a heading in degrees (screen space, y grows downward)
#[inline]
pub fn heading_vector(degrees: f32) -> Vec2 {
    let rad = degrees.to_radians();
    Vec2::new(rad.cos(), -rad.sin())
}

/// Heading in degrees that points from `from` toward `to`
#[inline]
pub fn bearing(from: Vec2, to: Vec2) -> f32 {
    (from.y - to.y).atan2(to.x - from.x).to_degrees()
}
