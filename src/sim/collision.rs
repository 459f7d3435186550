//! Collision detection and response for tanks and shells
//!
//! Tanks never bounce: a move is either accepted whole or rejected.
//! Shells reflect off the world border and off obstacles, spending one
//! bounce each time, and expire once the budget is exceeded.

use glam::Vec2;

use super::grid::Rect;
use super::map::Arena;
use super::state::{Projectile, Tank};
use crate::consts::*;
use crate::{heading_vector, wrap_degrees};

/// What happened to a shell during one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellStep {
    /// Flew freely
    Moved,
    /// Reflected off the world border
    BorderBounce,
    /// Reflected off an obstacle
    ObstacleBounce,
    /// Ran out of bounces or left the world
    Expired,
    /// Was already inactive
    Inactive,
}

/// Whether a tank footprint centred at `center` would touch the edge
/// margin or any collidable obstacle
pub fn tank_blocked(arena: &Arena, center: Vec2, size: f32) -> bool {
    let margin = arena.world.tank_margin();
    let half = size / 2.0;
    if center.x - half < margin || center.x + half > arena.world.width - margin {
        return true;
    }
    if center.y - half < margin || center.y + half > arena.world.height - margin {
        return true;
    }
    let footprint = Rect::centered(center, size);
    arena.obstacle_rects.iter().any(|r| footprint.intersects(r))
}

/// Reflect off a wall facing left/right
#[inline]
pub fn reflect_horizontal(heading: f32) -> f32 {
    wrap_degrees(180.0 - heading)
}

/// Reflect off a wall facing up/down
#[inline]
pub fn reflect_vertical(heading: f32) -> f32 {
    wrap_degrees(-heading)
}

/// Spend one bounce; returns false (and deactivates) once the budget is exceeded
fn spend_bounce(shell: &mut Projectile) -> bool {
    shell.bounces += 1;
    if shell.bounces > MAX_BOUNCES {
        shell.bounces = MAX_BOUNCES;
        shell.active = false;
        return false;
    }
    true
}

/// Advance a shell one tick and resolve border and obstacle contacts.
///
/// Order matters: the border is checked first and ends the step; then the
/// first intersecting obstacle (in list order) reflects the shell; finally
/// anything still outside the world is discarded.
pub fn step_projectile(shell: &mut Projectile, arena: &Arena) -> ShellStep {
    if !shell.active {
        return ShellStep::Inactive;
    }

    shell.pos += heading_vector(shell.heading) * PROJECTILE_SPEED;

    let world = &arena.world;
    let border = world.border_thickness;
    let bounds = shell.bounds();

    let hit_x = bounds.min.x < border || bounds.max.x > world.width - border;
    let hit_y = bounds.min.y < border || bounds.max.y > world.height - border;
    if hit_x || hit_y {
        if !spend_bounce(shell) {
            return ShellStep::Expired;
        }
        // Horizontal reflection wins when both axes are breached
        shell.heading = if hit_x {
            reflect_horizontal(shell.heading)
        } else {
            reflect_vertical(shell.heading)
        };
        return ShellStep::BorderBounce;
    }

    let mut step = ShellStep::Moved;
    if let Some(obstacle) = arena.obstacle_rects.iter().find(|r| bounds.intersects(r)) {
        if !spend_bounce(shell) {
            return ShellStep::Expired;
        }

        let overlap_left = bounds.max.x - obstacle.min.x;
        let overlap_right = obstacle.max.x - bounds.min.x;
        let overlap_top = bounds.max.y - obstacle.min.y;
        let overlap_bottom = obstacle.max.y - bounds.min.y;
        let min_overlap = overlap_left
            .min(overlap_right)
            .min(overlap_top)
            .min(overlap_bottom);

        shell.heading = if min_overlap == overlap_top || min_overlap == overlap_bottom {
            reflect_vertical(shell.heading)
        } else {
            reflect_horizontal(shell.heading)
        };

        // Push clear of the obstacle so the next tick does not re-collide
        shell.pos += heading_vector(shell.heading) * PROJECTILE_SPEED * 2.0;
        step = ShellStep::ObstacleBounce;
    }

    if shell.pos.x < 0.0 || shell.pos.x > world.width || shell.pos.y < 0.0 || shell.pos.y > world.height {
        shell.active = false;
        return ShellStep::Expired;
    }

    step
}

/// Whether an active shell overlaps a living tank
pub fn shell_hits_tank(shell: &Projectile, tank: &Tank) -> bool {
    shell.active && tank.alive && tank.footprint().intersects(&shell.bounds())
}
