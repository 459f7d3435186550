//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (tank table order)
//! - No rendering, input or audio dependencies

pub mod ai;
pub mod collision;
pub mod grid;
pub mod map;
pub mod pathfind;
pub mod state;
pub mod tick;

pub use ai::{AiBrain, AiState, Opponent, line_of_sight, select_state, steer_toward};
pub use collision::{ShellStep, shell_hits_tank, step_projectile, tank_blocked};
pub use grid::{Cell, Grid, Obstacle, Rect};
pub use map::{Arena, ArenaMap, MapTheme, generate_map};
pub use pathfind::{find_cell_path, find_path};
pub use state::{
    ControlSource, GameEvent, GameMode, Intent, MatchPhase, MatchState, Projectile, ProjectileSnapshot, Tank, TankId,
    TankSnapshot, TickSnapshot, top_scorer,
};
pub use tick::{TickInput, tick};
