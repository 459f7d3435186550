//! Entity and session state
//!
//! The match session owns every tank; each tank owns its projectiles.
//! Projectiles refer back to their shooter by `TankId` only.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ai::{AiBrain, AiState};
use super::collision;
use super::grid::{Cell, Rect};
use super::map::{Arena, ArenaMap, generate_map};
use crate::consts::*;
use crate::settings::{ConfigError, Settings};
use crate::{heading_vector, wrap_degrees};

/// Index of a tank in the session's entity table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TankId(pub usize);

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    /// No match running
    Menu,
    /// Active gameplay
    Playing,
    /// Clock ran out
    Ended,
}

/// Who controls the second tank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    /// Two human players
    Pvp,
    /// Human versus computer
    Pvc,
    /// Computer versus computer (attract mode)
    Demo,
}

impl GameMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pvp" => Some(GameMode::Pvp),
            "pvc" => Some(GameMode::Pvc),
            "demo" | "cvc" => Some(GameMode::Demo),
            _ => None,
        }
    }
}

/// Per-tick control flags, identical for human and AI tanks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub forward: bool,
    pub backward: bool,
    /// Counter-clockwise (+1 step)
    pub rotate_left: bool,
    /// Clockwise (-1 step)
    pub rotate_right: bool,
    pub fire: bool,
}

/// Where a tank's intents come from
#[derive(Debug, Clone)]
pub enum ControlSource {
    /// Supplied by the host each tick
    Human,
    /// Produced by the decision engine
    Ai(AiBrain),
}

impl ControlSource {
    pub fn is_ai(&self) -> bool {
        matches!(self, ControlSource::Ai(_))
    }
}

/// Events emitted for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEvent {
    Fired { tank: TankId },
    Hit { victim: TankId, attacker: TankId, suicide: bool },
    Respawned { tank: TankId },
    MatchEnded { winner: Option<TankId> },
}

/// A shell in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    /// Degrees
    pub heading: f32,
    pub owner: TankId,
    pub bounces: u32,
    pub active: bool,
}

impl Projectile {
    pub fn new(pos: Vec2, heading: f32, owner: TankId) -> Self {
        Self {
            pos,
            heading,
            owner,
            bounces: 0,
            active: true,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::centered(self.pos, PROJECTILE_SIZE)
    }
}

/// A tank entity
#[derive(Debug, Clone)]
pub struct Tank {
    pub id: TankId,
    pub pos: Vec2,
    /// Degrees in [0, 360)
    pub heading: f32,
    pub size: f32,
    pub speed: f32,
    /// Always true in this ruleset (respawn is instant) but kept for hosts
    pub alive: bool,
    pub control: ControlSource,
    /// Ticks until the tank may fire again
    pub cooldown: u32,
    pub spawn_point: Vec2,
    pub kills: u32,
    pub deaths: u32,
    pub suicides: u32,
    pub projectiles: Vec<Projectile>,
}

impl Tank {
    pub fn new(id: TankId, spawn_point: Vec2, control: ControlSource) -> Self {
        Self {
            id,
            pos: spawn_point,
            heading: 0.0,
            size: TANK_SIZE,
            speed: TANK_SPEED,
            alive: true,
            control,
            cooldown: 0,
            spawn_point,
            kills: 0,
            deaths: 0,
            suicides: 0,
            projectiles: Vec::new(),
        }
    }

    /// Collision footprint
    pub fn footprint(&self) -> Rect {
        Rect::centered(self.pos, self.size)
    }

    /// Rotate by one step; +1 is counter-clockwise
    pub fn rotate(&mut self, direction: f32) {
        self.heading = wrap_degrees(self.heading + direction * ROTATION_STEP);
    }

    /// Translate by `delta` unless the new footprint would be blocked.
    /// Returns whether the move was accepted.
    pub fn try_move(&mut self, delta: Vec2, arena: &Arena) -> bool {
        let candidate = self.pos + delta;
        if collision::tank_blocked(arena, candidate, self.size) {
            return false;
        }
        self.pos = candidate;
        true
    }

    /// Fire if the cooldown has elapsed and the in-flight cap allows it
    pub fn fire(&mut self) -> bool {
        if self.cooldown > 0 || self.projectiles.len() >= MAX_PROJECTILES_PER_TANK {
            return false;
        }
        let muzzle = self.pos + heading_vector(self.heading) * BARREL_LENGTH;
        self.projectiles.push(Projectile::new(muzzle, self.heading, self.id));
        self.cooldown = FIRE_COOLDOWN_TICKS;
        true
    }

    /// Apply one tick of intent. Returns whether a shot was fired.
    pub fn apply_intent(&mut self, intent: &Intent, arena: &Arena) -> bool {
        let forward = heading_vector(self.heading) * self.speed;
        let delta = if intent.backward {
            -forward
        } else if intent.forward {
            forward
        } else {
            Vec2::ZERO
        };
        if delta != Vec2::ZERO {
            self.try_move(delta, arena);
        }

        if intent.rotate_left {
            self.rotate(1.0);
        }
        if intent.rotate_right {
            self.rotate(-1.0);
        }

        intent.fire && self.fire()
    }

    /// Return to the spawn point with no shells in flight
    pub fn respawn(&mut self) {
        self.alive = true;
        self.projectiles.clear();
        self.pos = self.spawn_point;
    }

    pub fn ai_state(&self) -> Option<AiState> {
        match &self.control {
            ControlSource::Ai(brain) => Some(brain.state),
            ControlSource::Human => None,
        }
    }

    pub fn snapshot(&self) -> TankSnapshot {
        TankSnapshot {
            id: self.id,
            pos: self.pos,
            heading: self.heading,
            alive: self.alive,
            ai_state: self.ai_state(),
            kills: self.kills,
            deaths: self.deaths,
            suicides: self.suicides,
            projectiles: self
                .projectiles
                .iter()
                .filter(|p| p.active)
                .map(|p| ProjectileSnapshot {
                    pos: p.pos,
                    heading: p.heading,
                    bounces: p.bounces,
                })
                .collect(),
        }
    }
}

/// Read-only view of a projectile for the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub pos: Vec2,
    pub heading: f32,
    pub bounces: u32,
}

/// Read-only view of a tank for the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankSnapshot {
    pub id: TankId,
    pub pos: Vec2,
    pub heading: f32,
    pub alive: bool,
    pub ai_state: Option<AiState>,
    pub kills: u32,
    pub deaths: u32,
    pub suicides: u32,
    pub projectiles: Vec<ProjectileSnapshot>,
}

/// Everything the host needs after a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub tick: u64,
    pub phase: MatchPhase,
    pub elapsed_secs: f32,
    pub remaining_secs: u32,
    pub tanks: Vec<TankSnapshot>,
    pub events: Vec<GameEvent>,
}

/// Spawn cells: diagonal corners, two cells in from the edge
pub fn spawn_cells(columns: i32, rows: i32) -> [Cell; 2] {
    [Cell::new(2, 2), Cell::new(columns - 3, rows - 3)]
}

/// The match session
#[derive(Debug, Clone)]
pub struct MatchState {
    pub settings: Settings,
    pub mode: GameMode,
    pub phase: MatchPhase,
    /// Seed of the current match
    pub seed: u64,
    pub arena: Arena,
    pub tanks: Vec<Tank>,
    /// Simulation ticks since the match started
    pub time_ticks: u64,
    /// Tick at which the match ends
    pub end_tick: u64,
    pub(crate) rng: Pcg32,
}

impl MatchState {
    /// Session sitting at the menu with an empty arena
    pub fn new(settings: Settings) -> Result<Self, ConfigError> {
        settings.check()?;
        let seed = settings.match_config.seed.unwrap_or_else(rand::random);
        Ok(Self {
            arena: Arena::new(settings.world, ArenaMap::default()),
            end_tick: settings.match_config.end_tick(),
            settings,
            mode: GameMode::Pvp,
            phase: MatchPhase::Menu,
            seed,
            tanks: Vec::new(),
            time_ticks: 0,
            rng: Pcg32::seed_from_u64(seed),
        })
    }

    /// Start a match on a freshly generated map
    pub fn start(&mut self, mode: GameMode) -> Result<(), ConfigError> {
        self.settings.check()?;
        self.reseed();
        let map = generate_map(&self.settings.world, &mut self.rng)?;
        self.begin(mode, map);
        Ok(())
    }

    /// Start a match on a host-supplied map
    pub fn start_with_map(&mut self, mode: GameMode, map: ArenaMap) -> Result<(), ConfigError> {
        self.settings.check()?;
        self.reseed();
        self.begin(mode, map);
        Ok(())
    }

    /// New match in the last mode
    pub fn restart(&mut self) -> Result<(), ConfigError> {
        self.start(self.mode)
    }

    pub fn return_to_menu(&mut self) {
        self.phase = MatchPhase::Menu;
    }

    fn reseed(&mut self) {
        // A fixed seed replays the same match; otherwise each start draws a new one
        self.seed = self.settings.match_config.seed.unwrap_or_else(rand::random);
        self.rng = Pcg32::seed_from_u64(self.seed);
    }

    fn begin(&mut self, mode: GameMode, map: ArenaMap) {
        self.arena = Arena::new(self.settings.world, map);
        let grid = &self.arena.grid;
        let [first, second] = spawn_cells(grid.columns(), grid.rows());
        let first = grid.cell_center(first);
        let second = grid.cell_center(second);

        let second_control = match mode {
            GameMode::Pvp => ControlSource::Human,
            GameMode::Pvc | GameMode::Demo => ControlSource::Ai(AiBrain::default()),
        };
        let first_control = match mode {
            GameMode::Demo => ControlSource::Ai(AiBrain::default()),
            GameMode::Pvp | GameMode::Pvc => ControlSource::Human,
        };

        self.tanks = vec![
            Tank::new(TankId(0), first, first_control),
            Tank::new(TankId(1), second, second_control),
        ];
        self.mode = mode;
        self.phase = MatchPhase::Playing;
        self.time_ticks = 0;
        self.end_tick = self.settings.match_config.end_tick();

        log::info!(
            "Match started: mode={:?} seed={} obstacles={} grid={}x{} ({} free) theme={:?}",
            mode,
            self.seed,
            self.arena.obstacles.len(),
            self.arena.grid.columns(),
            self.arena.grid.rows(),
            self.arena.grid.free_cells(),
            self.arena.theme
        );
    }

    /// Rebuild world geometry for a new viewport size; entities stay put.
    /// A size that fails validation leaves the arena untouched.
    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), ConfigError> {
        let world = self.settings.world.resized(width, height);
        world.check()?;
        self.settings.world = world;
        self.arena.rebuild(world);
        log::info!(
            "Arena resized to {}x{} (grid {}x{})",
            self.settings.world.width,
            self.settings.world.height,
            self.arena.grid.columns(),
            self.arena.grid.rows()
        );
        Ok(())
    }

    pub fn tank(&self, id: TankId) -> Option<&Tank> {
        self.tanks.get(id.0)
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.time_ticks as f32 / self.settings.match_config.tick_rate as f32
    }

    /// Whole seconds left on the match clock
    pub fn remaining_secs(&self) -> u32 {
        let left = self.end_tick.saturating_sub(self.time_ticks);
        (left / self.settings.match_config.tick_rate as u64) as u32
    }

    /// Tank with the strictly highest kill count, if any.
    /// Also serves as the live "top scorer" while the match runs.
    pub fn winner(&self) -> Option<TankId> {
        top_scorer(&self.tanks)
    }

    pub fn snapshot(&self, events: Vec<GameEvent>) -> TickSnapshot {
        TickSnapshot {
            tick: self.time_ticks,
            phase: self.phase,
            elapsed_secs: self.elapsed_secs(),
            remaining_secs: self.remaining_secs(),
            tanks: self.tanks.iter().map(Tank::snapshot).collect(),
            events,
        }
    }
}

/// Strictly highest kill count; ties and an all-zero table have no winner
pub fn top_scorer(tanks: &[Tank]) -> Option<TankId> {
    let mut top: Option<&Tank> = None;
    let mut tie = false;
    for tank in tanks {
        match top {
            Some(best) if tank.kills < best.kills => {}
            Some(best) if tank.kills == best.kills => tie = true,
            _ => {
                top = Some(tank);
                tie = false;
            }
        }
    }
    match top {
        Some(best) if !tie && best.kills > 0 => Some(best.id),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::Obstacle;

    fn open_arena() -> Arena {
        Arena::new(Settings::default().world, ArenaMap::default())
    }

    fn tanks_with_kills(kills: &[u32]) -> Vec<Tank> {
        kills
            .iter()
            .enumerate()
            .map(|(i, k)| {
                let mut tank = Tank::new(TankId(i), Vec2::new(200.0, 200.0), ControlSource::Human);
                tank.kills = *k;
                tank
            })
            .collect()
    }

    #[test]
    fn test_winner_selection() {
        assert_eq!(top_scorer(&tanks_with_kills(&[3, 3])), None);
        assert_eq!(top_scorer(&tanks_with_kills(&[3, 1])), Some(TankId(0)));
        assert_eq!(top_scorer(&tanks_with_kills(&[1, 3])), Some(TankId(1)));
        assert_eq!(top_scorer(&tanks_with_kills(&[0, 0])), None);
        assert_eq!(top_scorer(&[]), None);
    }

    #[test]
    fn test_rotation_wraps() {
        let mut tank = Tank::new(TankId(0), Vec2::new(200.0, 200.0), ControlSource::Human);
        tank.rotate(-1.0);
        assert_eq!(tank.heading, 358.0);
        tank.heading = 359.0;
        tank.rotate(1.0);
        assert_eq!(tank.heading, 1.0);
    }

    #[test]
    fn test_fire_respects_cooldown_and_cap() {
        let mut tank = Tank::new(TankId(0), Vec2::new(200.0, 200.0), ControlSource::Human);
        assert!(tank.fire());
        assert_eq!(tank.cooldown, FIRE_COOLDOWN_TICKS);
        assert!(!tank.fire());

        // Muzzle is one barrel length ahead along heading 0 (east)
        let shell = &tank.projectiles[0];
        assert_eq!(shell.pos, Vec2::new(200.0 + BARREL_LENGTH, 200.0));
        assert_eq!(shell.owner, TankId(0));

        tank.cooldown = 0;
        assert!(tank.fire());
        tank.cooldown = 0;
        assert!(tank.fire());
        tank.cooldown = 0;
        assert!(!tank.fire(), "fourth shell exceeds the in-flight cap");
        assert_eq!(tank.projectiles.len(), MAX_PROJECTILES_PER_TANK);
    }

    #[test]
    fn test_apply_intent_backward_wins() {
        let arena = open_arena();
        let mut tank = Tank::new(TankId(0), Vec2::new(400.0, 400.0), ControlSource::Human);
        let intent = Intent {
            forward: true,
            backward: true,
            ..Default::default()
        };
        tank.apply_intent(&intent, &arena);
        assert_eq!(tank.pos, Vec2::new(400.0 - TANK_SPEED, 400.0));
    }

    #[test]
    fn test_apply_intent_opposing_rotations_cancel() {
        let arena = open_arena();
        let mut tank = Tank::new(TankId(0), Vec2::new(400.0, 400.0), ControlSource::Human);
        tank.heading = 90.0;
        let intent = Intent {
            rotate_left: true,
            rotate_right: true,
            ..Default::default()
        };
        tank.apply_intent(&intent, &arena);
        assert_eq!(tank.heading, 90.0);
    }

    #[test]
    fn test_move_into_obstacle_is_rejected() {
        let world = Settings::default().world;
        // Obstacle cell (6, 8) spans x 420..490, y 360..405
        let arena = Arena::new(
            world,
            ArenaMap {
                obstacles: vec![Obstacle::new(6, 8)],
                ..Default::default()
            },
        );
        let mut tank = Tank::new(TankId(0), Vec2::new(400.0, 380.0), ControlSource::Human);
        assert!(!tank.try_move(Vec2::new(8.0, 0.0), &arena));
        assert_eq!(tank.pos, Vec2::new(400.0, 380.0));
        assert!(tank.try_move(Vec2::new(-8.0, 0.0), &arena));
    }

    #[test]
    fn test_respawn_resets_position_and_shells() {
        let mut tank = Tank::new(TankId(0), Vec2::new(175.0, 112.5), ControlSource::Human);
        tank.pos = Vec2::new(900.0, 500.0);
        tank.fire();
        tank.respawn();
        assert_eq!(tank.pos, Vec2::new(175.0, 112.5));
        assert!(tank.projectiles.is_empty());
        assert!(tank.alive);
    }

    #[test]
    fn test_start_places_tanks_on_spawn_cells() {
        let mut state = MatchState::new(Settings::default()).expect("valid settings");
        assert_eq!(state.phase, MatchPhase::Menu);
        state.start_with_map(GameMode::Pvc, ArenaMap::default()).expect("valid settings");

        assert_eq!(state.phase, MatchPhase::Playing);
        assert_eq!(state.tanks.len(), 2);
        assert_eq!(state.tanks[0].pos, Vec2::new(175.0, 112.5));
        assert_eq!(state.tanks[1].pos, Vec2::new(24.0 * 70.0 + 35.0, 19.0 * 45.0 + 22.5));
        assert!(!state.tanks[0].control.is_ai());
        assert!(state.tanks[1].control.is_ai());
        assert_eq!(state.remaining_secs(), 90);
    }

    #[test]
    fn test_demo_mode_is_two_computers() {
        let mut state = MatchState::new(Settings::default()).expect("valid settings");
        state.start_with_map(GameMode::Demo, ArenaMap::default()).expect("valid settings");
        assert!(state.tanks.iter().all(|t| t.control.is_ai()));
    }

    #[test]
    fn test_degenerate_world_is_rejected() {
        let mut settings = Settings::default();
        settings.world.cell_height = 0.0;
        assert!(MatchState::new(settings.clone()).is_err());

        let mut state = MatchState::new(Settings::default()).expect("valid settings");
        state.settings = settings;
        assert!(state.start(GameMode::Pvp).is_err());
        assert_eq!(state.phase, MatchPhase::Menu);
    }

    #[test]
    fn test_resize_regrids_without_moving_tanks() {
        let mut state = MatchState::new(Settings::default()).expect("valid settings");
        state.start_with_map(GameMode::Pvp, ArenaMap::default()).expect("valid settings");
        let before = state.tanks[1].pos;

        state.resize(1400.0, 900.0).expect("valid size");
        assert_eq!(state.arena.grid.columns(), 20);
        assert_eq!(state.arena.grid.rows(), 20);
        assert_eq!(state.tanks[1].pos, before);

        state.resize(10.0, 10.0).expect("valid size");
        assert_eq!(state.settings.world.width, MIN_WORLD_EDGE);
    }

    #[test]
    fn test_oversized_resize_is_rejected() {
        let mut state = MatchState::new(Settings::default()).expect("valid settings");
        state.start_with_map(GameMode::Pvp, ArenaMap::default()).expect("valid settings");
        let before = state.settings.world;

        let mut tiny_cells = Settings::default();
        tiny_cells.world.cell_width = 1.0;
        tiny_cells.world.cell_height = 1.0;
        state.settings.world = tiny_cells.world;
        assert!(matches!(state.resize(100_000.0, 100_000.0), Err(ConfigError::Geometry(_))));
        assert_eq!(state.settings.world, tiny_cells.world);
        assert_eq!(state.arena.grid.columns(), before.grid_columns());
    }

    #[test]
    fn test_restart_keeps_mode_and_resets_match() {
        let mut settings = Settings::default();
        settings.match_config.seed = Some(77);
        let mut state = MatchState::new(settings).expect("valid settings");
        state.start(GameMode::Pvc).expect("valid settings");
        let spawns: Vec<Vec2> = state.tanks.iter().map(|t| t.spawn_point).collect();

        state.tanks[0].pos = Vec2::new(900.0, 500.0);
        state.tanks[0].kills = 2;
        state.tanks[1].deaths = 2;
        state.tanks[1].suicides = 1;
        state.time_ticks = 500;
        state.phase = MatchPhase::Ended;

        state.restart().expect("valid settings");
        assert_eq!(state.mode, GameMode::Pvc);
        assert_eq!(state.phase, MatchPhase::Playing);
        assert_eq!(state.time_ticks, 0);
        assert_eq!(state.remaining_secs(), 90);
        assert!(state.tanks[1].control.is_ai());
        for (tank, spawn) in state.tanks.iter().zip(&spawns) {
            assert_eq!(tank.pos, *spawn);
            assert_eq!((tank.kills, tank.deaths, tank.suicides), (0, 0, 0));
            assert!(tank.projectiles.is_empty());
        }
    }

    #[test]
    fn test_return_to_menu_freezes_session() {
        let mut state = MatchState::new(Settings::default()).expect("valid settings");
        state.start_with_map(GameMode::Pvp, ArenaMap::default()).expect("valid settings");
        state.return_to_menu();
        assert_eq!(state.phase, MatchPhase::Menu);

        let before: Vec<Vec2> = state.tanks.iter().map(|t| t.pos).collect();
        let input = crate::sim::tick::TickInput::default().with(
            TankId(0),
            Intent {
                forward: true,
                fire: true,
                ..Default::default()
            },
        );
        let snapshot = crate::sim::tick::tick(&mut state, &input);
        assert_eq!(snapshot.phase, MatchPhase::Menu);
        assert_eq!(snapshot.tick, 0);
        assert!(snapshot.events.is_empty());
        let after: Vec<Vec2> = state.tanks.iter().map(|t| t.pos).collect();
        assert_eq!(before, after);
        assert!(state.tanks[0].projectiles.is_empty());
    }

    #[test]
    fn test_game_mode_from_str() {
        assert_eq!(GameMode::from_str("PvC"), Some(GameMode::Pvc));
        assert_eq!(GameMode::from_str("demo"), Some(GameMode::Demo));
        assert_eq!(GameMode::from_str("coop"), None);
    }
}
