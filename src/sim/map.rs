//! Arena layout and random map generation

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::{Cell, Grid, Obstacle, Rect};
use super::state::spawn_cells;
use crate::settings::{ConfigError, WorldConfig};

/// Visual theme handle; the presentation layer maps it to background,
/// border and obstacle art
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MapTheme {
    /// Steel boxes and wooden crates
    #[default]
    Crates,
    /// Rock field
    Rocks,
}

/// Output of a map generator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArenaMap {
    pub obstacles: Vec<Obstacle>,
    pub theme: MapTheme,
}

/// Static geometry of a running match
#[derive(Debug, Clone)]
pub struct Arena {
    pub world: WorldConfig,
    pub theme: MapTheme,
    pub obstacles: Vec<Obstacle>,
    /// World bounds of collidable obstacles, in obstacle order
    pub obstacle_rects: Vec<Rect>,
    pub grid: Grid,
}

impl Arena {
    pub fn new(world: WorldConfig, map: ArenaMap) -> Self {
        let obstacle_rects = collidable_rects(&world, &map.obstacles);
        let grid = Grid::build(&world, &map.obstacles);
        Self {
            world,
            theme: map.theme,
            obstacles: map.obstacles,
            obstacle_rects,
            grid,
        }
    }

    /// Regrid for new world dimensions, keeping the obstacle layout
    pub fn rebuild(&mut self, world: WorldConfig) {
        self.world = world;
        self.obstacle_rects = collidable_rects(&world, &self.obstacles);
        self.grid = Grid::build(&world, &self.obstacles);
    }
}

fn collidable_rects(world: &WorldConfig, obstacles: &[Obstacle]) -> Vec<Rect> {
    obstacles
        .iter()
        .filter(|o| o.collidable)
        .map(|o| o.rect(world))
        .collect()
}

/// Generate a random obstacle layout.
///
/// Obstacles stay two cells away from the edges, never cover a spawn cell
/// and never stack. Between 4% and 12% of the grid is targeted; placement
/// gives up after six attempts per obstacle.
pub fn generate_map<R: Rng>(world: &WorldConfig, rng: &mut R) -> Result<ArenaMap, ConfigError> {
    world.check()?;

    let columns = world.grid_columns();
    let rows = world.grid_rows();
    let cells = world.cell_count() as f32;

    let theme = if rng.random_bool(0.5) {
        MapTheme::Crates
    } else {
        MapTheme::Rocks
    };

    let min_count = ((cells * 0.04) as usize).max(1);
    let max_count = ((cells * 0.12) as usize).max(1);
    let target = rng.random_range(min_count..=max_count);
    let spawns = spawn_cells(columns, rows);

    let mut obstacles: Vec<Obstacle> = Vec::with_capacity(target);
    let mut tries = 0;
    while obstacles.len() < target && tries < target * 6 {
        tries += 1;
        let cell = Cell::new(
            rng.random_range(2..=(columns - 3).max(2)),
            rng.random_range(2..=(rows - 3).max(2)),
        );
        if spawns.contains(&cell) || obstacles.iter().any(|o| o.cell == cell) {
            continue;
        }
        obstacles.push(Obstacle::new(cell.col, cell.row));
    }

    log::debug!(
        "Generated {:?} map: {} obstacles ({} targeted, {} tries)",
        theme,
        obstacles.len(),
        target,
        tries
    );

    Ok(ArenaMap { obstacles, theme })
}
