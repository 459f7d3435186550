//! Occupancy grid over the arena
//!
//! The world is divided into uniform rectangular cells. A cell is occupied
//! if an obstacle sits on it or it lies in the border band. Lookups outside
//! the grid read as occupied so callers stay conservative.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::settings::WorldConfig;

/// Integer cell coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

impl Cell {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }
}

/// Axis-aligned rectangle in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Square of side `size` centred on `center`
    pub fn centered(center: Vec2, size: f32) -> Self {
        let half = Vec2::splat(size / 2.0);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self { min, max: min + size }
    }

    /// Strict overlap test; rectangles that only share an edge do not intersect
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }
}

/// A static, cell-anchored obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub cell: Cell,
    pub collidable: bool,
}

impl Obstacle {
    pub fn new(col: i32, row: i32) -> Self {
        Self {
            cell: Cell::new(col, row),
            collidable: true,
        }
    }

    /// World-space bounds of the obstacle's cell
    pub fn rect(&self, world: &WorldConfig) -> Rect {
        Rect::from_min_size(
            Vec2::new(
                self.cell.col as f32 * world.cell_width,
                self.cell.row as f32 * world.cell_height,
            ),
            Vec2::new(world.cell_width, world.cell_height),
        )
    }
}

/// Boolean occupancy grid, row-major
#[derive(Debug, Clone)]
pub struct Grid {
    columns: i32,
    rows: i32,
    cell_width: f32,
    cell_height: f32,
    occupied: Vec<bool>,
}

impl Grid {
    /// Build the occupancy grid for a world and its obstacles.
    ///
    /// At least one ring of cells along every edge is always blocked; a
    /// thicker border blocks `ceil(border / cell)` cells per side.
    pub fn build(world: &WorldConfig, obstacles: &[Obstacle]) -> Self {
        let columns = world.grid_columns();
        let rows = world.grid_rows();
        let mut grid = Self {
            columns,
            rows,
            cell_width: world.cell_width,
            cell_height: world.cell_height,
            occupied: vec![false; world.cell_count()],
        };

        let border_cols = ((world.border_thickness / world.cell_width).ceil() as i32).max(1);
        let border_rows = ((world.border_thickness / world.cell_height).ceil() as i32).max(1);

        for col in 0..columns {
            for band in 0..border_rows {
                grid.mark(Cell::new(col, band));
                grid.mark(Cell::new(col, rows - 1 - band));
            }
        }
        for row in 0..rows {
            for band in 0..border_cols {
                grid.mark(Cell::new(band, row));
                grid.mark(Cell::new(columns - 1 - band, row));
            }
        }

        for obstacle in obstacles.iter().filter(|o| o.collidable) {
            grid.mark(obstacle.cell);
        }

        grid
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.col < 0 || cell.row < 0 || cell.col >= self.columns || cell.row >= self.rows {
            return None;
        }
        Some(cell.row as usize * self.columns as usize + cell.col as usize)
    }

    fn mark(&mut self, cell: Cell) {
        if let Some(i) = self.index(cell) {
            self.occupied[i] = true;
        }
    }

    pub fn columns(&self) -> i32 {
        self.columns
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    /// Cell containing a world position (may lie outside the grid)
    pub fn world_to_cell(&self, pos: Vec2) -> Cell {
        Cell::new(
            (pos.x / self.cell_width).floor() as i32,
            (pos.y / self.cell_height).floor() as i32,
        )
    }

    /// World-space centre of a cell
    pub fn cell_center(&self, cell: Cell) -> Vec2 {
        Vec2::new(
            cell.col as f32 * self.cell_width + self.cell_width / 2.0,
            cell.row as f32 * self.cell_height + self.cell_height / 2.0,
        )
    }

    /// Occupancy lookup; anything off-grid is occupied
    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.index(cell).map(|i| self.occupied[i]).unwrap_or(true)
    }

    /// Number of cells open to pathfinding
    pub fn free_cells(&self) -> usize {
        self.occupied.iter().filter(|o| !**o).count()
    }
}
