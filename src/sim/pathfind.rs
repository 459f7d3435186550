//! Bounded A* over the occupancy grid
//!
//! Eight-way movement: orthogonal steps cost 1, diagonal steps cost 1.4.
//! The heuristic is Manhattan distance, which overestimates under diagonal
//! moves, so paths are short but not guaranteed shortest. The search gives
//! up once it has discovered `PATH_VISIT_CAP` cells.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use glam::Vec2;

use super::grid::{Cell, Grid};
use crate::consts::*;

const NEIGHBORS: [(i32, i32); 8] = [
    (0, 1),
    (1, 0),
    (0, -1),
    (-1, 0),
    (1, 1),
    (-1, -1),
    (1, -1),
    (-1, 1),
];

/// Frontier entry ordered as a min-heap on priority, then insertion order
#[derive(Debug, Clone, Copy)]
struct Frontier {
    priority: f32,
    seq: u64,
    cell: Cell,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap pops the cheapest entry first
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

fn manhattan(a: Cell, b: Cell) -> f32 {
    ((a.col - b.col).abs() + (a.row - b.row).abs()) as f32
}

/// Cell-level search. `Some(vec![])` when start equals goal, `None` when
/// the goal was not reached within the visit cap. The returned cells run
/// from the first step after `start` up to and including `goal`.
pub fn find_cell_path(grid: &Grid, start: Cell, goal: Cell) -> Option<Vec<Cell>> {
    if start == goal {
        return Some(Vec::new());
    }

    let mut frontier = BinaryHeap::new();
    let mut came_from: HashMap<Cell, Option<Cell>> = HashMap::new();
    let mut cost_so_far: HashMap<Cell, f32> = HashMap::new();
    let mut seq = 0u64;

    frontier.push(Frontier {
        priority: 0.0,
        seq,
        cell: start,
    });
    came_from.insert(start, None);
    cost_so_far.insert(start, 0.0);

    while came_from.len() < PATH_VISIT_CAP {
        let Some(Frontier { cell: current, .. }) = frontier.pop() else {
            break;
        };
        if current == goal {
            break;
        }

        let current_cost = cost_so_far.get(&current).copied().unwrap_or(0.0);
        for (dx, dy) in NEIGHBORS {
            let next = Cell::new(current.col + dx, current.row + dy);
            if grid.is_occupied(next) {
                continue;
            }

            let step = if dx != 0 && dy != 0 { DIAGONAL_COST } else { 1.0 };
            let new_cost = current_cost + step;
            let improves = cost_so_far.get(&next).is_none_or(|&known| new_cost < known);
            if improves {
                cost_so_far.insert(next, new_cost);
                came_from.insert(next, Some(current));
                seq += 1;
                frontier.push(Frontier {
                    priority: new_cost + manhattan(next, goal),
                    seq,
                    cell: next,
                });
            }
        }
    }

    if !came_from.contains_key(&goal) {
        return None;
    }

    let mut cells = Vec::new();
    let mut current = goal;
    while current != start {
        cells.push(current);
        match came_from.get(&current).copied().flatten() {
            Some(prev) => current = prev,
            None => break,
        }
    }
    cells.reverse();
    Some(cells)
}

/// World-space waypoints from `from` toward `to`, at most
/// `PATH_MAX_WAYPOINTS` long. `None` means no path was found.
pub fn find_path(grid: &Grid, from: Vec2, to: Vec2) -> Option<Vec<Vec2>> {
    let start = grid.world_to_cell(from);
    let goal = grid.world_to_cell(to);
    let cells = find_cell_path(grid, start, goal)?;
    Some(
        cells
            .into_iter()
            .take(PATH_MAX_WAYPOINTS)
            .map(|cell| grid.cell_center(cell))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::WorldConfig;
    use crate::sim::grid::Obstacle;

    fn world() -> WorldConfig {
        WorldConfig {
            width: 1000.0,
            height: 1000.0,
            cell_width: 50.0,
            cell_height: 50.0,
            border_thickness: 0.0,
        }
    }

    fn chebyshev(a: Cell, b: Cell) -> i32 {
        (a.col - b.col).abs().max((a.row - b.row).abs())
    }

    #[test]
    fn test_same_cell_is_empty_path() {
        let grid = Grid::build(&world(), &[]);
        let path = find_path(&grid, Vec2::new(120.0, 120.0), Vec2::new(140.0, 110.0));
        assert_eq!(path, Some(Vec::new()));
    }

    #[test]
    fn test_open_grid_straight_line() {
        let grid = Grid::build(&world(), &[]);
        let start = Vec2::new(125.0, 525.0);
        let path = find_path(&grid, start, Vec2::new(525.0, 525.0)).expect("reachable");

        assert!(!path.is_empty());
        assert!(path.len() <= PATH_MAX_WAYPOINTS);
        let first = grid.world_to_cell(path[0]);
        assert!(chebyshev(first, grid.world_to_cell(start)) <= 1);
        assert_eq!(*path.last().expect("non-empty"), grid.cell_center(Cell::new(10, 10)));
    }

    #[test]
    fn test_long_path_is_truncated() {
        let grid = Grid::build(&world(), &[]);
        let path = find_path(&grid, Vec2::new(75.0, 75.0), Vec2::new(925.0, 75.0)).expect("reachable");
        assert_eq!(path.len(), PATH_MAX_WAYPOINTS);
        // Each waypoint is one step further than the last
        for pair in path.windows(2) {
            let a = grid.world_to_cell(pair[0]);
            let b = grid.world_to_cell(pair[1]);
            assert_eq!(chebyshev(a, b), 1);
        }
    }

    #[test]
    fn test_occupied_goal_has_no_path() {
        let grid = Grid::build(&world(), &[Obstacle::new(8, 8)]);
        assert_eq!(find_cell_path(&grid, Cell::new(3, 3), Cell::new(8, 8)), None);
        // Border cells are occupied too
        assert_eq!(find_cell_path(&grid, Cell::new(3, 3), Cell::new(0, 5)), None);
        assert_eq!(find_cell_path(&grid, Cell::new(3, 3), Cell::new(-4, 5)), None);
    }

    #[test]
    fn test_routes_around_wall() {
        // Vertical wall at column 5 from row 1 to row 8, gap below
        let obstacles: Vec<Obstacle> = (1..=8).map(|row| Obstacle::new(5, row)).collect();
        let grid = Grid::build(&world(), &obstacles);
        let cells = find_cell_path(&grid, Cell::new(3, 3), Cell::new(7, 3)).expect("reachable");

        assert_eq!(*cells.last().expect("non-empty"), Cell::new(7, 3));
        assert!(cells.iter().all(|c| !grid.is_occupied(*c)));
        assert!(cells.iter().any(|c| c.row >= 9), "path must use the gap");
    }

    #[test]
    fn test_sealed_goal_has_no_path() {
        let goal = Cell::new(12, 12);
        let mut obstacles = Vec::new();
        for dc in -1..=1 {
            for dr in -1..=1 {
                if dc != 0 || dr != 0 {
                    obstacles.push(Obstacle::new(goal.col + dc, goal.row + dr));
                }
            }
        }
        let grid = Grid::build(&world(), &obstacles);
        assert_eq!(find_cell_path(&grid, Cell::new(3, 3), goal), None);
    }

    #[test]
    fn test_far_goal_exhausts_visit_cap() {
        // 400x400 open grid; the goal is hundreds of cells away
        let big = WorldConfig {
            width: 4000.0,
            height: 4000.0,
            cell_width: 10.0,
            cell_height: 10.0,
            border_thickness: 0.0,
        };
        let grid = Grid::build(&big, &[]);
        assert!(!grid.is_occupied(Cell::new(390, 200)));
        assert_eq!(find_cell_path(&grid, Cell::new(5, 200), Cell::new(390, 200)), None);
        // A nearby goal on the same grid is still found
        assert!(find_cell_path(&grid, Cell::new(5, 200), Cell::new(15, 200)).is_some());
    }
}
