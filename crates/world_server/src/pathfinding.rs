//! Grid pathfinding for NPC movement.
//!
//! The simulation only depends on the [`PathFinder`] trait; [`NavGrid`] is
//! the shipped implementation, an A* search over a walkability grid exported
//! by the level editor.
//!
//! ## Search Order
//!
//! The open set is ordered by the Manhattan distance to the goal alone, ties
//! broken by discovery order. Accumulated cost is tracked for re-parenting but
//! never used for ordering, so paths are always valid and usually short but
//! not guaranteed shortest around obstacles.

use meridian_event_system::Vector3;
use serde::Deserialize;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use tracing::trace;

/// Reasons a path could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("start or goal lies outside the navigation grid")]
    OutsideGrid,
    #[error("start cell is not walkable")]
    StartBlocked,
    #[error("goal cell is not walkable")]
    GoalBlocked,
    #[error("search budget exhausted")]
    BudgetExhausted,
    #[error("goal is unreachable")]
    Unreachable,
}

/// Capability to route between two points on the ground plane.
pub trait PathFinder: Send + Sync + std::fmt::Debug {
    /// Ordered path from the start cell to the goal cell, both included.
    fn find_path(
        &self,
        start_x: f64,
        start_z: f64,
        end_x: f64,
        end_z: f64,
    ) -> Result<Vec<Vector3>, PathError>;
}

/// One grid cell: a walkability tag (non-zero is walkable) and ground height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavCell {
    pub tag: i32,
    pub height: f64,
}

impl NavCell {
    pub fn is_walkable(&self) -> bool {
        self.tag != 0
    }
}

/// Walkability grid indexed `[x][z]`, with world position `index + offset`.
#[derive(Debug, Clone)]
pub struct NavGrid {
    cells: Vec<Vec<NavCell>>,
    offset_x: i64,
    offset_z: i64,
    max_iterations: usize,
}

type Cell = (usize, usize);

impl NavGrid {
    /// Offset of the editor's exported grids: cell 0 sits at world -1000.
    pub const DEFAULT_OFFSET: i64 = -1000;

    pub fn new(cells: Vec<Vec<NavCell>>, offset_x: i64, offset_z: i64, max_iterations: usize) -> Self {
        Self {
            cells,
            offset_x,
            offset_z,
            max_iterations,
        }
    }

    /// Every cell walkable at height 0, origin at world (0, 0).
    pub fn open(width: usize, depth: usize, max_iterations: usize) -> Self {
        let cells = vec![vec![NavCell { tag: 1, height: 0.0 }; depth]; width];
        Self::new(cells, 0, 0, max_iterations)
    }

    /// Parses the editor export: `[[[tag, height], ...], ...]` indexed `[x][z]`.
    pub fn from_json(
        json: &str,
        offset_x: i64,
        offset_z: i64,
        max_iterations: usize,
    ) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct RawCell(f32, f32);

        let raw: Vec<Vec<RawCell>> = serde_json::from_str(json)?;
        let cells = raw
            .into_iter()
            .map(|column| {
                column
                    .into_iter()
                    .map(|RawCell(tag, height)| NavCell {
                        tag: tag as i32,
                        height: height as f64,
                    })
                    .collect()
            })
            .collect();
        Ok(Self::new(cells, offset_x, offset_z, max_iterations))
    }

    pub fn width(&self) -> usize {
        self.cells.len()
    }

    pub fn depth(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    /// Marks a cell blocked (tag 0). Out-of-grid coordinates are ignored.
    pub fn block(&mut self, x: usize, z: usize) {
        if let Some(cell) = self.cells.get_mut(x).and_then(|col| col.get_mut(z)) {
            cell.tag = 0;
        }
    }

    fn cell_index(&self, world_x: f64, world_z: f64) -> Option<Cell> {
        if !world_x.is_finite() || !world_z.is_finite() {
            return None;
        }
        let x = world_x.floor() as i64 - self.offset_x;
        let z = world_z.floor() as i64 - self.offset_z;
        if x < 0 || z < 0 {
            return None;
        }
        let (x, z) = (x as usize, z as usize);
        self.cells.get(x).and_then(|col| col.get(z)).map(|_| (x, z))
    }

    fn cell(&self, (x, z): Cell) -> NavCell {
        self.cells[x][z]
    }

    fn walkable_neighbors(&self, (x, z): Cell) -> impl Iterator<Item = Cell> + '_ {
        const DIRECTIONS: [(i64, i64); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];
        DIRECTIONS.iter().filter_map(move |(dx, dz)| {
            let nx = x as i64 + dx;
            let nz = z as i64 + dz;
            if nx < 0 || nz < 0 {
                return None;
            }
            let (nx, nz) = (nx as usize, nz as usize);
            self.cells
                .get(nx)
                .and_then(|col| col.get(nz))
                .filter(|cell| cell.is_walkable())
                .map(|_| (nx, nz))
        })
    }

    fn to_world(&self, cell: Cell) -> Vector3 {
        Vector3::new(
            (cell.0 as i64 + self.offset_x) as f64,
            self.cell(cell).height,
            (cell.1 as i64 + self.offset_z) as f64,
        )
    }

    fn search(&self, start: Cell, goal: Cell) -> Result<Vec<Cell>, PathError> {
        let heuristic = |(x, z): Cell| -> usize { x.abs_diff(goal.0) + z.abs_diff(goal.1) };

        let mut open = BinaryHeap::new();
        let mut seq: u64 = 0;
        open.push(Reverse((heuristic(start), seq, start)));

        // cost from start and parent of every discovered cell
        let mut discovered: HashMap<Cell, (usize, Option<Cell>)> = HashMap::new();
        discovered.insert(start, (0, None));
        let mut closed: HashSet<Cell> = HashSet::new();
        let mut iterations = 0;

        while let Some(Reverse((_, _, current))) = open.pop() {
            if !closed.insert(current) {
                continue;
            }

            iterations += 1;
            if iterations > self.max_iterations {
                trace!("A* gave up after {} iterations", self.max_iterations);
                return Err(PathError::BudgetExhausted);
            }

            if current == goal {
                let mut path = vec![current];
                let mut cursor = current;
                while let Some((_, Some(parent))) = discovered.get(&cursor) {
                    path.push(*parent);
                    cursor = *parent;
                }
                path.reverse();
                return Ok(path);
            }

            let cost = discovered.get(&current).map_or(0, |(c, _)| *c) + 1;
            for neighbor in self.walkable_neighbors(current) {
                if closed.contains(&neighbor) {
                    continue;
                }
                match discovered.get_mut(&neighbor) {
                    Some(entry) => {
                        if cost < entry.0 {
                            *entry = (cost, Some(current));
                        }
                    }
                    None => {
                        discovered.insert(neighbor, (cost, Some(current)));
                        seq += 1;
                        open.push(Reverse((heuristic(neighbor), seq, neighbor)));
                    }
                }
            }
        }

        Err(PathError::Unreachable)
    }
}

impl PathFinder for NavGrid {
    fn find_path(
        &self,
        start_x: f64,
        start_z: f64,
        end_x: f64,
        end_z: f64,
    ) -> Result<Vec<Vector3>, PathError> {
        let start = self
            .cell_index(start_x, start_z)
            .ok_or(PathError::OutsideGrid)?;
        let goal = self.cell_index(end_x, end_z).ok_or(PathError::OutsideGrid)?;

        if !self.cell(start).is_walkable() {
            return Err(PathError::StartBlocked);
        }
        if !self.cell(goal).is_walkable() {
            return Err(PathError::GoalBlocked);
        }

        let cells = self.search(start, goal)?;
        Ok(cells.into_iter().map(|c| self.to_world(c)).collect())
    }
}
