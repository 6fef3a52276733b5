/// Grid: fixed-shape maze with an item overlay.
///
/// ## Layers
///   - `layout` is the template geometry. **Never mutated** after `new`.
///   - `items` is the per-cell overlay. Only `consume` and `reset_items` write it.
///
/// Restart resets the overlay only; geometry is never rebuilt.
///
/// Out-of-bounds queries are walls.

use rand::Rng;

use crate::error::MazeError;

use super::entity::{Direction, Position};
use super::tile::{CellState, Item, Tile};

/// Grid coordinate. Signed so that off-grid targets can be expressed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub fn new(row: i32, col: i32) -> Self {
        Cell { row, col }
    }

    pub fn step(self, dir: Direction) -> Cell {
        let (dx, dy) = dir.delta();
        Cell { row: self.row + dy, col: self.col + dx }
    }

    /// Straight-line distance in cell units.
    pub fn distance(self, other: Cell) -> f64 {
        let dr = (self.row - other.row) as f64;
        let dc = (self.col - other.col) as f64;
        dr.hypot(dc)
    }
}

#[derive(Clone, Debug)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cell_size: f64,
    layout: Vec<Tile>,
    items: Vec<Item>,
    open_cells: Vec<Cell>,
    changed: Vec<Cell>,
}

impl Grid {
    /// Build from a rectangular layout. Every open tile starts as a Pickup.
    pub fn new(layout: &[Vec<Tile>], cell_size: f64) -> Result<Self, MazeError> {
        let rows = layout.len();
        let cols = layout.first().map_or(0, Vec::len);
        if rows == 0 || cols == 0 {
            return Err(MazeError::Empty);
        }

        let mut flat = Vec::with_capacity(rows * cols);
        for (row, line) in layout.iter().enumerate() {
            if line.len() != cols {
                return Err(MazeError::RaggedRow { row, expected: cols, found: line.len() });
            }
            flat.extend_from_slice(line);
        }

        let open_cells: Vec<Cell> = (0..rows)
            .flat_map(|r| (0..cols).map(move |c| (r, c)))
            .filter(|&(r, c)| flat[r * cols + c].is_passable())
            .map(|(r, c)| Cell::new(r as i32, c as i32))
            .collect();
        if open_cells.is_empty() {
            return Err(MazeError::NoOpenCells);
        }

        let mut grid = Grid {
            rows,
            cols,
            cell_size,
            items: vec![Item::Consumed; flat.len()],
            layout: flat,
            open_cells,
            changed: Vec::new(),
        };
        grid.reset_items(&[]);
        Ok(grid)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Every non-wall cell, row-major.
    pub fn open_cells(&self) -> &[Cell] {
        &self.open_cells
    }

    /// Uniformly random open cell. `new` guarantees at least one exists.
    pub fn random_open_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Cell {
        self.open_cells[rng.gen_range(0..self.open_cells.len())]
    }

    #[inline]
    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.row < 0 || cell.col < 0 {
            return None;
        }
        let (r, c) = (cell.row as usize, cell.col as usize);
        if r >= self.rows || c >= self.cols {
            return None;
        }
        Some(r * self.cols + c)
    }

    /// Effective state of a cell; out of bounds = wall.
    #[inline]
    pub fn cell_at(&self, cell: Cell) -> CellState {
        match self.index(cell) {
            Some(i) => CellState::compose(self.layout[i], self.items[i]),
            None => CellState::Wall,
        }
    }

    #[inline]
    pub fn is_wall(&self, cell: Cell) -> bool {
        self.cell_at(cell).is_wall()
    }

    /// Cell containing a continuous point (floor division).
    #[inline]
    pub fn to_cell(&self, pos: Position) -> Cell {
        Cell::new(
            (pos.y / self.cell_size).floor() as i32,
            (pos.x / self.cell_size).floor() as i32,
        )
    }

    /// Pickup/PowerPickup → Consumed. Returns what was eaten; anything
    /// else (already consumed, wall, off-grid) is a no-op returning `None`.
    pub fn consume(&mut self, cell: Cell) -> Option<Item> {
        let i = self.index(cell)?;
        if !self.layout[i].is_passable() || !self.items[i].is_edible() {
            return None;
        }
        let eaten = self.items[i];
        self.items[i] = Item::Consumed;
        self.changed.push(cell);
        Some(eaten)
    }

    /// Remaining Pickup cells (power pickups excluded). Recounted every call.
    pub fn remaining_pickups(&self) -> usize {
        self.layout
            .iter()
            .zip(&self.items)
            .filter(|(t, i)| t.is_passable() && **i == Item::Pickup)
            .count()
    }

    /// Reset the overlay: every open cell becomes a Pickup, except `power`
    /// cells which become PowerPickups. All open cells are reported changed.
    pub fn reset_items(&mut self, power: &[Cell]) {
        for &cell in &self.open_cells {
            if let Some(i) = self.index(cell) {
                self.items[i] = Item::Pickup;
            }
        }
        for &cell in power {
            if let Some(i) = self.index(cell) {
                if self.layout[i].is_passable() {
                    self.items[i] = Item::PowerPickup;
                }
            }
        }
        self.changed.clear();
        self.changed.extend_from_slice(&self.open_cells);
    }

    /// Cells whose state changed since the last call.
    pub fn take_changed(&mut self) -> Vec<Cell> {
        std::mem::take(&mut self.changed)
    }
}
