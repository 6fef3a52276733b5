/// Entities: Player and Adversary, plus the small value types they move with.
///
/// Positions are continuous, in the same unit as one cell side. Headings are
/// always axis-aligned; the player may stand still, an adversary never does.

use super::grid::Cell;

/// Cardinal heading. Declaration order is the tie-break order for
/// direction selection.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Unit vector (dx, dy); y grows downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Heading vector of an optional direction: `None` is (0, 0).
pub fn heading_delta(heading: Option<Direction>) -> (i32, i32) {
    heading.map_or((0, 0), Direction::delta)
}

/// Continuous top-left corner of an entity's cell-sized bounding box.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    /// Top-left corner of `cell`.
    pub fn of_cell(cell: Cell, cell_size: f64) -> Self {
        Position {
            x: cell.col as f64 * cell_size,
            y: cell.row as f64 * cell_size,
        }
    }

    /// Geometric centre of the bounding box.
    pub fn center(self, cell_size: f64) -> Position {
        Position {
            x: self.x + cell_size / 2.0,
            y: self.y + cell_size / 2.0,
        }
    }

    pub fn offset(self, heading: Option<Direction>, amount: f64) -> Position {
        let (dx, dy) = heading_delta(heading);
        Position {
            x: self.x + dx as f64 * amount,
            y: self.y + dy as f64 * amount,
        }
    }

    pub fn distance(self, other: Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Exactly aligned to the cell lattice on both axes.
    pub fn is_cell_aligned(self, cell_size: f64) -> bool {
        self.x % cell_size == 0.0 && self.y % cell_size == 0.0
    }

    /// Nearest lattice point.
    pub fn snapped(self, cell_size: f64) -> Position {
        Position {
            x: (self.x / cell_size).round() * cell_size,
            y: (self.y / cell_size).round() * cell_size,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Position,
    pub heading: Option<Direction>,
    pub speed: f64,
    pub powered: bool,
    /// Meaningful only while `powered`.
    pub power_until_ms: u64,
}

impl Player {
    pub fn new(pos: Position, speed: f64) -> Self {
        Player {
            pos,
            heading: None,
            speed,
            powered: false,
            power_until_ms: 0,
        }
    }
}

/// Adversary macro-mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    Scatter,
    Chase,
}

impl Mode {
    pub fn flipped(self) -> Mode {
        match self {
            Mode::Scatter => Mode::Chase,
            Mode::Chase => Mode::Scatter,
        }
    }
}

/// Targeting strategy, selected by `index % 4`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Personality {
    /// Heads for the player's cell.
    Pursuer,
    /// Heads four cells ahead of the player.
    Ambusher,
    /// Heads two cells behind the player.
    Flanker,
    /// Heads for a cached random cell, occasionally re-rolled.
    Wanderer,
}

impl Personality {
    pub fn from_index(index: usize) -> Personality {
        match index % 4 {
            0 => Personality::Pursuer,
            1 => Personality::Ambusher,
            2 => Personality::Flanker,
            _ => Personality::Wanderer,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Adversary {
    pub id: usize,
    pub pos: Position,
    pub heading: Direction,
    pub speed: f64,
    pub personality: Personality,
    pub mode: Mode,
    pub mode_deadline_ms: u64,
    /// Wanderer only.
    pub random_target: Option<Cell>,
}

impl Adversary {
    pub fn new(id: usize, pos: Position, speed: f64, mode_deadline_ms: u64) -> Self {
        Adversary {
            id,
            pos,
            heading: Direction::Right,
            speed,
            personality: Personality::from_index(id),
            mode: Mode::Scatter,
            mode_deadline_ms,
            random_target: None,
        }
    }
}
