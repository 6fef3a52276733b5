/// Error types.
///
/// Only construction-time problems are errors. Once a session exists,
/// out-of-bounds reads, rejected moves and terminal outcomes are plain data.

use thiserror::Error;

/// A maze template that cannot host a session.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MazeError {
    #[error("maze template has no rows")]
    Empty,

    #[error("maze row {row} has width {found}, expected {expected}")]
    RaggedRow { row: usize, expected: usize, found: usize },

    #[error("unknown maze character {ch:?} at row {row}, column {col}")]
    UnknownCell { ch: char, row: usize, col: usize },

    #[error("maze template contains no open cells")]
    NoOpenCells,

    #[error("spawn cell ({row}, {col}) is outside the maze")]
    SpawnOutOfBounds { row: usize, col: usize },

    #[error("spawn cell ({row}, {col}) is a wall")]
    SpawnInWall { row: usize, col: usize },
}

/// A tunable that would break the motion model.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("cell_size must be positive, got {0}")]
    CellSize(f64),

    #[error("player_speed must be positive, got {0}")]
    PlayerSpeed(f64),

    #[error("adversary_speeds must not be empty")]
    NoAdversarySpeeds,

    #[error("adversary speed #{index} must be positive, got {speed}")]
    AdversarySpeed { index: usize, speed: f64 },

    #[error("{who} speed {speed} can skip a wall cell of size {cell_size}")]
    TooFast { who: &'static str, speed: f64, cell_size: f64 },

    #[error("corner_padding {padding} must be in [0, cell_size / 2)")]
    CornerPadding { padding: f64 },

    #[error("wander_retarget_chance must be within [0, 1], got {0}")]
    RetargetChance(f64),
}

/// Top-level error surfaced by the binary.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("invalid maze: {0}")]
    Maze(#[from] MazeError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type GameResult<T> = Result<T, GameError>;
