/// Maze templates: embedded default and text-file loader.
///
/// ## Format (`.txt`):
///   Lines starting with `;` are comments. The first comment, if any,
///   names the maze. Every other non-empty line is one maze row.
///
/// ## Cell legend:
///   '#' = Wall
///   '.' = Open (pickup)       ' ' = Open (pickup)
///   'o' = Open, always a power pickup
///
/// All rows must have the same width.

use std::path::Path;

use tracing::{info, warn};

use crate::domain::grid::Cell;
use crate::domain::tile::Tile;
use crate::error::{GameResult, MazeError};

/// Parsed template: geometry plus the power cells the author pinned.
#[derive(Clone, Debug)]
pub struct MazeTemplate {
    pub name: String,
    pub layout: Vec<Vec<Tile>>,
    pub power_cells: Vec<Cell>,
}

impl MazeTemplate {
    pub fn rows(&self) -> usize {
        self.layout.len()
    }

    pub fn cols(&self) -> usize {
        self.layout.first().map_or(0, Vec::len)
    }
}

const DEFAULT_MAZE: &str = "\
; Classic
############################
#..........#.....#.........#
#.###.####.#.###.###.#####.#
#.#.....................#..#
#.#.###################.#..#
#.#.....................#..#
#.########################.#
#..........................#
############################
";

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// The built-in 9×28 maze.
pub fn default_maze() -> Result<MazeTemplate, MazeError> {
    parse_maze(DEFAULT_MAZE)
}

/// Load a maze from `path`, or the built-in maze when `path` is `None`.
pub fn load_maze(path: Option<&Path>) -> GameResult<MazeTemplate> {
    let template = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p).map_err(|e| {
                warn!(path = %p.display(), error = %e, "cannot read maze file");
                e
            })?;
            parse_maze(&text).map_err(|e| {
                warn!(path = %p.display(), error = %e, "rejected maze file");
                e
            })?
        }
        None => default_maze()?,
    };
    info!(
        name = %template.name,
        rows = template.rows(),
        cols = template.cols(),
        pinned_power = template.power_cells.len(),
        "maze loaded"
    );
    Ok(template)
}

/// Parse the text format described at the top of this module.
pub fn parse_maze(text: &str) -> Result<MazeTemplate, MazeError> {
    let mut name = None;
    let mut layout: Vec<Vec<Tile>> = Vec::new();
    let mut power_cells = Vec::new();

    for raw in text.lines() {
        let line = raw.trim_end_matches('\r');
        if let Some(comment) = line.strip_prefix(';') {
            if name.is_none() {
                name = Some(comment.trim().to_string());
            }
            continue;
        }
        if line.is_empty() {
            continue;
        }

        let row = layout.len();
        let mut tiles = Vec::with_capacity(line.len());
        for (col, ch) in line.chars().enumerate() {
            let tile = match ch {
                '#' => Tile::Wall,
                '.' | ' ' => Tile::Open,
                'o' => {
                    power_cells.push(Cell::new(row as i32, col as i32));
                    Tile::Open
                }
                _ => return Err(MazeError::UnknownCell { ch, row, col }),
            };
            tiles.push(tile);
        }

        if let Some(first) = layout.first() {
            if tiles.len() != first.len() {
                return Err(MazeError::RaggedRow { row, expected: first.len(), found: tiles.len() });
            }
        }
        layout.push(tiles);
    }

    if layout.is_empty() {
        return Err(MazeError::Empty);
    }
    if !layout.iter().flatten().any(|t| t.is_passable()) {
        return Err(MazeError::NoOpenCells);
    }

    Ok(MazeTemplate {
        name: name.filter(|n| !n.is_empty()).unwrap_or_else(|| "Untitled".into()),
        layout,
        power_cells,
    })
}
