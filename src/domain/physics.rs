/// Motion resolver: continuous movement over the cell grid.
///
/// Two legality checks live here, deliberately different:
///
///   1. **Player** (`try_move`): probe the two *leading* corners of the
///      bounding box at the candidate position, inset by a padding. Trailing
///      corners are never checked, which lets the player clip corners at
///      intersections.
///   2. **Adversary** (`advance_adversary`): probe only the cell containing
///      the candidate top-left corner. On a hit the adversary snaps to the
///      lattice and is re-routed by the decision engine.
///
/// Rejected moves leave the entity where it is: no sliding, no partial step.

use super::entity::{Direction, Position};
use super::grid::Grid;

/// The two corners of the box at `pos` that lead in direction `dir`,
/// pulled `padding` units inward on both axes.
pub fn leading_corners(pos: Position, dir: Direction, cell_size: f64, padding: f64) -> [Position; 2] {
    let near = padding;
    let far = cell_size - padding;
    let (a, b) = match dir {
        Direction::Right => ((far, near), (far, far)),
        Direction::Left => ((near, near), (near, far)),
        Direction::Down => ((near, far), (far, far)),
        Direction::Up => ((near, near), (far, near)),
    };
    [
        Position::new(pos.x + a.0, pos.y + a.1),
        Position::new(pos.x + b.0, pos.y + b.1),
    ]
}

/// Player move. `None` = rejected; a zero heading always succeeds in place.
pub fn try_move(
    grid: &Grid,
    pos: Position,
    heading: Option<Direction>,
    speed: f64,
    padding: f64,
) -> Option<Position> {
    let dir = match heading {
        Some(d) => d,
        None => return Some(pos),
    };
    let candidate = pos.offset(Some(dir), speed);
    let blocked = leading_corners(candidate, dir, grid.cell_size(), padding)
        .iter()
        .any(|&corner| grid.is_wall(grid.to_cell(corner)));
    if blocked { None } else { Some(candidate) }
}

/// Adversary move: only the cell under the candidate top-left corner counts.
pub fn advance_adversary(grid: &Grid, pos: Position, heading: Direction, speed: f64) -> Option<Position> {
    let candidate = pos.offset(Some(heading), speed);
    if grid.is_wall(grid.to_cell(candidate)) { None } else { Some(candidate) }
}

/// Nearest lattice point, unless that lands in a wall; then the origin of
/// the cell `pos` currently occupies.
pub fn snap_to_lattice(grid: &Grid, pos: Position) -> Position {
    let snapped = pos.snapped(grid.cell_size());
    if grid.is_wall(grid.to_cell(snapped)) {
        Position::of_cell(grid.to_cell(pos), grid.cell_size())
    } else {
        snapped
    }
}

/// Does any corner of the full box at `pos` sit in a wall?
/// Used to validate spawn points and in invariant checks.
pub fn box_touches_wall(grid: &Grid, pos: Position) -> bool {
    let edge = grid.cell_size() - 1e-9;
    [(0.0, 0.0), (edge, 0.0), (0.0, edge), (edge, edge)]
        .iter()
        .any(|&(dx, dy)| grid.is_wall(grid.to_cell(Position::new(pos.x + dx, pos.y + dy))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::tests::grid_from;
    use crate::domain::grid::Cell;

    const S: f64 = 30.0;
    const PAD: f64 = 5.0;

    fn at(row: i32, col: i32) -> Position {
        Position::of_cell(Cell::new(row, col), S)
    }

    #[test]
    fn zero_heading_is_a_trivial_success() {
        let g = grid_from(&["###", "#.#", "###"], S);
        assert_eq!(try_move(&g, at(1, 1), None, 2.0, PAD), Some(at(1, 1)));
    }

    #[test]
    fn open_corridor_moves_by_speed() {
        let g = grid_from(&["#####", "#...#", "#####"], S);
        let moved = try_move(&g, at(1, 1), Some(Direction::Right), 2.0, PAD).unwrap();
        assert_eq!(moved, Position::new(32.0, 30.0));
    }

    #[test]
    fn blocked_when_leading_edge_enters_wall() {
        let g = grid_from(&["####", "#..#", "####"], S);
        assert_eq!(try_move(&g, Position::new(64.0, 30.0), Some(Direction::Right), 2.0, PAD), None);
        assert_eq!(try_move(&g, Position::new(30.0, 25.0), Some(Direction::Up), 2.0, PAD), None);
        assert_eq!(try_move(&g, Position::new(25.0, 30.0), Some(Direction::Left), 2.0, PAD), None);
    }

    #[test]
    fn padding_allows_approach_to_within_padding() {
        let g = grid_from(&["####", "#..#", "####"], S);
        // Leading edge sits at x + 30 - 5; the wall column starts at x = 90.
        assert_eq!(
            try_move(&g, Position::new(63.0, 30.0), Some(Direction::Right), 1.0, PAD),
            Some(Position::new(64.0, 30.0))
        );
        assert_eq!(try_move(&g, Position::new(64.0, 30.0), Some(Direction::Right), 1.0, PAD), None);
    }

    #[test]
    fn corner_cutting_ignores_trailing_corners() {
        let g = grid_from(&[
            "#####",
            "#...#",
            "#.###",
            "#####",
        ], S);
        // Halfway into the opening below row 1, turning right.
        let pos = Position::new(30.0, 40.0);
        let moved = try_move(&g, pos, Some(Direction::Right), 2.0, PAD);
        assert_eq!(moved, Some(Position::new(32.0, 40.0)));
        // A full-box check would have refused the same spot.
        assert!(box_touches_wall(&g, Position::new(32.0, 40.0)));
    }

    #[test]
    fn rejected_move_does_not_slide() {
        let g = grid_from(&["###", "#.#", "###"], S);
        for d in Direction::ALL {
            assert_eq!(try_move(&g, at(1, 1), Some(d), 6.0, PAD), None);
        }
    }

    #[test]
    fn adversary_checks_next_cell_only() {
        let g = grid_from(&["####", "#..#", "####"], S);
        // Moving left from cell (1,1): top-left crosses into the wall column.
        assert_eq!(advance_adversary(&g, at(1, 1), Direction::Left, 1.5), None);
        // Moving right from (1,2): top-left stays in column 2 until it fully crosses.
        assert_eq!(
            advance_adversary(&g, at(1, 2), Direction::Right, 1.5),
            Some(Position::new(61.5, 30.0))
        );
        assert_eq!(
            advance_adversary(&g, at(1, 1), Direction::Right, 1.5),
            Some(Position::new(31.5, 30.0))
        );
    }

    #[test]
    fn snap_rounds_but_never_into_a_wall() {
        let g = grid_from(&["####", "#..#", "####"], S);
        assert_eq!(snap_to_lattice(&g, Position::new(44.0, 30.0)), at(1, 1));
        assert_eq!(snap_to_lattice(&g, Position::new(46.0, 30.0)), at(1, 2));
        // Rounding would give column 3, which is wall.
        assert_eq!(snap_to_lattice(&g, Position::new(88.5, 30.0)), at(1, 2));
    }

    #[test]
    fn box_check_sees_every_corner() {
        let g = grid_from(&["####", "#..#", "####"], S);
        assert!(!box_touches_wall(&g, at(1, 1)));
        assert!(!box_touches_wall(&g, Position::new(31.0, 30.0)));
        assert!(box_touches_wall(&g, Position::new(61.0, 30.0)));
        assert!(box_touches_wall(&g, Position::new(30.0, 31.0)));
    }
}
