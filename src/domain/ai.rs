/// Adversary AI: mode clock, target selection and heading choice.
///
/// Per adversary, per tick:
///   1. **Mode clock**: Scatter ⇄ Chase on a deadline. Every flip also
///      reverses the heading on the spot.
///   2. **Decision point**: only when the position is exactly cell-aligned.
///      Enumerate open neighbours, pick a target cell, then take the
///      neighbour closest (straight-line) to the target.
///
/// Targets are heuristic, not paths: an adversary can and will get stuck
/// behind walls on its way to a corner. That is the intended arcade feel.

use rand::Rng;
use tracing::trace;

use super::entity::{heading_delta, Adversary, Direction, Mode, Personality, Player};
use super::grid::{Cell, Grid};

/// Cells ahead of the player the Ambusher aims for.
const AMBUSH_LEAD: i32 = 4;
/// Cells behind the player the Flanker aims for.
const FLANK_TRAIL: i32 = 2;

// ── Mode clock ──

/// Flip the mode if its deadline has passed. Returns true on a flip.
///
/// Entering Scatter arms `scatter_ms`, entering Chase arms `chase_ms`.
/// The heading is reversed unconditionally.
pub fn update_mode(adv: &mut Adversary, now_ms: u64, scatter_ms: u64, chase_ms: u64) -> bool {
    if now_ms < adv.mode_deadline_ms {
        return false;
    }
    adv.mode = adv.mode.flipped();
    adv.mode_deadline_ms = now_ms
        + match adv.mode {
            Mode::Scatter => scatter_ms,
            Mode::Chase => chase_ms,
        };
    adv.heading = adv.heading.opposite();
    true
}

// ── Targeting ──

/// Headings whose neighbouring cell is not a wall, in Up/Down/Left/Right order.
pub fn available_directions(grid: &Grid, cell: Cell) -> Vec<Direction> {
    Direction::ALL
        .into_iter()
        .filter(|&d| !grid.is_wall(cell.step(d)))
        .collect()
}

/// Scatter corner for a personality: one cell in from each extreme.
pub fn scatter_corner(personality: Personality, rows: usize, cols: usize) -> Cell {
    let last_row = rows as i32 - 2;
    let last_col = cols as i32 - 2;
    match personality {
        Personality::Pursuer => Cell::new(1, last_col),
        Personality::Ambusher => Cell::new(1, 1),
        Personality::Flanker => Cell::new(last_row, last_col),
        Personality::Wanderer => Cell::new(last_row, 1),
    }
}

/// Target cell for this decision. May mutate the Wanderer's cached target.
pub fn target_cell<R: Rng + ?Sized>(
    adv: &mut Adversary,
    grid: &Grid,
    player: &Player,
    rng: &mut R,
    retarget_chance: f64,
) -> Cell {
    if adv.mode == Mode::Scatter {
        return scatter_corner(adv.personality, grid.rows(), grid.cols());
    }

    let here = grid.to_cell(player.pos);
    let (dx, dy) = heading_delta(player.heading);
    match adv.personality {
        Personality::Pursuer => here,
        Personality::Ambusher => Cell::new(here.row + dy * AMBUSH_LEAD, here.col + dx * AMBUSH_LEAD),
        Personality::Flanker => Cell::new(here.row - dy * FLANK_TRAIL, here.col - dx * FLANK_TRAIL),
        Personality::Wanderer => {
            // No draw is consumed when the cache is empty.
            let resample = match adv.random_target {
                None => true,
                Some(_) => rng.gen_bool(retarget_chance),
            };
            if resample {
                adv.random_target = Some(grid.random_open_cell(rng));
            }
            adv.random_target.unwrap_or(here)
        }
    }
}

// ── Heading choice ──

/// Pick the heading that brings the next cell closest to `target`.
///
/// The reverse of `current` is dropped unless it is the only way out.
/// Ties go to the earliest candidate in Up/Down/Left/Right order.
/// With no open neighbour at all, `current` is kept.
pub fn choose_direction(current: Direction, available: &[Direction], from: Cell, target: Cell) -> Direction {
    let reverse = current.opposite();
    let filtered: Vec<Direction> = available
        .iter()
        .copied()
        .filter(|&d| d != reverse || available.len() == 1)
        .collect();
    let candidates: &[Direction] = if filtered.is_empty() { available } else { &filtered };

    let mut best = current;
    let mut best_dist = f64::INFINITY;
    for &d in candidates {
        let dist = from.step(d).distance(target);
        if dist < best_dist {
            best_dist = dist;
            best = d;
        }
    }
    best
}

/// Full decision at the adversary's current cell. Updates and returns its heading.
pub fn decide<R: Rng + ?Sized>(
    adv: &mut Adversary,
    grid: &Grid,
    player: &Player,
    rng: &mut R,
    retarget_chance: f64,
) -> Direction {
    let cell = grid.to_cell(adv.pos);
    let available = available_directions(grid, cell);
    let target = target_cell(adv, grid, player, rng, retarget_chance);
    let chosen = choose_direction(adv.heading, &available, cell, target);
    trace!(
        id = adv.id,
        mode = ?adv.mode,
        row = cell.row,
        col = cell.col,
        target_row = target.row,
        target_col = target.col,
        from = ?adv.heading,
        to = ?chosen,
        "adversary decision"
    );
    adv.heading = chosen;
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Position;
    use crate::domain::grid::tests::grid_from;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const S: f64 = 30.0;

    fn adversary_at(id: usize, row: i32, col: i32) -> Adversary {
        Adversary::new(id, Position::of_cell(Cell::new(row, col), S), 1.5, 7000)
    }

    fn player_at(row: i32, col: i32, heading: Option<Direction>) -> Player {
        let mut p = Player::new(Position::of_cell(Cell::new(row, col), S), 2.0);
        p.heading = heading;
        p
    }

    fn open_field() -> Grid {
        grid_from(&[
            "#########",
            "#.......#",
            "#.......#",
            "#.......#",
            "#.......#",
            "#.......#",
            "#########",
        ], S)
    }

    // ── Mode clock ──

    #[test]
    fn mode_holds_until_deadline() {
        let mut a = adversary_at(0, 1, 1);
        assert!(!update_mode(&mut a, 6999, 7000, 20000));
        assert_eq!(a.mode, Mode::Scatter);
        assert_eq!(a.heading, Direction::Right);
    }

    #[test]
    fn mode_flip_rearms_and_reverses() {
        let mut a = adversary_at(0, 1, 1);
        assert!(update_mode(&mut a, 7000, 7000, 20000));
        assert_eq!(a.mode, Mode::Chase);
        assert_eq!(a.mode_deadline_ms, 27000);
        assert_eq!(a.heading, Direction::Left);

        assert!(update_mode(&mut a, 27000, 7000, 20000));
        assert_eq!(a.mode, Mode::Scatter);
        assert_eq!(a.mode_deadline_ms, 34000);
        assert_eq!(a.heading, Direction::Right);
    }

    // ── Available directions ──

    #[test]
    fn available_respects_walls_and_bounds() {
        let g = grid_from(&[
            "...",
            ".#.",
        ], S);
        // Corner cell: up and left are off-grid, down is the wall.
        assert_eq!(available_directions(&g, Cell::new(0, 1)), vec![Direction::Left, Direction::Right]);
        assert_eq!(available_directions(&g, Cell::new(0, 0)), vec![Direction::Down, Direction::Right]);
    }

    // ── Targets ──

    #[test]
    fn scatter_corners_are_fixed_per_personality() {
        let g = open_field();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let expected = [Cell::new(1, 7), Cell::new(1, 1), Cell::new(5, 7), Cell::new(5, 1)];
        for (id, corner) in expected.iter().enumerate() {
            for &(pr, pc) in &[(1, 1), (3, 4), (5, 7)] {
                let mut a = adversary_at(id, 3, 3);
                let p = player_at(pr, pc, Some(Direction::Up));
                assert_eq!(target_cell(&mut a, &g, &p, &mut rng, 0.1), *corner);
            }
        }
    }

    #[test]
    fn chase_targets_follow_player() {
        let g = open_field();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let p = player_at(3, 4, Some(Direction::Right));

        let mut pursuer = adversary_at(0, 1, 1);
        pursuer.mode = Mode::Chase;
        assert_eq!(target_cell(&mut pursuer, &g, &p, &mut rng, 0.1), Cell::new(3, 4));

        let mut ambusher = adversary_at(1, 1, 1);
        ambusher.mode = Mode::Chase;
        assert_eq!(target_cell(&mut ambusher, &g, &p, &mut rng, 0.1), Cell::new(3, 8));

        let mut flanker = adversary_at(2, 1, 1);
        flanker.mode = Mode::Chase;
        assert_eq!(target_cell(&mut flanker, &g, &p, &mut rng, 0.1), Cell::new(3, 2));
    }

    #[test]
    fn chase_targets_with_idle_player_collapse_to_player_cell() {
        let g = open_field();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let p = player_at(2, 2, None);
        for id in 0..3 {
            let mut a = adversary_at(id, 5, 5);
            a.mode = Mode::Chase;
            assert_eq!(target_cell(&mut a, &g, &p, &mut rng, 0.1), Cell::new(2, 2));
        }
    }

    #[test]
    fn wanderer_samples_then_keeps_target() {
        let g = open_field();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let p = player_at(3, 4, Some(Direction::Left));
        let mut w = adversary_at(3, 1, 1);
        w.mode = Mode::Chase;
        assert!(w.random_target.is_none());

        let first = target_cell(&mut w, &g, &p, &mut rng, 0.0);
        assert_eq!(w.random_target, Some(first));
        assert!(!g.is_wall(first));

        for _ in 0..20 {
            assert_eq!(target_cell(&mut w, &g, &p, &mut rng, 0.0), first);
        }
    }

    #[test]
    fn wanderer_always_resamples_at_full_chance() {
        let g = open_field();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let p = player_at(3, 4, None);
        let mut w = adversary_at(3, 1, 1);
        w.mode = Mode::Chase;
        let mut seen = std::collections::HashSet::new();
        for _ in 0..30 {
            seen.insert(target_cell(&mut w, &g, &p, &mut rng, 1.0));
        }
        assert!(seen.len() > 1);
    }

    // ── Heading choice ──

    #[test]
    fn picks_closest_neighbour() {
        let all = Direction::ALL;
        let from = Cell::new(3, 3);
        assert_eq!(choose_direction(Direction::Right, &all, from, Cell::new(3, 7)), Direction::Right);
        assert_eq!(choose_direction(Direction::Right, &all, from, Cell::new(0, 3)), Direction::Up);
        assert_eq!(choose_direction(Direction::Up, &all, from, Cell::new(3, 0)), Direction::Left);
    }

    #[test]
    fn never_reverses_at_a_junction() {
        let all = Direction::ALL;
        // Target straight behind: must not turn around while alternatives exist.
        let chosen = choose_direction(Direction::Right, &all, Cell::new(3, 3), Cell::new(3, 0));
        assert_ne!(chosen, Direction::Left);
        // Up and Down tie at distance sqrt(10); Up wins by order.
        assert_eq!(chosen, Direction::Up);
    }

    #[test]
    fn reverses_at_dead_end() {
        let only_back = [Direction::Left];
        assert_eq!(
            choose_direction(Direction::Right, &only_back, Cell::new(1, 1), Cell::new(1, 7)),
            Direction::Left
        );
    }

    #[test]
    fn ties_follow_enumeration_order() {
        let all = Direction::ALL;
        // Target on the cell itself: all four neighbours are at distance 1.
        assert_eq!(choose_direction(Direction::Left, &all, Cell::new(2, 2), Cell::new(2, 2)), Direction::Up);
        let no_up = [Direction::Down, Direction::Left, Direction::Right];
        assert_eq!(choose_direction(Direction::Up, &no_up, Cell::new(2, 2), Cell::new(2, 2)), Direction::Left);
    }

    #[test]
    fn boxed_in_keeps_heading() {
        assert_eq!(choose_direction(Direction::Down, &[], Cell::new(1, 1), Cell::new(5, 5)), Direction::Down);
    }

    #[test]
    fn decide_after_flip_excludes_pre_flip_heading() {
        // Corridor junction: adversary heading Right flips to Left, so the
        // "reverse" for this decision is Right, the pre-flip heading.
        let g = open_field();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let p = player_at(3, 7, None);
        let mut a = adversary_at(0, 3, 3);
        a.mode_deadline_ms = 0;
        assert!(update_mode(&mut a, 10, 7000, 20000));
        assert_eq!(a.heading, Direction::Left);
        let chosen = decide(&mut a, &g, &p, &mut rng, 0.1);
        assert_ne!(chosen, Direction::Right);
    }

    #[test]
    fn decide_sets_heading() {
        let g = open_field();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let p = player_at(5, 1, None);
        // Pursuer in scatter heads for (1, 7).
        let mut a = adversary_at(0, 3, 7);
        a.heading = Direction::Down;
        // Up is the reverse of Down; Left and Right remain plus Down.
        let chosen = decide(&mut a, &g, &p, &mut rng, 0.1);
        assert_eq!(a.heading, chosen);
        assert_ne!(chosen, Direction::Up);
    }
}
