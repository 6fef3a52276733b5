/// The tick function: advances a session by one frame.
///
/// Processing order:
///   1. Buffered heading → player
///   2. Player movement (leading-corner check)
///   3. Adversaries, in id order: mode clock, decision, movement
///   4. Pickup under the player's centre
///   5. Power expiry
///   6. Win check (terminal, skips contacts)
///   7. Contacts (first unpowered contact is terminal)
///
/// A session with a terminal outcome is not touched again until restart.

use tracing::{debug, info};

use crate::domain::ai;
use crate::domain::entity::Position;
use crate::domain::physics;
use crate::domain::rules::{self, Contact};
use crate::domain::tile::Item;
use super::event::{GameEvent, Outcome};
use super::session::Session;

/// What one tick produced.
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    pub outcome: Outcome,
    pub events: Vec<GameEvent>,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn tick(session: &mut Session, now_ms: u64) -> TickReport {
    if session.outcome.is_terminal() {
        return TickReport { outcome: session.outcome, events: vec![] };
    }

    let mut events = Vec::new();

    apply_input(session);
    resolve_player_movement(session);
    resolve_adversaries(session, now_ms, &mut events);
    resolve_pickup(session, now_ms, &mut events);
    resolve_power_expiry(session, now_ms, &mut events);
    if !resolve_win(session, &mut events) {
        resolve_contacts(session, &mut events);
    }

    TickReport { outcome: session.outcome, events }
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn apply_input(session: &mut Session) {
    if let Some(dir) = session.pending_heading.take() {
        session.player.heading = Some(dir);
    }
}

fn resolve_player_movement(session: &mut Session) {
    let p = &mut session.player;
    if let Some(pos) = physics::try_move(&session.grid, p.pos, p.heading, p.speed, session.config.corner_padding) {
        p.pos = pos;
    }
}

// ══════════════════════════════════════════════════════════════
// Adversaries
// ══════════════════════════════════════════════════════════════

fn resolve_adversaries(session: &mut Session, now_ms: u64, events: &mut Vec<GameEvent>) {
    let Session { grid, player, adversaries, rng, config, .. } = session;
    let cell_size = config.cell_size;
    let chance = config.wander_retarget_chance;

    for adv in adversaries.iter_mut() {
        if ai::update_mode(adv, now_ms, config.scatter_ms, config.chase_ms) {
            debug!(id = adv.id, mode = ?adv.mode, deadline = adv.mode_deadline_ms, "mode flip");
            events.push(GameEvent::ModeChanged { id: adv.id, mode: adv.mode });
        }

        if adv.pos.is_cell_aligned(cell_size) {
            ai::decide(adv, grid, player, rng, chance);
        }

        match physics::advance_adversary(grid, adv.pos, adv.heading, adv.speed) {
            Some(pos) => adv.pos = pos,
            None => {
                // Blocked mid-corridor: re-centre and pick again, no move this tick.
                adv.pos = physics::snap_to_lattice(grid, adv.pos);
                ai::decide(adv, grid, player, rng, chance);
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Pickups / power
// ══════════════════════════════════════════════════════════════

fn resolve_pickup(session: &mut Session, now_ms: u64, events: &mut Vec<GameEvent>) {
    let duration = session.config.power_duration_ms;
    let Some((cell, item)) = rules::collect(&mut session.grid, &mut session.player, now_ms, duration) else {
        return;
    };
    match item {
        Item::Pickup => {
            session.score += 1;
            events.push(GameEvent::PickupEaten { row: cell.row, col: cell.col });
        }
        Item::PowerPickup => {
            debug!(until = session.player.power_until_ms, "power up");
            events.push(GameEvent::PowerPickupEaten { row: cell.row, col: cell.col });
        }
        Item::Consumed => {}
    }
}

fn resolve_power_expiry(session: &mut Session, now_ms: u64, events: &mut Vec<GameEvent>) {
    if rules::expire_power(&mut session.player, now_ms) {
        debug!(now_ms, "power expired");
        events.push(GameEvent::PowerExpired);
    }
}

// ══════════════════════════════════════════════════════════════
// Outcome
// ══════════════════════════════════════════════════════════════

/// Returns true when the session was won this tick.
fn resolve_win(session: &mut Session, events: &mut Vec<GameEvent>) -> bool {
    if !rules::all_pickups_cleared(&session.grid) {
        return false;
    }
    session.outcome = Outcome::Won;
    events.push(GameEvent::AllPickupsCleared);
    info!(score = session.score, "all pickups cleared");
    true
}

fn resolve_contacts(session: &mut Session, events: &mut Vec<GameEvent>) {
    let cell_size = session.config.cell_size;
    for i in 0..session.adversaries.len() {
        let adv = &session.adversaries[i];
        if !rules::in_contact(session.player.pos, adv.pos, cell_size) {
            continue;
        }
        let id = adv.id;
        match rules::resolve_contact(&session.player) {
            Contact::Eaten => {
                let cell = session.spawn_cell();
                let adv = &mut session.adversaries[i];
                adv.pos = Position::of_cell(cell, cell_size);
                session.score += session.config.eat_bonus;
                debug!(id, row = cell.row, col = cell.col, "adversary eaten, relocated");
                events.push(GameEvent::AdversaryEaten { id });
            }
            Contact::Caught => {
                session.outcome = Outcome::Caught;
                events.push(GameEvent::PlayerCaught { id });
                info!(id, score = session.score, "player caught");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::domain::entity::{Adversary, Direction, Mode, Personality};
    use crate::domain::grid::Cell;
    use crate::domain::tile::CellState;
    use crate::sim::level::default_maze;
    use crate::sim::session::tests::{session_from, test_config};

    const S: f64 = 30.0;
    const FRAME: u64 = 16;

    fn classic(config: SessionConfig) -> Session {
        Session::new(&default_maze().unwrap(), config, 0).unwrap()
    }

    fn lone_adversary(id: usize, row: i32, col: i32) -> Adversary {
        Adversary::new(id, Position::of_cell(Cell::new(row, col), S), 1.5, u64::MAX)
    }

    // ── Motion ──

    #[test]
    fn player_runs_right_along_top_corridor() {
        let mut s = classic(SessionConfig { adversary_count: 0, ..test_config() });
        s.set_heading(Direction::Right);
        for t in 1..=5 {
            let report = tick(&mut s, t * FRAME);
            assert_eq!(report.outcome, Outcome::Continue);
        }
        assert_eq!(s.player.pos, Position::new(40.0, 30.0));
        assert!(s.score <= 1);
    }

    #[test]
    fn heading_is_applied_once_and_sticks() {
        let mut s = classic(SessionConfig { adversary_count: 0, ..test_config() });
        s.set_heading(Direction::Up);
        s.set_heading(Direction::Right);
        tick(&mut s, FRAME);
        assert_eq!(s.player.heading, Some(Direction::Right));
        assert!(s.pending_heading.is_none());
        tick(&mut s, 2 * FRAME);
        assert_eq!(s.player.pos, Position::new(34.0, 30.0));
    }

    #[test]
    fn blocked_heading_stops_within_padding() {
        let mut s = classic(SessionConfig { adversary_count: 0, ..test_config() });
        s.set_heading(Direction::Up);
        for t in 1..=10 {
            tick(&mut s, t * FRAME);
        }
        // Leading edge probes at y + 5; row 0 is wall, so y stops above 25.
        assert_eq!(s.player.pos, Position::new(30.0, 26.0));
    }

    #[test]
    fn nothing_walks_into_walls() {
        let mut s = classic(SessionConfig { adversary_count: 4, ..test_config() });
        for t in 1..=4000u64 {
            if t % 37 == 0 {
                s.set_heading(Direction::ALL[(t / 37) as usize % 4]);
            }
            let report = tick(&mut s, t * FRAME);
            let g = &s.grid;
            assert!(!g.is_wall(g.to_cell(s.player.pos.center(S))), "player in wall at tick {t}");
            for a in &s.adversaries {
                assert!(!g.is_wall(g.to_cell(a.pos)), "adversary {} in wall at tick {t}", a.id);
                assert!(!g.is_wall(g.to_cell(a.pos.center(S))), "adversary {} in wall at tick {t}", a.id);
            }
            if report.outcome.is_terminal() {
                s.restart(t * FRAME);
            }
        }
    }

    // ── Adversaries ──

    #[test]
    fn wanderer_caches_target_between_decisions() {
        let mut s = classic(SessionConfig { adversary_count: 0, ..test_config() });
        let mut w = lone_adversary(3, 7, 20);
        w.mode = Mode::Chase;
        assert_eq!(w.personality, Personality::Wanderer);
        s.adversaries.push(w);

        tick(&mut s, FRAME);
        let cached = s.adversaries[0].random_target.expect("target sampled at decision point");
        assert!(!s.grid.is_wall(cached));

        // Back onto the lattice for a second decision point.
        s.adversaries[0].pos = Position::of_cell(Cell::new(7, 20), S);
        tick(&mut s, 2 * FRAME);
        assert_eq!(s.adversaries[0].random_target, Some(cached));
    }

    #[test]
    fn mode_flip_is_reported_and_reverses() {
        let mut s = classic(SessionConfig { adversary_count: 0, ..test_config() });
        let mut a = lone_adversary(0, 7, 20);
        a.mode_deadline_ms = 7000;
        // Mid-corridor so no decision undoes the reversal.
        a.pos = Position::new(604.5, 210.0);
        a.heading = Direction::Right;
        s.adversaries.push(a);

        let report = tick(&mut s, 7000);
        assert!(report.events.contains(&GameEvent::ModeChanged { id: 0, mode: Mode::Chase }));
        assert_eq!(s.adversaries[0].heading, Direction::Left);
        assert_eq!(s.adversaries[0].pos, Position::new(603.0, 210.0));
        assert_eq!(s.adversaries[0].mode_deadline_ms, 27_000);
    }

    #[test]
    fn adversary_hitting_a_wall_snaps_and_turns() {
        let mut s = session_from(
            &["######", "#....#", "#.##.#", "#....#", "######"],
            SessionConfig { adversary_count: 0, ..test_config() },
        );
        let mut a = lone_adversary(0, 1, 4);
        // Off-lattice, heading into the right-hand wall.
        a.pos = Position::new(121.0, 30.0);
        a.heading = Direction::Right;
        s.adversaries.push(a);

        // Top-left stays in column 4 until x reaches 150.
        for t in 1..=19 {
            tick(&mut s, t * FRAME);
        }
        assert_eq!(s.adversaries[0].pos, Position::new(149.5, 30.0));
        tick(&mut s, 20 * FRAME);
        let a = &s.adversaries[0];
        assert_eq!(a.pos, Position::new(120.0, 30.0));
        assert!(a.heading == Direction::Down || a.heading == Direction::Left);
    }

    // ── Pickups / power ──

    #[test]
    fn pickups_decrease_monotonically() {
        let mut s = classic(SessionConfig { adversary_count: 0, ..test_config() });
        s.set_heading(Direction::Right);
        let mut remaining = s.grid.remaining_pickups();
        let mut eaten = 0;
        for t in 1..=200 {
            let report = tick(&mut s, t * FRAME);
            let ate = report
                .events
                .iter()
                .filter(|e| matches!(e, GameEvent::PickupEaten { .. }))
                .count();
            eaten += ate;
            let now = s.grid.remaining_pickups();
            assert_eq!(remaining - now, ate);
            remaining = now;
        }
        assert!(eaten > 0);
        assert_eq!(s.score as usize, eaten);
    }

    #[test]
    fn power_window_is_half_open() {
        let mut s = session_from(
            &["#####", "#o..#", "#####"],
            SessionConfig { adversary_count: 0, power_pickup_count: 1, ..test_config() },
        );
        let report = tick(&mut s, 1000);
        assert!(report.events.contains(&GameEvent::PowerPickupEaten { row: 1, col: 1 }));
        assert_eq!(s.grid.cell_at(Cell::new(1, 1)), CellState::Consumed);
        assert_eq!(s.score, 0);

        for now in [1001, 3000, 5999] {
            let report = tick(&mut s, now);
            assert!(s.player.powered, "still powered at {now}");
            assert!(report.events.is_empty());
        }
        let report = tick(&mut s, 6000);
        assert!(!s.player.powered);
        assert_eq!(report.events, vec![GameEvent::PowerExpired]);
        tick(&mut s, 6500);
        assert!(!s.player.powered);
    }

    // ── Contacts / outcome ──

    #[test]
    fn powered_contact_relocates_and_scores() {
        let mut s = classic(SessionConfig { adversary_count: 0, ..test_config() });
        s.grid.consume(Cell::new(1, 1));
        s.player.powered = true;
        s.player.power_until_ms = 60_000;
        s.adversaries.push(lone_adversary(0, 1, 1));

        let report = tick(&mut s, FRAME);
        assert_eq!(report.outcome, Outcome::Continue);
        assert!(report.events.contains(&GameEvent::AdversaryEaten { id: 0 }));
        assert_eq!(s.score, 10);
        let a = &s.adversaries[0];
        assert!(!s.grid.is_wall(s.grid.to_cell(a.pos)));
        assert!(a.pos.is_cell_aligned(S));
        assert!(s.player.powered);
    }

    #[test]
    fn simultaneous_powered_contacts_each_resolve() {
        let mut s = classic(SessionConfig { adversary_count: 0, ..test_config() });
        s.grid.consume(Cell::new(1, 1));
        s.player.powered = true;
        s.player.power_until_ms = 60_000;
        for id in 0..2 {
            let mut a = lone_adversary(id, 1, 2);
            a.heading = Direction::Left;
            s.adversaries.push(a);
        }

        let report = tick(&mut s, FRAME);
        assert_eq!(report.outcome, Outcome::Continue);
        let eaten: Vec<_> = report
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::AdversaryEaten { .. }))
            .collect();
        assert_eq!(eaten, vec![&GameEvent::AdversaryEaten { id: 0 }, &GameEvent::AdversaryEaten { id: 1 }]);
        assert_eq!(s.score, 20);
        for a in &s.adversaries {
            assert!(!s.grid.is_wall(s.grid.to_cell(a.pos)));
            assert!(a.pos.is_cell_aligned(S));
            assert!(!rules::in_contact(s.player.pos, a.pos, S));
        }
    }

    #[test]
    fn unpowered_contact_is_terminal_and_freezes() {
        let mut s = classic(SessionConfig { adversary_count: 0, ..test_config() });
        for id in 0..2 {
            let mut a = lone_adversary(id, 1, 2);
            a.heading = Direction::Left;
            s.adversaries.push(a);
        }

        let report = tick(&mut s, FRAME);
        assert_eq!(report.outcome, Outcome::Caught);
        // Stops at the first contact.
        let caught: Vec<_> = report
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::PlayerCaught { .. }))
            .collect();
        assert_eq!(caught, vec![&GameEvent::PlayerCaught { id: 0 }]);

        let player = s.player.pos;
        let advs: Vec<Position> = s.adversaries.iter().map(|a| a.pos).collect();
        let score = s.score;
        s.set_heading(Direction::Right);
        for t in 2..=10 {
            let report = tick(&mut s, t * FRAME);
            assert_eq!(report.outcome, Outcome::Caught);
            assert!(report.events.is_empty());
        }
        assert_eq!(s.player.pos, player);
        assert_eq!(s.adversaries.iter().map(|a| a.pos).collect::<Vec<_>>(), advs);
        assert_eq!(s.score, score);

        s.restart(1000);
        assert_eq!(tick(&mut s, 1016).outcome, Outcome::Continue);
    }

    #[test]
    fn clearing_the_board_wins_before_contacts() {
        let mut s = session_from(
            &["####", "#.o#", "####"],
            SessionConfig { adversary_count: 0, power_pickup_count: 1, ..test_config() },
        );
        s.adversaries.push(lone_adversary(0, 1, 2));

        let report = tick(&mut s, FRAME);
        assert_eq!(report.outcome, Outcome::Won);
        assert!(report.events.contains(&GameEvent::AllPickupsCleared));
        assert!(!report.events.iter().any(|e| matches!(e, GameEvent::PlayerCaught { .. })));
        assert_eq!(s.score, 1);
    }
}
