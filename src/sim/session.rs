/// Session: the complete state of one running game.
///
/// Owns the grid, the entities, the score and the seeded RNG. Nothing here
/// reads a clock; every time-dependent call takes `now_ms` from the caller.
///
/// ## Lifecycle
///   - `new` validates config and spawn, designates power pickups, places
///     adversaries.
///   - `step::tick` advances it.
///   - After a terminal outcome the session is frozen until `restart`,
///     which resets the item overlay and re-places every entity. The grid
///     geometry is never rebuilt.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::config::SessionConfig;
use crate::domain::entity::{Adversary, Direction, Player, Position};
use crate::domain::grid::{Cell, Grid};
use crate::domain::physics;
use crate::domain::rules;
use crate::error::{GameResult, MazeError};
use super::event::Outcome;
use super::level::MazeTemplate;
use super::snapshot::{AdversaryView, PlayerView, Snapshot};

pub struct Session {
    // ── World ──
    pub(crate) grid: Grid,
    pub(crate) player: Player,
    pub(crate) adversaries: Vec<Adversary>,

    // ── Tracking ──
    pub(crate) score: u32,
    pub(crate) outcome: Outcome,
    /// Last heading requested since the previous tick.
    pub(crate) pending_heading: Option<Direction>,

    // ── Setup ──
    pub(crate) config: SessionConfig,
    pub(crate) rng: ChaCha8Rng,
    pinned_power: Vec<Cell>,
    spawn: Cell,
    maze_name: String,
}

// ── Construction ──

impl Session {
    pub fn new(template: &MazeTemplate, config: SessionConfig, now_ms: u64) -> GameResult<Self> {
        config.validate()?;
        let grid = Grid::new(&template.layout, config.cell_size)?;

        let [row, col] = config.player_spawn;
        let spawn = Cell::new(row as i32, col as i32);
        if row >= grid.rows() || col >= grid.cols() {
            return Err(MazeError::SpawnOutOfBounds { row, col }.into());
        }
        if grid.is_wall(spawn) {
            return Err(MazeError::SpawnInWall { row, col }.into());
        }

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut session = Session {
            grid,
            player: Player::new(Position::of_cell(spawn, config.cell_size), config.player_speed),
            adversaries: Vec::new(),
            score: 0,
            outcome: Outcome::Continue,
            pending_heading: None,
            config,
            rng,
            pinned_power: template.power_cells.clone(),
            spawn,
            maze_name: template.name.clone(),
        };
        session.populate(now_ms);
        info!(
            maze = %session.maze_name,
            adversaries = session.adversaries.len(),
            seed = ?session.config.seed,
            "session started"
        );
        Ok(session)
    }

    /// Back to the initial state: fresh overlay, fresh entities, score 0.
    pub fn restart(&mut self, now_ms: u64) {
        self.populate(now_ms);
        info!(maze = %self.maze_name, "session restarted");
    }

    fn populate(&mut self, now_ms: u64) {
        let power = self.designate_power_cells();
        self.grid.reset_items(&power);

        let cell_size = self.config.cell_size;
        self.player = Player::new(Position::of_cell(self.spawn, cell_size), self.config.player_speed);
        self.score = 0;
        self.outcome = Outcome::Continue;
        self.pending_heading = None;

        let deadline = now_ms + self.config.scatter_ms;
        let mut adversaries = Vec::with_capacity(self.config.adversary_count);
        for id in 0..self.config.adversary_count {
            let pos = Position::of_cell(self.spawn_cell(), cell_size);
            debug_assert!(!physics::box_touches_wall(&self.grid, pos));
            adversaries.push(Adversary::new(id, pos, self.config.adversary_speed(id), deadline));
        }
        self.adversaries = adversaries;
    }

    /// Pinned cells first, then random open cells up to the configured count.
    fn designate_power_cells(&mut self) -> Vec<Cell> {
        let mut power: Vec<Cell> = self
            .pinned_power
            .iter()
            .copied()
            .filter(|&c| !self.grid.is_wall(c))
            .collect();
        let wanted = self.config.power_pickup_count.saturating_sub(power.len());
        let free: Vec<Cell> = self
            .grid
            .open_cells()
            .iter()
            .copied()
            .filter(|c| !power.contains(c))
            .collect();
        power.extend(free.choose_multiple(&mut self.rng, wanted).copied());
        power
    }

    /// Random open cell out of contact range of the player, when one exists.
    pub(crate) fn spawn_cell(&mut self) -> Cell {
        let s = self.config.cell_size;
        let player = self.player.pos;
        let others: Vec<Cell> = self
            .grid
            .open_cells()
            .iter()
            .copied()
            .filter(|&c| !rules::in_contact(Position::of_cell(c, s), player, s))
            .collect();
        match others.choose(&mut self.rng) {
            Some(&c) => c,
            None => self.grid.random_open_cell(&mut self.rng),
        }
    }
}

// ── Input ──

impl Session {
    /// Buffer a heading for the next tick. Last write wins.
    pub fn set_heading(&mut self, dir: Direction) {
        self.pending_heading = Some(dir);
    }
}

// ── Read-only views ──

impl Session {
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn maze_name(&self) -> &str {
        &self.maze_name
    }

    /// Cells whose state changed since the last call (restart reports every open cell).
    pub fn take_changed_cells(&mut self) -> Vec<Cell> {
        self.grid.take_changed()
    }

    pub fn snapshot(&self, now_ms: u64) -> Snapshot {
        let s = self.config.cell_size;
        let power_left_ms = if self.player.powered {
            self.player.power_until_ms.saturating_sub(now_ms)
        } else {
            0
        };
        Snapshot {
            score: self.score,
            remaining_pickups: self.grid.remaining_pickups(),
            outcome: self.outcome,
            player: PlayerView {
                pos: self.player.pos,
                cell: self.grid.to_cell(self.player.pos.center(s)),
                heading: self.player.heading,
                powered: self.player.powered,
                power_left_ms,
            },
            adversaries: self
                .adversaries
                .iter()
                .map(|a| AdversaryView {
                    id: a.id,
                    pos: a.pos,
                    cell: self.grid.to_cell(a.pos.center(s)),
                    heading: a.heading,
                    mode: a.mode,
                    personality: a.personality,
                })
                .collect(),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("maze", &self.maze_name)
            .field("score", &self.score)
            .field("outcome", &self.outcome)
            .field("player", &self.player)
            .field("adversaries", &self.adversaries)
            .finish_non_exhaustive()
    }
}

// ── Test fixtures ──
