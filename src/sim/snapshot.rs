/// Read-only per-frame views for the renderer and HUD.
///
/// `cell` is the cell under the entity's centre, which is where a
/// character-cell display draws it.

use crate::domain::entity::{Direction, Mode, Personality, Position};
use crate::domain::grid::Cell;
use super::event::Outcome;

#[derive(Clone, Debug)]
pub struct Snapshot {
    pub score: u32,
    pub remaining_pickups: usize,
    pub outcome: Outcome,
    pub player: PlayerView,
    pub adversaries: Vec<AdversaryView>,
}

#[derive(Clone, Debug)]
pub struct PlayerView {
    pub pos: Position,
    pub cell: Cell,
    pub heading: Option<Direction>,
    pub powered: bool,
    /// Zero when not powered.
    pub power_left_ms: u64,
}

#[derive(Clone, Debug)]
pub struct AdversaryView {
    pub id: usize,
    pub pos: Position,
    pub cell: Cell,
    pub heading: Direction,
    pub mode: Mode,
    pub personality: Personality,
}
