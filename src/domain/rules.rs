/// Pickup, power and contact rules.
///
/// Pure decisions over entity and grid state. Score bookkeeping and event
/// emission belong to the step; these functions only say what happened.
///
/// ### Pickup (cell under the player's centre)
/// ┌──────────────────┬──────────────────────────────────────┐
/// │ Cell state        │ Effect                               │
/// ├──────────────────┼──────────────────────────────────────┤
/// │ Pickup            │ → Consumed, score +1                 │
/// │ PowerPickup       │ → Consumed, powered until now + D    │
/// │ Consumed / Wall   │ nothing                              │
/// └──────────────────┴──────────────────────────────────────┘
///
/// ### Contact (centre distance < one cell)
/// ┌──────────────────┬──────────────────────────────────────┐
/// │ Player powered?   │ Result                               │
/// ├──────────────────┼──────────────────────────────────────┤
/// │ yes               │ Eaten: adversary relocates, bonus    │
/// │ no                │ Caught: session ends                 │
/// └──────────────────┴──────────────────────────────────────┘

use super::entity::{Player, Position};
use super::grid::{Cell, Grid};
use super::tile::Item;

// ── Pickups ──

/// Consume whatever sits under the player's centre. A power pickup also
/// (re)arms the power window; a fresh one extends rather than stacks.
pub fn collect(grid: &mut Grid, player: &mut Player, now_ms: u64, power_duration_ms: u64) -> Option<(Cell, Item)> {
    let cell = grid.to_cell(player.pos.center(grid.cell_size()));
    let eaten = grid.consume(cell)?;
    if eaten == Item::PowerPickup {
        player.powered = true;
        player.power_until_ms = now_ms + power_duration_ms;
    }
    Some((cell, eaten))
}

/// Clear the powered flag once the window has closed. Returns true on expiry.
pub fn expire_power(player: &mut Player, now_ms: u64) -> bool {
    if player.powered && now_ms >= player.power_until_ms {
        player.powered = false;
        return true;
    }
    false
}

/// Win condition: no regular pickups left. Power pickups do not count.
pub fn all_pickups_cleared(grid: &Grid) -> bool {
    grid.remaining_pickups() == 0
}

// ── Contact ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Contact {
    /// Powered player ate the adversary.
    Eaten,
    /// Unpowered player was caught.
    Caught,
}

#[inline]
pub fn in_contact(a: Position, b: Position, cell_size: f64) -> bool {
    a.center(cell_size).distance(b.center(cell_size)) < cell_size
}

pub fn resolve_contact(player: &Player) -> Contact {
    if player.powered { Contact::Eaten } else { Contact::Caught }
}
