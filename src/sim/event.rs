/// Events emitted during a tick, and the tick's outcome.
/// The presentation layer consumes events for sound and HUD messages.

use crate::domain::entity::Mode;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    PickupEaten { row: i32, col: i32 },
    PowerPickupEaten { row: i32, col: i32 },
    PowerExpired,
    ModeChanged { id: usize, mode: Mode },
    AdversaryEaten { id: usize },
    PlayerCaught { id: usize },
    AllPickupsCleared,
}

/// Per-tick result. `Won` and `Caught` are terminal until `Session::restart`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Outcome {
    #[default]
    Continue,
    Won,
    Caught,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::Continue)
    }
}
