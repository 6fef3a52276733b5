/// Cell classification.
///
/// Two layers, composed at query time:
///   - `Tile`: the static layout (what the maze IS). Never changes.
///   - `Item`: what lies on an open tile. Only Pickup/PowerPickup → Consumed.
///
/// `CellState` is the composed view every component reads. A template's
/// `Tile::Open` cells always carry an item once a grid is built, so the
/// composed view has no bare "open" state.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Wall,
    Open,
}

impl Tile {
    /// Can an entity occupy this tile?
    pub fn is_passable(self) -> bool {
        matches!(self, Tile::Open)
    }
}

/// Overlay for open tiles.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Item {
    Pickup,
    PowerPickup,
    Consumed,
}

impl Item {
    /// Does stepping here change anything?
    pub fn is_edible(self) -> bool {
        matches!(self, Item::Pickup | Item::PowerPickup)
    }
}

/// Effective state of a cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CellState {
    Wall,
    Pickup,
    PowerPickup,
    Consumed,
}

impl CellState {
    pub fn compose(tile: Tile, item: Item) -> Self {
        match (tile, item) {
            (Tile::Wall, _) => CellState::Wall,
            (Tile::Open, Item::Pickup) => CellState::Pickup,
            (Tile::Open, Item::PowerPickup) => CellState::PowerPickup,
            (Tile::Open, Item::Consumed) => CellState::Consumed,
        }
    }

    pub fn is_wall(self) -> bool {
        matches!(self, CellState::Wall)
    }
}
