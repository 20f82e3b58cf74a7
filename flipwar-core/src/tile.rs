//! Tile alphabet shared by the map format and the board state

use serde::{Deserialize, Serialize};

/// Player number, 1-based. Values range over `1..=MAX_PLAYERS`.
pub type PlayerId = u8;

/// Upper bound on the number of players in a game
pub const MAX_PLAYERS: usize = 8;

/// Content of a single board cell.
///
/// `Occupied` carries the owning player. Holes are permanent: once a cell is a
/// hole it never becomes anything else, so the number of occupiable cells is
/// fixed for the lifetime of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    Empty,
    Occupied(PlayerId),
    Choice,
    Inversion,
    Bonus,
    Expansion,
    Hole,
}

impl Tile {
    /// Decode a map-description symbol
    pub fn from_symbol(symbol: char) -> Option<Tile> {
        match symbol {
            '0' => Some(Tile::Empty),
            '1'..='8' => Some(Tile::Occupied(symbol as u8 - b'0')),
            'c' => Some(Tile::Choice),
            'i' => Some(Tile::Inversion),
            'b' => Some(Tile::Bonus),
            'x' => Some(Tile::Expansion),
            '-' => Some(Tile::Hole),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Tile::Empty => '0',
            Tile::Occupied(player) => (b'0' + player) as char,
            Tile::Choice => 'c',
            Tile::Inversion => 'i',
            Tile::Bonus => 'b',
            Tile::Expansion => 'x',
            Tile::Hole => '-',
        }
    }

    /// Owning player of a stone, `None` for everything else
    pub fn owner(self) -> Option<PlayerId> {
        match self {
            Tile::Occupied(player) => Some(player),
            _ => None,
        }
    }

    /// A cell a stone can be placed on without an override: empty or one of
    /// the reward tiles (which count as unoccupied until claimed)
    pub fn is_empty_like(self) -> bool {
        matches!(self, Tile::Empty | Tile::Choice | Tile::Inversion | Tile::Bonus)
    }

    /// Occupied by a player stone or an expansion marker
    pub fn is_occupied(self) -> bool {
        matches!(self, Tile::Occupied(_) | Tile::Expansion)
    }
}
