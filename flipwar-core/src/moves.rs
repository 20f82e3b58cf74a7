//! Candidate moves and their identity

use crate::board::Pos;
use crate::tile::PlayerId;
use serde::{Deserialize, Serialize};

/// Reward picked when claiming a bonus tile
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BonusReward {
    ExtraOverride,
    ExtraBomb,
}

/// What a move does, with its kind-specific payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveKind {
    /// Place a stone on an empty or inversion cell
    Default,
    /// Spend an override stone to capture an occupied cell or expansion marker
    Override,
    /// Claim a choice tile and swap stone identities with `partner`
    Choice { partner: PlayerId },
    /// Claim a bonus tile and collect `reward`
    Bonus { reward: BonusReward },
    /// Elimination phase: blast a cell and its surroundings into holes
    Bomb,
}

/// One candidate action.
///
/// Two moves are equal iff target and kind (with payload) agree; the
/// precomputed flip list and the search's value annotation are carried along
/// but take no part in identity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Move {
    pub target: Pos,
    pub kind: MoveKind,
    /// Cells this move flips, as computed against the board it was generated
    /// for. Empty when not precomputed; the executor then recomputes.
    pub flips: Vec<Pos>,
    /// Value assigned by the search once the move has been evaluated
    pub value: i32,
}

impl Move {
    pub fn new(target: Pos, kind: MoveKind) -> Self {
        Self {
            target,
            kind,
            flips: Vec::new(),
            value: 0,
        }
    }

    pub fn with_flips(target: Pos, kind: MoveKind, flips: Vec<Pos>) -> Self {
        Self {
            target,
            kind,
            flips,
            value: 0,
        }
    }
}

impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target && self.kind == other.kind
    }
}

impl Eq for Move {}
