//! Position evaluation, one heuristic per game phase

use crate::board::CellClass;
use crate::game::{GameState, Phase};
use crate::tile::{PlayerId, Tile, MAX_PLAYERS};

// ============================================================================
// BUILDING-PHASE WEIGHTS
// ============================================================================

/// Rating of an occupied default cell. Anchor value: every other rating in
/// this module is expressed relative to it.
pub const RATING_DEFAULT_CELL: i32 = 100;

/// Rating of an occupied corner cell (at most 3 neighbours)
pub const RATING_CORNER_CELL: i32 = 500;

/// Rating of an occupied edge cell (4 or 5 neighbours)
pub const RATING_EDGE_CELL: i32 = 150;

/// Rating per frontier stone. Negative: a stone with empty neighbours can
/// still be flipped, so exposed stones are a liability. Must stay small next
/// to the cell ratings or owning stones at all gets punished.
pub const RATING_FRONTIER_STONE: i32 = -25;

/// Rating for each override stone still in hand
pub const RATING_OVERRIDE_AVAILABLE: i32 = 1000;

/// Rating for each bomb still in hand. Only relevant while building; in the
/// elimination phase bombs are spent every turn anyway.
pub const RATING_BOMB_AVAILABLE: i32 = 900;

/// Bounds for the occupancy-dependent blend between cell score and frontier
/// score. At 0% occupancy the cell score weighs `MIN` (and the frontier score
/// `100 - MIN`); at 100% it weighs `MAX`.
pub const OCCUPANCY_WEIGHT_MIN: i32 = 20;
pub const OCCUPANCY_WEIGHT_MAX: i32 = 100;

// ============================================================================
// ELIMINATION-PHASE WEIGHTS
// ============================================================================

/// Weight of our own stone count
pub const ELIM_OWN_STONES: i32 = 120;

/// Base weight for the stones of the player ranked directly above us
pub const ELIM_RIVAL: i32 = -100;

/// Per-rank softening for players further ahead of us
pub const ELIM_AHEAD_STEP: i32 = 10;

/// Per-rank softening for players behind us
pub const ELIM_BEHIND_STEP: i32 = 20;

// ============================================================================
// EVALUATION
// ============================================================================

/// Weight of one occupied cell by its classification. Single source of truth
/// for both the incremental score updates and the full recomputation.
pub fn tile_weight(class: CellClass) -> i32 {
    match class {
        CellClass::Default => RATING_DEFAULT_CELL,
        CellClass::Corner => RATING_CORNER_CELL,
        CellClass::Edge => RATING_EDGE_CELL,
    }
}

/// Rate `state` from `player`'s perspective with the heuristic of the current
/// phase
pub fn evaluate(state: &GameState, player: PlayerId) -> i32 {
    match state.phase() {
        Phase::Building => evaluate_building(state, player),
        Phase::Elimination => evaluate_elimination(state, player),
    }
}

/// Building phase: blend the cached weighted cell score against the frontier
/// liability, shifting towards raw territory as the map fills up, and value
/// unspent override stones and bombs.
pub fn evaluate_building(state: &GameState, player: PlayerId) -> i32 {
    let cell_score = state.tile_score(player);
    let frontier_score = state.frontier_count(player) * RATING_FRONTIER_STONE;
    let occupancy_weight = occupancy_weight(state);

    cell_score * occupancy_weight
        + frontier_score * (100 - occupancy_weight)
        + state.override_stones(player) as i32 * RATING_OVERRIDE_AVAILABLE
        + state.bombs(player) as i32 * RATING_BOMB_AVAILABLE
}

fn occupancy_weight(state: &GameState) -> i32 {
    OCCUPANCY_WEIGHT_MIN
        + (state.occupancy() * (OCCUPANCY_WEIGHT_MAX - OCCUPANCY_WEIGHT_MIN) as f64) as i32
}

/// Elimination phase: rank every active player by stone count and weigh their
/// stones against ours, hardest for the players closest to our rank. The
/// penalty softens with rank distance but never crosses zero; disqualified
/// players contribute nothing.
pub fn evaluate_elimination(state: &GameState, player: PlayerId) -> i32 {
    let players = state.player_count() as usize;
    let mut counts = [0i32; MAX_PLAYERS];
    for pos in state.positions() {
        if let Tile::Occupied(owner) = state.tile_at(pos) {
            counts[owner as usize - 1] += 1;
        }
    }

    let ours = counts[player as usize - 1];
    for p in 1..=state.player_count() {
        if state.is_disqualified(p) {
            counts[p as usize - 1] = 0;
        }
    }

    let counts = &mut counts[..players];
    counts.sort_unstable();

    // our rank: the number of players with strictly fewer stones (ties count
    // as ranked above us)
    let mut rank = players;
    while rank > 0 && ours <= counts[rank - 1] {
        rank -= 1;
    }

    let mut sum = ours * ELIM_OWN_STONES;
    for (step, index) in (rank + 1..players).enumerate() {
        let factor = (ELIM_RIVAL + step as i32 * ELIM_AHEAD_STEP).min(0);
        sum += counts[index] * factor;
    }
    for step in 1..=rank {
        let factor = (ELIM_RIVAL + step as i32 * ELIM_BEHIND_STEP).min(0);
        sum += counts[rank - step] * factor;
    }
    sum
}

/// Weighted cell score recomputed from scratch by one full grid pass. The
/// cached incremental score must always agree with this during the building
/// phase.
pub fn recompute_tile_score(state: &GameState, player: PlayerId) -> i32 {
    state
        .positions()
        .filter(|&pos| state.tile_at(pos) == Tile::Occupied(player))
        .map(|pos| tile_weight(state.config().topology.class(pos)))
        .sum()
}
