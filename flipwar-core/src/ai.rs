//! Adversarial search: paranoid minimax and alpha-beta with iterative
//! deepening, timeout fallbacks and experimental aspiration windows

use crate::eval;
use crate::game::{Deadline, GameState, Phase, SearchTimeout};
use crate::moves::{Move, MoveKind};
use crate::tile::PlayerId;
use std::cmp::Reverse;
use std::time::{Duration, Instant};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Hard cap on iterative deepening, also the implicit depth limit when a move
/// request carries none
pub const MAX_SEARCH_DEPTH: usize = 100;

/// Implicit time limit when a move request carries none
pub const DEFAULT_TIME_LIMIT_MS: u64 = 10_000;

/// Fixed slack subtracted from every deadline so the reply leaves the process
/// before the request expires
const SAFETY_MARGIN_MS: u64 = 1_000;

/// Fraction of the time limit the search may actually consume, in percent
const TIME_BUDGET_PERCENT: u64 = 99;

/// Depth from which pre-sorting the move list pays for itself
const MOVE_SORTING_MIN_DEPTH: usize = 3;

/// Narrowest aspiration window half-width
const MIN_ASPIRATION_SPREAD: i32 = 1_000;

// ============================================================================
// OPTIONS AND STATISTICS
// ============================================================================

/// Search configuration.
///
/// `aspiration_windows` and `opposite_bound_pruning` buy speed under tight
/// budgets by pruning branches classic alpha-beta must keep; with either
/// enabled the chosen move is no longer guaranteed optimal for the searched
/// depth. Both stay off by default.
#[derive(Clone, Debug)]
pub struct SearchOptions {
    /// Alpha-beta pruning; plain minimax when disabled
    pub pruning: bool,
    /// Pre-sort moves at depth 3 and above to tighten the window early
    pub move_sorting: bool,
    /// Unsound: start each depth with a window seeded from the previous one
    pub aspiration_windows: bool,
    /// Unsound: also cut a branch when its value crosses the opposite bound
    pub opposite_bound_pruning: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            pruning: true,
            move_sorting: true,
            aspiration_windows: false,
            opposite_bound_pruning: false,
        }
    }
}

/// Counters kept across a game for post-game analysis
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchStats {
    /// Leaf states scored by the heuristic
    pub evaluated_states: u64,
    /// Searches cut short by the deadline
    pub timeouts: u32,
    /// Depths never entered because the previous run of that depth would not
    /// have fit the remaining budget
    pub estimation_aborts: u32,
}

// ============================================================================
// ENGINE
// ============================================================================

/// Move chooser for one game.
///
/// Holds the per-depth durations observed so far: before entering a depth the
/// engine compares that depth's last duration against the remaining budget
/// and gives up deepening when it would not fit. The table resets when the
/// game transitions into the elimination phase, where move counts change
/// completely.
pub struct Engine {
    options: SearchOptions,
    depth_times: [u64; MAX_SEARCH_DEPTH],
    last_phase: Option<Phase>,
    stats: SearchStats,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(SearchOptions::default())
    }
}

impl Engine {
    pub fn new(options: SearchOptions) -> Self {
        Self {
            options,
            depth_times: [0; MAX_SEARCH_DEPTH],
            last_phase: None,
            stats: SearchStats::default(),
        }
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Pick a move for `player` within `time_limit_ms` and `depth_limit`
    /// (zero selects the implicit defaults). Returns `None` only when the
    /// player has no legal move at all.
    ///
    /// Deepens iteratively from depth 1; on timeout the best move of the last
    /// completed depth is returned, or the first legal move when not even
    /// depth 1 finished.
    pub fn choose_move(
        &mut self,
        state: &GameState,
        player: PlayerId,
        time_limit_ms: u64,
        depth_limit: u8,
    ) -> Option<Move> {
        let time_limit = if time_limit_ms == 0 {
            DEFAULT_TIME_LIMIT_MS
        } else {
            time_limit_ms
        };
        let depth_limit = if depth_limit == 0 {
            MAX_SEARCH_DEPTH
        } else {
            (depth_limit as usize).min(MAX_SEARCH_DEPTH)
        };

        if self.last_phase != Some(state.phase()) {
            self.depth_times = [0; MAX_SEARCH_DEPTH];
            self.last_phase = Some(state.phase());
        }

        let budget = (time_limit * TIME_BUDGET_PERCENT / 100).saturating_sub(SAFETY_MARGIN_MS);
        let deadline = Deadline::after(Duration::from_millis(budget));

        tracing::info!(player, time_limit, depth_limit, "move request");

        let mut best: Option<Move> = None;
        for depth in 1..=depth_limit {
            let remaining = deadline.remaining().as_millis() as u64;
            if depth > 1 && self.depth_times[depth - 1] > remaining {
                self.stats.estimation_aborts += 1;
                tracing::debug!(
                    depth,
                    remaining_ms = remaining,
                    last_ms = self.depth_times[depth - 1],
                    "previous run of this depth outgrows the budget, stopping"
                );
                break;
            }

            let started = Instant::now();
            let result = match &best {
                Some(prev) if self.options.aspiration_windows => {
                    self.search_with_aspiration(state, player, depth, prev.value, &deadline)
                }
                _ => self.search_at_depth(state, player, depth, i32::MIN, i32::MAX, &deadline),
            };
            let elapsed = started.elapsed().as_millis() as u64;
            self.depth_times[depth - 1] = elapsed;

            match result {
                Ok(None) => return None,
                Ok(Some(mv)) => {
                    tracing::debug!(
                        depth,
                        value = mv.value,
                        elapsed_ms = elapsed,
                        states = self.stats.evaluated_states,
                        "depth completed"
                    );
                    best = Some(mv);
                }
                Err(SearchTimeout) => {
                    self.stats.timeouts += 1;
                    tracing::debug!(depth, "deadline crossed, using last completed depth");
                    break;
                }
            }
        }

        best.or_else(|| {
            tracing::debug!("no depth completed in time, falling back to the first legal move");
            first_move(state, player)
        })
    }

    /// One depth with a window seeded from the previous depth's value. When
    /// the window turns out too narrow the depth is re-searched at full
    /// width, so this costs time in the worst case and saves it on average.
    fn search_with_aspiration(
        &mut self,
        state: &GameState,
        player: PlayerId,
        depth: usize,
        prev_value: i32,
        deadline: &Deadline,
    ) -> Result<Option<Move>, SearchTimeout> {
        let spread = ((prev_value.unsigned_abs() as u64 * 3 / 4) as i32).max(MIN_ASPIRATION_SPREAD);
        let alpha = prev_value.saturating_sub(spread);
        let beta = prev_value.saturating_add(spread);
        tracing::debug!(depth, alpha, beta, "aspiration window");

        match self.search_at_depth(state, player, depth, alpha, beta, deadline)? {
            Some(mv) if mv.value > alpha && mv.value < beta => Ok(Some(mv)),
            _ => {
                tracing::debug!(depth, "aspiration window missed, re-searching at full width");
                self.search_at_depth(state, player, depth, i32::MIN, i32::MAX, deadline)
            }
        }
    }

    fn search_at_depth(
        &mut self,
        state: &GameState,
        player: PlayerId,
        depth: usize,
        alpha: i32,
        beta: i32,
        deadline: &Deadline,
    ) -> Result<Option<Move>, SearchTimeout> {
        if self.options.pruning {
            self.alpha_beta_root(state, player, depth, alpha, beta, deadline)
        } else {
            self.minimax_root(state, player, depth, deadline)
        }
    }

    // ========================================================================
    // ALPHA-BETA
    // ========================================================================

    fn alpha_beta_root(
        &mut self,
        state: &GameState,
        player: PlayerId,
        depth: usize,
        mut alpha: i32,
        beta: i32,
        deadline: &Deadline,
    ) -> Result<Option<Move>, SearchTimeout> {
        if deadline.expired() {
            return Err(SearchTimeout);
        }
        let Some(mut moves) = state.legal_moves(player, Some(deadline))? else {
            return Ok(None);
        };
        if depth >= MOVE_SORTING_MIN_DEPTH && self.options.move_sorting {
            moves.sort_by_key(|mv| Reverse(ordering_score(mv)));
        }

        let next = state.next_active_player(player);
        let mut best: Option<Move> = None;
        for mut mv in moves {
            let child = state
                .simulate(&mv, player)
                .expect("move generator and executor disagree on a legal move");
            let value =
                self.alpha_beta_value(&child, player, next, depth as i32 - 1, alpha, beta, deadline)?;
            if value > alpha {
                alpha = value;
            }
            if best.as_ref().map_or(true, |b| value > b.value) {
                mv.value = value;
                best = Some(mv);
            }
        }
        Ok(best)
    }

    /// Paranoid alpha-beta: `player`'s own plies maximize, every other ply
    /// minimizes on their behalf. A player without moves is skipped to the
    /// next active player, still consuming a depth step.
    fn alpha_beta_value(
        &mut self,
        state: &GameState,
        player: PlayerId,
        current: PlayerId,
        depth: i32,
        mut alpha: i32,
        mut beta: i32,
        deadline: &Deadline,
    ) -> Result<i32, SearchTimeout> {
        if deadline.expired() {
            return Err(SearchTimeout);
        }
        if depth <= 0 {
            self.stats.evaluated_states += 1;
            return Ok(eval::evaluate(state, player));
        }

        let moves = state.legal_moves(current, Some(deadline))?;
        let next = state.next_active_player(current);
        let Some(mut moves) = moves else {
            return self.alpha_beta_value(state, player, next, depth - 1, alpha, beta, deadline);
        };

        let maximizing = current == player;
        if depth >= MOVE_SORTING_MIN_DEPTH as i32 && self.options.move_sorting {
            if maximizing {
                moves.sort_by_key(|mv| Reverse(ordering_score(mv)));
            } else {
                moves.sort_by_key(ordering_score);
            }
        }

        let mut best: Option<i32> = None;
        for mv in &moves {
            let child = state
                .simulate(mv, current)
                .expect("move generator and executor disagree on a legal move");
            let value =
                self.alpha_beta_value(&child, player, next, depth - 1, alpha, beta, deadline)?;
            if maximizing {
                if best.map_or(true, |b| value > b) {
                    best = Some(value);
                }
                if value > beta || (self.options.opposite_bound_pruning && value < alpha) {
                    break;
                }
                if value > alpha {
                    alpha = value;
                }
            } else {
                if best.map_or(true, |b| value < b) {
                    best = Some(value);
                }
                if value < alpha || (self.options.opposite_bound_pruning && value > beta) {
                    break;
                }
                if value < beta {
                    beta = value;
                }
            }
        }
        Ok(best.expect("legal_moves never yields an empty list"))
    }

    // ========================================================================
    // MINIMAX
    // ========================================================================

    fn minimax_root(
        &mut self,
        state: &GameState,
        player: PlayerId,
        depth: usize,
        deadline: &Deadline,
    ) -> Result<Option<Move>, SearchTimeout> {
        if deadline.expired() {
            return Err(SearchTimeout);
        }
        let Some(moves) = state.legal_moves(player, Some(deadline))? else {
            return Ok(None);
        };

        let next = state.next_active_player(player);
        let mut best: Option<Move> = None;
        for mut mv in moves {
            let child = state
                .simulate(&mv, player)
                .expect("move generator and executor disagree on a legal move");
            let value = self.minimax_value(&child, player, next, depth as i32 - 1, deadline)?;
            if best.as_ref().map_or(true, |b| value > b.value) {
                mv.value = value;
                best = Some(mv);
            }
        }
        Ok(best)
    }

    /// Paranoid minimax, the reference the pruned search must agree with
    fn minimax_value(
        &mut self,
        state: &GameState,
        player: PlayerId,
        current: PlayerId,
        depth: i32,
        deadline: &Deadline,
    ) -> Result<i32, SearchTimeout> {
        if deadline.expired() {
            return Err(SearchTimeout);
        }
        if depth <= 0 {
            self.stats.evaluated_states += 1;
            return Ok(eval::evaluate(state, player));
        }

        let moves = state.legal_moves(current, Some(deadline))?;
        let next = state.next_active_player(current);
        let Some(moves) = moves else {
            return self.minimax_value(state, player, next, depth - 1, deadline);
        };

        let maximizing = current == player;
        let mut best: Option<i32> = None;
        for mv in &moves {
            let child = state
                .simulate(mv, current)
                .expect("move generator and executor disagree on a legal move");
            let value = self.minimax_value(&child, player, next, depth - 1, deadline)?;
            let better = match best {
                None => true,
                Some(b) => {
                    if maximizing {
                        value > b
                    } else {
                        value < b
                    }
                }
            };
            if better {
                best = Some(value);
            }
        }
        Ok(best.expect("legal_moves never yields an empty list"))
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// First legal move in scan order, the last-resort answer when the deadline
/// fires before any depth completes
pub fn first_move(state: &GameState, player: PlayerId) -> Option<Move> {
    state
        .legal_moves(player, None)
        .unwrap_or(None)
        .and_then(|moves| moves.into_iter().next())
}

/// Static pre-score for move ordering: choice swaps branch first, override
/// moves last
fn ordering_score(mv: &Move) -> i32 {
    match mv.kind {
        MoveKind::Choice { .. } => 1,
        MoveKind::Override => -1,
        _ => 0,
    }
}

// ============================================================================
// TESTS
// ============================================================================
