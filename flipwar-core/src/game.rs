//! Board state, map parsing, move generation and move execution

use crate::board::{Pos, SpecialTransition, Topology, NUM_DIRECTIONS};
use crate::eval;
use crate::moves::{BonusReward, Move, MoveKind};
use crate::tile::{PlayerId, Tile, MAX_PLAYERS};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

// ============================================================================
// ERRORS AND CANCELLATION
// ============================================================================

/// Map-description parse failure. Raised once at load time, never retried.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("map description is missing its header lines")]
    MissingHeader,

    #[error("line {line}: expected a number, found {text:?}")]
    BadNumber { line: usize, text: String },

    #[error("player count {0} is outside 2..=8")]
    PlayerCount(u64),

    #[error("map dimensions {width}x{height} are outside 1..=50")]
    Dimensions { width: u64, height: u64 },

    #[error("grid has fewer rows than the declared height")]
    MissingRows,

    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("unknown tile symbol {symbol:?} at column {x} of row {y}")]
    UnknownSymbol { symbol: char, x: usize, y: usize },

    #[error("malformed special transition line: {0:?}")]
    BadTransition(String),

    #[error("special transition endpoint out of range: {0:?}")]
    TransitionOutOfRange(String),
}

/// Executor verdict when a move's preconditions do not hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IllegalMove {
    #[error("player {0} is not part of this game")]
    UnknownPlayer(PlayerId),

    #[error("target ({}, {}) is outside the map", .0.x, .0.y)]
    OutOfBounds(Pos),

    #[error("move kind does not match the target tile")]
    KindMismatch,

    #[error("no override stones left")]
    NoOverrideStones,

    #[error("override move targets an unoccupied cell")]
    OverrideOnEmpty,

    #[error("move would not enclose any opposing stones")]
    NoEnclosure,

    #[error("no bombs left")]
    NoBombs,

    #[error("bomb targets a hole")]
    BombOnHole,
}

/// Cooperative cancellation signal, unwound by ordinary `?` propagation up to
/// the iterative-deepening driver and handled nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("search deadline crossed")]
pub struct SearchTimeout;

/// Wall-clock cutoff checked at the cooperative cancellation points
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.at
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }
}

// ============================================================================
// GAME CONFIGURATION
// ============================================================================

/// Game phase. The transition is one-way: once the elimination phase starts,
/// the building phase never resumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Building,
    Elimination,
}

/// Immutable per-game parameters, fixed at parse time and shared by every
/// board clone the search produces.
#[derive(Debug)]
pub struct GameConfig {
    pub player_count: u8,
    pub bomb_radius: u16,
    pub width: u8,
    pub height: u8,
    /// Number of non-hole cells; constant because holes are permanent
    pub occupiable_cells: u32,
    pub topology: Topology,
}

impl GameConfig {
    pub fn contains(&self, pos: Pos) -> bool {
        pos.x < self.width && pos.y < self.height
    }
}

// ============================================================================
// GAME STATE
// ============================================================================

/// Full game position (clone to simulate).
///
/// The grid stores physical stone identities; reads and writes go through the
/// ownership remap so that choice and inversion effects swap whole armies
/// without rewriting the grid. The weighted tile scores, frontier flags and
/// counters are maintained incrementally by `execute_move` and always match
/// what a full recomputation over the grid would produce during the building
/// phase.
#[derive(Clone, Debug)]
pub struct GameState {
    config: Arc<GameConfig>,
    grid: Box<[Tile]>,
    bombs: [u16; MAX_PLAYERS],
    override_stones: [u16; MAX_PLAYERS],
    active: [bool; MAX_PLAYERS],
    phase: Phase,
    /// Physical stone identity currently used by each player (1-based)
    stone_of: [PlayerId; MAX_PLAYERS + 1],
    /// Player currently using each physical stone identity (1-based)
    owner_of: [PlayerId; MAX_PLAYERS + 1],
    tile_scores: [i32; MAX_PLAYERS],
    frontier: Box<[bool]>,
    frontier_counts: [i32; MAX_PLAYERS],
    occupied_cells: u32,
}

impl GameState {
    // ========================================================================
    // PARSING
    // ========================================================================

    /// Build a game state from a textual map description:
    /// player count; initial override stones; bomb count and radius; height
    /// and width; the grid rows; optional `x1 y1 r1 <-> x2 y2 r2` lines.
    pub fn parse(text: &str) -> Result<GameState, ParseError> {
        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        if lines.len() < 4 {
            return Err(ParseError::MissingHeader);
        }

        let player_count = parse_number(lines[0], 1)?;
        if !(2..=MAX_PLAYERS as u64).contains(&player_count) {
            return Err(ParseError::PlayerCount(player_count));
        }
        let player_count = player_count as u8;

        let override_count = parse_number(lines[1], 2)? as u16;

        let mut bomb_line = lines[2].split_whitespace();
        let bomb_count = parse_number(bomb_line.next().unwrap_or(""), 3)? as u16;
        let bomb_radius = parse_number(bomb_line.next().unwrap_or(""), 3)? as u16;

        let mut dim_line = lines[3].split_whitespace();
        let height = parse_number(dim_line.next().unwrap_or(""), 4)?;
        let width = parse_number(dim_line.next().unwrap_or(""), 4)?;
        if !(1..=50).contains(&width) || !(1..=50).contains(&height) {
            return Err(ParseError::Dimensions { width, height });
        }
        let (width, height) = (width as u8, height as u8);

        if lines.len() < 4 + height as usize {
            return Err(ParseError::MissingRows);
        }

        let mut grid = vec![Tile::Hole; width as usize * height as usize].into_boxed_slice();
        for y in 0..height as usize {
            let row: Vec<&str> = lines[4 + y].split_whitespace().collect();
            if row.len() != width as usize {
                return Err(ParseError::RowWidth {
                    row: y,
                    found: row.len(),
                    expected: width as usize,
                });
            }
            for (x, symbol) in row.iter().enumerate() {
                let symbol = symbol.chars().next().unwrap_or(' ');
                grid[y * width as usize + x] =
                    Tile::from_symbol(symbol).ok_or(ParseError::UnknownSymbol { symbol, x, y })?;
            }
        }

        let mut specials = Vec::new();
        for line in &lines[4 + height as usize..] {
            if line.is_empty() {
                continue;
            }
            specials.push(parse_special_transition(line, width, height)?);
        }

        let occupiable_cells = grid.iter().filter(|t| **t != Tile::Hole).count() as u32;
        let topology = Topology::build(
            width,
            height,
            |pos| grid[pos.y as usize * width as usize + pos.x as usize] == Tile::Hole,
            &specials,
        );

        let config = Arc::new(GameConfig {
            player_count,
            bomb_radius,
            width,
            height,
            occupiable_cells,
            topology,
        });

        let mut identity = [0; MAX_PLAYERS + 1];
        for (i, slot) in identity.iter_mut().enumerate() {
            *slot = i as PlayerId;
        }

        let mut state = GameState {
            config,
            grid,
            bombs: [bomb_count; MAX_PLAYERS],
            override_stones: [override_count; MAX_PLAYERS],
            active: [true; MAX_PLAYERS],
            phase: Phase::Building,
            stone_of: identity,
            owner_of: identity,
            tile_scores: [0; MAX_PLAYERS],
            frontier: vec![false; width as usize * height as usize].into_boxed_slice(),
            frontier_counts: [0; MAX_PLAYERS],
            occupied_cells: 0,
        };

        for player in 1..=player_count {
            state.tile_scores[slot(player)] = eval::recompute_tile_score(&state, player);
        }
        for pos in state.positions() {
            let Some(owner) = state.tile_at(pos).owner() else {
                continue;
            };
            state.occupied_cells += 1;
            if state.has_empty_like_neighbour(pos, None) {
                let index = state.cell_index(pos);
                state.frontier[index] = true;
                state.frontier_counts[slot(owner)] += 1;
            }
        }

        Ok(state)
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn config(&self) -> &Arc<GameConfig> {
        &self.config
    }

    pub fn player_count(&self) -> u8 {
        self.config.player_count
    }

    pub fn width(&self) -> u8 {
        self.config.width
    }

    pub fn height(&self) -> u8 {
        self.config.height
    }

    pub fn bomb_radius(&self) -> u16 {
        self.config.bomb_radius
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Logical tile at `pos`: stones are reported as owned by the player
    /// currently using that stone identity
    pub fn tile_at(&self, pos: Pos) -> Tile {
        match self.grid[self.cell_index(pos)] {
            Tile::Occupied(stone) => Tile::Occupied(self.owner_of[stone as usize]),
            tile => tile,
        }
    }

    pub fn bombs(&self, player: PlayerId) -> u16 {
        self.bombs[slot(player)]
    }

    pub fn override_stones(&self, player: PlayerId) -> u16 {
        self.override_stones[slot(player)]
    }

    pub fn is_disqualified(&self, player: PlayerId) -> bool {
        !self.active[slot(player)]
    }

    /// Cached weighted sum of the player's occupied cells
    pub fn tile_score(&self, player: PlayerId) -> i32 {
        self.tile_scores[slot(player)]
    }

    pub fn is_frontier_stone(&self, pos: Pos) -> bool {
        self.frontier[self.cell_index(pos)]
    }

    pub fn frontier_count(&self, player: PlayerId) -> i32 {
        self.frontier_counts[slot(player)]
    }

    /// Cells currently occupied by player stones (expansion markers excluded)
    pub fn occupied_cells(&self) -> u32 {
        self.occupied_cells
    }

    pub fn occupiable_cells(&self) -> u32 {
        self.config.occupiable_cells
    }

    /// Fraction of occupiable cells currently occupied, in `0.0..=1.0`
    pub fn occupancy(&self) -> f64 {
        self.occupied_cells as f64 / self.config.occupiable_cells as f64
    }

    /// All cell positions in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Pos> {
        let (width, height) = (self.config.width, self.config.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| Pos::new(x, y)))
    }

    /// First non-disqualified player after `player` in turn order
    pub fn next_active_player(&self, player: PlayerId) -> PlayerId {
        let mut next = player;
        for _ in 0..self.config.player_count {
            next = if next >= self.config.player_count { 1 } else { next + 1 };
            if !self.is_disqualified(next) {
                return next;
            }
        }
        player
    }

    // ========================================================================
    // EXTERNAL GAME EVENTS
    // ========================================================================

    pub fn disqualify(&mut self, player: PlayerId) {
        self.active[slot(player)] = false;
    }

    pub fn start_elimination_phase(&mut self) {
        self.phase = Phase::Elimination;
    }

    /// Apply a move announced for another player, yielding the updated board.
    /// The caller keeps the original; an illegal announcement is surfaced.
    pub fn apply_announced_move(
        &self,
        mv: &Move,
        player: PlayerId,
    ) -> Result<GameState, IllegalMove> {
        let mut next = self.clone();
        next.execute_move(mv, player)?;
        Ok(next)
    }

    // ========================================================================
    // MOVE GENERATION
    // ========================================================================

    /// All legal moves for `player` in the current phase, or `None` when the
    /// player must be skipped this turn. With a deadline set, the scan aborts
    /// between grid rows once the deadline is crossed.
    pub fn legal_moves(
        &self,
        player: PlayerId,
        deadline: Option<&Deadline>,
    ) -> Result<Option<Vec<Move>>, SearchTimeout> {
        match self.phase {
            Phase::Building => self.building_moves(player, deadline),
            Phase::Elimination => self.elimination_moves(player, deadline),
        }
    }

    fn building_moves(
        &self,
        player: PlayerId,
        deadline: Option<&Deadline>,
    ) -> Result<Option<Vec<Move>>, SearchTimeout> {
        let mut moves = Vec::new();
        let override_available = self.override_stones(player) > 0;

        for y in 0..self.config.height {
            if deadline.is_some_and(Deadline::expired) {
                return Err(SearchTimeout);
            }
            for x in 0..self.config.width {
                let pos = Pos::new(x, y);
                let tile = self.tile_at(pos);
                if tile == Tile::Hole {
                    continue;
                }
                if tile.is_empty_like() {
                    let Some(flips) = self.enclosed_cells(pos, player) else {
                        continue;
                    };
                    match tile {
                        Tile::Empty | Tile::Inversion => {
                            moves.push(Move::with_flips(pos, MoveKind::Default, flips));
                        }
                        Tile::Bonus => {
                            moves.push(Move::with_flips(
                                pos,
                                MoveKind::Bonus { reward: BonusReward::ExtraOverride },
                                flips.clone(),
                            ));
                            moves.push(Move::with_flips(
                                pos,
                                MoveKind::Bonus { reward: BonusReward::ExtraBomb },
                                flips,
                            ));
                        }
                        Tile::Choice => {
                            for partner in 1..=self.config.player_count {
                                if !self.is_disqualified(partner) {
                                    moves.push(Move::with_flips(
                                        pos,
                                        MoveKind::Choice { partner },
                                        flips.clone(),
                                    ));
                                }
                            }
                        }
                        _ => unreachable!("empty-like tiles are exactly the four cases above"),
                    }
                } else if override_available {
                    // occupied by a stone or an expansion marker; expansion
                    // overrides need no enclosure
                    let flips = self.enclosed_cells(pos, player);
                    if flips.is_some() || tile == Tile::Expansion {
                        moves.push(Move::with_flips(
                            pos,
                            MoveKind::Override,
                            flips.unwrap_or_default(),
                        ));
                    }
                }
            }
        }

        Ok(if moves.is_empty() { None } else { Some(moves) })
    }

    fn elimination_moves(
        &self,
        player: PlayerId,
        deadline: Option<&Deadline>,
    ) -> Result<Option<Vec<Move>>, SearchTimeout> {
        if self.bombs(player) == 0 {
            return Ok(None);
        }

        let mut moves = Vec::new();
        for y in 0..self.config.height {
            if deadline.is_some_and(Deadline::expired) {
                return Err(SearchTimeout);
            }
            for x in 0..self.config.width {
                let pos = Pos::new(x, y);
                if self.tile_at(pos) != Tile::Hole {
                    moves.push(Move::new(pos, MoveKind::Bomb));
                }
            }
        }

        Ok(if moves.is_empty() { None } else { Some(moves) })
    }

    /// Cells a placement at `pos` by `player` would flip: in each of the 8
    /// directions, the maximal run of foreign stones and expansion markers is
    /// kept iff it is terminated by one of the player's own stones. Runs that
    /// reach an empty cell, a hole, the map boundary, or wrap back to the
    /// origin through special transitions are discarded.
    pub fn enclosed_cells(&self, pos: Pos, player: PlayerId) -> Option<Vec<Pos>> {
        let topo = &self.config.topology;
        let mut enclosed = Vec::new();

        for dir in 0..NUM_DIRECTIONS as u8 {
            let Some(first) = topo.step(pos, dir) else {
                continue;
            };
            if !self.occupied_by_other(first.pos, player) {
                continue;
            }

            let run_start = enclosed.len();
            enclosed.push(first.pos);
            let mut next = topo.step(first.pos, first.dir);
            loop {
                let Some(step) = next else {
                    enclosed.truncate(run_start);
                    break;
                };
                if step.pos == pos {
                    enclosed.truncate(run_start);
                    break;
                }
                let tile = self.tile_at(step.pos);
                if tile == Tile::Occupied(player) {
                    break;
                }
                if !tile.is_occupied() {
                    enclosed.truncate(run_start);
                    break;
                }
                enclosed.push(step.pos);
                next = topo.step(step.pos, step.dir);
            }
        }

        if enclosed.is_empty() {
            None
        } else {
            Some(enclosed)
        }
    }

    fn occupied_by_other(&self, pos: Pos, player: PlayerId) -> bool {
        match self.tile_at(pos) {
            Tile::Occupied(owner) => owner != player,
            Tile::Expansion => true,
            _ => false,
        }
    }

    // ========================================================================
    // MOVE EXECUTION
    // ========================================================================

    /// Copy the board and execute `mv`; `None` when the move is illegal
    pub fn simulate(&self, mv: &Move, player: PlayerId) -> Option<GameState> {
        let mut next = self.clone();
        next.execute_move(mv, player).ok()?;
        Some(next)
    }

    /// Execute `mv` for `player` in place, validating its preconditions and
    /// keeping every cached aggregate consistent
    pub fn execute_move(&mut self, mv: &Move, player: PlayerId) -> Result<(), IllegalMove> {
        if player == 0 || player > self.config.player_count {
            return Err(IllegalMove::UnknownPlayer(player));
        }
        if !self.config.contains(mv.target) {
            return Err(IllegalMove::OutOfBounds(mv.target));
        }

        if mv.kind == MoveKind::Bomb {
            return self.execute_bomb(mv.target, player);
        }

        let tile = self.tile_at(mv.target);
        match mv.kind {
            MoveKind::Default if !matches!(tile, Tile::Empty | Tile::Inversion) => {
                return Err(IllegalMove::KindMismatch);
            }
            MoveKind::Bonus { .. } if tile != Tile::Bonus => {
                return Err(IllegalMove::KindMismatch);
            }
            MoveKind::Choice { partner } => {
                if tile != Tile::Choice {
                    return Err(IllegalMove::KindMismatch);
                }
                if partner == 0 || partner > self.config.player_count {
                    return Err(IllegalMove::UnknownPlayer(partner));
                }
            }
            MoveKind::Override => {
                if self.override_stones(player) == 0 {
                    return Err(IllegalMove::NoOverrideStones);
                }
                if !tile.is_occupied() {
                    return Err(IllegalMove::OverrideOnEmpty);
                }
            }
            _ => {}
        }

        let flips = if mv.flips.is_empty() {
            self.enclosed_cells(mv.target, player).unwrap_or_default()
        } else {
            mv.flips.clone()
        };
        if flips.is_empty() && !(mv.kind == MoveKind::Override && tile == Tile::Expansion) {
            return Err(IllegalMove::NoEnclosure);
        }

        self.update_frontiers(mv.target, &flips, player);

        for &cell in &flips {
            let weight = eval::tile_weight(self.config.topology.class(cell));
            if let Some(previous) = self.tile_at(cell).owner() {
                self.tile_scores[slot(previous)] -= weight;
            }
            self.tile_scores[slot(player)] += weight;
            self.set_tile(cell, Tile::Occupied(player));
        }

        match mv.kind {
            MoveKind::Bonus { reward } => {
                match reward {
                    BonusReward::ExtraBomb => self.bombs[slot(player)] += 1,
                    BonusReward::ExtraOverride => self.override_stones[slot(player)] += 1,
                }
                self.place_stone(mv.target, player);
            }
            MoveKind::Choice { partner } => {
                self.place_stone(mv.target, player);
                self.swap_stones(player, partner);
            }
            MoveKind::Override => {
                self.override_stones[slot(player)] -= 1;
                self.place_stone(mv.target, player);
            }
            MoveKind::Default => {
                let inversion = tile == Tile::Inversion;
                self.place_stone(mv.target, player);
                if inversion {
                    self.rotate_all_stones();
                }
            }
            MoveKind::Bomb => unreachable!("bomb moves are handled above"),
        }

        Ok(())
    }

    /// Claim the target cell for `player`, moving the cached score and the
    /// occupancy counter along
    fn place_stone(&mut self, pos: Pos, player: PlayerId) {
        let tile = self.tile_at(pos);
        let weight = eval::tile_weight(self.config.topology.class(pos));
        if let Some(previous) = tile.owner() {
            self.tile_scores[slot(previous)] -= weight;
        }
        self.tile_scores[slot(player)] += weight;
        if tile.is_empty_like() || tile == Tile::Expansion {
            self.occupied_cells += 1;
        }
        self.set_tile(pos, Tile::Occupied(player));
    }

    /// Swap the stone identities of two players. Existing stones on the grid
    /// change meaning without being rewritten; the cached per-player score and
    /// frontier aggregates swap with them.
    fn swap_stones(&mut self, a: PlayerId, b: PlayerId) {
        let stone_a = self.stone_of[a as usize];
        let stone_b = self.stone_of[b as usize];
        self.stone_of[a as usize] = stone_b;
        self.stone_of[b as usize] = stone_a;
        self.owner_of[stone_b as usize] = a;
        self.owner_of[stone_a as usize] = b;
        self.tile_scores.swap(slot(a), slot(b));
        self.frontier_counts.swap(slot(a), slot(b));
    }

    /// Inversion effect: every player's stones pass to the next player number,
    /// realized as a chain of pairwise swaps from player 1 upward
    fn rotate_all_stones(&mut self) {
        for other in 2..=self.config.player_count {
            self.swap_stones(1, other);
        }
    }

    fn execute_bomb(&mut self, target: Pos, player: PlayerId) -> Result<(), IllegalMove> {
        if self.bombs(player) == 0 {
            return Err(IllegalMove::NoBombs);
        }
        if self.tile_at(target) == Tile::Hole {
            return Err(IllegalMove::BombOnHole);
        }
        self.bombs[slot(player)] -= 1;

        // Breadth-first flood over the transition table, `bomb_radius` steps
        // out from the target. Cleared cells keep their stale score/frontier
        // bookkeeping; holes carry none and the building-phase aggregates are
        // meaningless once bombs fly.
        let mut hit: Vec<Pos> = vec![target];
        let mut seen: FxHashSet<Pos> = FxHashSet::default();
        seen.insert(target);
        let mut ring = vec![target];
        for _ in 0..self.config.bomb_radius {
            let mut next_ring = Vec::new();
            for &pos in &ring {
                for dir in 0..NUM_DIRECTIONS as u8 {
                    let Some(step) = self.config.topology.step(pos, dir) else {
                        continue;
                    };
                    if self.tile_at(step.pos) != Tile::Hole && seen.insert(step.pos) {
                        hit.push(step.pos);
                        next_ring.push(step.pos);
                    }
                }
            }
            ring = next_ring;
        }

        for &pos in &hit {
            self.set_tile(pos, Tile::Hole);
        }
        Ok(())
    }

    // ========================================================================
    // FRONTIER BOOKKEEPING
    // ========================================================================

    /// Re-establish the frontier invariant for a placement at `target`
    /// flipping `flips`. Must run before the grid is touched: it reads the
    /// pre-move owners, while accounting for the target cell ceasing to be
    /// empty-like.
    fn update_frontiers(&mut self, target: Pos, flips: &[Pos], player: PlayerId) {
        let target_tile = self.tile_at(target);
        let target_index = self.cell_index(target);

        if self.frontier[target_index] {
            // an overridden frontier stone stays a frontier, owned by the mover
            if let Some(previous) = target_tile.owner() {
                self.frontier_counts[slot(previous)] -= 1;
                self.frontier_counts[slot(player)] += 1;
            }
        } else if self.has_empty_like_neighbour(target, None) {
            self.frontier[target_index] = true;
            self.frontier_counts[slot(player)] += 1;
        }

        // Neighbours whose only empty-like neighbour was the target lose
        // their frontier status; only relevant when the target itself stops
        // being empty-like.
        if target_tile.is_empty_like() {
            for dir in 0..NUM_DIRECTIONS as u8 {
                let Some(step) = self.config.topology.step(target, dir) else {
                    continue;
                };
                let index = self.cell_index(step.pos);
                if !self.frontier[index] || self.has_empty_like_neighbour(step.pos, Some(target)) {
                    continue;
                }
                self.frontier[index] = false;
                if let Some(owner) = self.tile_at(step.pos).owner() {
                    self.frontier_counts[slot(owner)] -= 1;
                }
            }
        }

        // Flipped frontier stones keep their flag but change hands. Runs from
        // different directions can overlap through special transitions, so
        // each cell is transferred at most once.
        let mut transferred: FxHashSet<Pos> = FxHashSet::default();
        for &cell in flips {
            if transferred.insert(cell) && self.frontier[self.cell_index(cell)] {
                if let Some(previous) = self.tile_at(cell).owner() {
                    self.frontier_counts[slot(previous)] -= 1;
                    self.frontier_counts[slot(player)] += 1;
                }
            }
        }
    }

    fn has_empty_like_neighbour(&self, pos: Pos, ignored: Option<Pos>) -> bool {
        (0..NUM_DIRECTIONS as u8).any(|dir| {
            self.config.topology.step(pos, dir).is_some_and(|step| {
                Some(step.pos) != ignored && self.tile_at(step.pos).is_empty_like()
            })
        })
    }

    // ========================================================================
    // GRID PRIMITIVES
    // ========================================================================

    /// Write a logical tile; stones are translated to the physical identity
    /// the player currently uses
    fn set_tile(&mut self, pos: Pos, tile: Tile) {
        let stored = match tile {
            Tile::Occupied(player) => Tile::Occupied(self.stone_of[player as usize]),
            other => other,
        };
        let index = self.cell_index(pos);
        self.grid[index] = stored;
    }

    fn cell_index(&self, pos: Pos) -> usize {
        debug_assert!(self.config.contains(pos), "position {pos:?} is outside the map");
        pos.y as usize * self.config.width as usize + pos.x as usize
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for x in 0..self.config.width {
            write!(f, "{x:>3}")?;
        }
        writeln!(f)?;
        write!(f, "  /")?;
        for _ in 0..self.config.width {
            write!(f, "---")?;
        }
        writeln!(f)?;
        for y in 0..self.config.height {
            write!(f, "{y:<2}|")?;
            for x in 0..self.config.width {
                write!(f, "  {}", self.tile_at(Pos::new(x, y)).symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[inline]
fn slot(player: PlayerId) -> usize {
    player as usize - 1
}

fn parse_number(text: &str, line: usize) -> Result<u64, ParseError> {
    text.parse().map_err(|_| ParseError::BadNumber {
        line,
        text: text.to_string(),
    })
}

/// Parse one `x1 y1 r1 <-> x2 y2 r2` line
fn parse_special_transition(
    line: &str,
    width: u8,
    height: u8,
) -> Result<SpecialTransition, ParseError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 7 || tokens[3] != "<->" {
        return Err(ParseError::BadTransition(line.to_string()));
    }
    let mut numbers = [0u64; 6];
    for (number, token) in numbers
        .iter_mut()
        .zip(tokens.iter().copied().filter(|&t| t != "<->"))
    {
        *number = token
            .parse()
            .map_err(|_| ParseError::BadTransition(line.to_string()))?;
    }
    let [x1, y1, r1, x2, y2, r2] = numbers;
    if x1 >= width as u64
        || x2 >= width as u64
        || y1 >= height as u64
        || y2 >= height as u64
        || r1 >= 8
        || r2 >= 8
    {
        return Err(ParseError::TransitionOutOfRange(line.to_string()));
    }
    Ok(SpecialTransition {
        a: Pos::new(x1 as u8, y1 as u8),
        dir_a: r1 as u8,
        b: Pos::new(x2 as u8, y2 as u8),
        dir_b: r2 as u8,
    })
}
