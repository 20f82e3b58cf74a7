//! FLIPWAR Core - Game engine and AI
//!
//! This crate is the decision engine of an autonomous player for a
//! multiplayer tile-flipping territory game on an irregular, wrap-capable
//! grid:
//! - Board geometry (8-direction adjacency with map-defined special
//!   transitions)
//! - Tile model, ownership remapping and incremental score/frontier
//!   bookkeeping
//! - Legal-move generation for the building and elimination phases
//! - Move execution and simulation
//! - Phase-specific position evaluation
//! - Paranoid minimax / alpha-beta search with iterative deepening
//!
//! The wire protocol that feeds it board snapshots and move requests lives
//! outside this crate; the surface it needs is [`GameState::parse`],
//! [`Engine::choose_move`] and [`GameState::apply_announced_move`].

pub mod ai;
pub mod board;
pub mod eval;
pub mod game;
pub mod moves;
pub mod tile;

// Re-exports for convenient access
pub use ai::{first_move, Engine, SearchOptions, SearchStats, MAX_SEARCH_DEPTH};
pub use board::{CellClass, Pos, SpecialTransition, Step, Topology, NUM_DIRECTIONS, OFFSETS};
pub use game::{
    Deadline, GameConfig, GameState, IllegalMove, ParseError, Phase, SearchTimeout,
};
pub use moves::{BonusReward, Move, MoveKind};
pub use tile::{PlayerId, Tile, MAX_PLAYERS};
