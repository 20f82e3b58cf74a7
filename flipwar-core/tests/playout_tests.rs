//! Randomized playouts checking that the incrementally maintained board
//! aggregates stay equal to a full recomputation after every executed move

use flipwar_core::{eval, GameState, MoveKind, Pos, Tile, NUM_DIRECTIONS};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

const COURSE_MAP: &str = "3\n\
    6\n\
    4 2\n\
    15 15\n\
    - - - - - 0 0 0 0 0 - - - - -\n\
    - - - - - 0 0 0 0 0 - - - - -\n\
    - - - - - 0 0 0 0 0 - - - - -\n\
    - - - - - 0 0 0 i 0 - - - - -\n\
    - - - - - 0 0 0 0 0 - - - - -\n\
    0 0 0 0 0 0 0 0 0 0 0 0 0 0 0\n\
    0 c 0 0 0 0 1 2 3 0 i 0 0 0 0\n\
    0 0 0 0 0 0 3 1 2 0 0 0 0 0 0\n\
    0 0 0 b 0 0 2 3 1 0 0 0 0 0 0\n\
    0 0 0 0 0 0 0 0 0 0 0 0 b 0 0\n\
    - - - - - 0 0 x 0 0 - - - - -\n\
    - - - - - 0 x x x 0 - - - - -\n\
    - - - - - 0 0 x c 0 - - - - -\n\
    - - - - - 0 0 0 0 0 - - - - -\n\
    - - - - - 0 0 0 0 0 - - - - -\n\
    6 0 0 <-> 9 1 1\n\
    7 14 4 <-> 7 0 0";

fn has_empty_like_neighbour(state: &GameState, pos: Pos) -> bool {
    (0..NUM_DIRECTIONS as u8).any(|dir| {
        state
            .config()
            .topology
            .step(pos, dir)
            .is_some_and(|step| state.tile_at(step.pos).is_empty_like())
    })
}

/// Check every cached aggregate against a from-scratch recomputation
fn assert_aggregates_consistent(state: &GameState, context: &str) {
    for player in 1..=state.player_count() {
        assert_eq!(
            state.tile_score(player),
            eval::recompute_tile_score(state, player),
            "cached tile score of player {player} diverged {context}"
        );
    }

    let mut frontier_counts = vec![0i32; state.player_count() as usize];
    let mut occupied = 0u32;
    for pos in state.positions() {
        let owner = state.tile_at(pos).owner();
        let expect_frontier = owner.is_some() && has_empty_like_neighbour(state, pos);
        assert_eq!(
            state.is_frontier_stone(pos),
            expect_frontier,
            "frontier flag at ({}, {}) diverged {context}",
            pos.x,
            pos.y
        );
        if let Some(owner) = owner {
            occupied += 1;
            if expect_frontier {
                frontier_counts[owner as usize - 1] += 1;
            }
        }
    }
    for player in 1..=state.player_count() {
        assert_eq!(
            state.frontier_count(player),
            frontier_counts[player as usize - 1],
            "frontier count of player {player} diverged {context}"
        );
    }
    assert_eq!(state.occupied_cells(), occupied, "occupied counter diverged {context}");
}

#[test]
fn test_building_playouts_keep_aggregates_consistent() {
    for seed in [7, 1312, 90125] {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut state = GameState::parse(COURSE_MAP).unwrap();
        assert_aggregates_consistent(&state, "after parsing");

        let mut player = 1;
        let mut skips = 0;
        for turn in 0..80 {
            match state.legal_moves(player, None).unwrap() {
                None => {
                    skips += 1;
                    if skips >= state.player_count() {
                        break;
                    }
                }
                Some(moves) => {
                    skips = 0;
                    let mv = moves.choose(&mut rng).unwrap();
                    state.execute_move(mv, player).unwrap();
                    assert_aggregates_consistent(
                        &state,
                        &format!("after turn {turn} of seed {seed} ({:?})", mv.kind),
                    );
                }
            }
            player = state.next_active_player(player);
        }
    }
}

#[test]
fn test_simulation_never_touches_the_source_board() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let state = GameState::parse(COURSE_MAP).unwrap();
    let reference: Vec<Tile> = state.positions().map(|p| state.tile_at(p)).collect();

    for player in 1..=state.player_count() {
        let moves = state.legal_moves(player, None).unwrap().unwrap();
        for _ in 0..8 {
            let mv = moves.choose(&mut rng).unwrap();
            let child = state.simulate(mv, player).unwrap();
            drop(child);
        }
    }

    let after: Vec<Tile> = state.positions().map(|p| state.tile_at(p)).collect();
    assert_eq!(reference, after);
    assert_aggregates_consistent(&state, "after discarding simulations");
}

#[test]
fn test_elimination_playout_spends_all_bombs() {
    let mut rng = ChaCha8Rng::seed_from_u64(4711);
    let mut state = GameState::parse(COURSE_MAP).unwrap();
    state.start_elimination_phase();

    let mut player = 1;
    let mut skips = 0;
    while skips < state.player_count() {
        match state.legal_moves(player, None).unwrap() {
            None => skips += 1,
            Some(moves) => {
                skips = 0;
                assert!(moves.iter().all(|m| m.kind == MoveKind::Bomb));
                let mv = moves.choose(&mut rng).unwrap();
                let bombs_before = state.bombs(player);
                state.execute_move(mv, player).unwrap();
                assert_eq!(state.bombs(player), bombs_before - 1);
                assert_eq!(state.tile_at(mv.target), Tile::Hole);
            }
        }
        player = state.next_active_player(player);
    }

    // the game only stalls once the bombs or the board are used up
    let bombs_left = (1..=state.player_count()).any(|p| state.bombs(p) > 0);
    let cells_left = state.positions().any(|p| state.tile_at(p) != Tile::Hole);
    assert!(!bombs_left || !cells_left);
}
