use std::collections::HashSet;

use jamesfish::{GenerateMoves, Move, Position, MOVE_GEN};

use test_case::test_case;
use testresult::TestResult;

const POSITIONS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
];

/// Visits every position reachable in `depth` moves, calling `check` before descending.
fn walk(position: &mut Position, depth: usize, check: &mut impl FnMut(&mut Position)) {
    check(position);
    if depth == 0 {
        return;
    }
    for mve in MOVE_GEN.gen_moves(position) {
        let undo = position.make_move(mve);
        walk(position, depth - 1, check);
        position.unmake_move(mve, undo);
    }
}

#[test_case(POSITIONS[0], 3)]
#[test_case(POSITIONS[1], 2)]
#[test_case(POSITIONS[2], 3)]
#[test_case(POSITIONS[3], 2)]
#[test_case(POSITIONS[4], 2)]
fn test_make_unmake_round_trip(fen: &str, depth: usize) -> TestResult {
    let mut position = Position::from_fen(fen)?;
    walk(&mut position, depth, &mut |position| {
        let history_len = position.history().len();
        for mve in MOVE_GEN.gen_moves(position) {
            let before = position.clone();
            let undo = position.make_move(mve);
            position.unmake_move(mve, undo);

            assert_eq!(*position, before, "{} did not unmake in {}", mve, before.to_fen());
            assert_eq!(position.to_fen(), before.to_fen());
            assert_eq!(position.history().len(), history_len);
        }
    });
    Ok(())
}

#[test_case(POSITIONS[0], 3)]
#[test_case(POSITIONS[1], 2)]
#[test_case(POSITIONS[2], 3)]
#[test_case(POSITIONS[3], 2)]
#[test_case(POSITIONS[4], 2)]
fn test_legal_moves_never_leave_king_in_check(fen: &str, depth: usize) -> TestResult {
    let mut position = Position::from_fen(fen)?;
    walk(&mut position, depth, &mut |position| {
        let side = position.state.to_move;
        for mve in MOVE_GEN.gen_moves(position) {
            let undo = position.make_move(mve);
            assert!(!position.in_check(side), "{} leaves {} in check", mve, side);
            position.unmake_move(mve, undo);
        }
    });
    Ok(())
}

#[test_case(POSITIONS[0], 3)]
#[test_case(POSITIONS[1], 2)]
#[test_case(POSITIONS[2], 3)]
#[test_case(POSITIONS[3], 2)]
#[test_case(POSITIONS[4], 2)]
fn test_legal_moves_are_complete(fen: &str, depth: usize) -> TestResult {
    let mut position = Position::from_fen(fen)?;
    walk(&mut position, depth, &mut |position| {
        let side = position.state.to_move;
        let legal = MOVE_GEN.gen_moves(position);
        let unique: HashSet<Move> = legal.iter().copied().collect();
        assert_eq!(unique.len(), legal.len(), "duplicate moves in {}", position.to_fen());

        for mve in MOVE_GEN.gen_pseudo_legal_moves(position) {
            let undo = position.make_move(mve);
            let leaves_check = position.in_check(side);
            position.unmake_move(mve, undo);

            assert_eq!(
                unique.contains(&mve),
                !leaves_check,
                "{} classified wrongly in {}",
                mve,
                position.to_fen()
            );
        }
    });
    Ok(())
}

#[test_case("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", "a1a8" ; "back rank mate")]
#[test_case("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4", "h5f7" ; "scholars mate")]
fn test_checkmate_has_no_moves_and_is_check(fen: &str, mating_move: &str) -> TestResult {
    let mut position = Position::from_fen(fen)?;
    let mve = jamesfish::parse_uci_move(&position, mating_move, MOVE_GEN)?;
    position.make_move(mve);

    assert!(MOVE_GEN.gen_moves(&mut position).is_empty());
    assert!(position.in_check(position.state.to_move));
    Ok(())
}

#[test]
fn test_king_and_pawn_stalemate() -> TestResult {
    let mut position = Position::from_fen("k7/P7/1K6/8/8/8/8/8 b - - 0 1")?;
    assert!(MOVE_GEN.gen_moves(&mut position).is_empty());
    assert!(!position.in_check(position.state.to_move));
    Ok(())
}
