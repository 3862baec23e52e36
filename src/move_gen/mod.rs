mod pseudo_legal;
mod traits;

use crate::position::{Move, Piece, Position, Side};

pub use self::traits::{GenerateMoves, MoveList, MAX_MOVES};

/// Move generator over the mailbox board. Legality is checked by playing each candidate and
/// asking whether the mover's king is attacked afterwards.
#[derive(Clone, Copy, Debug, Default)]
pub struct MailboxMoveGen;

impl GenerateMoves for MailboxMoveGen {
    fn gen_moves(&self, position: &mut Position) -> MoveList {
        let side = position.state.to_move;
        let mut moves = self.gen_pseudo_legal_moves(position);

        moves.retain(|mve| {
            let undo = position.make_move(*mve);
            let legal = !position.in_check(side);
            position.unmake_move(*mve, undo);
            legal
        });

        moves
    }

    fn gen_pseudo_legal_moves(&self, position: &Position) -> MoveList {
        let mut moves = MoveList::new();
        pseudo_legal::gen_pseudo_legal_moves(position, position.state.to_move, &mut moves);
        moves
    }

    fn count_pseudo_legal_moves(&self, position: &Position, side: Side) -> usize {
        let mut moves = MoveList::new();
        pseudo_legal::gen_pseudo_legal_moves(position, side, &mut moves);
        moves.len()
    }
}

pub static MOVE_GEN: MailboxMoveGen = MailboxMoveGen {};

/// Captures and the promotions worth searching past the horizon.
pub fn is_tactical(mve: Move) -> bool {
    mve.is_capture() || matches!(mve.promotion, Some(Piece::Queen | Piece::Knight))
}

/// Whether playing `mve` puts the opponent in check. `position` is restored before returning.
pub fn gives_check(position: &mut Position, mve: Move) -> bool {
    let opp_side = position.state.to_move.opposite_side();
    let undo = position.make_move(mve);
    let check = position.in_check(opp_side);
    position.unmake_move(mve, undo);
    check
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::position::MoveFlag;
    use crate::square::Square::*;
    use test_case::test_case;
    use testresult::TestResult;

    macro_rules! assert_eq_collections {
        ($coll_a:expr, $coll_b:expr) => {
            let set_a: HashSet<String> = $coll_a.iter().map(|m| m.to_string()).collect();
            let set_b: HashSet<String> = $coll_b.iter().map(|m| m.to_string()).collect();

            let mut diff_a_b_vec: Vec<_> = set_a.difference(&set_b).cloned().collect();
            let mut diff_b_a_vec: Vec<_> = set_b.difference(&set_a).cloned().collect();

            diff_a_b_vec.sort();
            diff_b_a_vec.sort();

            if !diff_a_b_vec.is_empty() || !diff_b_a_vec.is_empty() {
                panic!(
                    "collections don't have the same elements. \
                       \nin {} but not {}: {:?}.\
                       \nin {} but not {}: {:?}.",
                    stringify!($coll_a),
                    stringify!($coll_b),
                    diff_a_b_vec,
                    stringify!($coll_b),
                    stringify!($coll_a),
                    diff_b_a_vec,
                );
            }
        };
    }

    #[test_case("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", &[
        "a2a3", "a2a4", "b2b3", "b2b4", "c2c3", "c2c4", "d2d3", "d2d4",
        "e2e3", "e2e4", "f2f3", "f2f4", "g2g3", "g2g4", "h2h3", "h2h4",
        "b1a3", "b1c3", "g1f3", "g1h3",
    ] ; "start")]
    #[test_case("8/8/p7/1p1p4/1P6/P1P3kp/5p2/1b5K w - - 0 51", &["c3c4", "a3a4"] ; "king boxed in")]
    #[test_case("8/8/8/8/k2Pp3/8/8/7K b - d3 0 1", &[
        "a4a5", "a4b5", "a4a3", "a4b3", "a4b4", "e4e3", "e4d3",
    ] ; "en passant")]
    #[test_case("8/8/4k3/8/8/4R3/8/7K b - - 0 1", &[
        "e6d7", "e6f7", "e6d6", "e6f6", "e6d5", "e6f5",
    ] ; "king cant move into check")]
    #[test_case("8/8/4k3/8/5N2/8/3b4/7K b - - 0 1", &[
        "e6e7", "e6e5", "e6d7", "e6f7", "e6d6", "e6f6", "e6f5", "d2f4",
    ] ; "capture checker")]
    #[test_case("k7/6r1/8/8/8/R7/8/7K b - - 0 1", &["a8b8", "a8b7", "g7a7"] ; "block check")]
    #[test_case("8/8/8/8/k2Pp2R/8/8/7K b - d3 0 1", &[
        "a4a5", "a4b5", "a4a3", "a4b3", "a4b4", "e4e3",
    ] ; "en passant discovers check")]
    #[test_case("7k/8/8/KPp4r/8/8/8/8 w - c6 0 17", &[
        "a5a4", "a5a6", "a5b6", "b5b6",
    ] ; "en passant exposes king on rank")]
    #[test_case("r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4", &[] ; "checkmate")]
    #[test_case("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", &[] ; "stalemate")]
    #[test_case("rnb1kbnr/pppq1Q1p/8/1B2p3/4P3/2p5/PPPP1PPP/R1B1K1NR b KQkq - 0 1", &[
        "e8f7", "e8d8",
    ] ; "pinned moves from one pin ray to another")]
    #[test_case("4k3/8/8/8/8/8/r4PPK/r7 w - - 0 1", &["h2g3", "h2h3", "f2f3", "f2f4", "g2g3", "g2g4"] ; "king hemmed by rooks")]
    fn test_gen_moves(fen: &str, want: &[&str]) -> TestResult {
        let mut position = Position::from_fen(fen)?;
        let before = position.clone();

        let got = MOVE_GEN.gen_moves(&mut position);

        assert_eq_collections!(got, want);
        assert_eq!(position, before);
        Ok(())
    }

    #[test_case("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", 26 ; "castling rooks")]
    #[test_case("8/8/8/8/8/8/8/k6K w - - 0 1", 3 ; "bare king")]
    fn test_count_legal(fen: &str, want: usize) -> TestResult {
        let mut position = Position::from_fen(fen)?;
        assert_eq!(MOVE_GEN.gen_moves(&mut position).len(), want);
        Ok(())
    }

    #[test]
    fn test_count_pseudo_legal_moves_either_side() {
        let position = Position::start();
        assert_eq!(
            MOVE_GEN.count_pseudo_legal_moves(&position, Side::White),
            20
        );
        assert_eq!(
            MOVE_GEN.count_pseudo_legal_moves(&position, Side::Black),
            20
        );
    }

    #[test]
    fn test_no_duplicates() -> TestResult {
        let mut position =
            Position::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")?;
        let moves = MOVE_GEN.gen_moves(&mut position);
        let unique: HashSet<Move> = moves.iter().copied().collect();
        assert_eq!(unique.len(), moves.len());
        assert_eq!(moves.len(), 48);
        Ok(())
    }

    #[test_case(Move::with_flag(E4, D5, MoveFlag::Capture), true ; "capture")]
    #[test_case(Move::with_flag(E5, D6, MoveFlag::EnPassant), true ; "en passant")]
    #[test_case(Move::with_promotion(A7, A8, Piece::Queen, MoveFlag::Quiet), true ; "queen promotion")]
    #[test_case(Move::with_promotion(A7, A8, Piece::Knight, MoveFlag::Quiet), true ; "knight promotion")]
    #[test_case(Move::with_promotion(A7, A8, Piece::Rook, MoveFlag::Quiet), false ; "rook underpromotion")]
    #[test_case(Move::new(G1, F3), false ; "quiet")]
    fn test_is_tactical(mve: Move, want: bool) {
        assert_eq!(is_tactical(mve), want);
    }

    #[test_case("4k3/8/8/8/8/8/8/R3K3 w - - 0 1", Move::new(A1, A8), true ; "rook to back rank")]
    #[test_case("4k3/8/8/8/8/8/8/R3K3 w - - 0 1", Move::new(A1, A7), false ; "rook quiet")]
    #[test_case("4k3/8/8/8/8/8/8/4K3 w - - 0 1", Move::new(E1, D1), false ; "king move")]
    #[test_case("4k3/8/8/8/8/8/4N3/4R1K1 w - - 0 1", Move::new(E2, C3), true ; "discovered check")]
    fn test_gives_check(fen: &str, mve: Move, want: bool) -> TestResult {
        let mut position = Position::from_fen(fen)?;
        assert_eq!(gives_check(&mut position, mve), want);
        Ok(())
    }
}
