use std::cmp::Reverse;

use crate::position::{Move, MoveFlag, Piece, Position};

/// Sorts `moves` best-first: the transposition table move, then captures and promotions by
/// most valuable victim / least valuable attacker, then everything else. The sort is stable so
/// quiet moves keep generation order.
pub(super) fn order_moves(moves: &mut [Move], position: &Position, maybe_tt_best_move: Option<Move>) {
    moves.sort_by_key(|&mve| Reverse(get_move_sort_key(mve, position, maybe_tt_best_move)))
}

fn get_move_sort_key(mve: Move, position: &Position, maybe_tt_best_move: Option<Move>) -> i32 {
    if maybe_tt_best_move == Some(mve) {
        return i32::MAX;
    }

    if mve.is_capture() || mve.promotion.is_some() {
        return get_mvv_lva_value(mve, position);
    }

    0
}

pub(super) fn get_mvv_lva_value(mve: Move, position: &Position) -> i32 {
    let attacker = position.piece_at(mve.src).map_or(Piece::Pawn, |(piece, _)| piece);
    let victim = if mve.flag == MoveFlag::EnPassant {
        Some(Piece::Pawn)
    } else {
        position.piece_at(mve.dest).map(|(piece, _)| piece)
    };

    let victim_score = victim.map_or(0, |piece| piece.index() as i32 + 1);
    let promotion_score = mve.promotion.map_or(0, |piece| piece.index() as i32);
    (victim_score + promotion_score) * 10 + (5 - attacker.index() as i32)
}
