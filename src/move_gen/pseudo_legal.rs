use crate::move_gen::MoveList;
use crate::position::movement::Movement;
use crate::position::{Move, MoveFlag, Piece, Position, Side};
use crate::square::Square::{self, *};

struct CastlingRule {
    flag: MoveFlag,
    king_src: Square,
    king_dest: Square,
    rook_src: Square,
    /// Squares between king and rook.
    must_be_empty: &'static [Square],
    /// Start, transit and destination squares of the king.
    must_be_safe: &'static [Square],
}

const WHITE_CASTLING: [CastlingRule; 2] = [
    CastlingRule {
        flag: MoveFlag::CastleKingSide,
        king_src: E1,
        king_dest: G1,
        rook_src: H1,
        must_be_empty: &[F1, G1],
        must_be_safe: &[E1, F1, G1],
    },
    CastlingRule {
        flag: MoveFlag::CastleQueenSide,
        king_src: E1,
        king_dest: C1,
        rook_src: A1,
        must_be_empty: &[D1, C1, B1],
        must_be_safe: &[E1, D1, C1],
    },
];

const BLACK_CASTLING: [CastlingRule; 2] = [
    CastlingRule {
        flag: MoveFlag::CastleKingSide,
        king_src: E8,
        king_dest: G8,
        rook_src: H8,
        must_be_empty: &[F8, G8],
        must_be_safe: &[E8, F8, G8],
    },
    CastlingRule {
        flag: MoveFlag::CastleQueenSide,
        king_src: E8,
        king_dest: C8,
        rook_src: A8,
        must_be_empty: &[D8, C8, B8],
        must_be_safe: &[E8, D8, C8],
    },
];

pub(super) fn gen_pseudo_legal_moves(position: &Position, side: Side, moves: &mut MoveList) {
    for (piece, piece_side, square) in position.get_piece_locs() {
        if piece_side != side {
            continue;
        }

        match piece.movement() {
            Movement::Pawn => gen_pawn_moves(position, side, square, moves),
            Movement::Leaper(offsets) => {
                for &(file_delta, rank_delta) in offsets {
                    if let Some(dest) = square.offset(file_delta, rank_delta) {
                        match position.piece_at(dest) {
                            None => moves.push(Move::new(square, dest)),
                            Some((_, dest_side)) if dest_side != side => {
                                moves.push(Move::with_flag(square, dest, MoveFlag::Capture))
                            }
                            Some(_) => (),
                        }
                    }
                }
            }
            Movement::Slider(directions) => {
                for &(file_delta, rank_delta) in directions {
                    let mut curr = square.offset(file_delta, rank_delta);
                    while let Some(dest) = curr {
                        match position.piece_at(dest) {
                            None => moves.push(Move::new(square, dest)),
                            Some((_, dest_side)) => {
                                if dest_side != side {
                                    moves.push(Move::with_flag(square, dest, MoveFlag::Capture));
                                }
                                break;
                            }
                        }
                        curr = dest.offset(file_delta, rank_delta);
                    }
                }
            }
        }

        if piece == Piece::King {
            gen_castling_moves(position, side, square, moves);
        }
    }
}

fn gen_pawn_moves(position: &Position, side: Side, src: Square, moves: &mut MoveList) {
    let direction = side.pawn_direction();

    if let Some(single) = src.offset(0, direction) {
        if position.piece_at(single).is_none() {
            push_pawn_move(src, single, MoveFlag::Quiet, side, moves);

            if src.rank() == side.pawn_start_rank() {
                if let Some(double) = single.offset(0, direction) {
                    if position.piece_at(double).is_none() {
                        moves.push(Move::with_flag(src, double, MoveFlag::DoublePawnPush));
                    }
                }
            }
        }
    }

    for file_delta in [-1, 1] {
        let Some(dest) = src.offset(file_delta, direction) else {
            continue;
        };
        match position.piece_at(dest) {
            Some((_, dest_side)) if dest_side != side => {
                push_pawn_move(src, dest, MoveFlag::Capture, side, moves)
            }
            // The en passant target only belongs to the side to move.
            None if side == position.state.to_move
                && position.state.en_passant_target == Some(dest) =>
            {
                moves.push(Move::with_flag(src, dest, MoveFlag::EnPassant))
            }
            _ => (),
        }
    }
}

fn push_pawn_move(src: Square, dest: Square, flag: MoveFlag, side: Side, moves: &mut MoveList) {
    if dest.rank() == side.promotion_rank() {
        for promotion in Piece::PROMOTIONS {
            moves.push(Move::with_promotion(src, dest, promotion, flag));
        }
    } else {
        moves.push(Move::with_flag(src, dest, flag));
    }
}

fn gen_castling_moves(position: &Position, side: Side, king_square: Square, moves: &mut MoveList) {
    let rules = match side {
        Side::White => &WHITE_CASTLING,
        Side::Black => &BLACK_CASTLING,
    };
    let rights = position.state.castling_rights;
    let opp_side = side.opposite_side();

    for rule in rules {
        let has_right = match rule.flag {
            MoveFlag::CastleKingSide => rights.king_side(side),
            _ => rights.queen_side(side),
        };
        if !has_right
            || king_square != rule.king_src
            || position.side_piece_at(rule.rook_src, side) != Some(Piece::Rook)
        {
            continue;
        }

        let path_clear = rule
            .must_be_empty
            .iter()
            .all(|&square| position.piece_at(square).is_none());
        if !path_clear {
            continue;
        }

        let path_safe = rule
            .must_be_safe
            .iter()
            .all(|&square| !position.is_square_attacked(square, opp_side));
        if path_safe {
            moves.push(Move::with_flag(rule.king_src, rule.king_dest, rule.flag));
        }
    }
}
