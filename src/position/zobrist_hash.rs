use std::fmt::Display;

use crate::position::{CastlingRights, Piece, Side, State};
use crate::square::Square;

const RNG_SEED: u64 = 123456789;

/// Standard xorshift step.
const fn xorshift(mut x: u64) -> u64 {
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 5;
    x
}

struct ZobristRandomHashes {
    pieces: [u64; 64 * 12],
    black_to_move: u64,
    castling_rights: [u64; 4],
    en_passant_file: [u64; 8],
}

impl ZobristRandomHashes {
    const fn init() -> Self {
        let mut rng = RNG_SEED;

        let mut pieces = [0; 64 * 12];
        let mut i = 0;
        while i < (64 * 12) {
            rng = xorshift(rng);
            pieces[i] = rng;
            i += 1;
        }

        rng = xorshift(rng);
        let black_to_move = rng;

        let mut castling_rights = [0; 4];
        let mut i = 0;
        while i < 4 {
            rng = xorshift(rng);
            castling_rights[i] = rng;
            i += 1;
        }

        let mut en_passant_file = [0; 8];
        let mut i = 0;
        while i < 8 {
            rng = xorshift(rng);
            en_passant_file[i] = rng;
            i += 1;
        }

        Self {
            pieces,
            black_to_move,
            castling_rights,
            en_passant_file,
        }
    }
}

const ZOBRIST_RANDOM_HASHES: ZobristRandomHashes = ZobristRandomHashes::init();

const fn piece_key_index(square: Square, piece: Piece, side: Side) -> usize {
    (side as usize * 6 + piece as usize) * 64 + square as usize
}

/// Hash of piece placement, side to move, castling rights and en passant file. The move clocks
/// are deliberately not part of it so that repeated positions hash equally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZobristHash(u64);

impl Display for ZobristHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl ZobristHash {
    pub fn calculate(squares: &[Option<(Piece, Side)>; 64], state: &State) -> ZobristHash {
        let mut hash = ZobristHash(0);

        for (idx, occupant) in squares.iter().enumerate() {
            if let Some((piece, side)) = *occupant {
                if let Some(square) = Square::from_repr(idx as u8) {
                    hash.toggle_piece(square, piece, side);
                }
            }
        }

        if state.to_move == Side::Black {
            hash.flip_side_to_move();
        }

        hash.flip_castling_rights(CastlingRights::none(), state.castling_rights);

        if let Some(en_passant_target) = state.en_passant_target {
            hash.flip_en_passant(squares, en_passant_target, state.to_move);
        }

        hash
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub(crate) fn toggle_piece(&mut self, square: Square, piece: Piece, side: Side) {
        self.0 ^= ZOBRIST_RANDOM_HASHES.pieces[piece_key_index(square, piece, side)];
    }

    pub(crate) fn flip_side_to_move(&mut self) {
        self.0 ^= ZOBRIST_RANDOM_HASHES.black_to_move;
    }

    /// Xors in the key of every castling right that differs between `before` and `after`.
    pub(crate) fn flip_castling_rights(&mut self, before: CastlingRights, after: CastlingRights) {
        let keys = &ZOBRIST_RANDOM_HASHES.castling_rights;
        if before.white_king_side != after.white_king_side {
            self.0 ^= keys[0];
        }
        if before.white_queen_side != after.white_queen_side {
            self.0 ^= keys[1];
        }
        if before.black_king_side != after.black_king_side {
            self.0 ^= keys[2];
        }
        if before.black_queen_side != after.black_queen_side {
            self.0 ^= keys[3];
        }
    }

    /// The en passant file only enters the hash when a pawn of `capturer` could take on
    /// `en_passant_square`, so an unusable target doesn't split repetitions.
    pub(crate) fn flip_en_passant(
        &mut self,
        squares: &[Option<(Piece, Side)>; 64],
        en_passant_square: Square,
        capturer: Side,
    ) {
        if en_passant_capturable(squares, en_passant_square, capturer) {
            self.0 ^= ZOBRIST_RANDOM_HASHES.en_passant_file[en_passant_square.file() as usize];
        }
    }
}

fn en_passant_capturable(
    squares: &[Option<(Piece, Side)>; 64],
    en_passant_square: Square,
    capturer: Side,
) -> bool {
    [-1, 1].into_iter().any(|file_delta| {
        en_passant_square
            .offset(file_delta, -capturer.pawn_direction())
            .is_some_and(|square| squares[square.index()] == Some((Piece::Pawn, capturer)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{Move, MoveFlag, Position};
    use crate::square::Square::*;
    use test_case::test_case;
    use testresult::TestResult;

    #[test]
    fn test_keys_are_distinct() {
        let mut keys: Vec<u64> = ZOBRIST_RANDOM_HASHES.pieces.to_vec();
        keys.push(ZOBRIST_RANDOM_HASHES.black_to_move);
        keys.extend(ZOBRIST_RANDOM_HASHES.castling_rights);
        keys.extend(ZOBRIST_RANDOM_HASHES.en_passant_file);
        let len = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), len);
    }

    #[test_case(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 37 90" ; "clocks ignored"
    )]
    #[test_case(
        "4k3/8/8/8/4P3/8/8/4K3 b - e3 0 1",
        "4k3/8/8/8/4P3/8/8/4K3 b - - 0 1" ; "en passant nobody can take"
    )]
    fn test_same_hash(fen1: &str, fen2: &str) -> TestResult {
        let pos1 = Position::from_fen(fen1)?;
        let pos2 = Position::from_fen(fen2)?;
        assert_eq!(pos1.zobrist_hash(), pos2.zobrist_hash());
        Ok(())
    }

    #[test_case(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1" ; "side to move"
    )]
    #[test_case(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w Kkq - 0 1" ; "castling rights"
    )]
    #[test_case(
        "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3",
        "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq - 0 3" ; "en passant"
    )]
    fn test_different_hash(fen1: &str, fen2: &str) -> TestResult {
        let pos1 = Position::from_fen(fen1)?;
        let pos2 = Position::from_fen(fen2)?;
        assert_ne!(pos1.zobrist_hash(), pos2.zobrist_hash());
        Ok(())
    }

    #[test]
    fn test_double_push_without_capturer_repeats() -> TestResult {
        let mut position = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1")?;
        let double_push = Move::with_flag(E2, E4, MoveFlag::DoublePawnPush);
        position.make_move(double_push);
        assert_eq!(
            position.zobrist_hash(),
            Position::from_fen("4k3/8/8/8/4P3/8/8/4K3 b - - 0 1")?.zobrist_hash()
        );
        Ok(())
    }
}
