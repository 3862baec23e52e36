use crate::position::movement::{
    Movement, BISHOP_DIRECTIONS, KING_OFFSETS, KNIGHT_OFFSETS, ROOK_DIRECTIONS,
};
use crate::position::{Piece, Position, Side};
use crate::square::Square;

impl Position {
    /// Whether any piece of `by_side` attacks `square`. Pins are ignored, so a pinned piece still
    /// counts as an attacker.
    pub fn is_square_attacked(&self, square: Square, by_side: Side) -> bool {
        self.count_attackers(square, by_side, 1) > 0
    }

    /// Number of pieces of `by_side` attacking `square`, ignoring pins.
    pub fn attacker_count(&self, square: Square, by_side: Side) -> usize {
        self.count_attackers(square, by_side, usize::MAX)
    }

    pub fn in_check(&self, side: Side) -> bool {
        self.is_square_attacked(self.king_square(side), side.opposite_side())
    }

    /// Whether the piece standing on `from` attacks `target`, ignoring pins.
    pub fn piece_attacks(&self, from: Square, target: Square) -> bool {
        let Some((piece, side)) = self.piece_at(from) else {
            return false;
        };
        match piece.movement() {
            Movement::Pawn => [-1, 1]
                .into_iter()
                .any(|file_delta| from.offset(file_delta, side.pawn_direction()) == Some(target)),
            Movement::Leaper(offsets) => offsets
                .iter()
                .any(|&(file_delta, rank_delta)| from.offset(file_delta, rank_delta) == Some(target)),
            Movement::Slider(directions) => directions.iter().any(|&(file_delta, rank_delta)| {
                let mut curr = from.offset(file_delta, rank_delta);
                while let Some(ray_square) = curr {
                    if ray_square == target {
                        return true;
                    }
                    if self.piece_at(ray_square).is_some() {
                        return false;
                    }
                    curr = ray_square.offset(file_delta, rank_delta);
                }
                false
            }),
        }
    }

    /// Looks outward from `square` for each kind of attacker, stopping once `limit` are found.
    fn count_attackers(&self, square: Square, by_side: Side, limit: usize) -> usize {
        let mut count = 0;
        let mut found = |piece_square: Option<Square>, wanted: &[Piece]| -> bool {
            if let Some(piece) = piece_square.and_then(|sq| self.side_piece_at(sq, by_side)) {
                if wanted.contains(&piece) {
                    count += 1;
                    return count >= limit;
                }
            }
            false
        };

        // A pawn attacks diagonally forwards, so look one rank behind it.
        let pawn_rank_delta = -by_side.pawn_direction();
        for file_delta in [-1, 1] {
            if found(square.offset(file_delta, pawn_rank_delta), &[Piece::Pawn]) {
                return limit;
            }
        }

        for (file_delta, rank_delta) in KNIGHT_OFFSETS {
            if found(square.offset(file_delta, rank_delta), &[Piece::Knight]) {
                return limit;
            }
        }

        for (file_delta, rank_delta) in KING_OFFSETS {
            if found(square.offset(file_delta, rank_delta), &[Piece::King]) {
                return limit;
            }
        }

        let sliders: [(&[(i8, i8)], [Piece; 2]); 2] = [
            (&ROOK_DIRECTIONS, [Piece::Rook, Piece::Queen]),
            (&BISHOP_DIRECTIONS, [Piece::Bishop, Piece::Queen]),
        ];
        for (directions, wanted) in sliders {
            for &(file_delta, rank_delta) in directions {
                let mut curr = square.offset(file_delta, rank_delta);
                while let Some(ray_square) = curr {
                    if self.piece_at(ray_square).is_some() {
                        if found(Some(ray_square), &wanted) {
                            return limit;
                        }
                        break;
                    }
                    curr = ray_square.offset(file_delta, rank_delta);
                }
            }
        }

        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square::Square::*;
    use test_case::test_case;
    use testresult::TestResult;

    #[test_case("4k3/8/8/8/8/8/3p4/4K3 w - - 0 1", E1, Side::Black, true ; "black pawn attacks down")]
    #[test_case("4k3/8/8/8/8/8/4p3/4K3 w - - 0 1", E1, Side::Black, false ; "pawn does not attack forward")]
    #[test_case("4k3/8/8/8/8/5N2/8/4K3 w - - 0 1", E5, Side::White, true ; "knight")]
    #[test_case("4k3/8/8/8/8/8/8/R3K3 w - - 0 1", A8, Side::White, true ; "rook on file")]
    #[test_case("4k3/8/8/8/8/8/8/R1n4K w - - 0 1", D1, Side::White, false ; "rook blocked")]
    #[test_case("4k3/8/8/8/8/8/8/R1n4K w - - 0 1", C1, Side::White, true ; "rook hits blocker")]
    #[test_case("4k3/8/8/8/8/8/1B6/4K3 w - - 0 1", H8, Side::White, true ; "bishop long diagonal")]
    #[test_case("4k3/8/8/8/8/8/1Q6/4K3 w - - 0 1", B8, Side::White, true ; "queen file")]
    #[test_case("4k3/8/8/8/8/8/8/4K3 w - - 0 1", D2, Side::White, true ; "king")]
    fn test_is_square_attacked(fen: &str, square: Square, by_side: Side, want: bool) -> TestResult {
        let position = Position::from_fen(fen)?;
        assert_eq!(position.is_square_attacked(square, by_side), want);
        Ok(())
    }

    #[test]
    fn test_pinned_piece_still_attacks() -> TestResult {
        // The knight on d2 is pinned against the white king by the rook on d8 but still attacks f3.
        let position = Position::from_fen("3rk3/8/8/8/8/8/3N4/3K4 w - - 0 1")?;
        assert!(position.is_square_attacked(F3, Side::White));
        Ok(())
    }

    #[test_case("4k3/8/8/3p1p2/8/4N3/8/4K3 w - - 0 1", E4, Side::Black, 2 ; "two pawns")]
    #[test_case("4k3/8/8/3p1p2/8/4N3/8/4K3 w - - 0 1", D5, Side::White, 1 ; "knight only")]
    #[test_case("4k3/8/8/8/8/8/8/R3K3 w - - 0 1", D1, Side::White, 2 ; "rook and king")]
    fn test_attacker_count(fen: &str, square: Square, by_side: Side, want: usize) -> TestResult {
        let position = Position::from_fen(fen)?;
        assert_eq!(position.attacker_count(square, by_side), want);
        Ok(())
    }

    #[test_case("4k3/8/8/8/8/8/8/4K2r w - - 0 1", Side::White, true ; "rook check")]
    #[test_case("4k3/8/8/8/8/8/8/4K3 w - - 0 1", Side::White, false ; "no check")]
    fn test_in_check(fen: &str, side: Side, want: bool) -> TestResult {
        let position = Position::from_fen(fen)?;
        assert_eq!(position.in_check(side), want);
        Ok(())
    }

    #[test_case("4k3/8/8/8/8/8/3P4/4K3 w - - 0 1", D2, E3, true ; "pawn diagonal")]
    #[test_case("4k3/8/8/8/8/8/3P4/4K3 w - - 0 1", D2, D3, false ; "pawn push is not an attack")]
    #[test_case("4k3/8/8/8/8/8/8/R1n1K3 w - - 0 1", A1, C1, true ; "rook reaches blocker")]
    #[test_case("4k3/8/8/8/8/8/8/R1n1K3 w - - 0 1", A1, D1, false ; "rook stops at blocker")]
    #[test_case("4k3/8/8/8/8/8/8/4K3 w - - 0 1", C3, D5, false ; "empty square")]
    fn test_piece_attacks(fen: &str, from: Square, target: Square, want: bool) -> TestResult {
        let position = Position::from_fen(fen)?;
        assert_eq!(position.piece_attacks(from, target), want);
        Ok(())
    }
}
