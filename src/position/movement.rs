use crate::position::{Piece, Side};

pub(crate) const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

pub(crate) const KING_OFFSETS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

pub(crate) const ROOK_DIRECTIONS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

pub(crate) const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

pub(crate) const QUEEN_DIRECTIONS: [(i8, i8); 8] = KING_OFFSETS;

/// How a piece type moves. Leapers jump to each offset once, sliders repeat each direction until
/// they hit the edge or a blocker. Pawns have their own side-dependent rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Movement {
    Pawn,
    Leaper(&'static [(i8, i8)]),
    Slider(&'static [(i8, i8)]),
}

impl Piece {
    pub(crate) const fn movement(self) -> Movement {
        match self {
            Piece::Pawn => Movement::Pawn,
            Piece::Knight => Movement::Leaper(&KNIGHT_OFFSETS),
            Piece::King => Movement::Leaper(&KING_OFFSETS),
            Piece::Bishop => Movement::Slider(&BISHOP_DIRECTIONS),
            Piece::Rook => Movement::Slider(&ROOK_DIRECTIONS),
            Piece::Queen => Movement::Slider(&QUEEN_DIRECTIONS),
        }
    }
}

impl Side {
    /// Rank delta of a pawn push.
    pub(crate) const fn pawn_direction(self) -> i8 {
        match self {
            Side::White => 1,
            Side::Black => -1,
        }
    }

    pub(crate) const fn pawn_start_rank(self) -> u8 {
        match self {
            Side::White => 1,
            Side::Black => 6,
        }
    }

    pub(crate) const fn promotion_rank(self) -> u8 {
        match self {
            Side::White => 7,
            Side::Black => 0,
        }
    }
}
