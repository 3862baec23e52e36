use std::fmt;
use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::move_gen::{GenerateMoves, MOVE_GEN};
use crate::position::{Move, Piece, Position, Side};
use crate::square::Square::{self, *};

/// Score in centipawns from the point of view of the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Eval(pub i32);

impl Eval {
    pub const DRAW: Eval = Eval(0);
    /// Score of delivering mate on the current ply. Mates further away score lower.
    pub const MATE: Eval = Eval(30_000);
    /// Bound for alpha-beta windows, larger than any real score.
    pub const INFINITY: Eval = Eval(32_000);

    /// Scores within this many plies of `MATE` are mate scores.
    const MATE_RANGE: i32 = 1_000;

    pub const fn mate_in(ply: usize) -> Eval {
        Eval(Self::MATE.0 - ply as i32)
    }

    /// Score for the side to move being checkmated `ply` plies from the root.
    pub const fn mated_in(ply: usize) -> Eval {
        Eval(-Self::MATE.0 + ply as i32)
    }

    pub fn is_mate(self) -> bool {
        self.0.abs() >= Self::MATE.0 - Self::MATE_RANGE
    }

    /// Mate scores are stored relative to the node rather than the root, so the same entry is
    /// valid wherever the position is reached.
    pub fn to_tt(self, ply: usize) -> Eval {
        let ply = ply as i32;
        if self.0 >= Self::MATE.0 - Self::MATE_RANGE {
            Eval(self.0 + ply)
        } else if self.0 <= -Self::MATE.0 + Self::MATE_RANGE {
            Eval(self.0 - ply)
        } else {
            self
        }
    }

    pub fn from_tt(self, ply: usize) -> Eval {
        let ply = ply as i32;
        if self.0 >= Self::MATE.0 - Self::MATE_RANGE {
            Eval(self.0 - ply)
        } else if self.0 <= -Self::MATE.0 + Self::MATE_RANGE {
            Eval(self.0 + ply)
        } else {
            self
        }
    }

    /// Full moves until mate, negative when the side to move is the one being mated.
    pub fn mate_moves(self) -> Option<i32> {
        if !self.is_mate() {
            return None;
        }
        if self.0 > 0 {
            Some((Self::MATE.0 - self.0 + 1) / 2)
        } else {
            Some(-(Self::MATE.0 + self.0) / 2)
        }
    }
}

impl Neg for Eval {
    type Output = Eval;

    fn neg(self) -> Eval {
        Eval(-self.0)
    }
}

impl Add<i32> for Eval {
    type Output = Eval;

    fn add(self, rhs: i32) -> Eval {
        Eval(self.0 + rhs)
    }
}

impl Sub<i32> for Eval {
    type Output = Eval;

    fn sub(self, rhs: i32) -> Eval {
        Eval(self.0 - rhs)
    }
}

impl fmt::Display for Eval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mate_moves() {
            Some(moves) => write!(f, "mate {}", moves),
            None => write!(f, "cp {}", self.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Checkmate { winner: Side },
    Stalemate,
    FiftyMoveRule,
    InsufficientMaterial,
    ThreefoldRepetition,
}

impl Outcome {
    pub fn winner(self) -> Option<Side> {
        match self {
            Outcome::Checkmate { winner } => Some(winner),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Checkmate { winner } => write!(f, "checkmate, {} wins", winner),
            Outcome::Stalemate => write!(f, "draw by stalemate"),
            Outcome::FiftyMoveRule => write!(f, "draw by fifty-move rule"),
            Outcome::InsufficientMaterial => write!(f, "draw by insufficient material"),
            Outcome::ThreefoldRepetition => write!(f, "draw by threefold repetition"),
        }
    }
}

/// Classifies a finished game. `legal_moves` must be the legal moves of `position`.
pub fn outcome(position: &Position, legal_moves: &[Move]) -> Option<Outcome> {
    if legal_moves.is_empty() {
        let to_move = position.state.to_move;
        return Some(if position.in_check(to_move) {
            Outcome::Checkmate {
                winner: to_move.opposite_side(),
            }
        } else {
            Outcome::Stalemate
        });
    }
    draw_by_rule(position)
}

/// Draws that can be read off the position without generating moves. A side with no legal
/// moves is handled by `outcome`, which takes priority.
pub fn draw_by_rule(position: &Position) -> Option<Outcome> {
    if position.is_fifty_move_draw() {
        Some(Outcome::FiftyMoveRule)
    } else if position.has_insufficient_material() {
        Some(Outcome::InsufficientMaterial)
    } else if position.is_threefold_repetition() {
        Some(Outcome::ThreefoldRepetition)
    } else {
        None
    }
}

/// Score of a finished game for the side to move, found `ply` plies from the root.
pub fn terminal_eval(outcome: Outcome, ply: usize) -> Eval {
    match outcome {
        Outcome::Checkmate { .. } => Eval::mated_in(ply),
        _ => Eval::DRAW,
    }
}

pub trait EvaluatePosition {
    /// Static score of `position` relative to the side to move.
    fn evaluate(&self, position: &Position) -> Eval;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PositionEvaluator;

const MOBILITY_WEIGHT: i32 = 5;
const CENTER_CONTROL_WEIGHT: i32 = 10;
const DOUBLED_PAWN_PENALTY: i32 = 20;
const CENTER_SQUARES: [Square; 4] = [D4, E4, D5, E5];

/// Non-pawn material with every piece on the board, used to blend the king tables.
const OPENING_PHASE_MATERIAL: i32 = 2 * (2 * 320 + 2 * 330 + 2 * 500 + 900);

impl EvaluatePosition for PositionEvaluator {
    fn evaluate(&self, position: &Position) -> Eval {
        let eval = material_and_placement(position)
            + mobility(position)
            + center_control(position)
            - doubled_pawn_penalty(position, Side::White)
            + doubled_pawn_penalty(position, Side::Black);

        if position.state.to_move == Side::White {
            Eval(eval)
        } else {
            Eval(-eval)
        }
    }
}

pub static POSITION_EVALUATOR: PositionEvaluator = PositionEvaluator {};

pub const fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => 100,
        Piece::Knight => 320,
        Piece::Bishop => 330,
        Piece::Rook => 500,
        Piece::Queen => 900,
        Piece::King => 20_000,
    }
}

/// Material plus piece-square bonuses, from white's point of view.
fn material_and_placement(position: &Position) -> i32 {
    let pieces = position.get_piece_locs();

    let phase_material = pieces
        .iter()
        .filter(|(piece, _, _)| !matches!(piece, Piece::Pawn | Piece::King))
        .map(|&(piece, _, _)| piece_value(piece))
        .sum::<i32>()
        .min(OPENING_PHASE_MATERIAL);

    let mut eval = 0;
    for &(piece, side, square) in pieces.iter() {
        // Tables are laid out as seen from white, eighth rank first.
        let table_idx = match side {
            Side::White => square.flip_rank().index(),
            Side::Black => square.index(),
        };

        let placement = match piece {
            Piece::King => {
                let middlegame = KING_MIDDLEGAME_TABLE[table_idx];
                let endgame = KING_ENDGAME_TABLE[table_idx];
                (middlegame * phase_material
                    + endgame * (OPENING_PHASE_MATERIAL - phase_material))
                    / OPENING_PHASE_MATERIAL
            }
            _ => piece_square_table(piece)[table_idx] + piece_value(piece),
        };

        match side {
            Side::White => eval += placement,
            Side::Black => eval -= placement,
        }
    }
    eval
}

fn mobility(position: &Position) -> i32 {
    let white = MOVE_GEN.count_pseudo_legal_moves(position, Side::White) as i32;
    let black = MOVE_GEN.count_pseudo_legal_moves(position, Side::Black) as i32;
    MOBILITY_WEIGHT * (white - black)
}

fn center_control(position: &Position) -> i32 {
    CENTER_SQUARES
        .iter()
        .map(|&square| {
            position.attacker_count(square, Side::White) as i32
                - position.attacker_count(square, Side::Black) as i32
        })
        .sum::<i32>()
        * CENTER_CONTROL_WEIGHT
}

/// Penalty for every pawn of `side` beyond the first on each file.
fn doubled_pawn_penalty(position: &Position, side: Side) -> i32 {
    let mut pawns_per_file = [0; 8];
    for (piece, piece_side, square) in position.get_piece_locs() {
        if piece == Piece::Pawn && piece_side == side {
            pawns_per_file[square.file() as usize] += 1;
        }
    }
    pawns_per_file
        .iter()
        .map(|&count: &i32| (count - 1).max(0))
        .sum::<i32>()
        * DOUBLED_PAWN_PENALTY
}

fn piece_square_table(piece: Piece) -> &'static [i32; 64] {
    match piece {
        Piece::Pawn => &PAWN_TABLE,
        Piece::Knight => &KNIGHT_TABLE,
        Piece::Bishop => &BISHOP_TABLE,
        Piece::Rook => &ROOK_TABLE,
        Piece::Queen => &QUEEN_TABLE,
        Piece::King => &KING_MIDDLEGAME_TABLE,
    }
}

#[rustfmt::skip]
const PAWN_TABLE: [i32; 64] = [
     0,   0,   0,   0,   0,   0,   0,   0,
    50,  50,  50,  50,  50,  50,  50,  50,
    10,  10,  20,  30,  30,  20,  10,  10,
     5,   5,  10,  25,  25,  10,   5,   5,
     0,   0,   0,  20,  20,   0,   0,   0,
     5,  -5, -10,   0,   0, -10,  -5,   5,
     5,  10,  10, -20, -20,  10,  10,   5,
     0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const KNIGHT_TABLE: [i32; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   0,   0,   0, -20, -40,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -30,   5,  10,  15,  15,  10,   5, -30,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const BISHOP_TABLE: [i32; 64] = [
    -20, -10, -10, -10, -10, -10, -10, -20,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   5,   5,  10,  10,   5,   5, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,  10,  10,  10,  10,  10,  10, -10,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const ROOK_TABLE: [i32; 64] = [
     0,   0,   0,   0,   0,   0,   0,   0,
     5,  10,  10,  10,  10,  10,  10,   5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
     0,   0,   0,   5,   5,   0,   0,   0,
];

#[rustfmt::skip]
const QUEEN_TABLE: [i32; 64] = [
    -20, -10, -10,  -5,  -5, -10, -10, -20,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -10,   0,   5,   5,   5,   5,   0, -10,
     -5,   0,   5,   5,   5,   5,   0,  -5,
      0,   0,   5,   5,   5,   5,   0,  -5,
    -10,   5,   5,   5,   5,   5,   0, -10,
    -10,   0,   5,   0,   0,   0,   0, -10,
    -20, -10, -10,  -5,  -5, -10, -10, -20,
];

#[rustfmt::skip]
const KING_MIDDLEGAME_TABLE: [i32; 64] = [
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -20, -30, -30, -40, -40, -30, -30, -20,
    -10, -20, -20, -20, -20, -20, -20, -10,
     20,  20,   0,   0,   0,   0,  20,  20,
     20,  30,  10,   0,   0,  10,  30,  20,
];

#[rustfmt::skip]
const KING_ENDGAME_TABLE: [i32; 64] = [
    -50, -40, -30, -20, -20, -30, -40, -50,
    -30, -20, -10,   0,   0, -10, -20, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -30,   0,   0,   0,   0, -30, -30,
    -50, -30, -30, -30, -30, -30, -30, -50,
];
