use std::str::FromStr;

use crate::move_gen::GenerateMoves;
use crate::position::{Move, MoveFlag, Piece, Position};
use crate::square::Square;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    #[error("move text {0:?} should be 4 or 5 characters, e.g. e2e4 or e7e8q")]
    Length(String),

    #[error("invalid square {0:?}")]
    Square(String),

    #[error("invalid promotion piece {0:?}")]
    Promotion(char),

    #[error("move {0} is not legal in this position")]
    IllegalMove(String),
}

/// Finds the legal move written in long algebraic notation (`e2e4`, `e7e8q`, `e1g1` for
/// castling). The returned move carries the flags the generator gives it.
pub fn parse_uci_move(
    position: &Position,
    move_str: &str,
    move_gen: impl GenerateMoves,
) -> Result<Move, NotationError> {
    if !move_str.is_ascii() || !(4..=5).contains(&move_str.len()) {
        return Err(NotationError::Length(move_str.to_string()));
    }

    let parse_square = |square_str: &str| {
        Square::from_str(square_str).map_err(|_| NotationError::Square(square_str.to_string()))
    };
    let src = parse_square(&move_str[0..2])?;
    let dest = parse_square(&move_str[2..4])?;
    let promotion = move_str[4..]
        .chars()
        .next()
        .map(|ch| match Piece::try_from(ch.to_ascii_lowercase()) {
            Ok(piece) if Piece::PROMOTIONS.contains(&piece) => Ok(piece),
            _ => Err(NotationError::Promotion(ch)),
        })
        .transpose()?;

    find_legal_move(position, src, dest, promotion, move_gen)
        .ok_or_else(|| NotationError::IllegalMove(move_str.to_string()))
}

/// Standard algebraic notation for a legal move, e.g. `Nbd7`, `exd6`, `O-O`, `e8=Q+`.
pub fn move_to_san(
    position: &Position,
    mve: Move,
    move_gen: impl GenerateMoves + Copy,
) -> Result<String, NotationError> {
    let mve = find_legal_move(position, mve.src, mve.dest, mve.promotion, move_gen)
        .ok_or_else(|| NotationError::IllegalMove(mve.to_string()))?;
    let Some((piece, side)) = position.piece_at(mve.src) else {
        return Err(NotationError::IllegalMove(mve.to_string()));
    };

    let mut san = String::with_capacity(8);
    match mve.flag {
        MoveFlag::CastleKingSide => san.push_str("O-O"),
        MoveFlag::CastleQueenSide => san.push_str("O-O-O"),
        _ => {
            if piece == Piece::Pawn {
                if mve.is_capture() {
                    san.push(file_char(mve.src));
                    san.push('x');
                }
            } else {
                san.push(char::from(piece).to_ascii_uppercase());
                san.push_str(&disambiguation(position, mve, piece, move_gen));
                if mve.is_capture() {
                    san.push('x');
                }
            }
            san.push_str(&mve.dest.to_string());
            if let Some(promotion) = mve.promotion {
                san.push('=');
                san.push(char::from(promotion).to_ascii_uppercase());
            }
        }
    }

    let mut after = position.clone();
    after.make_move(mve);
    if after.in_check(side.opposite_side()) {
        if move_gen.gen_moves(&mut after).is_empty() {
            san.push('#');
        } else {
            san.push('+');
        }
    }

    Ok(san)
}

fn find_legal_move(
    position: &Position,
    src: Square,
    dest: Square,
    promotion: Option<Piece>,
    move_gen: impl GenerateMoves,
) -> Option<Move> {
    let mut position = position.clone();
    move_gen
        .gen_moves(&mut position)
        .into_iter()
        .find(|mve| mve.src == src && mve.dest == dest && mve.promotion == promotion)
}

/// Source file, rank or square needed to tell `mve` apart from moves of other pieces of the
/// same type to the same square.
fn disambiguation(position: &Position, mve: Move, piece: Piece, move_gen: impl GenerateMoves) -> String {
    let mut position_copy = position.clone();
    let others: Vec<Square> = move_gen
        .gen_moves(&mut position_copy)
        .into_iter()
        .filter(|other| other.dest == mve.dest && other.src != mve.src)
        .filter(|other| matches!(position.piece_at(other.src), Some((other_piece, _)) if other_piece == piece))
        .map(|other| other.src)
        .collect();

    if others.is_empty() {
        String::new()
    } else if others.iter().all(|src| src.file() != mve.src.file()) {
        file_char(mve.src).to_string()
    } else if others.iter().all(|src| src.rank() != mve.src.rank()) {
        rank_char(mve.src).to_string()
    } else {
        mve.src.to_string()
    }
}

fn file_char(square: Square) -> char {
    char::from(b'a' + square.file())
}

fn rank_char(square: Square) -> char {
    char::from(b'1' + square.rank())
}
