use std::str::FromStr;

use crate::position::{CastlingRights, Piece, Position, PositionError, Side, State};
use crate::square::Square::{self, *};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FenParseError {
    #[error("num fields: want 4 or 6 got {0}")]
    NumFields(usize),

    #[error("char -> piece: got {0}")]
    FromCharPiece(char),

    #[error("piece placement: got {0}, err at {1}")]
    PiecePlacement(String, usize),

    #[error("side to move: want 'w'|'b' got {0}")]
    SideToMove(String),

    #[error("castling rights given: got {0}, err at idx {1}")]
    CastlingRights(String, usize),

    #[error("en passant target: got {0}")]
    EnPassantTarget(String),

    #[error("halfmove clock: want 0 <= x < 65_535 got {0}")]
    HalfmoveClock(String),

    #[error("full move counter: want 1 <= x < 65_535 got {0}")]
    FullMoveCounter(String),

    #[error("illegal position: {0}")]
    IllegalPosition(#[from] PositionError),
}

impl FromStr for Position {
    type Err = FenParseError;

    fn from_str(fen: &str) -> Result<Self, Self::Err> {
        Position::from_fen(fen)
    }
}

impl Position {
    /// Parses a FEN string. The move clocks may be omitted, in which case they default to `0 1`.
    /// Castling rights whose king or rook is not on its home square are dropped.
    pub fn from_fen(fen: &str) -> Result<Self, FenParseError> {
        let fields = fen.split_whitespace().collect::<Vec<&str>>();

        if fields.len() != 6 && fields.len() != 4 {
            Err(FenParseError::NumFields(fields.len()))?
        }

        let squares = pieces_from_fen(fields[0])?;

        let to_move = match fields[1] {
            "w" => Side::White,
            "b" => Side::Black,
            _ => Err(FenParseError::SideToMove(String::from(fields[1])))?,
        };

        let half_move_clock_str = fields.get(4).copied().unwrap_or("0");
        let half_move_clock = half_move_clock_str
            .parse::<u16>()
            .map_err(|_| FenParseError::HalfmoveClock(half_move_clock_str.to_string()))?;

        let full_move_counter_str = fields.get(5).copied().unwrap_or("1");
        let full_move_counter = full_move_counter_str
            .parse::<u16>()
            .ok()
            .filter(|&counter| counter >= 1)
            .ok_or_else(|| FenParseError::FullMoveCounter(full_move_counter_str.to_string()))?;

        let mut castling_rights = castling_rights_from_fen(fields[2])?;
        retain_consistent_castling_rights(&mut castling_rights, &squares);

        let state = State {
            castling_rights,
            en_passant_target: en_passant_target_from_fen(fields[3], to_move)?,
            half_move_clock,
            to_move,
            full_move_counter,
        };

        let king_square = |side: Side| {
            squares
                .iter()
                .position(|&occupant| occupant == Some((Piece::King, side)))
                .and_then(|idx| Square::from_repr(idx as u8))
        };
        let (white_king, black_king) = match (king_square(Side::White), king_square(Side::Black)) {
            (Some(white_king), Some(black_king)) => (white_king, black_king),
            (None, _) => Err(PositionError::KingCount(Side::White, 0))?,
            (_, None) => Err(PositionError::KingCount(Side::Black, 0))?,
        };

        let position = Position::from_parts(squares, state, [white_king, black_king]);
        position.validate()?;
        Ok(position)
    }

    pub fn to_fen(&self) -> String {
        let mut pieces = String::with_capacity(64);
        let mut curr_empty_count = 0;

        for (idx, &sq) in FEN_SQUARE_ORDER.iter().enumerate() {
            if let Some((piece, side)) = self.piece_at(sq) {
                if curr_empty_count != 0 {
                    pieces += &curr_empty_count.to_string();
                    curr_empty_count = 0;
                }
                let piece_char: char = if side == Side::White {
                    char::from(piece).to_ascii_uppercase()
                } else {
                    char::from(piece)
                };
                pieces.push(piece_char);
            } else {
                curr_empty_count += 1;
            }
            if (idx + 1) % 8 == 0 {
                if curr_empty_count != 0 {
                    pieces += &curr_empty_count.to_string();
                    curr_empty_count = 0;
                }
                if idx != 63 {
                    pieces += "/";
                }
            }
        }

        let side_to_move_char = if self.state.to_move == Side::White {
            'w'
        } else {
            'b'
        };

        let mut castling_rights = String::with_capacity(4);

        if self.state.castling_rights.white_king_side {
            castling_rights += "K";
        }
        if self.state.castling_rights.white_queen_side {
            castling_rights += "Q";
        }
        if self.state.castling_rights.black_king_side {
            castling_rights += "k";
        }
        if self.state.castling_rights.black_queen_side {
            castling_rights += "q";
        }

        if castling_rights.is_empty() {
            castling_rights += "-";
        }

        let en_passant = if let Some(ep_target) = self.state.en_passant_target {
            ep_target.to_string()
        } else {
            "-".to_string()
        };

        format!(
            "{} {} {} {} {} {}",
            pieces,
            side_to_move_char,
            castling_rights,
            en_passant,
            self.state.half_move_clock,
            self.state.full_move_counter
        )
    }
}

fn castling_rights_from_fen(castling_rights_str: &str) -> Result<CastlingRights, FenParseError> {
    if castling_rights_str.is_empty() || castling_rights_str == "-" {
        return Ok(CastlingRights::none());
    }

    let mut rights = CastlingRights::none();

    for (idx, ch) in castling_rights_str.chars().enumerate() {
        let right = match ch {
            'K' => &mut rights.white_king_side,
            'Q' => &mut rights.white_queen_side,
            'k' => &mut rights.black_king_side,
            'q' => &mut rights.black_queen_side,
            _ => {
                return Err(FenParseError::CastlingRights(
                    castling_rights_str.to_string(),
                    idx,
                ));
            }
        };
        if *right {
            return Err(FenParseError::CastlingRights(
                castling_rights_str.to_string(),
                idx,
            ));
        }
        *right = true;
    }

    Ok(rights)
}

fn retain_consistent_castling_rights(
    rights: &mut CastlingRights,
    squares: &[Option<(Piece, Side)>; 64],
) {
    let has = |square: Square, piece: Piece, side: Side| squares[square.index()] == Some((piece, side));

    let white_king_home = has(E1, Piece::King, Side::White);
    let black_king_home = has(E8, Piece::King, Side::Black);
    rights.white_king_side &= white_king_home && has(H1, Piece::Rook, Side::White);
    rights.white_queen_side &= white_king_home && has(A1, Piece::Rook, Side::White);
    rights.black_king_side &= black_king_home && has(H8, Piece::Rook, Side::Black);
    rights.black_queen_side &= black_king_home && has(A8, Piece::Rook, Side::Black);
}

fn en_passant_target_from_fen(
    en_passant_target_str: &str,
    to_move: Side,
) -> Result<Option<Square>, FenParseError> {
    if en_passant_target_str == "-" {
        return Ok(None);
    }

    let target = Square::from_str(en_passant_target_str)
        .map_err(|_| FenParseError::EnPassantTarget(en_passant_target_str.to_string()))?;

    // The target sits behind a pawn of the side that just moved.
    let want_rank = if to_move == Side::White { 5 } else { 2 };
    if target.rank() != want_rank {
        return Err(FenParseError::EnPassantTarget(
            en_passant_target_str.to_string(),
        ));
    }

    Ok(Some(target))
}

const FEN_SQUARE_ORDER: [Square; 64] = Square::list_white_perspective();

fn pieces_from_fen(pieces_str: &str) -> Result<[Option<(Piece, Side)>; 64], FenParseError> {
    let mut squares = [None; 64];
    let placement_err = |ch_idx: usize| FenParseError::PiecePlacement(pieces_str.to_string(), ch_idx);

    let ranks: Vec<&str> = pieces_str.split('/').collect();
    if ranks.len() != 8 {
        return Err(placement_err(pieces_str.len()));
    }

    let mut ch_idx = 0;
    for (rank_idx, rank_str) in ranks.iter().enumerate() {
        let mut file_idx = 0;
        for ch in rank_str.chars() {
            if let Some(digit) = ch.to_digit(10) {
                if digit == 0 || digit > 8 {
                    return Err(placement_err(ch_idx));
                }
                file_idx += digit as usize;
            } else {
                let piece = Piece::try_from(ch.to_ascii_lowercase())
                    .map_err(|_| placement_err(ch_idx))?;
                if file_idx >= 8 {
                    return Err(placement_err(ch_idx));
                }
                let side = if ch.is_uppercase() {
                    Side::White
                } else {
                    Side::Black
                };
                let square = FEN_SQUARE_ORDER[rank_idx * 8 + file_idx];
                squares[square.index()] = Some((piece, side));
                file_idx += 1;
            }
            ch_idx += 1;
        }
        if file_idx != 8 {
            return Err(placement_err(ch_idx));
        }
        // Skip the '/'
        ch_idx += 1;
    }

    Ok(squares)
}
