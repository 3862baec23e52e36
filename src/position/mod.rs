use std::fmt;

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

use crate::square::Square::{self, *};

mod attacks;
mod fen;
pub(crate) mod movement;
mod zobrist_hash;

pub use fen::FenParseError;
pub use zobrist_hash::ZobristHash;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("{0} has {1} kings, want exactly 1")]
    KingCount(Side, usize),

    #[error("{0} has {1} pawns, want at most 8")]
    TooManyPawns(Side, usize),

    #[error("{0} has {1} pieces, want at most 16")]
    TooManyPieces(Side, usize),

    #[error("pawn on back rank at {0}")]
    PawnOnBackRank(Square),

    #[error("{0} is in check but {1} is to move")]
    OpponentInCheck(Side, Side),

    #[error("en passant target {0} doesn't follow a pawn double push")]
    EnPassantTarget(Square),
}

#[derive(Debug, PartialEq, Eq, EnumIter, Clone, Copy, Display, Hash, Deserialize, Serialize)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite_side(self) -> Side {
        if self == Side::White {
            Side::Black
        } else {
            Side::White
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, PartialEq, Eq, EnumIter, Clone, Copy, Display, Hash, Deserialize, Serialize)]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl Piece {
    /// Pieces a pawn may promote to, most valuable first.
    pub const PROMOTIONS: [Piece; 4] = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl From<Piece> for char {
    fn from(piece: Piece) -> char {
        match piece {
            Piece::Pawn => 'p',
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            Piece::Queen => 'q',
            Piece::King => 'k',
        }
    }
}

impl TryFrom<char> for Piece {
    type Error = FenParseError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            'p' => Ok(Piece::Pawn),
            'n' => Ok(Piece::Knight),
            'b' => Ok(Piece::Bishop),
            'r' => Ok(Piece::Rook),
            'q' => Ok(Piece::Queen),
            'k' => Ok(Piece::King),
            _ => Err(FenParseError::FromCharPiece(value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Deserialize, Serialize)]
pub enum MoveFlag {
    Quiet,
    DoublePawnPush,
    Capture,
    EnPassant,
    CastleKingSide,
    CastleQueenSide,
}

/// A move as produced by move generation. Two moves are equal only if every field is equal,
/// so a move built by hand must carry the same flag the generator would give it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Move {
    pub src: Square,
    pub dest: Square,
    pub promotion: Option<Piece>,
    pub flag: MoveFlag,
}

impl Move {
    pub const fn new(src: Square, dest: Square) -> Move {
        Self {
            src,
            dest,
            promotion: None,
            flag: MoveFlag::Quiet,
        }
    }

    pub const fn with_flag(src: Square, dest: Square, flag: MoveFlag) -> Move {
        Self {
            src,
            dest,
            promotion: None,
            flag,
        }
    }

    pub const fn with_promotion(src: Square, dest: Square, promotion: Piece, flag: MoveFlag) -> Self {
        Self {
            src,
            dest,
            promotion: Some(promotion),
            flag,
        }
    }

    pub fn is_capture(&self) -> bool {
        matches!(self.flag, MoveFlag::Capture | MoveFlag::EnPassant)
    }

    pub fn is_castle(&self) -> bool {
        matches!(self.flag, MoveFlag::CastleKingSide | MoveFlag::CastleQueenSide)
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.dest)?;
        if let Some(promotion) = self.promotion {
            write!(f, " ({})", promotion)?;
        }
        if self.flag != MoveFlag::Quiet {
            write!(f, " [{}]", self.flag)?;
        }
        Ok(())
    }
}

/// Long algebraic notation, e.g. `e2e4` or `e7e8q`.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(promotion) = self.promotion {
            let promotion_ch: char = promotion.into();
            write!(f, "{}{}{}", self.src, self.dest, promotion_ch)
        } else {
            write!(f, "{}{}", self.src, self.dest)
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
pub struct CastlingRights {
    pub white_king_side: bool,
    pub white_queen_side: bool,
    pub black_king_side: bool,
    pub black_queen_side: bool,
}

impl CastlingRights {
    fn start() -> Self {
        Self::new(true, true, true, true)
    }

    pub(crate) fn none() -> Self {
        Self::new(false, false, false, false)
    }

    pub(crate) fn new(
        white_king_side: bool,
        white_queen_side: bool,
        black_king_side: bool,
        black_queen_side: bool,
    ) -> Self {
        Self {
            white_king_side,
            white_queen_side,
            black_king_side,
            black_queen_side,
        }
    }

    pub fn king_side(&self, side: Side) -> bool {
        match side {
            Side::White => self.white_king_side,
            Side::Black => self.black_king_side,
        }
    }

    pub fn queen_side(&self, side: Side) -> bool {
        match side {
            Side::White => self.white_queen_side,
            Side::Black => self.black_queen_side,
        }
    }

    /// Drops every right that depends on the piece standing on `square`. Called with both the
    /// source and destination of each move, which covers king moves, rook moves and rooks being
    /// captured at home.
    fn remove_for_square(&mut self, square: Square) {
        match square {
            E1 => {
                self.white_king_side = false;
                self.white_queen_side = false;
            }
            H1 => self.white_king_side = false,
            A1 => self.white_queen_side = false,
            E8 => {
                self.black_king_side = false;
                self.black_queen_side = false;
            }
            H8 => self.black_king_side = false,
            A8 => self.black_queen_side = false,
            _ => (),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct State {
    pub to_move: Side,
    pub half_move_clock: u16,
    pub en_passant_target: Option<Square>,
    pub castling_rights: CastlingRights,
    pub full_move_counter: u16,
}

impl State {
    fn start() -> Self {
        Self {
            to_move: Side::White,
            half_move_clock: 0,
            en_passant_target: None,
            castling_rights: CastlingRights::start(),
            full_move_counter: 1,
        }
    }
}

/// Everything `Position::unmake_move` needs to reverse one `Position::make_move`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UndoRecord {
    state: State,
    captured: Option<Piece>,
    zobrist_hash: ZobristHash,
}

#[derive(Clone, Eq)]
pub struct Position {
    pub state: State,
    squares: [Option<(Piece, Side)>; 64],
    king_squares: [Square; 2],
    zobrist_hash: ZobristHash,
    /// Hashes of every position before the current one, oldest first.
    history: Vec<ZobristHash>,
}

impl Position {
    pub fn start() -> Self {
        const BACK_RANK: [Piece; 8] = [
            Piece::Rook,
            Piece::Knight,
            Piece::Bishop,
            Piece::Queen,
            Piece::King,
            Piece::Bishop,
            Piece::Knight,
            Piece::Rook,
        ];

        let mut squares = [None; 64];
        for (file, &piece) in BACK_RANK.iter().enumerate() {
            squares[file] = Some((piece, Side::White));
            squares[8 + file] = Some((Piece::Pawn, Side::White));
            squares[48 + file] = Some((Piece::Pawn, Side::Black));
            squares[56 + file] = Some((piece, Side::Black));
        }

        Self::from_parts(squares, State::start(), [E1, E8])
    }

    fn from_parts(
        squares: [Option<(Piece, Side)>; 64],
        state: State,
        king_squares: [Square; 2],
    ) -> Self {
        let zobrist_hash = ZobristHash::calculate(&squares, &state);
        Self {
            state,
            squares,
            king_squares,
            zobrist_hash,
            history: Vec::with_capacity(256),
        }
    }

    pub fn piece_at(&self, square: Square) -> Option<(Piece, Side)> {
        self.squares[square.index()]
    }

    /// Piece of `side` on `square`, if any.
    pub fn side_piece_at(&self, square: Square, side: Side) -> Option<Piece> {
        match self.squares[square.index()] {
            Some((piece, piece_side)) if piece_side == side => Some(piece),
            _ => None,
        }
    }

    pub fn king_square(&self, side: Side) -> Square {
        self.king_squares[side.index()]
    }

    pub fn zobrist_hash(&self) -> ZobristHash {
        self.zobrist_hash
    }

    /// Hashes of the positions that led to this one, oldest first.
    pub fn history(&self) -> &[ZobristHash] {
        &self.history
    }

    pub fn get_piece_locs(&self) -> ArrayVec<(Piece, Side, Square), 32> {
        let mut piece_locs = ArrayVec::new();
        for square in Square::iter() {
            if let Some((piece, side)) = self.piece_at(square) {
                piece_locs.push((piece, side, square));
            }
        }
        piece_locs
    }

    fn place(&mut self, square: Square, occupant: Option<(Piece, Side)>) {
        if let Some((Piece::King, side)) = occupant {
            self.king_squares[side.index()] = square;
        }
        self.squares[square.index()] = occupant;
    }

    fn add_piece(&mut self, square: Square, piece: Piece, side: Side) {
        debug_assert!(
            self.squares[square.index()].is_none(),
            "adding piece to occupied square {}\n{}",
            square,
            self
        );
        self.zobrist_hash.toggle_piece(square, piece, side);
        self.place(square, Some((piece, side)));
    }

    fn remove_piece(&mut self, square: Square) -> Option<(Piece, Side)> {
        let occupant = self.squares[square.index()].take();
        if let Some((piece, side)) = occupant {
            self.zobrist_hash.toggle_piece(square, piece, side);
        }
        occupant
    }

    /// Applies a move generated for this position and returns what is needed to take it back.
    ///
    /// Panics if there is no piece of the side to move on the source square: moves must come
    /// from move generation for this exact position.
    pub fn make_move(&mut self, mve: Move) -> UndoRecord {
        let Some((piece, side)) = self.piece_at(mve.src) else {
            panic!("no piece at move src {}: {:?}\n{}", mve.src, mve, self);
        };
        debug_assert_eq!(
            side, self.state.to_move,
            "moving piece of side not to move: {:?}\n{}",
            mve, self
        );

        let prev_state = self.state;
        let prev_hash = self.zobrist_hash;
        self.history.push(prev_hash);

        if let Some(en_passant_target) = self.state.en_passant_target {
            self.zobrist_hash
                .flip_en_passant(&self.squares, en_passant_target, side);
        }

        let captured = if mve.flag == MoveFlag::EnPassant {
            let captured_square = en_passant_captured_square(mve);
            self.remove_piece(captured_square).map(|(p, _)| p)
        } else {
            self.remove_piece(mve.dest).map(|(p, _)| p)
        };
        debug_assert_eq!(
            captured.is_some(),
            mve.is_capture(),
            "capture flag disagrees with board: {:?}\n{}",
            mve,
            self
        );
        debug_assert!(captured != Some(Piece::King), "captured a king: {:?}", mve);

        self.remove_piece(mve.src);
        self.add_piece(mve.dest, mve.promotion.unwrap_or(piece), side);

        if let Some((rook_src, rook_dest)) = castling_rook_squares(mve.flag, side) {
            self.remove_piece(rook_src);
            self.add_piece(rook_dest, Piece::Rook, side);
        }

        let mut castling_rights = self.state.castling_rights;
        castling_rights.remove_for_square(mve.src);
        castling_rights.remove_for_square(mve.dest);
        self.zobrist_hash
            .flip_castling_rights(self.state.castling_rights, castling_rights);
        self.state.castling_rights = castling_rights;

        self.state.en_passant_target = if mve.flag == MoveFlag::DoublePawnPush {
            let target = mve.src.offset(0, side.pawn_direction());
            if let Some(target) = target {
                self.zobrist_hash
                    .flip_en_passant(&self.squares, target, side.opposite_side());
            }
            target
        } else {
            None
        };

        if piece == Piece::Pawn || captured.is_some() {
            self.state.half_move_clock = 0;
        } else {
            self.state.half_move_clock = self.state.half_move_clock.saturating_add(1);
        }

        if side == Side::Black {
            self.state.full_move_counter = self.state.full_move_counter.saturating_add(1);
        }

        self.state.to_move = side.opposite_side();
        self.zobrist_hash.flip_side_to_move();

        debug_assert_eq!(
            self.zobrist_hash,
            ZobristHash::calculate(&self.squares, &self.state),
            "incremental hash diverged after {:?}",
            mve
        );

        UndoRecord {
            state: prev_state,
            captured,
            zobrist_hash: prev_hash,
        }
    }

    /// Reverses `make_move(mve)`. Must be given the record that call returned.
    pub fn unmake_move(&mut self, mve: Move, undo: UndoRecord) {
        let side = undo.state.to_move;

        let moved = self.squares[mve.dest.index()].take();
        debug_assert!(
            matches!(moved, Some((_, moved_side)) if moved_side == side),
            "unmake of {:?} found {:?} on destination",
            mve,
            moved
        );
        let piece = if mve.promotion.is_some() {
            Piece::Pawn
        } else {
            moved.map_or(Piece::Pawn, |(p, _)| p)
        };
        self.place(mve.src, Some((piece, side)));

        if let Some(captured) = undo.captured {
            let captured_square = if mve.flag == MoveFlag::EnPassant {
                en_passant_captured_square(mve)
            } else {
                mve.dest
            };
            self.place(captured_square, Some((captured, side.opposite_side())));
        }

        if let Some((rook_src, rook_dest)) = castling_rook_squares(mve.flag, side) {
            self.squares[rook_dest.index()] = None;
            self.place(rook_src, Some((Piece::Rook, side)));
        }

        self.state = undo.state;
        self.zobrist_hash = undo.zobrist_hash;
        self.history.pop();
    }

    /// How many times the current position occurred before, looking back only as far as the
    /// last irreversible move.
    pub fn repetition_count(&self) -> usize {
        self.history
            .iter()
            .rev()
            .take(self.state.half_move_clock as usize)
            .skip(1)
            .step_by(2)
            .filter(|&&hash| hash == self.zobrist_hash)
            .count()
    }

    pub fn is_threefold_repetition(&self) -> bool {
        self.repetition_count() >= 2
    }

    pub fn is_fifty_move_draw(&self) -> bool {
        self.state.half_move_clock >= 100
    }

    /// Neither side can mate with the material on the board: bare kings, a single minor
    /// piece, or only bishops all on squares of one colour.
    pub fn has_insufficient_material(&self) -> bool {
        let mut minors = 0;
        let mut knights = 0;
        let mut light_bishops = 0;
        let mut dark_bishops = 0;

        for (piece, _, square) in self.get_piece_locs() {
            match piece {
                Piece::King => (),
                Piece::Pawn | Piece::Rook | Piece::Queen => return false,
                Piece::Knight => {
                    minors += 1;
                    knights += 1;
                }
                Piece::Bishop => {
                    minors += 1;
                    if square.is_light() {
                        light_bishops += 1;
                    } else {
                        dark_bishops += 1;
                    }
                }
            }
        }

        minors <= 1 || (knights == 0 && (light_bishops == 0 || dark_bishops == 0))
    }

    /// Rejects positions no legal game can reach in ways the engine depends on.
    pub fn validate(&self) -> Result<(), PositionError> {
        for side in Side::iter() {
            let mut kings = 0;
            let mut pawns = 0;
            let mut pieces = 0;
            for (idx, occupant) in self.squares.iter().enumerate() {
                let Some((piece, piece_side)) = *occupant else {
                    continue;
                };
                if piece_side != side {
                    continue;
                }
                pieces += 1;
                match piece {
                    Piece::King => kings += 1,
                    Piece::Pawn => {
                        pawns += 1;
                        let rank = idx / 8;
                        if rank == 0 || rank == 7 {
                            if let Some(square) = Square::from_repr(idx as u8) {
                                return Err(PositionError::PawnOnBackRank(square));
                            }
                        }
                    }
                    _ => (),
                }
            }
            if kings != 1 {
                return Err(PositionError::KingCount(side, kings));
            }
            if pawns > 8 {
                return Err(PositionError::TooManyPawns(side, pawns));
            }
            if pieces > 16 {
                return Err(PositionError::TooManyPieces(side, pieces));
            }
        }

        if let Some(target) = self.state.en_passant_target {
            if !self.follows_double_push(target) {
                return Err(PositionError::EnPassantTarget(target));
            }
        }

        let waiting_side = self.state.to_move.opposite_side();
        if self.in_check(waiting_side) {
            return Err(PositionError::OpponentInCheck(
                waiting_side,
                self.state.to_move,
            ));
        }

        Ok(())
    }

    /// Target is empty, the pushed pawn stands in front of it and the square it came from is
    /// empty.
    fn follows_double_push(&self, target: Square) -> bool {
        let pushed_side = self.state.to_move.opposite_side();
        let direction = pushed_side.pawn_direction();
        self.piece_at(target).is_none()
            && target
                .offset(0, direction)
                .is_some_and(|square| self.piece_at(square) == Some((Piece::Pawn, pushed_side)))
            && target
                .offset(0, -direction)
                .is_some_and(|square| self.piece_at(square).is_none())
    }
}

fn en_passant_captured_square(mve: Move) -> Square {
    match Square::from_file_rank(mve.dest.file(), mve.src.rank()) {
        Some(square) => square,
        None => unreachable!("file and rank come from valid squares"),
    }
}

/// Rook (source, destination) for a castling move.
fn castling_rook_squares(flag: MoveFlag, side: Side) -> Option<(Square, Square)> {
    match (flag, side) {
        (MoveFlag::CastleKingSide, Side::White) => Some((H1, F1)),
        (MoveFlag::CastleQueenSide, Side::White) => Some((A1, D1)),
        (MoveFlag::CastleKingSide, Side::Black) => Some((H8, F8)),
        (MoveFlag::CastleQueenSide, Side::Black) => Some((A8, D8)),
        _ => None,
    }
}

// Manually implement PartialEq for Position because we want to ignore the history field
impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
            && self.squares == other.squares
            && self.zobrist_hash == other.zobrist_hash
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut board_str = String::with_capacity(64 + 7);
        Square::list_white_perspective()
            .into_iter()
            .enumerate()
            .for_each(|(idx, square)| {
                let ch = match self.piece_at(square) {
                    Some((p, Side::White)) => char::from(p).to_ascii_uppercase(),
                    Some((p, Side::Black)) => char::from(p),
                    None => '.',
                };

                board_str.push(ch);
                if (idx + 1) % 8 == 0 && idx != 63 {
                    board_str.push('\n');
                }
            });
        write!(f, "{}", board_str)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self, self.to_fen())
    }
}
