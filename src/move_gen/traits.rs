use arrayvec::ArrayVec;

use crate::position::{Move, Position, Side};

/// No legal position has more than 218 legal moves. Moves that leave the king in check can push a
/// pseudo-legal list past that, so lists are sized with some headroom.
pub const MAX_MOVES: usize = 256;

pub type MoveList = ArrayVec<Move, MAX_MOVES>;

pub trait GenerateMoves {
    /// Legal moves for the side to move. The position is used as scratch space while each
    /// candidate is tried and is returned unchanged.
    fn gen_moves(&self, position: &mut Position) -> MoveList;

    /// Moves for the side to move that obey piece movement but may leave the own king attacked.
    fn gen_pseudo_legal_moves(&self, position: &Position) -> MoveList;

    /// Pseudo-legal move count for `side`, whether or not it is that side's turn.
    fn count_pseudo_legal_moves(&self, position: &Position, side: Side) -> usize;
}
