pub mod evaluation;
pub mod game;
pub mod move_gen;
pub mod notation;
pub mod perft;
pub mod position;
pub mod search;
pub mod square;
pub mod transposition_table;

pub use evaluation::{
    outcome, piece_value, terminal_eval, Eval, EvaluatePosition, Outcome, PositionEvaluator,
    POSITION_EVALUATOR,
};
pub use game::{Game, GameError};
pub use move_gen::{gives_check, is_tactical, GenerateMoves, MailboxMoveGen, MoveList, MOVE_GEN};
pub use notation::{move_to_san, parse_uci_move, NotationError};
pub use perft::{perft, perft_divide, perft_full, PerftDepthResult, PerftResult};
pub use position::{
    CastlingRights, FenParseError, Move, MoveFlag, Piece, Position, PositionError, Side, State,
    UndoRecord, ZobristHash,
};
pub use search::{search, SearchEngine, SearchError, SearchParams, SearchResult};
pub use square::Square;
pub use transposition_table::{TranspositionTable, TranspositionTableEntry, TranspositionTableScore};

pub const NAME: &str = "jamesfish";
pub const AUTHOR: &str = "jamesfish developers";
