use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::evaluation::{self, Eval, EvaluatePosition, Outcome};
use crate::move_gen::GenerateMoves;
use crate::notation::{self, NotationError};
use crate::position::{FenParseError, Move, Position};
use crate::search::{SearchEngine, SearchError, SearchParams, SearchResult};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error(transparent)]
    Fen(#[from] FenParseError),

    #[error(transparent)]
    Notation(#[from] NotationError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("game is over: {0}")]
    GameOver(Outcome),
}

/// One game in progress: the current position, the moves that led to it and an engine to
/// play either side.
pub struct Game<G, E> {
    position: Position,
    moves: Vec<Move>,
    engine: SearchEngine<G, E>,
}

impl<G, E> Game<G, E>
where
    G: GenerateMoves + Copy,
    E: EvaluatePosition + Copy,
{
    pub fn new(engine: SearchEngine<G, E>) -> Self {
        Self {
            position: Position::start(),
            moves: Vec::new(),
            engine,
        }
    }

    pub fn from_fen(fen: &str, mut engine: SearchEngine<G, E>) -> Result<Self, GameError> {
        let position = Position::from_fen(fen)?;
        engine.clear();
        Ok(Self {
            position,
            moves: Vec::new(),
            engine,
        })
    }

    /// Starts the game again from `position`, dropping the move list and anything the
    /// engine has cached.
    pub fn reset(&mut self, position: Position) {
        self.position = position;
        self.moves.clear();
        self.engine.clear();
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Moves played since the game's starting position.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn fen(&self) -> String {
        self.position.to_fen()
    }

    /// Static evaluation from the point of view of the side to move.
    pub fn evaluate(&self) -> Eval {
        self.engine.evaluate(&self.position)
    }

    pub fn legal_moves(&mut self) -> Vec<Move> {
        self.engine.move_gen().gen_moves(&mut self.position).to_vec()
    }

    pub fn outcome(&mut self) -> Option<Outcome> {
        let moves = self.engine.move_gen().gen_moves(&mut self.position);
        evaluation::outcome(&self.position, &moves)
    }

    /// Plays a move given in long algebraic notation and returns it with its flags filled in.
    pub fn play_uci(&mut self, move_str: &str) -> Result<Move, GameError> {
        self.ensure_not_over()?;
        let mve = notation::parse_uci_move(&self.position, move_str, self.engine.move_gen())?;
        self.push(mve);
        Ok(mve)
    }

    /// Lets the engine choose and play a move within `time_budget`.
    pub fn play_engine_move(&mut self, time_budget: Duration) -> Result<SearchResult, GameError> {
        let params = SearchParams {
            move_time: Some(time_budget),
            ..SearchParams::default()
        };
        self.play_engine_move_with(&params, Arc::new(AtomicBool::new(false)))
    }

    pub fn play_engine_move_with(
        &mut self,
        params: &SearchParams,
        terminate: Arc<AtomicBool>,
    ) -> Result<SearchResult, GameError> {
        self.ensure_not_over()?;
        let result = self.engine.search(&self.position, params, terminate)?;
        if let Some(mve) = result.best_move {
            debug!("Engine plays {} ({})", mve, result.eval);
            self.push(mve);
        }
        Ok(result)
    }

    fn push(&mut self, mve: Move) {
        self.position.make_move(mve);
        self.moves.push(mve);
    }

    fn ensure_not_over(&mut self) -> Result<(), GameError> {
        match self.outcome() {
            Some(outcome) => Err(GameError::GameOver(outcome)),
            None => Ok(()),
        }
    }
}
