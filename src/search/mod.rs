use std::collections::HashMap;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, debug_span, info};

use crate::evaluation::{self, Eval, EvaluatePosition, Outcome};
use crate::move_gen::{gives_check, is_tactical, GenerateMoves, MoveList};
use crate::position::{Move, Position, PositionError, Side};
use crate::search::move_ordering::order_moves;
use crate::transposition_table::{TranspositionTable, TranspositionTableScore};

mod move_ordering;

/// Deepest iteration run when no depth limit is given.
pub const MAX_DEPTH: u8 = 64;
/// Hard cap on distance from the root, quiescence included.
pub const MAX_PLY: usize = 128;
/// Quiescence plies searched past the nominal depth.
const MAX_QUIESCENCE_PLY: usize = 16;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchParams {
    /// Restrict the root to these moves. An empty list restricts nothing.
    pub search_moves: Option<Vec<Move>>,
    pub white_time: Option<Duration>,
    pub black_time: Option<Duration>,
    pub white_inc: Option<Duration>,
    pub black_inc: Option<Duration>,
    pub moves_to_go: Option<u16>,
    pub max_depth: Option<u8>,
    pub max_nodes: Option<u64>,
    pub move_time: Option<Duration>,
    /// Search moves in generation order. The result is the same, only slower.
    pub disable_move_ordering: bool,
}

impl Display for SearchParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Print out only non default fields
        let mut parts = vec![];

        if let Some(search_moves) = &self.search_moves {
            let moves = search_moves
                .iter()
                .map(|mve| mve.to_string())
                .collect::<Vec<_>>();
            parts.push(format!("search_moves: [{}]", moves.join(" ")));
        }
        let durations = [
            ("white_time", self.white_time),
            ("black_time", self.black_time),
            ("white_inc", self.white_inc),
            ("black_inc", self.black_inc),
            ("move_time", self.move_time),
        ];
        for (name, duration) in durations {
            if let Some(duration) = duration {
                parts.push(format!("{}: {:?}", name, duration));
            }
        }
        if let Some(moves_to_go) = self.moves_to_go {
            parts.push(format!("moves_to_go: {}", moves_to_go));
        }
        if let Some(max_depth) = self.max_depth {
            parts.push(format!("max_depth: {}", max_depth));
        }
        if let Some(max_nodes) = self.max_nodes {
            parts.push(format!("max_nodes: {}", max_nodes));
        }
        if self.disable_move_ordering {
            parts.push("disable_move_ordering: true".to_string());
        }
        write!(f, "SearchParams: {}", parts.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// `None` only when the side to move has no legal moves.
    pub best_move: Option<Move>,
    pub eval: Eval,
    /// Last fully searched depth. Zero if no iteration finished.
    pub depth: u8,
    /// Principal variation, starting with `best_move`.
    pub pv: Vec<Move>,
    pub nodes: u64,
    pub seldepth: usize,
    pub time_elapsed: Duration,
    /// Scores of the root moves at `depth`. Exact for the best move, upper bounds for the rest.
    pub move_evals: HashMap<Move, Eval>,
    /// Set when the game is already over at the root.
    pub outcome: Option<Outcome>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("max depth must be at least 1")]
    ZeroDepth,

    #[error("search move {0} is not legal in this position")]
    IllegalSearchMove(Move),

    #[error("invalid position: {0}")]
    InvalidPosition(#[from] PositionError),
}

/// Searches `position` with iterative deepening until a limit in `params` is reached or
/// `terminate` is set, and returns the result of the deepest completed iteration.
pub fn search(
    position: &Position,
    params: &SearchParams,
    move_gen: impl GenerateMoves + Copy,
    position_eval: impl EvaluatePosition + Copy,
    transposition_table: &mut TranspositionTable,
    terminate: Arc<AtomicBool>,
) -> Result<SearchResult, SearchError> {
    let _span = debug_span!("search", position = %position.to_fen(), params = %params).entered();
    let start = Instant::now();

    position.validate()?;
    let max_depth = match params.max_depth {
        Some(0) => return Err(SearchError::ZeroDepth),
        Some(max_depth) => max_depth.min(MAX_DEPTH),
        None => MAX_DEPTH,
    };

    let mut position = position.clone();
    let mut root_moves = move_gen.gen_moves(&mut position);

    if root_moves.is_empty() {
        let outcome = evaluation::outcome(&position, &root_moves);
        debug!("No legal moves: {:?}", outcome);
        return Ok(SearchResult {
            best_move: None,
            eval: outcome.map_or(Eval::DRAW, |outcome| evaluation::terminal_eval(outcome, 0)),
            depth: 0,
            pv: Vec::new(),
            nodes: 0,
            seldepth: 0,
            time_elapsed: start.elapsed(),
            move_evals: HashMap::new(),
            outcome,
        });
    }

    if let Some(search_moves) = params.search_moves.as_ref().filter(|moves| !moves.is_empty()) {
        if let Some(&illegal) = search_moves.iter().find(|mve| !root_moves.contains(mve)) {
            return Err(SearchError::IllegalSearchMove(illegal));
        }
        root_moves.retain(|mve| search_moves.contains(mve));
    }

    let (maybe_soft_time_limit, maybe_hard_time_limit) =
        get_time_to_use(params, position.state.to_move);
    debug!(
        "Time for this move: soft limit={:?} hard limit={:?}",
        maybe_soft_time_limit, maybe_hard_time_limit
    );

    transposition_table.new_search();

    let mut searcher = Searcher {
        move_gen,
        position_eval,
        transposition_table,
        terminate: &terminate,
        start,
        hard_time_limit: maybe_hard_time_limit,
        max_nodes: params.max_nodes,
        order_moves: !params.disable_move_ordering,
        nodes: 0,
        seldepth: 0,
    };

    if searcher.order_moves {
        let tt_move = searcher
            .transposition_table
            .get(position.zobrist_hash(), 0)
            .and_then(|entry| entry.best_move);
        order_moves(&mut root_moves, &position, tt_move);
    }

    let mut completed: Option<RootResult> = None;

    for depth in 1..=max_depth {
        let _iteration_span = debug_span!("search_iterative_deepening_iteration", depth).entered();
        let iteration_start = Instant::now();

        let Some(iteration) = searcher.search_root(&mut position, &root_moves, depth) else {
            debug!("Search aborted during depth {}", depth);
            break;
        };

        // Search the best move first next iteration.
        if searcher.order_moves {
            if let Some(idx) = root_moves.iter().position(|&mve| mve == iteration.best_move) {
                root_moves[..=idx].rotate_right(1);
            }
        }

        let pv = searcher.principal_variation(&position, iteration.best_move, depth);
        write_search_info(
            depth,
            searcher.seldepth,
            iteration.eval,
            searcher.nodes,
            &start,
            searcher.transposition_table.hashfull(),
            &pv,
        );

        if tracing::enabled!(tracing::Level::DEBUG) {
            let moves_str = root_moves
                .iter()
                .filter_map(|mve| iteration.move_evals.get(mve).map(|eval| format!("{}: {}", mve, eval)))
                .collect::<Vec<_>>()
                .join(" | ");
            debug!("Moves: {}", moves_str);
        }

        let found_mate = iteration.eval.is_mate()
            && (Eval::MATE.0 - iteration.eval.0.abs()) <= i32::from(depth);
        completed = Some(RootResult { depth, pv, ..iteration });

        if found_mate {
            debug!("Forced mate within search depth, stopping");
            break;
        }

        // Skip if we've elapsed the max amount of time or we think the next iteration will
        // go over on time
        let elapsed = start.elapsed();
        if let Some(soft_time_limit) = maybe_soft_time_limit {
            if elapsed + iteration_start.elapsed() > soft_time_limit {
                debug!(
                    "Search time exceeded soft limit: {:?} > {:?}",
                    elapsed, soft_time_limit
                );
                break;
            }
        }
    }

    let result = match completed {
        Some(completed) => SearchResult {
            best_move: Some(completed.best_move),
            eval: completed.eval,
            depth: completed.depth,
            pv: completed.pv,
            nodes: searcher.nodes,
            seldepth: searcher.seldepth,
            time_elapsed: start.elapsed(),
            move_evals: completed.move_evals,
            outcome: None,
        },
        None => {
            debug!("No iteration completed, falling back to first ordered move");
            let fallback = root_moves.first().copied();
            SearchResult {
                best_move: fallback,
                eval: position_eval.evaluate(&position),
                depth: 0,
                pv: fallback.into_iter().collect(),
                nodes: searcher.nodes,
                seldepth: searcher.seldepth,
                time_elapsed: start.elapsed(),
                move_evals: HashMap::new(),
                outcome: None,
            }
        }
    };

    Ok(result)
}

/// Owns everything needed to play: move generation, evaluation and a transposition table
/// that persists across moves of one game.
#[derive(Debug)]
pub struct SearchEngine<G, E> {
    move_gen: G,
    position_eval: E,
    transposition_table: TranspositionTable,
}

impl<G, E> SearchEngine<G, E>
where
    G: GenerateMoves + Copy,
    E: EvaluatePosition + Copy,
{
    pub fn new(move_gen: G, position_eval: E, transposition_table: TranspositionTable) -> Self {
        Self {
            move_gen,
            position_eval,
            transposition_table,
        }
    }

    /// Best move found within `time_budget`.
    pub fn choose_move(
        &mut self,
        position: &Position,
        time_budget: Duration,
    ) -> Result<SearchResult, SearchError> {
        let params = SearchParams {
            move_time: Some(time_budget),
            ..SearchParams::default()
        };
        self.search(position, &params, Arc::new(AtomicBool::new(false)))
    }

    pub fn search(
        &mut self,
        position: &Position,
        params: &SearchParams,
        terminate: Arc<AtomicBool>,
    ) -> Result<SearchResult, SearchError> {
        search(
            position,
            params,
            self.move_gen,
            self.position_eval,
            &mut self.transposition_table,
            terminate,
        )
    }

    pub fn evaluate(&self, position: &Position) -> Eval {
        self.position_eval.evaluate(position)
    }

    pub fn move_gen(&self) -> G {
        self.move_gen
    }

    /// Forget everything learned in previous searches.
    pub fn clear(&mut self) {
        self.transposition_table.clear();
    }
}

fn get_time_to_use(
    params: &SearchParams,
    side_to_move: Side,
) -> (Option<Duration>, Option<Duration>) {
    let (soft, mut hard) = match (side_to_move, params.white_time, params.black_time) {
        (Side::White, Some(white_time), _) => {
            let (soft, hard) = calc_time_to_use(white_time, params.white_inc, params.moves_to_go);
            (Some(soft), Some(hard))
        }
        (Side::Black, _, Some(black_time)) => {
            let (soft, hard) = calc_time_to_use(black_time, params.black_inc, params.moves_to_go);
            (Some(soft), Some(hard))
        }
        (_, _, _) => (None, None),
    };
    if let Some(move_time) = params.move_time {
        hard = Some(move_time);
    }
    (soft, hard)
}

/// Calculate the time to use during search.
/// Returns a soft and hard limit time.
fn calc_time_to_use(
    time_left: Duration,
    maybe_time_inc: Option<Duration>,
    maybe_moves_to_go: Option<u16>,
) -> (Duration, Duration) {
    let time_inc = maybe_time_inc.unwrap_or(Duration::ZERO);
    let usable_time = time_left - (time_left / 20);
    let moves_to_go = maybe_moves_to_go.unwrap_or(40).max(1);
    let soft_limit = (usable_time / moves_to_go.into()) + time_inc;
    let hard_limit = soft_limit * 2;
    (soft_limit, hard_limit)
}

struct RootResult {
    best_move: Move,
    eval: Eval,
    depth: u8,
    pv: Vec<Move>,
    move_evals: HashMap<Move, Eval>,
}

struct Searcher<'a, G, E> {
    move_gen: G,
    position_eval: E,
    transposition_table: &'a mut TranspositionTable,
    terminate: &'a AtomicBool,
    start: Instant,
    hard_time_limit: Option<Duration>,
    max_nodes: Option<u64>,
    order_moves: bool,
    nodes: u64,
    seldepth: usize,
}

impl<G: GenerateMoves + Copy, E: EvaluatePosition + Copy> Searcher<'_, G, E> {
    /// Checked once per node, before it is counted.
    fn should_stop(&self) -> bool {
        if self.terminate.load(Ordering::Relaxed) {
            return true;
        }
        if let Some(max_nodes) = self.max_nodes {
            if self.nodes >= max_nodes {
                return true;
            }
        }
        if let Some(hard_time_limit) = self.hard_time_limit {
            if self.start.elapsed() >= hard_time_limit {
                debug!("Search elapsed total time: {:?}", hard_time_limit);
                return true;
            }
        }
        false
    }

    fn enter_node(&mut self, ply: usize) -> Option<()> {
        if self.should_stop() {
            return None;
        }
        self.nodes += 1;
        self.seldepth = self.seldepth.max(ply);
        Some(())
    }

    /// One full-window iteration over the root moves. `None` if the search was stopped.
    fn search_root(
        &mut self,
        position: &mut Position,
        root_moves: &[Move],
        depth: u8,
    ) -> Option<RootResult> {
        self.enter_node(0)?;

        let mut alpha = -Eval::INFINITY;
        let beta = Eval::INFINITY;
        let mut best: Option<(Move, Eval)> = None;
        let mut move_evals = HashMap::with_capacity(root_moves.len());

        for (idx, &mve) in root_moves.iter().enumerate() {
            let eval = self.search_child(position, mve, idx == 0, depth - 1, 1, alpha, beta)?;
            move_evals.insert(mve, eval);

            if best.map_or(true, |(_, best_eval)| eval > best_eval) {
                best = Some((mve, eval));
            }
            alpha = alpha.max(eval);
        }

        let (best_move, eval) = best?;
        self.transposition_table.store(
            position.zobrist_hash(),
            TranspositionTableScore::Exact(eval),
            Some(best_move),
            depth,
            0,
        );

        Some(RootResult {
            best_move,
            eval,
            depth,
            pv: Vec::new(),
            move_evals,
        })
    }

    /// Plays `mve`, searches the child with principal variation search and takes the move
    /// back. The first move gets the full window, later ones a null window that is widened
    /// only when they might beat `alpha`.
    #[allow(clippy::too_many_arguments)]
    fn search_child(
        &mut self,
        position: &mut Position,
        mve: Move,
        is_first: bool,
        depth: u8,
        ply: usize,
        alpha: Eval,
        beta: Eval,
    ) -> Option<Eval> {
        let undo = position.make_move(mve);

        let eval = if is_first {
            self.negamax(position, depth, ply, -beta, -alpha).map(|eval| -eval)
        } else {
            self.negamax(position, depth, ply, -alpha - 1, -alpha)
                .map(|eval| -eval)
                .and_then(|eval| {
                    if alpha < eval && eval < beta {
                        self.negamax(position, depth, ply, -beta, -alpha)
                            .map(|eval| -eval)
                    } else {
                        Some(eval)
                    }
                })
        };

        // Unmake before reporting an abort so the caller's position stays intact.
        position.unmake_move(mve, undo);
        eval
    }

    fn negamax(
        &mut self,
        position: &mut Position,
        depth: u8,
        ply: usize,
        mut alpha: Eval,
        beta: Eval,
    ) -> Option<Eval> {
        if depth == 0 || ply >= MAX_PLY {
            return self.quiescence_search(position, ply, 0, alpha, beta);
        }
        self.enter_node(ply)?;

        let mut moves = self.move_gen.gen_moves(position);
        if let Some(outcome) = evaluation::outcome(position, &moves) {
            return Some(evaluation::terminal_eval(outcome, ply));
        }

        let hash = position.zobrist_hash();
        let maybe_tt_entry = self.transposition_table.get(hash, ply);
        if let Some(tt_entry) = maybe_tt_entry {
            // A repeated path can score differently from the stored line.
            if tt_entry.depth >= depth && position.repetition_count() == 0 {
                match tt_entry.score {
                    TranspositionTableScore::Exact(eval) => return Some(eval),
                    TranspositionTableScore::LowerBound(eval) if eval >= beta => {
                        return Some(eval)
                    }
                    TranspositionTableScore::UpperBound(eval) if eval <= alpha => {
                        return Some(eval)
                    }
                    _ => (),
                }
            }
        }

        if self.order_moves {
            let tt_move = maybe_tt_entry.and_then(|entry| entry.best_move);
            order_moves(&mut moves, position, tt_move);
        }

        let original_alpha = alpha;
        let mut best_eval = -Eval::INFINITY;
        let mut best_move = None;

        for (idx, &mve) in moves.iter().enumerate() {
            let eval = self.search_child(position, mve, idx == 0, depth - 1, ply + 1, alpha, beta)?;

            if eval > best_eval {
                best_eval = eval;
                best_move = Some(mve);
            }
            alpha = alpha.max(eval);
            if alpha >= beta {
                break;
            }
        }

        let score = if best_eval >= beta {
            TranspositionTableScore::LowerBound(best_eval)
        } else if best_eval <= original_alpha {
            TranspositionTableScore::UpperBound(best_eval)
        } else {
            TranspositionTableScore::Exact(best_eval)
        };
        self.transposition_table
            .store(hash, score, best_move, depth, ply);

        Some(best_eval)
    }

    /// Source: https://www.chessprogramming.org/Quiescence_Search
    ///
    /// Searches captures and queen/knight promotions until the position is quiet. Checking
    /// moves are added on the first quiescence ply, and every evasion is searched when in check.
    fn quiescence_search(
        &mut self,
        position: &mut Position,
        ply: usize,
        qply: usize,
        mut alpha: Eval,
        beta: Eval,
    ) -> Option<Eval> {
        self.enter_node(ply)?;

        let mut moves = self.move_gen.gen_moves(position);
        if let Some(outcome) = evaluation::outcome(position, &moves) {
            return Some(evaluation::terminal_eval(outcome, ply));
        }

        if qply >= MAX_QUIESCENCE_PLY || ply >= MAX_PLY {
            return Some(self.position_eval.evaluate(position));
        }

        let in_check = position.in_check(position.state.to_move);
        let mut best_eval = if in_check {
            -Eval::INFINITY
        } else {
            let standing_pat = self.position_eval.evaluate(position);
            if standing_pat >= beta {
                return Some(standing_pat);
            }
            alpha = alpha.max(standing_pat);
            standing_pat
        };

        if !in_check {
            retain_quiescence_moves(&mut moves, position, qply);
        }

        if self.order_moves {
            order_moves(&mut moves, position, None);
        }

        for mve in moves {
            let undo = position.make_move(mve);
            let child_eval = self.quiescence_search(position, ply + 1, qply + 1, -beta, -alpha);
            position.unmake_move(mve, undo);
            // Flip value because it was relative to the other side
            let eval = -child_eval?;

            if eval > best_eval {
                best_eval = eval;
            }
            if eval >= beta {
                break;
            }
            alpha = alpha.max(eval);
        }

        Some(best_eval)
    }

    /// Follows best moves stored in the transposition table from the position after
    /// `best_move`, keeping only moves that are legal where they are played.
    fn principal_variation(&self, position: &Position, best_move: Move, depth: u8) -> Vec<Move> {
        let mut position = position.clone();
        let mut pv = vec![best_move];
        position.make_move(best_move);

        while pv.len() < usize::from(depth) {
            let Some(mve) = self
                .transposition_table
                .get(position.zobrist_hash(), pv.len())
                .and_then(|entry| entry.best_move)
            else {
                break;
            };
            if !self.move_gen.gen_moves(&mut position).contains(&mve) {
                break;
            }
            position.make_move(mve);
            pv.push(mve);
            if position.repetition_count() > 0 {
                break;
            }
        }
        pv
    }
}

fn retain_quiescence_moves(moves: &mut MoveList, position: &mut Position, qply: usize) {
    moves.retain(|mve| is_tactical(*mve) || (qply == 0 && gives_check(position, *mve)));
}

fn write_search_info(
    depth: u8,
    seldepth: usize,
    eval: Eval,
    nodes: u64,
    start_time: &Instant,
    hashfull: usize,
    pv: &[Move],
) {
    let elapsed = start_time.elapsed();
    let nps = nodes as f64 / elapsed.as_secs_f64().max(1e-6);
    let pv_str = pv
        .iter()
        .map(|mve| mve.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    info!(
        target: "search_info",
        "info depth {} seldepth {} score {} nodes {} nps {:.0} hashfull {} time {} pv {}",
        depth,
        seldepth,
        eval,
        nodes,
        nps,
        hashfull,
        elapsed.as_millis(),
        pv_str,
    );
}
