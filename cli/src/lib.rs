use std::sync::{Arc, atomic::AtomicBool};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use jamesfish::{
    EvaluatePosition, MOVE_GEN, POSITION_EVALUATOR, Position, SearchParams, SearchResult,
    TranspositionTable, move_to_san, parse_uci_move, perft_divide, perft_full, search,
};
use tabled::{Table, Tabled};
use tracing::debug;

/// Positions searched by `bench`: opening, middlegame and endgame.
pub const BENCH_FENS: &[(&str, &str)] = &[
    (
        "starting position",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    ),
    (
        "middlegame",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    ),
    ("endgame", "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1"),
];

/// Limits shared by the commands that search.
#[derive(Debug, Clone, Default)]
pub struct SearchLimits {
    pub depth: Option<u8>,
    pub time_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub hash_mb: usize,
}

impl SearchLimits {
    fn params(&self, search_moves: Option<Vec<jamesfish::Move>>) -> SearchParams {
        SearchParams {
            max_depth: self.depth,
            move_time: self.time_ms.map(Duration::from_millis),
            max_nodes: self.nodes,
            search_moves,
            ..SearchParams::default()
        }
    }
}

/// `startpos` or a FEN string, optionally followed by `moves` and UCI moves to play.
pub fn parse_position(position_str: &str) -> Result<Position> {
    let (fen, moves) = match position_str.split_once("moves") {
        Some((fen, moves)) => (fen.trim(), moves.split_whitespace().collect::<Vec<_>>()),
        None => (position_str.trim(), Vec::new()),
    };

    let mut position = if fen == "startpos" {
        Position::start()
    } else {
        Position::from_fen(fen).with_context(|| format!("Couldn't parse given fen: `{}`", fen))?
    };

    for move_str in moves {
        let mve = parse_uci_move(&position, move_str, MOVE_GEN)
            .with_context(|| format!("Couldn't play move `{}`", move_str))?;
        position.make_move(mve);
    }
    Ok(position)
}

pub fn run_search(
    position: &Position,
    limits: &SearchLimits,
    search_moves: &[String],
) -> Result<SearchResult> {
    let search_moves = if search_moves.is_empty() {
        None
    } else {
        let moves = search_moves
            .iter()
            .map(|move_str| parse_uci_move(position, move_str, MOVE_GEN))
            .collect::<Result<Vec<_>, _>>()
            .context("Invalid search move")?;
        Some(moves)
    };

    let params = limits.params(search_moves);
    debug!("{}", params);
    let result = search(
        position,
        &params,
        MOVE_GEN,
        POSITION_EVALUATOR,
        &mut TranspositionTable::new(limits.hash_mb),
        Arc::new(AtomicBool::new(false)),
    )?;
    Ok(result)
}

/// Best move line followed by the principal variation in SAN.
pub fn format_search_result(position: &Position, result: &SearchResult) -> Result<String> {
    let Some(best_move) = result.best_move else {
        let outcome = result
            .outcome
            .map_or_else(|| "no legal moves".to_string(), |outcome| outcome.to_string());
        return Ok(format!("bestmove (none) {}", outcome));
    };

    let mut line_position = position.clone();
    let mut san_moves = Vec::with_capacity(result.pv.len());
    for &mve in &result.pv {
        san_moves.push(move_to_san(&line_position, mve, MOVE_GEN)?);
        line_position.make_move(mve);
    }

    Ok(format!(
        "bestmove {} score {} depth {} nodes {}\npv {}",
        best_move,
        result.eval,
        result.depth,
        result.nodes,
        san_moves.join(" ")
    ))
}

/// Per-move leaf counts followed by the total, or the per-depth table when `full` is set.
pub fn run_perft(position: &Position, depth: usize, full: bool) -> String {
    if full {
        return perft_full(position, depth, MOVE_GEN).to_string();
    }

    let divided = perft_divide(position, depth, MOVE_GEN);
    let total: u64 = divided.iter().map(|(_, count)| count).sum();
    let mut lines: Vec<String> = divided
        .into_iter()
        .map(|(mve, count)| format!("{}: {}", mve, count))
        .collect();
    lines.push(format!("Total: {}", total));
    lines.join("\n")
}

pub fn run_eval(position: &Position) -> String {
    let eval = POSITION_EVALUATOR.evaluate(position);
    format!("{}\n{}\neval {} ({} to move)", position, position.to_fen(), eval, position.state.to_move)
}

#[derive(Debug, Clone, Tabled)]
pub struct BenchRow {
    pub position: String,
    pub depth: u8,
    pub best_move: String,
    pub nodes: u64,
    pub millis: u128,
    pub nps: u64,
}

/// Searches every bench position to `depth` with a fresh table.
pub fn run_bench(depth: u8, hash_mb: usize) -> Result<Vec<BenchRow>> {
    let limits = SearchLimits {
        depth: Some(depth),
        hash_mb,
        ..SearchLimits::default()
    };

    BENCH_FENS
        .iter()
        .map(|(name, fen)| {
            let position = parse_position(fen)?;
            let start = Instant::now();
            let result = run_search(&position, &limits, &[])?;
            let elapsed = start.elapsed();
            Ok(BenchRow {
                position: name.to_string(),
                depth: result.depth,
                best_move: result
                    .best_move
                    .map_or_else(|| "-".to_string(), |mve| mve.to_string()),
                nodes: result.nodes,
                millis: elapsed.as_millis(),
                nps: (result.nodes as f64 / elapsed.as_secs_f64().max(1e-6)) as u64,
            })
        })
        .collect()
}

pub fn format_bench(rows: &[BenchRow]) -> String {
    let total_nodes: u64 = rows.iter().map(|row| row.nodes).sum();
    format!("{}\ntotal nodes: {}", Table::new(rows), total_nodes)
}
