use std::{
    fmt::Display,
    time::{Duration, Instant},
};

use tabled::{Table, Tabled};

use crate::move_gen::GenerateMoves;
use crate::position::{Move, MoveFlag, Position};

/// Move counts of every path of a given length from the root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Tabled)]
pub struct PerftDepthResult {
    pub tot: u64,
    pub captures: u64,
    pub en_passants: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
    pub discovery_checks: u64,
    pub double_checks: u64,
    pub checkmates: u64,
}

pub struct PerftResult {
    pub depth_results: Vec<PerftDepthResult>,
    pub tot_nodes: u64,
    pub time_elapsed: Duration,
    pub nodes_per_second: f64,
}

impl Display for PerftResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "total nodes: {}", self.tot_nodes)?;
        writeln!(f, "time elapsed: {}", self.time_elapsed.as_secs_f32())?;
        writeln!(f, "nodes/s: {:.0}", self.nodes_per_second)?;
        writeln!(f, "{}", Table::new(&self.depth_results))?;
        Ok(())
    }
}

/// Number of legal move sequences of length `depth`.
pub fn perft(position: &Position, depth: usize, move_gen: impl GenerateMoves + Copy) -> u64 {
    let mut position = position.clone();
    count_leaves(&mut position, depth, move_gen)
}

/// `perft` split by root move, sorted by move text.
pub fn perft_divide(
    position: &Position,
    depth: usize,
    move_gen: impl GenerateMoves + Copy,
) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }
    let mut position = position.clone();
    let moves = move_gen.gen_moves(&mut position);

    let mut divided: Vec<(Move, u64)> = moves
        .into_iter()
        .map(|mve| {
            let undo = position.make_move(mve);
            let count = count_leaves(&mut position, depth - 1, move_gen);
            position.unmake_move(mve, undo);
            (mve, count)
        })
        .collect();
    divided.sort_by_key(|(mve, _)| mve.to_string());
    divided
}

/// Per-depth statistics for every depth from 1 to `depth`.
pub fn perft_full(
    position: &Position,
    depth: usize,
    move_gen: impl GenerateMoves + Copy,
) -> PerftResult {
    let mut depth_results = vec![PerftDepthResult::default(); depth];
    let mut position = position.clone();

    let start = Instant::now();
    if depth > 0 {
        perft_helper(&mut depth_results, &mut position, move_gen, 0);
    }
    let time_elapsed = start.elapsed();

    let tot_nodes = depth_results.iter().map(|res| res.tot).sum();
    let nodes_per_second = tot_nodes as f64 / time_elapsed.as_secs_f64().max(1e-9);

    PerftResult {
        depth_results,
        tot_nodes,
        time_elapsed,
        nodes_per_second,
    }
}

fn count_leaves(position: &mut Position, depth: usize, move_gen: impl GenerateMoves + Copy) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = move_gen.gen_moves(position);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut tot = 0;
    for mve in moves {
        let undo = position.make_move(mve);
        tot += count_leaves(position, depth - 1, move_gen);
        position.unmake_move(mve, undo);
    }
    tot
}

/// Records the moves available after `curr_depth` plies in `depth_results[curr_depth]`.
fn perft_helper(
    depth_results: &mut [PerftDepthResult],
    position: &mut Position,
    move_gen: impl GenerateMoves + Copy,
    curr_depth: usize,
) {
    let moves = move_gen.gen_moves(position);
    let side = position.state.to_move;
    let opp_side = side.opposite_side();

    // A mate is credited to the depth of the move that delivered it.
    if moves.is_empty() {
        if curr_depth > 0 && position.in_check(side) {
            depth_results[curr_depth - 1].checkmates += 1;
        }
        return;
    }
    if curr_depth == depth_results.len() {
        return;
    }

    let mut res = PerftDepthResult {
        tot: moves.len() as u64,
        ..PerftDepthResult::default()
    };

    for &mve in &moves {
        if mve.is_capture() {
            res.captures += 1;
        }
        if mve.flag == MoveFlag::EnPassant {
            res.en_passants += 1;
        }
        if mve.is_castle() {
            res.castles += 1;
        }
        if mve.promotion.is_some() {
            res.promotions += 1;
        }

        let undo = position.make_move(mve);

        let opp_king = position.king_square(opp_side);
        let checkers = position.attacker_count(opp_king, side);
        if checkers > 0 {
            res.checks += 1;
            if checkers > 1 {
                res.double_checks += 1;
            } else if !position.piece_attacks(mve.dest, opp_king) {
                res.discovery_checks += 1;
            }
        }

        perft_helper(depth_results, position, move_gen, curr_depth + 1);
        position.unmake_move(mve, undo);
    }

    let curr_res = &mut depth_results[curr_depth];
    curr_res.tot += res.tot;
    curr_res.captures += res.captures;
    curr_res.en_passants += res.en_passants;
    curr_res.castles += res.castles;
    curr_res.promotions += res.promotions;
    curr_res.checks += res.checks;
    curr_res.discovery_checks += res.discovery_checks;
    curr_res.double_checks += res.double_checks;
}
