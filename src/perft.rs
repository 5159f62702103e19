//! Perft: exhaustive legal-move leaf counting, the move generator's oracle.

use crate::board::movegen::{generate, GenFilter};
use crate::board::Board;
use rayon::prelude::*;

/// Serial perft using make/unmake (no cloning below the root).
pub fn perft(board: &mut Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = generate(board, GenFilter::All);
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0u64;
    for m in moves {
        board.make_move(m);
        nodes += perft(board, depth - 1);
        board.unmake_move();
    }
    nodes
}

/// Root-split parallel perft: each first move searched on its own board.
pub fn perft_parallel(board: &Board, depth: u32) -> u64 {
    if depth <= 1 {
        return perft(&mut board.clone(), depth);
    }
    generate(board, GenFilter::All)
        .par_iter()
        .map(|&m| {
            let mut child = board.clone();
            child.make_move(m);
            perft(&mut child, depth - 1)
        })
        .sum()
}

/// Per-move breakdown in `divide` style, for movegen debugging.
pub fn divide(board: &mut Board, depth: u32) -> Vec<(String, u64)> {
    let mut out = Vec::new();
    for m in generate(board, GenFilter::All) {
        board.make_move(m);
        let nodes = if depth <= 1 { 1 } else { perft(board, depth - 1) };
        board.unmake_move();
        out.push((m.to_uci(), nodes));
    }
    out
}
