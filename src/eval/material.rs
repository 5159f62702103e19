//! Material + piece-square fallback evaluator.
//!
//! Used by light tooling and whenever no NNUE weight file is configured.
//! Tapered between midgame and endgame tables by remaining material phase.

use crate::board::bitboard::{flip, squares_of};
use crate::board::{Board, Color, Piece};

pub const PAWN: i32 = 100;
pub const KNIGHT: i32 = 320;
pub const BISHOP: i32 = 330;
pub const ROOK: i32 = 500;
pub const QUEEN: i32 = 900;

pub const fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => PAWN,
        Piece::Knight => KNIGHT,
        Piece::Bishop => BISHOP,
        Piece::Rook => ROOK,
        Piece::Queen => QUEEN,
        Piece::King => 20_000,
    }
}

// Piece-square tables from White's perspective, a1 at index 0.
#[rustfmt::skip]
const PAWN_MG: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
      5,  10,  10, -20, -20,  10,  10,   5,
      5,  -5, -10,   0,   0, -10,  -5,   5,
      0,   0,   0,  20,  20,   0,   0,   0,
      5,   5,  10,  25,  25,  10,   5,   5,
     10,  10,  20,  30,  30,  20,  10,  10,
     50,  50,  50,  50,  50,  50,  50,  50,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const PAWN_EG: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
     10,  10,  10,  10,  10,  10,  10,  10,
     10,  10,  10,  10,  10,  10,  10,  10,
     20,  20,  20,  20,  20,  20,  20,  20,
     30,  30,  30,  30,  30,  30,  30,  30,
     50,  50,  50,  50,  50,  50,  50,  50,
     80,  80,  80,  80,  80,  80,  80,  80,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const KNIGHT_TBL: [i32; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -30,   5,  10,  15,  15,  10,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -40, -20,   0,   0,   0,   0, -20, -40,
    -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const BISHOP_TBL: [i32; 64] = [
    -20, -10, -10, -10, -10, -10, -10, -20,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -10,  10,  10,  10,  10,  10,  10, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,   5,   5,  10,  10,   5,   5, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const ROOK_TBL: [i32; 64] = [
      0,   0,   0,   5,   5,   0,   0,   0,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
      5,  10,  10,  10,  10,  10,  10,   5,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const QUEEN_TBL: [i32; 64] = [
    -20, -10, -10,  -5,  -5, -10, -10, -20,
    -10,   0,   5,   0,   0,   0,   0, -10,
    -10,   5,   5,   5,   5,   5,   0, -10,
      0,   0,   5,   5,   5,   5,   0,  -5,
     -5,   0,   5,   5,   5,   5,   0,  -5,
    -10,   0,   5,   5,   5,   5,   0, -10,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -20, -10, -10,  -5,  -5, -10, -10, -20,
];

#[rustfmt::skip]
const KING_MG: [i32; 64] = [
     20,  30,  10,   0,   0,  10,  30,  20,
     20,  20,   0,   0,   0,   0,  20,  20,
    -10, -20, -20, -20, -20, -20, -20, -10,
    -20, -30, -30, -40, -40, -30, -30, -20,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
];

#[rustfmt::skip]
const KING_EG: [i32; 64] = [
    -50, -30, -30, -30, -30, -30, -30, -50,
    -30, -30,   0,   0,   0,   0, -30, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -20, -10,   0,   0, -10, -20, -30,
    -50, -40, -30, -20, -20, -30, -40, -50,
];

// Phase weights: knights/bishops 1, rooks 2, queens 4; 24 = full midgame.
const PHASE_MAX: i32 = 24;

fn game_phase(board: &Board) -> i32 {
    let mut phase = 0;
    for &color in &[Color::White, Color::Black] {
        phase += board.pieces(color, Piece::Knight).count_ones() as i32;
        phase += board.pieces(color, Piece::Bishop).count_ones() as i32;
        phase += board.pieces(color, Piece::Rook).count_ones() as i32 * 2;
        phase += board.pieces(color, Piece::Queen).count_ones() as i32 * 4;
    }
    phase.min(PHASE_MAX)
}

fn side_score(board: &Board, color: Color, phase: i32) -> i32 {
    let mut score = 0;
    for &piece in &Piece::ALL {
        for sq in squares_of(board.pieces(color, piece)) {
            // Tables are White-oriented; mirror for Black.
            let idx = match color {
                Color::White => sq,
                Color::Black => flip(sq),
            } as usize;
            let (mg, eg) = match piece {
                Piece::Pawn => (PAWN + PAWN_MG[idx], PAWN + PAWN_EG[idx]),
                Piece::Knight => (KNIGHT + KNIGHT_TBL[idx], KNIGHT + KNIGHT_TBL[idx]),
                Piece::Bishop => (BISHOP + BISHOP_TBL[idx], BISHOP + BISHOP_TBL[idx]),
                Piece::Rook => (ROOK + ROOK_TBL[idx], ROOK + ROOK_TBL[idx]),
                Piece::Queen => (QUEEN + QUEEN_TBL[idx], QUEEN + QUEEN_TBL[idx]),
                Piece::King => (KING_MG[idx], KING_EG[idx]),
            };
            score += (mg * phase + eg * (PHASE_MAX - phase)) / PHASE_MAX;
        }
    }
    score
}

/// Static evaluation in centipawns from the side to move's perspective.
pub fn eval_cp(board: &Board) -> i32 {
    let phase = game_phase(board);
    let white = side_score(board, Color::White, phase);
    let black = side_score(board, Color::Black, phase);
    let score = white - black;
    match board.side_to_move() {
        Color::White => score,
        Color::Black => -score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_is_balanced() {
        assert_eq!(eval_cp(&Board::startpos()), 0);
    }

    #[test]
    fn extra_rook_dominates_positionals() {
        let b = Board::from_fen("k7/8/8/8/8/8/8/R6K w - - 0 1").unwrap();
        let e = eval_cp(&b);
        assert!(e > 400, "rook-up eval {e}");
    }

    #[test]
    fn knight_center_better_than_rim() {
        let center = Board::from_fen("k7/8/8/8/3N4/8/8/7K w - - 0 1").unwrap();
        let rim = Board::from_fen("k7/8/8/8/8/8/8/N6K w - - 0 1").unwrap();
        assert!(eval_cp(&center) > eval_cp(&rim));
    }

    #[test]
    fn perspective_negates() {
        let w = Board::from_fen("k7/8/8/8/8/8/8/Q6K w - - 0 1").unwrap();
        let b = Board::from_fen("k7/8/8/8/8/8/8/Q6K b - - 0 1").unwrap();
        assert_eq!(eval_cp(&w), -eval_cp(&b));
    }
}
