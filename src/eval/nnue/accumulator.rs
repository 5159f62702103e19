//! Two-perspective accumulator: first-layer pre-activations kept in sync
//! with the board by add/remove feature deltas instead of full recompute.
//! This is the search's hot path; only the handful of toggled features are
//! touched per make/unmake.

use super::features::{active_features, feature_index};
use super::loader::QuantNnue;
use crate::board::moves::{Move, MoveFlag};
use crate::board::{Board, Color, Piece};

#[derive(Clone)]
pub struct Accumulator {
    pub white: Vec<i16>,
    pub black: Vec<i16>,
}

/// Piece placements toggled by one move: at most two removals (mover,
/// capture) and two additions (mover/promotion, castling rook pair counts
/// one each way extra).
#[derive(Debug, Default)]
pub struct MoveDelta {
    pub removed: [Option<(Color, Piece, u8)>; 3],
    pub added: [Option<(Color, Piece, u8)>; 3],
}

impl MoveDelta {
    /// Build the toggle set for `mv` against the board *before* the move.
    pub fn from_move(board: &Board, mv: Move) -> MoveDelta {
        let us = board.side_to_move();
        let them = us.opponent();
        let from = mv.from();
        let to = mv.to();
        let piece = board.piece_on(from).map(|(_, p)| p).unwrap_or(Piece::Pawn);

        let mut d = MoveDelta::default();
        let mut nr = 0;
        let mut na = 0;
        let mut rm = |slot: &mut [Option<(Color, Piece, u8)>; 3], i: &mut usize, v| {
            slot[*i] = Some(v);
            *i += 1;
        };

        rm(&mut d.removed, &mut nr, (us, piece, from));
        rm(&mut d.added, &mut na, (us, mv.promotion().unwrap_or(piece), to));

        match mv.flag() {
            MoveFlag::EnPassant => {
                let cap_sq = match us {
                    Color::White => to - 8,
                    Color::Black => to + 8,
                };
                rm(&mut d.removed, &mut nr, (them, Piece::Pawn, cap_sq));
            }
            MoveFlag::CastleKing => {
                let (rf, rt) = match us {
                    Color::White => (7u8, 5u8),
                    Color::Black => (63, 61),
                };
                rm(&mut d.removed, &mut nr, (us, Piece::Rook, rf));
                rm(&mut d.added, &mut na, (us, Piece::Rook, rt));
            }
            MoveFlag::CastleQueen => {
                let (rf, rt) = match us {
                    Color::White => (0u8, 3u8),
                    Color::Black => (56, 59),
                };
                rm(&mut d.removed, &mut nr, (us, Piece::Rook, rf));
                rm(&mut d.added, &mut na, (us, Piece::Rook, rt));
            }
            _ => {
                if let Some((c, p)) = board.piece_on(to) {
                    rm(&mut d.removed, &mut nr, (c, p, to));
                }
            }
        }
        d
    }
}

impl Accumulator {
    pub fn new(hidden_dim: usize) -> Accumulator {
        Accumulator { white: vec![0; hidden_dim], black: vec![0; hidden_dim] }
    }

    /// Full recompute from the board; root positions and parity tests.
    pub fn refresh(&mut self, net: &QuantNnue, board: &Board) {
        let h = net.meta.hidden_dim;
        self.white.copy_from_slice(&net.b1);
        self.black.copy_from_slice(&net.b1);
        for f in active_features(board, Color::White) {
            let col = &net.w1[f * h..(f + 1) * h];
            for j in 0..h {
                self.white[j] += col[j];
            }
        }
        for f in active_features(board, Color::Black) {
            let col = &net.w1[f * h..(f + 1) * h];
            for j in 0..h {
                self.black[j] += col[j];
            }
        }
    }

    #[inline]
    fn toggle(&mut self, net: &QuantNnue, color: Color, piece: Piece, sq: u8, sign: i16) {
        let h = net.meta.hidden_dim;
        let wf = feature_index(Color::White, color, piece, sq);
        let bf = feature_index(Color::Black, color, piece, sq);
        let wcol = &net.w1[wf * h..(wf + 1) * h];
        let bcol = &net.w1[bf * h..(bf + 1) * h];
        for j in 0..h {
            self.white[j] += sign * wcol[j];
            self.black[j] += sign * bcol[j];
        }
    }

    /// Apply a move's toggles; the inverse of applying the same delta with
    /// roles swapped, which unmake gets for free by popping the stack.
    pub fn apply(&mut self, net: &QuantNnue, delta: &MoveDelta) {
        for entry in delta.removed.iter().flatten() {
            self.toggle(net, entry.0, entry.1, entry.2, -1);
        }
        for entry in delta.added.iter().flatten() {
            self.toggle(net, entry.0, entry.1, entry.2, 1);
        }
    }

    /// Perspective halves ordered side-to-move first, as the output layer
    /// expects.
    #[inline(always)]
    pub fn perspectives(&self, stm: Color) -> (&[i16], &[i16]) {
        match stm {
            Color::White => (&self.white, &self.black),
            Color::Black => (&self.black, &self.white),
        }
    }
}
