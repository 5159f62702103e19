//! Feature indexing for the two-perspective input layer.
//!
//! Each perspective sees 768 features: (piece color relative to the
//! perspective) x (piece type) x (square, vertically mirrored for Black so
//! both sides share one weight set).

use crate::board::bitboard::{flip, squares_of};
use crate::board::{Board, Color, Piece};

pub const FEATURES_PER_PERSPECTIVE: usize = 2 * 6 * 64;

#[inline(always)]
pub fn feature_index(perspective: Color, piece_color: Color, piece: Piece, sq: u8) -> usize {
    let rel_color = if piece_color == perspective { 0 } else { 1 };
    let rel_sq = match perspective {
        Color::White => sq,
        Color::Black => flip(sq),
    };
    (rel_color * 6 + piece.index()) * 64 + rel_sq as usize
}

/// All active feature indices for one perspective; refresh path only.
pub fn active_features(board: &Board, perspective: Color) -> Vec<usize> {
    let mut out = Vec::with_capacity(32);
    for &color in &[Color::White, Color::Black] {
        for &piece in &Piece::ALL {
            for sq in squares_of(board.pieces(color, piece)) {
                out.push(feature_index(perspective, color, piece, sq));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_stay_in_range() {
        let b = Board::startpos();
        for &p in &[Color::White, Color::Black] {
            let feats = active_features(&b, p);
            assert_eq!(feats.len(), 32);
            assert!(feats.iter().all(|&f| f < FEATURES_PER_PERSPECTIVE));
        }
    }

    #[test]
    fn perspectives_mirror_each_other_at_start() {
        // The start position is vertically symmetric, so both perspectives
        // activate the same feature set.
        let b = Board::startpos();
        let mut w = active_features(&b, Color::White);
        let mut blk = active_features(&b, Color::Black);
        w.sort_unstable();
        blk.sort_unstable();
        assert_eq!(w, blk);
    }

    #[test]
    fn own_king_is_a_friendly_feature_for_both() {
        let b = Board::startpos();
        let w_king = feature_index(Color::White, Color::White, Piece::King, 4);
        let b_king = feature_index(Color::Black, Color::Black, Piece::King, 60);
        assert_eq!(w_king, b_king);
    }
}
